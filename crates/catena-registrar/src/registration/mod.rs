//! Registration Protocol
//!
//! A node advertises itself in three steps:
//! 1. Lease: grant a lease with the configured TTL
//! 2. Publish: PUT the node's enode under its cluster key, bound to the lease
//! 3. Renewal: on every interval tick, keep the lease alive only if the
//!    local liveness probe passes
//!
//! There is no delete path. When the probe fails or a keep-alive fails the
//! loop stops and the entry expires with the lease.

mod probe;
mod registrant;
mod renewal;

pub use probe::{Health, LivenessProbe, UnixSocketProbe};
pub use registrant::{Lease, RegistrationError, RegistrationState, Registrant};
pub use renewal::{decide, RenewalExit, TickAction};
