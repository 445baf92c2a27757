//! Catena Registrar Library
//!
//! Lease-backed peer registration and discovery for catena chains. A node
//! publishes its enode under `ethereum/<cluster>/enode/<node>` bound to an
//! etcd lease and renews the lease only while its own geth IPC socket
//! answers. Readers list a cluster's live enodes with one prefix read.

pub mod config;
pub mod directory;
pub mod observability;
pub mod registration;
pub mod runner;
pub mod store;
pub mod version;

pub use directory::{render_peers, DirectoryReader};
pub use registration::{
    Health, Lease, LivenessProbe, RegistrationError, RegistrationState, Registrant, RenewalExit,
    UnixSocketProbe,
};
pub use store::{EtcdStore, MemoryStore, Store, StoreError, StoreOp};
