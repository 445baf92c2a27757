//! Structured Events
//!
//! One function per lifecycle event so field names stay consistent across
//! the registrant and the directory reader.
//!
//! Event types:
//! - `lease_granted` - Store issued a lease for this node
//! - `entry_published` - Registration entry written under the lease
//! - `lease_renewed` - Keep-alive succeeded
//! - `renewal_stopped` - Renewal loop ended, entry left to decay
//! - `lease_revoked` - Lease revoked on graceful shutdown
//! - `peers_listed` - Directory read completed

use tracing::{debug, info, warn};

/// Emit a lease granted event
pub fn lease_granted(lease_id: i64, ttl_secs: u64, cluster: &str) {
    info!(
        event_type = "lease_granted",
        lease_id = lease_id,
        ttl_secs = ttl_secs,
        cluster = %cluster,
        "Lease granted"
    );
}

/// Emit an entry published event
pub fn entry_published(key: &str, descriptor: &str, lease_id: i64) {
    info!(
        event_type = "entry_published",
        key = %key,
        descriptor = %descriptor,
        lease_id = lease_id,
        "Registration entry published"
    );
}

/// Emit a lease renewed event. Fires every tick, so it logs at debug.
pub fn lease_renewed(lease_id: i64, ttl_secs: i64, tick: u64) {
    debug!(
        event_type = "lease_renewed",
        lease_id = lease_id,
        ttl_secs = ttl_secs,
        tick = tick,
        "Lease renewed"
    );
}

/// Emit a renewal stopped event
pub fn renewal_stopped(lease_id: i64, tick: u64, reason: &str) {
    warn!(
        event_type = "renewal_stopped",
        lease_id = lease_id,
        tick = tick,
        reason = %reason,
        "Renewal stopped, registration decaying"
    );
}

/// Emit a lease revoked event
pub fn lease_revoked(lease_id: i64, key: &str) {
    info!(
        event_type = "lease_revoked",
        lease_id = lease_id,
        key = %key,
        "Lease revoked"
    );
}

/// Emit a peers listed event
pub fn peers_listed(cluster: &str, peer_count: usize) {
    debug!(
        event_type = "peers_listed",
        cluster = %cluster,
        peer_count = peer_count,
        "Directory read complete"
    );
}
