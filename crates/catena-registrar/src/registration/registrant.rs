//! Registrant
//!
//! Owns the lease of this node and the store client used to publish and
//! renew it.

use crate::observability::events;
use crate::store::{with_deadline, LeaseId, Store, StoreError};
use catena_core::{ClusterName, NodeName};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info};

/// Lifecycle of this node's registration within one process run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistrationState {
    /// No entry published yet
    Unregistered,
    /// Entry published and lease alive
    Registered,
    /// Keep-alive in flight
    Renewing,
    /// Renewal stopped; the entry disappears when the lease runs out or is
    /// revoked. Terminal for the process.
    Decaying,
}

#[derive(Debug, Error)]
pub enum RegistrationError {
    #[error("lease TTL must be between one second and i64::MAX seconds, got {0:?}")]
    InvalidTtl(Duration),
    #[error("renewal interval must be non-zero and finite, got {0:?}")]
    InvalidInterval(Duration),
    #[error("registration is decaying; the process must restart to register again")]
    Decaying,
    #[error("failed to grant lease: {0}")]
    Grant(#[source] StoreError),
    #[error("failed to publish {key}: {source}")]
    Publish {
        key: String,
        #[source]
        source: StoreError,
    },
    #[error("failed to keep lease {lease:x} alive: {source}")]
    KeepAlive {
        lease: LeaseId,
        #[source]
        source: StoreError,
    },
    #[error("failed to revoke lease {lease:x}: {source}")]
    Revoke {
        lease: LeaseId,
        #[source]
        source: StoreError,
    },
}

/// Handle to the lease backing this node's registration entry.
///
/// Not `Clone`: only the registrant that granted a lease may renew or
/// revoke it.
#[derive(Debug)]
pub struct Lease {
    id: LeaseId,
    ttl: Duration,
    key: String,
}

impl Lease {
    pub fn id(&self) -> LeaseId {
        self.id
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Registration key bound to this lease
    pub fn key(&self) -> &str {
        &self.key
    }
}

/// Publishes this node into its cluster's directory and keeps it there
/// while the node is healthy.
pub struct Registrant<S> {
    pub(super) store: S,
    pub(super) request_timeout: Duration,
    pub(super) state: RegistrationState,
}

impl<S: Store> Registrant<S> {
    /// `request_timeout` bounds every individual store call.
    pub fn new(store: S, request_timeout: Duration) -> Self {
        Self {
            store,
            request_timeout,
            state: RegistrationState::Unregistered,
        }
    }

    pub fn state(&self) -> RegistrationState {
        self.state
    }

    /// Grant a lease of `ttl` and publish `descriptor` under the node's key.
    ///
    /// Either step failing fails the whole registration. A lease granted
    /// before a failed publish has nothing attached and simply expires.
    pub async fn register(
        &mut self,
        cluster: &ClusterName,
        node: &NodeName,
        descriptor: &str,
        ttl: Duration,
    ) -> Result<Lease, RegistrationError> {
        if self.state == RegistrationState::Decaying {
            return Err(RegistrationError::Decaying);
        }
        if ttl < Duration::from_secs(1) {
            return Err(RegistrationError::InvalidTtl(ttl));
        }
        let ttl_secs =
            i64::try_from(ttl.as_secs()).map_err(|_| RegistrationError::InvalidTtl(ttl))?;
        let ttl = Duration::from_secs(ttl.as_secs());
        let key = cluster.node_key(node);

        let lease_id = with_deadline(
            "lease grant",
            self.request_timeout,
            self.store.grant_lease(ttl_secs),
        )
        .await
        .map_err(RegistrationError::Grant)?;
        events::lease_granted(lease_id, ttl.as_secs(), cluster.as_str());

        with_deadline(
            "put",
            self.request_timeout,
            self.store.put(&key, descriptor, lease_id),
        )
        .await
        .map_err(|source| RegistrationError::Publish {
            key: key.clone(),
            source,
        })?;

        self.state = RegistrationState::Registered;
        events::entry_published(&key, descriptor, lease_id);

        Ok(Lease {
            id: lease_id,
            ttl,
            key,
        })
    }

    /// Revoke the lease, removing the entry immediately instead of waiting
    /// for it to expire. The registrant stays decaying and cannot register
    /// again.
    pub async fn revoke(&mut self, lease: Lease) -> Result<(), RegistrationError> {
        debug!(lease_id = lease.id, key = %lease.key, "Revoking lease");

        with_deadline(
            "lease revoke",
            self.request_timeout,
            self.store.revoke(lease.id),
        )
        .await
        .map_err(|source| RegistrationError::Revoke {
            lease: lease.id,
            source,
        })?;

        self.state = RegistrationState::Decaying;
        events::lease_revoked(lease.id, &lease.key);
        info!(key = %lease.key, "Registration removed");
        Ok(())
    }
}
