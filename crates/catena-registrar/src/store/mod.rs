//! Store Capability
//!
//! The consistent key-value store is the only rendezvous point between a
//! registering node and the directory reader. This module describes the
//! four operations the protocol needs (plus revoke for graceful shutdown)
//! and provides two backends:
//! - `etcd`: etcd v3 via `etcd-client`
//! - `memory`: in-process store with real lease expiry, used by tests and
//!   embedders

mod etcd;
mod memory;

pub use etcd::EtcdStore;
pub use memory::{MemoryStore, StoreOp};

use async_trait::async_trait;
use std::future::Future;
use std::time::Duration;
use thiserror::Error;

/// Store-issued lease identifier.
pub type LeaseId = i64;

/// Boxed backend error kept as the source of [`StoreError::Unavailable`].
pub type BackendError = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store {op} failed: {source}")]
    Unavailable {
        op: &'static str,
        #[source]
        source: BackendError,
    },
    #[error("store {op} timed out after {after:?}")]
    Timeout { op: &'static str, after: Duration },
    #[error("lease {0:x} is unknown to the store")]
    LeaseNotFound(LeaseId),
    #[error("value at {key} is not valid UTF-8")]
    InvalidValue { key: String },
}

impl StoreError {
    pub fn unavailable(op: &'static str, source: impl Into<BackendError>) -> Self {
        Self::Unavailable {
            op,
            source: source.into(),
        }
    }
}

/// Lease-aware key-value operations.
///
/// Implementations perform a single request per call and never retry.
#[async_trait]
pub trait Store: Send {
    /// Create a lease that expires after `ttl_secs` without renewal.
    async fn grant_lease(&mut self, ttl_secs: i64) -> Result<LeaseId, StoreError>;

    /// Write `value` at `key`, attached to `lease`. Overwrites any existing value.
    async fn put(&mut self, key: &str, value: &str, lease: LeaseId) -> Result<(), StoreError>;

    /// Reset the lease's remaining TTL. Returns the TTL the store reports;
    /// a lease the store no longer knows yields [`StoreError::LeaseNotFound`].
    async fn keep_alive_once(&mut self, lease: LeaseId) -> Result<i64, StoreError>;

    /// All live entries whose key starts with `prefix`, in store order.
    async fn get_prefix(&mut self, prefix: &str) -> Result<Vec<(String, String)>, StoreError>;

    /// Revoke a lease, deleting every key attached to it.
    async fn revoke(&mut self, lease: LeaseId) -> Result<(), StoreError>;
}

/// Bound a store call by `after`. Expiry maps to [`StoreError::Timeout`].
pub async fn with_deadline<T, F>(
    op: &'static str,
    after: Duration,
    call: F,
) -> Result<T, StoreError>
where
    F: Future<Output = Result<T, StoreError>>,
{
    match tokio::time::timeout(after, call).await {
        Ok(result) => result,
        Err(_) => Err(StoreError::Timeout { op, after }),
    }
}
