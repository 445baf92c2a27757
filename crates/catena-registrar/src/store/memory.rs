//! In-memory Store
//!
//! Lease semantics follow etcd: a lease expires once its TTL elapses
//! without a keep-alive, and every key attached to it disappears with it.
//! Time is read from the tokio clock, so a paused runtime drives expiry
//! deterministically. Failures and latency can be injected per operation.

use super::{LeaseId, Store, StoreError};
use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;

/// Store operations, used to inject failures and count calls
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreOp {
    Grant,
    Put,
    KeepAlive,
    GetPrefix,
    Revoke,
}

impl StoreOp {
    pub const ALL: [StoreOp; 5] = [
        StoreOp::Grant,
        StoreOp::Put,
        StoreOp::KeepAlive,
        StoreOp::GetPrefix,
        StoreOp::Revoke,
    ];

    fn name(self) -> &'static str {
        match self {
            StoreOp::Grant => "lease grant",
            StoreOp::Put => "put",
            StoreOp::KeepAlive => "keep-alive",
            StoreOp::GetPrefix => "get",
            StoreOp::Revoke => "lease revoke",
        }
    }
}

#[derive(Debug)]
struct LeaseRecord {
    ttl: Duration,
    expires_at: Instant,
}

#[derive(Debug)]
struct Entry {
    value: String,
    lease: LeaseId,
}

#[derive(Debug, Default)]
struct Inner {
    last_lease: LeaseId,
    leases: HashMap<LeaseId, LeaseRecord>,
    entries: BTreeMap<String, Entry>,
    failing: HashSet<StoreOp>,
    latency: Duration,
    calls: HashMap<StoreOp, usize>,
}

impl Inner {
    fn expire(&mut self, now: Instant) {
        let expired: Vec<LeaseId> = self
            .leases
            .iter()
            .filter(|(_, lease)| lease.expires_at <= now)
            .map(|(id, _)| *id)
            .collect();
        for id in expired {
            self.drop_lease(id);
        }
    }

    fn drop_lease(&mut self, id: LeaseId) -> bool {
        let known = self.leases.remove(&id).is_some();
        self.entries.retain(|_, entry| entry.lease != id);
        known
    }
}

/// Shared in-process store. Clones observe the same data.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<Inner>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent `op` fail as if the store were unreachable.
    pub async fn fail(&self, op: StoreOp) {
        self.inner.lock().await.failing.insert(op);
    }

    /// Undo [`MemoryStore::fail`] for `op`.
    pub async fn heal(&self, op: StoreOp) {
        self.inner.lock().await.failing.remove(&op);
    }

    /// Fail (or restore) every operation at once.
    pub async fn set_unreachable(&self, unreachable: bool) {
        let mut inner = self.inner.lock().await;
        if unreachable {
            inner.failing.extend(StoreOp::ALL);
        } else {
            inner.failing.clear();
        }
    }

    /// Delay applied before each operation completes.
    pub async fn set_latency(&self, latency: Duration) {
        self.inner.lock().await.latency = latency;
    }

    /// Number of times `op` was attempted, failed attempts included.
    pub async fn calls(&self, op: StoreOp) -> usize {
        self.inner.lock().await.calls.get(&op).copied().unwrap_or(0)
    }

    /// Number of leases that are still alive.
    pub async fn live_leases(&self) -> usize {
        let mut inner = self.inner.lock().await;
        inner.expire(Instant::now());
        inner.leases.len()
    }

    async fn begin(&self, op: StoreOp) -> Result<(), StoreError> {
        let latency = {
            let mut inner = self.inner.lock().await;
            *inner.calls.entry(op).or_default() += 1;
            inner.latency
        };
        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }
        if self.inner.lock().await.failing.contains(&op) {
            return Err(StoreError::unavailable(op.name(), "store unreachable"));
        }
        Ok(())
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn grant_lease(&mut self, ttl_secs: i64) -> Result<LeaseId, StoreError> {
        self.begin(StoreOp::Grant).await?;
        if ttl_secs <= 0 {
            return Err(StoreError::unavailable(
                StoreOp::Grant.name(),
                format!("invalid ttl {}", ttl_secs),
            ));
        }

        let now = Instant::now();
        let mut inner = self.inner.lock().await;
        inner.expire(now);
        inner.last_lease += 1;
        let id = inner.last_lease;
        let ttl = Duration::from_secs(ttl_secs as u64);
        inner.leases.insert(
            id,
            LeaseRecord {
                ttl,
                expires_at: now + ttl,
            },
        );
        Ok(id)
    }

    async fn put(&mut self, key: &str, value: &str, lease: LeaseId) -> Result<(), StoreError> {
        self.begin(StoreOp::Put).await?;

        let mut inner = self.inner.lock().await;
        inner.expire(Instant::now());
        if !inner.leases.contains_key(&lease) {
            return Err(StoreError::LeaseNotFound(lease));
        }
        inner.entries.insert(
            key.to_string(),
            Entry {
                value: value.to_string(),
                lease,
            },
        );
        Ok(())
    }

    async fn keep_alive_once(&mut self, lease: LeaseId) -> Result<i64, StoreError> {
        self.begin(StoreOp::KeepAlive).await?;

        let now = Instant::now();
        let mut inner = self.inner.lock().await;
        inner.expire(now);
        let record = inner
            .leases
            .get_mut(&lease)
            .ok_or(StoreError::LeaseNotFound(lease))?;
        record.expires_at = now + record.ttl;
        Ok(record.ttl.as_secs() as i64)
    }

    async fn get_prefix(&mut self, prefix: &str) -> Result<Vec<(String, String)>, StoreError> {
        self.begin(StoreOp::GetPrefix).await?;

        let mut inner = self.inner.lock().await;
        inner.expire(Instant::now());
        Ok(inner
            .entries
            .range(prefix.to_string()..)
            .take_while(|(key, _)| key.starts_with(prefix))
            .map(|(key, entry)| (key.clone(), entry.value.clone()))
            .collect())
    }

    async fn revoke(&mut self, lease: LeaseId) -> Result<(), StoreError> {
        self.begin(StoreOp::Revoke).await?;

        let mut inner = self.inner.lock().await;
        inner.expire(Instant::now());
        if inner.drop_lease(lease) {
            Ok(())
        } else {
            Err(StoreError::LeaseNotFound(lease))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_entry_expires_with_lease() {
        let mut store = MemoryStore::new();
        let lease = store.grant_lease(10).await.unwrap();
        store.put("a/1", "v1", lease).await.unwrap();

        tokio::time::sleep(Duration::from_secs(9)).await;
        assert_eq!(store.get_prefix("a/").await.unwrap().len(), 1);

        tokio::time::sleep(Duration::from_secs(2)).await;
        assert!(store.get_prefix("a/").await.unwrap().is_empty());
        assert!(matches!(
            store.keep_alive_once(lease).await,
            Err(StoreError::LeaseNotFound(_))
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_keep_alive_resets_ttl() {
        let mut store = MemoryStore::new();
        let lease = store.grant_lease(10).await.unwrap();
        store.put("a/1", "v1", lease).await.unwrap();

        tokio::time::sleep(Duration::from_secs(8)).await;
        assert_eq!(store.keep_alive_once(lease).await.unwrap(), 10);
        tokio::time::sleep(Duration::from_secs(8)).await;
        assert_eq!(store.get_prefix("a/").await.unwrap().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_prefix_read_is_scoped() {
        let mut store = MemoryStore::new();
        let lease = store.grant_lease(10).await.unwrap();
        store.put("a/1", "v1", lease).await.unwrap();
        store.put("ab/1", "v2", lease).await.unwrap();
        store.put("b/1", "v3", lease).await.unwrap();

        let entries = store.get_prefix("a/").await.unwrap();
        assert_eq!(entries, vec![("a/1".to_string(), "v1".to_string())]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_revoke_deletes_attached_keys() {
        let mut store = MemoryStore::new();
        let lease = store.grant_lease(10).await.unwrap();
        store.put("a/1", "v1", lease).await.unwrap();

        store.revoke(lease).await.unwrap();
        assert!(store.get_prefix("a/").await.unwrap().is_empty());
        assert_eq!(store.live_leases().await, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_injected_failures_are_counted() {
        let mut store = MemoryStore::new();
        store.fail(StoreOp::Grant).await;

        assert!(matches!(
            store.grant_lease(10).await,
            Err(StoreError::Unavailable { op: "lease grant", .. })
        ));
        assert_eq!(store.calls(StoreOp::Grant).await, 1);

        store.heal(StoreOp::Grant).await;
        assert!(store.grant_lease(10).await.is_ok());
    }
}
