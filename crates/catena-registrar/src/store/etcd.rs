//! Etcd Store
//!
//! etcd v3 backend for the [`Store`] capability.

use super::{LeaseId, Store, StoreError};
use async_trait::async_trait;
use etcd_client::{Client, ConnectOptions, GetOptions, PutOptions};
use std::time::Duration;
use tracing::{debug, trace};

/// Etcd-backed store client
#[derive(Clone)]
pub struct EtcdStore {
    client: Client,
}

impl EtcdStore {
    /// Connect to the given endpoints. A single attempt bounded by
    /// `connect_timeout`; an unreachable cluster fails immediately.
    pub async fn connect(
        endpoints: &[String],
        connect_timeout: Duration,
    ) -> Result<Self, StoreError> {
        let options = ConnectOptions::new().with_connect_timeout(connect_timeout);
        let client = Client::connect(endpoints, Some(options))
            .await
            .map_err(|e| StoreError::unavailable("connect", e))?;

        debug!(endpoints = ?endpoints, "Connected to etcd");
        Ok(Self { client })
    }
}

#[async_trait]
impl Store for EtcdStore {
    async fn grant_lease(&mut self, ttl_secs: i64) -> Result<LeaseId, StoreError> {
        let resp = self
            .client
            .lease_grant(ttl_secs, None)
            .await
            .map_err(|e| StoreError::unavailable("lease grant", e))?;
        trace!(lease_id = resp.id(), ttl = resp.ttl(), "Lease granted");
        Ok(resp.id())
    }

    async fn put(&mut self, key: &str, value: &str, lease: LeaseId) -> Result<(), StoreError> {
        let options = PutOptions::new().with_lease(lease);
        self.client
            .put(key, value, Some(options))
            .await
            .map_err(|e| StoreError::unavailable("put", e))?;
        Ok(())
    }

    async fn keep_alive_once(&mut self, lease: LeaseId) -> Result<i64, StoreError> {
        // Opening the stream already round-trips one keep-alive and rejects unknown leases
        let (mut keeper, mut stream) = self
            .client
            .lease_keep_alive(lease)
            .await
            .map_err(|e| match e {
                etcd_client::Error::LeaseKeepAliveError(_) => StoreError::LeaseNotFound(lease),
                e => StoreError::unavailable("keep-alive", e),
            })?;

        keeper
            .keep_alive()
            .await
            .map_err(|e| StoreError::unavailable("keep-alive", e))?;

        match stream.message().await {
            Ok(Some(resp)) if resp.ttl() > 0 => Ok(resp.ttl()),
            Ok(Some(_)) => Err(StoreError::LeaseNotFound(lease)),
            Ok(None) => Err(StoreError::unavailable(
                "keep-alive",
                "keep-alive stream closed before a response",
            )),
            Err(e) => Err(StoreError::unavailable("keep-alive", e)),
        }
    }

    async fn get_prefix(&mut self, prefix: &str) -> Result<Vec<(String, String)>, StoreError> {
        let resp = self
            .client
            .get(prefix, Some(GetOptions::new().with_prefix()))
            .await
            .map_err(|e| StoreError::unavailable("get", e))?;

        let mut entries = Vec::with_capacity(resp.kvs().len());
        for kv in resp.kvs() {
            let key = String::from_utf8_lossy(kv.key()).into_owned();
            let value = kv
                .value_str()
                .map_err(|_| StoreError::InvalidValue { key: key.clone() })?;
            entries.push((key, value.to_string()));
        }
        Ok(entries)
    }

    async fn revoke(&mut self, lease: LeaseId) -> Result<(), StoreError> {
        self.client
            .lease_revoke(lease)
            .await
            .map_err(|e| StoreError::unavailable("lease revoke", e))?;
        Ok(())
    }
}
