//! Registrar Configuration
//!
//! Process-start constants for the two commands. Defaults match a stock
//! geth node inside a catena deployment; the CLI layer overrides them from
//! flags and environment variables.

use catena_core::{ClusterName, NameError, NodeName};
use std::net::{IpAddr, Ipv4Addr};
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_ETCD_ENDPOINT: &str = "http://127.0.0.1:2379";
pub const DEFAULT_CLUSTER_NAME: &str = "catena";

/// Longest lease etcd will grant, in seconds.
pub const MAX_LEASE_TTL_SECS: u64 = 9_000_000_000;
/// Longest accepted gap between two liveness checks, in seconds.
pub const MAX_CHECK_INTERVAL_SECS: u64 = 24 * 60 * 60;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error(transparent)]
    Name(#[from] NameError),
    #[error("failed to read hostname: {0}")]
    Hostname(#[source] std::io::Error),
    #[error("hostname {0:?} is not valid UTF-8")]
    HostnameEncoding(std::ffi::OsString),
    #[error("no etcd endpoints configured")]
    NoEndpoints,
}

/// Split a comma-separated endpoint list, dropping empty items.
pub fn parse_endpoints(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

/// Settings shared by every command that talks to the store
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Etcd endpoints (env: ETCD_ENDPOINTS, comma-separated)
    pub etcd_endpoints: Vec<String>,
    /// Deadline for each individual store call (env: ETCD_REQUEST_TIMEOUT)
    pub request_timeout: Duration,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            etcd_endpoints: vec![DEFAULT_ETCD_ENDPOINT.to_string()],
            request_timeout: Duration::from_secs(5),
        }
    }
}

impl StoreConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.etcd_endpoints.is_empty() {
            return Err(ConfigError::NoEndpoints);
        }
        Ok(())
    }
}

/// Configuration of the `register` command
#[derive(Debug, Clone)]
pub struct RegistrarConfig {
    pub store: StoreConfig,

    /// Cluster (chain) name (env: CLUSTER_NAME)
    pub cluster_name: String,

    /// Node name inside the cluster; the hostname when unset (env: NODE_NAME)
    pub node_name: Option<String>,

    /// Advertised IP address (env: NODE_IP)
    pub ip: IpAddr,

    /// Advertised P2P port (env: NODE_PORT)
    pub port: u16,

    /// geth node key used to derive the enode id (env: NODEKEY_PATH)
    pub nodekey_path: PathBuf,

    /// geth IPC socket checked before each renewal (env: GETH_IPC)
    pub ipc_path: PathBuf,

    /// Upper bound for a single liveness probe
    pub probe_timeout: Duration,

    /// Lease TTL (env: LEASE_TTL)
    pub lease_ttl: Duration,

    /// Renewal interval, must stay well below the TTL (env: CHECK_INTERVAL)
    pub check_interval: Duration,

    /// Revoke the lease on SIGINT/SIGTERM instead of letting it expire
    /// (env: REVOKE_ON_SHUTDOWN)
    pub revoke_on_shutdown: bool,
}

impl Default for RegistrarConfig {
    fn default() -> Self {
        Self {
            store: StoreConfig::default(),
            cluster_name: DEFAULT_CLUSTER_NAME.to_string(),
            node_name: None,
            ip: IpAddr::V4(Ipv4Addr::LOCALHOST),
            port: 30303,
            nodekey_path: PathBuf::from("/root/.ethereum/geth/nodekey"),
            ipc_path: PathBuf::from("/root/.ethereum/geth.ipc"),
            probe_timeout: Duration::from_secs(1),
            lease_ttl: Duration::from_secs(20),
            check_interval: Duration::from_secs(5),
            revoke_on_shutdown: false,
        }
    }
}

impl RegistrarConfig {
    pub fn cluster(&self) -> Result<ClusterName, ConfigError> {
        Ok(ClusterName::new(self.cluster_name.clone())?)
    }

    /// Configured node name, or the machine hostname.
    pub fn node(&self) -> Result<NodeName, ConfigError> {
        let name = match &self.node_name {
            Some(name) => name.clone(),
            None => hostname::get()
                .map_err(ConfigError::Hostname)?
                .into_string()
                .map_err(ConfigError::HostnameEncoding)?,
        };
        Ok(NodeName::new(name)?)
    }

    /// Whether the interval leaves at least one missed tick of slack
    /// before the lease can expire.
    pub fn has_renewal_margin(&self) -> bool {
        self.check_interval
            .checked_mul(2)
            .is_some_and(|slack| slack <= self.lease_ttl)
    }
}

/// Configuration of the `list` command
#[derive(Debug, Clone)]
pub struct ListConfig {
    pub store: StoreConfig,
    pub cluster_name: String,
}

impl Default for ListConfig {
    fn default() -> Self {
        Self {
            store: StoreConfig::default(),
            cluster_name: DEFAULT_CLUSTER_NAME.to_string(),
        }
    }
}

impl ListConfig {
    pub fn cluster(&self) -> Result<ClusterName, ConfigError> {
        Ok(ClusterName::new(self.cluster_name.clone())?)
    }
}
