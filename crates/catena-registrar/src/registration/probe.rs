//! Liveness Probe
//!
//! Local health check gating lease renewal. Probes must answer quickly and
//! resolve any doubt to [`Health::Unhealthy`].

use async_trait::async_trait;
use std::future::Future;
use std::io;
use std::path::PathBuf;
use std::time::Duration;
use tracing::trace;

/// Result of a liveness check
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Health {
    Healthy,
    Unhealthy(String),
}

impl Health {
    pub fn is_healthy(&self) -> bool {
        matches!(self, Health::Healthy)
    }
}

#[async_trait]
pub trait LivenessProbe: Send + Sync {
    async fn check(&self) -> Health;
}

/// Checks that the node's own IPC socket accepts connections. The
/// connection is closed immediately after it is established.
#[derive(Debug, Clone)]
pub struct UnixSocketProbe {
    path: PathBuf,
    timeout: Duration,
}

impl UnixSocketProbe {
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(1);

    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            timeout: Self::DEFAULT_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Judge a connection attempt, bounded by the probe timeout.
    async fn judge<T>(&self, connect: impl Future<Output = io::Result<T>>) -> Health {
        match tokio::time::timeout(self.timeout, connect).await {
            Ok(Ok(stream)) => {
                drop(stream);
                trace!(path = %self.path.display(), "IPC socket reachable");
                Health::Healthy
            }
            Ok(Err(e)) => Health::Unhealthy(format!(
                "cannot connect to {}: {}",
                self.path.display(),
                e
            )),
            Err(_) => Health::Unhealthy(format!(
                "connecting to {} timed out after {:?}",
                self.path.display(),
                self.timeout
            )),
        }
    }
}

#[async_trait]
impl LivenessProbe for UnixSocketProbe {
    async fn check(&self) -> Health {
        self.judge(tokio::net::UnixStream::connect(&self.path)).await
    }
}
