//! Shared fixtures for registrar integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use catena_core::{ClusterName, NodeName};
use catena_registrar::{DirectoryReader, Health, LivenessProbe, MemoryStore};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(5);
pub const TTL: Duration = Duration::from_secs(20);
pub const INTERVAL: Duration = Duration::from_secs(5);

pub fn cluster(name: &str) -> ClusterName {
    ClusterName::new(name).unwrap()
}

pub fn node(name: &str) -> NodeName {
    NodeName::new(name).unwrap()
}

/// Probe that replays a fixed script of results, then repeats `fallback`.
pub struct ScriptedProbe {
    script: Mutex<VecDeque<bool>>,
    fallback: bool,
    checks: AtomicUsize,
}

impl ScriptedProbe {
    pub fn always(healthy: bool) -> Self {
        Self::script([], healthy)
    }

    pub fn script(results: impl IntoIterator<Item = bool>, fallback: bool) -> Self {
        Self {
            script: Mutex::new(results.into_iter().collect()),
            fallback,
            checks: AtomicUsize::new(0),
        }
    }

    pub fn checks(&self) -> usize {
        self.checks.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LivenessProbe for ScriptedProbe {
    async fn check(&self) -> Health {
        self.checks.fetch_add(1, Ordering::SeqCst);
        let healthy = self
            .script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(self.fallback);
        if healthy {
            Health::Healthy
        } else {
            Health::Unhealthy("ipc socket unreachable".to_string())
        }
    }
}

/// Peers currently listed for `name` in `store`.
pub async fn peers(store: &MemoryStore, name: &str) -> Vec<String> {
    DirectoryReader::new(store.clone(), REQUEST_TIMEOUT)
        .list_peers(&cluster(name))
        .await
        .unwrap()
}
