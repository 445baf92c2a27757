//! Directory Reader
//!
//! Lists the descriptors currently advertised in a cluster with a single
//! prefix read. Values are returned in store order and never filtered.

use crate::observability::events;
use crate::store::{with_deadline, Store, StoreError};
use catena_core::ClusterName;
use std::time::Duration;

/// Separator used when rendering a peer list for other tools.
pub const PEER_SEPARATOR: &str = ",";

pub struct DirectoryReader<S> {
    store: S,
    request_timeout: Duration,
}

impl<S: Store> DirectoryReader<S> {
    pub fn new(store: S, request_timeout: Duration) -> Self {
        Self {
            store,
            request_timeout,
        }
    }

    /// Descriptors of every live registration in `cluster`. An empty list
    /// is a valid answer; any store failure fails the whole read.
    pub async fn list_peers(&mut self, cluster: &ClusterName) -> Result<Vec<String>, StoreError> {
        let prefix = cluster.prefix();
        let entries = with_deadline(
            "get",
            self.request_timeout,
            self.store.get_prefix(&prefix),
        )
        .await?;

        let peers: Vec<String> = entries.into_iter().map(|(_, value)| value).collect();
        events::peers_listed(cluster.as_str(), peers.len());
        Ok(peers)
    }
}

/// Join descriptors into the comma-separated form consumed by node
/// bootstrap scripts. No trailing newline.
pub fn render_peers(peers: &[String]) -> String {
    peers.join(PEER_SEPARATOR)
}
