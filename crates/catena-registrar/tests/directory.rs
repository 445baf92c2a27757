mod common;

use common::{cluster, node, REQUEST_TIMEOUT, TTL};
use catena_registrar::store::StoreError;
use catena_registrar::{render_peers, DirectoryReader, MemoryStore, Registrant, StoreOp};
use std::collections::BTreeSet;
use std::time::Duration;

#[tokio::test(start_paused = true)]
async fn test_lists_every_registered_node() {
    let store = MemoryStore::new();
    let mut registrant = Registrant::new(store.clone(), REQUEST_TIMEOUT);
    let enodes = [
        ("geth-a", "enode://a@1.1.1.1:30303"),
        ("geth-b", "enode://b@1.1.1.2:30303"),
        ("geth-c", "enode://c@1.1.1.3:30303"),
    ];
    for (name, enode) in enodes {
        registrant
            .register(&cluster("catena"), &node(name), enode, TTL)
            .await
            .unwrap();
    }

    let mut reader = DirectoryReader::new(store.clone(), REQUEST_TIMEOUT);
    let peers = reader.list_peers(&cluster("catena")).await.unwrap();
    let rendered = render_peers(&peers);

    let listed: BTreeSet<&str> = rendered.split(',').collect();
    let expected: BTreeSet<&str> = enodes.iter().map(|(_, enode)| *enode).collect();
    assert_eq!(listed, expected);
    assert!(!rendered.ends_with('\n'));
}

#[tokio::test(start_paused = true)]
async fn test_empty_cluster_is_not_an_error() {
    let store = MemoryStore::new();
    let mut reader = DirectoryReader::new(store, REQUEST_TIMEOUT);

    let peers = reader.list_peers(&cluster("catena")).await.unwrap();
    assert!(peers.is_empty());
    assert_eq!(render_peers(&peers), "");
}

#[tokio::test(start_paused = true)]
async fn test_store_failure_fails_the_read() {
    let store = MemoryStore::new();
    let mut registrant = Registrant::new(store.clone(), REQUEST_TIMEOUT);
    registrant
        .register(&cluster("catena"), &node("geth-a"), "enode://a@1.1.1.1:30303", TTL)
        .await
        .unwrap();
    store.fail(StoreOp::GetPrefix).await;

    let mut reader = DirectoryReader::new(store.clone(), REQUEST_TIMEOUT);
    let result = reader.list_peers(&cluster("catena")).await;
    assert!(matches!(result, Err(StoreError::Unavailable { op: "get", .. })));
    assert_eq!(store.calls(StoreOp::GetPrefix).await, 1);
}

#[tokio::test(start_paused = true)]
async fn test_read_is_deadline_bounded() {
    let store = MemoryStore::new();
    store.set_latency(Duration::from_secs(30)).await;

    let mut reader = DirectoryReader::new(store, REQUEST_TIMEOUT);
    let result = reader.list_peers(&cluster("catena")).await;
    assert!(matches!(
        result,
        Err(StoreError::Timeout { op: "get", after }) if after == REQUEST_TIMEOUT
    ));
}
