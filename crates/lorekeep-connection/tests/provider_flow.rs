//! Integration tests: an external channel library pushing status through
//! a scope while consumers in other tasks follow along.

use std::time::Duration;

use lorekeep_connection::{ConnectionError, ConnectionId, ConnectionProvider};

// =========================================================================
// Mock channel
// =========================================================================

#[derive(Debug, PartialEq)]
struct MockChannel {
    generation: u32,
}

// =========================================================================
// Tests
// =========================================================================

#[tokio::test]
async fn test_consumer_follows_connect_drop_reconnect() {
    let provider = ConnectionProvider::<MockChannel>::new();
    let mut consumer = provider.context();
    let scope = provider.mount(MockChannel { generation: 1 }).unwrap();

    // Drain the mount notification.
    consumer.changed().await.unwrap();
    assert!(!consumer.is_connected().unwrap());

    let library = tokio::spawn(async move {
        scope.push_status(true, Some(ConnectionId::new("a")));
        tokio::time::sleep(Duration::from_millis(5)).await;
        scope.set_connected(false);
        tokio::time::sleep(Duration::from_millis(5)).await;
        scope.replace_connection(MockChannel { generation: 2 });
        scope.push_status(true, Some(ConnectionId::new("b")));
        scope
    });

    let mut seen_ids = Vec::new();
    while seen_ids.last() != Some(&Some(ConnectionId::new("b"))) {
        consumer.changed().await.unwrap();
        let snapshot = consumer.current().unwrap();
        if snapshot.is_connected {
            seen_ids.push(snapshot.connection_id);
        }
    }

    let scope = library.await.unwrap();
    assert_eq!(seen_ids.first(), Some(&Some(ConnectionId::new("a"))));
    assert_eq!(consumer.connection().unwrap().generation, 2);
    drop(scope);
}

#[tokio::test]
async fn test_unmount_is_observed_as_not_provisioned() {
    let provider = ConnectionProvider::<MockChannel>::new();
    let scope = provider.mount(MockChannel { generation: 1 }).unwrap();
    let mut consumer = provider.context();

    let waiter = tokio::spawn(async move {
        consumer.changed().await.unwrap();
        consumer.current().err()
    });
    tokio::task::yield_now().await;
    drop(scope);

    assert_eq!(waiter.await.unwrap(), Some(ConnectionError::NotProvisioned));
    assert!(!provider.is_mounted());
}

#[tokio::test]
async fn test_remount_after_unmount_publishes_fresh_handle() {
    let provider = ConnectionProvider::<MockChannel>::new();
    let consumer = provider.context();

    let first = provider.mount(MockChannel { generation: 1 }).unwrap();
    first.push_status(true, Some(ConnectionId::new("old")));
    drop(first);

    let second = provider.mount(MockChannel { generation: 2 }).unwrap();

    let snapshot = consumer.current().unwrap();
    assert_eq!(snapshot.connection.generation, 2);
    assert!(!snapshot.is_connected);
    assert_eq!(snapshot.connection_id, None);
    drop(second);
}

#[tokio::test]
async fn test_changed_fails_once_provider_and_scope_are_gone() {
    let provider = ConnectionProvider::<MockChannel>::new();
    let mut consumer = provider.context();

    drop(provider);

    assert_eq!(consumer.changed().await, Err(ConnectionError::ProviderClosed));
}
