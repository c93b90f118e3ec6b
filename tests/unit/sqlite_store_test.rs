//! Unit tests for the SQLite bookmark store and its change feed.
//!
//! Subscription handlers forward events into an unbounded channel so the
//! tests can await delivery instead of sleeping.

use std::sync::Arc;
use std::time::Duration;

use smartmark::services::bookmark_store::{BookmarkStore, ChangeHandler};
use smartmark::services::sqlite_store::SqliteBookmarkStore;
use smartmark::types::errors::WriteError;
use smartmark::types::event::ChangeEvent;
use tempfile::TempDir;
use tokio::sync::mpsc;

fn store() -> SqliteBookmarkStore {
    SqliteBookmarkStore::open_in_memory().expect("in-memory store")
}

fn channel_handler() -> (ChangeHandler, mpsc::UnboundedReceiver<ChangeEvent>) {
    let (tx, rx) = mpsc::unbounded_channel();
    let handler: ChangeHandler = Arc::new(move |event| {
        let _ = tx.send(event);
    });
    (handler, rx)
}

async fn next_event(rx: &mut mpsc::UnboundedReceiver<ChangeEvent>) -> ChangeEvent {
    tokio::time::timeout(Duration::from_secs(2), rx.recv())
        .await
        .expect("event should arrive")
        .expect("feed should stay open")
}

#[tokio::test]
async fn test_fetch_all_is_newest_first() {
    let store = store();
    let a = store.create("u1", "A", "https://a.com").await.unwrap();
    let b = store.create("u1", "B", "https://b.com").await.unwrap();
    let c = store.create("u1", "C", "https://c.com").await.unwrap();

    let fetched = store.fetch_all("u1").await.unwrap();
    let ids: Vec<&str> = fetched.iter().map(|bm| bm.id.as_str()).collect();
    assert_eq!(ids, vec![c.id.as_str(), b.id.as_str(), a.id.as_str()]);
}

#[tokio::test]
async fn test_fetch_all_only_returns_own_rows() {
    let store = store();
    store.create("u1", "Mine", "https://mine.com").await.unwrap();
    store.create("u2", "Theirs", "https://theirs.com").await.unwrap();

    let fetched = store.fetch_all("u1").await.unwrap();
    assert_eq!(fetched.len(), 1);
    assert_eq!(fetched[0].title, "Mine");
    assert!(store.fetch_all("nobody").await.unwrap().is_empty());
}

#[tokio::test]
async fn test_create_assigns_id_and_increasing_timestamps() {
    let store = store();
    let mut previous = i64::MIN;
    for i in 0..20 {
        let bm = store
            .create("u1", &format!("t{}", i), "https://x.com")
            .await
            .unwrap();
        assert!(!bm.id.is_empty());
        assert!(bm.created_at > previous, "created_at must strictly increase");
        previous = bm.created_at;
    }
}

#[tokio::test]
async fn test_timestamps_continue_after_reopen() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("marks.db");
    let path = path.to_str().unwrap();

    let first = {
        let store = SqliteBookmarkStore::open(path, 8).unwrap();
        store.create("u1", "A", "https://a.com").await.unwrap()
    };

    let store = SqliteBookmarkStore::open(path, 8).unwrap();
    let second = store.create("u1", "B", "https://b.com").await.unwrap();
    assert!(second.created_at > first.created_at);
    assert_eq!(store.fetch_all("u1").await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_subscription_receives_insert_update_delete() {
    let store = store();
    let (handler, mut rx) = channel_handler();
    let _sub = store.subscribe("u1", handler);

    let created = store.create("u1", "A", "https://a.com").await.unwrap();
    assert_eq!(
        next_event(&mut rx).await,
        ChangeEvent::Insert { record: created.clone() }
    );

    let renamed = store.rename(&created.id, "A2").unwrap();
    assert_eq!(renamed.title, "A2");
    assert_eq!(
        next_event(&mut rx).await,
        ChangeEvent::Update { record: renamed }
    );

    store.delete(&created.id).await.unwrap();
    assert_eq!(
        next_event(&mut rx).await,
        ChangeEvent::Delete { id: created.id.clone() }
    );
}

#[tokio::test]
async fn test_subscription_is_scoped_to_user() {
    let store = store();
    let (handler, mut rx) = channel_handler();
    let _sub = store.subscribe("u1", handler);

    store.create("u2", "Other", "https://other.com").await.unwrap();
    let mine = store.create("u1", "Mine", "https://mine.com").await.unwrap();

    // The first event delivered must be the u1 insert; the u2 one was filtered.
    assert_eq!(next_event(&mut rx).await.id(), mine.id);
}

#[tokio::test]
async fn test_delete_unknown_id_is_ok_and_silent() {
    let store = store();
    let (handler, mut rx) = channel_handler();
    let _sub = store.subscribe("u1", handler);

    store.delete("does-not-exist").await.unwrap();
    let marker = store.create("u1", "Marker", "https://m.com").await.unwrap();

    assert_eq!(next_event(&mut rx).await.id(), marker.id);
}

#[tokio::test]
async fn test_rename_unknown_id_is_not_found() {
    let store = store();
    assert_eq!(
        store.rename("missing", "x"),
        Err(WriteError::NotFound("missing".to_string()))
    );
}

#[tokio::test]
async fn test_cancelled_subscription_stops_delivery() {
    let store = store();
    let (handler, mut rx) = channel_handler();
    let mut sub = store.subscribe("u1", handler);
    assert!(sub.is_active());
    assert_eq!(store.subscriber_count(), 1);

    sub.cancel();
    sub.cancel();
    assert!(!sub.is_active());

    // The aborted task drops its receiver once the runtime reaps it.
    for _ in 0..50 {
        if store.subscriber_count() == 0 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert_eq!(store.subscriber_count(), 0);

    store.create("u1", "A", "https://a.com").await.unwrap();
    // The handler was dropped with the task, closing the channel.
    assert!(rx.recv().await.is_none());
}

#[tokio::test]
async fn test_dropping_subscription_cancels_it() {
    let store = store();
    let (handler, _rx) = channel_handler();
    {
        let _sub = store.subscribe("u1", handler);
        assert_eq!(store.subscriber_count(), 1);
    }
    for _ in 0..50 {
        if store.subscriber_count() == 0 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert_eq!(store.subscriber_count(), 0);
}
