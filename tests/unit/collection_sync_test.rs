//! Unit tests for the CollectionSync merge state.
//!
//! Covers the fixed scenarios for initial fetch, optimistic edits and remote
//! events, including both arrival orders of an optimistic insert and its
//! confirming push event.

use smartmark::managers::collection_sync::{CollectionSync, FetchPhase};
use smartmark::types::bookmark::Bookmark;
use smartmark::types::event::ChangeEvent;

const T1: i64 = 1_000;
const T2: i64 = 2_000;
const T3: i64 = 3_000;

fn bm(id: &str, created_at: i64) -> Bookmark {
    Bookmark {
        id: id.to_string(),
        user_id: "u1".to_string(),
        title: format!("Bookmark {}", id),
        url: format!("https://example.com/{}", id),
        created_at,
    }
}

fn ids(sync: &CollectionSync) -> Vec<String> {
    sync.records().iter().map(|b| b.id.clone()).collect()
}

/// Helper: a ready controller holding `[1 @ T2, 2 @ T1]`.
fn initialized() -> CollectionSync {
    let mut sync = CollectionSync::new("u1");
    assert!(sync.begin_fetch());
    sync.complete_fetch(vec![bm("1", T2), bm("2", T1)]);
    sync
}

#[test]
fn test_initialize_keeps_fetched_order() {
    let sync = initialized();
    assert!(sync.is_ready());
    assert_eq!(sync.phase(), FetchPhase::Ready);
    assert_eq!(ids(&sync), vec!["1", "2"]);
}

#[test]
fn test_not_ready_before_fetch() {
    let sync = CollectionSync::new("u1");
    assert!(!sync.is_ready());
    assert!(sync.is_empty());
    assert_eq!(sync.phase(), FetchPhase::Idle);
}

#[test]
fn test_local_create_of_newest_goes_to_head() {
    let mut sync = initialized();
    sync.apply_local_create(bm("3", T3));
    assert_eq!(sync.records()[0].id, "3");
    assert_eq!(sync.len(), 3);
}

#[test]
fn test_remote_delete_removes_exactly_one() {
    let mut sync = initialized();
    sync.apply_remote_event(ChangeEvent::Delete { id: "2".to_string() });
    assert_eq!(ids(&sync), vec!["1"]);
    assert!(sync.get("2").is_none());
}

#[test]
fn test_remote_update_changes_title_in_place() {
    let mut sync = initialized();
    let mut changed = bm("1", T2);
    changed.title = "new".to_string();

    sync.apply_remote_event(ChangeEvent::Update { record: changed });

    assert_eq!(ids(&sync), vec!["1", "2"]);
    assert_eq!(sync.records()[0].title, "new");
}

#[test]
fn test_remote_update_for_absent_record_is_ignored() {
    let mut sync = initialized();
    sync.apply_remote_event(ChangeEvent::Update { record: bm("42", T3) });
    assert_eq!(ids(&sync), vec!["1", "2"]);
}

#[test]
fn test_remote_delete_of_unknown_id_is_noop() {
    let mut sync = initialized();
    let before = sync.records().to_vec();
    sync.apply_remote_event(ChangeEvent::Delete { id: "999".to_string() });
    assert_eq!(sync.records(), before.as_slice());
}

#[test]
fn test_remote_delete_twice_matches_once() {
    let mut once = initialized();
    once.apply_remote_event(ChangeEvent::Delete { id: "1".to_string() });

    let mut twice = initialized();
    twice.apply_remote_event(ChangeEvent::Delete { id: "1".to_string() });
    twice.apply_remote_event(ChangeEvent::Delete { id: "1".to_string() });

    assert_eq!(once.records(), twice.records());
}

#[test]
fn test_local_create_then_remote_insert_yields_one_record() {
    let mut sync = initialized();
    sync.apply_local_create(bm("3", T3));
    sync.apply_remote_event(ChangeEvent::Insert { record: bm("3", T3) });

    let matching = sync.records().iter().filter(|b| b.id == "3").count();
    assert_eq!(matching, 1);
    assert_eq!(ids(&sync), vec!["3", "1", "2"]);
}

#[test]
fn test_remote_insert_then_local_create_yields_one_record() {
    let mut sync = initialized();
    sync.apply_remote_event(ChangeEvent::Insert { record: bm("3", T3) });
    sync.apply_local_create(bm("3", T3));

    let matching = sync.records().iter().filter(|b| b.id == "3").count();
    assert_eq!(matching, 1);
    assert_eq!(sync.len(), 3);
}

#[test]
fn test_reconciling_insert_replaces_content() {
    let mut sync = initialized();
    let mut optimistic = bm("3", T3);
    optimistic.title = "draft".to_string();
    sync.apply_local_create(optimistic);
    sync.apply_remote_event(ChangeEvent::Insert { record: bm("3", T3) });

    assert_eq!(sync.get("3").unwrap().title, "Bookmark 3");
}

#[test]
fn test_local_delete_returns_removed_record() {
    let mut sync = initialized();
    let removed = sync.apply_local_delete("2").unwrap();
    assert_eq!(removed.id, "2");
    assert!(sync.apply_local_delete("2").is_none());
}

#[test]
fn test_restore_puts_record_back_in_position() {
    let mut sync = initialized();
    sync.apply_local_create(bm("3", T3));
    let removed = sync.apply_local_delete("1").unwrap();
    sync.restore(removed);
    assert_eq!(ids(&sync), vec!["3", "1", "2"]);
}

#[test]
fn test_records_of_other_users_are_ignored() {
    let mut sync = initialized();
    let mut foreign = bm("x", T3);
    foreign.user_id = "u2".to_string();

    sync.apply_local_create(foreign.clone());
    sync.apply_remote_event(ChangeEvent::Insert { record: foreign.clone() });
    sync.apply_remote_event(ChangeEvent::Update { record: foreign });

    assert_eq!(ids(&sync), vec!["1", "2"]);
}

#[test]
fn test_fetch_drops_foreign_rows() {
    let mut sync = CollectionSync::new("u1");
    let mut foreign = bm("x", T3);
    foreign.user_id = "u2".to_string();
    sync.begin_fetch();
    sync.complete_fetch(vec![foreign, bm("1", T1)]);
    assert_eq!(ids(&sync), vec!["1"]);
}

#[test]
fn test_insert_during_fetch_survives_snapshot() {
    let mut sync = CollectionSync::new("u1");
    assert!(sync.begin_fetch());

    // Pushed after the snapshot was read, before it was committed.
    sync.apply_remote_event(ChangeEvent::Insert { record: bm("3", T3) });
    sync.complete_fetch(vec![bm("1", T2), bm("2", T1)]);

    assert_eq!(ids(&sync), vec!["3", "1", "2"]);
}

#[test]
fn test_delete_during_fetch_applies_to_snapshot() {
    let mut sync = CollectionSync::new("u1");
    sync.begin_fetch();
    sync.apply_remote_event(ChangeEvent::Delete { id: "2".to_string() });
    sync.complete_fetch(vec![bm("1", T2), bm("2", T1)]);

    assert_eq!(ids(&sync), vec!["1"]);
}

#[test]
fn test_failed_fetch_discards_journal() {
    let mut sync = CollectionSync::new("u1");
    sync.begin_fetch();
    sync.apply_remote_event(ChangeEvent::Insert { record: bm("3", T3) });
    assert_eq!(sync.pending_changes(), 1);
    sync.abort_fetch();
    assert_eq!(sync.phase(), FetchPhase::Idle);
    assert_eq!(sync.pending_changes(), 0);

    // The retry reads a snapshot taken after the insert landed.
    assert!(sync.begin_fetch());
    sync.complete_fetch(vec![bm("3", T3), bm("1", T2)]);
    assert_eq!(ids(&sync), vec!["3", "1"]);
}

#[test]
fn test_events_before_fetch_are_not_journaled() {
    let mut sync = CollectionSync::new("u1");
    for i in 0..500 {
        let id = format!("e{}", i);
        sync.apply_remote_event(ChangeEvent::Insert { record: bm(&id, i) });
        sync.apply_remote_event(ChangeEvent::Delete { id });
    }
    sync.apply_local_create(bm("9", T1));
    sync.apply_local_delete("9");

    assert!(sync.is_empty());
    assert_eq!(sync.pending_changes(), 0);
}

#[test]
fn test_cancelled_delete_during_fetch_keeps_record() {
    let mut sync = CollectionSync::new("u1");
    sync.begin_fetch();
    assert!(sync.apply_local_delete("1").is_none());
    sync.cancel_local_delete("1");
    sync.complete_fetch(vec![bm("1", T2), bm("2", T1)]);

    assert_eq!(ids(&sync), vec!["1", "2"]);
}
