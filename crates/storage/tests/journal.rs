#![forbid(unsafe_code)]

use gm_core::model::{ChangeOperation, ComponentKind};
use gm_storage::{ChangeEventInput, ComponentInput, GraphStore};
use std::path::PathBuf;
use std::time::Duration;

fn temp_dir(test_name: &str) -> PathBuf {
    let base = std::env::temp_dir();
    let pid = std::process::id();
    let nonce = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos();
    let dir = base.join(format!("gm_storage_{test_name}_{pid}_{nonce}"));
    std::fs::create_dir_all(&dir).expect("create temp dir");
    dir
}

fn component(name: &str) -> ComponentInput {
    ComponentInput {
        kind: Some(ComponentKind::File),
        name: name.to_string(),
        ..Default::default()
    }
}

#[test]
fn append_is_idempotent_on_id() {
    let mut store = GraphStore::open(temp_dir("append_idempotent")).expect("open store");

    let input = ChangeEventInput {
        id: Some("evt-1".to_string()),
        operation: ChangeOperation::CreateComponent,
        entity_id: "c-1".to_string(),
        before_json: None,
        after_json: Some("{\"id\":\"c-1\"}".to_string()),
        ts_ms: None,
        session_id: None,
        user_id: None,
        source: None,
        meta_json: None,
    };
    assert!(store.append_change(input.clone()).expect("first append"));
    assert!(!store.append_change(input).expect("second append is a no-op"));

    let entries = store.get_entity_history("c-1", None).expect("history");
    assert_eq!(entries.len(), 1);
}

#[test]
fn time_range_is_inclusive_and_ascending() {
    let mut store = GraphStore::open(temp_dir("time_range")).expect("open store");

    store.create_component(component("a")).expect("a");
    std::thread::sleep(Duration::from_millis(5));
    store.create_component(component("b")).expect("b");
    std::thread::sleep(Duration::from_millis(5));
    store.create_component(component("c")).expect("c");

    let all = store
        .get_changes_by_time_range(0, i64::MAX, None)
        .expect("full range");
    assert_eq!(all.len(), 3);
    assert!(all[0].ts_ms <= all[1].ts_ms && all[1].ts_ms <= all[2].ts_ms);

    let middle = store
        .get_changes_by_time_range(all[1].ts_ms, all[1].ts_ms, None)
        .expect("inclusive bounds");
    assert_eq!(middle.len(), 1);
    assert_eq!(middle[0].id, all[1].id);

    assert_eq!(
        store
            .get_changes_by_time_range(10, 5, None)
            .expect_err("inverted range")
            .kind(),
        "VALIDATION"
    );
}

#[test]
fn session_changes_and_stats() {
    let mut store = GraphStore::open(temp_dir("session_stats")).expect("open store");
    let session = store.session_id().to_string();

    let created = store.create_component(component("a")).expect("a");
    store.delete_component(&created.id).expect("delete");

    let session_entries = store.get_session_changes(&session).expect("session feed");
    assert_eq!(session_entries.len(), 2);
    assert_eq!(session_entries[0].operation, ChangeOperation::CreateComponent);
    assert_eq!(session_entries[1].operation, ChangeOperation::DeleteComponent);
    assert!(session_entries.iter().all(|e| e.session_id == session));

    assert!(store
        .get_session_changes("unknown-session")
        .expect("empty feed")
        .is_empty());

    let stats = store.get_stats().expect("stats");
    assert_eq!(stats.total, 2);
    assert_eq!(stats.by_operation.len(), 2);
    assert!(stats.by_operation.iter().all(|op| op.count == 1));
    assert_eq!(stats.last_30_days.len(), 1);
    assert_eq!(stats.last_30_days[0].count, 2);
}

#[test]
fn recent_changes_filters_by_operation() {
    let mut store = GraphStore::open(temp_dir("recent_filter")).expect("open store");

    let created = store.create_component(component("a")).expect("a");
    store
        .update_component(
            &created.id,
            gm_storage::ComponentPatch {
                description: Some("x".to_string()),
                ..Default::default()
            },
        )
        .expect("update");

    let updates = store
        .get_recent_changes(None, Some(ChangeOperation::UpdateComponent))
        .expect("filtered feed");
    assert_eq!(updates.len(), 1);
    assert_eq!(updates[0].operation, ChangeOperation::UpdateComponent);

    let feed = store.get_recent_changes(Some(1), None).expect("limited");
    assert_eq!(feed.len(), 1);
    assert_eq!(feed[0].operation, ChangeOperation::UpdateComponent);
}
