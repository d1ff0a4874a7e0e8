#![forbid(unsafe_code)]

use gm_core::model::ComponentKind;
use gm_storage::{CommentInput, ComponentInput, GraphStore, TaskInput};
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

fn comment(parent_id: &str, content: &str) -> CommentInput {
    CommentInput {
        id: None,
        parent_id: parent_id.to_string(),
        content: content.to_string(),
        author: "reviewer".to_string(),
        metadata: Default::default(),
    }
}

#[test]
fn comments_attach_to_components_and_tasks_newest_first() {
    let mut store = GraphStore::open(temp_dir("comment_order")).expect("open store");
    let component = store
        .create_component(ComponentInput {
            kind: Some(ComponentKind::File),
            name: "main.rs".to_string(),
            ..Default::default()
        })
        .expect("component");
    let task = store
        .create_task(TaskInput {
            name: "refactor".to_string(),
            ..Default::default()
        })
        .expect("task");

    store
        .create_comment(comment(&component.id, "first"))
        .expect("first");
    std::thread::sleep(Duration::from_millis(5));
    store
        .create_comment(comment(&component.id, "second"))
        .expect("second");
    store
        .create_comment(comment(&task.id, "task note"))
        .expect("task comment");

    let on_component = store
        .get_node_comments(&component.id, None)
        .expect("component comments");
    assert_eq!(on_component.len(), 2);
    assert_eq!(on_component[0].content, "second");
    assert_eq!(on_component[1].content, "first");

    let on_task = store
        .get_node_comments(&task.id, None)
        .expect("task comments");
    assert_eq!(on_task.len(), 1);

    let limited = store
        .get_node_comments(&component.id, Some(1))
        .expect("limited");
    assert_eq!(limited.len(), 1);
    assert_eq!(limited[0].content, "second");
}

#[test]
fn comment_validation_and_lifecycle() {
    let mut store = GraphStore::open(temp_dir("comment_lifecycle")).expect("open store");

    assert_eq!(
        store
            .create_comment(comment("ghost", "hello"))
            .expect_err("missing parent")
            .kind(),
        "NOT_FOUND"
    );
    assert_eq!(
        store
            .get_node_comments("ghost", None)
            .expect_err("missing node")
            .kind(),
        "NOT_FOUND"
    );

    let component = store
        .create_component(ComponentInput {
            kind: Some(ComponentKind::File),
            name: "lib.rs".to_string(),
            ..Default::default()
        })
        .expect("component");
    assert_eq!(
        store
            .create_comment(comment(&component.id, "  "))
            .expect_err("empty content")
            .kind(),
        "VALIDATION"
    );

    let created = store
        .create_comment(comment(&component.id, "draft"))
        .expect("create");
    assert!(created.updated_at_ms.is_none());

    let updated = store
        .update_comment(&created.id, "final".to_string())
        .expect("update");
    assert_eq!(updated.content, "final");
    assert!(updated.updated_at_ms.is_some());

    store.delete_comment(&created.id).expect("delete");
    assert_eq!(
        store.get_comment(&created.id).expect_err("gone").kind(),
        "NOT_FOUND"
    );
}
