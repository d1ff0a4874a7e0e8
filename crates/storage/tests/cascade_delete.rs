#![forbid(unsafe_code)]

use gm_core::model::{ComponentKind, RelationshipType};
use gm_storage::{
    CommentInput, ComponentInput, GraphStore, RelationshipDirection, RelationshipInput, StoreError,
};
use std::path::PathBuf;

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

fn component(kind: ComponentKind, name: &str) -> ComponentInput {
    ComponentInput {
        kind: Some(kind),
        name: name.to_string(),
        ..Default::default()
    }
}

#[test]
fn deleting_a_component_removes_incident_edges_and_comments() {
    let mut store = GraphStore::open(temp_dir("cascade")).expect("open store");

    let file = store
        .create_component(component(ComponentKind::File, "f"))
        .expect("create file");
    let class = store
        .create_component(component(ComponentKind::Class, "K"))
        .expect("create class");
    store
        .create_relationship(RelationshipInput {
            id: None,
            rel_type: RelationshipType::Contains,
            source_id: file.id.clone(),
            target_id: class.id.clone(),
            details: Default::default(),
            time_order: None,
            probability: None,
            reasoning: None,
        })
        .expect("create relationship");
    let comment = store
        .create_comment(CommentInput {
            id: None,
            parent_id: file.id.clone(),
            content: "hi".to_string(),
            author: "u".to_string(),
            metadata: Default::default(),
        })
        .expect("create comment");

    store.delete_component(&file.id).expect("delete file");

    // The other endpoint survives.
    store.get_component(&class.id).expect("class still present");

    // The comment went with its parent.
    let missing_comment = store.get_comment(&comment.id);
    assert!(matches!(missing_comment, Err(StoreError::NotFound { .. })));

    // No CONTAINS edge from the deleted component remains visible.
    let links = store
        .get_component_relationships(&class.id, RelationshipDirection::Both)
        .expect("class relationships");
    assert!(links.is_empty());
}

#[test]
fn relationship_endpoints_must_exist() {
    let mut store = GraphStore::open(temp_dir("endpoints")).expect("open store");
    let file = store
        .create_component(component(ComponentKind::File, "f"))
        .expect("create file");

    let err = store
        .create_relationship(RelationshipInput {
            id: None,
            rel_type: RelationshipType::DependsOn,
            source_id: file.id.clone(),
            target_id: "ghost".to_string(),
            details: Default::default(),
            time_order: None,
            probability: None,
            reasoning: None,
        })
        .expect_err("missing target");
    assert_eq!(err.kind(), "NOT_FOUND");

    // The failed create must leave no edge and no journal row.
    let links = store
        .get_component_relationships(&file.id, RelationshipDirection::Both)
        .expect("file relationships");
    assert!(links.is_empty());
    let history = store.get_entity_history(&file.id, None).expect("history");
    assert_eq!(history.len(), 1, "only the component create is journaled");
}
