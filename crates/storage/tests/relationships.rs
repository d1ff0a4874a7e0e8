#![forbid(unsafe_code)]

use gm_core::model::{ComponentKind, RelationshipType, TaskStatus};
use gm_storage::{
    CommentInput, ComponentInput, GraphStore, RelationshipDirection, RelationshipInput, TaskInput,
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

fn component(name: &str) -> ComponentInput {
    ComponentInput {
        kind: Some(ComponentKind::Module),
        name: name.to_string(),
        ..Default::default()
    }
}

fn edge(rel_type: RelationshipType, source: &str, target: &str) -> RelationshipInput {
    RelationshipInput {
        id: None,
        rel_type,
        source_id: source.to_string(),
        target_id: target.to_string(),
        details: Default::default(),
        time_order: None,
        probability: None,
        reasoning: None,
    }
}

#[test]
fn direction_filter_and_tags() {
    let mut store = GraphStore::open(temp_dir("directions")).expect("open store");
    let a = store.create_component(component("a")).expect("a");
    let b = store.create_component(component("b")).expect("b");
    let c = store.create_component(component("c")).expect("c");

    store
        .create_relationship(edge(RelationshipType::Calls, &a.id, &b.id))
        .expect("a calls b");
    store
        .create_relationship(edge(RelationshipType::Imports, &c.id, &b.id))
        .expect("c imports b");

    let outgoing = store
        .get_component_relationships(&b.id, RelationshipDirection::Outgoing)
        .expect("outgoing");
    assert!(outgoing.is_empty());

    let incoming = store
        .get_component_relationships(&b.id, RelationshipDirection::Incoming)
        .expect("incoming");
    assert_eq!(incoming.len(), 2);
    assert!(incoming
        .iter()
        .all(|link| link.direction == RelationshipDirection::Incoming));

    let both = store
        .get_component_relationships(&a.id, RelationshipDirection::Both)
        .expect("both");
    assert_eq!(both.len(), 1);
    assert_eq!(both[0].direction, RelationshipDirection::Outgoing);
    assert_eq!(both[0].neighbor.id, b.id);
}

#[test]
fn internal_edges_never_surface() {
    let mut store = GraphStore::open(temp_dir("internal_hidden")).expect("open store");
    let a = store.create_component(component("a")).expect("a");

    store
        .create_comment(CommentInput {
            id: None,
            parent_id: a.id.clone(),
            content: "note".to_string(),
            author: "u".to_string(),
            metadata: Default::default(),
        })
        .expect("comment");
    store
        .create_task(TaskInput {
            name: "wire it up".to_string(),
            status: Some(TaskStatus::Todo),
            related_component_ids: vec![a.id.clone()],
            ..Default::default()
        })
        .expect("task");

    let links = store
        .get_component_relationships(&a.id, RelationshipDirection::Both)
        .expect("links");
    assert!(
        links.is_empty(),
        "HAS_COMMENT and RELATES_TO must stay internal"
    );

    // Creating them explicitly is refused outright.
    let b = store.create_component(component("b")).expect("b");
    let err = store
        .create_relationship(edge(RelationshipType::HasComment, &a.id, &b.id))
        .expect_err("internal type");
    assert_eq!(err.kind(), "VALIDATION");
}

#[test]
fn temporal_fields_are_validated_and_passed_through() {
    let mut store = GraphStore::open(temp_dir("temporal")).expect("open store");
    let a = store.create_component(component("a")).expect("a");
    let b = store.create_component(component("b")).expect("b");

    let mut bad = edge(RelationshipType::Precedes, &a.id, &b.id);
    bad.probability = Some(1.5);
    assert_eq!(
        store.create_relationship(bad).expect_err("probability").kind(),
        "VALIDATION"
    );

    let mut bad = edge(RelationshipType::Precedes, &a.id, &b.id);
    bad.time_order = Some(0);
    assert_eq!(
        store.create_relationship(bad).expect_err("time order").kind(),
        "VALIDATION"
    );

    let mut good = edge(RelationshipType::Precedes, &a.id, &b.id);
    good.time_order = Some(2);
    good.probability = Some(0.75);
    good.reasoning = Some("b deploys after a".to_string());
    let created = store.create_relationship(good).expect("temporal edge");
    assert_eq!(created.time_order, Some(2));
    assert_eq!(created.probability, Some(0.75));

    let links = store
        .get_component_relationships(&a.id, RelationshipDirection::Outgoing)
        .expect("links");
    assert_eq!(links[0].relationship.probability, Some(0.75));
    assert_eq!(
        links[0].relationship.reasoning.as_deref(),
        Some("b deploys after a")
    );
}

#[test]
fn dependency_tree_enumerates_paths_to_depth() {
    let mut store = GraphStore::open(temp_dir("dependency_tree")).expect("open store");
    let a = store.create_component(component("a")).expect("a");
    let b = store.create_component(component("b")).expect("b");
    let c = store.create_component(component("c")).expect("c");
    let d = store.create_component(component("d")).expect("d");

    // a -> b -> c -> d
    for (source, target) in [(&a, &b), (&b, &c), (&c, &d)] {
        store
            .create_relationship(edge(RelationshipType::DependsOn, &source.id, &target.id))
            .expect("depends on");
    }

    let default_depth = store
        .get_dependency_tree(&a.id, None)
        .expect("default depth");
    // Depth 3 from a: a-b, a-b-c, a-b-c-d.
    assert_eq!(default_depth.len(), 3);
    assert!(default_depth
        .iter()
        .all(|path| path.components[0].id == a.id));

    let shallow = store
        .get_dependency_tree(&a.id, Some(1))
        .expect("depth one");
    assert_eq!(shallow.len(), 1);
    assert_eq!(shallow[0].components.len(), 2);

    let cyclic_root = store
        .get_dependency_tree(&d.id, Some(4))
        .expect("leaf root");
    assert!(cyclic_root.is_empty());
}

#[test]
fn dependency_cycles_stop_at_the_depth_bound() {
    let mut store = GraphStore::open(temp_dir("dependency_cycle")).expect("open store");
    let a = store.create_component(component("a")).expect("a");
    let b = store.create_component(component("b")).expect("b");

    store
        .create_relationship(edge(RelationshipType::DependsOn, &a.id, &b.id))
        .expect("a->b");
    store
        .create_relationship(edge(RelationshipType::DependsOn, &b.id, &a.id))
        .expect("b->a");

    let paths = store.get_dependency_tree(&a.id, Some(4)).expect("cycle");
    // One path per depth 1..=4; nodes repeat, expansion is bounded.
    assert_eq!(paths.len(), 4);
    assert_eq!(paths.iter().map(|p| p.components.len()).max(), Some(5));
}
