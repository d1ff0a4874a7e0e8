#![forbid(unsafe_code)]

use gm_core::model::{ComponentKind, TaskStatus};
use gm_storage::{
    ComponentInput, GraphStore, OrderDirection, TaskInput, TaskOrderBy, TaskSearchCriteria,
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

fn task(name: &str) -> TaskInput {
    TaskInput {
        name: name.to_string(),
        ..Default::default()
    }
}

#[test]
fn task_lifecycle_with_status_and_progress() {
    let mut store = GraphStore::open(temp_dir("task_lifecycle")).expect("open store");

    let created = store.create_task(task("write parser")).expect("create");
    assert_eq!(created.status, TaskStatus::Todo);
    assert_eq!(created.progress, 0.0);

    let updated = store
        .update_task_status(&created.id, TaskStatus::InProgress, Some(0.4))
        .expect("update status");
    assert_eq!(updated.status, TaskStatus::InProgress);
    assert_eq!(updated.progress, 0.4);

    // Progress is kept when the update omits it.
    let done = store
        .update_task_status(&created.id, TaskStatus::Done, None)
        .expect("mark done");
    assert_eq!(done.progress, 0.4);

    let todo_only = store.get_tasks(Some(TaskStatus::Todo)).expect("filtered");
    assert!(todo_only.is_empty());
    let all = store.get_tasks(None).expect("all tasks");
    assert_eq!(all.len(), 1);
}

#[test]
fn progress_and_relations_are_validated() {
    let mut store = GraphStore::open(temp_dir("task_validation")).expect("open store");

    let mut bad = task("t");
    bad.progress = Some(1.2);
    assert_eq!(store.create_task(bad).expect_err("progress").kind(), "VALIDATION");

    let mut orphan = task("t");
    orphan.related_component_ids = vec!["ghost".to_string()];
    assert_eq!(
        store.create_task(orphan).expect_err("missing component").kind(),
        "NOT_FOUND"
    );

    let existing = store.create_task(task("t")).expect("create");
    assert_eq!(
        store
            .update_task_status(&existing.id, TaskStatus::Done, Some(-0.1))
            .expect_err("negative progress")
            .kind(),
        "VALIDATION"
    );
    // The rejected update must not have touched the task.
    assert_eq!(
        store.get_task(&existing.id).expect("reload").status,
        TaskStatus::Todo
    );
}

#[test]
fn search_filters_orders_and_limits() {
    let mut store = GraphStore::open(temp_dir("task_search")).expect("open store");

    let component = store
        .create_component(ComponentInput {
            kind: Some(ComponentKind::Module),
            name: "core".to_string(),
            ..Default::default()
        })
        .expect("component");

    let mut one = task("alpha review");
    one.status = Some(TaskStatus::Todo);
    one.progress = Some(0.1);
    let mut two = task("beta fix");
    two.status = Some(TaskStatus::InProgress);
    two.progress = Some(0.6);
    two.related_component_ids = vec![component.id.clone()];
    let mut three = task("gamma fix");
    three.status = Some(TaskStatus::Done);
    three.progress = Some(1.0);

    store.create_task(one).expect("one");
    store.create_task(two).expect("two");
    store.create_task(three).expect("three");

    let fixes = store
        .search_tasks(TaskSearchCriteria {
            text_query: Some("fix".to_string()),
            order_by: TaskOrderBy::Name,
            order_direction: OrderDirection::Asc,
            ..Default::default()
        })
        .expect("text search");
    assert_eq!(fixes.len(), 2);
    assert_eq!(fixes[0].name, "beta fix");

    let in_flight = store
        .search_tasks(TaskSearchCriteria {
            statuses: Some(vec![TaskStatus::Todo, TaskStatus::InProgress]),
            ..Default::default()
        })
        .expect("status search");
    assert_eq!(in_flight.len(), 2);

    let by_progress = store
        .search_tasks(TaskSearchCriteria {
            progress_min: Some(0.5),
            progress_max: Some(1.0),
            order_by: TaskOrderBy::Progress,
            order_direction: OrderDirection::Desc,
            ..Default::default()
        })
        .expect("progress search");
    assert_eq!(by_progress.len(), 2);
    assert_eq!(by_progress[0].progress, 1.0);

    let related = store
        .search_tasks(TaskSearchCriteria {
            related_component_ids: Some(vec![component.id.clone()]),
            ..Default::default()
        })
        .expect("related search");
    assert_eq!(related.len(), 1);
    assert_eq!(related[0].name, "beta fix");

    let limited = store
        .search_tasks(TaskSearchCriteria {
            limit: 2,
            order_by: TaskOrderBy::Created,
            order_direction: OrderDirection::Asc,
            ..Default::default()
        })
        .expect("limited search");
    assert_eq!(limited.len(), 2);
    assert_eq!(limited[0].name, "alpha review");
}
