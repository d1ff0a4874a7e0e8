#![forbid(unsafe_code)]

use gm_server::{Service, ServiceConfig};
use serde_json::json;
use std::path::PathBuf;

fn temp_dir(test_name: &str) -> PathBuf {
    let base = std::env::temp_dir();
    let pid = std::process::id();
    let nonce = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos();
    let dir = base.join(format!("gm_server_{test_name}_{pid}_{nonce}"));
    std::fs::create_dir_all(&dir).expect("create temp dir");
    dir
}

fn service(test_name: &str) -> Service {
    Service::open(ServiceConfig::new(temp_dir(test_name))).expect("open service")
}

fn create_component(service: &Service, kind: &str, name: &str) -> String {
    service
        .dispatch("createComponent", json!({ "kind": kind, "name": name }))
        .expect("createComponent")["id"]
        .as_str()
        .expect("id")
        .to_string()
}

#[test]
fn relationships_and_dependency_tree() {
    let service = service("relationships");
    let a = create_component(&service, "MODULE", "a");
    let b = create_component(&service, "MODULE", "b");
    let c = create_component(&service, "MODULE", "c");

    for (source, target) in [(&a, &b), (&b, &c)] {
        let created = service
            .dispatch(
                "createRelationship",
                json!({ "type": "DEPENDS_ON", "sourceId": source, "targetId": target }),
            )
            .expect("createRelationship");
        assert_eq!(created["type"], "DEPENDS_ON");
    }

    let links = service
        .dispatch(
            "getComponentRelationships",
            json!({ "componentId": b, "direction": "both" }),
        )
        .expect("getComponentRelationships");
    assert_eq!(links["count"], 2);

    let tree = service
        .dispatch("getDependencyTree", json!({ "componentId": a }))
        .expect("getDependencyTree");
    assert_eq!(tree["count"], 2);
    assert_eq!(tree["paths"][0]["depth"], 1);

    let internal = service
        .dispatch(
            "createRelationship",
            json!({ "type": "HAS_COMMENT", "sourceId": a, "targetId": b }),
        )
        .expect_err("internal type is not creatable");
    assert_eq!(internal.kind, "VALIDATION");

    let bulk = service
        .dispatch(
            "createRelationshipsBulk",
            json!({ "relationships": [
                { "type": "CALLS", "sourceId": a, "targetId": c },
                { "type": "USES", "sourceId": c, "targetId": a },
            ]}),
        )
        .expect("createRelationshipsBulk");
    assert_eq!(bulk["count"], 2);
}

#[test]
fn tasks_search_and_status_updates() {
    let service = service("tasks");
    let component = create_component(&service, "FILE", "main.rs");

    service
        .dispatch(
            "createTasksBulk",
            json!({ "tasks": [
                { "name": "triage bug", "status": "TODO" },
                { "name": "fix bug", "status": "IN_PROGRESS", "progress": 0.3,
                  "relatedComponentIds": [component] },
            ]}),
        )
        .expect("createTasksBulk");

    let searched = service
        .dispatch(
            "searchTasks",
            json!({
                "textQuery": "bug",
                "statusList": ["TODO", "IN_PROGRESS"],
                "orderBy": "name",
                "orderDirection": "asc",
            }),
        )
        .expect("searchTasks");
    assert_eq!(searched["count"], 2);
    assert_eq!(searched["tasks"][0]["name"], "fix bug");

    let related = service
        .dispatch(
            "searchTasks",
            json!({ "relatedComponentIds": [component] }),
        )
        .expect("related search");
    assert_eq!(related["count"], 1);
    let task_id = related["tasks"][0]["id"].as_str().expect("id").to_string();

    let updated = service
        .dispatch(
            "updateTaskStatus",
            json!({ "id": task_id, "status": "DONE", "progress": 1.0 }),
        )
        .expect("updateTaskStatus");
    assert_eq!(updated["status"], "DONE");
    assert_eq!(updated["progress"], 1.0);

    let done = service
        .dispatch("getTasks", json!({ "status": "DONE" }))
        .expect("getTasks");
    assert_eq!(done["count"], 1);
}

#[test]
fn comment_operations_accept_both_parent_field_names() {
    let service = service("comments");
    let component = create_component(&service, "FILE", "lib.rs");

    let first = service
        .dispatch(
            "createComment",
            json!({ "nodeId": component, "content": "hi", "author": "u" }),
        )
        .expect("createComment with nodeId");
    // The JS-era transports send `parent`; both spellings land.
    let second = service
        .dispatch(
            "createComment",
            json!({ "parent": component, "content": "again", "author": "u" }),
        )
        .expect("createComment with parent");

    let listed = service
        .dispatch("getNodeComments", json!({ "nodeId": component, "limit": 10 }))
        .expect("getNodeComments");
    assert_eq!(listed["count"], 2);

    let updated = service
        .dispatch(
            "updateComment",
            json!({ "id": first["id"], "content": "edited" }),
        )
        .expect("updateComment");
    assert_eq!(updated["content"], "edited");
    assert!(updated["updated"].is_string());

    service
        .dispatch("deleteComment", json!({ "id": second["id"] }))
        .expect("deleteComment");
    let fetched = service
        .dispatch("getComment", json!({ "id": first["id"] }))
        .expect("getComment");
    assert_eq!(fetched["content"], "edited");
    assert_eq!(
        service
            .dispatch("getComment", json!({ "id": second["id"] }))
            .expect_err("deleted comment")
            .kind,
        "NOT_FOUND"
    );
}
