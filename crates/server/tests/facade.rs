#![forbid(unsafe_code)]

use gm_server::{operation_names, Service, ServiceConfig};
use serde_json::json;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

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

fn wait_until(mut predicate: impl FnMut() -> bool, what: &str) {
    let deadline = Instant::now() + Duration::from_secs(2);
    while !predicate() {
        assert!(Instant::now() < deadline, "timed out waiting for {what}");
        std::thread::sleep(Duration::from_millis(5));
    }
}

#[test]
fn component_crud_round_trip_with_change_history() {
    let service = service("crud");

    let created = service
        .dispatch("createComponent", json!({ "kind": "FILE", "name": "a.js" }))
        .expect("createComponent");
    let id = created["id"].as_str().expect("id").to_string();
    assert_eq!(created["kind"], "FILE");
    assert!(created["createdAt"].as_str().expect("iso").contains('T'));

    let updated = service
        .dispatch(
            "updateComponent",
            json!({ "id": id, "description": "root" }),
        )
        .expect("updateComponent");
    assert_eq!(updated["description"], "root");

    service
        .dispatch("deleteComponent", json!({ "id": id }))
        .expect("deleteComponent");

    let history = service
        .dispatch("getChangeHistory", json!({ "entityId": id }))
        .expect("getChangeHistory");
    let changes = history["changes"].as_array().expect("changes");
    assert_eq!(changes.len(), 3);
    assert_eq!(changes[0]["operation"], "DELETE_COMPONENT");
    assert_eq!(changes[1]["operation"], "UPDATE_COMPONENT");
    assert_eq!(changes[2]["operation"], "CREATE_COMPONENT");
    assert!(changes[2]["beforeState"].is_null());
    assert_eq!(changes[1]["afterState"]["description"], "root");

    let missing = service
        .dispatch("getComponent", json!({ "id": id }))
        .expect_err("deleted component");
    assert_eq!(missing.kind, "NOT_FOUND");
}

#[test]
fn error_kinds_are_stable_at_the_boundary() {
    let service = service("errors");

    let unknown_op = service
        .dispatch("fooBar", json!({}))
        .expect_err("unknown operation");
    assert_eq!(unknown_op.kind, "NOT_FOUND");

    let bad_kind = service
        .dispatch("createComponent", json!({ "kind": "WIDGET", "name": "x" }))
        .expect_err("bad enum");
    assert_eq!(bad_kind.kind, "VALIDATION");

    let bad_progress = service
        .dispatch(
            "createTask",
            json!({ "name": "t", "progress": 2.0 }),
        )
        .expect_err("progress out of range");
    assert_eq!(bad_progress.kind, "VALIDATION");

    let malformed = service
        .dispatch("createComponent", json!({ "name": 42 }))
        .expect_err("malformed request");
    assert_eq!(malformed.kind, "VALIDATION");

    let duplicate = {
        service
            .dispatch(
                "createComponent",
                json!({ "id": "dup", "kind": "FILE", "name": "x" }),
            )
            .expect("first");
        service
            .dispatch(
                "createComponent",
                json!({ "id": "dup", "kind": "FILE", "name": "y" }),
            )
            .expect_err("second")
    };
    assert_eq!(duplicate.kind, "CONFLICT");
}

#[test]
fn broker_operations_rendezvous_through_the_facade() {
    let service = Arc::new(service("broker"));

    let waiter = Arc::clone(&service);
    let handle = std::thread::spawn(move || {
        waiter.dispatch(
            "waitForCommand",
            json!({
                "agentId": "A1",
                "timeoutMs": 5_000,
                "filters": { "taskTypes": ["TESTING"], "minPriority": "MEDIUM" },
            }),
        )
    });
    wait_until(
        || {
            service
                .dispatch("getWaitingAgents", json!({}))
                .map(|v| v["count"] == 1)
                .unwrap_or(false)
        },
        "agent registration",
    );

    // Low priority misses the MEDIUM floor and queues instead.
    let outcome = service
        .dispatch(
            "sendCommand",
            json!({
                "type": "EXECUTE_TASK",
                "taskType": "TESTING",
                "priority": "LOW",
            }),
        )
        .expect("send low");
    assert_eq!(outcome["delivered"], false);

    let outcome = service
        .dispatch(
            "sendCommand",
            json!({
                "type": "EXECUTE_TASK",
                "taskType": "TESTING",
                "priority": "HIGH",
                "targetComponentIds": ["Y"],
            }),
        )
        .expect("send high");
    assert_eq!(outcome["delivered"], true);
    assert_eq!(outcome["agentId"], "A1");

    let delivered = handle.join().expect("join").expect("wait resolves");
    assert_eq!(delivered["type"], "EXECUTE_TASK");
    assert_eq!(delivered["priority"], "HIGH");
    assert_eq!(delivered["deliveredTo"], "A1");

    let pending = service
        .dispatch("getPendingCommands", json!({}))
        .expect("pending");
    assert_eq!(pending["count"], 1);
    let pending_id = pending["commands"][0]["id"].as_str().expect("id");
    let cancelled = service
        .dispatch("cancelCommand", json!({ "id": pending_id }))
        .expect("cancel");
    assert_eq!(cancelled["cancelled"], true);

    let history = service
        .dispatch("getCommandHistory", json!({}))
        .expect("history");
    let actions: Vec<&str> = history["entries"]
        .as_array()
        .expect("entries")
        .iter()
        .map(|entry| entry["action"].as_str().expect("action"))
        .collect();
    assert!(actions.contains(&"WAIT_STARTED"));
    assert!(actions.contains(&"COMMAND_QUEUED"));
    assert!(actions.contains(&"COMMAND_SENT"));
    assert!(actions.contains(&"COMMAND_CANCELLED"));
}

#[test]
fn wait_timeout_and_cancel_surface_their_kinds() {
    let service = Arc::new(service("wait_errors"));

    let err = service
        .dispatch(
            "waitForCommand",
            json!({ "agentId": "A", "timeoutMs": 50 }),
        )
        .expect_err("timeout");
    assert_eq!(err.kind, "WAIT_TIMEOUT");

    let waiter = Arc::clone(&service);
    let handle = std::thread::spawn(move || {
        waiter.dispatch(
            "waitForCommand",
            json!({ "agentId": "B", "timeoutMs": 10_000 }),
        )
    });
    wait_until(
        || {
            service
                .dispatch("getWaitingAgents", json!({}))
                .map(|v| v["count"] == 1)
                .unwrap_or(false)
        },
        "B registration",
    );
    let cancelled = service
        .dispatch("cancelWait", json!({ "agentId": "B" }))
        .expect("cancelWait");
    assert_eq!(cancelled["cancelled"], true);
    let err = handle.join().expect("join").expect_err("cancelled wait");
    assert_eq!(err.kind, "WAIT_CANCELLED");
}

#[test]
fn bus_reports_mutations_and_broker_traffic() {
    let service = service("events");
    let (_, receiver) = service.bus().subscribe(None);

    service
        .dispatch("createComponent", json!({ "kind": "FILE", "name": "a" }))
        .expect("create");
    service
        .dispatch("createTask", json!({ "name": "t" }))
        .expect("task");
    service
        .dispatch("sendCommand", json!({ "type": "WORK" }))
        .expect("queue command");

    let names: Vec<String> = receiver.try_iter().map(|event| event.name).collect();
    assert_eq!(
        names,
        vec!["component-created", "task-created", "command-queued"]
    );
}

#[test]
fn snapshot_and_replay_operations_round_trip() {
    let service = service("snapshot_replay");

    let component = service
        .dispatch(
            "createComponent",
            json!({ "kind": "MODULE", "name": "core", "codebase": "alpha" }),
        )
        .expect("create");
    let id = component["id"].as_str().expect("id").to_string();

    let snapshot = service
        .dispatch("createSnapshot", json!({ "name": "baseline" }))
        .expect("snapshot");
    let snapshot_id = snapshot["snapshot"]["id"].as_str().expect("id").to_string();
    assert_eq!(snapshot["counts"]["components"], 1);

    service
        .dispatch("deleteComponent", json!({ "id": id }))
        .expect("delete");

    let listed = service
        .dispatch("listSnapshots", json!({}))
        .expect("listSnapshots");
    assert_eq!(listed["count"], 1);

    let restored = service
        .dispatch(
            "restoreSnapshot",
            json!({ "id": snapshot_id, "dryRun": false }),
        )
        .expect("restore");
    assert_eq!(restored["counts"]["components"], 1);
    service
        .dispatch("getComponent", json!({ "id": id }))
        .expect("component is back");

    let overview = service
        .dispatch("getCodebaseOverview", json!({ "codebase": "alpha" }))
        .expect("overview");
    assert_eq!(overview["breakdown"][0]["kind"], "MODULE");
    assert_eq!(overview["breakdown"][0]["count"], 1);

    let dry = service
        .dispatch(
            "replayToTimestamp",
            json!({ "timestamp": i64::MAX, "dryRun": true }),
        )
        .expect("replay dry run");
    assert_eq!(dry["dryRun"], true);
    // CREATE then DELETE are both planned; the restore itself was not journaled.
    assert_eq!(dry["planned"].as_array().expect("planned").len(), 2);

    let stats = service
        .dispatch("getHistoryStats", json!({}))
        .expect("stats");
    assert_eq!(stats["total"], 2);
}

#[test]
fn every_documented_operation_name_dispatches() {
    let names = operation_names();
    assert_eq!(names.len(), 35);
    for expected in [
        "createComponent",
        "getDependencyTree",
        "searchTasks",
        "replayToTimestamp",
        "waitForCommand",
        "getCommandHistory",
    ] {
        assert!(names.contains(&expected), "missing operation {expected}");
    }
}
