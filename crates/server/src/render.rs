#![forbid(unsafe_code)]
//! Response shaping: typed records to the JSON the transports expect, with
//! timestamps rendered as RFC 3339 UTC strings.

use crate::error::ApiError;
use gm_broker::{HistoryEntry, PendingCommand, SendOutcome, WaitingAgentInfo};
use gm_core::metadata::metadata_to_json;
use gm_core::time::ts_ms_to_rfc3339;
use gm_storage::{
    ChangeEvent, Comment, Component, ComponentLink, DependencyPath, JournalStats, KindCount,
    Relationship, RelationshipDirection, ReplayReport, RestoreReport, SnapshotCreateResult,
    SnapshotMeta, Task,
};
use serde_json::{json, Map, Value};

pub(crate) fn component_json(component: &Component) -> Value {
    let mut map = Map::new();
    map.insert("id".to_string(), json!(component.id));
    map.insert("kind".to_string(), json!(component.kind.as_str()));
    map.insert("name".to_string(), json!(component.name));
    if let Some(description) = &component.description {
        map.insert("description".to_string(), json!(description));
    }
    if let Some(path) = &component.path {
        map.insert("path".to_string(), json!(path));
    }
    if let Some(codebase) = &component.codebase {
        map.insert("codebase".to_string(), json!(codebase));
    }
    map.insert("metadata".to_string(), metadata_to_json(&component.metadata));
    map.insert(
        "createdAt".to_string(),
        json!(ts_ms_to_rfc3339(component.created_at_ms)),
    );
    map.insert(
        "updatedAt".to_string(),
        json!(ts_ms_to_rfc3339(component.updated_at_ms)),
    );
    Value::Object(map)
}

pub(crate) fn relationship_json(relationship: &Relationship) -> Value {
    let mut map = Map::new();
    map.insert("id".to_string(), json!(relationship.id));
    map.insert("type".to_string(), json!(relationship.rel_type.as_str()));
    map.insert("sourceId".to_string(), json!(relationship.source_id));
    map.insert("targetId".to_string(), json!(relationship.target_id));
    map.insert(
        "details".to_string(),
        metadata_to_json(&relationship.details),
    );
    if let Some(time_order) = relationship.time_order {
        map.insert("timeOrder".to_string(), json!(time_order));
    }
    if let Some(probability) = relationship.probability {
        map.insert("probability".to_string(), json!(probability));
    }
    if let Some(reasoning) = &relationship.reasoning {
        map.insert("reasoning".to_string(), json!(reasoning));
    }
    map.insert(
        "createdAt".to_string(),
        json!(ts_ms_to_rfc3339(relationship.created_at_ms)),
    );
    Value::Object(map)
}

pub(crate) fn task_json(task: &Task) -> Value {
    let mut map = Map::new();
    map.insert("id".to_string(), json!(task.id));
    map.insert("name".to_string(), json!(task.name));
    if let Some(description) = &task.description {
        map.insert("description".to_string(), json!(description));
    }
    map.insert("status".to_string(), json!(task.status.as_str()));
    map.insert("progress".to_string(), json!(task.progress));
    if let Some(codebase) = &task.codebase {
        map.insert("codebase".to_string(), json!(codebase));
    }
    map.insert(
        "relatedComponentIds".to_string(),
        json!(task.related_component_ids),
    );
    map.insert("metadata".to_string(), metadata_to_json(&task.metadata));
    map.insert(
        "createdAt".to_string(),
        json!(ts_ms_to_rfc3339(task.created_at_ms)),
    );
    map.insert(
        "updatedAt".to_string(),
        json!(ts_ms_to_rfc3339(task.updated_at_ms)),
    );
    Value::Object(map)
}

pub(crate) fn comment_json(comment: &Comment) -> Value {
    let mut map = Map::new();
    map.insert("id".to_string(), json!(comment.id));
    map.insert("nodeId".to_string(), json!(comment.parent_id));
    map.insert("content".to_string(), json!(comment.content));
    map.insert("author".to_string(), json!(comment.author));
    map.insert("metadata".to_string(), metadata_to_json(&comment.metadata));
    map.insert(
        "created".to_string(),
        json!(ts_ms_to_rfc3339(comment.created_at_ms)),
    );
    if let Some(updated_at_ms) = comment.updated_at_ms {
        map.insert("updated".to_string(), json!(ts_ms_to_rfc3339(updated_at_ms)));
    }
    Value::Object(map)
}

pub(crate) fn link_json(link: &ComponentLink) -> Value {
    json!({
        "relationship": relationship_json(&link.relationship),
        "neighbor": component_json(&link.neighbor),
        "direction": match link.direction {
            RelationshipDirection::Incoming => "incoming",
            _ => "outgoing",
        },
    })
}

pub(crate) fn dependency_path_json(path: &DependencyPath) -> Value {
    json!({
        "components": path.components.iter().map(component_json).collect::<Vec<_>>(),
        "depth": path.components.len().saturating_sub(1),
    })
}

pub(crate) fn kind_count_json(row: &KindCount) -> Value {
    json!({ "kind": row.kind.as_str(), "count": row.count })
}

pub(crate) fn change_event_json(event: &ChangeEvent) -> Result<Value, ApiError> {
    let mut map = Map::new();
    map.insert("id".to_string(), json!(event.id));
    map.insert("operation".to_string(), json!(event.operation.as_str()));
    map.insert("entityKind".to_string(), json!(event.entity_kind.as_str()));
    map.insert("entityId".to_string(), json!(event.entity_id));
    map.insert(
        "timestamp".to_string(),
        json!(ts_ms_to_rfc3339(event.ts_ms)),
    );
    map.insert(
        "beforeState".to_string(),
        event.before_state()?.unwrap_or(Value::Null),
    );
    map.insert(
        "afterState".to_string(),
        event.after_state()?.unwrap_or(Value::Null),
    );
    map.insert("sessionId".to_string(), json!(event.session_id));
    if let Some(user_id) = &event.user_id {
        map.insert("userId".to_string(), json!(user_id));
    }
    map.insert("source".to_string(), json!(event.source));
    if let Some(meta) = event.metadata()? {
        map.insert("metadata".to_string(), meta);
    }
    Ok(Value::Object(map))
}

pub(crate) fn journal_stats_json(stats: &JournalStats) -> Value {
    json!({
        "total": stats.total,
        "byOperation": stats
            .by_operation
            .iter()
            .map(|row| json!({ "operation": row.operation, "count": row.count }))
            .collect::<Vec<_>>(),
        "last30Days": stats
            .last_30_days
            .iter()
            .map(|row| json!({ "day": row.day, "count": row.count }))
            .collect::<Vec<_>>(),
    })
}

pub(crate) fn snapshot_meta_json(meta: &SnapshotMeta) -> Value {
    let mut map = Map::new();
    map.insert("id".to_string(), json!(meta.id));
    map.insert("name".to_string(), json!(meta.name));
    if let Some(description) = &meta.description {
        map.insert("description".to_string(), json!(description));
    }
    map.insert("timestamp".to_string(), json!(ts_ms_to_rfc3339(meta.ts_ms)));
    Value::Object(map)
}

pub(crate) fn snapshot_create_json(result: &SnapshotCreateResult) -> Value {
    json!({
        "snapshot": snapshot_meta_json(&result.meta),
        "counts": {
            "components": result.counts.components,
            "tasks": result.counts.tasks,
            "comments": result.counts.comments,
            "relationships": result.counts.relationships,
        },
    })
}

pub(crate) fn restore_report_json(report: &RestoreReport) -> Value {
    json!({
        "snapshotId": report.snapshot_id,
        "dryRun": report.dry_run,
        "counts": {
            "components": report.counts.components,
            "tasks": report.counts.tasks,
            "comments": report.counts.comments,
            "relationships": report.counts.relationships,
        },
    })
}

pub(crate) fn replay_report_json(report: &ReplayReport) -> Value {
    json!({
        "target": ts_ms_to_rfc3339(report.target_ms),
        "dryRun": report.dry_run,
        "planned": report
            .plan
            .iter()
            .map(|entry| json!({
                "id": entry.id,
                "operation": entry.operation.as_str(),
                "entityKind": entry.entity_kind.as_str(),
                "entityId": entry.entity_id,
                "timestamp": ts_ms_to_rfc3339(entry.ts_ms),
            }))
            .collect::<Vec<_>>(),
        "outcomes": report
            .outcomes
            .iter()
            .map(|outcome| json!({
                "id": outcome.entry.id,
                "operation": outcome.entry.operation.as_str(),
                "applied": outcome.applied,
                "error": outcome.error,
            }))
            .collect::<Vec<_>>(),
        "applied": report.applied(),
        "failed": report.failed(),
    })
}

pub(crate) fn send_outcome_json(outcome: &SendOutcome) -> Value {
    json!({
        "delivered": outcome.delivered,
        "agentId": outcome.agent_id,
        "command": outcome.command.to_json(),
    })
}

pub(crate) fn command_json(command: &PendingCommand) -> Value {
    command.to_json()
}

pub(crate) fn waiting_agent_json(info: &WaitingAgentInfo) -> Value {
    json!({
        "agentId": info.agent_id,
        "filters": info.filters.to_json(),
        "startedAt": ts_ms_to_rfc3339(info.started_at_ms),
        "elapsedMs": info.elapsed_ms,
    })
}

pub(crate) fn history_entry_json(entry: &HistoryEntry) -> Value {
    let mut map = Map::new();
    map.insert(
        "timestamp".to_string(),
        json!(ts_ms_to_rfc3339(entry.ts_ms)),
    );
    map.insert("action".to_string(), json!(entry.action.as_str()));
    if let Some(agent_id) = &entry.agent_id {
        map.insert("agentId".to_string(), json!(agent_id));
    }
    map.insert("detail".to_string(), entry.detail.clone());
    Value::Object(map)
}
