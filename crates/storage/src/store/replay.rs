#![forbid(unsafe_code)]
//! Time-travel replay: rebuild the graph by re-applying journal entries up to
//! a target timestamp. Applies bypass the journal so replay never grows the
//! log it is reading.

use super::comments::{comment_get_tx, insert_comment_with_edge_tx};
use super::components::{component_get_tx, delete_component_cascade_tx, ensure_component_tx};
use super::tasks::{insert_task_with_links_tx, task_get_tx};
use super::*;
use gm_core::error::DomainError;
use gm_core::model::{ChangeOperation, TaskStatus};
use rusqlite::{params, Transaction};
use tracing::warn;

impl GraphStore {
    /// Apply every journal entry with `ts_ms <= target_ms`, oldest first, to
    /// a freshly emptied graph. A dry run returns the ordered plan without
    /// touching anything. A live run records per-entry outcomes and continues
    /// past individual failures.
    pub fn replay_to_timestamp(
        &mut self,
        target_ms: i64,
        dry_run: bool,
    ) -> Result<ReplayReport, StoreError> {
        let tx = self.conn.transaction()?;

        let mut entries = Vec::new();
        {
            let mut stmt = tx.prepare(&format!(
                "SELECT {CHANGE_EVENT_COLUMNS} FROM change_events \
                 WHERE ts_ms<=?1 ORDER BY ts_ms ASC, seq ASC"
            ))?;
            let rows = stmt.query_map(params![target_ms], read_change_event_row)?;
            for row in rows {
                entries.push(row?);
            }
        }
        let plan: Vec<ReplayPlanEntry> = entries.iter().map(plan_entry).collect();

        if dry_run {
            tx.commit()?;
            return Ok(ReplayReport {
                target_ms,
                dry_run: true,
                plan,
                outcomes: Vec::new(),
            });
        }

        clear_graph_tx(&tx)?;
        let mut outcomes = Vec::with_capacity(entries.len());
        for (entry, planned) in entries.iter().zip(plan.iter()) {
            match apply_entry_tx(&tx, entry) {
                Ok(()) => outcomes.push(ReplayEntryOutcome {
                    entry: planned.clone(),
                    applied: true,
                    error: None,
                }),
                Err(err) => {
                    warn!(
                        entry = %entry.id,
                        operation = entry.operation.as_str(),
                        error = %err,
                        "replay entry failed"
                    );
                    outcomes.push(ReplayEntryOutcome {
                        entry: planned.clone(),
                        applied: false,
                        error: Some(err.to_string()),
                    });
                }
            }
        }
        tx.commit()?;
        Ok(ReplayReport {
            target_ms,
            dry_run: false,
            plan,
            outcomes,
        })
    }
}

fn plan_entry(event: &ChangeEvent) -> ReplayPlanEntry {
    ReplayPlanEntry {
        seq: event.seq,
        id: event.id.clone(),
        ts_ms: event.ts_ms,
        operation: event.operation,
        entity_kind: event.entity_kind,
        entity_id: event.entity_id.clone(),
    }
}

fn after_state_json(event: &ChangeEvent) -> Result<&str, StoreError> {
    event
        .after_json
        .as_deref()
        .ok_or(StoreError::Domain(DomainError::MissingField("afterState")))
}

fn apply_entry_tx(tx: &Transaction<'_>, event: &ChangeEvent) -> Result<(), StoreError> {
    match event.operation {
        ChangeOperation::CreateComponent | ChangeOperation::CreateComponentsBulk => {
            let state: ComponentState = serde_json::from_str(after_state_json(event)?)?;
            let component = Component::from_state(state)?;
            insert_node_tx(tx, &component_node(&component)?)
        }
        ChangeOperation::UpdateComponent => {
            if component_get_tx(tx, &event.entity_id)?.is_none() {
                return Err(StoreError::NotFound {
                    entity: "component",
                    id: event.entity_id.clone(),
                });
            }
            let state: ComponentState = serde_json::from_str(after_state_json(event)?)?;
            let component = Component::from_state(state)?;
            update_node_tx(tx, &component_node(&component)?)?;
            Ok(())
        }
        ChangeOperation::DeleteComponent => {
            if component_get_tx(tx, &event.entity_id)?.is_none() {
                return Err(StoreError::NotFound {
                    entity: "component",
                    id: event.entity_id.clone(),
                });
            }
            delete_component_cascade_tx(tx, &event.entity_id)
        }
        ChangeOperation::CreateRelationship | ChangeOperation::CreateRelationshipsBulk => {
            let state: RelationshipState = serde_json::from_str(after_state_json(event)?)?;
            let relationship = Relationship::from_state(state)?;
            ensure_component_tx(tx, &relationship.source_id)?;
            ensure_component_tx(tx, &relationship.target_id)?;
            insert_edge_tx(tx, &relationship_edge(&relationship)?)
        }
        ChangeOperation::DeleteRelationship => apply_delete_relationship_tx(tx, event),
        ChangeOperation::CreateTask | ChangeOperation::CreateTasksBulk => {
            let state: TaskState = serde_json::from_str(after_state_json(event)?)?;
            let task = Task::from_state(state)?;
            insert_task_with_links_tx(tx, &task)
        }
        ChangeOperation::UpdateTask => {
            let Some(mut task) = task_get_tx(tx, &event.entity_id)? else {
                return Err(StoreError::NotFound {
                    entity: "task",
                    id: event.entity_id.clone(),
                });
            };
            let state: TaskState = serde_json::from_str(after_state_json(event)?)?;
            task.status = TaskStatus::parse(&state.status)?;
            task.progress = state.progress;
            task.updated_at_ms = state.updated_at_ms;
            update_node_tx(tx, &task_node(&task)?)?;
            Ok(())
        }
        ChangeOperation::CreateComment => {
            let state: CommentState = serde_json::from_str(after_state_json(event)?)?;
            let comment = Comment::from_state(state)?;
            insert_comment_with_edge_tx(tx, &comment)
        }
        ChangeOperation::UpdateComment => {
            if comment_get_tx(tx, &event.entity_id)?.is_none() {
                return Err(StoreError::NotFound {
                    entity: "comment",
                    id: event.entity_id.clone(),
                });
            }
            let state: CommentState = serde_json::from_str(after_state_json(event)?)?;
            let comment = Comment::from_state(state)?;
            update_node_tx(tx, &comment_node(&comment)?)?;
            Ok(())
        }
        ChangeOperation::DeleteComment => {
            if comment_get_tx(tx, &event.entity_id)?.is_none() {
                return Err(StoreError::NotFound {
                    entity: "comment",
                    id: event.entity_id.clone(),
                });
            }
            delete_edges_touching_tx(tx, &event.entity_id)?;
            delete_node_tx(tx, &event.entity_id)?;
            Ok(())
        }
    }
}

/// DELETE_RELATIONSHIP is replayed by locating the matching edge: by id
/// first, then by (source, target, type) from the recorded before state. An
/// absent edge fails the entry; replay continues.
fn apply_delete_relationship_tx(
    tx: &Transaction<'_>,
    event: &ChangeEvent,
) -> Result<(), StoreError> {
    if delete_edge_tx(tx, &event.entity_id)? {
        return Ok(());
    }
    let before = event
        .before_json
        .as_deref()
        .ok_or(StoreError::Domain(DomainError::MissingField("beforeState")))?;
    let state: RelationshipState = serde_json::from_str(before)?;
    let Some(edge) = find_edge_tx(tx, &state.source_id, &state.target_id, &state.rel_type)? else {
        return Err(StoreError::NotFound {
            entity: "relationship",
            id: event.entity_id.clone(),
        });
    };
    delete_edge_tx(tx, &edge.id)?;
    Ok(())
}
