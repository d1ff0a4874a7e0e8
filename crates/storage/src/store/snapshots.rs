#![forbid(unsafe_code)]
//! Named full-graph snapshots: capture, list, restore. Restores rebuild the
//! entity graph from the payload alone and never touch journal rows.

use super::*;
use gm_core::model::RelationshipType;
use rusqlite::{params, OptionalExtension};

impl GraphStore {
    /// Capture every live entity into a self-contained payload, in one
    /// transaction of the backend.
    pub fn create_snapshot(
        &mut self,
        name: &str,
        description: Option<String>,
    ) -> Result<SnapshotCreateResult, StoreError> {
        if name.trim().is_empty() {
            return Err(StoreError::InvalidInput("snapshot name must not be empty"));
        }
        let now = now_ms();
        let id = new_id();
        let tx = self.conn.transaction()?;
        let payload = capture_payload_tx(&tx)?;
        let payload_json = serde_json::to_string(&payload)?;
        tx.execute(
            r#"
            INSERT INTO snapshots(id, name, description, ts_ms, payload_json)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
            params![id, name, description, now, payload_json],
        )?;
        tx.commit()?;
        Ok(SnapshotCreateResult {
            meta: SnapshotMeta {
                id,
                name: name.to_string(),
                description,
                ts_ms: now,
            },
            counts: payload.counts(),
        })
    }

    /// Snapshot metadata, newest first. Payloads are not loaded.
    pub fn list_snapshots(&mut self) -> Result<Vec<SnapshotMeta>, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, name, description, ts_ms FROM snapshots ORDER BY ts_ms DESC, id ASC",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(SnapshotMeta {
                id: row.get(0)?,
                name: row.get(1)?,
                description: row.get(2)?,
                ts_ms: row.get(3)?,
            })
        })?;
        let mut out = Vec::new();
        for row in rows {
            out.push(row?);
        }
        Ok(out)
    }

    /// Replace the live entity graph with a snapshot's contents. A dry run
    /// reports the counts and changes nothing. Restored mutations are not
    /// journaled; journal and snapshot rows survive.
    pub fn restore_from_snapshot(
        &mut self,
        snapshot_id: &str,
        dry_run: bool,
    ) -> Result<RestoreReport, StoreError> {
        let tx = self.conn.transaction()?;
        let payload_json: Option<String> = tx
            .query_row(
                "SELECT payload_json FROM snapshots WHERE id=?1",
                params![snapshot_id],
                |row| row.get(0),
            )
            .optional()?;
        let Some(payload_json) = payload_json else {
            return Err(StoreError::NotFound {
                entity: "snapshot",
                id: snapshot_id.to_string(),
            });
        };
        let payload: SnapshotPayload = serde_json::from_str(&payload_json)?;
        let counts = payload.counts();

        if dry_run {
            tx.commit()?;
            return Ok(RestoreReport {
                snapshot_id: snapshot_id.to_string(),
                dry_run: true,
                counts,
            });
        }

        clear_graph_tx(&tx)?;
        restore_payload_tx(&tx, payload)?;
        tx.commit()?;
        Ok(RestoreReport {
            snapshot_id: snapshot_id.to_string(),
            dry_run: false,
            counts,
        })
    }
}

pub(in crate::store) fn capture_payload_tx(
    tx: &rusqlite::Transaction<'_>,
) -> Result<SnapshotPayload, StoreError> {
    let mut payload = SnapshotPayload::default();
    for node in nodes_by_label_tx(tx, LABEL_COMPONENT)? {
        payload.components.push(component_from_node(node)?.to_state());
    }
    for node in nodes_by_label_tx(tx, LABEL_TASK)? {
        payload.tasks.push(task_from_node(node)?.to_state());
    }
    for node in nodes_by_label_tx(tx, LABEL_COMMENT)? {
        payload.comments.push(comment_from_node(node)?.to_state());
    }
    let internal = [
        RelationshipType::HasComment.as_str(),
        RelationshipType::RelatesTo.as_str(),
    ];
    for edge in user_edges_tx(tx, &internal)? {
        payload
            .relationships
            .push(relationship_from_edge(edge)?.to_state());
    }
    Ok(payload)
}

/// Rebuild the graph from a payload: components, tasks, comments, then
/// relationships, so every edge endpoint exists before its edge.
fn restore_payload_tx(
    tx: &rusqlite::Transaction<'_>,
    payload: SnapshotPayload,
) -> Result<(), StoreError> {
    for state in payload.components {
        let component = Component::from_state(state)?;
        insert_node_tx(tx, &component_node(&component)?)?;
    }
    for state in payload.tasks {
        let task = Task::from_state(state)?;
        super::tasks::insert_task_with_links_tx(tx, &task)?;
    }
    for state in payload.comments {
        let comment = Comment::from_state(state)?;
        super::comments::insert_comment_with_edge_tx(tx, &comment)?;
    }
    for state in payload.relationships {
        let relationship = Relationship::from_state(state)?;
        insert_edge_tx(tx, &relationship_edge(&relationship)?)?;
    }
    Ok(())
}
