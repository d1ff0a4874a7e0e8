#![forbid(unsafe_code)]

use crate::store::StoreError;
use rusqlite::{params, Connection};

pub(in crate::store) fn migrate_sqlite_schema(conn: &Connection) -> Result<(), StoreError> {
    conn.execute_batch(
        r#"
        PRAGMA journal_mode=WAL;
        PRAGMA synchronous=NORMAL;
        PRAGMA foreign_keys=ON;

        CREATE TABLE IF NOT EXISTS meta (
          key TEXT PRIMARY KEY,
          value TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS graph_nodes (
          id TEXT PRIMARY KEY,
          label TEXT NOT NULL,
          kind TEXT,
          name TEXT,
          codebase TEXT,
          props_json TEXT NOT NULL,
          created_at_ms INTEGER NOT NULL,
          updated_at_ms INTEGER NOT NULL
        );

        CREATE TABLE IF NOT EXISTS graph_edges (
          id TEXT PRIMARY KEY,
          edge_type TEXT NOT NULL,
          source_id TEXT NOT NULL,
          target_id TEXT NOT NULL,
          props_json TEXT,
          created_at_ms INTEGER NOT NULL
        );

        CREATE TABLE IF NOT EXISTS change_events (
          seq INTEGER PRIMARY KEY AUTOINCREMENT,
          id TEXT NOT NULL,
          ts_ms INTEGER NOT NULL,
          operation TEXT NOT NULL,
          entity_kind TEXT NOT NULL,
          entity_id TEXT NOT NULL,
          before_json TEXT,
          after_json TEXT,
          session_id TEXT NOT NULL,
          user_id TEXT,
          source TEXT NOT NULL,
          meta_json TEXT
        );

        CREATE TABLE IF NOT EXISTS snapshots (
          id TEXT PRIMARY KEY,
          name TEXT NOT NULL,
          description TEXT,
          ts_ms INTEGER NOT NULL,
          payload_json TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_graph_nodes_label ON graph_nodes(label);
        CREATE INDEX IF NOT EXISTS idx_graph_nodes_label_kind ON graph_nodes(label, kind);
        CREATE INDEX IF NOT EXISTS idx_graph_nodes_codebase ON graph_nodes(codebase);
        CREATE INDEX IF NOT EXISTS idx_graph_edges_source ON graph_edges(source_id, edge_type);
        CREATE INDEX IF NOT EXISTS idx_graph_edges_target ON graph_edges(target_id, edge_type);
        CREATE INDEX IF NOT EXISTS idx_graph_edges_type ON graph_edges(edge_type);
        CREATE UNIQUE INDEX IF NOT EXISTS idx_change_events_id ON change_events(id);
        CREATE INDEX IF NOT EXISTS idx_change_events_ts ON change_events(ts_ms, seq);
        CREATE INDEX IF NOT EXISTS idx_change_events_operation ON change_events(operation, ts_ms);
        CREATE INDEX IF NOT EXISTS idx_change_events_entity ON change_events(entity_id, ts_ms);
        CREATE INDEX IF NOT EXISTS idx_change_events_session ON change_events(session_id, ts_ms);
        "#,
    )?;
    conn.execute(
        "INSERT OR IGNORE INTO meta(key, value) VALUES (?1, ?2)",
        params!["schema_version", "v1"],
    )?;
    Ok(())
}
