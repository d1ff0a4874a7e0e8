#![forbid(unsafe_code)]
//! Thin transactional adapter over the graph backend: node and edge
//! primitives shared by every store operation. All helpers run against an
//! open transaction and never commit.

use crate::store::StoreError;
use rusqlite::types::Value as SqlValue;
use rusqlite::{params, params_from_iter, OptionalExtension, Transaction};

pub(in crate::store) const LABEL_COMPONENT: &str = "Component";
pub(in crate::store) const LABEL_TASK: &str = "Task";
pub(in crate::store) const LABEL_COMMENT: &str = "Comment";

#[derive(Clone, Debug)]
pub(in crate::store) struct NodeRow {
    pub id: String,
    pub label: String,
    pub kind: Option<String>,
    pub name: Option<String>,
    pub codebase: Option<String>,
    pub props_json: String,
    pub created_at_ms: i64,
    pub updated_at_ms: i64,
}

#[derive(Clone, Debug)]
pub(in crate::store) struct EdgeRow {
    pub id: String,
    pub edge_type: String,
    pub source_id: String,
    pub target_id: String,
    pub props_json: Option<String>,
    pub created_at_ms: i64,
}

fn entity_name_for_label(label: &str) -> &'static str {
    match label {
        LABEL_COMPONENT => "component",
        LABEL_TASK => "task",
        LABEL_COMMENT => "comment",
        _ => "node",
    }
}

fn is_unique_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(inner, _)
            if inner.code == rusqlite::ErrorCode::ConstraintViolation
    )
}

fn read_node_row(row: &rusqlite::Row<'_>) -> Result<NodeRow, rusqlite::Error> {
    Ok(NodeRow {
        id: row.get(0)?,
        label: row.get(1)?,
        kind: row.get(2)?,
        name: row.get(3)?,
        codebase: row.get(4)?,
        props_json: row.get(5)?,
        created_at_ms: row.get(6)?,
        updated_at_ms: row.get(7)?,
    })
}

fn read_edge_row(row: &rusqlite::Row<'_>) -> Result<EdgeRow, rusqlite::Error> {
    Ok(EdgeRow {
        id: row.get(0)?,
        edge_type: row.get(1)?,
        source_id: row.get(2)?,
        target_id: row.get(3)?,
        props_json: row.get(4)?,
        created_at_ms: row.get(5)?,
    })
}

const NODE_COLUMNS: &str = "id, label, kind, name, codebase, props_json, created_at_ms, updated_at_ms";
const EDGE_COLUMNS: &str = "id, edge_type, source_id, target_id, props_json, created_at_ms";

/// Insert a node; a duplicate id surfaces the backend unique constraint as
/// CONFLICT rather than silently overwriting.
pub(in crate::store) fn insert_node_tx(
    tx: &Transaction<'_>,
    node: &NodeRow,
) -> Result<(), StoreError> {
    let result = tx.execute(
        r#"
        INSERT INTO graph_nodes(id, label, kind, name, codebase, props_json, created_at_ms, updated_at_ms)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
        "#,
        params![
            node.id,
            node.label,
            node.kind,
            node.name,
            node.codebase,
            node.props_json,
            node.created_at_ms,
            node.updated_at_ms
        ],
    );
    match result {
        Ok(_) => Ok(()),
        Err(err) if is_unique_violation(&err) => Err(StoreError::AlreadyExists {
            entity: entity_name_for_label(&node.label),
            id: node.id.clone(),
        }),
        Err(err) => Err(err.into()),
    }
}

pub(in crate::store) fn node_get_tx(
    tx: &Transaction<'_>,
    id: &str,
) -> Result<Option<NodeRow>, StoreError> {
    Ok(tx
        .query_row(
            &format!("SELECT {NODE_COLUMNS} FROM graph_nodes WHERE id=?1"),
            params![id],
            read_node_row,
        )
        .optional()?)
}

pub(in crate::store) fn node_exists_tx(
    tx: &Transaction<'_>,
    id: &str,
    label: &str,
) -> Result<bool, StoreError> {
    Ok(tx
        .query_row(
            "SELECT 1 FROM graph_nodes WHERE id=?1 AND label=?2",
            params![id, label],
            |_| Ok(()),
        )
        .optional()?
        .is_some())
}

/// Overwrite a node's mutable columns. Returns false when the node is gone.
pub(in crate::store) fn update_node_tx(
    tx: &Transaction<'_>,
    node: &NodeRow,
) -> Result<bool, StoreError> {
    let updated = tx.execute(
        r#"
        UPDATE graph_nodes
        SET kind=?2, name=?3, codebase=?4, props_json=?5, updated_at_ms=?6
        WHERE id=?1
        "#,
        params![
            node.id,
            node.kind,
            node.name,
            node.codebase,
            node.props_json,
            node.updated_at_ms
        ],
    )?;
    Ok(updated > 0)
}

pub(in crate::store) fn delete_node_tx(
    tx: &Transaction<'_>,
    id: &str,
) -> Result<bool, StoreError> {
    Ok(tx.execute("DELETE FROM graph_nodes WHERE id=?1", params![id])? > 0)
}

pub(in crate::store) fn nodes_by_label_tx(
    tx: &Transaction<'_>,
    label: &str,
) -> Result<Vec<NodeRow>, StoreError> {
    let mut stmt = tx.prepare(&format!(
        "SELECT {NODE_COLUMNS} FROM graph_nodes WHERE label=?1 ORDER BY created_at_ms ASC, id ASC"
    ))?;
    let rows = stmt.query_map(params![label], read_node_row)?;
    let mut out = Vec::new();
    for row in rows {
        out.push(row?);
    }
    Ok(out)
}

/// Component search on the indexed columns. Name matching is a
/// case-sensitive substring via `instr`.
pub(in crate::store) fn search_component_nodes_tx(
    tx: &Transaction<'_>,
    kind: Option<&str>,
    name_contains: Option<&str>,
    codebase: Option<&str>,
    limit: usize,
) -> Result<Vec<NodeRow>, StoreError> {
    let mut sql = format!("SELECT {NODE_COLUMNS} FROM graph_nodes WHERE label=?");
    let mut args: Vec<SqlValue> = vec![SqlValue::Text(LABEL_COMPONENT.to_string())];
    if let Some(kind) = kind {
        sql.push_str(" AND kind=?");
        args.push(SqlValue::Text(kind.to_string()));
    }
    if let Some(fragment) = name_contains {
        sql.push_str(" AND instr(name, ?) > 0");
        args.push(SqlValue::Text(fragment.to_string()));
    }
    if let Some(codebase) = codebase {
        sql.push_str(" AND codebase=?");
        args.push(SqlValue::Text(codebase.to_string()));
    }
    sql.push_str(" ORDER BY created_at_ms ASC, id ASC LIMIT ?");
    args.push(SqlValue::Integer(limit as i64));

    let mut stmt = tx.prepare(&sql)?;
    let rows = stmt.query_map(params_from_iter(args), read_node_row)?;
    let mut out = Vec::new();
    for row in rows {
        out.push(row?);
    }
    Ok(out)
}

pub(in crate::store) fn count_component_kinds_tx(
    tx: &Transaction<'_>,
    codebase: &str,
) -> Result<Vec<(String, i64)>, StoreError> {
    let mut stmt = tx.prepare(
        r#"
        SELECT kind, COUNT(*) AS total
        FROM graph_nodes
        WHERE label=?1 AND codebase=?2 AND kind IS NOT NULL
        GROUP BY kind
        ORDER BY total DESC, kind ASC
        "#,
    )?;
    let rows = stmt.query_map(params![LABEL_COMPONENT, codebase], |row| {
        Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?))
    })?;
    let mut out = Vec::new();
    for row in rows {
        out.push(row?);
    }
    Ok(out)
}

pub(in crate::store) fn insert_edge_tx(
    tx: &Transaction<'_>,
    edge: &EdgeRow,
) -> Result<(), StoreError> {
    let result = tx.execute(
        r#"
        INSERT INTO graph_edges(id, edge_type, source_id, target_id, props_json, created_at_ms)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6)
        "#,
        params![
            edge.id,
            edge.edge_type,
            edge.source_id,
            edge.target_id,
            edge.props_json,
            edge.created_at_ms
        ],
    );
    match result {
        Ok(_) => Ok(()),
        Err(err) if is_unique_violation(&err) => Err(StoreError::AlreadyExists {
            entity: "relationship",
            id: edge.id.clone(),
        }),
        Err(err) => Err(err.into()),
    }
}

pub(in crate::store) fn edge_get_tx(
    tx: &Transaction<'_>,
    id: &str,
) -> Result<Option<EdgeRow>, StoreError> {
    Ok(tx
        .query_row(
            &format!("SELECT {EDGE_COLUMNS} FROM graph_edges WHERE id=?1"),
            params![id],
            read_edge_row,
        )
        .optional()?)
}

pub(in crate::store) fn find_edge_tx(
    tx: &Transaction<'_>,
    source_id: &str,
    target_id: &str,
    edge_type: &str,
) -> Result<Option<EdgeRow>, StoreError> {
    Ok(tx
        .query_row(
            &format!(
                "SELECT {EDGE_COLUMNS} FROM graph_edges \
                 WHERE source_id=?1 AND target_id=?2 AND edge_type=?3 \
                 ORDER BY created_at_ms ASC LIMIT 1"
            ),
            params![source_id, target_id, edge_type],
            read_edge_row,
        )
        .optional()?)
}

pub(in crate::store) fn delete_edge_tx(
    tx: &Transaction<'_>,
    id: &str,
) -> Result<bool, StoreError> {
    Ok(tx.execute("DELETE FROM graph_edges WHERE id=?1", params![id])? > 0)
}

pub(in crate::store) fn edges_out_tx(
    tx: &Transaction<'_>,
    source_id: &str,
    edge_type: Option<&str>,
) -> Result<Vec<EdgeRow>, StoreError> {
    edges_for_node_tx(tx, "source_id", source_id, edge_type)
}

pub(in crate::store) fn edges_in_tx(
    tx: &Transaction<'_>,
    target_id: &str,
    edge_type: Option<&str>,
) -> Result<Vec<EdgeRow>, StoreError> {
    edges_for_node_tx(tx, "target_id", target_id, edge_type)
}

fn edges_for_node_tx(
    tx: &Transaction<'_>,
    column: &str,
    node_id: &str,
    edge_type: Option<&str>,
) -> Result<Vec<EdgeRow>, StoreError> {
    let mut out = Vec::new();
    match edge_type {
        Some(edge_type) => {
            let mut stmt = tx.prepare(&format!(
                "SELECT {EDGE_COLUMNS} FROM graph_edges \
                 WHERE {column}=?1 AND edge_type=?2 ORDER BY created_at_ms ASC, id ASC"
            ))?;
            let rows = stmt.query_map(params![node_id, edge_type], read_edge_row)?;
            for row in rows {
                out.push(row?);
            }
        }
        None => {
            let mut stmt = tx.prepare(&format!(
                "SELECT {EDGE_COLUMNS} FROM graph_edges \
                 WHERE {column}=?1 ORDER BY created_at_ms ASC, id ASC"
            ))?;
            let rows = stmt.query_map(params![node_id], read_edge_row)?;
            for row in rows {
                out.push(row?);
            }
        }
    }
    Ok(out)
}

pub(in crate::store) fn delete_edges_touching_tx(
    tx: &Transaction<'_>,
    node_id: &str,
) -> Result<usize, StoreError> {
    Ok(tx.execute(
        "DELETE FROM graph_edges WHERE source_id=?1 OR target_id=?1",
        params![node_id],
    )?)
}

/// Every edge whose type is not internal plumbing, in creation order.
pub(in crate::store) fn user_edges_tx(
    tx: &Transaction<'_>,
    internal_types: &[&str],
) -> Result<Vec<EdgeRow>, StoreError> {
    let mut sql = format!("SELECT {EDGE_COLUMNS} FROM graph_edges");
    let mut args: Vec<SqlValue> = Vec::new();
    if !internal_types.is_empty() {
        sql.push_str(" WHERE edge_type NOT IN (");
        for (index, edge_type) in internal_types.iter().enumerate() {
            if index > 0 {
                sql.push_str(", ");
            }
            sql.push('?');
            args.push(SqlValue::Text(edge_type.to_string()));
        }
        sql.push(')');
    }
    sql.push_str(" ORDER BY created_at_ms ASC, id ASC");
    let mut stmt = tx.prepare(&sql)?;
    let rows = stmt.query_map(params_from_iter(args), read_edge_row)?;
    let mut out = Vec::new();
    for row in rows {
        out.push(row?);
    }
    Ok(out)
}

/// Remove every entity node and edge. Journal and snapshot tables are not
/// touched; restore and replay depend on that.
pub(in crate::store) fn clear_graph_tx(
    tx: &Transaction<'_>,
) -> Result<(usize, usize), StoreError> {
    let edges = tx.execute("DELETE FROM graph_edges", [])?;
    let nodes = tx.execute("DELETE FROM graph_nodes", [])?;
    Ok((nodes, edges))
}
