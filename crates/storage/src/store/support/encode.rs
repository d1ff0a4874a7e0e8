#![forbid(unsafe_code)]
//! Entity <-> backend-row codecs. JSON stays at this boundary; the rest of
//! the store works with typed records.

use super::graph_tx::{EdgeRow, NodeRow, LABEL_COMMENT, LABEL_COMPONENT, LABEL_TASK};
use crate::store::types::{
    Comment, CommentState, Component, ComponentState, Relationship, RelationshipState, Task,
    TaskState,
};
use crate::store::StoreError;
use gm_core::metadata::MetadataMap;
use gm_core::model::RelationshipType;

pub(in crate::store) fn component_node(component: &Component) -> Result<NodeRow, StoreError> {
    Ok(NodeRow {
        id: component.id.clone(),
        label: LABEL_COMPONENT.to_string(),
        kind: Some(component.kind.as_str().to_string()),
        name: Some(component.name.clone()),
        codebase: component.codebase.clone(),
        props_json: serde_json::to_string(&component.to_state())?,
        created_at_ms: component.created_at_ms,
        updated_at_ms: component.updated_at_ms,
    })
}

pub(in crate::store) fn component_from_node(node: NodeRow) -> Result<Component, StoreError> {
    let state: ComponentState = serde_json::from_str(&node.props_json)?;
    Component::from_state(state)
}

pub(in crate::store) fn task_node(task: &Task) -> Result<NodeRow, StoreError> {
    Ok(NodeRow {
        id: task.id.clone(),
        label: LABEL_TASK.to_string(),
        kind: None,
        name: Some(task.name.clone()),
        codebase: task.codebase.clone(),
        props_json: serde_json::to_string(&task.to_state())?,
        created_at_ms: task.created_at_ms,
        updated_at_ms: task.updated_at_ms,
    })
}

pub(in crate::store) fn task_from_node(node: NodeRow) -> Result<Task, StoreError> {
    let state: TaskState = serde_json::from_str(&node.props_json)?;
    Task::from_state(state)
}

pub(in crate::store) fn comment_node(comment: &Comment) -> Result<NodeRow, StoreError> {
    Ok(NodeRow {
        id: comment.id.clone(),
        label: LABEL_COMMENT.to_string(),
        kind: None,
        name: None,
        codebase: None,
        props_json: serde_json::to_string(&comment.to_state())?,
        created_at_ms: comment.created_at_ms,
        updated_at_ms: comment.updated_at_ms.unwrap_or(comment.created_at_ms),
    })
}

pub(in crate::store) fn comment_from_node(node: NodeRow) -> Result<Comment, StoreError> {
    let state: CommentState = serde_json::from_str(&node.props_json)?;
    Comment::from_state(state)
}

pub(in crate::store) fn relationship_edge(rel: &Relationship) -> Result<EdgeRow, StoreError> {
    Ok(EdgeRow {
        id: rel.id.clone(),
        edge_type: rel.rel_type.as_str().to_string(),
        source_id: rel.source_id.clone(),
        target_id: rel.target_id.clone(),
        props_json: Some(serde_json::to_string(&rel.to_state())?),
        created_at_ms: rel.created_at_ms,
    })
}

pub(in crate::store) fn relationship_from_edge(edge: EdgeRow) -> Result<Relationship, StoreError> {
    match edge.props_json {
        Some(props) => {
            let state: RelationshipState = serde_json::from_str(&props)?;
            Relationship::from_state(state)
        }
        // Internal edges carry no props; rebuild from the columns alone.
        None => Ok(Relationship {
            id: edge.id,
            rel_type: RelationshipType::parse(&edge.edge_type)?,
            source_id: edge.source_id,
            target_id: edge.target_id,
            details: MetadataMap::new(),
            time_order: None,
            probability: None,
            reasoning: None,
            created_at_ms: edge.created_at_ms,
        }),
    }
}
