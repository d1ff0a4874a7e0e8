#![forbid(unsafe_code)]

use super::*;
use gm_core::error::DomainError;
use gm_core::model::ChangeOperation;
use rusqlite::Transaction;

impl GraphStore {
    /// Create a Component, assigning a fresh id when the input carries none.
    /// Journals CREATE_COMPONENT with the created state.
    pub fn create_component(&mut self, input: ComponentInput) -> Result<Component, StoreError> {
        let component = build_component(input)?;
        let after_json = serde_json::to_string(&component.to_state())?;
        let ctx = self.change_ctx();
        let tx = self.conn.transaction()?;
        insert_node_tx(&tx, &component_node(&component)?)?;
        journal_mutation_tx(
            &tx,
            &ctx,
            component.created_at_ms,
            ChangeOperation::CreateComponent,
            &component.id,
            None,
            Some(&after_json),
            None,
        )?;
        tx.commit()?;
        Ok(component)
    }

    pub fn get_component(&mut self, id: &str) -> Result<Component, StoreError> {
        let tx = self.conn.transaction()?;
        let found = component_get_tx(&tx, id)?;
        tx.commit()?;
        found.ok_or_else(|| StoreError::NotFound {
            entity: "component",
            id: id.to_string(),
        })
    }

    /// Filtered component search. Results are capped at
    /// [`COMPONENT_SEARCH_CAP`]; ordering is stable within one transaction.
    pub fn search_components(
        &mut self,
        filter: ComponentFilter,
    ) -> Result<Vec<Component>, StoreError> {
        let tx = self.conn.transaction()?;
        let nodes = search_component_nodes_tx(
            &tx,
            filter.kind.map(|k| k.as_str()),
            filter.name_contains.as_deref(),
            filter.codebase.as_deref(),
            COMPONENT_SEARCH_CAP,
        )?;
        tx.commit()?;
        nodes.into_iter().map(component_from_node).collect()
    }

    /// Merge a patch into an existing Component. The id is immutable.
    /// Journals UPDATE_COMPONENT with before and after states.
    pub fn update_component(
        &mut self,
        id: &str,
        patch: ComponentPatch,
    ) -> Result<Component, StoreError> {
        if patch.is_empty() {
            return Err(StoreError::InvalidInput("no fields to update"));
        }
        if let Some(name) = patch.name.as_deref()
            && name.trim().is_empty()
        {
            return Err(DomainError::EmptyName.into());
        }

        let now = now_ms();
        let ctx = self.change_ctx();
        let tx = self.conn.transaction()?;

        let Some(existing) = component_get_tx(&tx, id)? else {
            return Err(StoreError::NotFound {
                entity: "component",
                id: id.to_string(),
            });
        };
        let before_json = serde_json::to_string(&existing.to_state())?;

        let mut updated = existing;
        if let Some(kind) = patch.kind {
            updated.kind = kind;
        }
        if let Some(name) = patch.name {
            updated.name = name;
        }
        if let Some(description) = patch.description {
            updated.description = Some(description);
        }
        if let Some(path) = patch.path {
            updated.path = Some(path);
        }
        if let Some(codebase) = patch.codebase {
            updated.codebase = Some(codebase);
        }
        if let Some(metadata) = patch.metadata {
            updated.metadata = metadata;
        }
        updated.updated_at_ms = now;

        let after_json = serde_json::to_string(&updated.to_state())?;
        update_node_tx(&tx, &component_node(&updated)?)?;
        journal_mutation_tx(
            &tx,
            &ctx,
            now,
            ChangeOperation::UpdateComponent,
            id,
            Some(&before_json),
            Some(&after_json),
            None,
        )?;
        tx.commit()?;
        Ok(updated)
    }

    /// Delete a Component together with every incident relationship and every
    /// attached comment, in one transaction. Only DELETE_COMPONENT is
    /// journaled; the cascade is implied.
    pub fn delete_component(&mut self, id: &str) -> Result<(), StoreError> {
        let now = now_ms();
        let ctx = self.change_ctx();
        let tx = self.conn.transaction()?;

        let Some(existing) = component_get_tx(&tx, id)? else {
            return Err(StoreError::NotFound {
                entity: "component",
                id: id.to_string(),
            });
        };
        let before_json = serde_json::to_string(&existing.to_state())?;

        delete_component_cascade_tx(&tx, id)?;
        journal_mutation_tx(
            &tx,
            &ctx,
            now,
            ChangeOperation::DeleteComponent,
            id,
            Some(&before_json),
            None,
            None,
        )?;
        tx.commit()?;
        Ok(())
    }
}

pub(in crate::store) fn component_get_tx(
    tx: &Transaction<'_>,
    id: &str,
) -> Result<Option<Component>, StoreError> {
    match node_get_tx(tx, id)? {
        Some(node) if node.label == LABEL_COMPONENT => Ok(Some(component_from_node(node)?)),
        _ => Ok(None),
    }
}

pub(in crate::store) fn ensure_component_tx(
    tx: &Transaction<'_>,
    id: &str,
) -> Result<(), StoreError> {
    if !node_exists_tx(tx, id, LABEL_COMPONENT)? {
        return Err(StoreError::NotFound {
            entity: "component",
            id: id.to_string(),
        });
    }
    Ok(())
}

/// Remove a component node, its incident edges, and the comment nodes hanging
/// off it. Shared by `delete_component` and replay.
pub(in crate::store) fn delete_component_cascade_tx(
    tx: &Transaction<'_>,
    id: &str,
) -> Result<(), StoreError> {
    let comment_edges = edges_out_tx(tx, id, Some(gm_core::model::RelationshipType::HasComment.as_str()))?;
    for edge in comment_edges {
        delete_edges_touching_tx(tx, &edge.target_id)?;
        delete_node_tx(tx, &edge.target_id)?;
    }
    delete_edges_touching_tx(tx, id)?;
    delete_node_tx(tx, id)?;
    Ok(())
}

fn build_component(input: ComponentInput) -> Result<Component, StoreError> {
    let Some(kind) = input.kind else {
        return Err(DomainError::MissingField("kind").into());
    };
    if input.name.trim().is_empty() {
        return Err(DomainError::EmptyName.into());
    }
    let now = now_ms();
    let id = input
        .id
        .filter(|value| !value.trim().is_empty())
        .unwrap_or_else(new_id);
    Ok(Component {
        id,
        kind,
        name: input.name,
        description: input.description,
        path: input.path,
        codebase: input.codebase,
        metadata: input.metadata,
        created_at_ms: now,
        updated_at_ms: now,
    })
}
