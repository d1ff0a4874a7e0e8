#![forbid(unsafe_code)]

use super::components::{component_get_tx, ensure_component_tx};
use super::*;
use gm_core::error::DomainError;
use gm_core::model::{ChangeOperation, RelationshipType};
use rusqlite::Transaction;

const DEFAULT_TREE_DEPTH: usize = 3;

impl GraphStore {
    /// Create a typed edge between two existing Components. Temporal fields
    /// are validated and passed through verbatim.
    pub fn create_relationship(
        &mut self,
        input: RelationshipInput,
    ) -> Result<Relationship, StoreError> {
        validate_relationship_input(&input)?;
        let now = now_ms();
        let relationship = Relationship {
            id: input
                .id
                .filter(|value| !value.trim().is_empty())
                .unwrap_or_else(new_id),
            rel_type: input.rel_type,
            source_id: input.source_id,
            target_id: input.target_id,
            details: input.details,
            time_order: input.time_order,
            probability: input.probability,
            reasoning: input.reasoning,
            created_at_ms: now,
        };
        let after_json = serde_json::to_string(&relationship.to_state())?;
        let ctx = self.change_ctx();
        let tx = self.conn.transaction()?;

        ensure_component_tx(&tx, &relationship.source_id)?;
        ensure_component_tx(&tx, &relationship.target_id)?;
        insert_edge_tx(&tx, &relationship_edge(&relationship)?)?;
        journal_mutation_tx(
            &tx,
            &ctx,
            now,
            ChangeOperation::CreateRelationship,
            &relationship.id,
            None,
            Some(&after_json),
            None,
        )?;
        tx.commit()?;
        Ok(relationship)
    }

    /// Explicitly remove one relationship. Internal edges are invisible here.
    pub fn delete_relationship(&mut self, id: &str) -> Result<(), StoreError> {
        let now = now_ms();
        let ctx = self.change_ctx();
        let tx = self.conn.transaction()?;

        let edge = edge_get_tx(&tx, id)?.filter(|edge| {
            RelationshipType::parse(&edge.edge_type)
                .map(|t| !t.is_internal())
                .unwrap_or(false)
        });
        let Some(edge) = edge else {
            return Err(StoreError::NotFound {
                entity: "relationship",
                id: id.to_string(),
            });
        };

        let relationship = relationship_from_edge(edge)?;
        let before_json = serde_json::to_string(&relationship.to_state())?;
        delete_edge_tx(&tx, id)?;
        journal_mutation_tx(
            &tx,
            &ctx,
            now,
            ChangeOperation::DeleteRelationship,
            id,
            Some(&before_json),
            None,
            None,
        )?;
        tx.commit()?;
        Ok(())
    }

    /// Edges incident to a component, each paired with the neighbor on the
    /// far side. HAS_COMMENT and RELATES_TO never appear in the result.
    pub fn get_component_relationships(
        &mut self,
        component_id: &str,
        direction: RelationshipDirection,
    ) -> Result<Vec<ComponentLink>, StoreError> {
        let tx = self.conn.transaction()?;
        ensure_component_tx(&tx, component_id)?;

        let mut links = Vec::new();
        if matches!(
            direction,
            RelationshipDirection::Outgoing | RelationshipDirection::Both
        ) {
            for edge in edges_out_tx(&tx, component_id, None)? {
                collect_link_tx(&tx, edge, RelationshipDirection::Outgoing, &mut links)?;
            }
        }
        if matches!(
            direction,
            RelationshipDirection::Incoming | RelationshipDirection::Both
        ) {
            for edge in edges_in_tx(&tx, component_id, None)? {
                collect_link_tx(&tx, edge, RelationshipDirection::Incoming, &mut links)?;
            }
        }
        tx.commit()?;
        Ok(links)
    }

    /// Every DEPENDS_ON chain starting at `root_id`, root first, up to
    /// `max_depth` edges (default 3). Cycles are not suppressed; the depth
    /// bound prevents infinite expansion.
    pub fn get_dependency_tree(
        &mut self,
        root_id: &str,
        max_depth: Option<usize>,
    ) -> Result<Vec<DependencyPath>, StoreError> {
        let max_depth = max_depth.unwrap_or(DEFAULT_TREE_DEPTH).max(1);
        let tx = self.conn.transaction()?;
        let Some(root) = component_get_tx(&tx, root_id)? else {
            return Err(StoreError::NotFound {
                entity: "component",
                id: root_id.to_string(),
            });
        };

        let depends_on = RelationshipType::DependsOn.as_str();
        let mut paths = Vec::new();
        let mut frontier: Vec<Vec<Component>> = vec![vec![root]];
        while let Some(path) = frontier.pop() {
            let last = path.last().map(|c| c.id.clone()).unwrap_or_default();
            for edge in edges_out_tx(&tx, &last, Some(depends_on))? {
                let Some(neighbor) = component_get_tx(&tx, &edge.target_id)? else {
                    continue;
                };
                let mut extended = path.clone();
                extended.push(neighbor);
                // Path length in edges is components - 1.
                if extended.len() - 1 < max_depth {
                    frontier.push(extended.clone());
                }
                paths.push(DependencyPath {
                    components: extended,
                });
            }
        }
        tx.commit()?;
        Ok(paths)
    }
}

fn collect_link_tx(
    tx: &Transaction<'_>,
    edge: EdgeRow,
    direction: RelationshipDirection,
    links: &mut Vec<ComponentLink>,
) -> Result<(), StoreError> {
    let Ok(rel_type) = RelationshipType::parse(&edge.edge_type) else {
        return Ok(());
    };
    if rel_type.is_internal() {
        return Ok(());
    }
    let neighbor_id = match direction {
        RelationshipDirection::Outgoing => edge.target_id.clone(),
        _ => edge.source_id.clone(),
    };
    let Some(neighbor) = component_get_tx(tx, &neighbor_id)? else {
        return Ok(());
    };
    links.push(ComponentLink {
        relationship: relationship_from_edge(edge)?,
        neighbor,
        direction,
    });
    Ok(())
}

fn validate_relationship_input(input: &RelationshipInput) -> Result<(), StoreError> {
    if input.rel_type.is_internal() {
        return Err(
            DomainError::InternalRelationshipType(input.rel_type.as_str().to_string()).into(),
        );
    }
    if input.source_id.trim().is_empty() {
        return Err(DomainError::MissingField("sourceId").into());
    }
    if input.target_id.trim().is_empty() {
        return Err(DomainError::MissingField("targetId").into());
    }
    if let Some(probability) = input.probability
        && !(0.0..=1.0).contains(&probability)
    {
        return Err(DomainError::ProbabilityOutOfRange(probability).into());
    }
    if let Some(time_order) = input.time_order
        && time_order < 1
    {
        return Err(DomainError::TimeOrderNotPositive(time_order).into());
    }
    Ok(())
}
