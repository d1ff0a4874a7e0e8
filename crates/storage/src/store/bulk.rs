#![forbid(unsafe_code)]
//! All-or-nothing bulk inserts. One transaction per call: any failure rolls
//! the whole batch back, leaving no entities and no journal rows.

use super::components::ensure_component_tx;
use super::tasks::insert_task_with_links_tx;
use super::*;
use gm_core::error::DomainError;
use gm_core::model::{ChangeOperation, TaskStatus};

impl GraphStore {
    pub fn create_components_bulk(
        &mut self,
        inputs: Vec<ComponentInput>,
    ) -> Result<Vec<Component>, StoreError> {
        if inputs.is_empty() {
            return Err(StoreError::InvalidInput("bulk requires at least one item"));
        }
        let total = inputs.len();
        let now = now_ms();

        let mut components = Vec::with_capacity(total);
        for input in inputs {
            let Some(kind) = input.kind else {
                return Err(DomainError::MissingField("kind").into());
            };
            if input.name.trim().is_empty() {
                return Err(DomainError::EmptyName.into());
            }
            components.push(Component {
                id: input
                    .id
                    .filter(|value| !value.trim().is_empty())
                    .unwrap_or_else(new_id),
                kind,
                name: input.name,
                description: input.description,
                path: input.path,
                codebase: input.codebase,
                metadata: input.metadata,
                created_at_ms: now,
                updated_at_ms: now,
            });
        }

        let meta_json = bulk_meta_json(total);
        let ctx = self.change_ctx();
        let tx = self.conn.transaction()?;
        for component in &components {
            insert_node_tx(&tx, &component_node(component)?)?;
        }
        for component in &components {
            let after_json = serde_json::to_string(&component.to_state())?;
            journal_mutation_tx(
                &tx,
                &ctx,
                now,
                ChangeOperation::CreateComponentsBulk,
                &component.id,
                None,
                Some(&after_json),
                Some(&meta_json),
            )?;
        }
        tx.commit()?;
        Ok(components)
    }

    pub fn create_relationships_bulk(
        &mut self,
        inputs: Vec<RelationshipInput>,
    ) -> Result<Vec<Relationship>, StoreError> {
        if inputs.is_empty() {
            return Err(StoreError::InvalidInput("bulk requires at least one item"));
        }
        let total = inputs.len();
        let now = now_ms();

        let mut relationships = Vec::with_capacity(total);
        for input in inputs {
            if input.rel_type.is_internal() {
                return Err(DomainError::InternalRelationshipType(
                    input.rel_type.as_str().to_string(),
                )
                .into());
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
            relationships.push(Relationship {
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
            });
        }

        let meta_json = bulk_meta_json(total);
        let ctx = self.change_ctx();
        let tx = self.conn.transaction()?;
        for relationship in &relationships {
            ensure_component_tx(&tx, &relationship.source_id)?;
            ensure_component_tx(&tx, &relationship.target_id)?;
            insert_edge_tx(&tx, &relationship_edge(relationship)?)?;
        }
        for relationship in &relationships {
            let after_json = serde_json::to_string(&relationship.to_state())?;
            journal_mutation_tx(
                &tx,
                &ctx,
                now,
                ChangeOperation::CreateRelationshipsBulk,
                &relationship.id,
                None,
                Some(&after_json),
                Some(&meta_json),
            )?;
        }
        tx.commit()?;
        Ok(relationships)
    }

    pub fn create_tasks_bulk(&mut self, inputs: Vec<TaskInput>) -> Result<Vec<Task>, StoreError> {
        if inputs.is_empty() {
            return Err(StoreError::InvalidInput("bulk requires at least one item"));
        }
        let total = inputs.len();
        let now = now_ms();

        let mut tasks = Vec::with_capacity(total);
        for input in inputs {
            if input.name.trim().is_empty() {
                return Err(DomainError::EmptyName.into());
            }
            let progress = input.progress.unwrap_or(0.0);
            if !(0.0..=1.0).contains(&progress) {
                return Err(DomainError::ProgressOutOfRange(progress).into());
            }
            let mut related = input.related_component_ids;
            related.sort();
            related.dedup();
            tasks.push(Task {
                id: input
                    .id
                    .filter(|value| !value.trim().is_empty())
                    .unwrap_or_else(new_id),
                name: input.name,
                description: input.description,
                status: input.status.unwrap_or(TaskStatus::Todo),
                progress,
                codebase: input.codebase,
                related_component_ids: related,
                metadata: input.metadata,
                created_at_ms: now,
                updated_at_ms: now,
            });
        }

        let meta_json = bulk_meta_json(total);
        let ctx = self.change_ctx();
        let tx = self.conn.transaction()?;
        for task in &tasks {
            insert_task_with_links_tx(&tx, task)?;
        }
        for task in &tasks {
            let after_json = serde_json::to_string(&task.to_state())?;
            journal_mutation_tx(
                &tx,
                &ctx,
                now,
                ChangeOperation::CreateTasksBulk,
                &task.id,
                None,
                Some(&after_json),
                Some(&meta_json),
            )?;
        }
        tx.commit()?;
        Ok(tasks)
    }
}
