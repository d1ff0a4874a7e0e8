#![forbid(unsafe_code)]

use super::components::ensure_component_tx;
use super::*;
use gm_core::error::DomainError;
use gm_core::model::{ChangeOperation, RelationshipType, TaskStatus};
use rusqlite::Transaction;

impl GraphStore {
    /// Create a Task. Related components must exist; each link becomes a
    /// RELATES_TO edge. Journals CREATE_TASK.
    pub fn create_task(&mut self, input: TaskInput) -> Result<Task, StoreError> {
        let task = build_task(input)?;
        let after_json = serde_json::to_string(&task.to_state())?;
        let ctx = self.change_ctx();
        let tx = self.conn.transaction()?;
        insert_task_with_links_tx(&tx, &task)?;
        journal_mutation_tx(
            &tx,
            &ctx,
            task.created_at_ms,
            ChangeOperation::CreateTask,
            &task.id,
            None,
            Some(&after_json),
            None,
        )?;
        tx.commit()?;
        Ok(task)
    }

    pub fn get_task(&mut self, id: &str) -> Result<Task, StoreError> {
        let tx = self.conn.transaction()?;
        let found = task_get_tx(&tx, id)?;
        tx.commit()?;
        found.ok_or_else(|| StoreError::NotFound {
            entity: "task",
            id: id.to_string(),
        })
    }

    /// All tasks, optionally narrowed to one status, in creation order.
    pub fn get_tasks(&mut self, status: Option<TaskStatus>) -> Result<Vec<Task>, StoreError> {
        let tx = self.conn.transaction()?;
        let nodes = nodes_by_label_tx(&tx, LABEL_TASK)?;
        tx.commit()?;
        let mut tasks = Vec::with_capacity(nodes.len());
        for node in nodes {
            let task = task_from_node(node)?;
            if status.is_none_or(|wanted| task.status == wanted) {
                tasks.push(task);
            }
        }
        Ok(tasks)
    }

    /// Update status and, when provided, progress. Journals UPDATE_TASK with
    /// before and after states.
    pub fn update_task_status(
        &mut self,
        id: &str,
        status: TaskStatus,
        progress: Option<f64>,
    ) -> Result<Task, StoreError> {
        if let Some(progress) = progress
            && !(0.0..=1.0).contains(&progress)
        {
            return Err(DomainError::ProgressOutOfRange(progress).into());
        }

        let now = now_ms();
        let ctx = self.change_ctx();
        let tx = self.conn.transaction()?;

        let Some(existing) = task_get_tx(&tx, id)? else {
            return Err(StoreError::NotFound {
                entity: "task",
                id: id.to_string(),
            });
        };
        let before_json = serde_json::to_string(&existing.to_state())?;

        let mut updated = existing;
        updated.status = status;
        if let Some(progress) = progress {
            updated.progress = progress;
        }
        updated.updated_at_ms = now;

        let after_json = serde_json::to_string(&updated.to_state())?;
        update_node_tx(&tx, &task_node(&updated)?)?;
        journal_mutation_tx(
            &tx,
            &ctx,
            now,
            ChangeOperation::UpdateTask,
            id,
            Some(&before_json),
            Some(&after_json),
            None,
        )?;
        tx.commit()?;
        Ok(updated)
    }

    /// Criteria-based task search with ordering and a bounded page.
    pub fn search_tasks(&mut self, criteria: TaskSearchCriteria) -> Result<Vec<Task>, StoreError> {
        let limit = criteria.limit.clamp(1, TASK_SEARCH_CAP);
        let tx = self.conn.transaction()?;
        let nodes = nodes_by_label_tx(&tx, LABEL_TASK)?;
        tx.commit()?;

        let mut tasks = Vec::new();
        for node in nodes {
            let task = task_from_node(node)?;
            if task_matches(&task, &criteria) {
                tasks.push(task);
            }
        }

        tasks.sort_by(|a, b| {
            let ordering = match criteria.order_by {
                TaskOrderBy::Created => a
                    .created_at_ms
                    .cmp(&b.created_at_ms)
                    .then_with(|| a.id.cmp(&b.id)),
                TaskOrderBy::Name => a.name.cmp(&b.name).then_with(|| a.id.cmp(&b.id)),
                TaskOrderBy::Status => a
                    .status
                    .as_str()
                    .cmp(b.status.as_str())
                    .then_with(|| a.id.cmp(&b.id)),
                TaskOrderBy::Progress => a
                    .progress
                    .partial_cmp(&b.progress)
                    .unwrap_or(std::cmp::Ordering::Equal)
                    .then_with(|| a.id.cmp(&b.id)),
            };
            match criteria.order_direction {
                OrderDirection::Asc => ordering,
                OrderDirection::Desc => ordering.reverse(),
            }
        });
        tasks.truncate(limit);
        Ok(tasks)
    }
}

pub(in crate::store) fn task_get_tx(
    tx: &Transaction<'_>,
    id: &str,
) -> Result<Option<Task>, StoreError> {
    match node_get_tx(tx, id)? {
        Some(node) if node.label == LABEL_TASK => Ok(Some(task_from_node(node)?)),
        _ => Ok(None),
    }
}

/// Insert a task node plus its RELATES_TO links. Every related component
/// must already exist. Shared by create, bulk create, and replay.
pub(in crate::store) fn insert_task_with_links_tx(
    tx: &Transaction<'_>,
    task: &Task,
) -> Result<(), StoreError> {
    for component_id in &task.related_component_ids {
        ensure_component_tx(tx, component_id)?;
    }
    insert_node_tx(tx, &task_node(task)?)?;
    for component_id in &task.related_component_ids {
        insert_edge_tx(
            tx,
            &EdgeRow {
                id: new_id(),
                edge_type: RelationshipType::RelatesTo.as_str().to_string(),
                source_id: task.id.clone(),
                target_id: component_id.clone(),
                props_json: None,
                created_at_ms: task.created_at_ms,
            },
        )?;
    }
    Ok(())
}

fn build_task(input: TaskInput) -> Result<Task, StoreError> {
    if input.name.trim().is_empty() {
        return Err(DomainError::EmptyName.into());
    }
    let progress = input.progress.unwrap_or(0.0);
    if !(0.0..=1.0).contains(&progress) {
        return Err(DomainError::ProgressOutOfRange(progress).into());
    }
    let now = now_ms();
    let mut related = input.related_component_ids;
    related.sort();
    related.dedup();
    Ok(Task {
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
    })
}

fn task_matches(task: &Task, criteria: &TaskSearchCriteria) -> bool {
    if let Some(query) = criteria.text_query.as_deref() {
        let in_name = task.name.contains(query);
        let in_description = task
            .description
            .as_deref()
            .map(|d| d.contains(query))
            .unwrap_or(false);
        if !in_name && !in_description {
            return false;
        }
    }
    if let Some(statuses) = criteria.statuses.as_deref()
        && !statuses.contains(&task.status)
    {
        return false;
    }
    if let Some(min) = criteria.progress_min
        && task.progress < min
    {
        return false;
    }
    if let Some(max) = criteria.progress_max
        && task.progress > max
    {
        return false;
    }
    if let Some(from) = criteria.created_from_ms
        && task.created_at_ms < from
    {
        return false;
    }
    if let Some(to) = criteria.created_to_ms
        && task.created_at_ms > to
    {
        return false;
    }
    if let Some(wanted) = criteria.related_component_ids.as_deref()
        && !wanted.is_empty()
    {
        let overlap = task
            .related_component_ids
            .iter()
            .any(|id| wanted.iter().any(|w| w == id));
        if !overlap {
            return false;
        }
    }
    true
}
