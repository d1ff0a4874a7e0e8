#![forbid(unsafe_code)]

use super::parse_metadata;
use crate::api::{
    CreateTaskRequest, CreateTasksBulkRequest, GetTaskRequest, GetTasksRequest,
    SearchTasksRequest, UpdateTaskStatusRequest,
};
use crate::error::ApiError;
use crate::render::task_json;
use crate::Service;
use gm_broker::events;
use gm_core::model::TaskStatus;
use gm_core::time::rfc3339_to_ts_ms;
use gm_storage::{OrderDirection, TaskInput, TaskOrderBy, TaskSearchCriteria};
use serde_json::{json, Value};

fn task_input(request: CreateTaskRequest) -> Result<TaskInput, ApiError> {
    Ok(TaskInput {
        id: request.id,
        name: request.name,
        description: request.description,
        status: request.status.as_deref().map(TaskStatus::parse).transpose()?,
        progress: request.progress,
        codebase: request.codebase,
        related_component_ids: request.related_component_ids,
        metadata: parse_metadata(request.metadata)?,
    })
}

impl Service {
    pub(crate) fn op_create_task(&self, args: Value) -> Result<Value, ApiError> {
        let request: CreateTaskRequest = serde_json::from_value(args)?;
        let task = self.store().create_task(task_input(request)?)?;
        let rendered = task_json(&task);
        self.publish(events::TASK_CREATED, rendered.clone());
        Ok(rendered)
    }

    pub(crate) fn op_get_task(&self, args: Value) -> Result<Value, ApiError> {
        let request: GetTaskRequest = serde_json::from_value(args)?;
        let task = self.store().get_task(&request.id)?;
        Ok(task_json(&task))
    }

    pub(crate) fn op_get_tasks(&self, args: Value) -> Result<Value, ApiError> {
        let request: GetTasksRequest = serde_json::from_value(args)?;
        let status = request
            .status
            .as_deref()
            .map(TaskStatus::parse)
            .transpose()?;
        let tasks = self.store().get_tasks(status)?;
        Ok(json!({
            "tasks": tasks.iter().map(task_json).collect::<Vec<_>>(),
            "count": tasks.len(),
        }))
    }

    pub(crate) fn op_search_tasks(&self, args: Value) -> Result<Value, ApiError> {
        let request: SearchTasksRequest = serde_json::from_value(args)?;
        let mut criteria = TaskSearchCriteria {
            text_query: request.text_query,
            related_component_ids: request.related_component_ids,
            ..Default::default()
        };
        if let Some(list) = request.status_list {
            let mut statuses = Vec::with_capacity(list.len());
            for raw in &list {
                statuses.push(TaskStatus::parse(raw)?);
            }
            criteria.statuses = Some(statuses);
        }
        if let Some(range) = request.progress_range {
            criteria.progress_min = range.min;
            criteria.progress_max = range.max;
        }
        if let Some(range) = request.created_range {
            criteria.created_from_ms = range.from.as_deref().map(rfc3339_to_ts_ms).transpose()?;
            criteria.created_to_ms = range.to.as_deref().map(rfc3339_to_ts_ms).transpose()?;
        }
        if let Some(order_by) = request.order_by.as_deref() {
            criteria.order_by = TaskOrderBy::parse(order_by)?;
        }
        if let Some(direction) = request.order_direction.as_deref() {
            criteria.order_direction = OrderDirection::parse(direction)?;
        }
        if let Some(limit) = request.limit {
            criteria.limit = limit;
        }
        let tasks = self.store().search_tasks(criteria)?;
        Ok(json!({
            "tasks": tasks.iter().map(task_json).collect::<Vec<_>>(),
            "count": tasks.len(),
        }))
    }

    pub(crate) fn op_update_task_status(&self, args: Value) -> Result<Value, ApiError> {
        let request: UpdateTaskStatusRequest = serde_json::from_value(args)?;
        let status = TaskStatus::parse(&request.status)?;
        let task = self
            .store()
            .update_task_status(&request.id, status, request.progress)?;
        let rendered = task_json(&task);
        self.publish(events::TASK_UPDATED, rendered.clone());
        Ok(rendered)
    }

    pub(crate) fn op_create_tasks_bulk(&self, args: Value) -> Result<Value, ApiError> {
        let request: CreateTasksBulkRequest = serde_json::from_value(args)?;
        let inputs = request
            .tasks
            .into_iter()
            .map(task_input)
            .collect::<Result<Vec<_>, _>>()?;
        let tasks = self.store().create_tasks_bulk(inputs)?;
        let items: Vec<Value> = tasks.iter().map(task_json).collect();
        self.publish(
            events::TASKS_BULK_CREATED,
            json!({ "items": items, "count": items.len() }),
        );
        Ok(json!({ "tasks": items, "count": tasks.len() }))
    }
}
