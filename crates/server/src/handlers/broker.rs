#![forbid(unsafe_code)]

use crate::api::{
    CancelCommandRequest, CancelWaitRequest, GetCommandHistoryRequest, SendCommandRequest,
    WaitForCommandRequest,
};
use crate::error::ApiError;
use crate::render::{command_json, history_entry_json, send_outcome_json, waiting_agent_json};
use crate::Service;
use gm_broker::{CommandInput, WaitFilters};
use gm_core::model::Priority;
use serde_json::{json, Map, Value};

fn wait_filters(request: Option<crate::api::WaitFiltersRequest>) -> Result<WaitFilters, ApiError> {
    let Some(request) = request else {
        return Ok(WaitFilters::default());
    };
    Ok(WaitFilters {
        task_types: request.task_types,
        component_ids: request.component_ids,
        min_priority: request
            .min_priority
            .as_deref()
            .map(Priority::parse)
            .transpose()?,
    })
}

impl Service {
    /// Blocks the calling thread until a command matches, the wait is
    /// cancelled, or the deadline passes. The store is not locked meanwhile.
    pub(crate) fn op_wait_for_command(&self, args: Value) -> Result<Value, ApiError> {
        let request: WaitForCommandRequest = serde_json::from_value(args)?;
        let filters = wait_filters(request.filters)?;
        let command =
            self.broker()
                .wait_for_command(&request.agent_id, request.timeout_ms, filters)?;
        Ok(command_json(&command))
    }

    pub(crate) fn op_send_command(&self, args: Value) -> Result<Value, ApiError> {
        let request: SendCommandRequest = serde_json::from_value(args)?;
        let outcome = self.broker().send_command(CommandInput {
            id: request.id,
            command_type: request.command_type,
            source: request.source,
            payload: request.payload.unwrap_or_else(Map::new),
            priority: request
                .priority
                .as_deref()
                .map(Priority::parse)
                .transpose()?,
            target_component_ids: request.target_component_ids,
            task_type: request.task_type,
        })?;
        Ok(send_outcome_json(&outcome))
    }

    pub(crate) fn op_get_waiting_agents(&self, _args: Value) -> Result<Value, ApiError> {
        let agents = self.broker().waiting_agents();
        Ok(json!({
            "agents": agents.iter().map(waiting_agent_json).collect::<Vec<_>>(),
            "count": agents.len(),
        }))
    }

    pub(crate) fn op_get_pending_commands(&self, _args: Value) -> Result<Value, ApiError> {
        let pending = self.broker().pending_commands();
        Ok(json!({
            "commands": pending.iter().map(command_json).collect::<Vec<_>>(),
            "count": pending.len(),
        }))
    }

    pub(crate) fn op_cancel_command(&self, args: Value) -> Result<Value, ApiError> {
        let request: CancelCommandRequest = serde_json::from_value(args)?;
        let cancelled = self.broker().cancel_command(&request.id);
        Ok(json!({ "cancelled": cancelled, "id": request.id }))
    }

    pub(crate) fn op_cancel_wait(&self, args: Value) -> Result<Value, ApiError> {
        let request: CancelWaitRequest = serde_json::from_value(args)?;
        let cancelled = self.broker().cancel_wait(&request.agent_id);
        Ok(json!({ "cancelled": cancelled, "agentId": request.agent_id }))
    }

    pub(crate) fn op_get_command_history(&self, args: Value) -> Result<Value, ApiError> {
        let request: GetCommandHistoryRequest = serde_json::from_value(args)?;
        let entries = self.broker().history(request.limit);
        Ok(json!({
            "entries": entries.iter().map(history_entry_json).collect::<Vec<_>>(),
            "count": entries.len(),
        }))
    }
}
