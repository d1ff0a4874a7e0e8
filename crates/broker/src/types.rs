#![forbid(unsafe_code)]

use gm_core::model::Priority;
use gm_core::time::ts_ms_to_rfc3339;
use serde_json::{json, Map, Value};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CommandStatus {
    Pending,
    Delivered,
    Cancelled,
}

impl CommandStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Delivered => "DELIVERED",
            Self::Cancelled => "CANCELLED",
        }
    }
}

/// Externally supplied command. Missing id/timestamp/priority are filled in
/// by the broker.
#[derive(Clone, Debug, Default)]
pub struct CommandInput {
    pub id: Option<String>,
    pub command_type: String,
    pub source: Option<String>,
    pub payload: Map<String, Value>,
    pub priority: Option<Priority>,
    pub target_component_ids: Vec<String>,
    pub task_type: Option<String>,
}

/// A command somewhere in its PENDING -> (DELIVERED | CANCELLED) lifecycle.
#[derive(Clone, Debug)]
pub struct PendingCommand {
    pub id: String,
    pub command_type: String,
    pub source: String,
    pub payload: Map<String, Value>,
    pub priority: Priority,
    pub target_component_ids: Vec<String>,
    pub task_type: Option<String>,
    pub created_at_ms: i64,
    pub status: CommandStatus,
    pub delivered_to: Option<String>,
    pub delivered_at_ms: Option<i64>,
}

impl PendingCommand {
    pub fn to_json(&self) -> Value {
        let mut map = Map::new();
        map.insert("id".to_string(), json!(self.id));
        map.insert("type".to_string(), json!(self.command_type));
        map.insert("source".to_string(), json!(self.source));
        map.insert("payload".to_string(), Value::Object(self.payload.clone()));
        map.insert("priority".to_string(), json!(self.priority.as_str()));
        map.insert(
            "targetComponentIds".to_string(),
            json!(self.target_component_ids),
        );
        map.insert("status".to_string(), json!(self.status.as_str()));
        map.insert(
            "createdAt".to_string(),
            json!(ts_ms_to_rfc3339(self.created_at_ms)),
        );
        map.insert("createdAtMs".to_string(), json!(self.created_at_ms));
        if let Some(task_type) = &self.task_type {
            map.insert("taskType".to_string(), json!(task_type));
        }
        if let Some(delivered_to) = &self.delivered_to {
            map.insert("deliveredTo".to_string(), json!(delivered_to));
        }
        if let Some(delivered_at_ms) = self.delivered_at_ms {
            map.insert(
                "deliveredAt".to_string(),
                json!(ts_ms_to_rfc3339(delivered_at_ms)),
            );
            map.insert("deliveredAtMs".to_string(), json!(delivered_at_ms));
        }
        Value::Object(map)
    }
}

/// Per-agent command filter. Absent or empty fields accept everything; all
/// present fields must accept for a command to match.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct WaitFilters {
    pub task_types: Option<Vec<String>>,
    pub component_ids: Option<Vec<String>>,
    pub min_priority: Option<Priority>,
}

impl WaitFilters {
    pub fn accepts(&self, command: &PendingCommand) -> bool {
        if let Some(task_types) = self.task_types.as_deref()
            && !task_types.is_empty()
        {
            let Some(task_type) = command.task_type.as_deref() else {
                return false;
            };
            if !task_types.iter().any(|t| t == task_type) {
                return false;
            }
        }
        if let Some(component_ids) = self.component_ids.as_deref()
            && !component_ids.is_empty()
        {
            let overlap = command
                .target_component_ids
                .iter()
                .any(|id| component_ids.iter().any(|c| c == id));
            if !overlap {
                return false;
            }
        }
        if let Some(min_priority) = self.min_priority
            && command.priority < min_priority
        {
            return false;
        }
        true
    }

    pub fn to_json(&self) -> Value {
        let mut map = Map::new();
        if let Some(task_types) = &self.task_types {
            map.insert("taskTypes".to_string(), json!(task_types));
        }
        if let Some(component_ids) = &self.component_ids {
            map.insert("componentIds".to_string(), json!(component_ids));
        }
        if let Some(min_priority) = self.min_priority {
            map.insert("minPriority".to_string(), json!(min_priority.as_str()));
        }
        Value::Object(map)
    }
}

/// Outcome of `send_command`: either handed to a waiter or queued.
#[derive(Clone, Debug)]
pub struct SendOutcome {
    pub delivered: bool,
    pub agent_id: Option<String>,
    pub command: PendingCommand,
}

/// Registry snapshot row returned by `waiting_agents`.
#[derive(Clone, Debug)]
pub struct WaitingAgentInfo {
    pub agent_id: String,
    pub filters: WaitFilters,
    pub started_at_ms: i64,
    pub elapsed_ms: u64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HistoryAction {
    WaitStarted,
    WaitFailed,
    CommandReceived,
    CommandSent,
    CommandQueued,
    CommandCancelled,
}

impl HistoryAction {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::WaitStarted => "WAIT_STARTED",
            Self::WaitFailed => "WAIT_FAILED",
            Self::CommandReceived => "COMMAND_RECEIVED",
            Self::CommandSent => "COMMAND_SENT",
            Self::CommandQueued => "COMMAND_QUEUED",
            Self::CommandCancelled => "COMMAND_CANCELLED",
        }
    }
}

/// One bounded-audit row.
#[derive(Clone, Debug)]
pub struct HistoryEntry {
    pub ts_ms: i64,
    pub action: HistoryAction,
    pub agent_id: Option<String>,
    pub detail: Value,
}
