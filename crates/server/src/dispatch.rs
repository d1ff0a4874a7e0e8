#![forbid(unsafe_code)]

use crate::error::ApiError;
use crate::Service;
use serde_json::Value;

macro_rules! define_operations {
    ($($operation:literal => $method:ident),* $(,)?) => {
        pub(crate) fn dispatch_operation(
            service: &Service,
            name: &str,
            args: Value,
        ) -> Result<Value, ApiError> {
            match name {
                $($operation => service.$method(args),)*
                _ => Err(ApiError::not_found(format!("unknown operation: {name}"))),
            }
        }

        /// Every operation name the facade accepts, in dispatch order.
        pub fn operation_names() -> &'static [&'static str] {
            &[$($operation),*]
        }
    };
}

define_operations! {
    "createComponent" => op_create_component,
    "getComponent" => op_get_component,
    "searchComponents" => op_search_components,
    "updateComponent" => op_update_component,
    "deleteComponent" => op_delete_component,
    "createComponentsBulk" => op_create_components_bulk,
    "createRelationship" => op_create_relationship,
    "createRelationshipsBulk" => op_create_relationships_bulk,
    "getComponentRelationships" => op_get_component_relationships,
    "getDependencyTree" => op_get_dependency_tree,
    "createTask" => op_create_task,
    "getTask" => op_get_task,
    "getTasks" => op_get_tasks,
    "searchTasks" => op_search_tasks,
    "updateTaskStatus" => op_update_task_status,
    "createTasksBulk" => op_create_tasks_bulk,
    "createComment" => op_create_comment,
    "getNodeComments" => op_get_node_comments,
    "updateComment" => op_update_comment,
    "deleteComment" => op_delete_comment,
    "getComment" => op_get_comment,
    "getCodebaseOverview" => op_get_codebase_overview,
    "getChangeHistory" => op_get_change_history,
    "createSnapshot" => op_create_snapshot,
    "listSnapshots" => op_list_snapshots,
    "restoreSnapshot" => op_restore_snapshot,
    "replayToTimestamp" => op_replay_to_timestamp,
    "getHistoryStats" => op_get_history_stats,
    "waitForCommand" => op_wait_for_command,
    "sendCommand" => op_send_command,
    "getWaitingAgents" => op_get_waiting_agents,
    "getPendingCommands" => op_get_pending_commands,
    "cancelCommand" => op_cancel_command,
    "cancelWait" => op_cancel_wait,
    "getCommandHistory" => op_get_command_history,
}
