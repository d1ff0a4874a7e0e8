#![forbid(unsafe_code)]

use crate::store::StoreError;
use gm_core::metadata::{metadata_from_json, metadata_to_json, MetadataMap};
use gm_core::model::TaskStatus;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Tracked unit of work, optionally linked to Components via RELATES_TO.
#[derive(Clone, Debug, PartialEq)]
pub struct Task {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub status: TaskStatus,
    pub progress: f64,
    pub codebase: Option<String>,
    pub related_component_ids: Vec<String>,
    pub metadata: MetadataMap,
    pub created_at_ms: i64,
    pub updated_at_ms: i64,
}

#[derive(Clone, Debug, Default)]
pub struct TaskInput {
    pub id: Option<String>,
    pub name: String,
    pub description: Option<String>,
    pub status: Option<TaskStatus>,
    pub progress: Option<f64>,
    pub codebase: Option<String>,
    pub related_component_ids: Vec<String>,
    pub metadata: MetadataMap,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TaskOrderBy {
    Created,
    Name,
    Status,
    Progress,
}

impl TaskOrderBy {
    pub fn parse(value: &str) -> Result<Self, StoreError> {
        match value {
            "created" => Ok(Self::Created),
            "name" => Ok(Self::Name),
            "status" => Ok(Self::Status),
            "progress" => Ok(Self::Progress),
            _ => Err(StoreError::InvalidInput(
                "orderBy must be one of created, name, status, progress",
            )),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OrderDirection {
    Asc,
    Desc,
}

impl OrderDirection {
    pub fn parse(value: &str) -> Result<Self, StoreError> {
        match value {
            "asc" => Ok(Self::Asc),
            "desc" => Ok(Self::Desc),
            _ => Err(StoreError::InvalidInput("orderDirection must be asc or desc")),
        }
    }
}

#[derive(Clone, Debug)]
pub struct TaskSearchCriteria {
    pub text_query: Option<String>,
    pub statuses: Option<Vec<TaskStatus>>,
    pub progress_min: Option<f64>,
    pub progress_max: Option<f64>,
    pub created_from_ms: Option<i64>,
    pub created_to_ms: Option<i64>,
    pub related_component_ids: Option<Vec<String>>,
    pub order_by: TaskOrderBy,
    pub order_direction: OrderDirection,
    pub limit: usize,
}

impl Default for TaskSearchCriteria {
    fn default() -> Self {
        Self {
            text_query: None,
            statuses: None,
            progress_min: None,
            progress_max: None,
            created_from_ms: None,
            created_to_ms: None,
            related_component_ids: None,
            order_by: TaskOrderBy::Created,
            order_direction: OrderDirection::Desc,
            limit: 100,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskState {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub status: String,
    #[serde(default)]
    pub progress: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub codebase: Option<String>,
    #[serde(default)]
    pub related_component_ids: Vec<String>,
    #[serde(default)]
    pub metadata: Value,
    #[serde(default)]
    pub created_at_ms: i64,
    #[serde(default)]
    pub updated_at_ms: i64,
}

impl Task {
    pub fn to_state(&self) -> TaskState {
        TaskState {
            id: self.id.clone(),
            name: self.name.clone(),
            description: self.description.clone(),
            status: self.status.as_str().to_string(),
            progress: self.progress,
            codebase: self.codebase.clone(),
            related_component_ids: self.related_component_ids.clone(),
            metadata: metadata_to_json(&self.metadata),
            created_at_ms: self.created_at_ms,
            updated_at_ms: self.updated_at_ms,
        }
    }

    pub fn from_state(state: TaskState) -> Result<Self, StoreError> {
        let metadata = if state.metadata.is_null() {
            MetadataMap::new()
        } else {
            metadata_from_json(state.metadata)?
        };
        Ok(Self {
            id: state.id,
            name: state.name,
            description: state.description,
            status: TaskStatus::parse(&state.status)?,
            progress: state.progress,
            codebase: state.codebase,
            related_component_ids: state.related_component_ids,
            metadata,
            created_at_ms: state.created_at_ms,
            updated_at_ms: state.updated_at_ms,
        })
    }
}
