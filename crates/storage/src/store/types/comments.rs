#![forbid(unsafe_code)]

use crate::store::StoreError;
use gm_core::metadata::{metadata_from_json, metadata_to_json, MetadataMap};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Free-text annotation attached to exactly one node (Component or Task)
/// through a HAS_COMMENT edge.
#[derive(Clone, Debug, PartialEq)]
pub struct Comment {
    pub id: String,
    pub parent_id: String,
    pub content: String,
    pub author: String,
    pub metadata: MetadataMap,
    pub created_at_ms: i64,
    pub updated_at_ms: Option<i64>,
}

#[derive(Clone, Debug)]
pub struct CommentInput {
    pub id: Option<String>,
    pub parent_id: String,
    pub content: String,
    pub author: String,
    pub metadata: MetadataMap,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentState {
    pub id: String,
    pub parent_id: String,
    pub content: String,
    pub author: String,
    #[serde(default)]
    pub metadata: Value,
    #[serde(default)]
    pub created_at_ms: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at_ms: Option<i64>,
}

impl Comment {
    pub fn to_state(&self) -> CommentState {
        CommentState {
            id: self.id.clone(),
            parent_id: self.parent_id.clone(),
            content: self.content.clone(),
            author: self.author.clone(),
            metadata: metadata_to_json(&self.metadata),
            created_at_ms: self.created_at_ms,
            updated_at_ms: self.updated_at_ms,
        }
    }

    pub fn from_state(state: CommentState) -> Result<Self, StoreError> {
        let metadata = if state.metadata.is_null() {
            MetadataMap::new()
        } else {
            metadata_from_json(state.metadata)?
        };
        Ok(Self {
            id: state.id,
            parent_id: state.parent_id,
            content: state.content,
            author: state.author,
            metadata,
            created_at_ms: state.created_at_ms,
            updated_at_ms: state.updated_at_ms,
        })
    }
}
