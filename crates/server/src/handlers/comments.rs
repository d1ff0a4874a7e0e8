#![forbid(unsafe_code)]

use super::parse_metadata;
use crate::api::{
    CommentIdRequest, CreateCommentRequest, GetNodeCommentsRequest, UpdateCommentRequest,
};
use crate::error::ApiError;
use crate::render::comment_json;
use crate::Service;
use gm_storage::CommentInput;
use serde_json::{json, Value};

const DEFAULT_AUTHOR: &str = "unknown";

impl Service {
    pub(crate) fn op_create_comment(&self, args: Value) -> Result<Value, ApiError> {
        let request: CreateCommentRequest = serde_json::from_value(args)?;
        let comment = self.store().create_comment(CommentInput {
            id: request.id,
            parent_id: request.node_id,
            content: request.content,
            author: request
                .author
                .filter(|value| !value.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_AUTHOR.to_string()),
            metadata: parse_metadata(request.metadata)?,
        })?;
        Ok(comment_json(&comment))
    }

    pub(crate) fn op_get_node_comments(&self, args: Value) -> Result<Value, ApiError> {
        let request: GetNodeCommentsRequest = serde_json::from_value(args)?;
        let comments = self
            .store()
            .get_node_comments(&request.node_id, request.limit)?;
        Ok(json!({
            "comments": comments.iter().map(comment_json).collect::<Vec<_>>(),
            "count": comments.len(),
        }))
    }

    pub(crate) fn op_update_comment(&self, args: Value) -> Result<Value, ApiError> {
        let request: UpdateCommentRequest = serde_json::from_value(args)?;
        let comment = self.store().update_comment(&request.id, request.content)?;
        Ok(comment_json(&comment))
    }

    pub(crate) fn op_delete_comment(&self, args: Value) -> Result<Value, ApiError> {
        let request: CommentIdRequest = serde_json::from_value(args)?;
        self.store().delete_comment(&request.id)?;
        Ok(json!({ "deleted": true, "id": request.id }))
    }

    pub(crate) fn op_get_comment(&self, args: Value) -> Result<Value, ApiError> {
        let request: CommentIdRequest = serde_json::from_value(args)?;
        let comment = self.store().get_comment(&request.id)?;
        Ok(comment_json(&comment))
    }
}
