#![forbid(unsafe_code)]

use super::*;
use gm_core::error::DomainError;
use gm_core::model::{ChangeOperation, RelationshipType};
use rusqlite::Transaction;

const DEFAULT_COMMENT_PAGE: usize = 50;
const MAX_COMMENT_PAGE: usize = 500;

impl GraphStore {
    /// Attach a comment to an existing Component or Task via a HAS_COMMENT
    /// edge. Journals CREATE_COMMENT.
    pub fn create_comment(&mut self, input: CommentInput) -> Result<Comment, StoreError> {
        if input.content.trim().is_empty() {
            return Err(DomainError::EmptyContent.into());
        }
        let now = now_ms();
        let comment = Comment {
            id: input
                .id
                .filter(|value| !value.trim().is_empty())
                .unwrap_or_else(new_id),
            parent_id: input.parent_id,
            content: input.content,
            author: input.author,
            metadata: input.metadata,
            created_at_ms: now,
            updated_at_ms: None,
        };
        let after_json = serde_json::to_string(&comment.to_state())?;
        let ctx = self.change_ctx();
        let tx = self.conn.transaction()?;
        insert_comment_with_edge_tx(&tx, &comment)?;
        journal_mutation_tx(
            &tx,
            &ctx,
            now,
            ChangeOperation::CreateComment,
            &comment.id,
            None,
            Some(&after_json),
            None,
        )?;
        tx.commit()?;
        Ok(comment)
    }

    pub fn get_comment(&mut self, id: &str) -> Result<Comment, StoreError> {
        let tx = self.conn.transaction()?;
        let found = comment_get_tx(&tx, id)?;
        tx.commit()?;
        found.ok_or_else(|| StoreError::NotFound {
            entity: "comment",
            id: id.to_string(),
        })
    }

    /// Comments attached to a node, newest first.
    pub fn get_node_comments(
        &mut self,
        node_id: &str,
        limit: Option<usize>,
    ) -> Result<Vec<Comment>, StoreError> {
        let limit = limit.unwrap_or(DEFAULT_COMMENT_PAGE).clamp(1, MAX_COMMENT_PAGE);
        let tx = self.conn.transaction()?;
        if node_get_tx(&tx, node_id)?.is_none() {
            return Err(StoreError::NotFound {
                entity: "node",
                id: node_id.to_string(),
            });
        }
        let edges = edges_out_tx(&tx, node_id, Some(RelationshipType::HasComment.as_str()))?;
        let mut comments = Vec::with_capacity(edges.len());
        for edge in edges {
            if let Some(comment) = comment_get_tx(&tx, &edge.target_id)? {
                comments.push(comment);
            }
        }
        tx.commit()?;
        comments.sort_by(|a, b| {
            b.created_at_ms
                .cmp(&a.created_at_ms)
                .then_with(|| b.id.cmp(&a.id))
        });
        comments.truncate(limit);
        Ok(comments)
    }

    /// Replace a comment's content. Journals UPDATE_COMMENT.
    pub fn update_comment(&mut self, id: &str, content: String) -> Result<Comment, StoreError> {
        if content.trim().is_empty() {
            return Err(DomainError::EmptyContent.into());
        }
        let now = now_ms();
        let ctx = self.change_ctx();
        let tx = self.conn.transaction()?;

        let Some(existing) = comment_get_tx(&tx, id)? else {
            return Err(StoreError::NotFound {
                entity: "comment",
                id: id.to_string(),
            });
        };
        let before_json = serde_json::to_string(&existing.to_state())?;

        let mut updated = existing;
        updated.content = content;
        updated.updated_at_ms = Some(now);

        let after_json = serde_json::to_string(&updated.to_state())?;
        update_node_tx(&tx, &comment_node(&updated)?)?;
        journal_mutation_tx(
            &tx,
            &ctx,
            now,
            ChangeOperation::UpdateComment,
            id,
            Some(&before_json),
            Some(&after_json),
            None,
        )?;
        tx.commit()?;
        Ok(updated)
    }

    pub fn delete_comment(&mut self, id: &str) -> Result<(), StoreError> {
        let now = now_ms();
        let ctx = self.change_ctx();
        let tx = self.conn.transaction()?;

        let Some(existing) = comment_get_tx(&tx, id)? else {
            return Err(StoreError::NotFound {
                entity: "comment",
                id: id.to_string(),
            });
        };
        let before_json = serde_json::to_string(&existing.to_state())?;

        delete_edges_touching_tx(&tx, id)?;
        delete_node_tx(&tx, id)?;
        journal_mutation_tx(
            &tx,
            &ctx,
            now,
            ChangeOperation::DeleteComment,
            id,
            Some(&before_json),
            None,
            None,
        )?;
        tx.commit()?;
        Ok(())
    }
}

pub(in crate::store) fn comment_get_tx(
    tx: &Transaction<'_>,
    id: &str,
) -> Result<Option<Comment>, StoreError> {
    match node_get_tx(tx, id)? {
        Some(node) if node.label == LABEL_COMMENT => Ok(Some(comment_from_node(node)?)),
        _ => Ok(None),
    }
}

/// Insert a comment node and its HAS_COMMENT edge. The parent must be a
/// Component or Task. Shared by create and replay.
pub(in crate::store) fn insert_comment_with_edge_tx(
    tx: &Transaction<'_>,
    comment: &Comment,
) -> Result<(), StoreError> {
    let Some(parent) = node_get_tx(tx, &comment.parent_id)? else {
        return Err(StoreError::NotFound {
            entity: "node",
            id: comment.parent_id.clone(),
        });
    };
    if parent.label == LABEL_COMMENT {
        return Err(StoreError::InvalidInput(
            "comments cannot be attached to comments",
        ));
    }
    insert_node_tx(tx, &comment_node(comment)?)?;
    insert_edge_tx(
        tx,
        &EdgeRow {
            id: new_id(),
            edge_type: RelationshipType::HasComment.as_str().to_string(),
            source_id: comment.parent_id.clone(),
            target_id: comment.id.clone(),
            props_json: None,
            created_at_ms: comment.created_at_ms,
        },
    )?;
    Ok(())
}
