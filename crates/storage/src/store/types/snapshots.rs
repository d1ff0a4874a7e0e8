#![forbid(unsafe_code)]

use super::{CommentState, ComponentState, RelationshipState, TaskState};
use gm_core::model::{ChangeOperation, EntityKind};
use serde::{Deserialize, Serialize};

/// Snapshot metadata; the payload is loaded only for restore.
#[derive(Clone, Debug)]
pub struct SnapshotMeta {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub ts_ms: i64,
}

/// Self-contained capture of every live entity. Comment parentage and
/// task-component links are rebuilt from the entity records, so internal
/// HAS_COMMENT / RELATES_TO edges are not stored.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotPayload {
    pub components: Vec<ComponentState>,
    pub tasks: Vec<TaskState>,
    pub comments: Vec<CommentState>,
    pub relationships: Vec<RelationshipState>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SnapshotCounts {
    pub components: usize,
    pub tasks: usize,
    pub comments: usize,
    pub relationships: usize,
}

impl SnapshotPayload {
    pub fn counts(&self) -> SnapshotCounts {
        SnapshotCounts {
            components: self.components.len(),
            tasks: self.tasks.len(),
            comments: self.comments.len(),
            relationships: self.relationships.len(),
        }
    }
}

#[derive(Clone, Debug)]
pub struct SnapshotCreateResult {
    pub meta: SnapshotMeta,
    pub counts: SnapshotCounts,
}

#[derive(Clone, Debug)]
pub struct RestoreReport {
    pub snapshot_id: String,
    pub dry_run: bool,
    pub counts: SnapshotCounts,
}

#[derive(Clone, Debug)]
pub struct ReplayPlanEntry {
    pub seq: i64,
    pub id: String,
    pub ts_ms: i64,
    pub operation: ChangeOperation,
    pub entity_kind: EntityKind,
    pub entity_id: String,
}

#[derive(Clone, Debug)]
pub struct ReplayEntryOutcome {
    pub entry: ReplayPlanEntry,
    pub applied: bool,
    pub error: Option<String>,
}

#[derive(Clone, Debug)]
pub struct ReplayReport {
    pub target_ms: i64,
    pub dry_run: bool,
    pub plan: Vec<ReplayPlanEntry>,
    /// Empty on a dry run.
    pub outcomes: Vec<ReplayEntryOutcome>,
}

impl ReplayReport {
    pub fn applied(&self) -> usize {
        self.outcomes.iter().filter(|o| o.applied).count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes.iter().filter(|o| !o.applied).count()
    }
}
