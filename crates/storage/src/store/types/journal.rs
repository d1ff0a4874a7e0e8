#![forbid(unsafe_code)]

use crate::store::StoreError;
use gm_core::model::{ChangeOperation, EntityKind};
use serde_json::Value;

/// One change-journal row. Before/after states are JSON-encoded strings in
/// storage; `before_state`/`after_state` decode them on demand.
#[derive(Clone, Debug)]
pub struct ChangeEvent {
    pub seq: i64,
    pub id: String,
    pub ts_ms: i64,
    pub operation: ChangeOperation,
    pub entity_kind: EntityKind,
    pub entity_id: String,
    pub before_json: Option<String>,
    pub after_json: Option<String>,
    pub session_id: String,
    pub user_id: Option<String>,
    pub source: String,
    pub meta_json: Option<String>,
}

impl ChangeEvent {
    pub fn before_state(&self) -> Result<Option<Value>, StoreError> {
        decode_state(self.before_json.as_deref())
    }

    pub fn after_state(&self) -> Result<Option<Value>, StoreError> {
        decode_state(self.after_json.as_deref())
    }

    pub fn metadata(&self) -> Result<Option<Value>, StoreError> {
        decode_state(self.meta_json.as_deref())
    }
}

fn decode_state(raw: Option<&str>) -> Result<Option<Value>, StoreError> {
    match raw {
        None => Ok(None),
        Some(text) => Ok(Some(serde_json::from_str(text)?)),
    }
}

/// Externally supplied journal entry for the idempotent `append_change`.
#[derive(Clone, Debug)]
pub struct ChangeEventInput {
    pub id: Option<String>,
    pub operation: ChangeOperation,
    pub entity_id: String,
    pub before_json: Option<String>,
    pub after_json: Option<String>,
    pub ts_ms: Option<i64>,
    pub session_id: Option<String>,
    pub user_id: Option<String>,
    pub source: Option<String>,
    pub meta_json: Option<String>,
}

#[derive(Clone, Debug)]
pub struct OperationCount {
    pub operation: String,
    pub count: i64,
}

#[derive(Clone, Debug)]
pub struct DailyCount {
    pub day: String,
    pub count: i64,
}

#[derive(Clone, Debug)]
pub struct JournalStats {
    pub total: i64,
    pub by_operation: Vec<OperationCount>,
    pub last_30_days: Vec<DailyCount>,
}
