#![forbid(unsafe_code)]
//! Overview, change-history, snapshot, and replay operations.

use crate::api::{
    CreateSnapshotRequest, GetChangeHistoryRequest, GetCodebaseOverviewRequest,
    ReplayToTimestampRequest, RestoreSnapshotRequest, TimestampArg,
};
use crate::error::ApiError;
use crate::render::{
    change_event_json, journal_stats_json, kind_count_json, replay_report_json,
    restore_report_json, snapshot_create_json, snapshot_meta_json,
};
use crate::Service;
use gm_core::model::ChangeOperation;
use gm_core::time::rfc3339_to_ts_ms;
use serde_json::{json, Value};

impl Service {
    pub(crate) fn op_get_codebase_overview(&self, args: Value) -> Result<Value, ApiError> {
        let request: GetCodebaseOverviewRequest = serde_json::from_value(args)?;
        let rows = self.store().get_codebase_overview(&request.codebase)?;
        Ok(json!({
            "codebase": request.codebase,
            "breakdown": rows.iter().map(kind_count_json).collect::<Vec<_>>(),
            "total": rows.iter().map(|row| row.count).sum::<i64>(),
        }))
    }

    pub(crate) fn op_get_change_history(&self, args: Value) -> Result<Value, ApiError> {
        let request: GetChangeHistoryRequest = serde_json::from_value(args)?;
        let operation = request
            .operation
            .as_deref()
            .map(ChangeOperation::parse)
            .transpose()?;
        let events = match request.entity_id.as_deref() {
            Some(entity_id) => self.store().get_entity_history(entity_id, request.limit)?,
            None => self.store().get_recent_changes(request.limit, operation)?,
        };
        let mut changes = Vec::with_capacity(events.len());
        for event in &events {
            changes.push(change_event_json(event)?);
        }
        Ok(json!({ "changes": changes, "count": changes.len() }))
    }

    pub(crate) fn op_get_history_stats(&self, _args: Value) -> Result<Value, ApiError> {
        let stats = self.store().get_stats()?;
        Ok(journal_stats_json(&stats))
    }

    pub(crate) fn op_create_snapshot(&self, args: Value) -> Result<Value, ApiError> {
        let request: CreateSnapshotRequest = serde_json::from_value(args)?;
        let result = self
            .store()
            .create_snapshot(&request.name, request.description)?;
        Ok(snapshot_create_json(&result))
    }

    pub(crate) fn op_list_snapshots(&self, _args: Value) -> Result<Value, ApiError> {
        let snapshots = self.store().list_snapshots()?;
        Ok(json!({
            "snapshots": snapshots.iter().map(snapshot_meta_json).collect::<Vec<_>>(),
            "count": snapshots.len(),
        }))
    }

    pub(crate) fn op_restore_snapshot(&self, args: Value) -> Result<Value, ApiError> {
        let request: RestoreSnapshotRequest = serde_json::from_value(args)?;
        let report = self
            .store()
            .restore_from_snapshot(&request.id, request.dry_run)?;
        Ok(restore_report_json(&report))
    }

    pub(crate) fn op_replay_to_timestamp(&self, args: Value) -> Result<Value, ApiError> {
        let request: ReplayToTimestampRequest = serde_json::from_value(args)?;
        let target_ms = match request.timestamp {
            TimestampArg::Ms(ms) => ms,
            TimestampArg::Rfc3339(text) => rfc3339_to_ts_ms(&text)?,
        };
        let report = self.store().replay_to_timestamp(target_ms, request.dry_run)?;
        Ok(replay_report_json(&report))
    }
}
