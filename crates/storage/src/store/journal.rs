#![forbid(unsafe_code)]
//! Change-journal queries. Rows are appended by the mutation paths; this file
//! only reads them, plus the idempotent external `append_change`.

use super::*;
use gm_core::model::ChangeOperation;
use rusqlite::params;

const DEFAULT_HISTORY_PAGE: usize = 50;
const MAX_HISTORY_PAGE: usize = 1000;
const SESSION_CHANGES_CAP: usize = 1000;
const STATS_WINDOW_DAYS: i64 = 30;

impl GraphStore {
    /// Append an externally supplied journal entry. Idempotent on the entry
    /// id: re-appending an id that already exists is a no-op returning false.
    pub fn append_change(&mut self, input: ChangeEventInput) -> Result<bool, StoreError> {
        if input.entity_id.trim().is_empty() {
            return Err(StoreError::InvalidInput("entityId must not be empty"));
        }
        let id = input
            .id
            .filter(|value| !value.trim().is_empty())
            .unwrap_or_else(new_id);
        let ts_ms = input.ts_ms.unwrap_or_else(now_ms);
        let session_id = input
            .session_id
            .unwrap_or_else(|| self.session_id.clone());
        let source = input.source.unwrap_or_else(|| self.source.clone());
        let user_id = input.user_id.or_else(|| self.user_id.clone());

        let tx = self.conn.transaction()?;
        let inserted = insert_change_event_tx(
            &tx,
            &ChangeEventInsert {
                id: &id,
                ts_ms,
                operation: input.operation,
                entity_id: &input.entity_id,
                before_json: input.before_json.as_deref(),
                after_json: input.after_json.as_deref(),
                session_id: &session_id,
                user_id: user_id.as_deref(),
                source: &source,
                meta_json: input.meta_json.as_deref(),
            },
        )?;
        tx.commit()?;
        Ok(inserted)
    }

    /// Journal rows for one entity, newest first.
    pub fn get_entity_history(
        &mut self,
        entity_id: &str,
        limit: Option<usize>,
    ) -> Result<Vec<ChangeEvent>, StoreError> {
        let limit = limit.unwrap_or(DEFAULT_HISTORY_PAGE).clamp(1, MAX_HISTORY_PAGE);
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {CHANGE_EVENT_COLUMNS} FROM change_events \
             WHERE entity_id=?1 ORDER BY ts_ms DESC, seq DESC LIMIT ?2"
        ))?;
        let rows = stmt.query_map(params![entity_id, limit as i64], read_change_event_row)?;
        let mut out = Vec::new();
        for row in rows {
            out.push(row?);
        }
        Ok(out)
    }

    /// Global feed, newest first, optionally narrowed to one operation.
    pub fn get_recent_changes(
        &mut self,
        limit: Option<usize>,
        operation: Option<ChangeOperation>,
    ) -> Result<Vec<ChangeEvent>, StoreError> {
        let limit = limit.unwrap_or(DEFAULT_HISTORY_PAGE).clamp(1, MAX_HISTORY_PAGE);
        let mut out = Vec::new();
        match operation {
            Some(operation) => {
                let mut stmt = self.conn.prepare(&format!(
                    "SELECT {CHANGE_EVENT_COLUMNS} FROM change_events \
                     WHERE operation=?1 ORDER BY ts_ms DESC, seq DESC LIMIT ?2"
                ))?;
                let rows = stmt.query_map(
                    params![operation.as_str(), limit as i64],
                    read_change_event_row,
                )?;
                for row in rows {
                    out.push(row?);
                }
            }
            None => {
                let mut stmt = self.conn.prepare(&format!(
                    "SELECT {CHANGE_EVENT_COLUMNS} FROM change_events \
                     ORDER BY ts_ms DESC, seq DESC LIMIT ?1"
                ))?;
                let rows = stmt.query_map(params![limit as i64], read_change_event_row)?;
                for row in rows {
                    out.push(row?);
                }
            }
        }
        Ok(out)
    }

    /// Entries with `from <= ts_ms <= to`, ascending.
    pub fn get_changes_by_time_range(
        &mut self,
        from_ms: i64,
        to_ms: i64,
        limit: Option<usize>,
    ) -> Result<Vec<ChangeEvent>, StoreError> {
        if to_ms < from_ms {
            return Err(StoreError::InvalidInput("time range end precedes start"));
        }
        let limit = limit.unwrap_or(MAX_HISTORY_PAGE).clamp(1, MAX_HISTORY_PAGE);
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {CHANGE_EVENT_COLUMNS} FROM change_events \
             WHERE ts_ms>=?1 AND ts_ms<=?2 ORDER BY ts_ms ASC, seq ASC LIMIT ?3"
        ))?;
        let rows = stmt.query_map(params![from_ms, to_ms, limit as i64], read_change_event_row)?;
        let mut out = Vec::new();
        for row in rows {
            out.push(row?);
        }
        Ok(out)
    }

    /// Everything one session wrote, ascending.
    pub fn get_session_changes(
        &mut self,
        session_id: &str,
    ) -> Result<Vec<ChangeEvent>, StoreError> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {CHANGE_EVENT_COLUMNS} FROM change_events \
             WHERE session_id=?1 ORDER BY ts_ms ASC, seq ASC LIMIT ?2"
        ))?;
        let rows = stmt.query_map(
            params![session_id, SESSION_CHANGES_CAP as i64],
            read_change_event_row,
        )?;
        let mut out = Vec::new();
        for row in rows {
            out.push(row?);
        }
        Ok(out)
    }

    /// Total row count, per-operation counts, and per-day counts over the
    /// trailing 30 days.
    pub fn get_stats(&mut self) -> Result<JournalStats, StoreError> {
        let total: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM change_events", [], |row| row.get(0))?;

        let mut by_operation = Vec::new();
        {
            let mut stmt = self.conn.prepare(
                "SELECT operation, COUNT(*) AS total FROM change_events \
                 GROUP BY operation ORDER BY total DESC, operation ASC",
            )?;
            let rows = stmt.query_map([], |row| {
                Ok(OperationCount {
                    operation: row.get(0)?,
                    count: row.get(1)?,
                })
            })?;
            for row in rows {
                by_operation.push(row?);
            }
        }

        let window_start = now_ms() - STATS_WINDOW_DAYS * 24 * 60 * 60 * 1000;
        let mut last_30_days = Vec::new();
        {
            let mut stmt = self.conn.prepare(
                "SELECT date(ts_ms/1000, 'unixepoch') AS day, COUNT(*) AS total \
                 FROM change_events WHERE ts_ms>=?1 \
                 GROUP BY day ORDER BY day DESC",
            )?;
            let rows = stmt.query_map(params![window_start], |row| {
                Ok(DailyCount {
                    day: row.get(0)?,
                    count: row.get(1)?,
                })
            })?;
            for row in rows {
                last_30_days.push(row?);
            }
        }

        Ok(JournalStats {
            total,
            by_operation,
            last_30_days,
        })
    }
}
