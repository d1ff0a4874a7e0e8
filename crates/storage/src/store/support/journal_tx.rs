#![forbid(unsafe_code)]

use crate::store::types::ChangeEvent;
use crate::store::StoreError;
use gm_core::model::{ChangeOperation, EntityKind};
use rusqlite::{params, Transaction};

pub(in crate::store) const CHANGE_EVENT_COLUMNS: &str = "seq, id, ts_ms, operation, entity_kind, \
     entity_id, before_json, after_json, session_id, user_id, source, meta_json";

#[derive(Clone, Debug)]
pub(in crate::store) struct ChangeEventInsert<'a> {
    pub id: &'a str,
    pub ts_ms: i64,
    pub operation: ChangeOperation,
    pub entity_id: &'a str,
    pub before_json: Option<&'a str>,
    pub after_json: Option<&'a str>,
    pub session_id: &'a str,
    pub user_id: Option<&'a str>,
    pub source: &'a str,
    pub meta_json: Option<&'a str>,
}

/// Append one journal row. Idempotent on `id`: a duplicate is ignored and
/// reported as not-inserted.
pub(in crate::store) fn insert_change_event_tx(
    tx: &Transaction<'_>,
    event: &ChangeEventInsert<'_>,
) -> Result<bool, StoreError> {
    let inserted = tx.execute(
        r#"
        INSERT OR IGNORE INTO change_events(
          id, ts_ms, operation, entity_kind, entity_id,
          before_json, after_json, session_id, user_id, source, meta_json
        )
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
        "#,
        params![
            event.id,
            event.ts_ms,
            event.operation.as_str(),
            event.operation.entity_kind().as_str(),
            event.entity_id,
            event.before_json,
            event.after_json,
            event.session_id,
            event.user_id,
            event.source,
            event.meta_json
        ],
    )?;
    Ok(inserted > 0)
}

pub(in crate::store) fn read_change_event_row(
    row: &rusqlite::Row<'_>,
) -> Result<ChangeEvent, rusqlite::Error> {
    let operation_text: String = row.get(3)?;
    let operation = ChangeOperation::parse(&operation_text).map_err(|err| {
        rusqlite::Error::FromSqlConversionFailure(3, rusqlite::types::Type::Text, Box::new(err))
    })?;
    let entity_kind_text: String = row.get(4)?;
    let entity_kind = EntityKind::parse(&entity_kind_text).map_err(|err| {
        rusqlite::Error::FromSqlConversionFailure(4, rusqlite::types::Type::Text, Box::new(err))
    })?;
    Ok(ChangeEvent {
        seq: row.get(0)?,
        id: row.get(1)?,
        ts_ms: row.get(2)?,
        operation,
        entity_kind,
        entity_id: row.get(5)?,
        before_json: row.get(6)?,
        after_json: row.get(7)?,
        session_id: row.get(8)?,
        user_id: row.get(9)?,
        source: row.get(10)?,
        meta_json: row.get(11)?,
    })
}
