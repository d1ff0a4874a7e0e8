#![forbid(unsafe_code)]
//! Store implementation root. Each operation family lives in its own file;
//! shared transaction helpers live under `support`.

mod bulk;
mod comments;
mod components;
mod error;
mod journal;
mod overview;
mod relationships;
mod replay;
mod snapshots;
mod tasks;

mod support;
pub mod types;

pub use error::StoreError;
pub use types::*;

use gm_core::ids::new_id;
use gm_core::model::ChangeOperation;
use gm_core::time::now_ms;
use rusqlite::{Connection, Transaction};
use std::path::{Path, PathBuf};
use support::*;
use tracing::info;

const DB_FILENAME: &str = "graphmind.db";
const DEFAULT_SOURCE: &str = "local";

/// Hard cap on `search_components` results.
pub const COMPONENT_SEARCH_CAP: usize = 100;
/// Hard cap on `search_tasks` results; the default page is 100.
pub const TASK_SEARCH_CAP: usize = 1000;

/// Entity store over the graph backend. Holds no long-lived entity state;
/// every mutation runs in a backend transaction and appends its journal row
/// inside that same transaction.
#[derive(Debug)]
pub struct GraphStore {
    storage_dir: PathBuf,
    conn: Connection,
    session_id: String,
    user_id: Option<String>,
    source: String,
}

/// Who/where a mutation came from; stamped onto journal rows.
#[derive(Clone, Debug)]
pub(in crate::store) struct ChangeContext {
    pub session_id: String,
    pub user_id: Option<String>,
    pub source: String,
}

impl GraphStore {
    pub fn open(storage_dir: impl AsRef<Path>) -> Result<Self, StoreError> {
        let storage_dir = storage_dir.as_ref().to_path_buf();
        std::fs::create_dir_all(&storage_dir)?;
        let db_path = storage_dir.join(DB_FILENAME);
        let conn = Connection::open(&db_path)?;
        migrate_sqlite_schema(&conn)?;
        info!(db = %db_path.display(), "graph store opened");
        Ok(Self {
            storage_dir,
            conn,
            session_id: new_id(),
            user_id: None,
            source: DEFAULT_SOURCE.to_string(),
        })
    }

    pub fn storage_dir(&self) -> &Path {
        &self.storage_dir
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn set_session_id(&mut self, session_id: impl Into<String>) {
        self.session_id = session_id.into();
    }

    pub fn set_user_id(&mut self, user_id: Option<String>) {
        self.user_id = user_id;
    }

    pub fn set_source(&mut self, source: impl Into<String>) {
        self.source = source.into();
    }

    pub(in crate::store) fn change_ctx(&self) -> ChangeContext {
        ChangeContext {
            session_id: self.session_id.clone(),
            user_id: self.user_id.clone(),
            source: self.source.clone(),
        }
    }
}

/// Append the journal row for one committed mutation. Runs inside the
/// mutation's own transaction.
pub(in crate::store) fn journal_mutation_tx(
    tx: &Transaction<'_>,
    ctx: &ChangeContext,
    ts_ms: i64,
    operation: ChangeOperation,
    entity_id: &str,
    before_json: Option<&str>,
    after_json: Option<&str>,
    meta_json: Option<&str>,
) -> Result<(), StoreError> {
    let id = new_id();
    insert_change_event_tx(
        tx,
        &ChangeEventInsert {
            id: &id,
            ts_ms,
            operation,
            entity_id,
            before_json,
            after_json,
            session_id: &ctx.session_id,
            user_id: ctx.user_id.as_deref(),
            source: &ctx.source,
            meta_json,
        },
    )?;
    Ok(())
}

/// Metadata attached to every journal row created by a bulk operation.
pub(in crate::store) fn bulk_meta_json(total_count: usize) -> String {
    format!("{{\"bulkOperation\":true,\"totalCount\":{total_count}}}")
}
