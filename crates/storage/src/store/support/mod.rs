#![forbid(unsafe_code)]

mod encode;
mod graph_tx;
mod journal_tx;
mod schema;

pub(super) use encode::*;
pub(super) use graph_tx::*;
pub(super) use journal_tx::*;
pub(super) use schema::migrate_sqlite_schema;
