#![forbid(unsafe_code)]
//! Versioned graph store for codebase entities, backed by SQLite. Every
//! committed mutation is appended to a change journal inside the same
//! transaction; snapshots and time-travel replay are rebuilt from those rows.

mod store;

pub use store::{GraphStore, StoreError, COMPONENT_SEARCH_CAP, TASK_SEARCH_CAP};
pub use store::types::*;
