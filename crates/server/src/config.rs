#![forbid(unsafe_code)]

use gm_broker::{DEFAULT_HISTORY_CAPACITY, DEFAULT_MAILBOX_BOUND, DEFAULT_WAIT_TIMEOUT_MS};
use std::path::PathBuf;

const DB_DIR_ENV: &str = "GRAPHMIND_DB_DIR";
const WAIT_TIMEOUT_ENV: &str = "GRAPHMIND_WAIT_TIMEOUT_MS";
const HISTORY_CAPACITY_ENV: &str = "GRAPHMIND_HISTORY_CAPACITY";
const MAILBOX_BOUND_ENV: &str = "GRAPHMIND_MAILBOX_BOUND";
const USER_ID_ENV: &str = "GRAPHMIND_USER_ID";
const SOURCE_ENV: &str = "GRAPHMIND_SOURCE";

const DEFAULT_DB_DIRNAME: &str = ".graphmind";
const DEFAULT_SOURCE: &str = "local";

/// Everything the core honors: the backend target, broker defaults, the bus
/// mailbox bound, and the actor stamped onto journal entries.
#[derive(Clone, Debug)]
pub struct ServiceConfig {
    pub db_dir: PathBuf,
    pub wait_timeout_ms: u64,
    pub history_capacity: usize,
    pub mailbox_bound: usize,
    pub user_id: Option<String>,
    pub source: String,
}

impl ServiceConfig {
    pub fn new(db_dir: impl Into<PathBuf>) -> Self {
        Self {
            db_dir: db_dir.into(),
            wait_timeout_ms: DEFAULT_WAIT_TIMEOUT_MS,
            history_capacity: DEFAULT_HISTORY_CAPACITY,
            mailbox_bound: DEFAULT_MAILBOX_BOUND,
            user_id: None,
            source: DEFAULT_SOURCE.to_string(),
        }
    }

    /// Environment-driven configuration; unset or unparseable variables fall
    /// back to the defaults.
    pub fn from_env() -> Self {
        let db_dir = env_string(DB_DIR_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DB_DIRNAME));
        let mut config = Self::new(db_dir);
        if let Some(timeout) = env_parse::<u64>(WAIT_TIMEOUT_ENV) {
            config.wait_timeout_ms = timeout;
        }
        if let Some(capacity) = env_parse::<usize>(HISTORY_CAPACITY_ENV) {
            config.history_capacity = capacity.max(1);
        }
        if let Some(bound) = env_parse::<usize>(MAILBOX_BOUND_ENV) {
            config.mailbox_bound = bound.max(1);
        }
        config.user_id = env_string(USER_ID_ENV);
        if let Some(source) = env_string(SOURCE_ENV) {
            config.source = source;
        }
        config
    }
}

fn env_string(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    env_string(name).and_then(|value| value.parse().ok())
}
