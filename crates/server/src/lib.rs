#![forbid(unsafe_code)]
//! Public API facade. Owns the store, broker, and event bus; external
//! transports call `Service::dispatch` with an operation name and JSON
//! arguments, and subscribe to the bus for real-time events.

mod api;
mod config;
mod dispatch;
mod error;
mod handlers;
mod render;

pub use config::ServiceConfig;
pub use dispatch::operation_names;
pub use error::ApiError;

use gm_broker::{BrokerConfig, CommandBroker, EventBus};
use gm_storage::GraphStore;
use serde_json::Value;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::debug;

pub struct Service {
    store: Mutex<GraphStore>,
    broker: CommandBroker,
    bus: Arc<EventBus>,
    config: ServiceConfig,
}

impl Service {
    pub fn open(config: ServiceConfig) -> Result<Self, ApiError> {
        let bus = Arc::new(EventBus::new(config.mailbox_bound));
        let mut store = GraphStore::open(&config.db_dir)?;
        store.set_user_id(config.user_id.clone());
        store.set_source(config.source.clone());
        let broker = CommandBroker::with_bus(
            BrokerConfig {
                default_wait_timeout_ms: config.wait_timeout_ms,
                history_capacity: config.history_capacity,
            },
            Arc::clone(&bus),
        );
        Ok(Self {
            store: Mutex::new(store),
            broker,
            bus,
            config,
        })
    }

    /// The event bus carrying store mutations and broker events; transports
    /// subscribe here.
    pub fn bus(&self) -> &Arc<EventBus> {
        &self.bus
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    /// Uniform entrypoint: operation name plus JSON arguments, as used by the
    /// MCP/HTTP/CLI transports.
    pub fn dispatch(&self, operation: &str, args: Value) -> Result<Value, ApiError> {
        debug!(operation, "dispatch");
        dispatch::dispatch_operation(self, operation, args)
    }

    pub(crate) fn store(&self) -> MutexGuard<'_, GraphStore> {
        self.store
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub(crate) fn broker(&self) -> &CommandBroker {
        &self.broker
    }

    pub(crate) fn publish(&self, name: &str, payload: Value) {
        self.bus.publish(name, payload);
    }
}
