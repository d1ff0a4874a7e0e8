#![forbid(unsafe_code)]

use gm_broker::BrokerError;
use gm_core::error::DomainError;
use gm_storage::StoreError;
use serde_json::{json, Value};

/// Facade error: a stable kind code plus one descriptive message. No
/// internals leak past this boundary.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ApiError {
    pub kind: &'static str,
    pub message: String,
}

impl ApiError {
    pub fn new(kind: &'static str, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::new("VALIDATION", message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new("NOT_FOUND", message)
    }

    pub fn to_json(&self) -> Value {
        json!({ "error": { "kind": self.kind, "message": self.message } })
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}

impl std::error::Error for ApiError {}

impl From<StoreError> for ApiError {
    fn from(value: StoreError) -> Self {
        Self::new(value.kind(), value.to_string())
    }
}

impl From<BrokerError> for ApiError {
    fn from(value: BrokerError) -> Self {
        Self::new(value.kind(), value.to_string())
    }
}

impl From<DomainError> for ApiError {
    fn from(value: DomainError) -> Self {
        Self::validation(value.to_string())
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(value: serde_json::Error) -> Self {
        Self::validation(format!("malformed request: {value}"))
    }
}
