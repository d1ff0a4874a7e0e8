#![forbid(unsafe_code)]

mod analysis;
mod broker;
mod comments;
mod components;
mod relationships;
mod tasks;

use crate::error::ApiError;
use gm_core::metadata::{metadata_from_json, MetadataMap};
use serde_json::Value;

pub(crate) fn parse_metadata(value: Option<Value>) -> Result<MetadataMap, ApiError> {
    match value {
        None | Some(Value::Null) => Ok(MetadataMap::new()),
        Some(value) => Ok(metadata_from_json(value)?),
    }
}
