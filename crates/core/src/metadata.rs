#![forbid(unsafe_code)]

use crate::error::DomainError;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Tagged scalar carried in entity metadata and relationship details.
/// Nested arrays/objects are rejected at the boundary.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetadataValue {
    Bool(bool),
    Num(f64),
    Str(String),
}

pub type MetadataMap = BTreeMap<String, MetadataValue>;

impl MetadataValue {
    pub fn to_json(&self) -> Value {
        match self {
            Self::Bool(v) => Value::Bool(*v),
            Self::Num(v) => serde_json::Number::from_f64(*v)
                .map(Value::Number)
                .unwrap_or(Value::Null),
            Self::Str(v) => Value::String(v.clone()),
        }
    }
}

/// Decode a JSON object into a metadata map, rejecting non-scalar values.
pub fn metadata_from_json(value: Value) -> Result<MetadataMap, DomainError> {
    let Value::Object(entries) = value else {
        return Err(DomainError::MetadataNotScalar {
            key: "<root>".to_string(),
        });
    };
    let mut out = MetadataMap::new();
    for (key, entry) in entries {
        let scalar = match entry {
            Value::Bool(v) => MetadataValue::Bool(v),
            Value::Number(v) => {
                let Some(num) = v.as_f64() else {
                    return Err(DomainError::MetadataNotScalar { key });
                };
                MetadataValue::Num(num)
            }
            Value::String(v) => MetadataValue::Str(v),
            Value::Null => continue,
            Value::Array(_) | Value::Object(_) => {
                return Err(DomainError::MetadataNotScalar { key });
            }
        };
        out.insert(key, scalar);
    }
    Ok(out)
}

pub fn metadata_to_json(map: &MetadataMap) -> Value {
    Value::Object(
        map.iter()
            .map(|(key, value)| (key.clone(), value.to_json()))
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn scalars_pass() {
        let map = metadata_from_json(json!({"a": "x", "b": 2.5, "c": true})).expect("scalars");
        assert_eq!(map.get("a"), Some(&MetadataValue::Str("x".to_string())));
        assert_eq!(map.get("b"), Some(&MetadataValue::Num(2.5)));
        assert_eq!(map.get("c"), Some(&MetadataValue::Bool(true)));
    }

    #[test]
    fn nulls_are_skipped() {
        let map = metadata_from_json(json!({"a": null})).expect("null entries drop");
        assert!(map.is_empty());
    }

    #[test]
    fn nested_values_rejected() {
        let err = metadata_from_json(json!({"a": {"b": 1}})).expect_err("nested");
        assert_eq!(
            err,
            DomainError::MetadataNotScalar {
                key: "a".to_string()
            }
        );
        assert!(metadata_from_json(json!({"a": [1, 2]})).is_err());
    }

    #[test]
    fn round_trips_through_json() {
        let source = json!({"path": "src/lib.rs", "lines": 120.0, "generated": false});
        let map = metadata_from_json(source.clone()).expect("decode");
        assert_eq!(metadata_to_json(&map), source);
    }
}
