#![forbid(unsafe_code)]

use crate::store::StoreError;
use gm_core::metadata::{metadata_from_json, metadata_to_json, MetadataMap};
use gm_core::model::ComponentKind;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Primary graph node: a codebase entity such as a file, class, or feature.
#[derive(Clone, Debug, PartialEq)]
pub struct Component {
    pub id: String,
    pub kind: ComponentKind,
    pub name: String,
    pub description: Option<String>,
    pub path: Option<String>,
    pub codebase: Option<String>,
    pub metadata: MetadataMap,
    pub created_at_ms: i64,
    pub updated_at_ms: i64,
}

#[derive(Clone, Debug, Default)]
pub struct ComponentInput {
    pub id: Option<String>,
    pub kind: Option<ComponentKind>,
    pub name: String,
    pub description: Option<String>,
    pub path: Option<String>,
    pub codebase: Option<String>,
    pub metadata: MetadataMap,
}

/// Partial update; present fields replace the stored attribute, `id` is
/// immutable.
#[derive(Clone, Debug, Default)]
pub struct ComponentPatch {
    pub kind: Option<ComponentKind>,
    pub name: Option<String>,
    pub description: Option<String>,
    pub path: Option<String>,
    pub codebase: Option<String>,
    pub metadata: Option<MetadataMap>,
}

impl ComponentPatch {
    pub fn is_empty(&self) -> bool {
        self.kind.is_none()
            && self.name.is_none()
            && self.description.is_none()
            && self.path.is_none()
            && self.codebase.is_none()
            && self.metadata.is_none()
    }
}

#[derive(Clone, Debug, Default)]
pub struct ComponentFilter {
    pub kind: Option<ComponentKind>,
    pub name_contains: Option<String>,
    pub codebase: Option<String>,
}

/// Wire/journal form of a Component; enum fields flattened to their stable
/// string values so stored states survive enum evolution checks on read.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentState {
    pub id: String,
    pub kind: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub codebase: Option<String>,
    #[serde(default)]
    pub metadata: Value,
    #[serde(default)]
    pub created_at_ms: i64,
    #[serde(default)]
    pub updated_at_ms: i64,
}

impl Component {
    pub fn to_state(&self) -> ComponentState {
        ComponentState {
            id: self.id.clone(),
            kind: self.kind.as_str().to_string(),
            name: self.name.clone(),
            description: self.description.clone(),
            path: self.path.clone(),
            codebase: self.codebase.clone(),
            metadata: metadata_to_json(&self.metadata),
            created_at_ms: self.created_at_ms,
            updated_at_ms: self.updated_at_ms,
        }
    }

    pub fn from_state(state: ComponentState) -> Result<Self, StoreError> {
        let metadata = if state.metadata.is_null() {
            MetadataMap::new()
        } else {
            metadata_from_json(state.metadata)?
        };
        Ok(Self {
            id: state.id,
            kind: ComponentKind::parse(&state.kind)?,
            name: state.name,
            description: state.description,
            path: state.path,
            codebase: state.codebase,
            metadata,
            created_at_ms: state.created_at_ms,
            updated_at_ms: state.updated_at_ms,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gm_core::metadata::MetadataValue;

    // Contract: journal before/after states and snapshot payloads use these
    // exact camelCase keys. Stored rows depend on them staying put.
    #[test]
    fn state_serialization_contract() {
        let component = Component {
            id: "c-1".to_string(),
            kind: ComponentKind::File,
            name: "main.rs".to_string(),
            description: None,
            path: Some("src/main.rs".to_string()),
            codebase: None,
            metadata: [("lines".to_string(), MetadataValue::Num(10.0))]
                .into_iter()
                .collect(),
            created_at_ms: 1_000,
            updated_at_ms: 2_000,
        };
        let text = serde_json::to_string(&component.to_state()).expect("encode");
        let value: Value = serde_json::from_str(&text).expect("decode json");
        assert_eq!(value["id"], "c-1");
        assert_eq!(value["kind"], "FILE");
        assert_eq!(value["path"], "src/main.rs");
        assert_eq!(value["metadata"]["lines"], 10.0);
        assert_eq!(value["createdAtMs"], 1_000);
        assert_eq!(value["updatedAtMs"], 2_000);
        assert!(value.get("description").is_none(), "absent fields are omitted");

        let state: ComponentState = serde_json::from_str(&text).expect("decode state");
        let round_tripped = Component::from_state(state).expect("from state");
        assert_eq!(round_tripped, component);
    }

    #[test]
    fn unknown_kind_in_a_stored_state_is_rejected() {
        let state: ComponentState = serde_json::from_str(
            r#"{"id":"c","kind":"WIDGET","name":"n"}"#,
        )
        .expect("decode");
        assert!(Component::from_state(state).is_err());
    }
}
