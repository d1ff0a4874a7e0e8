#![forbid(unsafe_code)]

use super::Component;
use crate::store::StoreError;
use gm_core::metadata::{metadata_from_json, metadata_to_json, MetadataMap};
use gm_core::model::RelationshipType;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Directed, typed edge between two Components. Parallel edges are allowed.
#[derive(Clone, Debug, PartialEq)]
pub struct Relationship {
    pub id: String,
    pub rel_type: RelationshipType,
    pub source_id: String,
    pub target_id: String,
    pub details: MetadataMap,
    pub time_order: Option<i64>,
    pub probability: Option<f64>,
    pub reasoning: Option<String>,
    pub created_at_ms: i64,
}

#[derive(Clone, Debug)]
pub struct RelationshipInput {
    pub id: Option<String>,
    pub rel_type: RelationshipType,
    pub source_id: String,
    pub target_id: String,
    pub details: MetadataMap,
    pub time_order: Option<i64>,
    pub probability: Option<f64>,
    pub reasoning: Option<String>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RelationshipDirection {
    Incoming,
    Outgoing,
    Both,
}

impl RelationshipDirection {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Incoming => "incoming",
            Self::Outgoing => "outgoing",
            Self::Both => "both",
        }
    }

    pub fn parse(value: &str) -> Result<Self, StoreError> {
        match value {
            "incoming" => Ok(Self::Incoming),
            "outgoing" => Ok(Self::Outgoing),
            "both" => Ok(Self::Both),
            _ => Err(StoreError::InvalidInput(
                "direction must be one of incoming, outgoing, both",
            )),
        }
    }
}

/// One row of `get_component_relationships`: the edge, the node on the far
/// side, and which way the edge points relative to the queried component.
#[derive(Clone, Debug)]
pub struct ComponentLink {
    pub relationship: Relationship,
    pub neighbor: Component,
    pub direction: RelationshipDirection,
}

/// One root-first DEPENDS_ON chain from the dependency tree expansion.
#[derive(Clone, Debug)]
pub struct DependencyPath {
    pub components: Vec<Component>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelationshipState {
    pub id: String,
    #[serde(rename = "type")]
    pub rel_type: String,
    pub source_id: String,
    pub target_id: String,
    #[serde(default)]
    pub details: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_order: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub probability: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reasoning: Option<String>,
    #[serde(default)]
    pub created_at_ms: i64,
}

impl Relationship {
    pub fn to_state(&self) -> RelationshipState {
        RelationshipState {
            id: self.id.clone(),
            rel_type: self.rel_type.as_str().to_string(),
            source_id: self.source_id.clone(),
            target_id: self.target_id.clone(),
            details: metadata_to_json(&self.details),
            time_order: self.time_order,
            probability: self.probability,
            reasoning: self.reasoning.clone(),
            created_at_ms: self.created_at_ms,
        }
    }

    pub fn from_state(state: RelationshipState) -> Result<Self, StoreError> {
        let details = if state.details.is_null() {
            MetadataMap::new()
        } else {
            metadata_from_json(state.details)?
        };
        Ok(Self {
            id: state.id,
            rel_type: RelationshipType::parse(&state.rel_type)?,
            source_id: state.source_id,
            target_id: state.target_id,
            details,
            time_order: state.time_order,
            probability: state.probability,
            reasoning: state.reasoning,
            created_at_ms: state.created_at_ms,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn state_uses_the_wire_field_names() {
        let relationship = Relationship {
            id: "r-1".to_string(),
            rel_type: RelationshipType::DependsOn,
            source_id: "a".to_string(),
            target_id: "b".to_string(),
            details: MetadataMap::new(),
            time_order: Some(1),
            probability: Some(0.5),
            reasoning: None,
            created_at_ms: 42,
        };
        let value = serde_json::to_value(relationship.to_state()).expect("encode");
        assert_eq!(value["type"], "DEPENDS_ON");
        assert_eq!(value["sourceId"], "a");
        assert_eq!(value["targetId"], "b");
        assert_eq!(value["timeOrder"], 1);
        assert_eq!(value["probability"], 0.5);

        let state: RelationshipState = serde_json::from_value(value).expect("decode");
        assert_eq!(
            Relationship::from_state(state).expect("from state"),
            relationship
        );
    }
}
