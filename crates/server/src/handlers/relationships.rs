#![forbid(unsafe_code)]

use super::parse_metadata;
use crate::api::{
    CreateRelationshipRequest, CreateRelationshipsBulkRequest, GetComponentRelationshipsRequest,
    GetDependencyTreeRequest,
};
use crate::error::ApiError;
use crate::render::{dependency_path_json, link_json, relationship_json};
use crate::Service;
use gm_broker::events;
use gm_core::model::RelationshipType;
use gm_storage::{RelationshipDirection, RelationshipInput};
use serde_json::{json, Value};

fn relationship_input(request: CreateRelationshipRequest) -> Result<RelationshipInput, ApiError> {
    Ok(RelationshipInput {
        id: request.id,
        rel_type: RelationshipType::parse_user(&request.rel_type)?,
        source_id: request.source_id,
        target_id: request.target_id,
        details: parse_metadata(request.details)?,
        time_order: request.time_order,
        probability: request.probability,
        reasoning: request.reasoning,
    })
}

impl Service {
    pub(crate) fn op_create_relationship(&self, args: Value) -> Result<Value, ApiError> {
        let request: CreateRelationshipRequest = serde_json::from_value(args)?;
        let relationship = self
            .store()
            .create_relationship(relationship_input(request)?)?;
        let rendered = relationship_json(&relationship);
        self.publish(events::RELATIONSHIP_CREATED, rendered.clone());
        Ok(rendered)
    }

    pub(crate) fn op_create_relationships_bulk(&self, args: Value) -> Result<Value, ApiError> {
        let request: CreateRelationshipsBulkRequest = serde_json::from_value(args)?;
        let inputs = request
            .relationships
            .into_iter()
            .map(relationship_input)
            .collect::<Result<Vec<_>, _>>()?;
        let relationships = self.store().create_relationships_bulk(inputs)?;
        let items: Vec<Value> = relationships.iter().map(relationship_json).collect();
        self.publish(
            events::RELATIONSHIPS_BULK_CREATED,
            json!({ "items": items, "count": items.len() }),
        );
        Ok(json!({ "relationships": items, "count": relationships.len() }))
    }

    pub(crate) fn op_get_component_relationships(&self, args: Value) -> Result<Value, ApiError> {
        let request: GetComponentRelationshipsRequest = serde_json::from_value(args)?;
        let direction = match request.direction.as_deref() {
            None => RelationshipDirection::Both,
            Some(raw) => RelationshipDirection::parse(raw)?,
        };
        let links = self
            .store()
            .get_component_relationships(&request.component_id, direction)?;
        Ok(json!({
            "relationships": links.iter().map(link_json).collect::<Vec<_>>(),
            "count": links.len(),
        }))
    }

    pub(crate) fn op_get_dependency_tree(&self, args: Value) -> Result<Value, ApiError> {
        let request: GetDependencyTreeRequest = serde_json::from_value(args)?;
        let paths = self
            .store()
            .get_dependency_tree(&request.component_id, request.max_depth)?;
        Ok(json!({
            "paths": paths.iter().map(dependency_path_json).collect::<Vec<_>>(),
            "count": paths.len(),
        }))
    }
}
