#![forbid(unsafe_code)]

use super::parse_metadata;
use crate::api::{
    CreateComponentRequest, CreateComponentsBulkRequest, DeleteComponentRequest,
    GetComponentRequest, SearchComponentsRequest, UpdateComponentRequest,
};
use crate::error::ApiError;
use crate::render::component_json;
use crate::Service;
use gm_broker::events;
use gm_core::model::ComponentKind;
use gm_storage::{ComponentFilter, ComponentInput, ComponentPatch};
use serde_json::{json, Value};

fn component_input(request: CreateComponentRequest) -> Result<ComponentInput, ApiError> {
    Ok(ComponentInput {
        id: request.id,
        kind: Some(ComponentKind::parse(&request.kind)?),
        name: request.name,
        description: request.description,
        path: request.path,
        codebase: request.codebase,
        metadata: parse_metadata(request.metadata)?,
    })
}

impl Service {
    pub(crate) fn op_create_component(&self, args: Value) -> Result<Value, ApiError> {
        let request: CreateComponentRequest = serde_json::from_value(args)?;
        let component = self.store().create_component(component_input(request)?)?;
        let rendered = component_json(&component);
        self.publish(events::COMPONENT_CREATED, rendered.clone());
        Ok(rendered)
    }

    pub(crate) fn op_get_component(&self, args: Value) -> Result<Value, ApiError> {
        let request: GetComponentRequest = serde_json::from_value(args)?;
        let component = self.store().get_component(&request.id)?;
        Ok(component_json(&component))
    }

    pub(crate) fn op_search_components(&self, args: Value) -> Result<Value, ApiError> {
        let request: SearchComponentsRequest = serde_json::from_value(args)?;
        let filter = ComponentFilter {
            kind: request
                .kind
                .as_deref()
                .map(ComponentKind::parse)
                .transpose()?,
            name_contains: request.name,
            codebase: request.codebase,
        };
        let components = self.store().search_components(filter)?;
        Ok(json!({
            "components": components.iter().map(component_json).collect::<Vec<_>>(),
            "count": components.len(),
        }))
    }

    pub(crate) fn op_update_component(&self, args: Value) -> Result<Value, ApiError> {
        let request: UpdateComponentRequest = serde_json::from_value(args)?;
        let patch = ComponentPatch {
            kind: request
                .kind
                .as_deref()
                .map(ComponentKind::parse)
                .transpose()?,
            name: request.name,
            description: request.description,
            path: request.path,
            codebase: request.codebase,
            metadata: request.metadata.map(|m| parse_metadata(Some(m))).transpose()?,
        };
        let component = self.store().update_component(&request.id, patch)?;
        let rendered = component_json(&component);
        self.publish(events::COMPONENT_UPDATED, rendered.clone());
        Ok(rendered)
    }

    pub(crate) fn op_delete_component(&self, args: Value) -> Result<Value, ApiError> {
        let request: DeleteComponentRequest = serde_json::from_value(args)?;
        let rendered = {
            let mut store = self.store();
            let component = store.get_component(&request.id)?;
            store.delete_component(&request.id)?;
            component_json(&component)
        };
        self.publish(events::COMPONENT_DELETED, rendered);
        Ok(json!({ "deleted": true, "id": request.id }))
    }

    pub(crate) fn op_create_components_bulk(&self, args: Value) -> Result<Value, ApiError> {
        let request: CreateComponentsBulkRequest = serde_json::from_value(args)?;
        let inputs = request
            .components
            .into_iter()
            .map(component_input)
            .collect::<Result<Vec<_>, _>>()?;
        let components = self.store().create_components_bulk(inputs)?;
        let items: Vec<Value> = components.iter().map(component_json).collect();
        self.publish(
            events::COMPONENTS_BULK_CREATED,
            json!({ "items": items, "count": items.len() }),
        );
        Ok(json!({ "components": items, "count": components.len() }))
    }
}
