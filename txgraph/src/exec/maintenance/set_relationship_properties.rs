// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! setRelationshipProperties: set literal values on every relationship
//! (optionally of one type)

use std::sync::Arc;

use super::{CommandArguments, MaintenanceCommand};
use crate::coordinator::ServiceContext;
use crate::exec::batch::{BulkBatchExecutor, BulkOperation};
use crate::exec::ExecutionError;
use crate::security::SecurityContext;
use crate::storage::Value;
use crate::txn::TransactionScope;

/// Arguments: optional `type`; every other key is a property to set
pub struct SetRelationshipPropertiesCommand;

impl MaintenanceCommand for SetRelationshipPropertiesCommand {
    fn name(&self) -> &'static str {
        "setRelationshipProperties"
    }

    fn execute(
        &self,
        services: &Arc<ServiceContext>,
        security: &SecurityContext,
        args: &CommandArguments,
    ) -> Result<u64, ExecutionError> {
        let rel_type = args.get_string("type")?;
        let properties = args.entries_except(&["type"]);
        if properties.is_empty() {
            return Err(ExecutionError::ArgumentError(
                "setRelationshipProperties requires at least one property to set".to_string(),
            ));
        }

        let ids = services.store().edge_ids(rel_type.as_deref())?;
        let mut op = SetRelationshipProperties { properties };
        let count = BulkBatchExecutor::new(Arc::clone(services)).run(
            security,
            ids,
            services.config().set_properties_batch_size,
            "SetRelationshipProperties",
            &mut op,
        )?;

        log::info!("Finished setting properties on {} relationships", count);
        Ok(count)
    }
}

struct SetRelationshipProperties {
    properties: Vec<(String, Value)>,
}

impl BulkOperation<String> for SetRelationshipProperties {
    fn on_object(
        &mut self,
        _security: &SecurityContext,
        scope: &mut TransactionScope,
        id: &String,
    ) -> Result<bool, ExecutionError> {
        let edge = scope.relationship(id)?;

        // Only tracked relationships
        if edge.uuid.is_none() {
            return Ok(true);
        }

        let schema = Arc::clone(scope.services().schema());
        for (name, value) in &self.properties {
            let key = match schema.property_key(&edge.label, name) {
                Ok(key) => key,
                Err(e) => {
                    log::debug!("Skipping property {} of relationship {}: {}", name, edge.id, e);
                    continue;
                }
            };

            if let Err(e) = scope.set_relationship_property(&edge.id, &key, value.clone()) {
                log::warn!(
                    "Unable to set relationship property {} of relationship {} to {}: {}",
                    name,
                    edge.id,
                    value,
                    e
                );
            }
        }

        Ok(true)
    }

    fn on_object_error(&mut self, _security: &SecurityContext, error: &ExecutionError, id: &String) {
        log::warn!("Unable to set properties of relationship {}: {}", id, error);
    }

    fn on_batch_error(&mut self, _security: &SecurityContext, error: &ExecutionError) {
        log::warn!("Unable to set relationship properties: {}", error);
    }
}
