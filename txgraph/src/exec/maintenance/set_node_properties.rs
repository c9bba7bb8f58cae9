// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! setNodeProperties: set literal values on every node (optionally of one
//! type)

use std::sync::Arc;

use super::{CommandArguments, MaintenanceCommand};
use crate::coordinator::ServiceContext;
use crate::exec::batch::{BulkBatchExecutor, BulkOperation};
use crate::exec::ExecutionError;
use crate::security::SecurityContext;
use crate::storage::Value;
use crate::txn::TransactionScope;

/// Arguments: optional `type`; every other key is a property to set
pub struct SetNodePropertiesCommand;

impl MaintenanceCommand for SetNodePropertiesCommand {
    fn name(&self) -> &'static str {
        "setNodeProperties"
    }

    fn execute(
        &self,
        services: &Arc<ServiceContext>,
        security: &SecurityContext,
        args: &CommandArguments,
    ) -> Result<u64, ExecutionError> {
        let node_type = args.get_string("type")?;
        let properties = args.entries_except(&["type"]);
        if properties.is_empty() {
            return Err(ExecutionError::ArgumentError(
                "setNodeProperties requires at least one property to set".to_string(),
            ));
        }

        let ids = services.store().node_ids(node_type.as_deref())?;
        let mut op = SetNodeProperties { properties };
        let count = BulkBatchExecutor::new(Arc::clone(services)).run(
            security,
            ids,
            services.config().set_properties_batch_size,
            "SetNodeProperties",
            &mut op,
        )?;

        log::info!("Finished setting properties on {} nodes", count);
        Ok(count)
    }
}

struct SetNodeProperties {
    properties: Vec<(String, Value)>,
}

impl BulkOperation<String> for SetNodeProperties {
    fn on_object(
        &mut self,
        _security: &SecurityContext,
        scope: &mut TransactionScope,
        id: &String,
    ) -> Result<bool, ExecutionError> {
        let node = scope.node(id)?;
        if node.uuid.is_none() {
            return Ok(true);
        }

        let schema = Arc::clone(scope.services().schema());
        for (name, value) in &self.properties {
            let key = schema
                .property_key(&node.node_type, name)
                .map_err(|e| ExecutionError::from(e).for_object(node.to_string()))?;
            scope.set_node_property(&node.id, &key, value.clone())?;
        }

        Ok(true)
    }

    fn on_object_error(&mut self, _security: &SecurityContext, error: &ExecutionError, id: &String) {
        log::warn!("Unable to set properties of node {}: {}", id, error);
    }

    fn on_batch_error(&mut self, _security: &SecurityContext, error: &ExecutionError) {
        log::warn!("Unable to set node properties: {}", error);
    }
}
