// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! copyRelationshipProperty: copy one property to another key on every
//! relationship (optionally of one type)

use std::sync::Arc;

use super::{CommandArguments, MaintenanceCommand};
use crate::coordinator::ServiceContext;
use crate::exec::batch::{BulkBatchExecutor, BulkOperation};
use crate::exec::ExecutionError;
use crate::security::SecurityContext;
use crate::storage::{Edge, Value};
use crate::txn::TransactionScope;

/// Arguments: `sourceKey`, `destKey`, optional `type`
pub struct CopyRelationshipPropertyCommand;

impl MaintenanceCommand for CopyRelationshipPropertyCommand {
    fn name(&self) -> &'static str {
        "copyRelationshipProperty"
    }

    fn execute(
        &self,
        services: &Arc<ServiceContext>,
        security: &SecurityContext,
        args: &CommandArguments,
    ) -> Result<u64, ExecutionError> {
        let source_key = args.require_string("sourceKey")?;
        let dest_key = args.require_string("destKey")?;
        let rel_type = args.get_string("type")?;

        let ids = services.store().edge_ids(rel_type.as_deref())?;
        log::info!(
            "Copying property {} to {} on {} relationships",
            source_key,
            dest_key,
            ids.len()
        );

        let mut op = CopyProperty {
            source_key,
            dest_key,
        };
        let count = BulkBatchExecutor::new(Arc::clone(services)).run(
            security,
            ids,
            services.config().copy_property_batch_size,
            "CopyRelationshipProperties",
            &mut op,
        )?;

        log::info!("Finished copying properties on {} relationships", count);
        Ok(count)
    }
}

struct CopyProperty {
    source_key: String,
    dest_key: String,
}

impl CopyProperty {
    fn copy(&self, scope: &mut TransactionScope, edge: &Edge) -> Result<(), ExecutionError> {
        let schema = Arc::clone(scope.services().schema());
        let source = schema.property_key(&edge.label, &self.source_key)?;
        let dest = schema.property_key(&edge.label, &self.dest_key)?;

        let value = edge
            .get_property(source.db_name())
            .cloned()
            .unwrap_or(Value::Null);
        scope.set_relationship_property(&edge.id, &dest, value)
    }
}

impl BulkOperation<String> for CopyProperty {
    fn on_object(
        &mut self,
        _security: &SecurityContext,
        scope: &mut TransactionScope,
        id: &String,
    ) -> Result<bool, ExecutionError> {
        let edge = scope.relationship(id)?;

        // Only tracked relationships
        if edge.uuid.is_some() {
            if let Err(e) = self.copy(scope, &edge) {
                log::warn!(
                    "Unable to copy relationship property {} of relationship {} to {}: {}",
                    self.source_key,
                    edge.id,
                    self.dest_key,
                    e
                );
            }
        }

        Ok(true)
    }

    fn on_object_error(&mut self, _security: &SecurityContext, error: &ExecutionError, id: &String) {
        log::warn!(
            "Unable to copy relationship properties of relationship {}: {}",
            id,
            error
        );
    }

    fn on_batch_error(&mut self, _security: &SecurityContext, error: &ExecutionError) {
        log::warn!("Unable to copy relationship properties: {}", error);
    }
}
