// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! createLabels: (re)create the type labels of every node
//!
//! A node's labels are its type and the ancestors of that type. With
//! `removeUnused` (the default) the label set is replaced exactly, so
//! running the command twice is a no-op the second time; without it the
//! missing labels are added and unknown ones kept.

use std::sync::Arc;

use super::{CommandArguments, MaintenanceCommand};
use crate::coordinator::ServiceContext;
use crate::exec::batch::{BulkBatchExecutor, BulkOperation};
use crate::exec::ExecutionError;
use crate::security::SecurityContext;
use crate::txn::TransactionScope;

/// Arguments: optional `type`, optional `removeUnused` (default true)
pub struct CreateLabelsCommand;

impl MaintenanceCommand for CreateLabelsCommand {
    fn name(&self) -> &'static str {
        "createLabels"
    }

    fn execute(
        &self,
        services: &Arc<ServiceContext>,
        security: &SecurityContext,
        args: &CommandArguments,
    ) -> Result<u64, ExecutionError> {
        let entity_type = args.get_string("type")?;
        let remove_unused = args.get_bool("removeUnused")?.unwrap_or(true);

        match &entity_type {
            Some(entity_type) => {
                log::info!("Starting creation of labels for all nodes of type {}", entity_type)
            }
            None => log::info!("Node type not set, starting creation of labels for all nodes"),
        }

        let ids = services.store().node_ids(entity_type.as_deref())?;
        let mut op = UpdateLabels { remove_unused };
        let count = BulkBatchExecutor::new(Arc::clone(services)).run(
            security,
            ids,
            services.config().create_labels_batch_size,
            "CreateLabels",
            &mut op,
        )?;

        log::info!("Done with creating labels on {} nodes", count);
        Ok(count)
    }

    fn requires_flushing_of_caches(&self) -> bool {
        true
    }
}

struct UpdateLabels {
    remove_unused: bool,
}

impl BulkOperation<String> for UpdateLabels {
    fn on_object(
        &mut self,
        _security: &SecurityContext,
        scope: &mut TransactionScope,
        id: &String,
    ) -> Result<bool, ExecutionError> {
        let node = scope.node(id)?;
        let wanted = scope.services().schema().labels_for_type(&node.node_type);

        let labels = if self.remove_unused {
            wanted
        } else {
            let mut labels = node.labels.clone();
            for label in wanted {
                if !labels.contains(&label) {
                    labels.push(label);
                }
            }
            labels
        };

        if labels != node.labels {
            scope.set_node_labels(id, labels)?;
        }
        Ok(true)
    }

    fn on_object_error(&mut self, _security: &SecurityContext, error: &ExecutionError, id: &String) {
        log::warn!("Unable to create labels for node {}: {}", id, error);
    }

    fn on_batch_error(&mut self, _security: &SecurityContext, error: &ExecutionError) {
        log::warn!("Unable to create labels for node: {}", error);
    }
}
