// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Graph Coordinator - entry point for transactional graph mutation
//!
//! Wraps a [`ServiceContext`] and exposes scope creation, node deletion and
//! maintenance command dispatch.

use std::sync::Arc;

use super::ServiceContext;
use crate::config::EngineConfig;
use crate::exec::maintenance::{find_command, CommandArguments};
use crate::exec::{BulkBatchExecutor, CascadeReport, ExecutionError};
use crate::schema::SchemaRegistry;
use crate::security::SecurityContext;
use crate::storage::{GraphStore, MemoryGraphStore};
use crate::txn::{ChangelogEntry, EntityHooks, TransactionListener, TransactionScope};

/// Graph Coordinator - orchestrates scopes, deletions and bulk jobs
pub struct GraphCoordinator {
    services: Arc<ServiceContext>,
}

impl GraphCoordinator {
    /// Create a coordinator over an existing store
    pub fn new(store: Arc<dyn GraphStore>, schema: SchemaRegistry, config: EngineConfig) -> Self {
        Self::from_services(Arc::new(ServiceContext::new(
            store,
            Arc::new(schema),
            config,
        )))
    }

    /// Create a coordinator over a fresh in-memory store
    pub fn in_memory(schema: SchemaRegistry, config: EngineConfig) -> Self {
        Self::new(Arc::new(MemoryGraphStore::new()), schema, config)
    }

    pub fn from_services(services: Arc<ServiceContext>) -> Self {
        Self { services }
    }

    pub fn services(&self) -> &Arc<ServiceContext> {
        &self.services
    }

    pub fn register_hooks(&self, entity_type: impl Into<String>, hooks: Arc<dyn EntityHooks>) {
        self.services.hooks().register(entity_type, hooks);
    }

    pub fn register_listener(&self, listener: Arc<dyn TransactionListener>) {
        self.services.listeners().register(listener);
    }

    /// Open a new transaction scope
    pub fn begin(&self, security: &SecurityContext) -> Result<TransactionScope, ExecutionError> {
        TransactionScope::start(Arc::clone(&self.services), security.clone())
    }

    /// Run `f` in its own scope, committing and closing it on success
    pub fn run_in_transaction<F, R>(
        &self,
        security: &SecurityContext,
        f: F,
    ) -> Result<R, ExecutionError>
    where
        F: FnOnce(&mut TransactionScope) -> Result<R, ExecutionError>,
    {
        let mut scope = self.begin(security)?;
        let result = f(&mut scope)?;
        scope.success()?;
        scope.close()?;
        Ok(result)
    }

    /// Delete a node in its own scope, cascading if `security` requests it
    pub fn delete_node(
        &self,
        security: &SecurityContext,
        node_id: &str,
    ) -> Result<CascadeReport, ExecutionError> {
        self.run_in_transaction(security, |scope| {
            let node = scope.node(node_id)?;
            scope.delete_node(&node)
        })
    }

    /// Bulk executor sharing this coordinator's services
    pub fn bulk_executor(&self) -> BulkBatchExecutor {
        BulkBatchExecutor::new(Arc::clone(&self.services))
    }

    /// Run a maintenance command by name
    pub fn run_maintenance(
        &self,
        name: &str,
        security: &SecurityContext,
        args: &CommandArguments,
    ) -> Result<u64, ExecutionError> {
        let command = find_command(name).ok_or_else(|| {
            ExecutionError::ArgumentError(format!("Unknown maintenance command '{}'", name))
        })?;

        log::info!("Running maintenance command {}", name);
        let count = command.execute(&self.services, security, args)?;

        if command.requires_flushing_of_caches() {
            log::debug!("Maintenance command {} requests a cache flush", name);
        }
        Ok(count)
    }

    /// Persisted changelog, oldest first
    pub fn changelog(&self) -> Result<Vec<ChangelogEntry>, ExecutionError> {
        Ok(self.services.store().changelog()?)
    }
}
