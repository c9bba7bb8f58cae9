// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Shared services injected into every transaction scope

use std::sync::Arc;

use crate::config::EngineConfig;
use crate::schema::{SchemaRegistry, SchemaValidator, Validator};
use crate::storage::GraphStore;
use crate::txn::{HookRegistry, ListenerRegistry};

/// Collaborators of the transactional engine
///
/// One context is shared (behind an `Arc`) by all scopes, cascades and
/// batch jobs of an engine instance. Hooks and listeners can be registered
/// at any time; the rest is fixed at construction.
pub struct ServiceContext {
    store: Arc<dyn GraphStore>,
    schema: Arc<SchemaRegistry>,
    validator: Arc<dyn Validator>,
    hooks: HookRegistry,
    listeners: ListenerRegistry,
    config: EngineConfig,
}

impl ServiceContext {
    /// Create a context validating against `schema`
    pub fn new(store: Arc<dyn GraphStore>, schema: Arc<SchemaRegistry>, config: EngineConfig) -> Self {
        let validator: Arc<dyn Validator> = Arc::new(SchemaValidator::new(Arc::clone(&schema)));
        Self {
            store,
            schema,
            validator,
            hooks: HookRegistry::new(),
            listeners: ListenerRegistry::new(),
            config,
        }
    }

    /// Replace the validator
    pub fn with_validator(mut self, validator: Arc<dyn Validator>) -> Self {
        self.validator = validator;
        self
    }

    pub fn store(&self) -> &Arc<dyn GraphStore> {
        &self.store
    }

    pub fn schema(&self) -> &Arc<SchemaRegistry> {
        &self.schema
    }

    pub fn validator(&self) -> &Arc<dyn Validator> {
        &self.validator
    }

    pub fn hooks(&self) -> &HookRegistry {
        &self.hooks
    }

    pub fn listeners(&self) -> &ListenerRegistry {
        &self.listeners
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }
}

impl std::fmt::Debug for ServiceContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceContext")
            .field("schema_types", &self.schema.type_names())
            .field("hooks", &self.hooks)
            .field("listeners", &self.listeners)
            .field("config", &self.config)
            .finish()
    }
}
