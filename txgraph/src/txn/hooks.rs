// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Per-type entity lifecycle hooks
//!
//! `on_node_deletion` runs inside the deleting transaction before a node is
//! removed. The `after_*` callbacks run in the post-commit phase against the
//! nested scope, once per modified entity.

use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

use super::modification::ModificationEvent;
use super::scope::TransactionScope;
use crate::exec::ExecutionError;
use crate::storage::Node;

/// Lifecycle callbacks for one entity type
///
/// All methods default to doing nothing.
pub trait EntityHooks: Send + Sync {
    /// Called before a node of this type is deleted
    fn on_node_deletion(
        &self,
        _scope: &mut TransactionScope,
        _node: &Node,
    ) -> Result<(), ExecutionError> {
        Ok(())
    }

    fn after_creation(
        &self,
        _scope: &mut TransactionScope,
        _event: &ModificationEvent,
    ) -> Result<(), ExecutionError> {
        Ok(())
    }

    fn after_modification(
        &self,
        _scope: &mut TransactionScope,
        _event: &ModificationEvent,
    ) -> Result<(), ExecutionError> {
        Ok(())
    }

    fn after_deletion(
        &self,
        _scope: &mut TransactionScope,
        _event: &ModificationEvent,
    ) -> Result<(), ExecutionError> {
        Ok(())
    }
}

/// Hooks registered by entity type name
#[derive(Default)]
pub struct HookRegistry {
    hooks: RwLock<HashMap<String, Arc<dyn EntityHooks>>>,
}

impl HookRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register hooks for a type, replacing any previous registration
    pub fn register(&self, entity_type: impl Into<String>, hooks: Arc<dyn EntityHooks>) {
        self.hooks.write().insert(entity_type.into(), hooks);
    }

    pub fn unregister(&self, entity_type: &str) -> bool {
        self.hooks.write().remove(entity_type).is_some()
    }

    pub fn get(&self, entity_type: &str) -> Option<Arc<dyn EntityHooks>> {
        self.hooks.read().get(entity_type).cloned()
    }

    pub fn len(&self) -> usize {
        self.hooks.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.hooks.read().is_empty()
    }
}

impl std::fmt::Debug for HookRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut types: Vec<String> = self.hooks.read().keys().cloned().collect();
        types.sort();
        f.debug_struct("HookRegistry").field("types", &types).finish()
    }
}
