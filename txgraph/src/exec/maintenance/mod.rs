// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Maintenance commands
//!
//! Bulk mutations over the whole graph (or all entities of one type). Every
//! command owns its transaction boundaries through [`BulkBatchExecutor`]
//! and can run as a standalone job.
//!
//! [`BulkBatchExecutor`]: crate::exec::BulkBatchExecutor

pub mod copy_relationship_property;
pub mod create_labels;
pub mod set_node_properties;
pub mod set_relationship_properties;

pub use copy_relationship_property::CopyRelationshipPropertyCommand;
pub use create_labels::CreateLabelsCommand;
pub use set_node_properties::SetNodePropertiesCommand;
pub use set_relationship_properties::SetRelationshipPropertiesCommand;

use std::collections::HashMap;
use std::sync::Arc;

use crate::coordinator::ServiceContext;
use crate::exec::ExecutionError;
use crate::security::SecurityContext;
use crate::storage::Value;

/// A named bulk job
pub trait MaintenanceCommand: Send + Sync {
    /// Name the command is dispatched by
    fn name(&self) -> &'static str;

    /// Run the command, returning the number of processed objects
    ///
    /// Argument validation happens before any store access.
    fn execute(
        &self,
        services: &Arc<ServiceContext>,
        security: &SecurityContext,
        args: &CommandArguments,
    ) -> Result<u64, ExecutionError>;

    fn requires_enclosing_transaction(&self) -> bool {
        false
    }

    /// Whether caches built on top of the store must be flushed afterwards
    fn requires_flushing_of_caches(&self) -> bool {
        false
    }
}

/// All built-in commands
pub fn builtin_commands() -> Vec<Box<dyn MaintenanceCommand>> {
    vec![
        Box::new(CopyRelationshipPropertyCommand),
        Box::new(CreateLabelsCommand),
        Box::new(SetRelationshipPropertiesCommand),
        Box::new(SetNodePropertiesCommand),
    ]
}

/// Look up a built-in command by name
pub fn find_command(name: &str) -> Option<Box<dyn MaintenanceCommand>> {
    builtin_commands()
        .into_iter()
        .find(|command| command.name() == name)
}

/// Key to value map of command arguments
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CommandArguments {
    values: HashMap<String, Value>,
}

impl CommandArguments {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build arguments from a JSON object
    pub fn from_json(json: serde_json::Value) -> Result<Self, ExecutionError> {
        match json {
            serde_json::Value::Object(map) => Ok(map
                .into_iter()
                .map(|(key, value)| (key, Value::from(value)))
                .collect()),
            serde_json::Value::Null => Ok(Self::new()),
            other => Err(ExecutionError::ArgumentError(format!(
                "Command arguments must be a JSON object, got {}",
                other
            ))),
        }
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.values.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Optional string argument; present values must be strings
    pub fn get_string(&self, key: &str) -> Result<Option<String>, ExecutionError> {
        match self.values.get(key) {
            None | Some(Value::Null) => Ok(None),
            Some(value) => value.as_string().map(|s| Some(s.to_string())).ok_or_else(|| {
                ExecutionError::ArgumentError(format!(
                    "Argument '{}' must be a string, got {}",
                    key,
                    value.type_name()
                ))
            }),
        }
    }

    /// Required string argument
    pub fn require_string(&self, key: &str) -> Result<String, ExecutionError> {
        self.get_string(key)?.ok_or_else(|| {
            ExecutionError::ArgumentError(format!("Missing required argument '{}'", key))
        })
    }

    /// Optional boolean argument; accepts booleans and "true"/"false"
    pub fn get_bool(&self, key: &str) -> Result<Option<bool>, ExecutionError> {
        match self.values.get(key) {
            None | Some(Value::Null) => Ok(None),
            Some(value) => value.as_boolean().map(Some).ok_or_else(|| {
                ExecutionError::ArgumentError(format!(
                    "Argument '{}' must be a boolean, got {}",
                    key,
                    value.type_name()
                ))
            }),
        }
    }

    /// All arguments except the given keys, sorted by key
    pub fn entries_except(&self, excluded: &[&str]) -> Vec<(String, Value)> {
        let mut entries: Vec<(String, Value)> = self
            .values
            .iter()
            .filter(|(key, _)| !excluded.contains(&key.as_str()))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect();
        entries.sort_by(|a, b| a.0.cmp(&b.0));
        entries
    }
}

impl FromIterator<(String, Value)> for CommandArguments {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self {
            values: iter.into_iter().collect(),
        }
    }
}

impl From<HashMap<String, Value>> for CommandArguments {
    fn from(values: HashMap<String, Value>) -> Self {
        Self { values }
    }
}
