// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Execution error types

use crate::schema::SchemaError;
use crate::storage::{GraphError, StorageError};
use thiserror::Error;

/// Execution errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ExecutionError {
    /// Missing or invalid command arguments; raised before any store access
    #[error("Argument error: {0}")]
    ArgumentError(String),

    /// Optimistic-concurrency conflict at commit time
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Entities failed schema constraints at commit time
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// Mutation of a single object inside a bulk or cascade operation failed
    #[error("Failed to process {object}: {message}")]
    PerObject { object: String, message: String },

    #[error("Already deleted: {0}")]
    AlreadyDeleted(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Schema error: {0}")]
    Schema(#[from] SchemaError),

    #[error("Transaction error: {0}")]
    Transaction(String),

    #[error("Callback error: {0}")]
    Callback(String),

    #[error("Post-commit phase still conflicting after {attempts} attempts")]
    RetryExhausted { attempts: u32 },
}

impl ExecutionError {
    /// Check if this error signals a concurrent modification
    pub fn is_conflict(&self) -> bool {
        matches!(self, ExecutionError::Conflict(_))
    }

    /// Check if this error is a benign race signal (entity already gone)
    pub fn is_benign(&self) -> bool {
        matches!(
            self,
            ExecutionError::AlreadyDeleted(_) | ExecutionError::NotFound(_)
        )
    }

    /// Wrap this error as the failure of one object
    pub fn for_object(self, object: impl Into<String>) -> Self {
        match self {
            ExecutionError::PerObject { .. } => self,
            other => ExecutionError::PerObject {
                object: object.into(),
                message: other.to_string(),
            },
        }
    }
}

impl From<StorageError> for ExecutionError {
    fn from(error: StorageError) -> Self {
        match error {
            StorageError::Conflict { .. } => ExecutionError::Conflict(error.to_string()),
            StorageError::Graph(GraphError::NodeNotFound(id)) => {
                ExecutionError::NotFound(format!("node {}", id))
            }
            StorageError::Graph(GraphError::EdgeNotFound(id)) => {
                ExecutionError::NotFound(format!("relationship {}", id))
            }
            StorageError::Graph(GraphError::NodeAlreadyDeleted(id)) => {
                ExecutionError::AlreadyDeleted(format!("node {}", id))
            }
            StorageError::TransactionClosed(_) => ExecutionError::Transaction(error.to_string()),
            other => ExecutionError::Storage(other.to_string()),
        }
    }
}
