// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
// Engine configuration

use crate::txn::RetryPolicy;
use serde::{Deserialize, Serialize};

/// Configuration for the transactional engine
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Whether to validate modified nodes when a scope commits
    pub validate_on_commit: bool,

    /// Whether to write changelog entries after commit
    pub changelog_enabled: bool,

    /// Retry behavior of the post-commit phase
    pub retry: RetryPolicy,

    /// Batch size of the copyRelationshipProperty command
    pub copy_property_batch_size: usize,

    /// Batch size of the setRelationshipProperties and setNodeProperties commands
    pub set_properties_batch_size: usize,

    /// Batch size of the createLabels command
    pub create_labels_batch_size: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            validate_on_commit: true,
            changelog_enabled: true,
            retry: RetryPolicy::default(),
            copy_property_batch_size: 1000,
            set_properties_batch_size: 1000,
            create_labels_batch_size: 10000,
        }
    }
}

impl EngineConfig {
    /// Create a configuration without commit validation or changelog
    pub fn relaxed() -> Self {
        Self {
            validate_on_commit: false,
            changelog_enabled: false,
            ..Self::default()
        }
    }

    /// Create a configuration that retries conflicts forever
    pub fn unbounded_retry() -> Self {
        Self {
            retry: RetryPolicy::unbounded(),
            ..Self::default()
        }
    }

    /// Use the same batch size for every maintenance command
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.copy_property_batch_size = batch_size;
        self.set_properties_batch_size = batch_size;
        self.create_labels_batch_size = batch_size;
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }
}
