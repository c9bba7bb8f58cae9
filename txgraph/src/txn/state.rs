// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Transaction state management
//!
//! This module defines transaction identity and the lifecycle states of a
//! transaction scope.

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_TRANSACTION_ID: AtomicU64 = AtomicU64::new(1);

/// Unique identifier for a transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TransactionId(u64);

impl TransactionId {
    /// Allocate the next process-unique transaction ID
    pub fn new() -> Self {
        TransactionId(NEXT_TRANSACTION_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Get the underlying ID value
    pub fn id(&self) -> u64 {
        self.0
    }
}

impl Default for TransactionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for TransactionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "txn_{}", self.0)
    }
}

/// Lifecycle of a transaction scope
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScopeStatus {
    /// Created, low-level transaction not yet opened
    Created,
    /// Low-level transaction is open and accepts operations
    Active,
    /// Low-level commit succeeded; post-commit phase still pending
    Committed,
    /// Scope was finalized after a successful commit
    Closed,
    /// Scope was finalized without a successful commit
    RolledBack,
}

impl ScopeStatus {
    /// Check if the scope has been finalized
    pub fn is_finished(&self) -> bool {
        matches!(self, ScopeStatus::Closed | ScopeStatus::RolledBack)
    }
}
