// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Transaction management
//!
//! This module provides the transaction scope and the bookkeeping around it.
//!
//! # Features
//! - Two-phase scopes: commit, then callbacks, notifications and changelog
//! - Bounded, jittered retry of the post-commit phase on conflict
//! - Per-entity modification tracking within one transaction
//! - Per-type lifecycle hooks and transaction listeners

pub mod changelog;
pub mod hooks;
pub mod listener;
pub mod modification;
pub mod retry;
pub mod scope;
pub mod state;

pub use changelog::{ChangelogEntry, ChangelogVerb};
pub use hooks::{EntityHooks, HookRegistry};
pub use listener::{ListenerRegistry, TransactionListener};
pub use modification::{EntityKind, EntityRef, ModificationEvent, ModificationSet};
pub use retry::RetryPolicy;
pub use scope::TransactionScope;
pub use state::{ScopeStatus, TransactionId};
