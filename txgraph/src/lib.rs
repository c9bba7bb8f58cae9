// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! txgraph - a transactional graph-mutation engine
//!
//! txgraph sits between application code and a property-graph store and
//! provides the mutation semantics on top of the store's low-level
//! transactions.
//!
//! # Features
//!
//! - **Transaction scopes**: commit, then run callbacks, listener
//!   notification and changelog in a nested scope, retried on conflict
//! - **Cascading delete**: direction-aware, cycle-safe deletion with
//!   constraint-based revalidation of neighbors
//! - **Bulk batch execution**: apply a mutation across large object sets in
//!   independently committed chunks with per-object failure isolation
//! - **Maintenance commands**: property copy, label (re)creation and bulk
//!   property assignment
//!
//! # Usage
//!
//! ```ignore
//! let coordinator = GraphCoordinator::in_memory(SchemaRegistry::new(), EngineConfig::default());
//! let security = SecurityContext::for_user("admin").with_cascading_delete(true);
//!
//! coordinator.run_in_transaction(&security, |scope| {
//!     scope.create_node(Node::new("a", "Folder"))?;
//!     Ok(())
//! })?;
//!
//! let report = coordinator.delete_node(&security, "a")?;
//! ```

pub mod config;
pub mod coordinator;
pub mod exec;
pub mod schema;
pub mod security;
pub mod storage;
pub mod txn;

pub use config::EngineConfig;
pub use coordinator::{GraphCoordinator, ServiceContext};
pub use exec::{
    BatchSummary, BulkBatchExecutor, BulkOperation, CascadeReport, CascadingDeleteEngine,
    CommandArguments, ExecutionError, MaintenanceCommand,
};
pub use schema::{SchemaError, SchemaRegistry, Validator};
pub use security::SecurityContext;
pub use storage::{CascadePolicy, Edge, GraphStore, MemoryGraphStore, Node, Value};
pub use txn::{
    EntityHooks, ModificationEvent, ModificationSet, RetryPolicy, TransactionListener,
    TransactionScope,
};

/// txgraph version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
