// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Graph Coordinator - central entry point for transactional graph mutation
//!
//! The GraphCoordinator owns the shared services (store, schema, validator,
//! hooks, listeners, configuration) and hands out transaction scopes,
//! deletions and maintenance jobs built on them.

pub mod graph_coordinator;
pub mod service_context;

pub use graph_coordinator::GraphCoordinator;
pub use service_context::ServiceContext;
