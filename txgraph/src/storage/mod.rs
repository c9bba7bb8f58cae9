// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Graph storage
//!
//! This module provides:
//! - Value type system for graph properties
//! - Node and relationship records with cascade policies
//! - In-memory graph cache with adjacency lists and label/type indices
//! - The store traits the transactional engine is written against
//! - An in-memory optimistic-concurrency store

pub mod graph_cache;
pub mod memory;
pub mod store;
pub mod types;
pub mod value;

pub use graph_cache::{GraphCache, GraphStats};
pub use memory::MemoryGraphStore;
pub use store::{GraphStore, StoreResult, StoreTransaction};
pub use types::{CascadePolicy, Edge, GraphError, Node, StorageError};
pub use value::Value;
