// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Graph mutation execution
//!
//! This module provides the operations that run inside or across
//! transaction scopes: cascading deletion, bulk batch execution and the
//! maintenance commands built on it.

pub mod batch;
pub mod cascade;
pub mod error;
pub mod maintenance;

pub use batch::{BatchSummary, BulkBatchExecutor, BulkOperation};
pub use cascade::{CascadeReport, CascadingDeleteEngine};
pub use error::ExecutionError;
pub use maintenance::{CommandArguments, MaintenanceCommand};
