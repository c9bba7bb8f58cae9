// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Bulk batch execution
//!
//! Applies a per-object mutation across a large sequence. The sequence is
//! consumed once, in order, and partitioned into chunks of at most
//! `batch_size` objects; each chunk runs in its own transaction scope and is
//! committed independently.
//!
//! A failing object is reported through [`BulkOperation::on_object_error`]
//! and the batch continues. A failing commit is reported through
//! [`BulkOperation::on_batch_error`]; the chunk's objects are not counted
//! and the run continues with the next chunk. Failed chunks are not retried.

use std::sync::Arc;

use crate::coordinator::ServiceContext;
use crate::exec::ExecutionError;
use crate::security::SecurityContext;
use crate::txn::TransactionScope;

/// Per-object mutation driven by [`BulkBatchExecutor`]
pub trait BulkOperation<T> {
    /// Process one object
    ///
    /// Returns `Ok(true)` if the object was processed and `Ok(false)` to stop
    /// the run once the current batch has been committed.
    fn on_object(
        &mut self,
        security: &SecurityContext,
        scope: &mut TransactionScope,
        object: &T,
    ) -> Result<bool, ExecutionError>;

    fn on_object_error(&mut self, _security: &SecurityContext, error: &ExecutionError, _object: &T) {
        log::warn!("Unable to process object: {}", error);
    }

    fn on_batch_error(&mut self, _security: &SecurityContext, error: &ExecutionError) {
        log::warn!("Unable to commit batch: {}", error);
    }
}

/// Result of one bulk run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchSummary {
    /// Objects processed in committed batches
    pub processed: u64,
    pub batches_committed: u64,
    pub batches_failed: u64,
    /// Objects whose mutation failed
    pub object_errors: u64,
    /// The operation asked to stop before the source was exhausted
    pub stopped_early: bool,
}

/// Driver applying a [`BulkOperation`] in independently committed batches
pub struct BulkBatchExecutor {
    services: Arc<ServiceContext>,
}

impl BulkBatchExecutor {
    pub fn new(services: Arc<ServiceContext>) -> Self {
        Self { services }
    }

    /// Run `op` over `source`, returning the number of processed objects
    pub fn run<T, I, O>(
        &self,
        security: &SecurityContext,
        source: I,
        batch_size: usize,
        label: &str,
        op: &mut O,
    ) -> Result<u64, ExecutionError>
    where
        I: IntoIterator<Item = T>,
        O: BulkOperation<T> + ?Sized,
    {
        self.run_with_summary(security, source, batch_size, label, op)
            .map(|summary| summary.processed)
    }

    /// Run `op` over `source`, returning the full summary
    pub fn run_with_summary<T, I, O>(
        &self,
        security: &SecurityContext,
        source: I,
        batch_size: usize,
        label: &str,
        op: &mut O,
    ) -> Result<BatchSummary, ExecutionError>
    where
        I: IntoIterator<Item = T>,
        O: BulkOperation<T> + ?Sized,
    {
        if batch_size == 0 {
            return Err(ExecutionError::ArgumentError(
                "Batch size must be greater than zero".to_string(),
            ));
        }

        let mut source = source.into_iter();
        let mut summary = BatchSummary::default();

        loop {
            let batch: Vec<T> = source.by_ref().take(batch_size).collect();
            if batch.is_empty() {
                break;
            }

            let stop = self.run_batch(security, &batch, label, op, &mut summary);
            if stop {
                log::debug!("{}: stopped by operation", label);
                summary.stopped_early = true;
                break;
            }
        }

        log::debug!(
            "{}: {} batches committed, {} failed, {} object errors",
            label,
            summary.batches_committed,
            summary.batches_failed,
            summary.object_errors
        );

        Ok(summary)
    }

    /// Process and commit one chunk; returns true if the run should stop
    fn run_batch<T, O>(
        &self,
        security: &SecurityContext,
        batch: &[T],
        label: &str,
        op: &mut O,
        summary: &mut BatchSummary,
    ) -> bool
    where
        O: BulkOperation<T> + ?Sized,
    {
        let mut scope = match TransactionScope::start(Arc::clone(&self.services), security.clone()) {
            Ok(scope) => scope,
            Err(e) => {
                op.on_batch_error(security, &e);
                summary.batches_failed += 1;
                return false;
            }
        };

        let mut count = 0u64;
        let mut stop = false;

        for object in batch {
            match op.on_object(security, &mut scope, object) {
                Ok(true) => count += 1,
                Ok(false) => {
                    stop = true;
                    break;
                }
                Err(e) => {
                    summary.object_errors += 1;
                    op.on_object_error(security, &e, object);
                }
            }
        }

        match scope.success() {
            Ok(()) => {
                // Committed; a failing post-commit phase does not undo it
                if let Err(e) = scope.close() {
                    op.on_batch_error(security, &e);
                }
                summary.processed += count;
                summary.batches_committed += 1;
                log::info!("{}: {} objects processed", label, summary.processed);
            }
            Err(e) => {
                op.on_batch_error(security, &e);
                summary.batches_failed += 1;
            }
        }

        stop
    }
}
