// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Transaction scope
//!
//! A scope is one logical unit of work. It runs in two phases:
//!
//! 1. [`TransactionScope::success`] validates the modified nodes and commits
//!    the low-level store transaction.
//! 2. [`TransactionScope::close`] takes the modification set of the committed
//!    transaction and, inside a nested scope, runs the outer callbacks,
//!    notifies listeners and writes the changelog. A conflict while
//!    committing the nested scope restarts the phase with a fresh nested
//!    scope, bounded by the configured [`RetryPolicy`](super::RetryPolicy).
//!    Scopes without callbacks skip this phase entirely.
//!
//! The nested scope shares the outer scope's finalization guard, so writes
//! made by callbacks are committed without a post-commit phase of their own.
//!
//! A scope that is dropped without `success` rolls back. A scope that is
//! dropped without `close` is finalized by `Drop`, with errors logged.

use chrono::Utc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use super::changelog::ChangelogEntry;
use super::modification::ModificationSet;
use super::state::{ScopeStatus, TransactionId};
use crate::coordinator::ServiceContext;
use crate::exec::cascade::{CascadeReport, CascadingDeleteEngine};
use crate::exec::ExecutionError;
use crate::schema::{ErrorBuffer, PropertyKey};
use crate::security::SecurityContext;
use crate::storage::{Edge, Node, StoreTransaction, Value};

/// Bounded unit of work with two-phase finalization
pub struct TransactionScope {
    services: Arc<ServiceContext>,
    security: SecurityContext,
    tx: Option<Box<dyn StoreTransaction>>,
    id: Option<TransactionId>,
    status: ScopeStatus,
    success: bool,
    do_validation: bool,
    do_callbacks: bool,
    do_notifications: bool,
    /// Guard around the post-commit phase, shared with nested scopes
    finalizing: Arc<AtomicBool>,
}

impl TransactionScope {
    /// Create a scope with validation, callbacks and notifications enabled
    pub fn new(services: Arc<ServiceContext>, security: SecurityContext) -> Self {
        Self::with_options(services, security, true, true, true)
    }

    pub fn with_options(
        services: Arc<ServiceContext>,
        security: SecurityContext,
        do_validation: bool,
        do_callbacks: bool,
        do_notifications: bool,
    ) -> Self {
        Self {
            services,
            security,
            tx: None,
            id: None,
            status: ScopeStatus::Created,
            success: false,
            do_validation,
            do_callbacks,
            do_notifications,
            finalizing: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Create and begin a scope with default options
    pub fn start(
        services: Arc<ServiceContext>,
        security: SecurityContext,
    ) -> Result<Self, ExecutionError> {
        Self::new(services, security).begin()
    }

    /// Open the low-level store transaction
    pub fn begin(mut self) -> Result<Self, ExecutionError> {
        if self.status != ScopeStatus::Created {
            return Err(ExecutionError::Transaction(format!(
                "Cannot begin a scope in state {:?}",
                self.status
            )));
        }

        let tx = self.services.store().begin()?;
        log::debug!("Began transaction scope {}", tx.id());
        self.id = Some(tx.id());
        self.tx = Some(tx);
        self.status = ScopeStatus::Active;
        Ok(self)
    }

    pub fn id(&self) -> Option<TransactionId> {
        self.id
    }

    pub fn status(&self) -> ScopeStatus {
        self.status
    }

    pub fn is_success(&self) -> bool {
        self.success
    }

    pub fn services(&self) -> &Arc<ServiceContext> {
        &self.services
    }

    pub fn security(&self) -> &SecurityContext {
        &self.security
    }

    /// Modification set of the open transaction
    pub fn modifications(&self) -> Option<&ModificationSet> {
        self.tx.as_ref().map(|tx| tx.modifications())
    }

    /// Suppress changelog entries for this transaction
    pub fn disable_changelog(&mut self) -> Result<(), ExecutionError> {
        self.tx_mut()?.modifications_mut().disable_changelog();
        Ok(())
    }

    /// Queue changelog entries to be stored with this transaction
    pub fn append_changelog(&mut self, entries: Vec<ChangelogEntry>) -> Result<(), ExecutionError> {
        self.tx_mut()?.append_changelog(entries);
        Ok(())
    }

    pub fn node(&self, id: &str) -> Result<Node, ExecutionError> {
        Ok(self.tx()?.get_node(id)?)
    }

    pub fn relationship(&self, id: &str) -> Result<Edge, ExecutionError> {
        Ok(self.tx()?.get_edge(id)?)
    }

    pub fn outgoing_relationships(&self, node_id: &str) -> Result<Vec<Edge>, ExecutionError> {
        Ok(self.tx()?.outgoing_edges(node_id)?)
    }

    pub fn incoming_relationships(&self, node_id: &str) -> Result<Vec<Edge>, ExecutionError> {
        Ok(self.tx()?.incoming_edges(node_id)?)
    }

    /// All relationships attached to a node; self-loops appear once
    pub fn relationships(&self, node_id: &str) -> Result<Vec<Edge>, ExecutionError> {
        let mut edges = self.outgoing_relationships(node_id)?;
        edges.extend(
            self.incoming_relationships(node_id)?
                .into_iter()
                .filter(|edge| edge.from_node != node_id),
        );
        Ok(edges)
    }

    /// Node IDs of one type (or all nodes) visible to this transaction
    pub fn node_ids(&self, node_type: Option<&str>) -> Result<Vec<String>, ExecutionError> {
        Ok(self.tx()?.node_ids(node_type)?)
    }

    /// Relationship IDs of one type (or all) visible to this transaction
    pub fn relationship_ids(&self, rel_type: Option<&str>) -> Result<Vec<String>, ExecutionError> {
        Ok(self.tx()?.edge_ids(rel_type)?)
    }

    pub fn create_node(&mut self, node: Node) -> Result<Node, ExecutionError> {
        self.tx_mut()?.create_node(node.clone())?;
        self.record(|set, principal| set.record_node_created(&node, principal))?;
        Ok(node)
    }

    /// Create a relationship; both endpoints are recorded as modified
    pub fn create_relationship(&mut self, edge: Edge) -> Result<Edge, ExecutionError> {
        let endpoints = self.endpoints(&edge);
        self.tx_mut()?.create_edge(edge.clone())?;
        self.record(|set, principal| {
            set.record_relationship_created(&edge, principal);
            for node in &endpoints {
                set.record_node_modified(node, None, principal);
            }
        })?;
        Ok(edge)
    }

    pub fn set_node_property(
        &mut self,
        id: &str,
        key: &PropertyKey,
        value: Value,
    ) -> Result<(), ExecutionError> {
        key.check_value(&value)?;
        let mut node = self.node(id)?;
        node.set_property(key.db_name().to_string(), value);
        self.tx_mut()?.update_node(node.clone())?;
        self.record(|set, principal| set.record_node_modified(&node, Some(key.name()), principal))
    }

    pub fn set_relationship_property(
        &mut self,
        id: &str,
        key: &PropertyKey,
        value: Value,
    ) -> Result<(), ExecutionError> {
        key.check_value(&value)?;
        let mut edge = self.relationship(id)?;
        edge.set_property(key.db_name().to_string(), value);
        self.tx_mut()?.update_edge(edge.clone())?;
        self.record(|set, principal| {
            set.record_relationship_modified(&edge, Some(key.name()), principal)
        })
    }

    /// Replace the label set of a node
    ///
    /// Labels are index metadata; changing them is not recorded as a
    /// modification and triggers no callbacks.
    pub fn set_node_labels(&mut self, id: &str, labels: Vec<String>) -> Result<(), ExecutionError> {
        let mut node = self.node(id)?;
        node.labels = labels;
        self.tx_mut()?.update_node(node)?;
        Ok(())
    }

    /// Delete a relationship; surviving endpoints are recorded as modified
    pub fn delete_relationship(&mut self, id: &str) -> Result<(), ExecutionError> {
        let edge = self.relationship(id)?;
        self.tx_mut()?.delete_edge(id)?;
        let endpoints = self.endpoints(&edge);
        self.record(|set, principal| {
            set.record_relationship_deleted(&edge, principal);
            for node in &endpoints {
                set.record_node_modified(node, None, principal);
            }
        })
    }

    /// Record a node as deleted without touching the store
    pub fn mark_node_deleted(&mut self, node: &Node) -> Result<(), ExecutionError> {
        self.record(|set, principal| set.record_node_deleted(node, principal))
    }

    /// Physically delete a node
    ///
    /// Without `force` the node must have no relationships left.
    pub fn delete_node_physical(&mut self, id: &str, force: bool) -> Result<(), ExecutionError> {
        self.tx_mut()?.delete_node(id, force)?;
        Ok(())
    }

    /// Check if a node was deleted or marked deleted in this transaction
    pub fn is_node_deleted(&self, id: &str) -> bool {
        self.tx
            .as_ref()
            .is_some_and(|tx| tx.is_node_deleted(id) || tx.modifications().is_node_deleted(id))
    }

    /// Delete a node, cascading if the security context requests it
    pub fn delete_node(&mut self, node: &Node) -> Result<CascadeReport, ExecutionError> {
        CascadingDeleteEngine::new(self).execute(node)
    }

    /// Validate modified nodes and commit the store transaction
    pub fn success(&mut self) -> Result<(), ExecutionError> {
        if self.status != ScopeStatus::Active {
            return Err(ExecutionError::Transaction(format!(
                "Cannot commit a scope in state {:?}",
                self.status
            )));
        }

        if self.do_validation && self.services.config().validate_on_commit {
            self.validate_modifications()?;
        }

        self.tx_mut()?.commit()?;
        self.status = ScopeStatus::Committed;
        self.success = true;
        Ok(())
    }

    /// Finish the transaction and run the post-commit phase
    pub fn close(mut self) -> Result<(), ExecutionError> {
        self.finalize()
    }

    fn finalize(&mut self) -> Result<(), ExecutionError> {
        if self.status.is_finished() {
            return Ok(());
        }

        let modifications = self.tx.take().and_then(|tx| tx.finish());

        if !self.success {
            self.status = ScopeStatus::RolledBack;
            return Ok(());
        }
        self.status = ScopeStatus::Closed;

        if self
            .finalizing
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Ok(());
        }

        let result = match modifications {
            Some(mut modifications) if self.do_callbacks && !modifications.is_empty() => {
                self.run_post_commit(&mut modifications)
            }
            _ => Ok(()),
        };

        self.finalizing.store(false, Ordering::Release);
        result
    }

    fn run_post_commit(&self, modifications: &mut ModificationSet) -> Result<(), ExecutionError> {
        let policy = &self.services.config().retry;
        let mut notified = false;
        let mut attempt: u32 = 0;

        loop {
            attempt += 1;
            match self.post_commit_attempt(modifications, &mut notified) {
                Ok(()) => {
                    modifications.clear();
                    return Ok(());
                }
                Err(e) if e.is_conflict() => {
                    if policy.is_exhausted(attempt) {
                        log::warn!(
                            "Post-commit phase of {} failed after {} attempts: {}",
                            self.display_id(),
                            attempt,
                            e
                        );
                        return Err(ExecutionError::RetryExhausted { attempts: attempt });
                    }
                    let delay = policy.backoff(attempt);
                    log::debug!(
                        "Post-commit phase of {} conflicted on attempt {}, retrying in {:?}: {}",
                        self.display_id(),
                        attempt,
                        delay,
                        e
                    );
                    std::thread::sleep(delay);
                }
                Err(e) => return Err(e),
            }
        }
    }

    fn post_commit_attempt(
        &self,
        modifications: &ModificationSet,
        notified: &mut bool,
    ) -> Result<(), ExecutionError> {
        let mut nested = TransactionScope::with_options(
            Arc::clone(&self.services),
            self.security.clone(),
            self.do_validation,
            false,
            false,
        );
        nested.finalizing = Arc::clone(&self.finalizing);
        let mut nested = nested.begin()?;

        self.run_callbacks(&mut nested, modifications)?;

        if !*notified && self.do_notifications && self.security.transaction_notifications() {
            self.services
                .listeners()
                .notify(&self.security, modifications.events());
            *notified = true;
        }

        if self.services.config().changelog_enabled {
            let entries = modifications.changelog_entries(Utc::now());
            if !entries.is_empty() {
                nested.append_changelog(entries)?;
            }
        }

        nested.success()?;
        nested.close()
    }

    fn run_callbacks(
        &self,
        nested: &mut TransactionScope,
        modifications: &ModificationSet,
    ) -> Result<(), ExecutionError> {
        for event in modifications.events() {
            let Some(hooks) = self.services.hooks().get(&event.entity_type) else {
                continue;
            };

            match (event.is_created(), event.is_deleted()) {
                (true, true) => {}
                (true, false) => hooks.after_creation(nested, event)?,
                (false, true) => hooks.after_deletion(nested, event)?,
                (false, false) if event.is_modified() => hooks.after_modification(nested, event)?,
                (false, false) => {}
            }
        }
        Ok(())
    }

    fn validate_modifications(&self) -> Result<(), ExecutionError> {
        let Some(ids) = self.modifications().map(|set| set.nodes_to_validate()) else {
            return Ok(());
        };

        let validator = Arc::clone(self.services.validator());
        let mut errors = ErrorBuffer::new();

        for id in ids {
            match self.node(&id) {
                Ok(node) => {
                    validator.is_valid(self, &node, &mut errors);
                }
                Err(e) if e.is_benign() => continue,
                Err(e) => return Err(e),
            }
        }

        if errors.has_error() {
            log::debug!(
                "Validation of {} failed with {} errors",
                self.display_id(),
                errors.len()
            );
            return Err(ExecutionError::ValidationError(errors.to_string()));
        }
        Ok(())
    }

    /// Endpoints of an edge that still exist in this transaction
    fn endpoints(&self, edge: &Edge) -> Vec<Node> {
        let mut nodes = Vec::with_capacity(2);
        if let Ok(from) = self.node(&edge.from_node) {
            nodes.push(from);
        }
        if edge.to_node != edge.from_node {
            if let Ok(to) = self.node(&edge.to_node) {
                nodes.push(to);
            }
        }
        nodes
    }

    fn record<F>(&mut self, f: F) -> Result<(), ExecutionError>
    where
        F: FnOnce(&mut ModificationSet, Option<&str>),
    {
        let principal = self.security.principal();
        let tx = self.tx.as_mut().ok_or_else(Self::inactive)?;
        f(tx.modifications_mut(), principal);
        Ok(())
    }

    fn tx(&self) -> Result<&Box<dyn StoreTransaction>, ExecutionError> {
        self.tx.as_ref().ok_or_else(Self::inactive)
    }

    fn tx_mut(&mut self) -> Result<&mut Box<dyn StoreTransaction>, ExecutionError> {
        self.tx.as_mut().ok_or_else(Self::inactive)
    }

    fn inactive() -> ExecutionError {
        ExecutionError::Transaction("Transaction scope is not active".to_string())
    }

    fn display_id(&self) -> String {
        self.id
            .map(|id| id.to_string())
            .unwrap_or_else(|| "unstarted scope".to_string())
    }
}

impl Drop for TransactionScope {
    fn drop(&mut self) {
        if !self.status.is_finished() {
            if let Err(e) = self.finalize() {
                log::error!("Failed to finalize {}: {}", self.display_id(), e);
            }
        }
    }
}

impl std::fmt::Debug for TransactionScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransactionScope")
            .field("id", &self.id)
            .field("status", &self.status)
            .field("success", &self.success)
            .finish()
    }
}
