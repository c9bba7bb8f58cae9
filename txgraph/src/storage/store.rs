// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Graph store traits
//!
//! This module defines the seam between the transactional engine and the
//! physical graph store. A store hands out low-level transactions; each
//! transaction carries the modification set the engine records into and
//! reports optimistic-concurrency conflicts at commit time.

use super::types::{Edge, Node, StorageError};
use crate::txn::changelog::ChangelogEntry;
use crate::txn::modification::ModificationSet;
use crate::txn::state::TransactionId;

/// Result type for store operations
pub type StoreResult<T> = Result<T, StorageError>;

/// Low-level store transaction
///
/// Reads observe the transaction's own writes. Nothing becomes visible to
/// other transactions before [`StoreTransaction::commit`] returns `Ok`.
pub trait StoreTransaction: Send {
    /// Identifier of this transaction
    fn id(&self) -> TransactionId;

    /// Check if the transaction still accepts operations
    fn is_active(&self) -> bool;

    /// Load a node; fails with `NodeNotFound` or `NodeAlreadyDeleted`
    fn get_node(&self, id: &str) -> StoreResult<Node>;

    /// Load an edge; fails with `EdgeNotFound`
    fn get_edge(&self, id: &str) -> StoreResult<Edge>;

    /// Edges whose source is the given node
    fn outgoing_edges(&self, node_id: &str) -> StoreResult<Vec<Edge>>;

    /// Edges whose target is the given node
    fn incoming_edges(&self, node_id: &str) -> StoreResult<Vec<Edge>>;

    /// Node IDs of one type (or all nodes), in id order
    fn node_ids(&self, node_type: Option<&str>) -> StoreResult<Vec<String>>;

    /// Edge IDs of one relationship type (or all edges), in id order
    fn edge_ids(&self, edge_type: Option<&str>) -> StoreResult<Vec<String>>;

    fn create_node(&mut self, node: Node) -> StoreResult<()>;

    fn create_edge(&mut self, edge: Edge) -> StoreResult<()>;

    /// Replace the stored record of an existing node
    fn update_node(&mut self, node: Node) -> StoreResult<()>;

    /// Replace the properties of an existing edge
    fn update_edge(&mut self, edge: Edge) -> StoreResult<()>;

    /// Physically delete a node
    ///
    /// With `force` the store detaches remaining relationships itself;
    /// without it the call fails with `NodeHasRelationships` if any remain.
    fn delete_node(&mut self, id: &str, force: bool) -> StoreResult<()>;

    fn delete_edge(&mut self, id: &str) -> StoreResult<()>;

    /// Check if a node existed when this transaction began but has been
    /// physically deleted by it
    fn is_node_deleted(&self, id: &str) -> bool;

    /// Queue changelog entries to be persisted atomically with this transaction
    fn append_changelog(&mut self, entries: Vec<ChangelogEntry>);

    /// Modification set attached to this transaction
    fn modifications(&self) -> &ModificationSet;

    fn modifications_mut(&mut self) -> &mut ModificationSet;

    /// Low-level commit; fails with `Conflict` on concurrent modification
    fn commit(&mut self) -> StoreResult<()>;

    /// End the transaction, rolling back if it was not committed
    ///
    /// Returns the modification set of a committed transaction, `None` for
    /// a rolled back one.
    fn finish(self: Box<Self>) -> Option<ModificationSet>;
}

/// Physical graph store
pub trait GraphStore: Send + Sync {
    /// Open a new low-level transaction
    fn begin(&self) -> StoreResult<Box<dyn StoreTransaction>>;

    /// Committed node IDs of one type (or all nodes), in id order
    fn node_ids(&self, node_type: Option<&str>) -> StoreResult<Vec<String>>;

    /// Committed edge IDs of one relationship type (or all edges), in id order
    fn edge_ids(&self, edge_type: Option<&str>) -> StoreResult<Vec<String>>;

    /// Persisted changelog entries, oldest first
    fn changelog(&self) -> StoreResult<Vec<ChangelogEntry>>;
}
