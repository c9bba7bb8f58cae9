// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! In-memory graph store implementation
//!
//! Each transaction works on a private copy of the committed graph. Commit
//! uses first-committer-wins optimistic concurrency: if any entity this
//! transaction touched was committed by another transaction after this one
//! began, the commit fails with a conflict and nothing is applied.
//!
//! This is a reference store. `begin` clones the whole committed graph and
//! `commit` clones it again under the write lock before applying, so every
//! transaction costs O(N) in the size of the graph. A bulk job that commits
//! every B entities over N entities therefore costs O(N²/B) in copying.
//! Stores meant for large graphs should keep per-transaction overlays over
//! a shared snapshot instead.

use super::graph_cache::{GraphCache, GraphStats};
use super::store::{GraphStore, StoreResult, StoreTransaction};
use super::types::{Edge, GraphError, Node, StorageError};
use crate::txn::changelog::ChangelogEntry;
use crate::txn::modification::ModificationSet;
use crate::txn::state::TransactionId;
use parking_lot::RwLock;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

/// Committed state shared by all transactions of one store
#[derive(Debug, Default)]
struct CommittedState {
    graph: GraphCache,
    /// Commit counter, incremented once per successful commit
    version: u64,
    /// Version of the last commit that touched each node
    node_versions: HashMap<String, u64>,
    /// Version of the last commit that touched each edge
    edge_versions: HashMap<String, u64>,
    changelog: Vec<ChangelogEntry>,
}

/// In-memory graph store for embedding and testing
#[derive(Debug, Clone, Default)]
pub struct MemoryGraphStore {
    state: Arc<RwLock<CommittedState>>,
}

impl MemoryGraphStore {
    /// Create a new empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Committed copy of a node
    pub fn node(&self, id: &str) -> Option<Node> {
        self.state.read().graph.get_node(id).cloned()
    }

    /// Committed copy of an edge
    pub fn edge(&self, id: &str) -> Option<Edge> {
        self.state.read().graph.get_edge(id).cloned()
    }

    /// Committed edges attached to a node, in either direction
    pub fn connected_edges(&self, node_id: &str) -> Vec<Edge> {
        self.state
            .read()
            .graph
            .get_connected_edges(node_id)
            .into_iter()
            .cloned()
            .collect()
    }

    /// Statistics of the committed graph
    pub fn stats(&self) -> GraphStats {
        self.state.read().graph.stats()
    }

    /// Number of successful commits so far
    pub fn version(&self) -> u64 {
        self.state.read().version
    }
}

impl GraphStore for MemoryGraphStore {
    fn begin(&self) -> StoreResult<Box<dyn StoreTransaction>> {
        let (working, base_version) = {
            let state = self.state.read();
            (state.graph.clone(), state.version)
        };

        let transaction = MemoryTransaction {
            id: TransactionId::new(),
            state: Arc::clone(&self.state),
            base_version,
            working,
            touched_nodes: HashSet::new(),
            touched_edges: HashSet::new(),
            structural_nodes: HashSet::new(),
            deleted_nodes: HashSet::new(),
            pending_changelog: Vec::new(),
            modifications: ModificationSet::new(),
            active: true,
            committed: false,
        };

        log::debug!(
            "Began {} at store version {}",
            transaction.id,
            transaction.base_version
        );

        Ok(Box::new(transaction))
    }

    fn node_ids(&self, node_type: Option<&str>) -> StoreResult<Vec<String>> {
        Ok(self.state.read().graph.node_ids(node_type))
    }

    fn edge_ids(&self, edge_type: Option<&str>) -> StoreResult<Vec<String>> {
        Ok(self.state.read().graph.edge_ids(edge_type))
    }

    fn changelog(&self) -> StoreResult<Vec<ChangelogEntry>> {
        Ok(self.state.read().changelog.clone())
    }
}

/// Transaction over a private working copy of the committed graph
struct MemoryTransaction {
    id: TransactionId,
    state: Arc<RwLock<CommittedState>>,
    base_version: u64,
    working: GraphCache,
    /// Nodes whose record was created, changed or removed
    touched_nodes: HashSet<String>,
    /// Edges that were created, changed or removed
    touched_edges: HashSet<String>,
    /// Endpoints of created or removed edges
    structural_nodes: HashSet<String>,
    /// Nodes that existed at begin and were removed by this transaction
    deleted_nodes: HashSet<String>,
    pending_changelog: Vec<ChangelogEntry>,
    modifications: ModificationSet,
    active: bool,
    committed: bool,
}

impl MemoryTransaction {
    fn ensure_active(&self) -> StoreResult<()> {
        if self.active {
            Ok(())
        } else {
            Err(StorageError::TransactionClosed(self.id.to_string()))
        }
    }

    fn touch_edge_structure(&mut self, edge: &Edge) {
        self.touched_edges.insert(edge.id.clone());
        self.structural_nodes.insert(edge.from_node.clone());
        self.structural_nodes.insert(edge.to_node.clone());
    }

    /// Find the first touched entity committed by someone else since begin
    fn find_conflict(&self, state: &CommittedState) -> Option<String> {
        let changed_since = |versions: &HashMap<String, u64>, id: &String| {
            versions.get(id).is_some_and(|&v| v > self.base_version)
        };

        self.touched_nodes
            .iter()
            .chain(self.structural_nodes.iter())
            .find(|id| changed_since(&state.node_versions, id))
            .map(|id| format!("node {}", id))
            .or_else(|| {
                self.touched_edges
                    .iter()
                    .find(|id| changed_since(&state.edge_versions, id))
                    .map(|id| format!("edge {}", id))
            })
    }

    /// Apply the touched entities of the working copy onto `graph`
    fn apply_to(&self, graph: &mut GraphCache) -> Result<(), GraphError> {
        // Removed edges first, so node removal never detaches anything new
        for edge_id in &self.touched_edges {
            if !self.working.contains_edge(edge_id) && graph.contains_edge(edge_id) {
                graph.remove_edge(edge_id)?;
            }
        }

        for node_id in &self.touched_nodes {
            match self.working.get_node(node_id) {
                Some(node) if graph.contains_node(node_id) => graph.update_node(node.clone())?,
                Some(node) => graph.add_node(node.clone())?,
                None => {
                    if graph.contains_node(node_id) {
                        graph.remove_node(node_id)?;
                    }
                }
            }
        }

        for edge_id in &self.touched_edges {
            if let Some(edge) = self.working.get_edge(edge_id) {
                if graph.contains_edge(edge_id) {
                    graph.update_edge(edge.clone())?;
                } else {
                    graph.add_edge(edge.clone())?;
                }
            }
        }

        Ok(())
    }
}

impl StoreTransaction for MemoryTransaction {
    fn id(&self) -> TransactionId {
        self.id
    }

    fn is_active(&self) -> bool {
        self.active
    }

    fn get_node(&self, id: &str) -> StoreResult<Node> {
        if self.deleted_nodes.contains(id) {
            return Err(GraphError::NodeAlreadyDeleted(id.to_string()).into());
        }
        self.working
            .get_node(id)
            .cloned()
            .ok_or_else(|| GraphError::NodeNotFound(id.to_string()).into())
    }

    fn get_edge(&self, id: &str) -> StoreResult<Edge> {
        self.working
            .get_edge(id)
            .cloned()
            .ok_or_else(|| GraphError::EdgeNotFound(id.to_string()).into())
    }

    fn outgoing_edges(&self, node_id: &str) -> StoreResult<Vec<Edge>> {
        self.get_node(node_id)?;
        Ok(self
            .working
            .get_outgoing_edges(node_id)
            .into_iter()
            .cloned()
            .collect())
    }

    fn incoming_edges(&self, node_id: &str) -> StoreResult<Vec<Edge>> {
        self.get_node(node_id)?;
        Ok(self
            .working
            .get_incoming_edges(node_id)
            .into_iter()
            .cloned()
            .collect())
    }

    fn node_ids(&self, node_type: Option<&str>) -> StoreResult<Vec<String>> {
        Ok(self.working.node_ids(node_type))
    }

    fn edge_ids(&self, edge_type: Option<&str>) -> StoreResult<Vec<String>> {
        Ok(self.working.edge_ids(edge_type))
    }

    fn create_node(&mut self, node: Node) -> StoreResult<()> {
        self.ensure_active()?;
        let id = node.id.clone();
        self.working.add_node(node)?;
        self.deleted_nodes.remove(&id);
        self.touched_nodes.insert(id);
        Ok(())
    }

    fn create_edge(&mut self, edge: Edge) -> StoreResult<()> {
        self.ensure_active()?;
        self.touch_edge_structure(&edge);
        self.working.add_edge(edge)?;
        Ok(())
    }

    fn update_node(&mut self, node: Node) -> StoreResult<()> {
        self.ensure_active()?;
        let id = node.id.clone();
        self.working.update_node(node)?;
        self.touched_nodes.insert(id);
        Ok(())
    }

    fn update_edge(&mut self, edge: Edge) -> StoreResult<()> {
        self.ensure_active()?;
        let id = edge.id.clone();
        self.working.update_edge(edge)?;
        self.touched_edges.insert(id);
        Ok(())
    }

    fn delete_node(&mut self, id: &str, force: bool) -> StoreResult<()> {
        self.ensure_active()?;
        if self.deleted_nodes.contains(id) {
            return Err(GraphError::NodeAlreadyDeleted(id.to_string()).into());
        }

        if !force {
            let count = self.working.get_connected_edges(id).len();
            if count > 0 {
                return Err(GraphError::NodeHasRelationships {
                    node_id: id.to_string(),
                    count,
                }
                .into());
            }
        }

        let (_, detached) = self.working.remove_node(id)?;
        for edge in &detached {
            self.touch_edge_structure(edge);
        }
        self.touched_nodes.insert(id.to_string());
        self.deleted_nodes.insert(id.to_string());
        Ok(())
    }

    fn delete_edge(&mut self, id: &str) -> StoreResult<()> {
        self.ensure_active()?;
        let edge = self.working.remove_edge(id)?;
        self.touch_edge_structure(&edge);
        Ok(())
    }

    fn is_node_deleted(&self, id: &str) -> bool {
        self.deleted_nodes.contains(id)
    }

    fn append_changelog(&mut self, entries: Vec<ChangelogEntry>) {
        self.pending_changelog.extend(entries);
    }

    fn modifications(&self) -> &ModificationSet {
        &self.modifications
    }

    fn modifications_mut(&mut self) -> &mut ModificationSet {
        &mut self.modifications
    }

    fn commit(&mut self) -> StoreResult<()> {
        self.ensure_active()?;

        let mut state = self.state.write();

        if let Some(entity) = self.find_conflict(&state) {
            log::debug!("Commit of {} conflicts on {}", self.id, entity);
            return Err(StorageError::Conflict {
                transaction: self.id.to_string(),
                entity,
            });
        }

        let mut graph = state.graph.clone();
        self.apply_to(&mut graph)
            .map_err(|e| StorageError::InvalidOperation(format!("Failed to apply {}: {}", self.id, e)))?;

        state.version += 1;
        let version = state.version;
        state.graph = graph;
        for id in self.touched_nodes.iter().chain(self.structural_nodes.iter()) {
            state.node_versions.insert(id.clone(), version);
        }
        for id in &self.touched_edges {
            state.edge_versions.insert(id.clone(), version);
        }
        state.changelog.append(&mut self.pending_changelog);

        self.active = false;
        self.committed = true;

        log::debug!(
            "Committed {} as store version {} ({} nodes, {} edges touched)",
            self.id,
            version,
            self.touched_nodes.len(),
            self.touched_edges.len()
        );

        Ok(())
    }

    fn finish(self: Box<Self>) -> Option<ModificationSet> {
        if self.committed {
            Some(self.modifications)
        } else {
            if self.active {
                log::debug!("Rolled back {}", self.id);
            }
            None
        }
    }
}
