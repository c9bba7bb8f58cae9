// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! In-memory graph cache implementation
//!
//! Provides fast graph storage using HashMap for nodes/edges and
//! adjacency lists for efficient graph traversal. Includes label and
//! type indices for quick lookup by node/edge types.

use crate::storage::types::{Edge, GraphError, Node};
use std::collections::{BTreeSet, HashMap};

/// In-memory graph cache with indices for fast lookups
#[derive(Debug, Clone)]
pub struct GraphCache {
    /// All nodes indexed by ID
    nodes: HashMap<String, Node>,

    /// All edges indexed by ID
    edges: HashMap<String, Edge>,

    /// Index: label -> IDs of nodes with that label
    node_labels: HashMap<String, BTreeSet<String>>,

    /// Index: node type -> IDs of nodes of that type
    node_types: HashMap<String, BTreeSet<String>>,

    /// Index: relationship type -> IDs of edges with that type
    edge_labels: HashMap<String, BTreeSet<String>>,

    /// Adjacency list: node_id -> list of outgoing edge IDs
    adjacency_out: HashMap<String, Vec<String>>,

    /// Adjacency list: node_id -> list of incoming edge IDs
    adjacency_in: HashMap<String, Vec<String>>,
}

impl GraphCache {
    /// Create a new empty graph
    pub fn new() -> Self {
        Self {
            nodes: HashMap::new(),
            edges: HashMap::new(),
            node_labels: HashMap::new(),
            node_types: HashMap::new(),
            edge_labels: HashMap::new(),
            adjacency_out: HashMap::new(),
            adjacency_in: HashMap::new(),
        }
    }

    /// Add a node to the graph
    pub fn add_node(&mut self, node: Node) -> Result<(), GraphError> {
        if self.nodes.contains_key(&node.id) {
            return Err(GraphError::NodeAlreadyExists(node.id));
        }

        self.index_node(&node);

        // Initialize adjacency lists for this node
        self.adjacency_out.insert(node.id.clone(), Vec::new());
        self.adjacency_in.insert(node.id.clone(), Vec::new());

        self.nodes.insert(node.id.clone(), node);

        Ok(())
    }

    /// Replace the record of an existing node, keeping its relationships
    pub fn update_node(&mut self, node: Node) -> Result<(), GraphError> {
        let previous = self
            .nodes
            .remove(&node.id)
            .ok_or_else(|| GraphError::NodeNotFound(node.id.clone()))?;

        self.unindex_node(&previous);
        self.index_node(&node);
        self.nodes.insert(node.id.clone(), node);

        Ok(())
    }

    /// Add an edge to the graph
    pub fn add_edge(&mut self, edge: Edge) -> Result<(), GraphError> {
        if self.edges.contains_key(&edge.id) {
            return Err(GraphError::EdgeAlreadyExists(edge.id));
        }

        // Verify that both nodes exist
        if !self.nodes.contains_key(&edge.from_node) || !self.nodes.contains_key(&edge.to_node) {
            return Err(GraphError::InvalidEdge {
                from: edge.from_node.clone(),
                to: edge.to_node.clone(),
            });
        }

        self.edge_labels
            .entry(edge.label.clone())
            .or_default()
            .insert(edge.id.clone());

        self.adjacency_out
            .entry(edge.from_node.clone())
            .or_default()
            .push(edge.id.clone());

        self.adjacency_in
            .entry(edge.to_node.clone())
            .or_default()
            .push(edge.id.clone());

        self.edges.insert(edge.id.clone(), edge);

        Ok(())
    }

    /// Replace the properties of an existing edge
    ///
    /// Endpoints, relationship type and cascade policy cannot change.
    pub fn update_edge(&mut self, edge: Edge) -> Result<(), GraphError> {
        let existing = self
            .edges
            .get_mut(&edge.id)
            .ok_or_else(|| GraphError::EdgeNotFound(edge.id.clone()))?;

        if let Some(field) = existing.same_shape(&edge) {
            return Err(GraphError::ImmutableField {
                edge_id: edge.id,
                field: field.to_string(),
            });
        }

        *existing = edge;
        Ok(())
    }

    /// Get a node by ID
    pub fn get_node(&self, id: &str) -> Option<&Node> {
        self.nodes.get(id)
    }

    /// Get an edge by ID
    pub fn get_edge(&self, id: &str) -> Option<&Edge> {
        self.edges.get(id)
    }

    /// Get all nodes with a specific label
    pub fn get_nodes_by_label(&self, label: &str) -> Vec<&Node> {
        self.node_labels
            .get(label)
            .map(|ids| ids.iter().filter_map(|id| self.nodes.get(id)).collect())
            .unwrap_or_default()
    }

    /// IDs of all nodes, optionally restricted to one node type, in id order
    pub fn node_ids(&self, node_type: Option<&str>) -> Vec<String> {
        match node_type {
            Some(node_type) => Self::indexed_ids(&self.node_types, node_type),
            None => Self::sorted_keys(&self.nodes),
        }
    }

    /// IDs of all edges, optionally restricted to one relationship type, in id order
    pub fn edge_ids(&self, label: Option<&str>) -> Vec<String> {
        match label {
            Some(label) => Self::indexed_ids(&self.edge_labels, label),
            None => Self::sorted_keys(&self.edges),
        }
    }

    /// Get node count
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Get edge count
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Get all outgoing edges from a node
    pub fn get_outgoing_edges(&self, node_id: &str) -> Vec<&Edge> {
        self.adjacency_out
            .get(node_id)
            .map(|edge_ids| {
                edge_ids
                    .iter()
                    .filter_map(|id| self.edges.get(id))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Get all incoming edges to a node
    pub fn get_incoming_edges(&self, node_id: &str) -> Vec<&Edge> {
        self.adjacency_in
            .get(node_id)
            .map(|edge_ids| {
                edge_ids
                    .iter()
                    .filter_map(|id| self.edges.get(id))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Get all edges connected to a node (both incoming and outgoing)
    ///
    /// A self-loop is reported once.
    pub fn get_connected_edges(&self, node_id: &str) -> Vec<&Edge> {
        let mut edges = self.get_outgoing_edges(node_id);
        for edge in self.get_incoming_edges(node_id) {
            if edge.from_node != node_id {
                edges.push(edge);
            }
        }
        edges
    }

    /// Remove a node and all its connected edges
    ///
    /// Returns the removed node together with the detached edges.
    pub fn remove_node(&mut self, node_id: &str) -> Result<(Node, Vec<Edge>), GraphError> {
        let node = self
            .nodes
            .remove(node_id)
            .ok_or_else(|| GraphError::NodeNotFound(node_id.to_string()))?;

        self.unindex_node(&node);

        // Collect all connected edges to remove
        let mut edges_to_remove = Vec::new();
        if let Some(outgoing) = self.adjacency_out.remove(node_id) {
            edges_to_remove.extend(outgoing);
        }
        if let Some(incoming) = self.adjacency_in.remove(node_id) {
            edges_to_remove.extend(incoming);
        }

        let mut detached = Vec::with_capacity(edges_to_remove.len());
        for edge_id in edges_to_remove {
            if let Ok(edge) = self.remove_edge(&edge_id) {
                detached.push(edge);
            }
        }

        Ok((node, detached))
    }

    /// Remove an edge
    pub fn remove_edge(&mut self, edge_id: &str) -> Result<Edge, GraphError> {
        let edge = self
            .edges
            .remove(edge_id)
            .ok_or_else(|| GraphError::EdgeNotFound(edge_id.to_string()))?;

        if let Some(edges) = self.edge_labels.get_mut(&edge.label) {
            edges.remove(edge_id);
            if edges.is_empty() {
                self.edge_labels.remove(&edge.label);
            }
        }

        if let Some(outgoing) = self.adjacency_out.get_mut(&edge.from_node) {
            outgoing.retain(|id| id != edge_id);
        }
        if let Some(incoming) = self.adjacency_in.get_mut(&edge.to_node) {
            incoming.retain(|id| id != edge_id);
        }

        Ok(edge)
    }

    /// Check if the graph contains a node
    pub fn contains_node(&self, node_id: &str) -> bool {
        self.nodes.contains_key(node_id)
    }

    /// Check if the graph contains an edge
    pub fn contains_edge(&self, edge_id: &str) -> bool {
        self.edges.contains_key(edge_id)
    }

    /// Get graph statistics
    pub fn stats(&self) -> GraphStats {
        GraphStats {
            node_count: self.nodes.len(),
            edge_count: self.edges.len(),
            node_label_count: self.node_labels.len(),
            edge_label_count: self.edge_labels.len(),
        }
    }

    fn indexed_ids(index: &HashMap<String, BTreeSet<String>>, key: &str) -> Vec<String> {
        index
            .get(key)
            .map(|ids| ids.iter().cloned().collect())
            .unwrap_or_default()
    }

    fn sorted_keys<V>(map: &HashMap<String, V>) -> Vec<String> {
        let mut ids: Vec<String> = map.keys().cloned().collect();
        ids.sort();
        ids
    }

    fn index_node(&mut self, node: &Node) {
        for label in &node.labels {
            self.node_labels
                .entry(label.clone())
                .or_default()
                .insert(node.id.clone());
        }
        self.node_types
            .entry(node.node_type.clone())
            .or_default()
            .insert(node.id.clone());
    }

    fn unindex_node(&mut self, node: &Node) {
        for label in &node.labels {
            if let Some(nodes) = self.node_labels.get_mut(label) {
                nodes.remove(&node.id);
                if nodes.is_empty() {
                    self.node_labels.remove(label);
                }
            }
        }
        if let Some(nodes) = self.node_types.get_mut(&node.node_type) {
            nodes.remove(&node.id);
            if nodes.is_empty() {
                self.node_types.remove(&node.node_type);
            }
        }
    }
}

impl Default for GraphCache {
    fn default() -> Self {
        Self::new()
    }
}

/// Graph statistics
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GraphStats {
    pub node_count: usize,
    pub edge_count: usize,
    pub node_label_count: usize,
    pub edge_label_count: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::types::CascadePolicy;

    fn sample_graph() -> GraphCache {
        let mut graph = GraphCache::new();
        graph.add_node(Node::new("a", "Person")).unwrap();
        graph.add_node(Node::new("b", "Person")).unwrap();
        graph.add_node(Node::new("c", "Company")).unwrap();
        graph.add_edge(Edge::new("e1", "a", "b", "KNOWS")).unwrap();
        graph
            .add_edge(Edge::with_cascade(
                "e2",
                "a",
                "c",
                "WORKS_AT",
                CascadePolicy::SOURCE_TO_TARGET,
            ))
            .unwrap();
        graph
    }

    #[test]
    fn test_adjacency_and_indices() {
        let graph = sample_graph();

        assert_eq!(graph.get_outgoing_edges("a").len(), 2);
        assert_eq!(graph.get_incoming_edges("b").len(), 1);
        assert_eq!(graph.node_ids(Some("Person")), vec!["a", "b"]);
        assert_eq!(graph.edge_ids(Some("KNOWS")), vec!["e1"]);
        assert_eq!(graph.edge_ids(None), vec!["e1", "e2"]);
        assert_eq!(graph.get_nodes_by_label("Company").len(), 1);
    }

    #[test]
    fn test_remove_node_detaches_edges() {
        let mut graph = sample_graph();

        let (node, detached) = graph.remove_node("a").unwrap();
        assert_eq!(node.id, "a");
        assert_eq!(detached.len(), 2);
        assert_eq!(graph.edge_count(), 0);
        assert!(graph.get_incoming_edges("b").is_empty());
        assert!(matches!(
            graph.remove_node("a"),
            Err(GraphError::NodeNotFound(_))
        ));
    }

    #[test]
    fn test_edge_requires_existing_nodes() {
        let mut graph = sample_graph();
        let result = graph.add_edge(Edge::new("e3", "a", "missing", "KNOWS"));
        assert!(matches!(result, Err(GraphError::InvalidEdge { .. })));
    }

    #[test]
    fn test_update_node_reindexes_labels() {
        let mut graph = sample_graph();
        let mut node = graph.get_node("b").unwrap().clone();
        node.labels = vec!["Employee".to_string()];
        graph.update_node(node).unwrap();

        assert!(graph.get_nodes_by_label("Employee").len() == 1);
        assert_eq!(graph.get_nodes_by_label("Person").len(), 1);
        // Relationships survive a record update
        assert_eq!(graph.get_incoming_edges("b").len(), 1);
    }

    #[test]
    fn test_update_edge_rejects_shape_change() {
        let mut graph = sample_graph();
        let mut edge = graph.get_edge("e1").unwrap().clone();
        edge.label = "LIKES".to_string();
        assert!(matches!(
            graph.update_edge(edge),
            Err(GraphError::ImmutableField { .. })
        ));

        let edge = graph
            .get_edge("e1")
            .unwrap()
            .clone()
            .with_property("weight", 3i64);
        graph.update_edge(edge).unwrap();
        assert!(graph.get_edge("e1").unwrap().get_property("weight").is_some());
    }

    #[test]
    fn test_self_loop_reported_once() {
        let mut graph = sample_graph();
        graph.add_edge(Edge::new("loop", "c", "c", "SELF")).unwrap();
        assert_eq!(graph.get_connected_edges("c").len(), 2);
        let (_, detached) = graph.remove_node("c").unwrap();
        assert_eq!(detached.len(), 2);
    }
}
