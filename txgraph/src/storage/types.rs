// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Graph data structures and error types
//!
//! Defines Node and Edge structures for the property graph, the cascade
//! policy carried by every relationship, and the error types for graph and
//! storage operations.

use crate::storage::value::Value;
use std::collections::HashMap;
use std::fmt;
use std::ops::BitOr;
use thiserror::Error;
use uuid::Uuid;

/// Error types for graph operations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GraphError {
    #[error("Node not found: {0}")]
    NodeNotFound(String),

    #[error("Edge not found: {0}")]
    EdgeNotFound(String),

    #[error("Node already exists: {0}")]
    NodeAlreadyExists(String),

    #[error("Edge already exists: {0}")]
    EdgeAlreadyExists(String),

    #[error("Node already deleted: {0}")]
    NodeAlreadyDeleted(String),

    #[error("Invalid edge: from node {from} to node {to} - one or both nodes don't exist")]
    InvalidEdge { from: String, to: String },

    #[error("Cannot delete node {node_id}: {count} relationship(s) still attached")]
    NodeHasRelationships { node_id: String, count: usize },

    #[error("Immutable field '{field}' of edge {edge_id} cannot be changed")]
    ImmutableField { edge_id: String, field: String },
}

/// Error types for storage operations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StorageError {
    #[error("Graph error: {0}")]
    Graph(#[from] GraphError),

    #[error("Concurrent modification of {entity} detected in transaction {transaction}")]
    Conflict { transaction: String, entity: String },

    #[error("Transaction {0} is no longer active")]
    TransactionClosed(String),

    #[error("Lock error: {0}")]
    LockError(String),

    #[error("Invalid operation: {0}")]
    InvalidOperation(String),
}

/// Bitmask controlling how a deletion propagates across a relationship
///
/// The bits are independent: a relationship may cascade in both directions
/// and additionally request constraint re-validation of its neighbours.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, serde::Serialize, serde::Deserialize)]
pub struct CascadePolicy(u8);

impl CascadePolicy {
    /// No cascading
    pub const NONE: CascadePolicy = CascadePolicy(0);
    /// Deleting the source node deletes the target node
    pub const SOURCE_TO_TARGET: CascadePolicy = CascadePolicy(1);
    /// Deleting the target node deletes the source node
    pub const TARGET_TO_SOURCE: CascadePolicy = CascadePolicy(2);
    /// The neighbour is re-validated once the relationship is gone and
    /// deleted if it no longer satisfies its schema constraints
    pub const CONSTRAINT_BASED: CascadePolicy = CascadePolicy(4);
    /// Cascade in both directions
    pub const ALWAYS: CascadePolicy = CascadePolicy(1 | 2);

    /// Build a policy from raw bits, ignoring unknown bits
    pub fn from_bits(bits: u8) -> Self {
        CascadePolicy(bits & 0b111)
    }

    /// Raw bit representation
    pub fn bits(&self) -> u8 {
        self.0
    }

    /// Check whether every bit of `other` is set in this policy
    pub fn contains(&self, other: CascadePolicy) -> bool {
        (self.0 & other.0) == other.0
    }

    pub fn is_none(&self) -> bool {
        self.0 == 0
    }
}

impl BitOr for CascadePolicy {
    type Output = CascadePolicy;

    fn bitor(self, rhs: CascadePolicy) -> CascadePolicy {
        CascadePolicy(self.0 | rhs.0)
    }
}

impl fmt::Display for CascadePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_none() {
            return write!(f, "NONE");
        }
        let mut parts = Vec::new();
        if self.contains(CascadePolicy::SOURCE_TO_TARGET) {
            parts.push("SOURCE_TO_TARGET");
        }
        if self.contains(CascadePolicy::TARGET_TO_SOURCE) {
            parts.push("TARGET_TO_SOURCE");
        }
        if self.contains(CascadePolicy::CONSTRAINT_BASED) {
            parts.push("CONSTRAINT_BASED");
        }
        write!(f, "{}", parts.join("|"))
    }
}

/// Graph node with id, type, labels, and properties
///
/// `uuid` is the tracked identity of the entity. Nodes without one were not
/// created through the tracked entity layer and are never cascade-deleted.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Node {
    pub id: String,
    pub uuid: Option<Uuid>,
    pub node_type: String,
    pub labels: Vec<String>,
    pub properties: HashMap<String, Value>,
}

impl Node {
    /// Create a new tracked node with a fresh UUID
    pub fn new(id: impl Into<String>, node_type: impl Into<String>) -> Self {
        let node_type = node_type.into();
        Self {
            id: id.into(),
            uuid: Some(Uuid::new_v4()),
            labels: vec![node_type.clone()],
            node_type,
            properties: HashMap::new(),
        }
    }

    /// Create a node that carries no UUID
    pub fn untracked(id: impl Into<String>, node_type: impl Into<String>) -> Self {
        Self {
            uuid: None,
            ..Self::new(id, node_type)
        }
    }

    /// Builder-style property assignment
    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    /// Builder-style label replacement
    pub fn with_labels(mut self, labels: Vec<String>) -> Self {
        self.labels = labels;
        self
    }

    /// Check if node has a specific label
    pub fn has_label(&self, label: &str) -> bool {
        self.labels.iter().any(|l| l == label)
    }

    /// Set a property value
    pub fn set_property(&mut self, key: String, value: Value) {
        self.properties.insert(key, value);
    }

    /// Get a property value
    pub fn get_property(&self, key: &str) -> Option<&Value> {
        self.properties.get(key)
    }

    /// Check if node has a specific, non-null property
    pub fn has_property(&self, key: &str) -> bool {
        self.properties.get(key).is_some_and(|v| !v.is_null())
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.uuid {
            Some(uuid) => write!(f, "{}({}, {})", self.node_type, self.id, uuid),
            None => write!(f, "{}({})", self.node_type, self.id),
        }
    }
}

/// Graph edge with id, from/to nodes, relationship type, and properties
///
/// The endpoints, the type and the cascade policy are fixed at creation.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Edge {
    pub id: String,
    pub uuid: Option<Uuid>,
    pub from_node: String,
    pub to_node: String,
    pub label: String,
    cascade: CascadePolicy,
    pub properties: HashMap<String, Value>,
}

impl Edge {
    /// Create a new tracked edge without cascading behaviour
    pub fn new(
        id: impl Into<String>,
        from_node: impl Into<String>,
        to_node: impl Into<String>,
        label: impl Into<String>,
    ) -> Self {
        Self::with_cascade(id, from_node, to_node, label, CascadePolicy::NONE)
    }

    /// Create a new tracked edge with the given cascade policy
    pub fn with_cascade(
        id: impl Into<String>,
        from_node: impl Into<String>,
        to_node: impl Into<String>,
        label: impl Into<String>,
        cascade: CascadePolicy,
    ) -> Self {
        Self {
            id: id.into(),
            uuid: Some(Uuid::new_v4()),
            from_node: from_node.into(),
            to_node: to_node.into(),
            label: label.into(),
            cascade,
            properties: HashMap::new(),
        }
    }

    /// Drop the tracked identity of this edge
    pub fn untracked(mut self) -> Self {
        self.uuid = None;
        self
    }

    /// Builder-style property assignment
    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    /// Cascade policy assigned at creation
    pub fn cascade_policy(&self) -> CascadePolicy {
        self.cascade
    }

    /// Set a property value
    pub fn set_property(&mut self, key: String, value: Value) {
        self.properties.insert(key, value);
    }

    /// Get a property value
    pub fn get_property(&self, key: &str) -> Option<&Value> {
        self.properties.get(key)
    }

    /// Check if this edge touches the given node (in either direction)
    pub fn touches(&self, node_id: &str) -> bool {
        self.from_node == node_id || self.to_node == node_id
    }

    /// Check if the immutable parts of two edge records agree
    pub(crate) fn same_shape(&self, other: &Edge) -> Option<&'static str> {
        if self.from_node != other.from_node || self.to_node != other.to_node {
            Some("endpoints")
        } else if self.label != other.label {
            Some("label")
        } else if self.cascade != other.cascade {
            Some("cascade")
        } else {
            None
        }
    }
}

impl fmt::Display for Edge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "({})-[{}:{}]->({})",
            self.from_node, self.id, self.label, self.to_node
        )
    }
}
