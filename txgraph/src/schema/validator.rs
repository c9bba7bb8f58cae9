// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
// Schema validator implementation

use std::fmt;
use std::sync::Arc;

use super::registry::SchemaRegistry;
use super::types::ConstraintDirection;
use crate::storage::Node;
use crate::txn::TransactionScope;

/// A single validation failure
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorToken {
    pub entity_type: String,
    pub entity_id: String,
    pub property: String,
    pub token: String,
}

impl fmt::Display for ErrorToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}[{}].{}: {}",
            self.entity_type, self.entity_id, self.property, self.token
        )
    }
}

/// Collects validation failures across entities
#[derive(Debug, Clone, Default)]
pub struct ErrorBuffer {
    tokens: Vec<ErrorToken>,
}

impl ErrorBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, node: &Node, property: impl Into<String>, token: impl Into<String>) {
        self.tokens.push(ErrorToken {
            entity_type: node.node_type.clone(),
            entity_id: node.id.clone(),
            property: property.into(),
            token: token.into(),
        });
    }

    pub fn has_error(&self) -> bool {
        !self.tokens.is_empty()
    }

    pub fn tokens(&self) -> &[ErrorToken] {
        &self.tokens
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

impl fmt::Display for ErrorBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, token) in self.tokens.iter().enumerate() {
            if i > 0 {
                write!(f, "; ")?;
            }
            write!(f, "{}", token)?;
        }
        Ok(())
    }
}

/// Entity validation seam
///
/// Validators read the node's surroundings through the scope, so they see
/// the uncommitted state of the running transaction.
pub trait Validator: Send + Sync {
    /// Validate a node, appending every failure to `errors`
    fn is_valid(&self, scope: &TransactionScope, node: &Node, errors: &mut ErrorBuffer) -> bool;
}

/// Accepts every node
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopValidator;

impl Validator for NoopValidator {
    fn is_valid(&self, _scope: &TransactionScope, _node: &Node, _errors: &mut ErrorBuffer) -> bool {
        true
    }
}

/// Validates nodes against the declarations of a schema registry
///
/// Checks required properties and relationship constraints, including
/// those inherited from parent types.
pub struct SchemaValidator {
    schema: Arc<SchemaRegistry>,
}

impl SchemaValidator {
    pub fn new(schema: Arc<SchemaRegistry>) -> Self {
        Self { schema }
    }
}

impl Validator for SchemaValidator {
    fn is_valid(&self, scope: &TransactionScope, node: &Node, errors: &mut ErrorBuffer) -> bool {
        let before = errors.len();

        for property in self.schema.required_properties(&node.node_type) {
            if !node.has_property(&property.db_name) {
                errors.add(node, property.name.as_str(), "must_not_be_empty");
            }
        }

        for constraint in self.schema.relationship_constraints(&node.node_type) {
            let edges = match constraint.direction {
                ConstraintDirection::Outgoing => scope.outgoing_relationships(&node.id),
                ConstraintDirection::Incoming => scope.incoming_relationships(&node.id),
            };

            match edges {
                Ok(edges) => {
                    let count = edges
                        .iter()
                        .filter(|edge| edge.label == constraint.rel_type)
                        .count();
                    if count < constraint.min_count {
                        errors.add(node, constraint.rel_type.as_str(), "must_not_be_empty");
                    }
                }
                Err(e) => {
                    log::debug!("Unable to read relationships of {}: {}", node.id, e);
                    errors.add(node, constraint.rel_type.as_str(), "unreadable");
                }
            }
        }

        errors.len() == before
    }
}
