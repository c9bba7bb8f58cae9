// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Cascading node deletion
//!
//! Deletion follows the cascade policy of every relationship attached to a
//! deleted node:
//! - `SOURCE_TO_TARGET` deletes the target when the source is deleted
//! - `TARGET_TO_SOURCE` deletes the source when the target is deleted
//! - `CONSTRAINT_BASED` revalidates the other end once the node's
//!   relationships are gone, and deletes it if it became invalid
//!
//! All relationships of a deleted node are removed regardless of policy.
//! Physical node deletion happens at the end, after the whole cascade has
//! been collected, so the outcome is atomic at the enclosing scope.

use std::collections::{HashSet, VecDeque};
use std::sync::Arc;

use crate::exec::ExecutionError;
use crate::schema::ErrorBuffer;
use crate::storage::{CascadePolicy, Edge, Node};
use crate::txn::TransactionScope;

/// Outcome of one deletion
#[derive(Debug, Clone, Default)]
pub struct CascadeReport {
    /// Deleted node IDs, in traversal order
    pub deleted: Vec<String>,
    /// Failures swallowed during traversal
    pub failures: Vec<ExecutionError>,
}

impl CascadeReport {
    pub fn deleted_count(&self) -> usize {
        self.deleted.len()
    }

    /// Check if the traversal completed without swallowed failures
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Outgoing,
    Incoming,
    Detach,
    Revalidate,
}

/// Traversal state of one visited node
struct Frame {
    node: Node,
    phase: Phase,
    /// Relationships of the current direction not handled yet
    pending: Option<VecDeque<Edge>>,
    /// Constraint-based neighbours to revalidate after detaching
    to_revalidate: VecDeque<String>,
}

impl Frame {
    fn new(node: Node) -> Self {
        Self {
            node,
            phase: Phase::Outgoing,
            pending: None,
            to_revalidate: VecDeque::new(),
        }
    }
}

enum Step {
    Continue,
    Descend(String),
    Done,
}

/// Single-use deletion engine bound to one transaction scope
pub struct CascadingDeleteEngine<'a> {
    scope: &'a mut TransactionScope,
    /// Visited nodes committed for deletion, in traversal order
    deleted_nodes: Vec<String>,
    deleted_set: HashSet<String>,
    failures: Vec<ExecutionError>,
}

impl<'a> CascadingDeleteEngine<'a> {
    pub fn new(scope: &'a mut TransactionScope) -> Self {
        Self {
            scope,
            deleted_nodes: Vec::new(),
            deleted_set: HashSet::new(),
            failures: Vec::new(),
        }
    }

    /// Delete `node`, cascading if the scope's security context requests it
    pub fn execute(mut self, node: &Node) -> Result<CascadeReport, ExecutionError> {
        let cascading = self.scope.security().cascading_delete();
        log::debug!("Deleting {} (cascading: {})", node, cascading);

        if cascading {
            self.traverse(&node.id);
            self.delete_collected()?;
        } else {
            self.delete_single(node)?;
        }

        if !self.failures.is_empty() {
            log::warn!(
                "Deletion of {} finished with {} swallowed failures",
                node,
                self.failures.len()
            );
        }

        Ok(CascadeReport {
            deleted: self.deleted_nodes,
            failures: self.failures,
        })
    }

    /// Walk the cascade rooted at `root` on an explicit frame stack
    ///
    /// A node is visited before its cascade targets. Its hook, passive
    /// relationship deletion and neighbour revalidation run once every
    /// target reached through its own relationships has been handled.
    fn traverse(&mut self, root: &str) {
        let mut stack: Vec<Frame> = self.enter(root).into_iter().collect();

        while let Some(frame) = stack.last_mut() {
            match self.step(frame) {
                Ok(Step::Continue) => {}
                Ok(Step::Descend(id)) => stack.extend(self.enter(&id)),
                Ok(Step::Done) => {
                    stack.pop();
                }
                Err(e) => {
                    if let Some(frame) = stack.pop() {
                        log::warn!("Cascading deletion of {} failed: {:?}", frame.node, e);
                        self.failures.push(e.for_object(frame.node.to_string()));
                    }
                }
            }
        }
    }

    /// Load and visit a node, returning its frame if it takes part
    fn enter(&mut self, node_id: &str) -> Option<Frame> {
        if self.deleted_set.contains(node_id) || self.scope.is_node_deleted(node_id) {
            return None;
        }

        let node = match self.scope.node(node_id) {
            Ok(node) => node,
            Err(e) if e.is_benign() => {
                log::debug!("Node {} vanished before deletion: {}", node_id, e);
                return None;
            }
            Err(e) => {
                log::warn!("Unable to load node {} for deletion: {}", node_id, e);
                self.failures.push(e.for_object(format!("node {}", node_id)));
                return None;
            }
        };

        if node.uuid.is_none() {
            log::debug!("Node {} has no UUID, not deleting it", node);
            return None;
        }

        // Visited before descending; cycles stop here
        self.deleted_set.insert(node.id.clone());
        self.deleted_nodes.push(node.id.clone());
        Some(Frame::new(node))
    }

    fn step(&mut self, frame: &mut Frame) -> Result<Step, ExecutionError> {
        match frame.phase {
            Phase::Outgoing | Phase::Incoming => self.step_relationship(frame),
            Phase::Detach => {
                self.detach(&frame.node)?;
                frame.phase = Phase::Revalidate;
                Ok(Step::Continue)
            }
            Phase::Revalidate => self.step_revalidate(frame),
        }
    }

    /// Handle the next relationship of the current direction
    fn step_relationship(&mut self, frame: &mut Frame) -> Result<Step, ExecutionError> {
        let outgoing = frame.phase == Phase::Outgoing;

        if frame.pending.is_none() {
            let edges = if outgoing {
                self.scope.outgoing_relationships(&frame.node.id)?
            } else {
                self.scope.incoming_relationships(&frame.node.id)?
            };
            frame.pending = Some(edges.into());
        }

        let Some(edge) = frame.pending.as_mut().and_then(VecDeque::pop_front) else {
            frame.pending = None;
            frame.phase = if outgoing { Phase::Incoming } else { Phase::Detach };
            return Ok(Step::Continue);
        };

        let policy = edge.cascade_policy();
        let (other, direction) = if outgoing {
            (edge.to_node, CascadePolicy::SOURCE_TO_TARGET)
        } else {
            (edge.from_node, CascadePolicy::TARGET_TO_SOURCE)
        };

        if policy.contains(CascadePolicy::CONSTRAINT_BASED) {
            frame.to_revalidate.push_back(other.clone());
        }
        if policy.contains(direction) && !self.deleted_set.contains(&other) {
            return Ok(Step::Descend(other));
        }
        Ok(Step::Continue)
    }

    /// Run the deletion hook and remove whatever is still attached
    fn detach(&mut self, node: &Node) -> Result<(), ExecutionError> {
        if let Some(hooks) = self.scope.services().hooks().get(&node.node_type) {
            if let Err(e) = hooks.on_node_deletion(self.scope, node) {
                log::warn!("Deletion hook of {} failed: {}", node, e);
            }
        }

        for edge in self.scope.relationships(&node.id)? {
            match self.scope.delete_relationship(&edge.id) {
                Ok(()) => {}
                Err(e) if e.is_benign() => {}
                Err(e) => return Err(e),
            }
        }
        Ok(())
    }

    /// Descend into the next queued neighbour that became invalid
    fn step_revalidate(&mut self, frame: &mut Frame) -> Result<Step, ExecutionError> {
        let validator = Arc::clone(self.scope.services().validator());

        while let Some(id) = frame.to_revalidate.pop_front() {
            if self.deleted_set.contains(&id) || self.scope.is_node_deleted(&id) {
                continue;
            }

            let candidate = match self.scope.node(&id) {
                Ok(candidate) => candidate,
                Err(e) if e.is_benign() => continue,
                Err(e) => return Err(e),
            };

            let mut errors = ErrorBuffer::new();
            if !validator.is_valid(&*self.scope, &candidate, &mut errors) {
                log::debug!(
                    "{} became invalid after deleting {} ({}), deleting it",
                    candidate,
                    frame.node,
                    errors
                );
                return Ok(Step::Descend(id));
            }
        }

        Ok(Step::Done)
    }

    fn delete_collected(&mut self) -> Result<(), ExecutionError> {
        for id in &self.deleted_nodes {
            let node = match self.scope.node(id) {
                Ok(node) => node,
                Err(e) if e.is_benign() => continue,
                Err(e) => return Err(e),
            };

            self.scope.mark_node_deleted(&node)?;
            match self.scope.delete_node_physical(id, false) {
                Ok(()) => {}
                Err(e) if e.is_benign() => {}
                Err(e) => return Err(e),
            }
        }

        log::debug!("Deleted {} nodes", self.deleted_nodes.len());
        Ok(())
    }

    fn delete_single(&mut self, node: &Node) -> Result<(), ExecutionError> {
        let current = match self.scope.node(&node.id) {
            Ok(current) => current,
            Err(e) if e.is_benign() => {
                log::debug!("Node {} already gone: {}", node.id, e);
                return Ok(());
            }
            Err(e) => return Err(e),
        };

        if let Some(hooks) = self.scope.services().hooks().get(&current.node_type) {
            if let Err(e) = hooks.on_node_deletion(self.scope, &current) {
                log::warn!("Deletion hook of {} failed: {}", current, e);
            }
        }

        self.scope.mark_node_deleted(&current)?;
        self.scope.delete_node_physical(&current.id, true)?;
        self.deleted_nodes.push(current.id);
        Ok(())
    }
}
