// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Modification tracking for a single transaction
//!
//! Every create, update and delete performed through a transaction scope is
//! recorded here. After the low-level commit the set drives the post-commit
//! phase: outer callbacks, listener notification and the changelog.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::fmt;
use uuid::Uuid;

use super::changelog::{ChangelogEntry, ChangelogVerb};
use crate::storage::{Edge, Node};

/// Kind of graph entity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityKind {
    Node,
    Relationship,
}

/// Reference to a graph entity by store id
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EntityRef {
    pub kind: EntityKind,
    pub id: String,
}

impl EntityRef {
    pub fn new(kind: EntityKind, id: impl Into<String>) -> Self {
        Self {
            kind,
            id: id.into(),
        }
    }

    pub fn node(id: impl Into<String>) -> Self {
        Self::new(EntityKind::Node, id)
    }

    pub fn relationship(id: impl Into<String>) -> Self {
        Self::new(EntityKind::Relationship, id)
    }
}

impl fmt::Display for EntityRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            EntityKind::Node => write!(f, "node {}", self.id),
            EntityKind::Relationship => write!(f, "relationship {}", self.id),
        }
    }
}

/// Accumulated modification of one entity within one transaction
#[derive(Debug, Clone, PartialEq)]
pub struct ModificationEvent {
    pub entity: EntityRef,
    pub uuid: Option<Uuid>,
    pub entity_type: String,
    /// Principal that performed the last recorded modification
    pub principal: Option<String>,
    created: bool,
    modified: bool,
    deleted: bool,
    modified_keys: BTreeSet<String>,
}

impl ModificationEvent {
    fn new(entity: EntityRef, uuid: Option<Uuid>, entity_type: &str) -> Self {
        Self {
            entity,
            uuid,
            entity_type: entity_type.to_string(),
            principal: None,
            created: false,
            modified: false,
            deleted: false,
            modified_keys: BTreeSet::new(),
        }
    }

    pub fn is_created(&self) -> bool {
        self.created
    }

    /// Modified without being created or deleted in the same transaction
    pub fn is_modified(&self) -> bool {
        self.modified && !self.created && !self.deleted
    }

    pub fn is_deleted(&self) -> bool {
        self.deleted
    }

    pub fn is_node(&self) -> bool {
        self.entity.kind == EntityKind::Node
    }

    /// Property keys changed on this entity
    pub fn modified_keys(&self) -> impl Iterator<Item = &str> {
        self.modified_keys.iter().map(String::as_str)
    }

    /// Changelog verb for this event, `None` if the entity was created and
    /// deleted within the same transaction
    pub fn changelog_verb(&self) -> Option<ChangelogVerb> {
        match (self.created, self.deleted) {
            (true, true) => None,
            (true, false) => Some(ChangelogVerb::Create),
            (false, true) => Some(ChangelogVerb::Delete),
            (false, false) if self.modified => Some(ChangelogVerb::Change),
            (false, false) => None,
        }
    }
}

/// Creates, updates and deletes collected during one transaction
#[derive(Debug, Clone, Default)]
pub struct ModificationSet {
    events: Vec<ModificationEvent>,
    index: HashMap<EntityRef, usize>,
    changelog_disabled: bool,
}

impl ModificationSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_node_created(&mut self, node: &Node, principal: Option<&str>) {
        self.event_for_node(node, principal).created = true;
    }

    pub fn record_node_modified(&mut self, node: &Node, key: Option<&str>, principal: Option<&str>) {
        let event = self.event_for_node(node, principal);
        event.modified = true;
        if let Some(key) = key {
            event.modified_keys.insert(key.to_string());
        }
    }

    pub fn record_node_deleted(&mut self, node: &Node, principal: Option<&str>) {
        self.event_for_node(node, principal).deleted = true;
    }

    pub fn record_relationship_created(&mut self, edge: &Edge, principal: Option<&str>) {
        self.event_for_edge(edge, principal).created = true;
    }

    pub fn record_relationship_modified(
        &mut self,
        edge: &Edge,
        key: Option<&str>,
        principal: Option<&str>,
    ) {
        let event = self.event_for_edge(edge, principal);
        event.modified = true;
        if let Some(key) = key {
            event.modified_keys.insert(key.to_string());
        }
    }

    pub fn record_relationship_deleted(&mut self, edge: &Edge, principal: Option<&str>) {
        self.event_for_edge(edge, principal).deleted = true;
    }

    /// Check if a node has been marked deleted in this transaction
    pub fn is_node_deleted(&self, node_id: &str) -> bool {
        self.index
            .get(&EntityRef::node(node_id))
            .is_some_and(|&i| self.events[i].deleted)
    }

    /// IDs of created or modified nodes that still exist, in recording order
    pub fn nodes_to_validate(&self) -> Vec<String> {
        self.events
            .iter()
            .filter(|e| e.is_node() && !e.deleted && (e.created || e.modified))
            .map(|e| e.entity.id.clone())
            .collect()
    }

    /// All events, in the order the entities were first touched
    pub fn events(&self) -> &[ModificationEvent] {
        &self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Discard all recorded events
    pub fn clear(&mut self) {
        self.events.clear();
        self.index.clear();
    }

    /// Suppress changelog generation for this transaction
    pub fn disable_changelog(&mut self) {
        self.changelog_disabled = true;
    }

    pub fn changelog_disabled(&self) -> bool {
        self.changelog_disabled
    }

    /// Build the changelog entries describing this set
    pub fn changelog_entries(&self, timestamp: DateTime<Utc>) -> Vec<ChangelogEntry> {
        if self.changelog_disabled {
            return Vec::new();
        }

        self.events
            .iter()
            .filter_map(|event| {
                let verb = event.changelog_verb()?;
                let keys = if verb == ChangelogVerb::Change {
                    event.modified_keys().map(str::to_string).collect()
                } else {
                    Vec::new()
                };
                Some(ChangelogEntry {
                    timestamp,
                    verb,
                    target: event.entity.clone(),
                    uuid: event.uuid,
                    entity_type: event.entity_type.clone(),
                    principal: event.principal.clone(),
                    keys,
                })
            })
            .collect()
    }

    fn event_for_node(&mut self, node: &Node, principal: Option<&str>) -> &mut ModificationEvent {
        self.event_for(
            EntityRef::node(node.id.as_str()),
            node.uuid,
            &node.node_type,
            principal,
        )
    }

    fn event_for_edge(&mut self, edge: &Edge, principal: Option<&str>) -> &mut ModificationEvent {
        self.event_for(
            EntityRef::relationship(edge.id.as_str()),
            edge.uuid,
            &edge.label,
            principal,
        )
    }

    fn event_for(
        &mut self,
        entity: EntityRef,
        uuid: Option<Uuid>,
        entity_type: &str,
        principal: Option<&str>,
    ) -> &mut ModificationEvent {
        let position = match self.index.get(&entity) {
            Some(&position) => position,
            None => {
                self.events
                    .push(ModificationEvent::new(entity.clone(), uuid, entity_type));
                self.index.insert(entity, self.events.len() - 1);
                self.events.len() - 1
            }
        };

        let event = &mut self.events[position];
        if principal.is_some() {
            event.principal = principal.map(str::to_string);
        }
        event
    }
}
