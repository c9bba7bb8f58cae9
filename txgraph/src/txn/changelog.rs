// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Changelog records
//!
//! A changelog entry is written for every created, changed or deleted entity
//! once its transaction has committed. Entries are persisted by the store as
//! part of the post-commit transaction, one JSON document per entry.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::modification::EntityRef;

/// What happened to the entity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangelogVerb {
    Create,
    Change,
    Delete,
}

/// One changelog record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangelogEntry {
    pub timestamp: DateTime<Utc>,
    pub verb: ChangelogVerb,
    pub target: EntityRef,
    pub uuid: Option<Uuid>,
    pub entity_type: String,
    /// Acting principal, `None` for anonymous or system contexts
    pub principal: Option<String>,
    /// Modified property keys (only for `Change`)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub keys: Vec<String>,
}

impl ChangelogEntry {
    /// Serialize this entry as a single JSON line
    pub fn to_json_line(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}
