// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
// Schema type definitions

use serde::{Deserialize, Serialize};

use crate::storage::Value;

/// Definition of an entity type (node or relationship type)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TypeDefinition {
    pub name: String,
    /// Parent type for inheritance
    pub extends: Option<String>,
    pub properties: Vec<PropertyDefinition>,
    pub constraints: Vec<RelationshipConstraint>,
}

impl TypeDefinition {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            extends: None,
            properties: Vec::new(),
            constraints: Vec::new(),
        }
    }

    pub fn extends(mut self, parent: impl Into<String>) -> Self {
        self.extends = Some(parent.into());
        self
    }

    pub fn with_property(mut self, property: PropertyDefinition) -> Self {
        self.properties.push(property);
        self
    }

    pub fn with_constraint(mut self, constraint: RelationshipConstraint) -> Self {
        self.constraints.push(constraint);
        self
    }
}

/// Definition of a property within a type
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PropertyDefinition {
    /// Name used by callers
    pub name: String,
    /// Name under which the value is stored
    pub db_name: String,
    pub data_type: DataType,
    pub required: bool,
    pub read_only: bool,
}

impl PropertyDefinition {
    pub fn new(name: impl Into<String>, data_type: DataType) -> Self {
        let name = name.into();
        Self {
            db_name: name.clone(),
            name,
            data_type,
            required: false,
            read_only: false,
        }
    }

    pub fn stored_as(mut self, db_name: impl Into<String>) -> Self {
        self.db_name = db_name.into();
        self
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn read_only(mut self) -> Self {
        self.read_only = true;
        self
    }
}

/// Supported property data types
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum DataType {
    String,
    Number,
    Boolean,
    DateTime,
    Array,
    /// Accepts any value; used for generic keys
    Any,
}

impl DataType {
    /// Check if a value can be stored under this type
    ///
    /// Null is accepted by every type; clearing a property is not a type error.
    pub fn accepts(&self, value: &Value) -> bool {
        match (self, value) {
            (_, Value::Null) | (DataType::Any, _) => true,
            (DataType::String, Value::String(_)) => true,
            (DataType::Number, Value::Number(_)) => true,
            (DataType::Boolean, Value::Boolean(_)) => true,
            (DataType::DateTime, Value::DateTime(_)) => true,
            (DataType::Array, Value::Array(_)) => true,
            _ => false,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            DataType::String => "String",
            DataType::Number => "Number",
            DataType::Boolean => "Boolean",
            DataType::DateTime => "DateTime",
            DataType::Array => "Array",
            DataType::Any => "Any",
        }
    }
}

/// Direction of a constrained relationship, seen from the constrained node
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ConstraintDirection {
    Outgoing,
    Incoming,
}

/// Requires a node to keep at least `min_count` relationships of a type
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RelationshipConstraint {
    pub rel_type: String,
    pub direction: ConstraintDirection,
    pub min_count: usize,
}

impl RelationshipConstraint {
    pub fn outgoing(rel_type: impl Into<String>, min_count: usize) -> Self {
        Self {
            rel_type: rel_type.into(),
            direction: ConstraintDirection::Outgoing,
            min_count,
        }
    }

    pub fn incoming(rel_type: impl Into<String>, min_count: usize) -> Self {
        Self {
            rel_type: rel_type.into(),
            direction: ConstraintDirection::Incoming,
            min_count,
        }
    }
}
