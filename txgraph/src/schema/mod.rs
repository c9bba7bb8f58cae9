// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
// Schema module - type hierarchy, property keys and validation

pub mod registry;
pub mod types;
pub mod validator;

pub use registry::{PropertyKey, SchemaRegistry};
pub use types::{
    ConstraintDirection, DataType, PropertyDefinition, RelationshipConstraint, TypeDefinition,
};
pub use validator::{ErrorBuffer, ErrorToken, NoopValidator, SchemaValidator, Validator};

// Schema module error type
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SchemaError {
    #[error("Unknown property '{property}' for type '{entity_type}'")]
    UnknownProperty {
        entity_type: String,
        property: String,
    },

    #[error("Property '{0}' is read-only")]
    ReadOnlyProperty(String),

    #[error("Invalid property type for '{property}': expected {expected}, got {got}")]
    TypeMismatch {
        property: String,
        expected: String,
        got: String,
    },
}

pub type SchemaResult<T> = Result<T, SchemaError>;
