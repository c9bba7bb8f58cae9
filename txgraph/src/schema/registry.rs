// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Schema registry
//!
//! Holds the type hierarchy and resolves property names to typed keys for a
//! given runtime entity type. Property definitions and relationship
//! constraints are inherited from parent types.

use std::collections::{HashMap, HashSet};

use super::types::{DataType, PropertyDefinition, RelationshipConstraint, TypeDefinition};
use super::{SchemaError, SchemaResult};
use crate::storage::Value;

/// Typed handle for reading and writing one property
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyKey {
    name: String,
    db_name: String,
    data_type: DataType,
    read_only: bool,
    generic: bool,
}

impl PropertyKey {
    fn from_definition(definition: &PropertyDefinition) -> Self {
        Self {
            name: definition.name.clone(),
            db_name: definition.db_name.clone(),
            data_type: definition.data_type,
            read_only: definition.read_only,
            generic: false,
        }
    }

    /// Untyped key for a property no type declares
    pub fn generic(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            db_name: name.clone(),
            name,
            data_type: DataType::Any,
            read_only: false,
            generic: true,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Name under which the value is stored
    pub fn db_name(&self) -> &str {
        &self.db_name
    }

    pub fn data_type(&self) -> DataType {
        self.data_type
    }

    pub fn is_read_only(&self) -> bool {
        self.read_only
    }

    pub fn is_generic(&self) -> bool {
        self.generic
    }

    /// Check that `value` may be written through this key
    pub fn check_value(&self, value: &Value) -> SchemaResult<()> {
        if self.read_only {
            return Err(SchemaError::ReadOnlyProperty(self.name.clone()));
        }
        if !self.data_type.accepts(value) {
            return Err(SchemaError::TypeMismatch {
                property: self.name.clone(),
                expected: self.data_type.name().to_string(),
                got: value.type_name().to_string(),
            });
        }
        Ok(())
    }
}

/// Registry of entity types
#[derive(Debug, Clone)]
pub struct SchemaRegistry {
    types: HashMap<String, TypeDefinition>,
    allow_generic_keys: bool,
}

impl Default for SchemaRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl SchemaRegistry {
    /// Create an empty registry that resolves undeclared names to generic keys
    pub fn new() -> Self {
        Self {
            types: HashMap::new(),
            allow_generic_keys: true,
        }
    }

    /// Create an empty registry that rejects undeclared property names
    pub fn strict() -> Self {
        Self {
            types: HashMap::new(),
            allow_generic_keys: false,
        }
    }

    /// Register or replace a type definition
    pub fn register(&mut self, definition: TypeDefinition) {
        log::debug!("Registered schema type '{}'", definition.name);
        self.types.insert(definition.name.clone(), definition);
    }

    pub fn with_type(mut self, definition: TypeDefinition) -> Self {
        self.register(definition);
        self
    }

    pub fn get_type(&self, name: &str) -> Option<&TypeDefinition> {
        self.types.get(name)
    }

    pub fn contains_type(&self, name: &str) -> bool {
        self.types.contains_key(name)
    }

    /// Names of all registered types, sorted
    pub fn type_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.types.keys().cloned().collect();
        names.sort();
        names
    }

    /// The type followed by its ancestors, nearest first
    pub fn hierarchy(&self, entity_type: &str) -> Vec<&TypeDefinition> {
        let mut chain = Vec::new();
        let mut seen = HashSet::new();
        let mut current = Some(entity_type);

        while let Some(name) = current {
            if !seen.insert(name) {
                log::warn!("Cyclic type hierarchy detected at '{}'", name);
                break;
            }
            match self.types.get(name) {
                Some(definition) => {
                    chain.push(definition);
                    current = definition.extends.as_deref();
                }
                None => break,
            }
        }

        chain
    }

    /// Labels a node of `entity_type` carries: the type and all its ancestors
    pub fn labels_for_type(&self, entity_type: &str) -> Vec<String> {
        let mut labels = vec![entity_type.to_string()];
        for definition in self.hierarchy(entity_type).into_iter().skip(1) {
            labels.push(definition.name.clone());
        }
        labels
    }

    /// Resolve a property name to a typed key for `entity_type`
    ///
    /// Declared names win over database names. Undeclared names resolve to a
    /// generic key unless the registry is strict.
    pub fn property_key(&self, entity_type: &str, name: &str) -> SchemaResult<PropertyKey> {
        let hierarchy = self.hierarchy(entity_type);

        let declared = hierarchy
            .iter()
            .flat_map(|definition| definition.properties.iter())
            .find(|property| property.name == name)
            .or_else(|| {
                hierarchy
                    .iter()
                    .flat_map(|definition| definition.properties.iter())
                    .find(|property| property.db_name == name)
            });

        match declared {
            Some(definition) => Ok(PropertyKey::from_definition(definition)),
            None if self.allow_generic_keys => Ok(PropertyKey::generic(name)),
            None => Err(SchemaError::UnknownProperty {
                entity_type: entity_type.to_string(),
                property: name.to_string(),
            }),
        }
    }

    /// Required properties of a type, including inherited ones
    pub fn required_properties(&self, entity_type: &str) -> Vec<&PropertyDefinition> {
        self.hierarchy(entity_type)
            .into_iter()
            .flat_map(|definition| definition.properties.iter())
            .filter(|property| property.required)
            .collect()
    }

    /// Relationship constraints of a type, including inherited ones
    pub fn relationship_constraints(&self, entity_type: &str) -> Vec<&RelationshipConstraint> {
        self.hierarchy(entity_type)
            .into_iter()
            .flat_map(|definition| definition.constraints.iter())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::types::DataType;

    fn registry() -> SchemaRegistry {
        SchemaRegistry::new()
            .with_type(
                TypeDefinition::new("Entity")
                    .with_property(PropertyDefinition::new("id", DataType::String).read_only()),
            )
            .with_type(
                TypeDefinition::new("Person").extends("Entity").with_property(
                    PropertyDefinition::new("fullName", DataType::String)
                        .stored_as("full_name")
                        .required(),
                ),
            )
            .with_type(TypeDefinition::new("Employee").extends("Person"))
    }

    #[test]
    fn test_labels_follow_hierarchy() {
        let schema = registry();
        assert!(schema.contains_type("Employee"));
        assert_eq!(
            schema.get_type("Employee").and_then(|t| t.extends.as_deref()),
            Some("Person")
        );
        assert_eq!(
            schema.labels_for_type("Employee"),
            vec!["Employee", "Person", "Entity"]
        );
        assert_eq!(schema.labels_for_type("Unknown"), vec!["Unknown"]);
    }

    #[test]
    fn test_property_key_resolution() {
        let schema = registry();

        let key = schema.property_key("Employee", "fullName").unwrap();
        assert_eq!(key.db_name(), "full_name");
        assert!(!key.is_generic());

        let by_db_name = schema.property_key("Employee", "full_name").unwrap();
        assert_eq!(by_db_name, key);

        let generic = schema.property_key("Employee", "nickname").unwrap();
        assert!(generic.is_generic());
        assert_eq!(generic.db_name(), "nickname");
    }

    #[test]
    fn test_strict_registry_rejects_unknown_names() {
        let schema = SchemaRegistry::strict().with_type(TypeDefinition::new("Person"));
        assert!(matches!(
            schema.property_key("Person", "nickname"),
            Err(SchemaError::UnknownProperty { .. })
        ));
    }

    #[test]
    fn test_check_value() {
        let schema = registry();
        let id = schema.property_key("Person", "id").unwrap();
        assert!(id.is_read_only());
        assert!(matches!(
            id.check_value(&Value::from("x")),
            Err(SchemaError::ReadOnlyProperty(_))
        ));

        let name = schema.property_key("Person", "fullName").unwrap();
        assert!(name.check_value(&Value::from("Ada")).is_ok());
        assert!(matches!(
            name.check_value(&Value::Number(1.0)),
            Err(SchemaError::TypeMismatch { .. })
        ));
    }

    #[test]
    fn test_cyclic_hierarchy_terminates() {
        let schema = SchemaRegistry::new()
            .with_type(TypeDefinition::new("A").extends("B"))
            .with_type(TypeDefinition::new("B").extends("A"));
        assert_eq!(schema.labels_for_type("A"), vec!["A", "B"]);
    }
}
