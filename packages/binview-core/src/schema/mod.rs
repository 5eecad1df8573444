//! Declarative schema model.
//!
//! A [`Schema`] is a named, ordered list of [`FieldDef`]s. Schemas are plain
//! data; they become usable only after compilation into a
//! [`Layout`](crate::layout::Layout). Object fields may reference other
//! schemas by name through a [`SchemaCatalog`].

mod raw;
mod types;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::SchemaError;

pub use types::{BitFieldDef, FieldDef, FieldType, ObjectRef};

/// Named schema.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Schema {
    /// Schema name
    pub name: String,
    /// Field definitions in declaration order
    pub fields: Vec<FieldDef>,
}

impl Schema {
    /// Creates an empty schema.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fields: Vec::new(),
        }
    }

    /// Appends a field.
    pub fn with_field(mut self, name: impl Into<String>, ty: FieldType) -> Self {
        self.fields.push(FieldDef::new(name, ty));
        self
    }

    /// Parses a schema from a JSON document.
    ///
    /// # Arguments
    /// * `json` - Document of the form `{"name": ..., "fields": [...]}`
    ///
    /// # Returns
    /// `Result<Schema, SchemaError>` with `SchemaError::Parse` on malformed input.
    pub fn from_json(json: &str) -> Result<Self, SchemaError> {
        serde_json::from_str(json).map_err(|e| SchemaError::Parse(e.to_string()))
    }

    /// Serializes the schema to a JSON document.
    pub fn to_json(&self) -> Result<String, SchemaError> {
        serde_json::to_string_pretty(self).map_err(|e| SchemaError::Parse(e.to_string()))
    }
}

/// Set of named schemas used to resolve `object` references.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SchemaCatalog {
    schemas: BTreeMap<String, Schema>,
}

impl SchemaCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a schema.
    ///
    /// # Returns
    /// `Result<(), SchemaError>` with `SchemaError::DuplicateSchema` if the
    /// name is taken.
    pub fn insert(&mut self, schema: Schema) -> Result<(), SchemaError> {
        if self.schemas.contains_key(&schema.name) {
            return Err(SchemaError::DuplicateSchema { name: schema.name });
        }
        self.schemas.insert(schema.name.clone(), schema);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&Schema> {
        self.schemas.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.schemas.contains_key(name)
    }

    /// Schema names in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.schemas.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.schemas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty()
    }

    /// Parses a JSON array of schema documents.
    pub fn from_json(json: &str) -> Result<Self, SchemaError> {
        let schemas: Vec<Schema> =
            serde_json::from_str(json).map_err(|e| SchemaError::Parse(e.to_string()))?;
        let mut catalog = Self::new();
        for schema in schemas {
            catalog.insert(schema)?;
        }
        Ok(catalog)
    }
}
