use serde::{Deserialize, Serialize};

use super::raw::RawField;

/// Width of one field inside a bit-packed set.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BitFieldDef {
    /// Field name
    pub name: String,
    /// Width in bits
    pub bits: u32,
}

/// Nested object shape: a reference to a named schema, or inline fields.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ObjectRef {
    Named(String),
    Inline(Vec<FieldDef>),
}

/// Declared kind of a field.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FieldType {
    /// Any codec kind from the registry; bounded kinds (e.g. text) need
    /// `max_length` and may be stored out of line with `variable`
    Scalar {
        kind: String,
        max_length: Option<usize>,
        variable: bool,
    },
    /// Nested object
    Object(ObjectRef),
    /// Fixed-length array
    Array { of: Box<FieldType>, length: usize },
    /// Variable-length list of fixed-size elements, at most `max_length` elements
    List { of: Box<FieldType>, max_length: usize },
    /// Bit-packed field set
    Bits(Vec<BitFieldDef>),
}

impl FieldType {
    /// Fixed-width scalar of a registered kind.
    pub fn scalar(kind: impl Into<String>) -> Self {
        FieldType::Scalar {
            kind: kind.into(),
            max_length: None,
            variable: false,
        }
    }

    /// Inline UTF-8 text of at most `max_length` bytes.
    pub fn text(max_length: usize) -> Self {
        FieldType::Scalar {
            kind: crate::codec::TEXT_KIND.to_string(),
            max_length: Some(max_length),
            variable: false,
        }
    }

    /// Out-of-line UTF-8 text of at most `max_length` bytes.
    pub fn variable_text(max_length: usize) -> Self {
        FieldType::Scalar {
            kind: crate::codec::TEXT_KIND.to_string(),
            max_length: Some(max_length),
            variable: true,
        }
    }

    /// Reference to a named schema.
    pub fn object(name: impl Into<String>) -> Self {
        FieldType::Object(ObjectRef::Named(name.into()))
    }

    /// Inline nested object.
    pub fn inline(fields: Vec<FieldDef>) -> Self {
        FieldType::Object(ObjectRef::Inline(fields))
    }

    pub fn array(of: FieldType, length: usize) -> Self {
        FieldType::Array {
            of: Box::new(of),
            length,
        }
    }

    pub fn list(of: FieldType, max_length: usize) -> Self {
        FieldType::List {
            of: Box::new(of),
            max_length,
        }
    }

    pub fn bits(fields: &[(&str, u32)]) -> Self {
        FieldType::Bits(
            fields
                .iter()
                .map(|(name, bits)| BitFieldDef {
                    name: (*name).to_string(),
                    bits: *bits,
                })
                .collect(),
        )
    }
}

/// A named field.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawField", into = "RawField")]
pub struct FieldDef {
    /// Field name
    pub name: String,
    /// Declared kind
    pub ty: FieldType,
}

impl FieldDef {
    pub fn new(name: impl Into<String>, ty: FieldType) -> Self {
        Self {
            name: name.into(),
            ty,
        }
    }
}
