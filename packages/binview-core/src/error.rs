//! Schema and view error types.

use thiserror::Error;

/// Schema compilation errors.
///
/// Produced by schema loading, codec registration and the layout compiler.
/// Operations on a bound view never return these except wrapped in
/// [`ViewError::Schema`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SchemaError {
    /// Field name declared twice in one object
    #[error("Field '{field}' declared twice in schema '{schema}'")]
    DuplicateField { schema: String, field: String },

    /// Schema name registered twice in a catalog
    #[error("Schema '{name}' already defined")]
    DuplicateSchema { name: String },

    /// Object schema without any fields
    #[error("Schema '{name}' has no fields")]
    EmptySchema { name: String },

    /// Field or codec with a zero byte width
    #[error("Field '{field}' has invalid width {width}")]
    InvalidWidth { field: String, width: usize },

    /// Kind tag not present in the codec registry
    #[error("Field '{field}' has unknown kind '{kind}'")]
    UnknownKind { field: String, kind: String },

    /// Referenced schema not present in the catalog
    #[error("Schema '{name}' not found")]
    UnknownSchema { name: String },

    /// Schema reference chain leads back to itself
    #[error("Schema '{name}' references itself through field '{field}'")]
    RecursiveSchema { name: String, field: String },

    /// Kind-specific parameter required but absent
    #[error("Field '{field}' is missing required parameter '{parameter}'")]
    MissingParameter {
        field: String,
        parameter: &'static str,
    },

    /// Parameter given for a kind that does not accept it
    #[error("Field '{field}' does not accept parameter '{parameter}'")]
    UnexpectedParameter {
        field: String,
        parameter: &'static str,
    },

    /// Variable-length member below the top level of a layout
    #[error("Variable-length field '{field}' cannot be nested inside an object or array element")]
    NestedVariable { field: String },

    /// Variable payload not addressable through the configured slot width
    #[error("Variable-length field '{field}' needs {required} addressable bytes, slot width allows {limit}")]
    SlotOverflow {
        field: String,
        required: usize,
        limit: usize,
    },

    /// Two fields claim the same bytes
    #[error("Fields '{first}' and '{second}' overlap")]
    OverlappingFields { first: String, second: String },

    /// Worst-case record size above the configured maximum
    #[error("Layout '{schema}' size {size} exceeds maximum record size {limit}")]
    RecordTooLarge {
        schema: String,
        size: usize,
        limit: usize,
    },

    /// Arithmetic overflow while computing sizes or offsets
    #[error("Capacity overflow during {operation}")]
    CapacityOverflow { operation: &'static str },

    /// Bit field width outside 1..=64
    #[error("Bit field '{field}' has invalid width {bits}")]
    InvalidBitWidth { field: String, bits: u32 },

    /// Codec kind registered twice
    #[error("Codec '{kind}' already registered")]
    DuplicateKind { kind: String },

    /// Codec registry lock poisoned
    #[error("Codec registry lock poisoned")]
    LockPoisoned,

    /// Malformed schema document
    #[error("Invalid schema document: {0}")]
    Parse(String),
}

/// View operation errors.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ViewError {
    /// Schema problem surfaced through a view-level call
    #[error(transparent)]
    Schema(#[from] SchemaError),

    /// Scalar value outside the codec's representable domain
    #[error("Value {value} out of range for kind '{kind}'")]
    Range { kind: String, value: String },

    /// Write larger than the field's or buffer's allocated capacity
    #[error("Field '{field}' needs {required} bytes, capacity is {capacity}")]
    Capacity {
        field: String,
        required: usize,
        capacity: usize,
    },

    /// Byte content that cannot be decoded
    #[error("Decode error at byte {offset}: {reason}")]
    Decode { offset: usize, reason: String },

    /// Field name not part of the layout
    #[error("Field '{field}' not found in layout '{layout}'")]
    FieldNotFound { layout: String, field: String },

    /// Plain value shape does not match the field kind
    #[error("Type mismatch for field '{field}': expected {expected}, got {got}")]
    TypeMismatch {
        field: String,
        expected: String,
        got: String,
    },

    /// Object value without an entry for a declared field
    #[error("Missing value for field '{field}'")]
    MissingValue { field: String },

    /// Region outside the bound buffer
    #[error("Region offset={offset}, len={len} exceeds buffer length {buffer_len}")]
    OutOfBounds {
        offset: usize,
        len: usize,
        buffer_len: usize,
    },
}

impl ViewError {
    /// Attaches a field name and base offset to errors raised by codecs,
    /// which only see the field's own bytes.
    pub(crate) fn in_field(self, field: &str, base: usize) -> Self {
        match self {
            ViewError::Capacity {
                field: f,
                required,
                capacity,
            } if f.is_empty() => ViewError::Capacity {
                field: field.to_string(),
                required,
                capacity,
            },
            ViewError::TypeMismatch {
                field: f,
                expected,
                got,
            } if f.is_empty() => ViewError::TypeMismatch {
                field: field.to_string(),
                expected,
                got,
            },
            ViewError::Decode { offset, reason } => ViewError::Decode {
                offset: base + offset,
                reason: format!("field '{}': {}", field, reason),
            },
            other => other,
        }
    }
}

/// Short name of a plain value's shape, used in mismatch messages.
pub(crate) fn value_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "bool",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}

/// Mismatch raised inside a codec; the view fills in the field name.
pub(crate) fn mismatch(expected: &str, value: &serde_json::Value) -> ViewError {
    ViewError::TypeMismatch {
        field: String::new(),
        expected: expected.to_string(),
        got: value_kind(value).to_string(),
    }
}
