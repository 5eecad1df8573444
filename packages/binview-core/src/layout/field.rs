//! Compiled field descriptors.

use std::sync::Arc;

use super::descriptor::Layout;
use crate::bits::BitSchema;
use crate::codec::Codec;

/// How a field's bytes are interpreted.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldKind {
    /// Fixed-width codec
    Scalar(Codec),
    /// Bounded codec stored inline behind a `prefix`-byte length
    Bounded {
        codec: Codec,
        max_length: usize,
        prefix: usize,
    },
    /// Nested fixed-size object
    Object(Arc<Layout>),
    /// Fixed-length array of fixed-size elements
    Array {
        element: Box<FieldKind>,
        element_size: usize,
        length: usize,
    },
    /// Bit-packed field set
    Bits(Arc<BitSchema>),
    /// Bounded codec stored in the payload region behind a pointer slot
    VarBounded { codec: Codec, max_length: usize },
    /// Up to `max_length` fixed-size elements stored in the payload region
    List {
        element: Box<FieldKind>,
        element_size: usize,
        max_length: usize,
    },
}

impl FieldKind {
    /// Whether the field lives in the payload region behind a pointer slot.
    pub fn is_variable(&self) -> bool {
        matches!(self, FieldKind::VarBounded { .. } | FieldKind::List { .. })
    }

    /// Largest payload a variable field can hold; 0 for fixed fields.
    pub fn max_payload(&self) -> usize {
        match self {
            FieldKind::VarBounded { max_length, .. } => *max_length,
            FieldKind::List {
                element_size,
                max_length,
                ..
            } => element_size.saturating_mul(*max_length),
            _ => 0,
        }
    }

    /// Short name used in mismatch messages.
    pub fn type_name(&self) -> &str {
        match self {
            FieldKind::Scalar(codec)
            | FieldKind::Bounded { codec, .. }
            | FieldKind::VarBounded { codec, .. } => &codec.kind,
            FieldKind::Object(_) => "object",
            FieldKind::Array { .. } => "array",
            FieldKind::Bits(_) => "bits",
            FieldKind::List { .. } => "list",
        }
    }
}

/// Field placement within a layout's fixed region.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldLayout {
    /// Field name
    pub name: String,
    /// Byte offset within the record
    pub offset: usize,
    /// Bytes taken in the fixed region (the pointer slot for variable fields)
    pub size: usize,
    /// Interpretation of the bytes
    pub kind: FieldKind,
}

impl FieldLayout {
    /// Returns the end offset of this field (offset + size).
    pub fn end_offset(&self) -> usize {
        self.offset + self.size
    }
}

/// Width of the inline length prefix for a bounded field.
pub(crate) fn prefix_width(max_length: usize) -> usize {
    if max_length <= u8::MAX as usize {
        1
    } else if max_length <= u16::MAX as usize {
        2
    } else {
        4
    }
}
