//! Per-field encode/decode over raw byte regions.
//!
//! Fixed-region helpers take exactly the field's bytes. Payload helpers take
//! the bytes of a variable field's payload region.

use serde_json::{Map, Value};

use crate::codec::Primitive;
use crate::config::{ByteOrder, ViewConfig};
use crate::error::{mismatch, ViewError};
use crate::layout::{FieldKind, Layout};

/// A variable field's `(offset, length)` pointer; offsets are relative to the
/// record start.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Slot {
    pub offset: usize,
    pub len: usize,
}

/// Reads an unsigned integer of 1, 2 or 4 bytes.
pub(crate) fn read_uint(bytes: &[u8], width: usize, order: ByteOrder) -> usize {
    match width {
        1 => bytes[0] as usize,
        2 => u16::read(bytes, order) as usize,
        _ => u32::read(bytes, order) as usize,
    }
}

/// Writes an unsigned integer of 1, 2 or 4 bytes.
///
/// Caller must ensure `value` fits the width.
pub(crate) fn write_uint(bytes: &mut [u8], width: usize, value: usize, order: ByteOrder) {
    match width {
        1 => bytes[0] = value as u8,
        2 => (value as u16).write(bytes, order),
        _ => (value as u32).write(bytes, order),
    }
}

pub(crate) fn read_slot(bytes: &[u8], config: &ViewConfig) -> Slot {
    let width = config.slot_width.bytes();
    Slot {
        offset: read_uint(bytes, width, config.byte_order),
        len: read_uint(&bytes[width..], width, config.byte_order),
    }
}

pub(crate) fn write_slot(bytes: &mut [u8], slot: Slot, config: &ViewConfig) {
    let width = config.slot_width.bytes();
    write_uint(bytes, width, slot.offset, config.byte_order);
    write_uint(&mut bytes[width..], width, slot.len, config.byte_order);
}

/// Payload bytes of an inline bounded field.
pub(crate) fn bounded_payload<'b>(
    region: &'b [u8],
    max_length: usize,
    prefix: usize,
    config: &ViewConfig,
) -> Result<&'b [u8], ViewError> {
    let len = read_uint(region, prefix, config.byte_order);
    if len > max_length {
        return Err(ViewError::Decode {
            offset: 0,
            reason: format!("length prefix {} exceeds maximum {}", len, max_length),
        });
    }
    Ok(&region[prefix..prefix + len])
}

/// Decodes a fixed-region field.
pub(crate) fn decode_fixed(
    kind: &FieldKind,
    region: &[u8],
    config: &ViewConfig,
) -> Result<Value, ViewError> {
    match kind {
        FieldKind::Scalar(codec) => codec.decode(region, config),
        FieldKind::Bounded {
            codec,
            max_length,
            prefix,
        } => {
            let payload = bounded_payload(region, *max_length, *prefix, config)?;
            codec.decode(payload, config).map_err(|e| shift(e, *prefix))
        }
        FieldKind::Object(layout) => decode_object(layout, region),
        FieldKind::Array {
            element,
            element_size,
            ..
        } => decode_elements(element, *element_size, region, config),
        FieldKind::Bits(schema) => Ok(schema.decode_value(region)),
        FieldKind::VarBounded { .. } | FieldKind::List { .. } => Err(ViewError::Decode {
            offset: 0,
            reason: "variable field has no fixed encoding".to_string(),
        }),
    }
}

/// Encodes a fixed-region field into exactly its bytes.
///
/// On error the region may be partially written; callers that need
/// all-or-nothing semantics encode into scratch first.
pub(crate) fn encode_fixed(
    kind: &FieldKind,
    region: &mut [u8],
    value: &Value,
    config: &ViewConfig,
) -> Result<(), ViewError> {
    match kind {
        FieldKind::Scalar(codec) => codec.encode(region, value, config).map(|_| ()),
        FieldKind::Bounded { codec, prefix, .. } => {
            let (head, body) = region.split_at_mut(*prefix);
            let len = codec.encode(body, value, config)?;
            write_uint(head, *prefix, len, config.byte_order);
            Ok(())
        }
        FieldKind::Object(layout) => encode_object(layout, region, value),
        FieldKind::Array {
            element,
            element_size,
            length,
        } => {
            let items = value.as_array().ok_or_else(|| mismatch("array", value))?;
            if items.len() != *length {
                return Err(ViewError::TypeMismatch {
                    field: String::new(),
                    expected: format!("array of {}", length),
                    got: format!("array of {}", items.len()),
                });
            }
            for (chunk, item) in region.chunks_exact_mut(*element_size).zip(items) {
                encode_fixed(element, chunk, item, config)?;
            }
            Ok(())
        }
        FieldKind::Bits(schema) => schema.encode_value(region, value),
        FieldKind::VarBounded { .. } | FieldKind::List { .. } => Err(mismatch("fixed field", value)),
    }
}

/// Decodes a variable field's payload.
pub(crate) fn decode_payload(
    kind: &FieldKind,
    payload: &[u8],
    config: &ViewConfig,
) -> Result<Value, ViewError> {
    match kind {
        FieldKind::VarBounded { codec, .. } => codec.decode(payload, config),
        FieldKind::List {
            element,
            element_size,
            ..
        } => {
            if payload.len() % element_size != 0 {
                return Err(ViewError::Decode {
                    offset: payload.len(),
                    reason: format!(
                        "list payload of {} bytes is not a multiple of element size {}",
                        payload.len(),
                        element_size
                    ),
                });
            }
            decode_elements(element, *element_size, payload, config)
        }
        other => decode_fixed(other, payload, config),
    }
}

/// Encodes a variable field's payload into the front of `region`.
///
/// # Returns
/// Number of payload bytes written.
pub(crate) fn encode_payload(
    kind: &FieldKind,
    region: &mut [u8],
    value: &Value,
    config: &ViewConfig,
) -> Result<usize, ViewError> {
    match kind {
        FieldKind::VarBounded { codec, .. } => codec.encode(region, value, config),
        FieldKind::List {
            element,
            element_size,
            max_length,
        } => {
            let items = value.as_array().ok_or_else(|| mismatch("array", value))?;
            let required = items.len() * element_size;
            if items.len() > *max_length || required > region.len() {
                return Err(ViewError::Capacity {
                    field: String::new(),
                    required,
                    capacity: region.len().min(max_length * element_size),
                });
            }
            for (chunk, item) in region.chunks_exact_mut(*element_size).zip(items) {
                encode_fixed(element, chunk, item, config)?;
            }
            Ok(required)
        }
        _ => Err(mismatch("variable field", value)),
    }
}

/// Scratch size for encoding a payload: the exact size when it can be read
/// off the value, otherwise the field maximum.
pub(crate) fn payload_hint(kind: &FieldKind, value: &Value) -> usize {
    let max = kind.max_payload();
    match (kind, value) {
        (FieldKind::VarBounded { .. }, Value::String(s)) => s.len().min(max),
        (FieldKind::List { element_size, .. }, Value::Array(items)) => {
            items.len().saturating_mul(*element_size).min(max)
        }
        _ => max,
    }
}

fn decode_elements(
    element: &FieldKind,
    element_size: usize,
    region: &[u8],
    config: &ViewConfig,
) -> Result<Value, ViewError> {
    region
        .chunks_exact(element_size)
        .enumerate()
        .map(|(i, chunk)| {
            decode_fixed(element, chunk, config).map_err(|e| shift(e, i * element_size))
        })
        .collect::<Result<Vec<_>, _>>()
        .map(Value::Array)
}

/// Decodes all fields of a fixed-size nested object.
pub(crate) fn decode_object(layout: &Layout, region: &[u8]) -> Result<Value, ViewError> {
    let config = layout.config();
    let mut map = Map::with_capacity(layout.fields().len());
    for field in layout.fields() {
        let value = decode_fixed(&field.kind, &region[field.offset..field.end_offset()], config)
            .map_err(|e| e.in_field(&field.name, field.offset))?;
        map.insert(field.name.clone(), value);
    }
    Ok(Value::Object(map))
}

/// Encodes every field of a fixed-size nested object.
pub(crate) fn encode_object(
    layout: &Layout,
    region: &mut [u8],
    value: &Value,
) -> Result<(), ViewError> {
    let map = expect_object(layout, value)?;
    let config = layout.config();
    for field in layout.fields() {
        let item = map.get(&field.name).ok_or_else(|| ViewError::MissingValue {
            field: field.name.clone(),
        })?;
        encode_fixed(
            &field.kind,
            &mut region[field.offset..field.end_offset()],
            item,
            config,
        )
        .map_err(|e| e.in_field(&field.name, field.offset))?;
    }
    Ok(())
}

/// Checks that a plain value is an object whose keys all name layout fields.
pub(crate) fn expect_object<'v>(
    layout: &Layout,
    value: &'v Value,
) -> Result<&'v Map<String, Value>, ViewError> {
    let map = value.as_object().ok_or_else(|| ViewError::TypeMismatch {
        field: layout.name().to_string(),
        expected: "object".to_string(),
        got: crate::error::value_kind(value).to_string(),
    })?;
    if let Some(unknown) = map.keys().find(|key| layout.field_index(key).is_none()) {
        return Err(ViewError::FieldNotFound {
            layout: layout.name().to_string(),
            field: unknown.clone(),
        });
    }
    Ok(map)
}

fn shift(error: ViewError, by: usize) -> ViewError {
    match error {
        ViewError::Decode { offset, reason } => ViewError::Decode {
            offset: offset + by,
            reason,
        },
        other => other,
    }
}
