//! Zero-copy views over records.

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use super::array::ArrayView;
use super::field_codec::{
    bounded_payload, decode_fixed, decode_payload, encode_fixed, encode_payload, expect_object,
    read_slot, write_slot, Slot,
};
use crate::bits::BitSet;
use crate::bytestring::ByteString;
use crate::codec::{Codec, Primitive, TEXT_KIND};
use crate::config::ViewConfig;
use crate::error::ViewError;
use crate::layout::{FieldKind, FieldLayout, Layout};

/// Checks that `offset..offset + len` lies within a buffer of `buffer_len` bytes.
pub(crate) fn check_region(offset: usize, len: usize, buffer_len: usize) -> Result<usize, ViewError> {
    match offset.checked_add(len) {
        Some(end) if end <= buffer_len => Ok(end),
        _ => Err(ViewError::OutOfBounds {
            offset,
            len,
            buffer_len,
        }),
    }
}

fn check_record(layout: &Layout, len: usize) -> Result<(), ViewError> {
    if len < layout.fixed_size() {
        return Err(ViewError::Capacity {
            field: layout.name().to_string(),
            required: layout.fixed_size(),
            capacity: len,
        });
    }
    Ok(())
}

/// Nested zero-copy view of one field.
#[derive(Debug, Clone)]
pub enum FieldView<'a> {
    /// Raw bytes of a scalar, or the payload of a non-text bounded kind
    Bytes(&'a [u8]),
    /// Text payload
    Text(ByteString<'a>),
    /// Nested object
    Object(View<'a>),
    /// Array or list elements
    Array(ArrayView<'a>),
    /// Copy of a bit-packed word
    Bits(BitSet<'a>),
}

fn bounded_view<'a>(codec: &Codec, payload: &'a [u8]) -> FieldView<'a> {
    if codec.kind == TEXT_KIND {
        FieldView::Text(ByteString::from_bytes(payload))
    } else {
        FieldView::Bytes(payload)
    }
}

/// Builds the nested view of a field's bytes (the payload for variable fields).
pub(crate) fn field_view<'a>(
    kind: &'a FieldKind,
    region: &'a [u8],
    config: &'a ViewConfig,
) -> Result<FieldView<'a>, ViewError> {
    Ok(match kind {
        FieldKind::Scalar(_) => FieldView::Bytes(region),
        FieldKind::Bounded {
            codec,
            max_length,
            prefix,
        } => bounded_view(codec, bounded_payload(region, *max_length, *prefix, config)?),
        FieldKind::VarBounded { codec, .. } => bounded_view(codec, region),
        FieldKind::Object(layout) => FieldView::Object(View::from_parts(layout, region)),
        FieldKind::Array {
            element,
            element_size,
            ..
        }
        | FieldKind::List {
            element,
            element_size,
            ..
        } => FieldView::Array(ArrayView::new(element, *element_size, region, config)?),
        FieldKind::Bits(schema) => FieldView::Bits(BitSet::from_bytes(schema, region)),
    })
}

/// Read-only view of one record.
///
/// Views borrow both the layout and the buffer; any number of views may
/// alias the same bytes.
#[derive(Debug, Clone, Copy)]
pub struct View<'a> {
    layout: &'a Layout,
    bytes: &'a [u8],
}

impl<'a> View<'a> {
    /// Binds a layout to `buffer[offset..offset + len]` without copying.
    ///
    /// # Returns
    /// `Err(ViewError::OutOfBounds)` if the region exceeds the buffer,
    /// `Err(ViewError::Capacity)` if it is smaller than the fixed region.
    pub fn bind(
        layout: &'a Layout,
        buffer: &'a [u8],
        offset: usize,
        len: usize,
    ) -> Result<Self, ViewError> {
        let end = check_region(offset, len, buffer.len())?;
        check_record(layout, len)?;
        Ok(Self::from_parts(layout, &buffer[offset..end]))
    }

    /// Binds a layout to a whole buffer.
    pub fn new(layout: &'a Layout, bytes: &'a [u8]) -> Result<Self, ViewError> {
        Self::bind(layout, bytes, 0, bytes.len())
    }

    pub(crate) fn from_parts(layout: &'a Layout, bytes: &'a [u8]) -> Self {
        Self { layout, bytes }
    }

    pub fn layout(&self) -> &'a Layout {
        self.layout
    }

    /// The record's bytes.
    pub fn as_bytes(&self) -> &'a [u8] {
        self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Payload bytes of a variable field, resolved through its pointer slot.
    fn payload(&self, field: &FieldLayout) -> Result<&'a [u8], ViewError> {
        let config = self.layout.config();
        let slot = read_slot(&self.bytes[field.offset..field.end_offset()], config);
        let bytes: &'a [u8] = self.bytes;
        match slot.offset.checked_add(slot.len) {
            Some(end) if slot.offset >= self.layout.fixed_size() && end <= bytes.len() => {
                Ok(&bytes[slot.offset..end])
            }
            _ => Err(ViewError::Decode {
                offset: field.offset,
                reason: format!(
                    "field '{}': pointer slot ({}, {}) outside record of {} bytes",
                    field.name,
                    slot.offset,
                    slot.len,
                    bytes.len()
                ),
            }),
        }
    }

    fn decode_field(&self, field: &FieldLayout) -> Result<Value, ViewError> {
        let config = self.layout.config();
        if field.kind.is_variable() {
            let payload = self.payload(field)?;
            decode_payload(&field.kind, payload, config).map_err(|e| e.in_field(&field.name, 0))
        } else {
            decode_fixed(
                &field.kind,
                &self.bytes[field.offset..field.end_offset()],
                config,
            )
            .map_err(|e| e.in_field(&field.name, field.offset))
        }
    }

    /// Decodes a single field.
    pub fn get(&self, name: &str) -> Result<Value, ViewError> {
        let field = self.layout.field(name)?;
        self.decode_field(field)
    }

    /// Decodes a scalar field straight into its native type.
    ///
    /// # Returns
    /// `Err(ViewError::TypeMismatch)` unless the field's kind is `T::KIND`
    /// and its width is `T::SIZE`.
    pub fn get_as<T: Primitive>(&self, name: &str) -> Result<T, ViewError> {
        let field = typed_field::<T>(self.layout, name)?;
        Ok(T::read(
            &self.bytes[field.offset..field.end_offset()],
            self.layout.config().byte_order,
        ))
    }

    /// Borrows a field as a nested view.
    pub fn get_view(&self, name: &str) -> Result<FieldView<'a>, ViewError> {
        let layout: &'a Layout = self.layout;
        let bytes: &'a [u8] = self.bytes;
        let field = layout.field(name)?;
        let region = if field.kind.is_variable() {
            self.payload(field)?
        } else {
            &bytes[field.offset..field.end_offset()]
        };
        field_view(&field.kind, region, layout.config())
            .map_err(|e| e.in_field(&field.name, field.offset))
    }

    /// Reads a bit-packed field.
    pub fn bits(&self, name: &str) -> Result<BitSet<'a>, ViewError> {
        let layout: &'a Layout = self.layout;
        let field = layout.field(name)?;
        match &field.kind {
            FieldKind::Bits(schema) => Ok(BitSet::from_bytes(
                schema,
                &self.bytes[field.offset..field.end_offset()],
            )),
            other => Err(kind_mismatch(name, "bits", other)),
        }
    }

    /// Decodes every field, in layout order.
    pub fn to_json(&self) -> Result<Value, ViewError> {
        let mut map = Map::with_capacity(self.layout.fields().len());
        for field in self.layout.fields() {
            map.insert(field.name.clone(), self.decode_field(field)?);
        }
        Ok(Value::Object(map))
    }

    /// Decodes the record into a caller-supplied shape.
    pub fn to_value<T: DeserializeOwned>(&self) -> Result<T, ViewError> {
        serde_json::from_value(self.to_json()?).map_err(|e| ViewError::Decode {
            offset: 0,
            reason: e.to_string(),
        })
    }
}

fn kind_mismatch(field: &str, expected: &str, got: &FieldKind) -> ViewError {
    ViewError::TypeMismatch {
        field: field.to_string(),
        expected: expected.to_string(),
        got: got.type_name().to_string(),
    }
}

fn typed_field<'l, T: Primitive>(layout: &'l Layout, name: &str) -> Result<&'l FieldLayout, ViewError> {
    let field = layout.field(name)?;
    match &field.kind {
        FieldKind::Scalar(codec) if codec.kind == T::KIND && field.size == T::SIZE => Ok(field),
        FieldKind::Scalar(_) if field.size != T::SIZE => Err(ViewError::TypeMismatch {
            field: name.to_string(),
            expected: format!("{} of {} bytes", T::KIND, T::SIZE),
            got: format!("{} bytes", field.size),
        }),
        other => Err(kind_mismatch(name, T::KIND, other)),
    }
}

/// Exclusive view of one record, for in-place writes.
#[derive(Debug)]
pub struct ViewMut<'a> {
    layout: &'a Layout,
    bytes: &'a mut [u8],
}

impl<'a> ViewMut<'a> {
    /// Binds a layout to `buffer[offset..offset + len]` for writing.
    pub fn bind(
        layout: &'a Layout,
        buffer: &'a mut [u8],
        offset: usize,
        len: usize,
    ) -> Result<Self, ViewError> {
        let end = check_region(offset, len, buffer.len())?;
        check_record(layout, len)?;
        Ok(Self::from_parts(layout, &mut buffer[offset..end]))
    }

    /// Binds a layout to a whole buffer for writing.
    pub fn new(layout: &'a Layout, bytes: &'a mut [u8]) -> Result<Self, ViewError> {
        let len = bytes.len();
        Self::bind(layout, bytes, 0, len)
    }

    pub(crate) fn from_parts(layout: &'a Layout, bytes: &'a mut [u8]) -> Self {
        Self { layout, bytes }
    }

    pub fn layout(&self) -> &'a Layout {
        self.layout
    }

    /// Read-only view of the same record.
    pub fn as_view(&self) -> View<'_> {
        View::from_parts(self.layout, &*self.bytes)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &*self.bytes
    }

    pub fn get(&self, name: &str) -> Result<Value, ViewError> {
        self.as_view().get(name)
    }

    pub fn get_as<T: Primitive>(&self, name: &str) -> Result<T, ViewError> {
        self.as_view().get_as(name)
    }

    pub fn to_json(&self) -> Result<Value, ViewError> {
        self.as_view().to_json()
    }

    /// Writes a field in place.
    ///
    /// Variable fields may shrink or grow up to their allocated capacity,
    /// which runs to the next variable payload or the end of the record.
    /// On error the buffer is unchanged.
    pub fn set(&mut self, name: &str, value: &Value) -> Result<&mut Self, ViewError> {
        let layout: &'a Layout = self.layout;
        let field = layout.field(name)?;
        let config = layout.config();

        if field.kind.is_variable() {
            self.set_payload(field, value)?;
        } else {
            let region = &mut self.bytes[field.offset..field.end_offset()];
            let result = match &field.kind {
                FieldKind::Scalar(_) | FieldKind::Bounded { .. } => {
                    encode_fixed(&field.kind, region, value, config)
                }
                composite => {
                    let mut scratch = region.to_vec();
                    encode_fixed(composite, &mut scratch, value, config)
                        .map(|()| region.copy_from_slice(&scratch))
                }
            };
            result.map_err(|e| e.in_field(&field.name, field.offset))?;
        }

        tracing::trace!(layout = %layout.name(), field = %name, "set field");
        Ok(self)
    }

    fn set_payload(&mut self, field: &FieldLayout, value: &Value) -> Result<(), ViewError> {
        let layout: &'a Layout = self.layout;
        let config = layout.config();
        let slot = read_slot(&self.bytes[field.offset..field.end_offset()], config);
        let capacity_end = self.capacity_end(field)?;
        if slot.offset < layout.fixed_size() || slot.offset > capacity_end {
            return Err(ViewError::Decode {
                offset: field.offset,
                reason: format!(
                    "field '{}': pointer slot offset {} outside payload region",
                    field.name, slot.offset
                ),
            });
        }

        let capacity = (capacity_end - slot.offset).min(field.kind.max_payload());
        let mut scratch = vec![0u8; capacity];
        let len = encode_payload(&field.kind, &mut scratch, value, config).map_err(|e| match e {
            ViewError::Capacity { required, .. } => ViewError::Capacity {
                field: field.name.clone(),
                required,
                capacity,
            },
            other => other.in_field(&field.name, slot.offset),
        })?;

        self.bytes[slot.offset..slot.offset + len].copy_from_slice(&scratch[..len]);
        self.bytes[slot.offset + len..capacity_end].fill(0);
        write_slot(
            &mut self.bytes[field.offset..field.end_offset()],
            Slot {
                offset: slot.offset,
                len,
            },
            config,
        );
        Ok(())
    }

    /// End of a variable field's capacity: the next variable payload's
    /// offset, or the end of the record.
    fn capacity_end(&self, field: &FieldLayout) -> Result<usize, ViewError> {
        let config = self.layout.config();
        let mut rest = self
            .layout
            .variable_fields()
            .skip_while(|f| f.name != field.name)
            .skip(1);
        let end = match rest.next() {
            Some(next) => read_slot(&self.bytes[next.offset..next.end_offset()], config).offset,
            None => self.bytes.len(),
        };
        if end > self.bytes.len() {
            return Err(ViewError::Decode {
                offset: field.offset,
                reason: format!(
                    "field '{}': payload capacity ends at {} beyond record of {} bytes",
                    field.name,
                    end,
                    self.bytes.len()
                ),
            });
        }
        Ok(end)
    }

    /// Writes a scalar field straight from its native type.
    pub fn set_as<T: Primitive>(&mut self, name: &str, value: T) -> Result<&mut Self, ViewError> {
        let layout: &'a Layout = self.layout;
        let field = typed_field::<T>(layout, name)?;
        value.write(
            &mut self.bytes[field.offset..field.end_offset()],
            layout.config().byte_order,
        );
        Ok(self)
    }

    /// Borrows a nested object for writing.
    pub fn get_view_mut(&mut self, name: &str) -> Result<ViewMut<'_>, ViewError> {
        let layout: &'a Layout = self.layout;
        let field = layout.field(name)?;
        match &field.kind {
            FieldKind::Object(inner) => Ok(ViewMut::from_parts(
                inner,
                &mut self.bytes[field.offset..field.end_offset()],
            )),
            other => Err(kind_mismatch(name, "object", other)),
        }
    }

    /// Reads a bit-packed field, lets `update` modify it, and writes it back.
    ///
    /// Nothing is written if `update` fails.
    pub fn update_bits<F>(&mut self, name: &str, update: F) -> Result<&mut Self, ViewError>
    where
        F: FnOnce(&mut BitSet<'a>) -> Result<(), ViewError>,
    {
        let layout: &'a Layout = self.layout;
        let field = layout.field(name)?;
        let FieldKind::Bits(schema) = &field.kind else {
            return Err(kind_mismatch(name, "bits", &field.kind));
        };
        let region = &mut self.bytes[field.offset..field.end_offset()];
        let mut set = BitSet::from_bytes(schema, region);
        update(&mut set)?;
        set.packed().write_le_bytes(region);
        Ok(self)
    }

    /// Encodes a whole plain value in place.
    ///
    /// All-or-nothing: every field is encoded into a copy of the record and
    /// the copy is written back only if all of them succeed.
    pub fn write_value(&mut self, value: &Value) -> Result<&mut Self, ViewError> {
        let layout: &'a Layout = self.layout;
        let map = expect_object(layout, value)?;

        let mut scratch = self.bytes.to_vec();
        {
            let mut staged = ViewMut::from_parts(layout, &mut scratch);
            for field in layout.fields() {
                let item = map.get(&field.name).ok_or_else(|| ViewError::MissingValue {
                    field: field.name.clone(),
                })?;
                staged.set(&field.name, item)?;
            }
        }
        self.bytes.copy_from_slice(&scratch);
        Ok(self)
    }
}
