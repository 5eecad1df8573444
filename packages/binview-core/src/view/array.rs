//! Element views and fixed-record arrays.

use serde_json::Value;

use super::field_codec::decode_fixed;
use super::view::{check_region, field_view, FieldView, View, ViewMut};
use crate::config::ViewConfig;
use crate::error::ViewError;
use crate::layout::{FieldKind, Layout};

/// View over the elements of an array or list field.
#[derive(Debug, Clone, Copy)]
pub struct ArrayView<'a> {
    element: &'a FieldKind,
    element_size: usize,
    bytes: &'a [u8],
    config: &'a ViewConfig,
}

impl<'a> ArrayView<'a> {
    pub(crate) fn new(
        element: &'a FieldKind,
        element_size: usize,
        bytes: &'a [u8],
        config: &'a ViewConfig,
    ) -> Result<Self, ViewError> {
        if element_size == 0 || bytes.len() % element_size != 0 {
            return Err(ViewError::Decode {
                offset: bytes.len(),
                reason: format!(
                    "{} bytes do not hold whole elements of {} bytes",
                    bytes.len(),
                    element_size
                ),
            });
        }
        Ok(Self {
            element,
            element_size,
            bytes,
            config,
        })
    }

    /// Number of elements.
    pub fn len(&self) -> usize {
        self.bytes.len() / self.element_size
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Element kind.
    pub fn element(&self) -> &'a FieldKind {
        self.element
    }

    fn element_bytes(&self, index: usize) -> Result<&'a [u8], ViewError> {
        let bytes: &'a [u8] = self.bytes;
        let offset = index.saturating_mul(self.element_size);
        let end = check_region(offset, self.element_size, bytes.len())?;
        Ok(&bytes[offset..end])
    }

    /// Decodes one element.
    pub fn get(&self, index: usize) -> Result<Value, ViewError> {
        decode_fixed(self.element, self.element_bytes(index)?, self.config)
    }

    /// Borrows one element as a nested view.
    pub fn get_view(&self, index: usize) -> Result<FieldView<'a>, ViewError> {
        field_view(self.element, self.element_bytes(index)?, self.config)
    }

    /// Decodes elements lazily, in order.
    pub fn iter(&self) -> impl Iterator<Item = Result<Value, ViewError>> + 'a {
        let element = self.element;
        let config = self.config;
        let bytes: &'a [u8] = self.bytes;
        bytes
            .chunks_exact(self.element_size)
            .map(move |chunk| decode_fixed(element, chunk, config))
    }

    /// Decodes every element.
    pub fn to_json(&self) -> Result<Value, ViewError> {
        self.iter().collect::<Result<Vec<_>, _>>().map(Value::Array)
    }
}

fn record_stride(layout: &Layout) -> Result<usize, ViewError> {
    if !layout.is_fixed() {
        return Err(ViewError::TypeMismatch {
            field: layout.name().to_string(),
            expected: "fixed-size layout".to_string(),
            got: "variable-size layout".to_string(),
        });
    }
    Ok(layout.fixed_size())
}

fn check_whole_records(stride: usize, buffer_len: usize) -> Result<(), ViewError> {
    let remainder = buffer_len % stride;
    if remainder != 0 {
        return Err(ViewError::OutOfBounds {
            offset: buffer_len - remainder,
            len: stride,
            buffer_len,
        });
    }
    Ok(())
}

/// Read-only array of fixed-size records packed back to back.
#[derive(Debug, Clone, Copy)]
pub struct RecordArray<'a> {
    layout: &'a Layout,
    bytes: &'a [u8],
    stride: usize,
}

impl<'a> RecordArray<'a> {
    /// Binds a fixed-size layout to a buffer holding whole records.
    pub fn new(layout: &'a Layout, bytes: &'a [u8]) -> Result<Self, ViewError> {
        let stride = record_stride(layout)?;
        check_whole_records(stride, bytes.len())?;
        Ok(Self {
            layout,
            bytes,
            stride,
        })
    }

    /// Zeroed buffer for `count` records.
    pub fn zeroed_buffer(layout: &Layout, count: usize) -> Result<Vec<u8>, ViewError> {
        let stride = record_stride(layout)?;
        let size = stride
            .checked_mul(count)
            .ok_or(crate::error::SchemaError::CapacityOverflow {
                operation: "record array allocation",
            })?;
        tracing::debug!(layout = %layout.name(), count, size, "allocated record array");
        Ok(vec![0u8; size])
    }

    pub fn len(&self) -> usize {
        self.bytes.len() / self.stride
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Record size in bytes.
    pub fn stride(&self) -> usize {
        self.stride
    }

    /// Views the record at `index`.
    pub fn get(&self, index: usize) -> Result<View<'a>, ViewError> {
        let offset = index.saturating_mul(self.stride);
        View::bind(self.layout, self.bytes, offset, self.stride)
    }

    pub fn iter(&self) -> impl Iterator<Item = View<'a>> + 'a {
        let layout = self.layout;
        let bytes: &'a [u8] = self.bytes;
        bytes
            .chunks_exact(self.stride)
            .map(move |chunk| View::from_parts(layout, chunk))
    }

    /// Decodes every record.
    pub fn to_json(&self) -> Result<Value, ViewError> {
        self.iter()
            .map(|view| view.to_json())
            .collect::<Result<Vec<_>, _>>()
            .map(Value::Array)
    }
}

/// Mutable array of fixed-size records.
///
/// Records are written through exclusive [`ViewMut`]s; disjoint partitions
/// come from [`RecordArrayMut::split_at_mut`].
#[derive(Debug)]
pub struct RecordArrayMut<'a> {
    layout: &'a Layout,
    bytes: &'a mut [u8],
    stride: usize,
}

impl<'a> RecordArrayMut<'a> {
    pub fn new(layout: &'a Layout, bytes: &'a mut [u8]) -> Result<Self, ViewError> {
        let stride = record_stride(layout)?;
        check_whole_records(stride, bytes.len())?;
        Ok(Self {
            layout,
            bytes,
            stride,
        })
    }

    pub fn len(&self) -> usize {
        self.bytes.len() / self.stride
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Read-only array over the same records.
    pub fn as_array(&self) -> RecordArray<'_> {
        RecordArray {
            layout: self.layout,
            bytes: &*self.bytes,
            stride: self.stride,
        }
    }

    /// Shorter-lived mutable array over the same records.
    pub fn reborrow(&mut self) -> RecordArrayMut<'_> {
        RecordArrayMut {
            layout: self.layout,
            bytes: &mut *self.bytes,
            stride: self.stride,
        }
    }

    pub fn get(&self, index: usize) -> Result<View<'_>, ViewError> {
        let offset = index.saturating_mul(self.stride);
        View::bind(self.layout, &*self.bytes, offset, self.stride)
    }

    /// Exclusive view of the record at `index`.
    pub fn get_mut(&mut self, index: usize) -> Result<ViewMut<'_>, ViewError> {
        let offset = index.saturating_mul(self.stride);
        ViewMut::bind(self.layout, &mut *self.bytes, offset, self.stride)
    }

    pub fn iter_mut<'s>(&'s mut self) -> impl Iterator<Item = ViewMut<'s>> + 's {
        let layout: &'s Layout = self.layout;
        self.bytes
            .chunks_exact_mut(self.stride)
            .map(move |chunk| ViewMut::from_parts(layout, chunk))
    }

    /// Splits into records `[0, mid)` and `[mid, len)`.
    ///
    /// # Returns
    /// `Err(ViewError::OutOfBounds)` if `mid > len()`.
    pub fn split_at_mut(self, mid: usize) -> Result<(Self, Self), ViewError> {
        let at = mid.saturating_mul(self.stride);
        if at > self.bytes.len() {
            return Err(ViewError::OutOfBounds {
                offset: at,
                len: 0,
                buffer_len: self.bytes.len(),
            });
        }
        let (left, right) = self.bytes.split_at_mut(at);
        Ok((
            Self {
                layout: self.layout,
                bytes: left,
                stride: self.stride,
            },
            Self {
                layout: self.layout,
                bytes: right,
                stride: self.stride,
            },
        ))
    }
}
