//! Owned record buffers.

use std::sync::Arc;

use serde_json::Value;

use super::field_codec::{encode_fixed, encode_payload, expect_object, payload_hint, write_slot, Slot};
use super::view::{View, ViewMut};
use crate::error::ViewError;
use crate::layout::{FieldLayout, Layout};

/// A record that owns its bytes.
///
/// Produced by fresh allocation; borrow it through [`RecordBuf::view`] and
/// [`RecordBuf::view_mut`].
#[derive(Debug, Clone, PartialEq)]
pub struct RecordBuf {
    layout: Arc<Layout>,
    bytes: Vec<u8>,
}

impl RecordBuf {
    /// Allocates an empty record: zeroed fixed fields and zero-capacity
    /// variable fields.
    pub fn zeroed(layout: Arc<Layout>) -> Self {
        let mut bytes = vec![0u8; layout.fixed_size()];
        init_slots(&layout, &mut bytes, |_| 0);
        Self { layout, bytes }
    }

    /// Allocates an empty record reserving payload capacity per variable field.
    ///
    /// # Arguments
    /// * `layout` - Compiled layout
    /// * `capacities` - Payload capacity in bytes per variable field, in declaration order
    pub fn with_capacities(layout: Arc<Layout>, capacities: &[usize]) -> Result<Self, ViewError> {
        let size = layout.size_for(capacities)?;
        let mut bytes = vec![0u8; size];
        init_slots(&layout, &mut bytes, |i| capacities[i]);
        tracing::debug!(layout = %layout.name(), size, "allocated record");
        Ok(Self { layout, bytes })
    }

    /// Encodes a plain value into a freshly allocated, right-sized record.
    ///
    /// Variable payloads are measured first; each gets exactly the capacity
    /// it needs. Nothing is returned on any error.
    pub fn from_value(layout: Arc<Layout>, value: &Value) -> Result<Self, ViewError> {
        let map = expect_object(&layout, value)?;
        let config = *layout.config();
        let lookup = |field: &FieldLayout| {
            map.get(&field.name).ok_or_else(|| ViewError::MissingValue {
                field: field.name.clone(),
            })
        };

        let mut payloads = Vec::with_capacity(layout.variable_count());
        for field in layout.variable_fields() {
            let item = lookup(field)?;
            let payload = measure_payload(field, item, &config)?;
            payloads.push(payload);
        }

        let lengths: Vec<usize> = payloads.iter().map(Vec::len).collect();
        let mut record = Self::with_capacities(Arc::clone(&layout), &lengths)?;

        let mut cursor = layout.fixed_size();
        for (field, payload) in layout.variable_fields().zip(&payloads) {
            record.bytes[cursor..cursor + payload.len()].copy_from_slice(payload);
            write_slot(
                &mut record.bytes[field.offset..field.end_offset()],
                Slot {
                    offset: cursor,
                    len: payload.len(),
                },
                &config,
            );
            cursor += payload.len();
        }

        for field in layout.fields().iter().filter(|f| !f.kind.is_variable()) {
            let item = lookup(field)?;
            encode_fixed(
                &field.kind,
                &mut record.bytes[field.offset..field.end_offset()],
                item,
                &config,
            )
            .map_err(|e| e.in_field(&field.name, field.offset))?;
        }

        Ok(record)
    }

    /// Wraps existing bytes.
    ///
    /// # Returns
    /// `Err(ViewError::Capacity)` if `bytes` is shorter than the fixed region.
    pub fn from_bytes(layout: Arc<Layout>, bytes: Vec<u8>) -> Result<Self, ViewError> {
        View::new(&layout, &bytes)?;
        Ok(Self { layout, bytes })
    }

    pub fn layout(&self) -> &Arc<Layout> {
        &self.layout
    }

    pub fn view(&self) -> View<'_> {
        View::from_parts(&self.layout, &self.bytes)
    }

    pub fn view_mut(&mut self) -> ViewMut<'_> {
        ViewMut::from_parts(&self.layout, &mut self.bytes)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn get(&self, name: &str) -> Result<Value, ViewError> {
        self.view().get(name)
    }

    pub fn set(&mut self, name: &str, value: &Value) -> Result<&mut Self, ViewError> {
        self.view_mut().set(name, value)?;
        Ok(self)
    }

    pub fn to_json(&self) -> Result<Value, ViewError> {
        self.view().to_json()
    }
}

/// Points every variable field's slot at its reserved capacity, with length 0.
fn init_slots(layout: &Layout, bytes: &mut [u8], capacity: impl Fn(usize) -> usize) {
    let config = layout.config();
    let mut cursor = layout.fixed_size();
    for (i, field) in layout.variable_fields().enumerate() {
        write_slot(
            &mut bytes[field.offset..field.end_offset()],
            Slot {
                offset: cursor,
                len: 0,
            },
            config,
        );
        cursor += capacity(i);
    }
}

/// Encodes a variable field's payload into its own allocation.
fn measure_payload(
    field: &FieldLayout,
    value: &Value,
    config: &crate::config::ViewConfig,
) -> Result<Vec<u8>, ViewError> {
    let max = field.kind.max_payload();
    let hint = payload_hint(&field.kind, value);

    let mut scratch = vec![0u8; hint];
    let result = match encode_payload(&field.kind, &mut scratch, value, config) {
        Err(ViewError::Capacity { .. }) if hint < max => {
            scratch = vec![0u8; max];
            encode_payload(&field.kind, &mut scratch, value, config)
        }
        other => other,
    };
    let len = result.map_err(|e| e.in_field(&field.name, 0))?;
    scratch.truncate(len);
    Ok(scratch)
}
