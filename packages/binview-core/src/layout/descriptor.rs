//! Compiled layout descriptor.

use std::collections::HashMap;

use super::field::FieldLayout;
use super::validation::{calculate_fixed_size, validate_field_layout, validate_payload_bounds};
use crate::config::ViewConfig;
use crate::error::{SchemaError, ViewError};

/// Byte layout of one schema.
///
/// The fixed region holds every fixed field and one pointer slot per
/// variable field, in declaration order. Variable payloads follow the fixed
/// region, also in declaration order. Layouts are immutable and compare
/// structurally.
#[derive(Debug, Clone, PartialEq)]
pub struct Layout {
    name: String,
    fields: Vec<FieldLayout>,
    index: HashMap<String, usize>,
    fixed_size: usize,
    max_size: usize,
    variable: Vec<usize>,
    config: ViewConfig,
}

impl Layout {
    /// Builds and validates a layout from placed fields.
    pub(crate) fn build(
        name: &str,
        fields: Vec<FieldLayout>,
        config: ViewConfig,
    ) -> Result<Self, SchemaError> {
        validate_field_layout(&fields)?;
        let fixed_size = calculate_fixed_size(&fields)?;
        let max_size = validate_payload_bounds(name, &fields, fixed_size, &config)?;

        let mut index = HashMap::with_capacity(fields.len());
        for (i, field) in fields.iter().enumerate() {
            if index.insert(field.name.clone(), i).is_some() {
                return Err(SchemaError::DuplicateField {
                    schema: name.to_string(),
                    field: field.name.clone(),
                });
            }
        }
        let variable = fields
            .iter()
            .enumerate()
            .filter(|(_, f)| f.kind.is_variable())
            .map(|(i, _)| i)
            .collect();

        Ok(Self {
            name: name.to_string(),
            fields,
            index,
            fixed_size,
            max_size,
            variable,
            config,
        })
    }

    /// Schema name the layout was compiled from.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Field placements in declaration order.
    pub fn fields(&self) -> &[FieldLayout] {
        &self.fields
    }

    /// Looks up a field by name.
    ///
    /// # Returns
    /// `Result<&FieldLayout, ViewError>` with `ViewError::FieldNotFound` for unknown names.
    pub fn field(&self, name: &str) -> Result<&FieldLayout, ViewError> {
        self.index
            .get(name)
            .map(|&i| &self.fields[i])
            .ok_or_else(|| ViewError::FieldNotFound {
                layout: self.name.clone(),
                field: name.to_string(),
            })
    }

    /// Position of a field in declaration order.
    pub fn field_index(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    /// Size of the fixed region in bytes.
    pub fn fixed_size(&self) -> usize {
        self.fixed_size
    }

    /// Whether every instance has the same byte length.
    pub fn is_fixed(&self) -> bool {
        self.variable.is_empty()
    }

    /// Variable fields in declaration order (the payload order).
    pub fn variable_fields(&self) -> impl Iterator<Item = &FieldLayout> + '_ {
        self.variable.iter().map(move |&i| &self.fields[i])
    }

    /// Number of variable fields.
    pub fn variable_count(&self) -> usize {
        self.variable.len()
    }

    /// Configuration the layout was compiled with.
    pub fn config(&self) -> &ViewConfig {
        &self.config
    }

    /// Record size for the given payload capacities.
    ///
    /// # Arguments
    /// * `payload_lengths` - One capacity in bytes per variable field, in declaration order
    ///
    /// # Returns
    /// `Result<usize, ViewError>`; a capacity above the field's maximum fails
    /// with `ViewError::Capacity`.
    pub fn size_for(&self, payload_lengths: &[usize]) -> Result<usize, ViewError> {
        if payload_lengths.len() != self.variable.len() {
            return Err(ViewError::TypeMismatch {
                field: self.name.clone(),
                expected: format!("{} payload lengths", self.variable.len()),
                got: payload_lengths.len().to_string(),
            });
        }

        let mut size = self.fixed_size;
        for (field, &len) in self.variable_fields().zip(payload_lengths) {
            let max = field.kind.max_payload();
            if len > max {
                return Err(ViewError::Capacity {
                    field: field.name.clone(),
                    required: len,
                    capacity: max,
                });
            }
            size += len;
        }
        Ok(size)
    }

    /// Worst-case record size, with every variable field at its maximum.
    pub fn max_size(&self) -> usize {
        self.max_size
    }
}
