//! Validation of compiled field placements.

use super::field::FieldLayout;
use crate::config::ViewConfig;
use crate::error::SchemaError;

/// Validates that no field is empty and no two fields share bytes.
///
/// # Arguments
/// * `fields` - Field placements to validate
///
/// # Returns
/// `Result<(), SchemaError>` indicating success or validation failure.
pub(crate) fn validate_field_layout(fields: &[FieldLayout]) -> Result<(), SchemaError> {
    let mut ranges: Vec<(usize, usize, &str)> = Vec::with_capacity(fields.len());
    for field in fields {
        if field.size == 0 {
            return Err(SchemaError::InvalidWidth {
                field: field.name.clone(),
                width: 0,
            });
        }
        let end = field
            .offset
            .checked_add(field.size)
            .ok_or(SchemaError::CapacityOverflow {
                operation: "field bounds calculation",
            })?;
        ranges.push((field.offset, end, field.name.as_str()));
    }
    ranges.sort_by_key(|&(start, _, _)| start);

    for pair in ranges.windows(2) {
        if pair[0].1 > pair[1].0 {
            return Err(SchemaError::OverlappingFields {
                first: pair[0].2.to_string(),
                second: pair[1].2.to_string(),
            });
        }
    }
    Ok(())
}

/// Calculates the fixed region size from field placements.
///
/// The fixed size is the maximum of (field offset + field size) across all fields.
pub(crate) fn calculate_fixed_size(fields: &[FieldLayout]) -> Result<usize, SchemaError> {
    let mut max_end = 0usize;
    for field in fields {
        let end = field
            .offset
            .checked_add(field.size)
            .ok_or(SchemaError::CapacityOverflow {
                operation: "fixed size calculation",
            })?;
        max_end = max_end.max(end);
    }
    Ok(max_end)
}

/// Checks that every variable payload stays addressable through a pointer
/// slot even when all preceding payloads are at their maximum, and that the
/// worst-case record fits `max_record_size`.
///
/// # Returns
/// The worst-case record size.
pub(crate) fn validate_payload_bounds(
    schema: &str,
    fields: &[FieldLayout],
    fixed_size: usize,
    config: &ViewConfig,
) -> Result<usize, SchemaError> {
    let limit = config.slot_width.max_addressable();
    let mut end = fixed_size;
    for field in fields.iter().filter(|f| f.kind.is_variable()) {
        end = end
            .checked_add(field.kind.max_payload())
            .ok_or(SchemaError::CapacityOverflow {
                operation: "payload bounds calculation",
            })?;
        if end > limit {
            return Err(SchemaError::SlotOverflow {
                field: field.name.clone(),
                required: end,
                limit,
            });
        }
    }

    if end > config.max_record_size {
        return Err(SchemaError::RecordTooLarge {
            schema: schema.to_string(),
            size: end,
            limit: config.max_record_size,
        });
    }
    Ok(end)
}
