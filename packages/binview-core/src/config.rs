//! View engine configuration.

use serde::{Deserialize, Serialize};

/// Byte order used by integer and float codecs and by pointer slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ByteOrder {
    /// Platform byte order
    #[default]
    Native,
    Little,
    Big,
}

/// What the text codec does with content longer than the declared maximum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverflowPolicy {
    /// Reject with `ViewError::Capacity`, leaving the buffer untouched
    #[default]
    Fail,
    /// Cut at the last character boundary that fits
    Truncate,
}

/// Width of each half of a variable field's `(offset, length)` pointer slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SlotWidth {
    U16,
    #[default]
    U32,
}

impl SlotWidth {
    /// Bytes used by one offset or length value.
    pub fn bytes(self) -> usize {
        match self {
            SlotWidth::U16 => 2,
            SlotWidth::U32 => 4,
        }
    }

    /// Bytes taken by a full `(offset, length)` slot.
    pub fn slot_size(self) -> usize {
        self.bytes() * 2
    }

    /// Largest offset or length the slot can express.
    pub fn max_addressable(self) -> usize {
        match self {
            SlotWidth::U16 => u16::MAX as usize,
            SlotWidth::U32 => u32::MAX as usize,
        }
    }
}

/// Configuration applied when compiling a layout.
///
/// The compiled layout keeps a copy, so every view over it encodes and
/// decodes with the same settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewConfig {
    /// Byte order for scalar codecs and slots
    pub byte_order: ByteOrder,
    /// Text overflow handling
    pub text_overflow: OverflowPolicy,
    /// Pointer slot width for variable-length fields
    pub slot_width: SlotWidth,
    /// Upper bound on a record's worst-case size in bytes
    pub max_record_size: usize,
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self {
            byte_order: ByteOrder::Native,
            text_overflow: OverflowPolicy::Fail,
            slot_width: SlotWidth::U32,
            max_record_size: u32::MAX as usize,
        }
    }
}
