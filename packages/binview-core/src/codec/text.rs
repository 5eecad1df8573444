//! UTF-8 text codec.
//!
//! Text is a bounded kind: the schema declares a maximum byte length and the
//! codec writes the raw UTF-8 bytes, zero-padding the rest of the region.
//! The length itself is kept by the layout (inline prefix or pointer slot).

use serde_json::Value;

use super::codec::{Codec, Width};
use crate::config::OverflowPolicy;
use crate::error::{mismatch, ViewError};

/// Kind tag of the built-in text codec.
pub const TEXT_KIND: &str = "text";

/// Builds the registry entry for `text`.
pub fn text_codec() -> Codec {
    Codec::new(
        TEXT_KIND,
        Width::Bounded,
        |region, value, config| {
            let text = value.as_str().ok_or_else(|| mismatch("string", value))?;
            encode_text(region, text, config.text_overflow)
        },
        |region, _| decode_text(region).map(|text| Value::String(text.to_string())),
    )
}

/// Writes `text` into `region`.
///
/// Content longer than the region fails with `ViewError::Capacity` under
/// `OverflowPolicy::Fail` (region untouched) or is cut at the last fitting
/// character boundary under `OverflowPolicy::Truncate`.
///
/// # Returns
/// Number of payload bytes written.
pub fn encode_text(
    region: &mut [u8],
    text: &str,
    policy: OverflowPolicy,
) -> Result<usize, ViewError> {
    let bytes = text.as_bytes();
    let len = if bytes.len() <= region.len() {
        bytes.len()
    } else {
        match policy {
            OverflowPolicy::Fail => {
                return Err(ViewError::Capacity {
                    field: String::new(),
                    required: bytes.len(),
                    capacity: region.len(),
                })
            }
            OverflowPolicy::Truncate => {
                let cut = floor_char_boundary(text, region.len());
                tracing::warn!(
                    original = bytes.len(),
                    kept = cut,
                    "text truncated to fit its declared maximum"
                );
                cut
            }
        }
    };

    region[..len].copy_from_slice(&bytes[..len]);
    region[len..].fill(0);
    Ok(len)
}

/// Borrows the payload as `&str`, failing on invalid UTF-8.
pub fn decode_text(region: &[u8]) -> Result<&str, ViewError> {
    std::str::from_utf8(region).map_err(|e| ViewError::Decode {
        offset: e.valid_up_to(),
        reason: format!("invalid UTF-8: {}", e),
    })
}

fn floor_char_boundary(text: &str, index: usize) -> usize {
    let mut cut = index.min(text.len());
    while !text.is_char_boundary(cut) {
        cut -= 1;
    }
    cut
}
