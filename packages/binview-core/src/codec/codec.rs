use std::sync::Arc;

use serde_json::Value;

use crate::config::ViewConfig;
use crate::error::{SchemaError, ViewError};

/// Type alias for encoder function signature.
///
/// Writes `value` into the front of the region and returns the number of
/// bytes written. Must not modify the region when it returns an error.
pub type EncodeFn = dyn Fn(&mut [u8], &Value, &ViewConfig) -> Result<usize, ViewError> + Send + Sync;

/// Type alias for decoder function signature.
pub type DecodeFn = dyn Fn(&[u8], &ViewConfig) -> Result<Value, ViewError> + Send + Sync;

/// How many bytes a codec occupies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Width {
    /// Always exactly this many bytes
    Fixed(usize),
    /// Up to a per-field maximum declared in the schema (`max_length`)
    Bounded,
}

/// Encode/decode pair for one scalar kind.
///
/// Codecs are the unit of extension: the layout compiler only asks for the
/// width, and views only call `encode`/`decode` on the field's bytes.
#[derive(Clone)]
pub struct Codec {
    /// Kind tag used in schemas (e.g. "u32", "text")
    pub kind: String,
    /// Storage width
    pub width: Width,
    /// Encoder: writes a plain value into a byte region
    pub encoder: Arc<EncodeFn>,
    /// Decoder: reads a plain value from a byte region
    pub decoder: Arc<DecodeFn>,
}

impl std::fmt::Debug for Codec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Codec")
            .field("kind", &self.kind)
            .field("width", &self.width)
            .finish_non_exhaustive()
    }
}

/// Codecs compare by kind and width; the closures are not comparable.
impl PartialEq for Codec {
    fn eq(&self, other: &Self) -> bool {
        self.kind == other.kind && self.width == other.width
    }
}

impl Codec {
    /// Creates a new codec.
    ///
    /// # Arguments
    /// * `kind` - Kind tag string
    /// * `width` - Storage width
    /// * `encoder` - Function writing a value into a region
    /// * `decoder` - Function reading a value from a region
    pub fn new(
        kind: impl Into<String>,
        width: Width,
        encoder: impl Fn(&mut [u8], &Value, &ViewConfig) -> Result<usize, ViewError>
            + Send
            + Sync
            + 'static,
        decoder: impl Fn(&[u8], &ViewConfig) -> Result<Value, ViewError> + Send + Sync + 'static,
    ) -> Self {
        Self {
            kind: kind.into(),
            width,
            encoder: Arc::new(encoder),
            decoder: Arc::new(decoder),
        }
    }

    /// Validates that the codec is usable in a layout.
    pub fn validate(&self) -> Result<(), SchemaError> {
        if self.kind.is_empty() {
            return Err(SchemaError::Parse("codec kind must not be empty".to_string()));
        }
        if self.width == Width::Fixed(0) {
            return Err(SchemaError::InvalidWidth {
                field: self.kind.clone(),
                width: 0,
            });
        }
        Ok(())
    }

    /// Returns the fixed width, or `None` for bounded codecs.
    pub fn fixed_size(&self) -> Option<usize> {
        match self.width {
            Width::Fixed(size) => Some(size),
            Width::Bounded => None,
        }
    }

    /// Encodes a value into the front of `region`.
    ///
    /// Fixed codecs receive exactly their width; bounded codecs receive the
    /// whole region as capacity.
    ///
    /// # Returns
    /// Number of bytes written.
    pub fn encode(
        &self,
        region: &mut [u8],
        value: &Value,
        config: &ViewConfig,
    ) -> Result<usize, ViewError> {
        match self.width {
            Width::Fixed(size) => {
                if region.len() < size {
                    return Err(ViewError::Capacity {
                        field: String::new(),
                        required: size,
                        capacity: region.len(),
                    });
                }
                (self.encoder)(&mut region[..size], value, config)
            }
            Width::Bounded => (self.encoder)(region, value, config),
        }
    }

    /// Decodes a value from `region`.
    ///
    /// Bounded codecs receive exactly the payload bytes.
    pub fn decode(&self, region: &[u8], config: &ViewConfig) -> Result<Value, ViewError> {
        match self.width {
            Width::Fixed(size) => {
                if region.len() < size {
                    return Err(ViewError::Decode {
                        offset: region.len(),
                        reason: format!("{} needs {} bytes", self.kind, size),
                    });
                }
                (self.decoder)(&region[..size], config)
            }
            Width::Bounded => (self.decoder)(region, config),
        }
    }
}
