//! Native scalar codecs.
//!
//! `Primitive` is the typed fast path used by `View::get_as` and
//! `ViewMut::set_as`; the registry's built-in codecs wrap the same
//! implementations for plain-value access.

use serde_json::Value;

use crate::config::ByteOrder;
use crate::error::{mismatch, ViewError};

/// A fixed-width scalar that can be read from and written to raw bytes.
pub trait Primitive: Copy + Sized + Send + Sync + 'static {
    /// Kind tag the built-in codec is registered under
    const KIND: &'static str;
    /// Encoded width in bytes
    const SIZE: usize;

    /// Reads the value from the first `SIZE` bytes.
    ///
    /// Caller must ensure `bytes.len() >= SIZE`.
    fn read(bytes: &[u8], order: ByteOrder) -> Self;

    /// Writes the value into the first `SIZE` bytes.
    ///
    /// Caller must ensure `bytes.len() >= SIZE`.
    fn write(self, bytes: &mut [u8], order: ByteOrder);

    /// Converts a plain value, failing on values the kind cannot represent.
    fn from_value(value: &Value) -> Result<Self, ViewError>;

    /// Converts into a plain value.
    fn into_value(self) -> Value;
}

fn range_error(kind: &str, value: &Value) -> ViewError {
    ViewError::Range {
        kind: kind.to_string(),
        value: value.to_string(),
    }
}

macro_rules! impl_byte_io {
    ($ty:ty) => {
        #[inline]
        fn read(bytes: &[u8], order: ByteOrder) -> Self {
            let mut raw = [0u8; std::mem::size_of::<$ty>()];
            raw.copy_from_slice(&bytes[..std::mem::size_of::<$ty>()]);
            match order {
                ByteOrder::Native => <$ty>::from_ne_bytes(raw),
                ByteOrder::Little => <$ty>::from_le_bytes(raw),
                ByteOrder::Big => <$ty>::from_be_bytes(raw),
            }
        }

        #[inline]
        fn write(self, bytes: &mut [u8], order: ByteOrder) {
            let raw = match order {
                ByteOrder::Native => self.to_ne_bytes(),
                ByteOrder::Little => self.to_le_bytes(),
                ByteOrder::Big => self.to_be_bytes(),
            };
            bytes[..std::mem::size_of::<$ty>()].copy_from_slice(&raw);
        }
    };
}

macro_rules! impl_unsigned {
    ($($ty:ty => $kind:literal),* $(,)?) => {$(
        impl Primitive for $ty {
            const KIND: &'static str = $kind;
            const SIZE: usize = std::mem::size_of::<$ty>();

            impl_byte_io!($ty);

            fn from_value(value: &Value) -> Result<Self, ViewError> {
                let Value::Number(number) = value else {
                    return Err(mismatch($kind, value));
                };
                if let Some(v) = number.as_u64() {
                    <$ty>::try_from(v).map_err(|_| range_error($kind, value))
                } else if number.as_i64().is_some() {
                    Err(range_error($kind, value))
                } else {
                    Err(mismatch($kind, value))
                }
            }

            fn into_value(self) -> Value {
                Value::from(self)
            }
        }
    )*};
}

macro_rules! impl_signed {
    ($($ty:ty => $kind:literal),* $(,)?) => {$(
        impl Primitive for $ty {
            const KIND: &'static str = $kind;
            const SIZE: usize = std::mem::size_of::<$ty>();

            impl_byte_io!($ty);

            fn from_value(value: &Value) -> Result<Self, ViewError> {
                let Value::Number(number) = value else {
                    return Err(mismatch($kind, value));
                };
                if let Some(v) = number.as_i64() {
                    <$ty>::try_from(v).map_err(|_| range_error($kind, value))
                } else if number.as_u64().is_some() {
                    Err(range_error($kind, value))
                } else {
                    Err(mismatch($kind, value))
                }
            }

            fn into_value(self) -> Value {
                Value::from(self)
            }
        }
    )*};
}

impl_unsigned!(u8 => "u8", u16 => "u16", u32 => "u32", u64 => "u64");
impl_signed!(i8 => "i8", i16 => "i16", i32 => "i32", i64 => "i64");

/// Single-precision float.
///
/// Plain values are rounded to the nearest `f32` on encode, so a value
/// decodes back unchanged only if it is exactly representable as `f32`
/// (`0.5` and `1.25` are, `0.1` reads back as `0.10000000149011612`).
impl Primitive for f32 {
    const KIND: &'static str = "f32";
    const SIZE: usize = 4;

    impl_byte_io!(f32);

    /// Rounds to the nearest `f32`; only magnitudes beyond `f32::MAX` fail.
    fn from_value(value: &Value) -> Result<Self, ViewError> {
        let v = value.as_f64().ok_or_else(|| mismatch("f32", value))?;
        if v.is_finite() && v.abs() > f32::MAX as f64 {
            return Err(range_error("f32", value));
        }
        Ok(v as f32)
    }

    /// NaN and infinities have no JSON form and decode to `null`.
    fn into_value(self) -> Value {
        Value::from(self)
    }
}

impl Primitive for f64 {
    const KIND: &'static str = "f64";
    const SIZE: usize = 8;

    impl_byte_io!(f64);

    fn from_value(value: &Value) -> Result<Self, ViewError> {
        value.as_f64().ok_or_else(|| mismatch("f64", value))
    }

    fn into_value(self) -> Value {
        Value::from(self)
    }
}

impl Primitive for bool {
    const KIND: &'static str = "bool";
    const SIZE: usize = 1;

    #[inline]
    fn read(bytes: &[u8], _order: ByteOrder) -> Self {
        bytes[0] != 0
    }

    #[inline]
    fn write(self, bytes: &mut [u8], _order: ByteOrder) {
        bytes[0] = u8::from(self);
    }

    fn from_value(value: &Value) -> Result<Self, ViewError> {
        value.as_bool().ok_or_else(|| mismatch("bool", value))
    }

    fn into_value(self) -> Value {
        Value::Bool(self)
    }
}
