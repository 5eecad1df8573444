use super::codec::{Codec, Width};
use super::primitive::Primitive;
use super::registry::CodecRegistry;
use super::text::text_codec;
use crate::error::SchemaError;

/// Builds the codec for a native scalar.
pub fn primitive_codec<T: Primitive>() -> Codec {
    Codec::new(
        T::KIND,
        Width::Fixed(T::SIZE),
        |region, value, config| {
            let v = T::from_value(value)?;
            v.write(region, config.byte_order);
            Ok(T::SIZE)
        },
        |region, config| Ok(T::read(region, config.byte_order).into_value()),
    )
}

/// Registers all built-in codecs in the registry.
///
/// # Arguments
/// * `registry` - Codec registry to populate
///
/// # Returns
/// `Ok(())` if all codecs registered successfully.
pub fn register_builtin_codecs(registry: &CodecRegistry) -> Result<(), SchemaError> {
    // Numeric types
    register_primitive::<i8>(registry)?;
    register_primitive::<i16>(registry)?;
    register_primitive::<i32>(registry)?;
    register_primitive::<i64>(registry)?;

    register_primitive::<u8>(registry)?;
    register_primitive::<u16>(registry)?;
    register_primitive::<u32>(registry)?;
    register_primitive::<u64>(registry)?;

    register_primitive::<f32>(registry)?;
    register_primitive::<f64>(registry)?;

    register_primitive::<bool>(registry)?;

    registry.register(text_codec())?;

    Ok(())
}

/// Helper to register a native scalar codec.
fn register_primitive<T: Primitive>(registry: &CodecRegistry) -> Result<(), SchemaError> {
    registry.register(primitive_codec::<T>())
}
