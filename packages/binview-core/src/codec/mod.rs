//! Typed codec registry, native scalar codecs and the UTF-8 text codec.

mod builtin;
#[allow(clippy::module_inception)]
mod codec;
mod primitive;
mod registry;
mod text;

pub use builtin::{primitive_codec, register_builtin_codecs};
pub use codec::{Codec, DecodeFn, EncodeFn, Width};
pub use primitive::Primitive;
pub use registry::CodecRegistry;
pub use text::{decode_text, encode_text, text_codec, TEXT_KIND};
