//! Schema-driven zero-copy views over contiguous byte buffers.
//!
//! A [`schema::Schema`] is compiled once into a [`layout::Layout`] against a
//! [`codec::CodecRegistry`]. Views bind a layout to a byte region and decode
//! or encode single fields in place; [`view::RecordBuf`] converts whole
//! plain values (`serde_json::Value`) to and from freshly allocated records.
//! Bit-packed field sets and UTF-8 byte strings are provided as standalone
//! building blocks and as field views.

pub mod bits;
pub mod bytestring;
pub mod codec;
pub mod config;
pub mod error;
pub mod layout;
pub mod schema;
pub mod view;

pub use bits::{BitSchema, BitSet, Matcher};
pub use bytestring::ByteString;
pub use codec::{Codec, CodecRegistry, Primitive, Width};
pub use config::{ByteOrder, OverflowPolicy, SlotWidth, ViewConfig};
pub use error::{SchemaError, ViewError};
pub use layout::{compile, Compiler, Layout};
pub use schema::{FieldDef, FieldType, Schema, SchemaCatalog};
pub use view::{FieldView, RecordArray, RecordArrayMut, RecordBuf, View, ViewMut};
