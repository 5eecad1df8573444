//! Views binding a compiled layout to a byte buffer.
//!
//! [`View`] reads and may alias freely; [`ViewMut`] writes and is exclusive.
//! Disjoint writers over one buffer come from splitting it, for instance with
//! [`RecordArrayMut::split_at_mut`]. [`RecordBuf`] owns its bytes.

mod array;
pub(crate) mod field_codec;
mod record;
#[allow(clippy::module_inception)]
mod view;

pub use array::{ArrayView, RecordArray, RecordArrayMut};
pub use record::RecordBuf;
pub use view::{FieldView, View, ViewMut};
