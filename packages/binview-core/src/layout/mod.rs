//! Layout compiler and compiled layout descriptors.

mod compiler;
mod descriptor;
mod field;
pub(crate) mod validation;

pub use compiler::{compile, Compiler};
pub use descriptor::Layout;
pub use field::{FieldKind, FieldLayout};
