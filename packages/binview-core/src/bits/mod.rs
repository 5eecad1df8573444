//! Bit-packed field sets.
//!
//! A [`BitSchema`] lays out N small unsigned fields back to back inside one
//! integer word (bit 0 of the first field is bit 0 of the word). Writes are
//! masked to the field width: storing 200 into a 7-bit field keeps
//! `200 mod 128 = 72`. This wraparound mirrors fixed-width bitfields and is
//! intentional; it is the one place in the crate where out-of-range values do
//! not produce `ViewError::Range`.
//!
//! Multi-field comparisons go through a precomputed [`Matcher`]:
//! `(packed & mask) == value` costs one AND and one compare per storage word
//! regardless of how many fields the matcher covers.

mod packed;
mod set;

pub use packed::{BitRepr, Packed};
pub use set::{BitField, BitSchema, BitSet, Matcher};
