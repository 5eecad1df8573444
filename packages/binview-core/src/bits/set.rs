use std::collections::HashMap;

use serde_json::{Map, Value};

use super::packed::{width_mask, BitRepr, Packed};
use crate::error::{mismatch, SchemaError, ViewError};
use crate::schema::BitFieldDef;

/// One field inside a bit-packed set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BitField {
    /// Field name
    pub name: String,
    /// Bit offset from the least significant bit
    pub offset: u32,
    /// Width in bits (1..=64)
    pub bits: u32,
}

impl BitField {
    /// Mask covering the field's width, unshifted.
    pub fn mask(&self) -> u64 {
        width_mask(self.bits)
    }
}

/// Compiled bit-packed field set schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BitSchema {
    fields: Vec<BitField>,
    index: HashMap<String, usize>,
    total_bits: u32,
    repr: BitRepr,
}

/// Precomputed `(value, mask)` pair for O(1) multi-field matching.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Matcher {
    /// Expected bits under the mask
    pub value: Packed,
    /// Bits covered by the matched fields
    pub mask: Packed,
}

impl Matcher {
    /// `(packed & mask) == value`.
    #[inline]
    pub fn matches(&self, packed: &Packed) -> bool {
        packed.masked_eq(&self.mask, &self.value)
    }
}

impl BitSchema {
    /// Compiles a bit schema from field definitions in declaration order.
    ///
    /// # Returns
    /// `Err(SchemaError)` on duplicate names, empty schemas or widths outside 1..=64.
    pub fn new(defs: &[BitFieldDef]) -> Result<Self, SchemaError> {
        if defs.is_empty() {
            return Err(SchemaError::EmptySchema {
                name: "bits".to_string(),
            });
        }

        let mut fields = Vec::with_capacity(defs.len());
        let mut index = HashMap::with_capacity(defs.len());
        let mut offset: u32 = 0;

        for def in defs {
            if def.bits == 0 || def.bits > 64 {
                return Err(SchemaError::InvalidBitWidth {
                    field: def.name.clone(),
                    bits: def.bits,
                });
            }
            if index.insert(def.name.clone(), fields.len()).is_some() {
                return Err(SchemaError::DuplicateField {
                    schema: "bits".to_string(),
                    field: def.name.clone(),
                });
            }
            fields.push(BitField {
                name: def.name.clone(),
                offset,
                bits: def.bits,
            });
            offset = offset
                .checked_add(def.bits)
                .ok_or(SchemaError::CapacityOverflow {
                    operation: "bit offset calculation",
                })?;
        }

        Ok(Self {
            fields,
            index,
            total_bits: offset,
            repr: BitRepr::for_bits(offset),
        })
    }

    /// Convenience constructor from `(name, bits)` pairs.
    pub fn from_pairs(pairs: &[(&str, u32)]) -> Result<Self, SchemaError> {
        let defs: Vec<BitFieldDef> = pairs
            .iter()
            .map(|(name, bits)| BitFieldDef {
                name: (*name).to_string(),
                bits: *bits,
            })
            .collect();
        Self::new(&defs)
    }

    /// Fields in declaration order.
    pub fn fields(&self) -> &[BitField] {
        &self.fields
    }

    /// Looks up a field by name.
    pub fn field(&self, name: &str) -> Result<&BitField, ViewError> {
        self.index
            .get(name)
            .map(|&i| &self.fields[i])
            .ok_or_else(|| ViewError::FieldNotFound {
                layout: "bits".to_string(),
                field: name.to_string(),
            })
    }

    /// Sum of all field widths.
    pub fn total_bits(&self) -> u32 {
        self.total_bits
    }

    /// Bytes needed to store the set inside a record.
    pub fn byte_len(&self) -> usize {
        self.total_bits.div_ceil(8) as usize
    }

    /// Backing representation selected for this schema.
    pub fn repr(&self) -> BitRepr {
        self.repr
    }

    /// Builds a matcher for a partial assignment.
    ///
    /// Values are masked to their field widths, same as `BitSet::set`.
    pub fn matcher(&self, assignment: &[(&str, u64)]) -> Result<Matcher, ViewError> {
        let mut value = Packed::zeroed(self.repr);
        let mut mask = Packed::zeroed(self.repr);
        for (name, v) in assignment {
            let field = self.field(name)?;
            value.set(field.offset, field.bits, *v);
            mask.set(field.offset, field.bits, u64::MAX);
        }
        Ok(Matcher { value, mask })
    }

    /// Tests a packed word against a matcher.
    #[inline]
    pub fn is_match(packed: &Packed, matcher: &Matcher) -> bool {
        matcher.matches(packed)
    }

    /// Decodes a stored set into `{field: integer}`.
    pub fn decode_value(&self, bytes: &[u8]) -> Value {
        let packed = Packed::from_le_bytes(bytes, self.repr);
        let mut map = Map::with_capacity(self.fields.len());
        for field in &self.fields {
            map.insert(
                field.name.clone(),
                Value::from(packed.get(field.offset, field.bits)),
            );
        }
        Value::Object(map)
    }

    /// Encodes `{field: integer | bool}` into `out` (exactly `byte_len()` bytes).
    ///
    /// Every field must be present. Integers wrap to the field width;
    /// negative integers wrap as two's complement.
    pub fn encode_value(&self, out: &mut [u8], value: &Value) -> Result<(), ViewError> {
        let map = value.as_object().ok_or_else(|| mismatch("object", value))?;
        if let Some(unknown) = map.keys().find(|k| !self.index.contains_key(k.as_str())) {
            return Err(ViewError::FieldNotFound {
                layout: "bits".to_string(),
                field: unknown.clone(),
            });
        }

        let mut packed = Packed::zeroed(self.repr);
        for field in &self.fields {
            let v = map.get(&field.name).ok_or_else(|| ViewError::MissingValue {
                field: field.name.clone(),
            })?;
            packed.set(field.offset, field.bits, bit_value(v)?);
        }
        packed.write_le_bytes(out);
        Ok(())
    }
}

fn bit_value(value: &Value) -> Result<u64, ViewError> {
    match value {
        Value::Bool(b) => Ok(u64::from(*b)),
        Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_i64().map(|v| v as u64))
            .ok_or_else(|| mismatch("integer", value)),
        _ => Err(mismatch("integer", value)),
    }
}

/// A bit-packed value bound to its schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BitSet<'s> {
    schema: &'s BitSchema,
    packed: Packed,
}

impl<'s> BitSet<'s> {
    /// Creates an all-zero set.
    pub fn new(schema: &'s BitSchema) -> Self {
        Self {
            schema,
            packed: Packed::zeroed(schema.repr),
        }
    }

    /// Wraps existing packed storage.
    ///
    /// # Returns
    /// `Err(ViewError::TypeMismatch)` if the storage representation differs from the schema's.
    pub fn from_packed(schema: &'s BitSchema, packed: Packed) -> Result<Self, ViewError> {
        let matches_repr = match (&packed, schema.repr) {
            (Packed::Native(_), BitRepr::Native) => true,
            (Packed::Wide(words), BitRepr::Wide { words: n }) => words.len() == n,
            _ => false,
        };
        if !matches_repr {
            return Err(ViewError::TypeMismatch {
                field: "bits".to_string(),
                expected: format!("{:?}", schema.repr),
                got: format!("{:?}", packed),
            });
        }
        Ok(Self { schema, packed })
    }

    /// Loads a set from its little-endian byte form.
    pub fn from_bytes(schema: &'s BitSchema, bytes: &[u8]) -> Self {
        Self {
            schema,
            packed: Packed::from_le_bytes(bytes, schema.repr),
        }
    }

    /// Stores the set into its little-endian byte form (`byte_len()` bytes).
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = vec![0u8; self.schema.byte_len()];
        self.packed.write_le_bytes(&mut out);
        out
    }

    /// Returns the schema.
    pub fn schema(&self) -> &'s BitSchema {
        self.schema
    }

    /// Returns the packed storage.
    pub fn packed(&self) -> &Packed {
        &self.packed
    }

    /// Reads a field.
    pub fn get(&self, name: &str) -> Result<u64, ViewError> {
        let field = self.schema.field(name)?;
        Ok(self.packed.get(field.offset, field.bits))
    }

    /// Writes a field, keeping only the low `bits` bits of `value`.
    pub fn set(&mut self, name: &str, value: u64) -> Result<&mut Self, ViewError> {
        let field = self.schema.field(name)?;
        self.packed.set(field.offset, field.bits, value);
        Ok(self)
    }

    /// True iff every named field is nonzero.
    pub fn has(&self, names: &[&str]) -> Result<bool, ViewError> {
        for name in names {
            if self.get(name)? == 0 {
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// Tests the set against a matcher built from the same schema.
    #[inline]
    pub fn matches(&self, matcher: &Matcher) -> bool {
        matcher.matches(&self.packed)
    }

    /// Decodes into `{field: integer}`.
    pub fn to_json(&self) -> Value {
        self.schema.decode_value(&self.to_bytes())
    }
}
