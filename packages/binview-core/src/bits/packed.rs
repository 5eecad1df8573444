//! Backing storage for bit-packed field sets.

/// Storage representation, chosen once per schema from its total width.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BitRepr {
    /// Total width fits one `u64`
    Native,
    /// Total width spills into this many `u64` words
    Wide { words: usize },
}

impl BitRepr {
    /// Picks the representation for a total bit width.
    pub fn for_bits(total_bits: u32) -> Self {
        if total_bits <= 64 {
            BitRepr::Native
        } else {
            BitRepr::Wide {
                words: total_bits.div_ceil(64) as usize,
            }
        }
    }
}

/// A packed bit word: a native `u64`, or a little-endian sequence of words
/// when the schema is wider than 64 bits. Both variants expose the same
/// bit-level operations.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Packed {
    Native(u64),
    Wide(Box<[u64]>),
}

#[inline]
pub(crate) fn width_mask(bits: u32) -> u64 {
    if bits >= 64 {
        u64::MAX
    } else {
        (1u64 << bits) - 1
    }
}

impl Packed {
    /// All-zero storage for the given representation.
    pub fn zeroed(repr: BitRepr) -> Self {
        match repr {
            BitRepr::Native => Packed::Native(0),
            BitRepr::Wide { words } => Packed::Wide(vec![0u64; words].into_boxed_slice()),
        }
    }

    /// Reads `bits` bits starting at bit `offset`.
    ///
    /// Caller must ensure the range lies within the storage and `bits <= 64`.
    #[inline]
    pub fn get(&self, offset: u32, bits: u32) -> u64 {
        let mask = width_mask(bits);
        match self {
            Packed::Native(word) => (word >> offset) & mask,
            Packed::Wide(words) => {
                let index = (offset / 64) as usize;
                let shift = offset % 64;
                let mut value = words[index] >> shift;
                if shift + bits > 64 {
                    value |= words[index + 1] << (64 - shift);
                }
                value & mask
            }
        }
    }

    /// Writes the low `bits` bits of `value` at bit `offset`; higher bits of
    /// `value` are discarded.
    #[inline]
    pub fn set(&mut self, offset: u32, bits: u32, value: u64) {
        let mask = width_mask(bits);
        let value = value & mask;
        match self {
            Packed::Native(word) => {
                *word = (*word & !(mask << offset)) | (value << offset);
            }
            Packed::Wide(words) => {
                let index = (offset / 64) as usize;
                let shift = offset % 64;
                words[index] = (words[index] & !(mask << shift)) | (value << shift);
                if shift + bits > 64 {
                    let spill = 64 - shift;
                    let high_mask = mask >> spill;
                    words[index + 1] = (words[index + 1] & !high_mask) | (value >> spill);
                }
            }
        }
    }

    /// `(self & mask) == value`, word by word.
    #[inline]
    pub fn masked_eq(&self, mask: &Packed, value: &Packed) -> bool {
        match (self, mask, value) {
            (Packed::Native(word), Packed::Native(mask), Packed::Native(value)) => {
                word & mask == *value
            }
            (Packed::Wide(words), Packed::Wide(mask), Packed::Wide(value)) => {
                words.len() == mask.len()
                    && words
                        .iter()
                        .zip(mask.iter())
                        .zip(value.iter())
                        .all(|((w, m), v)| w & m == *v)
            }
            _ => false,
        }
    }

    /// Loads storage from little-endian bytes.
    ///
    /// Missing trailing bytes read as zero.
    pub fn from_le_bytes(bytes: &[u8], repr: BitRepr) -> Self {
        let mut packed = Packed::zeroed(repr);
        match &mut packed {
            Packed::Native(word) => *word = load_word(bytes),
            Packed::Wide(words) => {
                for (word, chunk) in words.iter_mut().zip(bytes.chunks(8)) {
                    *word = load_word(chunk);
                }
            }
        }
        packed
    }

    /// Stores into little-endian bytes, writing exactly `out.len()` bytes.
    pub fn write_le_bytes(&self, out: &mut [u8]) {
        match self {
            Packed::Native(word) => store_word(*word, out),
            Packed::Wide(words) => {
                for (word, chunk) in words.iter().zip(out.chunks_mut(8)) {
                    store_word(*word, chunk);
                }
            }
        }
    }
}

fn load_word(bytes: &[u8]) -> u64 {
    let mut raw = [0u8; 8];
    let n = bytes.len().min(8);
    raw[..n].copy_from_slice(&bytes[..n]);
    u64::from_le_bytes(raw)
}

fn store_word(word: u64, out: &mut [u8]) {
    let raw = word.to_le_bytes();
    let n = out.len().min(8);
    out[..n].copy_from_slice(&raw[..n]);
}
