//! UTF-8 byte-string view.
//!
//! A [`ByteString`] is a run of bytes tagged as UTF-8, either borrowed from a
//! record (zero-copy) or owned. The byte length is always known; the
//! character count is computed on first use by scanning lead bytes and
//! cached until the content changes.

use std::borrow::Cow;
use std::cell::Cell;
use std::fmt;
use std::hash::{Hash, Hasher};

use crate::codec::decode_text;
use crate::error::ViewError;

/// Borrowed or owned UTF-8 bytes with a lazily counted character size.
#[derive(Clone)]
pub struct ByteString<'a> {
    bytes: Cow<'a, [u8]>,
    size: Cell<Option<usize>>,
}

fn is_continuation(byte: u8) -> bool {
    byte & 0xC0 == 0x80
}

/// Byte length of the sequence introduced by a lead byte.
fn sequence_len(lead: u8) -> Option<usize> {
    match lead {
        0x00..=0x7F => Some(1),
        0xC2..=0xDF => Some(2),
        0xE0..=0xEF => Some(3),
        0xF0..=0xF4 => Some(4),
        _ => None,
    }
}

fn invalid_sequence(offset: usize) -> ViewError {
    ViewError::Decode {
        offset,
        reason: "invalid UTF-8 sequence".to_string(),
    }
}

/// Returns the character starting at `offset`.
///
/// Overlong forms, surrogates and code points above U+10FFFF are rejected.
fn char_run(bytes: &[u8], offset: usize) -> Result<&[u8], ViewError> {
    let width = sequence_len(bytes[offset]).ok_or_else(|| invalid_sequence(offset))?;
    let end = offset + width;
    if end > bytes.len() || std::str::from_utf8(&bytes[offset..end]).is_err() {
        return Err(invalid_sequence(offset));
    }
    Ok(&bytes[offset..end])
}

impl<'a> ByteString<'a> {
    /// Borrows a string's bytes.
    pub fn from_text(text: &'a str) -> Self {
        Self::from_bytes(text.as_bytes())
    }

    /// Wraps bytes without validating them.
    pub fn from_bytes(bytes: impl Into<Cow<'a, [u8]>>) -> Self {
        Self {
            bytes: bytes.into(),
            size: Cell::new(None),
        }
    }

    /// Byte length.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Whether the bytes are borrowed from elsewhere.
    pub fn is_borrowed(&self) -> bool {
        matches!(self.bytes, Cow::Borrowed(_))
    }

    /// Character count, computed once by counting lead bytes.
    pub fn size(&self) -> usize {
        if let Some(size) = self.size.get() {
            return size;
        }
        let size = self.bytes.iter().filter(|&&b| !is_continuation(b)).count();
        self.size.set(Some(size));
        size
    }

    /// Borrows the content as `&str`.
    ///
    /// # Returns
    /// `Err(ViewError::Decode)` if the bytes are not valid UTF-8.
    pub fn to_text(&self) -> Result<&str, ViewError> {
        decode_text(&self.bytes)
    }

    /// Byte run of the `index`-th character.
    ///
    /// # Returns
    /// `Ok(None)` past the last character, `Err(ViewError::Decode)` on a
    /// malformed sequence before it.
    pub fn char_at(&self, index: usize) -> Result<Option<&[u8]>, ViewError> {
        self.characters().nth(index).transpose()
    }

    /// Iterates characters as byte runs.
    ///
    /// Each call starts a fresh pass; the iterator stops after the first
    /// malformed sequence.
    pub fn characters(&self) -> Characters<'_> {
        Characters {
            bytes: &self.bytes,
            offset: 0,
            failed: false,
        }
    }

    /// Byte offset of the first occurrence of `needle` at or after `from`.
    pub fn search(&self, needle: &[u8], from: usize) -> Option<usize> {
        if from > self.bytes.len() {
            return None;
        }
        if needle.is_empty() {
            return Some(from);
        }
        self.bytes[from..]
            .windows(needle.len())
            .position(|window| window == needle)
            .map(|pos| pos + from)
    }

    /// Zero-copy slice of bytes `start..end`.
    ///
    /// # Returns
    /// `Err(ViewError::OutOfBounds)` for ranges outside the string,
    /// `Err(ViewError::Decode)` when a bound splits a character.
    pub fn substring(&self, start: usize, end: usize) -> Result<ByteString<'_>, ViewError> {
        if start > end || end > self.bytes.len() {
            return Err(ViewError::OutOfBounds {
                offset: start,
                len: end.saturating_sub(start),
                buffer_len: self.bytes.len(),
            });
        }
        for bound in [start, end] {
            if bound < self.bytes.len() && is_continuation(self.bytes[bound]) {
                return Err(ViewError::Decode {
                    offset: bound,
                    reason: "substring bound splits a character".to_string(),
                });
            }
        }
        Ok(ByteString::from_bytes(&self.bytes[start..end]))
    }

    /// New string with the first occurrence of `needle` replaced.
    pub fn replace(&self, needle: &[u8], replacement: &[u8]) -> ByteString<'static> {
        match self.search(needle, 0) {
            Some(at) if !needle.is_empty() => {
                let mut out = Vec::with_capacity(self.len() - needle.len() + replacement.len());
                out.extend_from_slice(&self.bytes[..at]);
                out.extend_from_slice(replacement);
                out.extend_from_slice(&self.bytes[at + needle.len()..]);
                ByteString::from_bytes(out)
            }
            _ => ByteString::from_bytes(self.bytes.to_vec()),
        }
    }

    /// New string with every non-overlapping occurrence of `needle` replaced.
    pub fn replace_all(&self, needle: &[u8], replacement: &[u8]) -> ByteString<'static> {
        if needle.is_empty() {
            return ByteString::from_bytes(self.bytes.to_vec());
        }
        let mut out = Vec::with_capacity(self.len());
        let mut from = 0;
        while let Some(at) = self.search(needle, from) {
            out.extend_from_slice(&self.bytes[from..at]);
            out.extend_from_slice(replacement);
            from = at + needle.len();
        }
        out.extend_from_slice(&self.bytes[from..]);
        ByteString::from_bytes(out)
    }

    /// Reverses the characters in place, keeping each multi-byte sequence
    /// in its original byte order.
    ///
    /// Borrowed content is copied on first mutation. Fails without changing
    /// anything if the content is not well-formed.
    pub fn reverse(&mut self) -> Result<&mut Self, ViewError> {
        let mut offset = 0;
        while offset < self.bytes.len() {
            offset += char_run(&self.bytes, offset)?.len();
        }

        let bytes = self.bytes.to_mut();
        bytes.reverse();
        let mut start = 0;
        while start < bytes.len() {
            if is_continuation(bytes[start]) {
                let mut lead = start;
                while is_continuation(bytes[lead]) {
                    lead += 1;
                }
                bytes[start..=lead].reverse();
                start = lead + 1;
            } else {
                start += 1;
            }
        }
        self.size.set(None);
        Ok(self)
    }

    /// Reverses the raw bytes in place. Multi-byte content becomes invalid UTF-8.
    pub fn reverse_bytes(&mut self) -> &mut Self {
        self.bytes.to_mut().reverse();
        self.size.set(None);
        self
    }

    /// Detaches from the source buffer.
    pub fn into_owned(self) -> ByteString<'static> {
        ByteString {
            bytes: Cow::Owned(self.bytes.into_owned()),
            size: self.size,
        }
    }
}

impl From<String> for ByteString<'static> {
    fn from(text: String) -> Self {
        ByteString::from_bytes(text.into_bytes())
    }
}

impl<'a> From<&'a str> for ByteString<'a> {
    fn from(text: &'a str) -> Self {
        ByteString::from_text(text)
    }
}

impl PartialEq for ByteString<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.bytes == other.bytes
    }
}

impl Eq for ByteString<'_> {}

impl Hash for ByteString<'_> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.bytes.hash(state);
    }
}

impl fmt::Debug for ByteString<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ByteString({:?})", String::from_utf8_lossy(&self.bytes))
    }
}

impl fmt::Display for ByteString<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&String::from_utf8_lossy(&self.bytes))
    }
}

/// Iterator over the characters of a [`ByteString`] as byte runs.
#[derive(Debug, Clone)]
pub struct Characters<'b> {
    bytes: &'b [u8],
    offset: usize,
    failed: bool,
}

impl<'b> Iterator for Characters<'b> {
    type Item = Result<&'b [u8], ViewError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed || self.offset >= self.bytes.len() {
            return None;
        }
        match char_run(self.bytes, self.offset) {
            Ok(run) => {
                self.offset += run.len();
                Some(Ok(run))
            }
            Err(e) => {
                self.failed = true;
                Some(Err(e))
            }
        }
    }
}

impl std::iter::FusedIterator for Characters<'_> {}
