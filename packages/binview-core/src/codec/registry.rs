use std::collections::HashMap;
use std::sync::RwLock;

use super::builtin::register_builtin_codecs;
use super::codec::Codec;
use crate::error::SchemaError;

/// Registry of codecs keyed by kind tag.
///
/// Stores registered codecs with lookup by kind.
/// Provides thread-safe registration and retrieval.
#[derive(Debug, Default)]
pub struct CodecRegistry {
    codecs: RwLock<HashMap<String, Codec>>,
}

impl CodecRegistry {
    /// Creates a new empty codec registry.
    pub fn new() -> Self {
        Self {
            codecs: RwLock::new(HashMap::new()),
        }
    }

    /// Creates a registry holding the built-in integer, float, bool and text codecs.
    pub fn with_builtins() -> Result<Self, SchemaError> {
        let registry = Self::new();
        register_builtin_codecs(&registry)?;
        Ok(registry)
    }

    /// Registers a codec.
    ///
    /// # Arguments
    /// * `codec` - Codec to register
    ///
    /// # Returns
    /// `Ok(())` if successful, `Err(SchemaError)` if the kind is already registered or invalid.
    pub fn register(&self, codec: Codec) -> Result<(), SchemaError> {
        codec.validate()?;

        let mut codecs = self.codecs.write().map_err(|_| SchemaError::LockPoisoned)?;

        if codecs.contains_key(&codec.kind) {
            return Err(SchemaError::DuplicateKind {
                kind: codec.kind.clone(),
            });
        }

        tracing::trace!(kind = %codec.kind, width = ?codec.width, "registered codec");
        codecs.insert(codec.kind.clone(), codec);
        Ok(())
    }

    /// Retrieves a codec by kind.
    ///
    /// # Returns
    /// `Some(Codec)` if found, `None` otherwise.
    pub fn get(&self, kind: &str) -> Option<Codec> {
        let codecs = self.codecs.read().ok()?;
        codecs.get(kind).cloned()
    }

    /// Checks if a kind is registered.
    pub fn contains(&self, kind: &str) -> bool {
        match self.codecs.read() {
            Ok(guard) => guard.contains_key(kind),
            Err(_) => false,
        }
    }

    /// Returns all registered kinds, sorted.
    pub fn kinds(&self) -> Vec<String> {
        let codecs = match self.codecs.read() {
            Ok(guard) => guard,
            Err(_) => return Vec::new(),
        };
        let mut kinds: Vec<String> = codecs.keys().cloned().collect();
        kinds.sort();
        kinds
    }

    /// Removes a codec.
    ///
    /// Layouts already compiled keep their own copy of the codec.
    ///
    /// # Returns
    /// `true` if the codec was removed, `false` if it wasn't found.
    pub fn remove(&self, kind: &str) -> bool {
        let mut codecs = match self.codecs.write() {
            Ok(guard) => guard,
            Err(_) => return false,
        };
        codecs.remove(kind).is_some()
    }
}
