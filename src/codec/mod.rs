//! Document codecs and the format registry.
//!
//! A [`Codec`] pairs an [`Encoder`] with a [`Decoder`] for one document
//! format. Codecs are registered under a format identifier, which the store
//! derives from the source's file extension.

mod toml_codec;
mod yaml_codec;

#[cfg(test)]
mod tests;

use std::{
    collections::HashMap,
    fmt,
    sync::{Arc, LazyLock, RwLock},
};

use crate::field::{FieldError, Section};

pub use toml_codec::TomlCodec;
pub use yaml_codec::YamlCodec;

/// Errors raised at the codec boundary.
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    /// The bytes are not a valid document.
    #[error("{0}")]
    Syntax(String),

    /// The document root is not a key/value mapping.
    #[error("document root must be a mapping, found {0}")]
    NotAMapping(&'static str),

    /// A decoded value has no field kind.
    #[error(transparent)]
    Field(#[from] FieldError),

    /// The tree could not be written in this format.
    #[error("{0}")]
    Serialize(String),
}

/// Turns raw document bytes into a fully classified field tree.
pub trait Decoder: Send + Sync {
    /// Decodes a whole document in one pass.
    ///
    /// # Errors
    /// Returns `CodecError` if the bytes are malformed or hold unsupported values.
    fn decode(&self, bytes: &[u8]) -> Result<Section, CodecError>;
}

/// Turns a field tree into document bytes.
///
/// Decoding the output must reproduce an equal tree, up to key order.
pub trait Encoder: Send + Sync {
    /// Encodes a whole tree.
    ///
    /// # Errors
    /// Returns `CodecError` if the tree cannot be represented in this format.
    fn encode(&self, tree: &Section) -> Result<Vec<u8>, CodecError>;
}

/// An encoder/decoder pair for one format.
#[derive(Clone)]
pub struct Codec {
    encoder: Arc<dyn Encoder>,
    decoder: Arc<dyn Decoder>,
}

impl Codec {
    /// Pairs a separate encoder and decoder.
    pub fn new(encoder: Arc<dyn Encoder>, decoder: Arc<dyn Decoder>) -> Self {
        Self { encoder, decoder }
    }

    /// Uses one value as both encoder and decoder.
    pub fn from_pair<C>(codec: C) -> Self
    where
        C: Encoder + Decoder + 'static,
    {
        let codec = Arc::new(codec);
        Self {
            encoder: codec.clone(),
            decoder: codec,
        }
    }

    /// Returns the encoder half.
    pub fn encoder(&self) -> &Arc<dyn Encoder> {
        &self.encoder
    }

    /// Returns the decoder half.
    pub fn decoder(&self) -> &Arc<dyn Decoder> {
        &self.decoder
    }

    /// Decodes with the decoder half.
    ///
    /// # Errors
    /// Propagates the decoder's `CodecError`.
    pub fn decode(&self, bytes: &[u8]) -> Result<Section, CodecError> {
        self.decoder.decode(bytes)
    }

    /// Encodes with the encoder half.
    ///
    /// # Errors
    /// Propagates the encoder's `CodecError`.
    pub fn encode(&self, tree: &Section) -> Result<Vec<u8>, CodecError> {
        self.encoder.encode(tree)
    }

    /// Replaces the encoder half.
    pub fn with_encoder(mut self, encoder: Arc<dyn Encoder>) -> Self {
        self.encoder = encoder;
        self
    }

    /// Replaces the decoder half.
    pub fn with_decoder(mut self, decoder: Arc<dyn Decoder>) -> Self {
        self.decoder = decoder;
        self
    }
}

impl fmt::Debug for Codec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Codec").finish_non_exhaustive()
    }
}

/// Format identifier to codec mapping.
#[derive(Debug, Clone)]
pub struct CodecRegistry {
    codecs: HashMap<String, Codec>,
}

impl CodecRegistry {
    /// Creates a registry with no formats.
    pub fn empty() -> Self {
        Self {
            codecs: HashMap::new(),
        }
    }

    /// Registers `codec` under `format`, replacing any earlier registration.
    pub fn register(&mut self, format: impl Into<String>, codec: Codec) {
        self.codecs.insert(format.into(), codec);
    }

    /// Returns true if a codec is registered for `format`.
    pub fn supports(&self, format: &str) -> bool {
        self.codecs.contains_key(format)
    }

    /// Looks up the codec registered for `format`.
    pub fn lookup(&self, format: &str) -> Option<Codec> {
        self.codecs.get(format).cloned()
    }

    /// Lists the registered format identifiers.
    pub fn formats(&self) -> Vec<String> {
        let mut formats: Vec<String> = self.codecs.keys().cloned().collect();
        formats.sort();
        formats
    }
}

/// The built-in formats: `toml`, `yml` and `yaml`.
impl Default for CodecRegistry {
    fn default() -> Self {
        let mut registry = Self::empty();
        let yaml = Codec::from_pair(YamlCodec);
        registry.register("toml", Codec::from_pair(TomlCodec));
        registry.register("yml", yaml.clone());
        registry.register("yaml", yaml);
        registry
    }
}

static REGISTRY: LazyLock<RwLock<CodecRegistry>> =
    LazyLock::new(|| RwLock::new(CodecRegistry::default()));

/// Registers a codec in the process-wide registry used by stores that are
/// not given their own.
///
/// Meant to be called during initialization; stores opened earlier keep the
/// codec they resolved.
pub fn register(format: impl Into<String>, codec: Codec) {
    let mut registry = match REGISTRY.write() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    };
    registry.register(format, codec);
}

/// Returns true if the process-wide registry knows `format`.
pub fn supports(format: &str) -> bool {
    with_registry(|registry| registry.supports(format))
}

/// Looks up `format` in the process-wide registry.
pub fn lookup(format: &str) -> Option<Codec> {
    with_registry(|registry| registry.lookup(format))
}

/// Returns a copy of the process-wide registry.
pub fn snapshot() -> CodecRegistry {
    with_registry(CodecRegistry::clone)
}

fn with_registry<R>(f: impl FnOnce(&CodecRegistry) -> R) -> R {
    match REGISTRY.read() {
        Ok(guard) => f(&guard),
        Err(poisoned) => f(&poisoned.into_inner()),
    }
}
