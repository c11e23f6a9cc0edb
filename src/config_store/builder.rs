use std::{path::PathBuf, sync::Arc};

use url::Url;

use super::{ConfigStore, store::Inner};
use crate::{
    codec::{self, Codec, CodecRegistry, Decoder, Encoder},
    error::{ConfigError, Result},
    source::{ByteSource, FileSource, format_of},
    strategy::{FileChangedReloadingStrategy, ReloadingStrategy},
};

/// Options for opening a [`ConfigStore`].
///
/// Exactly one of [`path`](Self::path), [`url`](Self::url) or
/// [`source`](Self::source) must be given. The format defaults to the
/// extension of the source locator and the codec to the one registered for
/// that format.
#[derive(Default)]
pub struct ConfigStoreBuilder {
    path: Option<PathBuf>,
    url: Option<Url>,
    source: Option<Box<dyn ByteSource>>,
    format: Option<String>,
    codec: Option<Codec>,
    encoder: Option<Arc<dyn Encoder>>,
    decoder: Option<Arc<dyn Decoder>>,
    strategy: Option<Box<dyn ReloadingStrategy>>,
    registry: Option<CodecRegistry>,
}

impl ConfigStoreBuilder {
    /// Reads the document from a local file. The path must have an extension.
    pub fn path(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// Reads the document from a `file://` URL.
    pub fn url(mut self, url: Url) -> Self {
        self.url = Some(url);
        self
    }

    /// Reads the document from any byte source.
    pub fn source(mut self, source: impl ByteSource + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    /// Overrides the format derived from the locator.
    pub fn format(mut self, format: impl Into<String>) -> Self {
        self.format = Some(format.into());
        self
    }

    /// Uses `codec` instead of looking one up.
    pub fn codec(mut self, codec: Codec) -> Self {
        self.codec = Some(codec);
        self
    }

    /// Replaces the encoder half of the resolved codec.
    pub fn encoder(mut self, encoder: impl Encoder + 'static) -> Self {
        self.encoder = Some(Arc::new(encoder));
        self
    }

    /// Replaces the decoder half of the resolved codec.
    pub fn decoder(mut self, decoder: impl Decoder + 'static) -> Self {
        self.decoder = Some(Arc::new(decoder));
        self
    }

    /// Replaces the default [`FileChangedReloadingStrategy`].
    pub fn reloading_strategy(mut self, strategy: impl ReloadingStrategy + 'static) -> Self {
        self.strategy = Some(Box::new(strategy));
        self
    }

    /// Looks codecs up in `registry` instead of the process-wide one.
    pub fn registry(mut self, registry: CodecRegistry) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Validates the options, loads the document and records the reload baseline
    ///
    /// # Errors
    /// * `ConfigError::InvalidOptions` - If the source is missing, ambiguous,
    ///   or has no format
    /// * `ConfigError::UnsupportedFormat` - If no codec is registered for the
    ///   format and no complete override was given
    /// * `ConfigError::SourceIo` - If the source cannot be read or inspected
    /// * `ConfigError::Decode` - If the document is malformed
    pub fn open(mut self) -> Result<ConfigStore> {
        let source = self.resolve_source()?;

        let format = match self.format {
            Some(format) => format,
            None => source
                .format()
                .ok_or_else(|| ConfigError::InvalidOptions {
                    details: format!(
                        "cannot derive a format from '{}'; add an extension or set one",
                        source.locator()
                    ),
                })?,
        };

        let codec = resolve_codec(
            &format,
            self.codec,
            self.registry.as_ref(),
            self.encoder,
            self.decoder,
        )?;

        let strategy = self
            .strategy
            .unwrap_or_else(|| Box::new(FileChangedReloadingStrategy::new()));

        let store = ConfigStore::from_inner(Inner::new(source, codec, format, strategy));
        store.load()?;
        Ok(store)
    }

    fn resolve_source(&mut self) -> Result<Box<dyn ByteSource>> {
        match (self.path.take(), self.url.take(), self.source.take()) {
            (Some(path), None, None) => {
                let locator = path.display().to_string();
                if format_of(&locator).is_none() && self.format.is_none() {
                    return Err(ConfigError::InvalidOptions {
                        details: format!("file path '{locator}' has no extension"),
                    });
                }
                Ok(Box::new(FileSource::new(path)))
            }
            (None, Some(url), None) => Ok(Box::new(FileSource::from_url(&url)?)),
            (None, None, Some(source)) => Ok(source),
            (None, None, None) => Err(ConfigError::InvalidOptions {
                details: "no path, URL or source given".to_string(),
            }),
            _ => Err(ConfigError::InvalidOptions {
                details: "only one of path, URL or source may be given".to_string(),
            }),
        }
    }
}

fn resolve_codec(
    format: &str,
    explicit: Option<Codec>,
    registry: Option<&CodecRegistry>,
    encoder: Option<Arc<dyn Encoder>>,
    decoder: Option<Arc<dyn Decoder>>,
) -> Result<Codec> {
    let registered = explicit.or_else(|| match registry {
        Some(registry) => registry.lookup(format),
        None => codec::lookup(format),
    });

    let codec = match (registered, encoder, decoder) {
        (Some(codec), encoder, decoder) => {
            let codec = match encoder {
                Some(encoder) => codec.with_encoder(encoder),
                None => codec,
            };
            match decoder {
                Some(decoder) => codec.with_decoder(decoder),
                None => codec,
            }
        }
        (None, Some(encoder), Some(decoder)) => Codec::new(encoder, decoder),
        (None, _, _) => {
            return Err(ConfigError::UnsupportedFormat {
                format: format.to_string(),
            });
        }
    };

    Ok(codec)
}

impl ConfigStore {
    /// Starts building a store.
    pub fn builder() -> ConfigStoreBuilder {
        ConfigStoreBuilder::default()
    }

    /// Opens the document at `path` with the default codec and reload strategy
    ///
    /// # Errors
    /// See [`ConfigStoreBuilder::open`].
    pub fn open(path: impl Into<PathBuf>) -> Result<ConfigStore> {
        Self::builder().path(path).open()
    }
}
