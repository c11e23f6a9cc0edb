//! Confkit - embeddable configuration store with typed access and polled reload.
//!
//! A [`ConfigStore`] loads a TOML or YAML document from a byte source,
//! classifies every value into a typed [`Field`], and answers dotted-key
//! lookups such as `servers.alpha.ip` through type-checked accessors. Before
//! each read the store asks its reload strategy whether the source changed,
//! and re-reads it when it did.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use confkit::ConfigStore;
//!
//! # fn main() -> confkit::Result<()> {
//! let store = ConfigStore::open("config.toml")?;
//!
//! let ip = store.get_string("servers.alpha.ip")?;
//! let port = store.get_or("servers.alpha.port", 8080_u32)?;
//!
//! let alpha = store.get_section("servers.alpha")?;
//! alpha.set("ip", "10.0.0.2")?;
//! # let _ = (ip, port);
//! # Ok(())
//! # }
//! ```

/// Document codecs and the format registry.
pub mod codec;

/// Thread-safe configuration store over one document.
pub mod config_store;

/// Error types and result alias.
pub mod error;

/// Typed configuration values.
pub mod field;

/// Process-wide default store.
pub mod global;

/// Byte sources a store reads from and saves to.
pub mod source;

/// Reload decisions.
pub mod strategy;

/// Logging setup for applications embedding the store.
pub mod tracing_config;

pub use codec::{Codec, CodecError, CodecRegistry, Decoder, Encoder};
pub use config_store::{ConfigStore, ConfigStoreBuilder, SourceWatcher};
pub use error::{ConfigError, LookupFailure, Result};
pub use field::{Field, FieldError, FieldKind, FromField, RawValue, Section, Timestamp};
pub use source::{ByteSource, FileSource, MemorySource};
pub use strategy::{
    FileChangedReloadingStrategy, ManagedReloadingStrategy, RefreshHandle, ReloadState,
    ReloadingStrategy,
};
