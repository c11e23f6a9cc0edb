use std::{fmt, path::PathBuf};

use thiserror::Error;

use crate::field::{FieldError, FieldKind};

/// Errors that can occur during configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Key resolution failed at some segment.
    #[error("config not found for key '{key}': {reason}")]
    KeyNotFound {
        /// The full key that was requested
        key: String,
        /// Why resolution stopped
        reason: LookupFailure,
    },

    /// The resolved field has a different kind than the accessor expects.
    #[error("field '{key}' is {actual}, not {expected}")]
    TypeMismatch {
        /// The requested key
        key: String,
        /// Kind the accessor checks against
        expected: FieldKind,
        /// Kind actually stored
        actual: FieldKind,
    },

    /// A narrowing accessor could not represent the stored value.
    #[error("field '{key}' value {value} does not fit in {target}")]
    OutOfRange {
        /// The requested key
        key: String,
        /// Stored value
        value: String,
        /// Target type name
        target: &'static str,
    },

    /// Source bytes could not be decoded into a field tree.
    #[error("failed to decode {format} document from '{locator}': {details}")]
    Decode {
        /// Format identifier of the codec
        format: String,
        /// Where the bytes came from
        locator: String,
        /// Decoder error details
        details: String,
    },

    /// The field tree could not be encoded.
    #[error("failed to encode {format} document: {details}")]
    Encode {
        /// Format identifier of the codec
        format: String,
        /// Encoder error details
        details: String,
    },

    /// Reading, writing or stat-ing the backing source failed.
    #[error("I/O error on '{locator}' during {operation}: {details}")]
    SourceIo {
        /// Source locator
        locator: String,
        /// The operation that failed (read, write, stat)
        operation: &'static str,
        /// I/O error details
        details: String,
    },

    /// No codec is registered for the format and no override was given.
    #[error("no codec registered for format '{format}'")]
    UnsupportedFormat {
        /// The format identifier
        format: String,
    },

    /// A value passed to `set` could not be classified.
    #[error("invalid value for '{key}': {source}")]
    InvalidValue {
        /// The key being set
        key: String,
        /// Classification failure
        source: FieldError,
    },

    /// A key that cannot be written.
    #[error("invalid key '{key}': {reason}")]
    InvalidKey {
        /// The rejected key
        key: String,
        /// Why it was rejected
        reason: &'static str,
    },

    /// Store options are inconsistent or incomplete.
    #[error("invalid store options: {details}")]
    InvalidOptions {
        /// What is wrong
        details: String,
    },

    /// A section view outlived the tree it was created from.
    #[error("section view '{path}' no longer refers to the loaded tree")]
    StaleView {
        /// Dotted path of the view
        path: String,
    },

    /// The operation replaces the whole tree and is only available on the root store.
    #[error("{operation} is not available on section view '{path}'")]
    UnsupportedOnView {
        /// The rejected operation
        operation: &'static str,
        /// Dotted path of the view
        path: String,
    },

    /// Error occurred while acquiring locks for thread-safe access
    #[error("failed to acquire {lock_type} lock: {details}")]
    LockError {
        /// Type of lock that failed (read, write, strategy)
        lock_type: &'static str,
        /// Lock error details
        details: String,
    },

    /// The default store was already installed.
    #[error("default configuration store is already initialized")]
    AlreadyInitialized,

    /// Failed to set up file notifications.
    #[error("failed to watch '{path}': {details}")]
    Watch {
        /// Path being watched
        path: PathBuf,
        /// Watcher error details
        details: String,
    },
}

/// Why a dotted key failed to resolve.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LookupFailure {
    /// No field is stored under the segment.
    Missing {
        /// The segment that was absent
        segment: String,
    },
    /// A non-terminal segment resolved to a field that is not a section.
    NotASection {
        /// The segment that is not a section
        segment: String,
        /// Its actual kind
        kind: FieldKind,
    },
}

impl fmt::Display for LookupFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LookupFailure::Missing { segment } => write!(f, "no field named '{segment}'"),
            LookupFailure::NotASection { segment, kind } => {
                write!(f, "'{segment}' is {kind}, not a section")
            }
        }
    }
}

/// A specialized `Result` type for configuration operations.
pub type Result<T> = std::result::Result<T, ConfigError>;

impl ConfigError {
    /// Returns true for `KeyNotFound`, the error the permissive helpers recover from.
    pub fn is_not_found(&self) -> bool {
        matches!(self, ConfigError::KeyNotFound { .. })
    }

    pub(crate) fn source_io(
        locator: impl Into<String>,
        operation: &'static str,
        error: impl fmt::Display,
    ) -> Self {
        ConfigError::SourceIo {
            locator: locator.into(),
            operation,
            details: error.to_string(),
        }
    }
}
