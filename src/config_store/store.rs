use std::{
    fmt,
    io::{Read, Write},
    sync::{Arc, Mutex, MutexGuard, RwLock, RwLockReadGuard, RwLockWriteGuard},
};

use tracing::{error, info, instrument, warn};

use super::path_ops;
use crate::{
    codec::Codec,
    error::{ConfigError, Result},
    field::{Field, FieldKind, FromField, RawValue, Section},
    source::ByteSource,
    strategy::{ReloadState, ReloadingStrategy},
};

const STREAM_LOCATOR: &str = "<stream>";

/// A thread-safe configuration store over one document.
///
/// The root store owns the loaded tree, the byte source it came from, the
/// codec for its format and the reload strategy. [`get_section`] returns a
/// view: another `ConfigStore` sharing the same tree, scoped to a nested
/// section. Cloning a store yields another handle to the same tree.
///
/// Every read on the root store first asks the reload strategy whether the
/// source changed, and re-reads it if so. Views never poll the source.
///
/// [`get_section`]: ConfigStore::get_section
#[derive(Clone)]
pub struct ConfigStore {
    inner: Arc<Inner>,
    path: Vec<String>,
    generation: u64,
}

pub(super) struct Inner {
    state: RwLock<State>,
    strategy: Mutex<Box<dyn ReloadingStrategy>>,
    source: Box<dyn ByteSource>,
    codec: Codec,
    format: String,
}

struct State {
    tree: Section,
    generation: u64,
}

impl State {
    fn replace(&mut self, tree: Section) {
        self.tree = tree;
        self.generation = self.generation.wrapping_add(1);
    }
}

impl Inner {
    pub(super) fn new(
        source: Box<dyn ByteSource>,
        codec: Codec,
        format: String,
        strategy: Box<dyn ReloadingStrategy>,
    ) -> Self {
        Self {
            state: RwLock::new(State {
                tree: Section::new(),
                generation: 0,
            }),
            strategy: Mutex::new(strategy),
            source,
            codec,
            format,
        }
    }

    fn read_source(&self) -> Result<Vec<u8>> {
        self.source
            .read_all()
            .map_err(|e| ConfigError::source_io(self.source.locator(), "read", e))
    }

    fn write_source(&self, bytes: &[u8]) -> Result<()> {
        self.source
            .write_bytes(bytes)
            .map_err(|e| ConfigError::source_io(self.source.locator(), "write", e))
    }

    fn decode(&self, bytes: &[u8], locator: &str) -> Result<Section> {
        self.codec
            .decode(bytes)
            .map_err(|e| ConfigError::Decode {
                format: self.format.clone(),
                locator: locator.to_string(),
                details: e.to_string(),
            })
    }

    fn encode(&self, tree: &Section) -> Result<Vec<u8>> {
        self.codec.encode(tree).map_err(|e| ConfigError::Encode {
            format: self.format.clone(),
            details: e.to_string(),
        })
    }

    fn fetch(&self) -> Result<Section> {
        let bytes = self.read_source()?;
        self.decode(&bytes, self.source.locator())
    }
}

impl ConfigStore {
    pub(super) fn from_inner(inner: Inner) -> Self {
        Self {
            inner: Arc::new(inner),
            path: Vec::new(),
            generation: 0,
        }
    }

    /// Re-reads the source and records a fresh reload baseline
    ///
    /// # Errors
    /// * `ConfigError::UnsupportedOnView` - If called on a section view
    /// * `ConfigError::SourceIo` - If the source cannot be read or inspected
    /// * `ConfigError::Decode` - If the document is malformed; the current tree is kept
    /// * `ConfigError::LockError` - If a lock is poisoned
    #[instrument(skip(self), fields(locator = self.locator()))]
    pub fn load(&self) -> Result<()> {
        self.ensure_root("load")?;

        let mut state = self.write_state()?;
        let mut strategy = self.lock_strategy()?;

        let tree = self.inner.fetch()?;
        state.replace(tree);
        strategy.init(self.inner.source.as_ref())?;

        info!("Loaded configuration");
        Ok(())
    }

    /// Decodes `bytes` with the store's codec and replaces the tree
    ///
    /// The tree is swapped only after decoding succeeds. The reload baseline
    /// is left alone since the bytes did not come from the source.
    ///
    /// # Errors
    /// * `ConfigError::UnsupportedOnView` - If called on a section view
    /// * `ConfigError::Decode` - If the bytes are malformed
    /// * `ConfigError::LockError` - If the write lock is poisoned
    pub fn load_bytes(&self, bytes: &[u8]) -> Result<()> {
        self.ensure_root("load_bytes")?;

        let tree = self.inner.decode(bytes, STREAM_LOCATOR)?;
        self.write_state()?.replace(tree);
        Ok(())
    }

    /// Reads `reader` to the end, then behaves like [`load_bytes`](Self::load_bytes)
    ///
    /// # Errors
    /// * `ConfigError::SourceIo` - If the reader fails
    /// * See [`load_bytes`](Self::load_bytes)
    pub fn load_stream(&self, mut reader: impl Read) -> Result<()> {
        self.ensure_root("load_stream")?;

        let mut bytes = Vec::new();
        reader
            .read_to_end(&mut bytes)
            .map_err(|e| ConfigError::source_io(STREAM_LOCATOR, "read", e))?;
        self.load_bytes(&bytes)
    }

    /// Re-reads and re-decodes the source unconditionally
    ///
    /// The reload is bracketed by the strategy, so its baseline is reset even
    /// when decoding fails.
    ///
    /// # Errors
    /// * `ConfigError::UnsupportedOnView` - If called on a section view
    /// * `ConfigError::SourceIo` - If the source cannot be read or inspected
    /// * `ConfigError::Decode` - If the document is malformed; the current tree is kept
    /// * `ConfigError::LockError` - If a lock is poisoned
    #[instrument(skip(self), fields(locator = self.locator()))]
    pub fn reload(&self) -> Result<()> {
        self.ensure_root("reload")?;

        let mut state = self.write_state()?;
        let mut strategy = self.lock_strategy()?;

        strategy.reloading_started();
        let fetched = self.inner.fetch();
        let baseline = strategy.reloading_performed(self.inner.source.as_ref());

        state.replace(fetched?);
        baseline?;

        info!("Reloaded configuration");
        Ok(())
    }

    /// Reloads if the strategy says the source changed
    ///
    /// Does nothing on section views. Failures to inspect the source are
    /// logged and treated as "no reload". A failed reload keeps the current
    /// tree and is logged; the strategy is re-baselined so the store does not
    /// retry until the source changes again.
    ///
    /// # Errors
    /// * `ConfigError::LockError` - If a lock is poisoned
    pub fn reload_if_needed(&self) -> Result<()> {
        if !self.is_root() {
            return Ok(());
        }

        let due = {
            let mut strategy = self.lock_strategy()?;
            match strategy.need_reloading(self.inner.source.as_ref()) {
                Ok(due) => due,
                Err(e) => {
                    warn!(error = %e, "Staleness check failed, keeping current configuration");
                    false
                }
            }
        };

        if !due {
            return Ok(());
        }

        let mut state = self.write_state()?;
        let mut strategy = self.lock_strategy()?;

        // Another caller may have reloaded while we waited for the lock.
        if strategy.state() != ReloadState::Stale {
            return Ok(());
        }

        strategy.reloading_started();
        match self.inner.fetch() {
            Ok(tree) => {
                state.replace(tree);
                info!(locator = self.locator(), "Reloaded modified configuration");
            }
            Err(e) => {
                error!(
                    locator = self.locator(),
                    error = %e,
                    "Reload failed, keeping previous configuration"
                );
            }
        }

        if let Err(e) = strategy.reloading_performed(self.inner.source.as_ref()) {
            warn!(error = %e, "Failed to record reload baseline");
        }

        Ok(())
    }

    /// Sets a top-level value in this store's section and saves the document
    ///
    /// On a view, the key is created in the view's section. The source is
    /// written before returning; if that fails the previous value is restored.
    ///
    /// # Arguments
    /// * `key` - A single key; dotted keys are rejected
    /// * `value` - Anything convertible to a [`RawValue`]
    ///
    /// # Errors
    /// * `ConfigError::InvalidKey` - If the key is empty or contains `.`
    /// * `ConfigError::InvalidValue` - If the value cannot be classified
    /// * `ConfigError::StaleView` - If this view no longer matches the tree
    /// * `ConfigError::Encode` - If the document cannot be encoded
    /// * `ConfigError::SourceIo` - If the source cannot be written
    /// * `ConfigError::LockError` - If a lock is poisoned
    #[instrument(skip(self, value), fields(locator = self.locator(), view = %self.view_path()))]
    pub fn set(&self, key: &str, value: impl Into<RawValue>) -> Result<()> {
        validate_key(key)?;

        let field = Field::classify(value.into()).map_err(|source| ConfigError::InvalidValue {
            key: key.to_string(),
            source,
        })?;

        self.reload_if_needed()?;

        let mut state = self.write_state()?;
        self.check_generation(&state)?;

        let section = path_ops::section_at_mut(&mut state.tree, &self.path)
            .ok_or_else(|| self.stale_view())?;
        let previous = section.insert(key.to_string(), field);

        let saved = self
            .inner
            .encode(&state.tree)
            .and_then(|bytes| self.inner.write_source(&bytes));

        if let Err(e) = saved {
            if let Some(section) = path_ops::section_at_mut(&mut state.tree, &self.path) {
                match previous {
                    Some(old) => section.insert(key.to_string(), old),
                    None => section.remove(key),
                };
            }
            return Err(e);
        }

        self.rebaseline()?;

        info!(key, "Saved configuration value");
        Ok(())
    }

    /// Encodes the whole document and writes it to the source
    ///
    /// # Errors
    /// * `ConfigError::Encode` - If the document cannot be encoded
    /// * `ConfigError::SourceIo` - If the source cannot be written
    /// * `ConfigError::LockError` - If a lock is poisoned
    pub fn save(&self) -> Result<()> {
        let state = self.read_state()?;
        let bytes = self.inner.encode(&state.tree)?;
        self.inner.write_source(&bytes)?;
        self.rebaseline()?;

        info!(locator = self.locator(), "Saved configuration");
        Ok(())
    }

    /// Encodes the whole document and writes it to another source
    ///
    /// # Errors
    /// * `ConfigError::Encode` - If the document cannot be encoded
    /// * `ConfigError::SourceIo` - If `target` cannot be written
    /// * `ConfigError::LockError` - If the read lock is poisoned
    pub fn save_to(&self, target: &dyn ByteSource) -> Result<()> {
        let bytes = self.encode_document()?;
        target
            .write_bytes(&bytes)
            .map_err(|e| ConfigError::source_io(target.locator(), "write", e))
    }

    /// Encodes the whole document into `writer`
    ///
    /// # Errors
    /// * `ConfigError::Encode` - If the document cannot be encoded
    /// * `ConfigError::SourceIo` - If the writer fails
    /// * `ConfigError::LockError` - If the read lock is poisoned
    pub fn save_stream(&self, mut writer: impl Write) -> Result<()> {
        let bytes = self.encode_document()?;
        writer
            .write_all(&bytes)
            .and_then(|()| writer.flush())
            .map_err(|e| ConfigError::source_io(STREAM_LOCATOR, "write", e))
    }

    /// Returns a view scoped to the section under `key`
    ///
    /// The view shares this store's tree; nothing is copied. It stays valid
    /// until the root replaces the whole tree, after which it fails with
    /// `ConfigError::StaleView`.
    ///
    /// # Errors
    /// * `ConfigError::KeyNotFound` - If the key does not resolve
    /// * `ConfigError::TypeMismatch` - If the key resolves to a non-section
    /// * `ConfigError::StaleView` - If this store is itself a stale view
    /// * `ConfigError::LockError` - If a lock is poisoned
    pub fn get_section(&self, key: &str) -> Result<ConfigStore> {
        self.reload_if_needed()?;

        let state = self.read_state()?;
        let field = self.resolve(&state, key)?;
        if field.as_section().is_none() {
            return Err(ConfigError::TypeMismatch {
                key: key.to_string(),
                expected: FieldKind::Section,
                actual: field.kind(),
            });
        }

        let mut path = self.path.clone();
        path.extend(key.split('.').map(str::to_string));

        Ok(ConfigStore {
            inner: Arc::clone(&self.inner),
            path,
            generation: state.generation,
        })
    }

    /// Returns true if `key` resolves in this store's section
    ///
    /// Any failure, including a stale view, reads as absent.
    pub fn contains_key(&self, key: &str) -> bool {
        if self.reload_if_needed().is_err() {
            return false;
        }
        let Ok(state) = self.read_state() else {
            return false;
        };
        self.scope(&state)
            .is_ok_and(|section| path_ops::contains_key(section, key))
    }

    /// Reads the value under `key` as `T`
    ///
    /// # Errors
    /// * `ConfigError::KeyNotFound` - If the key does not resolve
    /// * `ConfigError::TypeMismatch` - If the field has another kind
    /// * `ConfigError::OutOfRange` - If a narrowing conversion loses the value
    /// * `ConfigError::StaleView` - If this view no longer matches the tree
    /// * `ConfigError::LockError` - If a lock is poisoned
    pub fn get<T: FromField>(&self, key: &str) -> Result<T> {
        self.reload_if_needed()?;

        let state = self.read_state()?;
        let field = self.resolve(&state, key)?;
        T::from_field(key, field)
    }

    /// Like [`get`](Self::get), but returns `default` when the key is missing
    ///
    /// # Errors
    /// Every error of [`get`](Self::get) except `ConfigError::KeyNotFound`.
    pub fn get_or<T: FromField>(&self, key: &str, default: T) -> Result<T> {
        match self.get(key) {
            Err(e) if e.is_not_found() => Ok(default),
            other => other,
        }
    }

    /// Returns a copy of the raw field under `key`
    ///
    /// # Errors
    /// Same as [`get`](Self::get), without kind checks.
    pub fn get_field(&self, key: &str) -> Result<Field> {
        self.get(key)
    }

    /// Returns a copy of this store's section
    ///
    /// # Errors
    /// * `ConfigError::StaleView` - If this view no longer matches the tree
    /// * `ConfigError::LockError` - If a lock is poisoned
    pub fn snapshot(&self) -> Result<Section> {
        self.reload_if_needed()?;

        let state = self.read_state()?;
        self.scope(&state).cloned()
    }

    /// Format identifier of the store's codec
    pub fn format(&self) -> &str {
        &self.inner.format
    }

    /// Locator of the backing source
    pub fn locator(&self) -> &str {
        self.inner.source.locator()
    }

    /// Final component of the source locator without its extension
    pub fn file_name(&self) -> Option<&str> {
        self.inner.source.file_name()
    }

    /// Nesting depth: 0 for the root, one more per [`get_section`](Self::get_section)
    pub fn depth(&self) -> usize {
        self.path.len()
    }

    /// Dotted path of this view, empty for the root
    pub fn view_path(&self) -> String {
        self.path.join(".")
    }

    /// Current state of the reload strategy
    ///
    /// # Errors
    /// * `ConfigError::LockError` - If the strategy lock is poisoned
    pub fn reload_state(&self) -> Result<ReloadState> {
        Ok(self.lock_strategy()?.state())
    }

    fn is_root(&self) -> bool {
        self.path.is_empty()
    }

    fn ensure_root(&self, operation: &'static str) -> Result<()> {
        if self.is_root() {
            return Ok(());
        }
        Err(ConfigError::UnsupportedOnView {
            operation,
            path: self.view_path(),
        })
    }

    fn stale_view(&self) -> ConfigError {
        ConfigError::StaleView {
            path: self.view_path(),
        }
    }

    fn check_generation(&self, state: &State) -> Result<()> {
        if self.is_root() || state.generation == self.generation {
            return Ok(());
        }
        Err(self.stale_view())
    }

    fn scope<'a>(&self, state: &'a State) -> Result<&'a Section> {
        self.check_generation(state)?;
        path_ops::section_at(&state.tree, &self.path).ok_or_else(|| self.stale_view())
    }

    fn resolve<'a>(&self, state: &'a State, key: &str) -> Result<&'a Field> {
        let section = self.scope(state)?;
        path_ops::resolve(section, key).map_err(|reason| ConfigError::KeyNotFound {
            key: key.to_string(),
            reason,
        })
    }

    fn encode_document(&self) -> Result<Vec<u8>> {
        let state = self.read_state()?;
        self.inner.encode(&state.tree)
    }

    // Our own write must not look like an external change.
    fn rebaseline(&self) -> Result<()> {
        let mut strategy = self.lock_strategy()?;
        if let Err(e) = strategy.reloading_performed(self.inner.source.as_ref()) {
            warn!(error = %e, "Failed to record reload baseline after save");
        }
        Ok(())
    }

    fn read_state(&self) -> Result<RwLockReadGuard<'_, State>> {
        self.inner.state.read().map_err(|e| ConfigError::LockError {
            lock_type: "read",
            details: e.to_string(),
        })
    }

    fn write_state(&self) -> Result<RwLockWriteGuard<'_, State>> {
        self.inner.state.write().map_err(|e| ConfigError::LockError {
            lock_type: "write",
            details: e.to_string(),
        })
    }

    fn lock_strategy(&self) -> Result<MutexGuard<'_, Box<dyn ReloadingStrategy>>> {
        self.inner.strategy.lock().map_err(|e| ConfigError::LockError {
            lock_type: "strategy",
            details: e.to_string(),
        })
    }
}

fn validate_key(key: &str) -> Result<()> {
    let reason = if key.is_empty() {
        "key is empty"
    } else if key.contains('.') {
        "only top-level keys can be set; use get_section for nested sections"
    } else {
        return Ok(());
    };

    Err(ConfigError::InvalidKey {
        key: key.to_string(),
        reason,
    })
}

impl fmt::Debug for ConfigStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConfigStore")
            .field("locator", &self.locator())
            .field("format", &self.format())
            .field("view", &self.view_path())
            .finish_non_exhaustive()
    }
}
