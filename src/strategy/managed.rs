use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};

use super::{ReloadState, ReloadingStrategy};
use crate::{error::ConfigError, source::ByteSource};

/// Requests a reload from outside the store.
///
/// Handles are cheap to clone and can be moved to other threads, such as a
/// [`SourceWatcher`](crate::config_store::SourceWatcher).
#[derive(Debug, Clone, Default)]
pub struct RefreshHandle {
    requested: Arc<AtomicBool>,
}

impl RefreshHandle {
    /// Asks for a reload on the store's next poll.
    pub fn refresh(&self) {
        self.requested.store(true, Ordering::SeqCst);
    }

    /// Returns true while a requested reload has not started.
    pub fn is_requested(&self) -> bool {
        self.requested.load(Ordering::SeqCst)
    }

    fn clear(&self) {
        self.requested.store(false, Ordering::SeqCst);
    }
}

/// Reloads only when asked to through [`refresh`](Self::refresh) or a
/// [`RefreshHandle`]. Never inspects the source.
#[derive(Debug, Default)]
pub struct ManagedReloadingStrategy {
    handle: RefreshHandle,
    reloading: bool,
}

impl ManagedReloadingStrategy {
    /// Creates a strategy with no reload requested.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a handle that requests reloads for this strategy.
    pub fn handle(&self) -> RefreshHandle {
        self.handle.clone()
    }

    /// Asks for a reload on the store's next poll.
    pub fn refresh(&self) {
        self.handle.refresh();
    }
}

impl ReloadingStrategy for ManagedReloadingStrategy {
    fn init(&mut self, _source: &dyn ByteSource) -> Result<(), ConfigError> {
        Ok(())
    }

    fn need_reloading(&mut self, _source: &dyn ByteSource) -> Result<bool, ConfigError> {
        Ok(self.handle.is_requested())
    }

    // Cleared here rather than after the reload, so a request that arrives
    // mid-reload triggers another one.
    fn reloading_started(&mut self) {
        self.handle.clear();
        self.reloading = true;
    }

    fn reloading_performed(&mut self, _source: &dyn ByteSource) -> Result<(), ConfigError> {
        self.reloading = false;
        Ok(())
    }

    fn state(&self) -> ReloadState {
        if self.reloading {
            ReloadState::Reloading
        } else if self.handle.is_requested() {
            ReloadState::Stale
        } else {
            ReloadState::Fresh
        }
    }
}
