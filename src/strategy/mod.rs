//! Reload decisions.
//!
//! A [`ReloadingStrategy`] answers one question for the root store on every
//! read: has the backing source changed enough to re-read it? The strategy
//! never holds the store or its source; the store passes its source into
//! every call.

mod clock;
mod file_changed;
mod managed;

#[cfg(test)]
mod tests;

use std::fmt;

use crate::{error::ConfigError, source::ByteSource};

pub use clock::{Clock, ManualClock, SystemClock};
pub use file_changed::{DEFAULT_TRIGGER_INTERVAL, FileChangedReloadingStrategy};
pub use managed::{ManagedReloadingStrategy, RefreshHandle};

/// Where a strategy is in its reload cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReloadState {
    /// No reload owed and the check window has not elapsed.
    Fresh,
    /// The check window elapsed; the next poll inspects the source.
    CheckDue,
    /// A change was observed and a reload is owed.
    Stale,
    /// A reload is in progress.
    Reloading,
}

impl fmt::Display for ReloadState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ReloadState::Fresh => "fresh",
            ReloadState::CheckDue => "check due",
            ReloadState::Stale => "stale",
            ReloadState::Reloading => "reloading",
        };
        f.write_str(name)
    }
}

/// Decides when a store re-reads its source.
///
/// The store calls [`init`](Self::init) once after the first load, polls
/// [`need_reloading`](Self::need_reloading) before reads, and brackets every
/// reload with [`reloading_started`](Self::reloading_started) and
/// [`reloading_performed`](Self::reloading_performed).
pub trait ReloadingStrategy: Send + fmt::Debug {
    /// Records the source's current state as the baseline.
    ///
    /// # Errors
    /// * `ConfigError::SourceIo` - If the source cannot be inspected
    fn init(&mut self, source: &dyn ByteSource) -> Result<(), ConfigError>;

    /// Returns true when a reload is owed.
    ///
    /// # Errors
    /// * `ConfigError::SourceIo` - If the source cannot be inspected; the
    ///   strategy's state is left unchanged
    fn need_reloading(&mut self, source: &dyn ByteSource) -> Result<bool, ConfigError>;

    /// Marks the owed reload as in progress.
    fn reloading_started(&mut self);

    /// Records a new baseline after a reload, successful or not.
    ///
    /// The pending reload is cleared even when the source cannot be inspected.
    ///
    /// # Errors
    /// * `ConfigError::SourceIo` - If the source cannot be inspected
    fn reloading_performed(&mut self, source: &dyn ByteSource) -> Result<(), ConfigError>;

    /// Returns the current state without touching the source.
    fn state(&self) -> ReloadState;
}

pub(crate) fn stat(source: &dyn ByteSource) -> Result<std::time::SystemTime, ConfigError> {
    source
        .modified()
        .map_err(|e| ConfigError::source_io(source.locator(), "stat", e))
}
