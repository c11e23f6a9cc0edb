use std::{
    sync::Arc,
    time::{Duration, Instant, SystemTime},
};

use tracing::debug;

use super::{Clock, ReloadState, ReloadingStrategy, SystemClock, stat};
use crate::{error::ConfigError, source::ByteSource};

/// Default minimum time between two inspections of the source.
pub const DEFAULT_TRIGGER_INTERVAL: Duration = Duration::from_secs(5);

/// Reloads when the source's modification time moves forward.
///
/// The source is inspected at most once per trigger interval, however often
/// the store is read. Once a newer modification time has been seen, the
/// strategy reports a reload as owed until the store performs it.
#[derive(Debug)]
pub struct FileChangedReloadingStrategy {
    clock: Arc<dyn Clock>,
    trigger_interval: Duration,
    last_modified: Option<SystemTime>,
    last_checked: Option<Instant>,
    pending: bool,
    reloading: bool,
}

impl FileChangedReloadingStrategy {
    /// Creates a strategy with the default interval and the system clock.
    pub fn new() -> Self {
        Self {
            clock: Arc::new(SystemClock),
            trigger_interval: DEFAULT_TRIGGER_INTERVAL,
            last_modified: None,
            last_checked: None,
            pending: false,
            reloading: false,
        }
    }

    /// Sets the minimum time between two inspections of the source.
    ///
    /// A zero interval falls back to [`DEFAULT_TRIGGER_INTERVAL`].
    pub fn with_trigger_interval(mut self, interval: Duration) -> Self {
        self.trigger_interval = if interval.is_zero() {
            DEFAULT_TRIGGER_INTERVAL
        } else {
            interval
        };
        self
    }

    /// Replaces the clock that measures the trigger interval.
    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Arc::new(clock);
        self
    }

    /// Returns the trigger interval.
    pub fn trigger_interval(&self) -> Duration {
        self.trigger_interval
    }

    /// Returns the modification time recorded at the last baseline.
    pub fn last_modified(&self) -> Option<SystemTime> {
        self.last_modified
    }

    fn check_due(&self, now: Instant) -> bool {
        self.last_checked.is_none_or(|checked| {
            now.saturating_duration_since(checked) >= self.trigger_interval
        })
    }
}

impl Default for FileChangedReloadingStrategy {
    fn default() -> Self {
        Self::new()
    }
}

impl ReloadingStrategy for FileChangedReloadingStrategy {
    fn init(&mut self, source: &dyn ByteSource) -> Result<(), ConfigError> {
        let modified = stat(source)?;
        self.last_modified = Some(modified);
        self.last_checked = Some(self.clock.now());
        self.pending = false;
        self.reloading = false;
        Ok(())
    }

    fn need_reloading(&mut self, source: &dyn ByteSource) -> Result<bool, ConfigError> {
        if self.pending {
            return Ok(true);
        }
        if self.reloading {
            return Ok(false);
        }

        let now = self.clock.now();
        if !self.check_due(now) {
            return Ok(false);
        }

        let modified = stat(source)?;
        self.last_checked = Some(now);

        let changed = self.last_modified.is_none_or(|last| modified > last);
        if changed {
            debug!(locator = source.locator(), "Source modified since last load");
            self.pending = true;
        }
        Ok(changed)
    }

    fn reloading_started(&mut self) {
        self.pending = false;
        self.reloading = true;
    }

    fn reloading_performed(&mut self, source: &dyn ByteSource) -> Result<(), ConfigError> {
        self.pending = false;
        self.reloading = false;
        self.last_checked = Some(self.clock.now());
        self.last_modified = Some(stat(source)?);
        Ok(())
    }

    fn state(&self) -> ReloadState {
        if self.reloading {
            ReloadState::Reloading
        } else if self.pending {
            ReloadState::Stale
        } else if self.check_due(self.clock.now()) {
            ReloadState::CheckDue
        } else {
            ReloadState::Fresh
        }
    }
}
