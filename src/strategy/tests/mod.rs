//! Unit tests for reload strategies
//! Time is driven by a manual clock; sources live in memory.

#![allow(clippy::panic, clippy::unwrap_used)]

use std::{
    io::{self, Read},
    sync::atomic::{AtomicBool, AtomicUsize, Ordering},
    time::{Duration, SystemTime},
};

use crate::{
    error::ConfigError,
    source::{ByteSource, MemorySource},
    strategy::{
        DEFAULT_TRIGGER_INTERVAL, FileChangedReloadingStrategy, ManagedReloadingStrategy,
        ManualClock, ReloadState, ReloadingStrategy,
    },
};

/// Counts stat calls and can be told to fail them.
#[derive(Debug)]
struct CountingSource {
    inner: MemorySource,
    stats: AtomicUsize,
    failing: AtomicBool,
}

impl CountingSource {
    fn new() -> Self {
        Self {
            inner: MemorySource::new("app.toml", "a = 1\n"),
            stats: AtomicUsize::new(0),
            failing: AtomicBool::new(false),
        }
    }

    fn stats(&self) -> usize {
        self.stats.load(Ordering::SeqCst)
    }
}

impl ByteSource for CountingSource {
    fn locator(&self) -> &str {
        self.inner.locator()
    }

    fn open_reader(&self) -> io::Result<Box<dyn Read + '_>> {
        self.inner.open_reader()
    }

    fn write_bytes(&self, bytes: &[u8]) -> io::Result<()> {
        self.inner.write_bytes(bytes)
    }

    fn modified(&self) -> io::Result<SystemTime> {
        self.stats.fetch_add(1, Ordering::SeqCst);
        if self.failing.load(Ordering::SeqCst) {
            return Err(io::Error::new(io::ErrorKind::NotFound, "gone"));
        }
        self.inner.modified()
    }
}

fn strategy(clock: &ManualClock) -> FileChangedReloadingStrategy {
    FileChangedReloadingStrategy::new()
        .with_trigger_interval(Duration::from_secs(5))
        .with_clock(clock.clone())
}

#[test]
fn default_interval_is_five_seconds() {
    let strategy = FileChangedReloadingStrategy::new();
    assert_eq!(strategy.trigger_interval(), DEFAULT_TRIGGER_INTERVAL);
    assert_eq!(
        FileChangedReloadingStrategy::new()
            .with_trigger_interval(Duration::ZERO)
            .trigger_interval(),
        Duration::from_secs(5)
    );
}

#[test]
fn init_records_baseline() {
    let clock = ManualClock::new();
    let source = CountingSource::new();
    let mut strategy = strategy(&clock);

    assert_eq!(strategy.state(), ReloadState::CheckDue);
    strategy.init(&source).unwrap();

    assert_eq!(strategy.state(), ReloadState::Fresh);
    assert_eq!(strategy.last_modified(), Some(source.inner.modified().unwrap()));
}

#[test]
fn debounce_skips_stat_inside_window() {
    let clock = ManualClock::new();
    let source = CountingSource::new();
    let mut strategy = strategy(&clock);
    strategy.init(&source).unwrap();
    let after_init = source.stats();

    for _ in 0..10 {
        clock.advance(Duration::from_millis(400));
        assert!(!strategy.need_reloading(&source).unwrap());
    }
    assert_eq!(source.stats(), after_init);
    assert_eq!(strategy.state(), ReloadState::Fresh);
}

#[test]
fn unchanged_source_returns_to_fresh() {
    let clock = ManualClock::new();
    let source = CountingSource::new();
    let mut strategy = strategy(&clock);
    strategy.init(&source).unwrap();

    clock.advance(Duration::from_secs(5));
    assert_eq!(strategy.state(), ReloadState::CheckDue);
    assert!(!strategy.need_reloading(&source).unwrap());
    assert_eq!(strategy.state(), ReloadState::Fresh);

    let stats = source.stats();
    clock.advance(Duration::from_secs(4));
    assert!(!strategy.need_reloading(&source).unwrap());
    assert_eq!(source.stats(), stats);
}

#[test]
fn newer_mtime_marks_stale_until_performed() {
    let clock = ManualClock::new();
    let source = CountingSource::new();
    let mut strategy = strategy(&clock);
    strategy.init(&source).unwrap();

    source.inner.replace("a = 2\n");
    clock.advance(Duration::from_secs(6));

    assert!(strategy.need_reloading(&source).unwrap());
    assert_eq!(strategy.state(), ReloadState::Stale);

    let stats = source.stats();
    assert!(strategy.need_reloading(&source).unwrap());
    assert_eq!(source.stats(), stats);

    strategy.reloading_started();
    assert_eq!(strategy.state(), ReloadState::Reloading);
    assert!(!strategy.need_reloading(&source).unwrap());

    strategy.reloading_performed(&source).unwrap();
    assert_eq!(strategy.state(), ReloadState::Fresh);
    assert_eq!(strategy.last_modified(), Some(source.inner.modified().unwrap()));

    clock.advance(Duration::from_secs(5));
    assert!(!strategy.need_reloading(&source).unwrap());
}

#[test]
fn older_mtime_is_not_a_change() {
    let clock = ManualClock::new();
    let source = CountingSource::new();
    let mut strategy = strategy(&clock);
    strategy.init(&source).unwrap();

    source
        .inner
        .set_modified(SystemTime::now() - Duration::from_secs(3600));
    clock.advance(Duration::from_secs(5));

    assert!(!strategy.need_reloading(&source).unwrap());
}

#[test]
fn stat_failure_leaves_state_unchanged() {
    let clock = ManualClock::new();
    let source = CountingSource::new();
    let mut strategy = strategy(&clock);
    strategy.init(&source).unwrap();
    let baseline = strategy.last_modified();

    source.failing.store(true, Ordering::SeqCst);
    clock.advance(Duration::from_secs(5));

    assert!(matches!(
        strategy.need_reloading(&source),
        Err(ConfigError::SourceIo {
            operation: "stat",
            ..
        })
    ));
    assert_eq!(strategy.state(), ReloadState::CheckDue);
    assert_eq!(strategy.last_modified(), baseline);

    source.failing.store(false, Ordering::SeqCst);
    assert!(!strategy.need_reloading(&source).unwrap());
    assert_eq!(strategy.state(), ReloadState::Fresh);
}

#[test]
fn performed_clears_pending_even_if_stat_fails() {
    let clock = ManualClock::new();
    let source = CountingSource::new();
    let mut strategy = strategy(&clock);
    strategy.init(&source).unwrap();

    source.inner.replace("a = 2\n");
    clock.advance(Duration::from_secs(5));
    assert!(strategy.need_reloading(&source).unwrap());

    strategy.reloading_started();
    source.failing.store(true, Ordering::SeqCst);
    assert!(strategy.reloading_performed(&source).is_err());
    assert_eq!(strategy.state(), ReloadState::Fresh);
}

#[test]
fn managed_reloads_only_on_request() {
    let source = MemorySource::new("app.toml", "");
    let mut strategy = ManagedReloadingStrategy::new();
    let handle = strategy.handle();

    strategy.init(&source).unwrap();
    assert!(!strategy.need_reloading(&source).unwrap());

    source.replace("a = 1\n");
    assert!(!strategy.need_reloading(&source).unwrap());

    handle.refresh();
    assert_eq!(strategy.state(), ReloadState::Stale);
    assert!(strategy.need_reloading(&source).unwrap());

    strategy.reloading_started();
    strategy.reloading_performed(&source).unwrap();
    assert_eq!(strategy.state(), ReloadState::Fresh);
    assert!(!handle.is_requested());
}

#[test]
fn managed_keeps_refresh_that_arrives_mid_reload() {
    let source = MemorySource::new("app.toml", "");
    let mut strategy = ManagedReloadingStrategy::new();

    strategy.refresh();
    strategy.reloading_started();
    strategy.handle().refresh();
    strategy.reloading_performed(&source).unwrap();

    assert_eq!(strategy.state(), ReloadState::Stale);
    assert!(strategy.need_reloading(&source).unwrap());
}
