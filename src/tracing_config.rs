//! Logging setup for applications embedding the store.
//!
//! The store itself only emits `tracing` events; installing a subscriber is
//! left to the application. These helpers install the usual one.

use std::{env, error::Error, path::Path};

use tracing_appender::rolling::{Builder, Rotation};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Environment variable selecting `json` or `pretty` console output.
pub const LOG_FORMAT_ENV: &str = "CONFKIT_LOG_FORMAT";

const DAYS_TO_KEEP: usize = 7;

/// Console output style.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Multi-line human readable output.
    #[default]
    Pretty,
    /// One JSON object per event.
    Json,
}

impl LogFormat {
    /// Reads the format from [`LOG_FORMAT_ENV`]; anything but `json` is pretty.
    pub fn from_env() -> Self {
        match env::var(LOG_FORMAT_ENV).as_deref() {
            Ok("json") => LogFormat::Json,
            _ => LogFormat::Pretty,
        }
    }
}

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Installs a console subscriber
///
/// Filters with `RUST_LOG`, defaulting to `info`, and formats according to
/// [`LogFormat::from_env`].
///
/// # Errors
/// Returns error if a global subscriber is already installed
pub fn init() -> Result<(), Box<dyn Error>> {
    let registry = tracing_subscriber::registry().with(env_filter());

    match LogFormat::from_env() {
        LogFormat::Json => registry
            .with(fmt::layer().json().with_target(true).with_level(true))
            .try_init()?,
        LogFormat::Pretty => registry
            .with(fmt::layer().pretty().with_target(true).with_thread_ids(true))
            .try_init()?,
    }

    Ok(())
}

/// Installs a console subscriber plus a daily rolling file in `log_dir`
///
/// Files are named `confkit.<date>.log` and kept for a week. The file layer
/// is always compact (or JSON when [`LogFormat::Json`] is selected) and never
/// colored.
///
/// # Errors
/// Returns error if the log directory cannot be used or a global subscriber
/// is already installed
pub fn init_with_file(log_dir: impl AsRef<Path>) -> Result<(), Box<dyn Error>> {
    let appender = Builder::new()
        .rotation(Rotation::DAILY)
        .max_log_files(DAYS_TO_KEEP)
        .filename_prefix("confkit")
        .filename_suffix("log")
        .build(log_dir.as_ref())?;
    let (file_writer, guard) = tracing_appender::non_blocking(appender);

    let registry = tracing_subscriber::registry().with(env_filter());

    match LogFormat::from_env() {
        LogFormat::Json => registry
            .with(fmt::layer().json().with_writer(std::io::stdout))
            .with(
                fmt::layer()
                    .json()
                    .with_writer(file_writer)
                    .with_ansi(false),
            )
            .try_init()?,
        LogFormat::Pretty => registry
            .with(fmt::layer().pretty().with_writer(std::io::stdout))
            .with(
                fmt::layer()
                    .compact()
                    .with_writer(file_writer)
                    .with_ansi(false),
            )
            .try_init()?,
    }

    // Dropping the guard stops the background writer.
    std::mem::forget(guard);

    Ok(())
}
