//! Process-wide default store.
//!
//! The default store is installed once, either explicitly with [`init`] or on
//! first use from the environment, and lives for the rest of the process.
//! Code that needs isolation, tests in particular, should open its own
//! [`ConfigStore`] instead.
//!
//! Only the most common reads have named wrappers here. Every other typed
//! read goes through [`get`], e.g. `global::get::<Vec<u64>>("ports")` or
//! `global::get::<i32>("retries")`.

use std::{
    env,
    sync::{Mutex, OnceLock},
    time::Duration,
};

use tracing::info;

use crate::{
    config_store::ConfigStore,
    error::{ConfigError, Result},
    field::{FromField, RawValue},
    strategy::FileChangedReloadingStrategy,
};

/// Environment variable naming the document the default store opens.
pub const CONFIG_PATH_ENV: &str = "CONFKIT_CONFIG";

/// Environment variable overriding the default store's trigger interval, in milliseconds.
pub const RELOAD_INTERVAL_ENV: &str = "CONFKIT_RELOAD_INTERVAL_MS";

/// Document opened when [`CONFIG_PATH_ENV`] is unset.
pub const DEFAULT_CONFIG_PATH: &str = "./config.toml";

static DEFAULT: OnceLock<ConfigStore> = OnceLock::new();
static INIT: Mutex<()> = Mutex::new(());

/// Installs `store` as the default store.
///
/// # Errors
/// * `ConfigError::AlreadyInitialized` - If a default store already exists
/// * `ConfigError::LockError` - If the initialization lock is poisoned
pub fn init(store: ConfigStore) -> Result<()> {
    let _guard = lock_init()?;
    DEFAULT
        .set(store)
        .map_err(|_| ConfigError::AlreadyInitialized)
}

/// Returns the default store, opening it from the environment on first use.
///
/// # Errors
/// * `ConfigError::LockError` - If the initialization lock is poisoned
/// * `ConfigError::InvalidOptions` - If [`RELOAD_INTERVAL_ENV`] is not a number
/// * Any error of [`ConfigStore::open`] for the configured path
pub fn default_store() -> Result<&'static ConfigStore> {
    if let Some(store) = DEFAULT.get() {
        return Ok(store);
    }

    let _guard = lock_init()?;
    if let Some(store) = DEFAULT.get() {
        return Ok(store);
    }

    let store = open_from_env()?;
    info!(locator = store.locator(), "Opened default configuration store");
    Ok(DEFAULT.get_or_init(|| store))
}

/// Returns true if `key` resolves in the default store.
///
/// Reads as absent if the default store cannot be opened.
pub fn contains_key(key: &str) -> bool {
    default_store().is_ok_and(|store| store.contains_key(key))
}

/// Reads `key` from the default store as any [`FromField`] type.
///
/// # Errors
/// See [`default_store`] and [`ConfigStore::get`].
pub fn get<T: FromField>(key: &str) -> Result<T> {
    default_store()?.get(key)
}

/// Reads a string from the default store.
///
/// # Errors
/// See [`default_store`] and [`ConfigStore::get`].
pub fn get_string(key: &str) -> Result<String> {
    get(key)
}

/// Returns a view of a section of the default store.
///
/// # Errors
/// See [`default_store`] and [`ConfigStore::get_section`].
pub fn get_section(key: &str) -> Result<ConfigStore> {
    default_store()?.get_section(key)
}

/// Sets a top-level value in the default store and saves it.
///
/// # Errors
/// See [`default_store`] and [`ConfigStore::set`].
pub fn set(key: &str, value: impl Into<RawValue>) -> Result<()> {
    default_store()?.set(key, value)
}

fn lock_init() -> Result<std::sync::MutexGuard<'static, ()>> {
    INIT.lock().map_err(|e| ConfigError::LockError {
        lock_type: "init",
        details: e.to_string(),
    })
}

fn open_from_env() -> Result<ConfigStore> {
    let path = env::var(CONFIG_PATH_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());

    let mut strategy = FileChangedReloadingStrategy::new();
    if let Ok(raw) = env::var(RELOAD_INTERVAL_ENV) {
        let millis: u64 = raw.trim().parse().map_err(|_| ConfigError::InvalidOptions {
            details: format!("{RELOAD_INTERVAL_ENV} must be a number of milliseconds, got '{raw}'"),
        })?;
        strategy = strategy.with_trigger_interval(Duration::from_millis(millis));
    }

    ConfigStore::builder()
        .path(path)
        .reloading_strategy(strategy)
        .open()
}
