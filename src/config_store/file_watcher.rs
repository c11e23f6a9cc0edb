use std::{
    fmt,
    path::{Path, PathBuf},
};

use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher, recommended_watcher};
use tracing::debug;

use crate::{error::ConfigError, strategy::RefreshHandle};

/// Requests a reload whenever the watched file is created, modified or removed.
///
/// Pair it with a [`ManagedReloadingStrategy`](crate::strategy::ManagedReloadingStrategy):
/// the watcher only flips the strategy's refresh flag, and the store still
/// reloads on its next read. Watching stops when the watcher is dropped.
///
/// The parent directory is watched rather than the file itself, so the watch
/// survives editors and [`FileSource`](crate::source::FileSource) replacing
/// the file by rename.
pub struct SourceWatcher {
    _watcher: RecommendedWatcher,
    path: PathBuf,
}

impl SourceWatcher {
    /// Starts watching `path`.
    ///
    /// # Arguments
    /// * `path` - Path to an existing file
    /// * `handle` - Refresh handle of the store's managed strategy
    ///
    /// # Errors
    /// * `ConfigError::Watch` - If the path cannot be canonicalized or the
    ///   platform watcher cannot be started
    pub fn new(path: impl AsRef<Path>, handle: RefreshHandle) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let watch_error = |details: String| ConfigError::Watch {
            path: path.to_path_buf(),
            details,
        };

        let canonical = path.canonicalize().map_err(|e| watch_error(e.to_string()))?;
        let directory = canonical
            .parent()
            .map(Path::to_path_buf)
            .ok_or_else(|| watch_error("file has no parent directory".to_string()))?;

        let target = canonical.clone();
        let mut watcher = recommended_watcher(move |res: notify::Result<Event>| {
            let Ok(event) = res else {
                return;
            };

            if !matches!(
                event.kind,
                EventKind::Create(_) | EventKind::Modify(_) | EventKind::Remove(_)
            ) {
                return;
            }

            if event.paths.iter().any(|changed| changed == &target) {
                debug!(path = %target.display(), "Watched file changed, requesting reload");
                handle.refresh();
            }
        })
        .map_err(|e| watch_error(e.to_string()))?;

        watcher
            .watch(&directory, RecursiveMode::NonRecursive)
            .map_err(|e| watch_error(e.to_string()))?;

        Ok(Self {
            _watcher: watcher,
            path: canonical,
        })
    }

    /// The canonical path being watched.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl fmt::Debug for SourceWatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SourceWatcher")
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}
