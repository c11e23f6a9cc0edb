use std::{
    io::{self, Cursor, Read},
    sync::{Arc, Mutex, MutexGuard},
    time::{Duration, SystemTime},
};

use super::ByteSource;

/// An in-memory document.
///
/// Clones share the same buffer, so a test can keep one handle to edit the
/// document while a store reads through another.
#[derive(Debug, Clone)]
pub struct MemorySource {
    locator: String,
    state: Arc<Mutex<MemoryState>>,
}

#[derive(Debug)]
struct MemoryState {
    bytes: Vec<u8>,
    modified: SystemTime,
}

impl MemorySource {
    /// Creates a source named `locator` holding `bytes`.
    ///
    /// The locator only needs an extension naming the format, e.g. `"app.toml"`.
    pub fn new(locator: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            locator: locator.into(),
            state: Arc::new(Mutex::new(MemoryState {
                bytes: bytes.into(),
                modified: SystemTime::now(),
            })),
        }
    }

    /// Returns a copy of the current contents.
    pub fn contents(&self) -> Vec<u8> {
        self.lock().bytes.clone()
    }

    /// Replaces the contents and advances the modification time.
    pub fn replace(&self, bytes: impl Into<Vec<u8>>) {
        let mut state = self.lock();
        state.bytes = bytes.into();
        state.modified = advance(state.modified);
    }

    /// Overrides the modification time.
    pub fn set_modified(&self, modified: SystemTime) {
        self.lock().modified = modified;
    }

    // Nothing panics while the lock is held, so a poisoned guard is still consistent.
    fn lock(&self) -> MutexGuard<'_, MemoryState> {
        self.state
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

// Each write must be observable as a strictly newer modification time.
fn advance(previous: SystemTime) -> SystemTime {
    let now = SystemTime::now();
    if now > previous {
        now
    } else {
        previous + Duration::from_nanos(1)
    }
}

impl ByteSource for MemorySource {
    fn locator(&self) -> &str {
        &self.locator
    }

    fn open_reader(&self) -> io::Result<Box<dyn Read + '_>> {
        Ok(Box::new(Cursor::new(self.contents())))
    }

    fn write_bytes(&self, bytes: &[u8]) -> io::Result<()> {
        self.replace(bytes);
        Ok(())
    }

    fn modified(&self) -> io::Result<SystemTime> {
        Ok(self.lock().modified)
    }
}
