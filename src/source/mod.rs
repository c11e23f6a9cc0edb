//! Byte sources a store reads its document from and saves it back to.
//!
//! A [`ByteSource`] knows nothing about formats: it hands out readers, accepts
//! whole documents to write, and reports when its contents last changed. The
//! store derives the document format from the extension in
//! [`ByteSource::locator`].

mod file;
mod memory;


use std::{
    fmt,
    io::{self, Read},
    path::Path,
    time::SystemTime,
};

pub use file::FileSource;
pub use memory::MemorySource;

/// Where a document lives.
pub trait ByteSource: Send + Sync + fmt::Debug {
    /// Human-readable location, such as a path or URL, whose extension names the format.
    fn locator(&self) -> &str;

    /// Opens a reader over the current contents.
    ///
    /// # Errors
    /// Returns the underlying I/O error if the contents cannot be opened.
    fn open_reader(&self) -> io::Result<Box<dyn Read + '_>>;

    /// Replaces the contents with `bytes`.
    ///
    /// # Errors
    /// Returns the underlying I/O error if the write does not complete.
    fn write_bytes(&self, bytes: &[u8]) -> io::Result<()>;

    /// Returns the time the contents last changed.
    ///
    /// # Errors
    /// Returns the underlying I/O error if the source cannot be inspected.
    fn modified(&self) -> io::Result<SystemTime>;

    /// Reads the whole contents into memory.
    ///
    /// # Errors
    /// Returns the underlying I/O error from opening or reading.
    fn read_all(&self) -> io::Result<Vec<u8>> {
        let mut bytes = Vec::new();
        self.open_reader()?.read_to_end(&mut bytes)?;
        Ok(bytes)
    }

    /// Format identifier taken from the locator's extension, lowercased.
    fn format(&self) -> Option<String> {
        format_of(self.locator())
    }

    /// Final component of the locator without its extension.
    fn file_name(&self) -> Option<&str> {
        Path::new(self.locator())
            .file_stem()
            .and_then(|name| name.to_str())
    }
}

pub(crate) fn format_of(locator: &str) -> Option<String> {
    Path::new(locator)
        .extension()
        .and_then(|ext| ext.to_str())
        .filter(|ext| !ext.is_empty())
        .map(str::to_ascii_lowercase)
}
