use std::{
    ffi::OsString,
    fs::{self, File},
    io::{self, BufReader, Read},
    path::{Path, PathBuf},
    time::SystemTime,
};

use url::Url;

use super::ByteSource;
use crate::error::ConfigError;

/// A document on the local file system.
///
/// Writes go to a sibling temporary file that is then renamed over the
/// target, so readers never observe a half-written document.
#[derive(Debug, Clone)]
pub struct FileSource {
    path: PathBuf,
    locator: String,
}

impl FileSource {
    /// Creates a source for `path`. The file does not need to exist yet.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let locator = path.display().to_string();
        Self { path, locator }
    }

    /// Creates a source from a `file://` URL.
    ///
    /// # Errors
    /// * `ConfigError::InvalidOptions` - If the URL is not a local file URL
    pub fn from_url(url: &Url) -> Result<Self, ConfigError> {
        if url.scheme() != "file" {
            return Err(ConfigError::InvalidOptions {
                details: format!("unsupported URL scheme '{}' in '{url}'", url.scheme()),
            });
        }

        let path = url
            .to_file_path()
            .map_err(|()| ConfigError::InvalidOptions {
                details: format!("'{url}' does not name a local file"),
            })?;

        Ok(Self {
            path,
            locator: url.to_string(),
        })
    }

    /// Returns the file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(OsString::from)
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

impl ByteSource for FileSource {
    fn locator(&self) -> &str {
        &self.locator
    }

    fn open_reader(&self) -> io::Result<Box<dyn Read + '_>> {
        let file = File::open(&self.path)?;
        Ok(Box::new(BufReader::new(file)))
    }

    fn write_bytes(&self, bytes: &[u8]) -> io::Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let temp_path = self.temp_path();
        fs::write(&temp_path, bytes)?;
        fs::rename(&temp_path, &self.path)
    }

    fn modified(&self) -> io::Result<SystemTime> {
        fs::metadata(&self.path)?.modified()
    }
}
