//! Single-value storage slots backing the caches.
//!
//! A slot holds one serialized document. Interpretation (and recovery from
//! garbage) is the caller's job; a slot only moves bytes.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use crate::error::ContentError;

pub trait SlotStorage: Send + Sync {
    /// Current contents, `None` when the slot has never been written.
    ///
    /// # Errors
    ///
    /// Returns [`ContentError::Io`] when the backing store cannot be read.
    fn read(&self) -> Result<Option<String>, ContentError>;

    /// Replace the contents.
    ///
    /// # Errors
    ///
    /// Returns [`ContentError::Io`] when the backing store cannot be written.
    fn write(&self, contents: &str) -> Result<(), ContentError>;
}

/// File-backed slot. Writes go to a temp file in the same directory and
/// are renamed into place, so readers never see a half-written document.
#[derive(Debug, Clone)]
pub struct FileSlot {
    path: PathBuf,
}

impl FileSlot {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, source: std::io::Error) -> ContentError {
        ContentError::Io {
            path: self.path.display().to_string(),
            source,
        }
    }
}

impl SlotStorage for FileSlot {
    fn read(&self) -> Result<Option<String>, ContentError> {
        match std::fs::read_to_string(&self.path) {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(self.io_error(e)),
        }
    }

    fn write(&self, contents: &str) -> Result<(), ContentError> {
        let dir = match self.path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
            _ => PathBuf::from("."),
        };
        std::fs::create_dir_all(&dir).map_err(|e| self.io_error(e))?;

        let mut tmp = tempfile::NamedTempFile::new_in(&dir).map_err(|e| self.io_error(e))?;
        tmp.write_all(contents.as_bytes())
            .map_err(|e| self.io_error(e))?;
        tmp.persist(&self.path)
            .map_err(|e| self.io_error(e.error))?;
        Ok(())
    }
}

/// In-process slot for tests and for running without a cache directory.
#[derive(Debug, Default)]
pub struct MemorySlot {
    contents: Mutex<Option<String>>,
}

impl MemorySlot {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_contents(contents: &str) -> Self {
        Self {
            contents: Mutex::new(Some(contents.to_string())),
        }
    }
}

impl SlotStorage for MemorySlot {
    fn read(&self) -> Result<Option<String>, ContentError> {
        Ok(self
            .contents
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone())
    }

    fn write(&self, contents: &str) -> Result<(), ContentError> {
        *self.contents.lock().unwrap_or_else(PoisonError::into_inner) = Some(contents.to_string());
        Ok(())
    }
}
