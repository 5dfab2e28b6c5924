//! Persisted history stores
//!
//! A [`HistoryStore`] keeps one encoded snapshot sequence per document key.
//! It is process-wide state shared by every editor.

use crate::error::HistoryError;
use dashmap::DashMap;
use std::path::{Path, PathBuf};

/// Key-value store for encoded histories
pub trait HistoryStore: Send + Sync {
    /// Encoded history of a document
    fn read(&self, key: &str) -> Result<Option<String>, HistoryError>;

    /// Replace the encoded history of a document
    fn write(&self, key: &str, encoded: &str) -> Result<(), HistoryError>;

    /// Drop the history of a document
    fn remove(&self, key: &str) -> Result<(), HistoryError>;
}

/// In-memory store
#[derive(Debug, Default)]
pub struct MemoryHistoryStore {
    entries: DashMap<String, String>,
}

impl MemoryHistoryStore {
    /// Create empty store
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of documents with history
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if store is empty
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl HistoryStore for MemoryHistoryStore {
    fn read(&self, key: &str) -> Result<Option<String>, HistoryError> {
        Ok(self.entries.get(key).map(|e| e.value().clone()))
    }

    fn write(&self, key: &str, encoded: &str) -> Result<(), HistoryError> {
        self.entries.insert(key.to_string(), encoded.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), HistoryError> {
        self.entries.remove(key);
        Ok(())
    }
}

/// One JSON file per document under a directory
#[derive(Debug, Clone)]
pub struct FileHistoryStore {
    dir: PathBuf,
}

impl FileHistoryStore {
    /// Create store rooted at `dir`, creating it if needed
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self, HistoryError> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir).map_err(|e| HistoryError::io_error(&dir, e))?;
        Ok(Self { dir })
    }

    /// Root directory
    #[inline]
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// File holding the history of `key`
    #[must_use]
    pub fn path_for(&self, key: &str) -> PathBuf {
        let name: String = key
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
            .collect();
        self.dir.join(format!("{name}.json"))
    }
}

impl HistoryStore for FileHistoryStore {
    fn read(&self, key: &str) -> Result<Option<String>, HistoryError> {
        let path = self.path_for(key);
        match std::fs::read_to_string(&path) {
            Ok(encoded) => Ok(Some(encoded)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(HistoryError::io_error(path, e)),
        }
    }

    fn write(&self, key: &str, encoded: &str) -> Result<(), HistoryError> {
        let path = self.path_for(key);
        std::fs::write(&path, encoded).map_err(|e| HistoryError::io_error(path, e))
    }

    fn remove(&self, key: &str) -> Result<(), HistoryError> {
        let path = self.path_for(key);
        match std::fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(HistoryError::io_error(path, e)),
        }
    }
}
