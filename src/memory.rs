//! Agent Memory
//!
//! Durable key/value scratch space shared by the worker and the handler it
//! invokes. Backed by one JSON file holding `{"version": 1, "data": {...}}`.
//!
//! Every call re-reads the file; nothing is cached. Writes go to a uniquely
//! named sibling temporary file that is renamed over the target, so readers
//! always see a complete document. There is no locking: concurrent writers
//! race and the last rename wins.

use crate::error::StorageError;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{debug, warn};

/// Current on-disk format version.
pub const MEMORY_FORMAT_VERSION: u32 = 1;

#[derive(Debug, Serialize, Deserialize)]
struct MemoryDocument {
    version: u32,
    data: Map<String, Value>,
}

impl MemoryDocument {
    fn empty() -> Self {
        Self {
            version: MEMORY_FORMAT_VERSION,
            data: Map::new(),
        }
    }
}

/// File-backed key/value store.
#[derive(Debug, Clone)]
pub struct MemoryStore {
    path: PathBuf,
}

impl MemoryStore {
    /// Open the store, creating the backing file if it does not exist.
    ///
    /// An existing file is left untouched, even if it is corrupt.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let store = Self { path: path.into() };
        store.ensure()?;
        Ok(store)
    }

    fn ensure(&self) -> Result<(), StorageError> {
        if self.path.exists() {
            return Ok(());
        }
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        debug!(path = %self.path.display(), "Creating agent memory file");
        self.write(&MemoryDocument::empty())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the current document. Missing, unreadable or malformed files read
    /// as an empty store.
    fn read(&self) -> MemoryDocument {
        let text = match std::fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Agent memory unreadable, treating as empty");
                return MemoryDocument::empty();
            }
        };
        match serde_json::from_str::<Value>(&text) {
            Ok(Value::Object(mut root)) => match root.remove("data") {
                Some(Value::Object(data)) => MemoryDocument {
                    version: MEMORY_FORMAT_VERSION,
                    data,
                },
                _ => MemoryDocument::empty(),
            },
            Ok(_) | Err(_) => {
                warn!(path = %self.path.display(), "Agent memory is not a valid document, treating as empty");
                MemoryDocument::empty()
            }
        }
    }

    /// Write through a uniquely named sibling temp file, then rename it over
    /// the target. Concurrent writers each get their own temp file.
    fn write(&self, document: &MemoryDocument) -> Result<(), StorageError> {
        let json = serde_json::to_string_pretty(document)
            .map_err(|e| StorageError::Serialization(e.to_string()))?;
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let mut temp = NamedTempFile::new_in(dir)?;
        temp.write_all(json.as_bytes())?;
        temp.persist(&self.path).map_err(|e| StorageError::IoError(e.error))?;
        Ok(())
    }

    /// Value stored under `key`, or `None` if absent or the file is unreadable.
    pub fn get(&self, key: &str) -> Option<Value> {
        self.read().data.remove(key)
    }

    /// Store `value` under `key`, rewriting the whole file.
    pub fn set(&self, key: &str, value: Value) -> Result<(), StorageError> {
        let mut document = self.read();
        document.data.insert(key.to_string(), value);
        self.write(&document)
    }

    /// Delete `key`, returning its previous value.
    pub fn remove(&self, key: &str) -> Result<Option<Value>, StorageError> {
        let mut document = self.read();
        let previous = document.data.remove(key);
        if previous.is_some() {
            self.write(&document)?;
        }
        Ok(previous)
    }

    /// A copy of all stored entries.
    pub fn get_all(&self) -> Map<String, Value> {
        self.read().data
    }
}
