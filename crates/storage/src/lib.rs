use std::{
    collections::BTreeMap,
    fs,
    path::{Path, PathBuf},
    sync::{PoisonError, RwLock},
};

use anyhow::{Context, Result};

/// Device-local string-keyed store backing anonymous and guest sessions.
///
/// Entries live in a single JSON object on disk and survive process
/// restarts until explicitly cleared. Reads and writes are synchronous;
/// every write is flushed to the file before returning.
pub struct LocalStore {
    path: PathBuf,
    entries: RwLock<BTreeMap<String, String>>,
}

impl LocalStore {
    /// Opens the store at `path`, loading any existing entries. A missing
    /// file is an empty store; it is created on first write.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let entries = if path.exists() {
            let raw = fs::read_to_string(&path)
                .with_context(|| format!("failed to read local store at {}", path.display()))?;
            serde_json::from_str(&raw)
                .with_context(|| format!("local store at {} is not valid JSON", path.display()))?
        } else {
            BTreeMap::new()
        };
        Ok(Self {
            path,
            entries: RwLock::new(entries),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn get(&self, key: &str) -> Option<String> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    pub fn set(&self, key: impl Into<String>, value: impl Into<String>) -> Result<()> {
        {
            let mut entries = self
                .entries
                .write()
                .unwrap_or_else(PoisonError::into_inner);
            entries.insert(key.into(), value.into());
        }
        self.flush()
    }

    pub fn remove(&self, key: &str) -> Result<()> {
        let removed = {
            let mut entries = self
                .entries
                .write()
                .unwrap_or_else(PoisonError::into_inner);
            entries.remove(key).is_some()
        };
        if removed {
            self.flush()?;
        }
        Ok(())
    }

    pub fn clear(&self) -> Result<()> {
        {
            let mut entries = self
                .entries
                .write()
                .unwrap_or_else(PoisonError::into_inner);
            entries.clear();
        }
        self.flush()
    }

    fn flush(&self) -> Result<()> {
        let serialized = {
            let entries = self
                .entries
                .read()
                .unwrap_or_else(PoisonError::into_inner);
            serde_json::to_string_pretty(&*entries).context("failed to serialize local store")?
        };
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).with_context(|| {
                    format!("failed to create local store directory {}", parent.display())
                })?;
            }
        }
        fs::write(&self.path, serialized)
            .with_context(|| format!("failed to write local store at {}", self.path.display()))
    }
}

#[cfg(test)]
#[path = "tests/local_store_tests.rs"]
mod tests;
