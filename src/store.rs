//! Durable key-value storage for profile records
//!
//! Keys are short strings (`profile:driver1`, `current_profile`), values are
//! serialized text. The file-backed store keeps one file per key and replaces
//! files atomically so a failed write never corrupts the previous value.

use anyhow::{Context, Result};
use std::collections::HashMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};
use tracing::debug;

use crate::constants::storage::FILE_EXTENSION;

pub trait KeyValueStore: Send + Sync {
    /// Read the value under `key`, `None` if absent
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Replace the value under `key`
    fn put(&self, key: &str, value: &str) -> Result<()>;

    /// Whether a value exists under `key`
    fn contains(&self, key: &str) -> Result<bool> {
        Ok(self.get(key)?.is_some())
    }
}

/// One file per key inside a data directory
#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Store rooted at the platform data dir (`~/.local/share/driver-profiles`)
    pub fn default_location() -> Self {
        let mut path = dirs::data_dir().unwrap_or_else(|| PathBuf::from("."));
        path.push(crate::constants::config::APP_DIR);
        Self::new(path)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Map a key to its file, replacing characters that are not portable in file names
    fn path_for(&self, key: &str) -> PathBuf {
        let file_stem: String = key
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
            .collect();
        self.root.join(format!("{file_stem}.{FILE_EXTENSION}"))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let path = self.path_for(key);
        match fs::read_to_string(&path) {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e).with_context(|| format!("Failed to read {}", path.display())),
        }
    }

    fn put(&self, key: &str, value: &str) -> Result<()> {
        fs::create_dir_all(&self.root)
            .with_context(|| format!("Failed to create data directory {}", self.root.display()))?;

        let path = self.path_for(key);

        // Temp file in the same directory so the final rename stays on one filesystem
        let mut temp = tempfile::NamedTempFile::new_in(&self.root)
            .with_context(|| format!("Failed to create temp file in {}", self.root.display()))?;
        temp.write_all(value.as_bytes())
            .with_context(|| format!("Failed to write temp file for {}", path.display()))?;
        temp.as_file()
            .sync_all()
            .with_context(|| format!("Failed to sync temp file for {}", path.display()))?;
        temp.persist(&path)
            .with_context(|| format!("Failed to replace {}", path.display()))?;

        debug!(key, path = %path.display(), bytes = value.len(), "Wrote store entry");
        Ok(())
    }
}

/// Volatile store for tests and the demo host
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(entries.get(key).cloned())
    }

    fn put(&self, key: &str, value: &str) -> Result<()> {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_file_store_missing_key() {
        let dir = tempdir().unwrap();
        let store = FileStore::new(dir.path());
        assert_eq!(store.get("profile:driver1").unwrap(), None);
        assert!(!store.contains("profile:driver1").unwrap());
    }

    #[test]
    fn test_file_store_put_then_get() {
        let dir = tempdir().unwrap();
        let store = FileStore::new(dir.path().join("nested"));
        store.put("profile:driver1", "{\"a\":1}").unwrap();
        assert_eq!(store.get("profile:driver1").unwrap().as_deref(), Some("{\"a\":1}"));
        assert!(dir.path().join("nested").join("profile_driver1.json").exists());
    }

    #[test]
    fn test_file_store_overwrite_leaves_no_temp_files() {
        let dir = tempdir().unwrap();
        let store = FileStore::new(dir.path());
        store.put("current_profile", "driver1").unwrap();
        store.put("current_profile", "guest").unwrap();
        assert_eq!(store.get("current_profile").unwrap().as_deref(), Some("guest"));

        let files: Vec<_> = fs::read_dir(dir.path()).unwrap().collect();
        assert_eq!(files.len(), 1);
    }

    #[test]
    fn test_path_for_sanitizes_key() {
        let store = FileStore::new("/data");
        assert_eq!(store.path_for("profile:guest"), PathBuf::from("/data/profile_guest.json"));
        assert_eq!(store.path_for("../escape"), PathBuf::from("/data/___escape.json"));
    }

    #[test]
    fn test_memory_store() {
        let store = MemoryStore::new();
        assert!(store.is_empty());
        store.put("k", "v1").unwrap();
        store.put("k", "v2").unwrap();
        assert_eq!(store.get("k").unwrap().as_deref(), Some("v2"));
        assert_eq!(store.len(), 1);
    }
}
