//! Key-value stores
//!
//! Two stores back the application state:
//! - `FileStore`: durable, one file per key, survives restarts
//! - `MemoryStore`: ephemeral, lives as long as the session that owns it
//!
//! Values are JSON-encoded text. Writes to `FileStore` are atomic
//! (write to temp file, then rename) so a value is never half-written.

use std::collections::HashMap;
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tracing::debug;

use super::error::{StorageError, StorageResult};

/// String-keyed store of text values
pub trait KeyValueStore {
    /// Read a value, `None` if the key was never written
    fn get(&self, key: &str) -> StorageResult<Option<String>>;

    /// Write a value, replacing any previous one
    fn set(&mut self, key: &str, value: &str) -> StorageResult<()>;

    /// Remove a value; removing a missing key is not an error
    fn remove(&mut self, key: &str) -> StorageResult<()>;

    /// Write several values that belong together
    ///
    /// Stores with a size limit check the whole batch before writing any
    /// of it.
    fn set_many(&mut self, entries: &[(&str, String)]) -> StorageResult<()> {
        for (key, value) in entries {
            self.set(key, value)?;
        }
        Ok(())
    }
}

/// Durable store keeping each key in `<dir>/<key>.json`
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
    /// Maximum total bytes across all keys
    quota: Option<u64>,
}

impl FileStore {
    /// Open a store rooted at `dir`, creating the directory if needed
    pub fn open(dir: impl Into<PathBuf>) -> StorageResult<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(|source| StorageError::CreateDirectory {
            path: dir.clone(),
            source,
        })?;
        Ok(Self { dir, quota: None })
    }

    /// Limit the total size of stored values
    ///
    /// A quota of zero disables the limit.
    pub fn with_quota(mut self, quota: u64) -> Self {
        self.quota = (quota > 0).then_some(quota);
        self
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Total bytes currently stored
    pub fn used_bytes(&self) -> StorageResult<u64> {
        self.used_bytes_except(&[])
    }

    fn used_bytes_except(&self, skip: &[PathBuf]) -> StorageResult<u64> {
        let entries = fs::read_dir(&self.dir).map_err(|source| StorageError::ReadError {
            path: self.dir.clone(),
            source,
        })?;

        let mut total = 0;
        for entry in entries.flatten() {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            if skip.contains(&path) {
                continue;
            }
            if let Ok(meta) = entry.metadata() {
                total += meta.len();
            }
        }
        Ok(total)
    }

    /// Fail if replacing `paths` with `bytes` of new content would exceed the quota
    fn check_quota(&self, key: &str, paths: &[PathBuf], bytes: u64) -> StorageResult<()> {
        let Some(quota) = self.quota else {
            return Ok(());
        };
        let needed = self.used_bytes_except(paths)? + bytes;
        if needed > quota {
            return Err(StorageError::QuotaExceeded {
                key: key.to_string(),
                needed,
                quota,
            });
        }
        Ok(())
    }

    fn path_for(&self, key: &str) -> StorageResult<PathBuf> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
        if !valid {
            return Err(StorageError::InvalidKey(key.to_string()));
        }
        Ok(self.dir.join(format!("{}.json", key)))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> StorageResult<Option<String>> {
        let path = self.path_for(key)?;
        match fs::read_to_string(&path) {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(source) => Err(StorageError::ReadError { path, source }),
        }
    }

    fn set(&mut self, key: &str, value: &str) -> StorageResult<()> {
        let path = self.path_for(key)?;
        self.check_quota(key, std::slice::from_ref(&path), value.len() as u64)?;

        atomic_write(&path, value.as_bytes())?;
        debug!(key, bytes = value.len(), "stored value");
        Ok(())
    }

    fn set_many(&mut self, entries: &[(&str, String)]) -> StorageResult<()> {
        let paths = entries
            .iter()
            .map(|(key, _)| self.path_for(key))
            .collect::<StorageResult<Vec<_>>>()?;
        let bytes: u64 = entries.iter().map(|(_, value)| value.len() as u64).sum();
        let keys: Vec<&str> = entries.iter().map(|(key, _)| *key).collect();
        self.check_quota(&keys.join(","), &paths, bytes)?;

        for ((key, value), path) in entries.iter().zip(&paths) {
            atomic_write(path, value.as_bytes())?;
            debug!(key, bytes = value.len(), "stored value");
        }
        Ok(())
    }

    fn remove(&mut self, key: &str) -> StorageResult<()> {
        let path = self.path_for(key)?;
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StorageError::from_io(e, path)),
        }
    }
}

/// Ephemeral store held in memory
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    values: HashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> StorageResult<Option<String>> {
        Ok(self.values.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> StorageResult<()> {
        self.values.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> StorageResult<()> {
        self.values.remove(key);
        Ok(())
    }
}

/// Write data to a file atomically
///
/// 1. Write to a temporary file in the same directory
/// 2. Sync the file to disk
/// 3. Rename the temp file to the target path
fn atomic_write(path: &Path, data: &[u8]) -> StorageResult<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|source| StorageError::CreateDirectory {
            path: parent.to_path_buf(),
            source,
        })?;
    }

    let temp_path = path.with_extension("tmp");

    let mut file =
        File::create(&temp_path).map_err(|e| StorageError::from_io(e, temp_path.clone()))?;
    file.write_all(data)
        .map_err(|e| StorageError::from_io(e, temp_path.clone()))?;
    file.sync_all()
        .map_err(|e| StorageError::from_io(e, temp_path.clone()))?;

    fs::rename(&temp_path, path).map_err(|source| StorageError::AtomicWriteFailed {
        from: temp_path.clone(),
        to: path.to_path_buf(),
        source,
    })?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_file_store_roundtrip() {
        let temp_dir = TempDir::new().unwrap();
        let mut store = FileStore::open(temp_dir.path()).unwrap();

        assert_eq!(store.get("quotes").unwrap(), None);

        store.set("quotes", "[1,2,3]").unwrap();
        assert_eq!(store.get("quotes").unwrap().as_deref(), Some("[1,2,3]"));
        assert!(temp_dir.path().join("quotes.json").exists());

        store.set("quotes", "[]").unwrap();
        assert_eq!(store.get("quotes").unwrap().as_deref(), Some("[]"));
    }

    #[test]
    fn test_file_store_persists_across_instances() {
        let temp_dir = TempDir::new().unwrap();
        {
            let mut store = FileStore::open(temp_dir.path()).unwrap();
            store.set("lastFilter", "Life").unwrap();
        }
        let store = FileStore::open(temp_dir.path()).unwrap();
        assert_eq!(store.get("lastFilter").unwrap().as_deref(), Some("Life"));
    }

    #[test]
    fn test_file_store_remove() {
        let temp_dir = TempDir::new().unwrap();
        let mut store = FileStore::open(temp_dir.path()).unwrap();

        store.set("lastFilter", "Life").unwrap();
        store.remove("lastFilter").unwrap();
        assert_eq!(store.get("lastFilter").unwrap(), None);

        // Removing again is fine
        store.remove("lastFilter").unwrap();
    }

    #[test]
    fn test_file_store_creates_nested_dir() {
        let temp_dir = TempDir::new().unwrap();
        let dir = temp_dir.path().join("a").join("b");
        let mut store = FileStore::open(&dir).unwrap();
        store.set("k", "v").unwrap();
        assert!(dir.join("k.json").exists());
    }

    #[test]
    fn test_file_store_rejects_bad_keys() {
        let temp_dir = TempDir::new().unwrap();
        let mut store = FileStore::open(temp_dir.path()).unwrap();

        assert!(matches!(
            store.set("../escape", "x"),
            Err(StorageError::InvalidKey(_))
        ));
        assert!(matches!(store.get(""), Err(StorageError::InvalidKey(_))));
    }

    #[test]
    fn test_file_store_quota() {
        let temp_dir = TempDir::new().unwrap();
        let mut store = FileStore::open(temp_dir.path()).unwrap().with_quota(10);

        store.set("a", "12345").unwrap();
        // Overwriting a key only counts the new value
        store.set("a", "1234567").unwrap();

        let err = store.set("b", "12345").unwrap_err();
        assert!(matches!(err, StorageError::QuotaExceeded { needed: 12, quota: 10, .. }));

        // Failed write leaves previous state intact
        assert_eq!(store.get("b").unwrap(), None);
        assert_eq!(store.used_bytes().unwrap(), 7);
    }

    #[test]
    fn test_file_store_set_many_checks_whole_batch() {
        let temp_dir = TempDir::new().unwrap();
        let mut store = FileStore::open(temp_dir.path()).unwrap().with_quota(10);
        store.set("a", "12").unwrap();

        // "a" alone would fit, the batch does not
        let err = store
            .set_many(&[("a", "1234".to_string()), ("b", "1234567".to_string())])
            .unwrap_err();
        assert!(matches!(err, StorageError::QuotaExceeded { needed: 11, .. }));
        assert_eq!(store.get("a").unwrap(), Some("12".to_string()));
        assert_eq!(store.get("b").unwrap(), None);

        store
            .set_many(&[("a", "1234".to_string()), ("b", "123456".to_string())])
            .unwrap();
        assert_eq!(store.used_bytes().unwrap(), 10);
    }

    #[test]
    fn test_zero_quota_is_unlimited() {
        let temp_dir = TempDir::new().unwrap();
        let mut store = FileStore::open(temp_dir.path()).unwrap().with_quota(0);
        store.set("a", &"x".repeat(1024)).unwrap();
    }

    #[test]
    fn test_memory_store() {
        let mut store = MemoryStore::new();
        assert!(store.is_empty());

        store.set("lastViewedQuote", "{}").unwrap();
        assert_eq!(store.get("lastViewedQuote").unwrap().as_deref(), Some("{}"));
        assert_eq!(store.len(), 1);

        store.remove("lastViewedQuote").unwrap();
        assert_eq!(store.get("lastViewedQuote").unwrap(), None);
    }
}
