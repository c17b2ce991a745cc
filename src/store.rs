//! Keyed persistent store.
//!
//! Every logical piece of state (the layout, the theme, each widget's private
//! data) lives under its own durable key. Values are kept as JSON text, the
//! same way a browser key/value store would hold them, and the whole map is
//! rewritten atomically on each mutation.

use serde::{de::DeserializeOwned, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use tempfile::NamedTempFile;
use thiserror::Error;

/// File name of the durable map inside the data directory.
pub const STORAGE_FILE: &str = "storage.json";

/// Raw durable contents: key to JSON text.
pub type Entries = BTreeMap<String, String>;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to encode storage contents: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("storage is unavailable: {0}")]
    Unavailable(String),
}

/// Durable medium behind a [`Store`].
pub trait StorageBackend: Send {
    fn load(&mut self) -> Result<Entries, StoreError>;
    fn persist(&mut self, entries: &Entries) -> Result<(), StoreError>;
}

/// Production backend: one JSON object on disk.
pub struct FileBackend {
    path: PathBuf,
}

impl FileBackend {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        Self::new(dir.as_ref().join(STORAGE_FILE))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl StorageBackend for FileBackend {
    fn load(&mut self) -> Result<Entries, StoreError> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(Entries::new()),
            Err(source) => {
                return Err(StoreError::Io {
                    path: self.path.clone(),
                    source,
                })
            }
        };
        if content.trim().is_empty() {
            return Ok(Entries::new());
        }
        match serde_json::from_str::<Entries>(&content) {
            Ok(entries) => Ok(entries),
            Err(err) => {
                tracing::warn!(
                    path = %self.path.display(),
                    error = %err,
                    "storage file is corrupt; moving it aside and starting empty"
                );
                move_aside(&self.path);
                Ok(Entries::new())
            }
        }
    }

    fn persist(&mut self, entries: &Entries) -> Result<(), StoreError> {
        let data = serde_json::to_vec_pretty(entries)?;
        atomic_write(&self.path, &data).map_err(|source| StoreError::Io {
            path: self.path.clone(),
            source,
        })
    }
}

fn atomic_write(path: &Path, data: &[u8]) -> io::Result<()> {
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    fs::create_dir_all(dir)?;
    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(data)?;
    tmp.flush()?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|err| err.error)?;
    Ok(())
}

/// In-memory backend. Clones share the same durable map so tests can inspect
/// what actually reached "disk" and simulate a full medium.
#[derive(Clone, Default)]
pub struct MemoryBackend {
    durable: Arc<Mutex<Entries>>,
    fail_writes: Arc<AtomicBool>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entries(entries: Entries) -> Self {
        Self {
            durable: Arc::new(Mutex::new(entries)),
            fail_writes: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn durable(&self) -> Entries {
        lock_or_recover(&self.durable).clone()
    }

    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }
}

impl StorageBackend for MemoryBackend {
    fn load(&mut self) -> Result<Entries, StoreError> {
        Ok(lock_or_recover(&self.durable).clone())
    }

    fn persist(&mut self, entries: &Entries) -> Result<(), StoreError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("quota exceeded".into()));
        }
        *lock_or_recover(&self.durable) = entries.clone();
        Ok(())
    }
}

fn lock_or_recover<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

struct Inner {
    entries: Entries,
    backend: Box<dyn StorageBackend>,
    writes: u64,
}

impl Inner {
    fn flush(&mut self) {
        self.writes += 1;
        if let Err(err) = self.backend.persist(&self.entries) {
            // In-memory state stays authoritative for the session.
            tracing::error!(error = %err, "failed to persist storage");
        }
    }
}

/// Cloneable handle to the keyed store.
#[derive(Clone)]
pub struct Store {
    inner: Arc<Mutex<Inner>>,
}

impl Store {
    pub fn open(mut backend: impl StorageBackend + 'static) -> Self {
        let entries = backend.load().unwrap_or_else(|err| {
            tracing::warn!(error = %err, "storage could not be read; starting empty");
            Entries::new()
        });
        Self {
            inner: Arc::new(Mutex::new(Inner {
                entries,
                backend: Box::new(backend),
                writes: 0,
            })),
        }
    }

    pub fn open_dir(dir: impl AsRef<Path>) -> Self {
        Self::open(FileBackend::in_dir(dir))
    }

    pub fn in_memory() -> Self {
        Self::open(MemoryBackend::new())
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        lock_or_recover(&self.inner)
    }

    /// Read `key`, falling back to `default` when it is missing or malformed.
    pub fn get<T: DeserializeOwned>(&self, key: &str, default: T) -> T {
        let raw = match self.get_raw(key) {
            Some(raw) => raw,
            None => return default,
        };
        match serde_json::from_str(&raw) {
            Ok(value) => value,
            Err(err) => {
                tracing::warn!(key = %key, error = %err, "malformed stored value; using default");
                default
            }
        }
    }

    pub fn get_raw(&self, key: &str) -> Option<String> {
        self.lock().entries.get(key).cloned()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.lock().entries.contains_key(key)
    }

    pub fn set<T: Serialize + ?Sized>(&self, key: &str, value: &T) {
        self.batch(|tx| tx.set(key, value));
    }

    pub fn set_raw(&self, key: &str, raw: impl Into<String>) {
        let raw = raw.into();
        self.batch(|tx| tx.set_raw(key, raw));
    }

    pub fn remove(&self, key: &str) {
        self.batch(|tx| tx.remove(key));
    }

    pub fn clear(&self) {
        self.batch(|tx| tx.clear());
    }

    pub fn keys(&self) -> Vec<String> {
        self.lock().entries.keys().cloned().collect()
    }

    pub fn entries(&self) -> Entries {
        self.lock().entries.clone()
    }

    /// Apply several mutations and flush them in a single durable write.
    pub fn batch<R>(&self, f: impl FnOnce(&mut Batch<'_>) -> R) -> R {
        let mut inner = self.lock();
        let mut batch = Batch {
            entries: &mut inner.entries,
            dirty: false,
        };
        let result = f(&mut batch);
        let dirty = batch.dirty;
        if dirty {
            inner.flush();
        }
        result
    }

    /// Number of durable writes attempted since the store was opened.
    pub fn write_count(&self) -> u64 {
        self.lock().writes
    }
}

/// Pending mutations inside [`Store::batch`].
pub struct Batch<'a> {
    entries: &'a mut Entries,
    dirty: bool,
}

impl Batch<'_> {
    pub fn set<T: Serialize + ?Sized>(&mut self, key: &str, value: &T) {
        match serde_json::to_string(value) {
            Ok(raw) => self.set_raw(key, raw),
            Err(err) => tracing::error!(key = %key, error = %err, "failed to encode value"),
        }
    }

    pub fn set_raw(&mut self, key: &str, raw: String) {
        self.entries.insert(key.to_string(), raw);
        self.dirty = true;
    }

    pub fn remove(&mut self, key: &str) -> bool {
        let removed = self.entries.remove(key).is_some();
        self.dirty |= removed;
        removed
    }

    pub fn clear(&mut self) {
        if !self.entries.is_empty() {
            self.entries.clear();
            self.dirty = true;
        }
    }

    pub fn keys(&self) -> Vec<String> {
        self.entries.keys().cloned().collect()
    }
}

/// Rename an unreadable storage file to `*.corrupt`. Returns the new path.
fn move_aside(path: &Path) -> Option<PathBuf> {
    let aside = path.with_extension("corrupt");
    match fs::rename(path, &aside) {
        Ok(()) => Some(aside),
        Err(err) => {
            tracing::warn!(
                path = %path.display(),
                aside = %aside.display(),
                error = %err,
                "failed to move corrupt storage file aside; the next write replaces it"
            );
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_key_returns_default() {
        let store = Store::in_memory();
        assert_eq!(store.get("nope", 7u32), 7);
    }

    #[test]
    fn malformed_value_returns_default() {
        let store = Store::in_memory();
        store.set_raw("count", "{not json");
        assert_eq!(store.get("count", 3u32), 3);
        store.set_raw("count", "\"text\"");
        assert_eq!(store.get("count", 4u32), 4);
    }

    #[test]
    fn set_then_get_returns_value() {
        let store = Store::in_memory();
        store.set("list", &vec!["a".to_string(), "b".to_string()]);
        let list: Vec<String> = store.get("list", Vec::new());
        assert_eq!(list, vec!["a", "b"]);
        assert_eq!(store.get_raw("list").as_deref(), Some(r#"["a","b"]"#));
    }

    #[test]
    fn write_failure_keeps_memory_ahead_of_disk() {
        let backend = MemoryBackend::new();
        let store = Store::open(backend.clone());
        store.set("kept", &1u8);
        backend.set_fail_writes(true);
        store.set("lost", &2u8);
        assert_eq!(store.get("lost", 0u8), 2);
        let durable = backend.durable();
        assert!(durable.contains_key("kept"));
        assert!(!durable.contains_key("lost"));
    }

    #[test]
    fn batch_flushes_once() {
        let store = Store::in_memory();
        store.batch(|tx| {
            tx.set("a", &1);
            tx.set("b", &2);
            tx.remove("a");
        });
        assert_eq!(store.write_count(), 1);
        assert_eq!(store.keys(), vec!["b".to_string()]);
    }

    #[test]
    fn untouched_batch_does_not_write() {
        let store = Store::in_memory();
        store.batch(|tx| {
            tx.remove("absent");
        });
        assert_eq!(store.write_count(), 0);
    }

    #[test]
    fn file_backend_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::open_dir(dir.path());
        store.set("notes-widget-notes-1", "hello");
        drop(store);

        let reopened = Store::open_dir(dir.path());
        assert_eq!(
            reopened.get("notes-widget-notes-1", String::new()),
            "hello".to_string()
        );
    }

    #[test]
    fn corrupt_file_is_moved_aside() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(STORAGE_FILE);
        std::fs::write(&path, "[[[").unwrap();

        let store = Store::open_dir(dir.path());
        assert!(store.keys().is_empty());
        assert!(dir.path().join("storage.corrupt").exists());
    }

    #[test]
    fn failed_move_aside_keeps_original() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(STORAGE_FILE);
        std::fs::write(&path, "[[[").unwrap();
        let blocker = dir.path().join("storage.corrupt");
        std::fs::create_dir(&blocker).unwrap();
        std::fs::write(blocker.join("keep"), "x").unwrap();

        assert_eq!(move_aside(&path), None);
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "[[[");

        let store = Store::open_dir(dir.path());
        assert!(store.keys().is_empty());
    }
}
