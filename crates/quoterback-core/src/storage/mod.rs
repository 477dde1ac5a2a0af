//! Durable key/value persistence and engine configuration.
//!
//! Each persisted record (`settings`, `usage`, `favorites`) is a single JSON
//! value stored under a logical key. Stores built on top of
//! [`KeyValueStore`] never retry; a failure is handed back to the caller.

mod config;

pub use config::{CatalogConfig, Config, NotificationsConfig, SelectionConfig};

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use serde_json::Value;

use crate::error::{ConfigError, StorageError};

pub const SETTINGS_KEY: &str = "settings";
pub const USAGE_KEY: &str = "usage";
pub const FAVORITES_KEY: &str = "favorites";

/// Returns `~/.config/quoterback[-dev]/` based on QUOTERBACK_ENV.
///
/// `QUOTERBACK_HOME` overrides the location entirely, which keeps test runs
/// away from the real profile. Set QUOTERBACK_ENV=dev to use the
/// development data directory.
///
/// # Errors
/// Returns an error if creating the data directory fails.
pub fn data_dir() -> Result<PathBuf, ConfigError> {
    let dir = match std::env::var_os("QUOTERBACK_HOME") {
        Some(home) => PathBuf::from(home),
        None => {
            let base_dir = dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".config");

            let env = std::env::var("QUOTERBACK_ENV").unwrap_or_else(|_| "production".to_string());
            if env == "dev" {
                base_dir.join("quoterback-dev")
            } else {
                base_dir.join("quoterback")
            }
        }
    };

    std::fs::create_dir_all(&dir).map_err(|e| ConfigError::DataDir(e.to_string()))?;
    Ok(dir)
}

/// Generic load/save of named JSON values.
pub trait KeyValueStore: Send + Sync {
    /// Load the value stored under `key`, or `None` if nothing was saved yet.
    fn load(&self, key: &str) -> Result<Option<Value>, StorageError>;

    /// Durably store `value` under `key`, replacing any previous value.
    fn save(&self, key: &str, value: &Value) -> Result<(), StorageError>;

    /// Delete the value stored under `key`. Missing keys are not an error.
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}

/// Serialize `value` and save it under `key`.
pub fn save_json<T: serde::Serialize + ?Sized>(
    store: &dyn KeyValueStore,
    key: &str,
    value: &T,
) -> Result<(), StorageError> {
    let json = serde_json::to_value(value).map_err(|e| StorageError::Serialize {
        key: key.to_string(),
        message: e.to_string(),
    })?;
    store.save(key, &json)
}

/// File-backed store writing one `<key>.json` file per record.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    dir: PathBuf,
}

impl JsonFileStore {
    /// Open a store rooted at `dir`, creating the directory if needed.
    pub fn open(dir: impl Into<PathBuf>) -> std::io::Result<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    /// Open the store in the default data directory.
    pub fn open_default() -> Result<Self, ConfigError> {
        let dir = data_dir()?;
        Self::open(dir).map_err(|e| ConfigError::DataDir(e.to_string()))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }

    /// Atomically write `data` to `path` via a `.tmp` sibling.
    fn atomic_write(path: &Path, data: &[u8]) -> std::io::Result<()> {
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, data)?;
        std::fs::rename(&tmp, path)
    }
}

impl KeyValueStore for JsonFileStore {
    fn load(&self, key: &str) -> Result<Option<Value>, StorageError> {
        let path = self.path_for(key);
        let content = match std::fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(StorageError::ReadFailed {
                    key: key.to_string(),
                    message: e.to_string(),
                })
            }
        };

        serde_json::from_str(&content)
            .map(Some)
            .map_err(|e| StorageError::ReadFailed {
                key: key.to_string(),
                message: e.to_string(),
            })
    }

    fn save(&self, key: &str, value: &Value) -> Result<(), StorageError> {
        let write_failed = |message: String| StorageError::WriteFailed {
            key: key.to_string(),
            message,
        };
        let data = serde_json::to_vec_pretty(value).map_err(|e| write_failed(e.to_string()))?;
        Self::atomic_write(&self.path_for(key), &data).map_err(|e| write_failed(e.to_string()))
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        match std::fs::remove_file(self.path_for(key)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StorageError::WriteFailed {
                key: key.to_string(),
                message: e.to_string(),
            }),
        }
    }
}

/// In-process store. Values live as long as the store does.
///
/// `fail_reads` / `fail_writes` make every subsequent call fail, which lets
/// tests drive the storage failure paths of the stores above it.
#[derive(Debug, Default)]
pub struct MemoryStore {
    values: Mutex<HashMap<String, Value>>,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a store with raw records.
    pub fn with_values<I, K>(values: I) -> Self
    where
        I: IntoIterator<Item = (K, Value)>,
        K: Into<String>,
    {
        let store = Self::new();
        if let Ok(mut map) = store.values.lock() {
            map.extend(values.into_iter().map(|(k, v)| (k.into(), v)));
        }
        store
    }

    pub fn set_fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Raw value currently held under `key`, bypassing failure injection.
    pub fn raw(&self, key: &str) -> Option<Value> {
        self.values.lock().ok()?.get(key).cloned()
    }
}

impl KeyValueStore for MemoryStore {
    fn load(&self, key: &str) -> Result<Option<Value>, StorageError> {
        let read_failed = |message: &str| StorageError::ReadFailed {
            key: key.to_string(),
            message: message.to_string(),
        };
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(read_failed("injected read failure"));
        }
        let map = self.values.lock().map_err(|_| read_failed("store lock poisoned"))?;
        Ok(map.get(key).cloned())
    }

    fn save(&self, key: &str, value: &Value) -> Result<(), StorageError> {
        let write_failed = |message: &str| StorageError::WriteFailed {
            key: key.to_string(),
            message: message.to_string(),
        };
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(write_failed("injected write failure"));
        }
        let mut map = self.values.lock().map_err(|_| write_failed("store lock poisoned"))?;
        map.insert(key.to_string(), value.clone());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StorageError::WriteFailed {
                key: key.to_string(),
                message: "injected write failure".to_string(),
            });
        }
        if let Ok(mut map) = self.values.lock() {
            map.remove(key);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn file_store_missing_key_is_absent() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::open(dir.path()).unwrap();
        assert_eq!(store.load("settings").unwrap(), None);
    }

    #[test]
    fn file_store_save_is_visible_to_load() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::open(dir.path()).unwrap();

        store.save("usage", &json!({"q1": 2})).unwrap();
        assert_eq!(store.load("usage").unwrap(), Some(json!({"q1": 2})));

        store.save("usage", &json!({"q1": 3})).unwrap();
        assert_eq!(store.load("usage").unwrap(), Some(json!({"q1": 3})));
        assert!(!dir.path().join("usage.json.tmp").exists());
    }

    #[test]
    fn file_store_reports_malformed_record_as_read_failure() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("favorites.json"), "{not json").unwrap();
        let store = JsonFileStore::open(dir.path()).unwrap();

        let err = store.load("favorites").unwrap_err();
        assert!(matches!(err, StorageError::ReadFailed { ref key, .. } if key == "favorites"));
    }

    #[test]
    fn file_store_remove_tolerates_missing_key() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::open(dir.path()).unwrap();
        store.save("favorites", &json!(["a"])).unwrap();
        store.remove("favorites").unwrap();
        store.remove("favorites").unwrap();
        assert_eq!(store.load("favorites").unwrap(), None);
    }

    #[test]
    fn memory_store_failure_injection() {
        let store = MemoryStore::new();
        store.save("k", &json!(1)).unwrap();

        store.set_fail_writes(true);
        assert!(matches!(
            store.save("k", &json!(2)),
            Err(StorageError::WriteFailed { .. })
        ));
        assert_eq!(store.raw("k"), Some(json!(1)));

        store.set_fail_reads(true);
        assert!(matches!(store.load("k"), Err(StorageError::ReadFailed { .. })));
    }
}
