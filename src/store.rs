use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Duration, Utc};
use log::info;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Cached entries older than this are treated as absent.
pub fn default_max_age() -> Duration {
    Duration::hours(24)
}

#[derive(Debug, Serialize)]
struct EnvelopeRef<'a, T: ?Sized> {
    saved_at: DateTime<Utc>,
    data: &'a T,
}

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    saved_at: DateTime<Utc>,
    data: T,
}

/// JSON-document persistence keyed by name, one file per key. Writes
/// for the same key are serialized through a per-key lock so two racing
/// refreshes cannot interleave partial files.
pub struct CacheStore {
    root: PathBuf,
    write_locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl CacheStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        CacheStore {
            root: root.into(),
            write_locks: Mutex::new(HashMap::new()),
        }
    }

    fn key_path(&self, key: &str) -> PathBuf {
        self.root.join(format!("{key}.json"))
    }

    fn write_lock(&self, key: &str) -> Result<Arc<Mutex<()>>> {
        let mut locks = self
            .write_locks
            .lock()
            .map_err(|_| Error::Persistence("write lock table poisoned".to_string()))?;
        Ok(locks.entry(key.to_string()).or_default().clone())
    }

    /// Serialize and overwrite the entry for `key`, stamping the write
    /// time. Last write wins; write errors propagate to the caller.
    pub fn save<T: Serialize + ?Sized>(&self, key: &str, data: &T) -> Result<()> {
        let lock = self.write_lock(key)?;
        let _guard = lock
            .lock()
            .map_err(|_| Error::Persistence(format!("write lock for '{key}' poisoned")))?;

        fs::create_dir_all(&self.root)
            .map_err(|e| Error::Persistence(format!("failed to create {}: {e}", self.root.display())))?;

        let envelope = EnvelopeRef {
            saved_at: Utc::now(),
            data,
        };
        let raw = serde_json::to_string_pretty(&envelope)
            .map_err(|e| Error::Persistence(format!("failed to serialize '{key}': {e}")))?;

        let path = self.key_path(key);
        fs::write(&path, raw)
            .map_err(|e| Error::Persistence(format!("failed to write {}: {e}", path.display())))
    }

    /// Read the entry for `key` if it exists and is younger than
    /// `max_age`. A missing or stale entry is `None`; a file that
    /// exists but cannot be parsed is an error.
    pub fn load<T: DeserializeOwned>(&self, key: &str, max_age: Duration) -> Result<Option<T>> {
        let path = self.key_path(key);
        if !path.exists() {
            return Ok(None);
        }

        let raw = fs::read_to_string(&path)
            .map_err(|e| Error::Persistence(format!("failed to read {}: {e}", path.display())))?;
        let envelope: Envelope<T> = serde_json::from_str(&raw)
            .map_err(|e| Error::Persistence(format!("failed to parse {}: {e}", path.display())))?;

        let age = Utc::now() - envelope.saved_at;
        if age > max_age {
            info!("cache entry '{key}' is {} h old; treating as absent", age.num_hours());
            return Ok(None);
        }
        Ok(Some(envelope.data))
    }
}
