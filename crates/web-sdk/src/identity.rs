//! Identity manager: assigns and persists the anonymous per-device id.
//!
//! The id is read from durable key/value storage; when absent a fresh UUID v4
//! is generated and written back before first use. Resolution happens once
//! per manager and is memoized, so concurrent callers observe the same value.

use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};

use beacon_core::{BeaconError, BeaconResult, DeviceId};
use dashmap::DashMap;
use parking_lot::Mutex;
use serde_json::{Map, Value};
use tracing::debug;
use uuid::Uuid;

/// Durable client-side key/value storage.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> BeaconResult<Option<String>>;
    fn set(&self, key: &str, value: &str) -> BeaconResult<()>;
}

/// Process-scoped store. Nothing survives the process.
#[derive(Default)]
pub struct MemoryStore {
    entries: DashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> BeaconResult<Option<String>> {
        Ok(self.entries.get(key).map(|v| v.value().clone()))
    }

    fn set(&self, key: &str, value: &str) -> BeaconResult<()> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Store backed by a JSON object file, for native embeddings.
pub struct FileStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_entries(&self) -> BeaconResult<Map<String, Value>> {
        let raw = match std::fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Map::new()),
            Err(e) => {
                return Err(BeaconError::Storage(format!(
                    "read {}: {e}",
                    self.path.display()
                )))
            }
        };
        if raw.trim().is_empty() {
            return Ok(Map::new());
        }
        match serde_json::from_str::<Value>(&raw)? {
            Value::Object(entries) => Ok(entries),
            _ => Err(BeaconError::Storage(format!(
                "{} does not hold a JSON object",
                self.path.display()
            ))),
        }
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> BeaconResult<Option<String>> {
        Ok(self
            .read_entries()?
            .get(key)
            .and_then(Value::as_str)
            .map(str::to_string))
    }

    fn set(&self, key: &str, value: &str) -> BeaconResult<()> {
        let _guard = self.write_lock.lock();
        let mut entries = self.read_entries()?;
        entries.insert(key.to_string(), Value::String(value.to_string()));
        let body = serde_json::to_string_pretty(&Value::Object(entries))?;
        std::fs::write(&self.path, body)
            .map_err(|e| BeaconError::Storage(format!("write {}: {e}", self.path.display())))
    }
}

/// Owns the device identity for one storage scope.
pub struct IdentityManager {
    store: Arc<dyn KeyValueStore>,
    key: String,
    device_id: OnceLock<DeviceId>,
}

impl IdentityManager {
    pub fn new(store: Arc<dyn KeyValueStore>, key: impl Into<String>) -> Self {
        Self {
            store,
            key: key.into(),
            device_id: OnceLock::new(),
        }
    }

    /// Return the persisted identity, creating and persisting it on first use.
    ///
    /// Storage failures never surface: the manager falls back to an id that
    /// is generated once and reused for its own lifetime, but not persisted.
    pub fn device_id(&self) -> DeviceId {
        self.device_id.get_or_init(|| self.load_or_create()).clone()
    }

    fn load_or_create(&self) -> DeviceId {
        match self.store.get(&self.key) {
            Ok(Some(existing)) if !existing.is_empty() => return DeviceId::new(existing),
            Ok(_) => {}
            Err(e) => {
                debug!(error = %e, key = %self.key, "device id read failed, using ephemeral id");
                return generate_device_id();
            }
        }

        let id = generate_device_id();
        if let Err(e) = self.store.set(&self.key, id.as_str()) {
            debug!(error = %e, key = %self.key, "device id not persisted");
        }
        id
    }
}

/// Fresh random UUID v4, lowercase and hyphenated.
pub fn generate_device_id() -> DeviceId {
    DeviceId::new(Uuid::new_v4().hyphenated().to_string())
}
