// src/storage.rs

use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::{Map, Value};
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::debug;

/// Keys of the persisted session state.
pub mod keys {
    pub const HR_ID: &str = "hrId";
    pub const CSRF_TOKEN: &str = "csrfToken";
    pub const USER_ID: &str = "userId";
    pub const LOGIN_USER_ZUID: &str = "loginUserZUID";
    /// Last range-detail response.
    pub const RANGE_DETAIL: &str = "data1";
    /// Last pending-requests response.
    pub const PENDING_REQUESTS: &str = "data2";
    pub const TOP_REMEDIATION_DATES: &str = "top3MinDatesByTotalHrs";
}

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("File I/O error: {context}")]
    Io {
        #[source]
        source: std::io::Error,
        context: String,
    },

    #[error("JSON processing error")]
    Json(#[from] serde_json::Error),
}

fn io_context<S: Into<String>>(source: std::io::Error, context: S) -> StorageError {
    StorageError::Io {
        source,
        context: context.into(),
    }
}

/// Flat string-keyed store of JSON blobs. `set` merges, `clear` wipes
/// everything.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<Value>, StorageError>;

    /// Only keys that are present appear in the result.
    async fn get_many(&self, keys: &[&str]) -> Result<Map<String, Value>, StorageError>;

    async fn set(&self, entries: Map<String, Value>) -> Result<(), StorageError>;

    async fn clear(&self) -> Result<(), StorageError>;
}

pub async fn get_typed<T: DeserializeOwned>(
    store: &dyn KeyValueStore,
    key: &str,
) -> Result<Option<T>, StorageError> {
    match store.get(key).await? {
        Some(value) => Ok(Some(serde_json::from_value(value)?)),
        None => Ok(None),
    }
}

pub async fn set_typed<T: Serialize + ?Sized>(
    store: &dyn KeyValueStore,
    key: &str,
    value: &T,
) -> Result<(), StorageError> {
    let mut entries = Map::new();
    entries.insert(key.to_string(), serde_json::to_value(value)?);
    store.set(entries).await
}

fn pick(state: &Map<String, Value>, keys: &[&str]) -> Map<String, Value> {
    keys.iter()
        .filter_map(|key| state.get(*key).map(|value| (key.to_string(), value.clone())))
        .collect()
}

// --- In-memory ---

#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Mutex<Map<String, Value>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<Value>, StorageError> {
        Ok(self.state.lock().await.get(key).cloned())
    }

    async fn get_many(&self, keys: &[&str]) -> Result<Map<String, Value>, StorageError> {
        Ok(pick(&*self.state.lock().await, keys))
    }

    async fn set(&self, entries: Map<String, Value>) -> Result<(), StorageError> {
        self.state.lock().await.extend(entries);
        Ok(())
    }

    async fn clear(&self) -> Result<(), StorageError> {
        self.state.lock().await.clear();
        Ok(())
    }
}

// --- File-backed ---

/// Store persisted as one pretty-printed JSON object, rewritten on every
/// change.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    state: Mutex<Map<String, Value>>,
}

impl JsonFileStore {
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let path = path.into();
        let state = Self::load(&path)?;
        debug!("Opened store {:?} with {} keys", path, state.len());
        Ok(Self {
            path,
            state: Mutex::new(state),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(path: &Path) -> Result<Map<String, Value>, StorageError> {
        if !path.exists() {
            return Ok(Map::new());
        }
        let json_string = fs::read_to_string(path)
            .map_err(|e| io_context(e, format!("Failed to read store file: {:?}", path)))?;
        if json_string.trim().is_empty() {
            return Ok(Map::new());
        }
        Ok(serde_json::from_str(&json_string)?)
    }

    fn save(&self, state: &Map<String, Value>) -> Result<(), StorageError> {
        let json_string = serde_json::to_string_pretty(state)?;

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|e| {
                    io_context(
                        e,
                        format!("Failed to create directory for store file: {:?}", parent),
                    )
                })?;
            }
        }

        let mut file = File::create(&self.path).map_err(|e| {
            io_context(e, format!("Failed to create store file: {:?}", self.path))
        })?;
        file.write_all(json_string.as_bytes()).map_err(|e| {
            io_context(e, format!("Failed to write store file: {:?}", self.path))
        })?;
        Ok(())
    }
}

#[async_trait]
impl KeyValueStore for JsonFileStore {
    async fn get(&self, key: &str) -> Result<Option<Value>, StorageError> {
        Ok(self.state.lock().await.get(key).cloned())
    }

    async fn get_many(&self, keys: &[&str]) -> Result<Map<String, Value>, StorageError> {
        Ok(pick(&*self.state.lock().await, keys))
    }

    async fn set(&self, entries: Map<String, Value>) -> Result<(), StorageError> {
        let mut state = self.state.lock().await;
        state.extend(entries);
        self.save(&state)
    }

    async fn clear(&self) -> Result<(), StorageError> {
        let mut state = self.state.lock().await;
        state.clear();
        if self.path.exists() {
            fs::remove_file(&self.path).map_err(|e| {
                io_context(e, format!("Failed to remove store file: {:?}", self.path))
            })?;
        }
        Ok(())
    }
}
