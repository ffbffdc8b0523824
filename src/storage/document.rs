//! Best-effort JSON documents over a key/value backend

use crate::error::StorageError;
use crate::storage::backend::KeyValueStore;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::sync::Arc;

/// Observer for persistence failures that are swallowed by the stores
pub trait FailureSink: Send + Sync {
    fn storage_failed(&self, key: &str, error: &StorageError);
}

impl<F> FailureSink for F
where
    F: Fn(&str, &StorageError) + Send + Sync,
{
    fn storage_failed(&self, key: &str, error: &StorageError) {
        self(key, error)
    }
}

/// Reports failures as `tracing` warnings
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

impl FailureSink for LogSink {
    fn storage_failed(&self, key: &str, error: &StorageError) {
        tracing::warn!(key, %error, "persistence failed; continuing in memory");
    }
}

/// A single JSON value stored under a fixed key.
///
/// `load` never fails outward and falls back to `T::default()`. Writes
/// return their error so the caller can report it once it no longer holds
/// its own lock; every failure ends up at the sink.
#[derive(Clone)]
pub struct JsonDocument {
    key: String,
    backend: Arc<dyn KeyValueStore>,
    sink: Arc<dyn FailureSink>,
}

impl std::fmt::Debug for JsonDocument {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JsonDocument").field("key", &self.key).finish()
    }
}

impl JsonDocument {
    pub fn new(
        key: impl Into<String>,
        backend: Arc<dyn KeyValueStore>,
        sink: Arc<dyn FailureSink>,
    ) -> Self {
        Self {
            key: key.into(),
            backend,
            sink,
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn load<T: DeserializeOwned + Default>(&self) -> T {
        match self.try_load() {
            Ok(Some(value)) => value,
            Ok(None) => T::default(),
            Err(e) => {
                self.sink.storage_failed(&self.key, &e);
                T::default()
            }
        }
    }

    fn try_load<T: DeserializeOwned>(&self) -> Result<Option<T>, StorageError> {
        let Some(content) = self.backend.get(&self.key)? else {
            return Ok(None);
        };
        Ok(Some(serde_json::from_str(&content)?))
    }

    /// Write the value. Callers holding a lock must release it before
    /// passing the result to [`report`](Self::report).
    pub fn save<T: Serialize + ?Sized>(&self, value: &T) -> Result<(), StorageError> {
        let content = serde_json::to_string(value)?;
        self.backend.set(&self.key, &content)?;
        tracing::trace!(key = %self.key, "document saved");
        Ok(())
    }

    /// Delete the stored value; same reporting contract as [`save`](Self::save)
    pub fn clear(&self) -> Result<(), StorageError> {
        self.backend.remove(&self.key)
    }

    /// Hand a failed write to the sink. The sink may read the store again.
    pub fn report(&self, result: Result<(), StorageError>) {
        if let Err(e) = result {
            self.sink.storage_failed(&self.key, &e);
        }
    }
}
