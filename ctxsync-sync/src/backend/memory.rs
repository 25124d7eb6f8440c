//! In-memory backends.
//!
//! Useful on their own for session-local state and as stand-ins for host
//! objects in tests.

use super::{BackendError, BackendResult, KeyedStore, SettingsRegistry};
use async_trait::async_trait;
use serde_json::{Map, Value};
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

/// A shared plain object, accessed by direct field assignment.
#[derive(Debug, Clone, Default)]
pub struct SharedObject {
    fields: Arc<Mutex<Map<String, Value>>>,
}

impl SharedObject {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn from_map(fields: Map<String, Value>) -> Self {
        Self {
            fields: Arc::new(Mutex::new(fields)),
        }
    }

    #[must_use]
    pub fn get_field(&self, key: &str) -> Option<Value> {
        lock(&self.fields).get(key).cloned()
    }

    pub fn set_field(&self, key: impl Into<String>, value: Value) {
        lock(&self.fields).insert(key.into(), value);
    }

    pub fn remove_field(&self, key: &str) -> Option<Value> {
        lock(&self.fields).remove(key)
    }

    /// A copy of all fields.
    #[must_use]
    pub fn snapshot(&self) -> Map<String, Value> {
        lock(&self.fields).clone()
    }

    /// Runs `f` with the fields locked.
    pub fn with_fields<R>(&self, f: impl FnOnce(&mut Map<String, Value>) -> R) -> R {
        let mut fields = lock(&self.fields);
        f(&mut *fields)
    }
}

/// Keyed store kept in memory (flag stores, local and session storage).
///
/// `read_only` keys reject writes, which lets tests exercise backend errors.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<BTreeMap<String, Value>>,
    read_only: Mutex<Vec<String>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes writes to `key` fail with [`BackendError::Rejected`].
    pub fn lock_key(&self, key: impl Into<String>) {
        lock(&self.read_only).push(key.into());
    }

    #[must_use]
    pub fn len(&self) -> usize {
        lock(&self.entries).len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        lock(&self.entries).is_empty()
    }
}

impl KeyedStore for MemoryStore {
    fn get(&self, key: &str) -> Option<Value> {
        lock(&self.entries).get(key).cloned()
    }

    fn set(&self, key: &str, value: Value) -> BackendResult<()> {
        if lock(&self.read_only).iter().any(|k| k == key) {
            return Err(BackendError::Rejected {
                key: key.to_string(),
                reason: "key is read-only".to_string(),
            });
        }
        lock(&self.entries).insert(key.to_string(), value);
        Ok(())
    }

    fn keys(&self) -> Vec<String> {
        lock(&self.entries).keys().cloned().collect()
    }
}

/// Settings registry kept in memory.
#[derive(Debug, Default)]
pub struct MemoryRegistry {
    settings: Mutex<HashMap<(String, String), Value>>,
    fail_writes: Mutex<Option<String>>,
    writes: Mutex<usize>,
}

impl MemoryRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a setting without going through the async write path.
    pub fn register(&self, namespace: &str, key: &str, value: Value) {
        lock(&self.settings).insert((namespace.to_string(), key.to_string()), value);
    }

    /// Makes every subsequent write fail with `reason` (or succeed again with
    /// `None`).
    pub fn fail_writes(&self, reason: Option<&str>) {
        *lock(&self.fail_writes) = reason.map(str::to_string);
    }

    /// Number of writes that reached the registry, failed or not.
    #[must_use]
    pub fn write_count(&self) -> usize {
        *lock(&self.writes)
    }
}

#[async_trait]
impl SettingsRegistry for MemoryRegistry {
    fn get(&self, namespace: &str, key: &str) -> Option<Value> {
        lock(&self.settings)
            .get(&(namespace.to_string(), key.to_string()))
            .cloned()
    }

    async fn set(&self, namespace: &str, key: &str, value: Value) -> BackendResult<()> {
        *lock(&self.writes) += 1;
        let failure = lock(&self.fail_writes).clone();
        if let Some(reason) = failure {
            return Err(BackendError::Unavailable(reason));
        }
        self.register(namespace, key, value);
        Ok(())
    }
}
