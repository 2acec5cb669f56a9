//! In-memory settings store for tests and ephemeral sessions.

use super::{SettingsStore, DASHBOARDS_KEY, RECENT_DATABASES_KEY};
use crate::dashboard::Dashboard;
use crate::error::{BoardError, Result};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

/// Keeps documents as JSON text in memory, like the state database does on
/// disk. Writes can be made to fail to exercise persistence error paths.
#[derive(Default)]
pub struct MemorySettingsStore {
    documents: Mutex<HashMap<String, String>>,
    fail_writes: AtomicBool,
    fail_reads: AtomicBool,
    saves: AtomicUsize,
}

impl MemorySettingsStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes subsequent saves fail (or succeed again).
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Makes subsequent loads fail (or succeed again).
    pub fn set_fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    /// Number of successful saves so far.
    pub fn saves(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }

    /// Returns the stored JSON text for `key`.
    pub fn raw(&self, key: &str) -> Option<String> {
        self.lock().get(key).cloned()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, String>> {
        self.documents.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn read<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(BoardError::persistence(format!(
                "Failed to read setting '{key}': store unavailable"
            )));
        }
        match self.raw(key) {
            Some(text) => serde_json::from_str(&text).map(Some).map_err(|e| {
                BoardError::persistence(format!("Stored setting '{key}' is not valid: {e}"))
            }),
            None => Ok(None),
        }
    }

    fn write<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(BoardError::persistence(format!(
                "Failed to write setting '{key}': store unavailable"
            )));
        }
        let text = serde_json::to_string(value).map_err(|e| {
            BoardError::persistence(format!("Failed to encode setting '{key}': {e}"))
        })?;
        self.lock().insert(key.to_string(), text);
        self.saves.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[async_trait]
impl SettingsStore for MemorySettingsStore {
    async fn load_dashboards(&self) -> Result<Vec<Dashboard>> {
        Ok(self.read(DASHBOARDS_KEY)?.unwrap_or_default())
    }

    async fn save_dashboards(&self, dashboards: &[Dashboard]) -> Result<()> {
        self.write(DASHBOARDS_KEY, dashboards)
    }

    async fn load_recent_databases(&self) -> Result<Vec<String>> {
        Ok(self.read(RECENT_DATABASES_KEY)?.unwrap_or_default())
    }

    async fn save_recent_databases(&self, paths: &[String]) -> Result<()> {
        self.write(RECENT_DATABASES_KEY, paths)
    }
}
