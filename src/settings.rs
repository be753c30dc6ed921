//! Persisted key/value settings document.
//!
//! An explicit store object handed to each component at construction; the
//! host only touches `enabled_modules`, plugins get a namespaced view and
//! the host stays agnostic to their keys.

use serde_json::{Map, Value};
use std::fs;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use tracing::warn;

use crate::error::SettingsError;

/// Key holding the ordered set of enabled plugin ids
pub const KEY_ENABLED_MODULES: &str = "enabled_modules";

#[derive(Clone)]
pub struct SettingsStore {
    inner: Arc<Inner>,
}

struct Inner {
    path: PathBuf,
    doc: Mutex<Map<String, Value>>,
}

impl SettingsStore {
    /// Opens the document at `path`. A missing or corrupt file yields an
    /// empty document rather than an error; settings are never load-bearing
    /// enough to refuse startup over.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let doc = match fs::read_to_string(&path) {
            Ok(content) => match serde_json::from_str::<Map<String, Value>>(&content) {
                Ok(doc) => doc,
                Err(e) => {
                    warn!("[SETTINGS] {} is not valid JSON ({}), starting empty", path.display(), e);
                    Map::new()
                }
            },
            Err(_) => Map::new(),
        };

        Self {
            inner: Arc::new(Inner {
                path,
                doc: Mutex::new(doc),
            }),
        }
    }

    pub fn get(&self, key: &str) -> Option<Value> {
        let doc = self.inner.doc.lock().unwrap();
        doc.get(key).cloned()
    }

    /// Sets a key and persists the whole document immediately. Write failures
    /// are logged, not propagated; in-memory state stays authoritative.
    pub fn set(&self, key: &str, value: Value) {
        {
            let mut doc = self.inner.doc.lock().unwrap();
            doc.insert(key.to_string(), value);
        }
        if let Err(e) = self.save() {
            warn!("[SETTINGS] Failed to persist {}: {}", self.inner.path.display(), e);
        }
    }

    pub fn enabled_modules(&self) -> Vec<String> {
        match self.get(KEY_ENABLED_MODULES) {
            Some(Value::Array(ids)) => ids
                .into_iter()
                .filter_map(|v| v.as_str().map(str::to_string))
                .collect(),
            _ => Vec::new(),
        }
    }

    pub fn set_enabled_modules(&self, ids: &[String]) {
        let list = ids.iter().cloned().map(Value::String).collect();
        self.set(KEY_ENABLED_MODULES, Value::Array(list));
    }

    /// A view scoped to one plugin's namespace (`plugin.<id>.<key>`).
    pub fn scoped(&self, plugin_id: &str) -> PluginSettings {
        PluginSettings {
            store: self.clone(),
            prefix: format!("plugin.{plugin_id}."),
        }
    }

    fn save(&self) -> Result<(), SettingsError> {
        let doc = self.inner.doc.lock().unwrap();
        let content = serde_json::to_string_pretty(&*doc)?;
        fs::write(&self.inner.path, content)?;
        Ok(())
    }
}

/// Read/write access to one plugin's namespaced keys.
#[derive(Clone)]
pub struct PluginSettings {
    store: SettingsStore,
    prefix: String,
}

impl PluginSettings {
    pub fn get(&self, key: &str) -> Option<Value> {
        self.store.get(&format!("{}{}", self.prefix, key))
    }

    pub fn get_u64(&self, key: &str) -> Option<u64> {
        self.get(key).and_then(|v| v.as_u64())
    }

    pub fn get_string(&self, key: &str) -> Option<String> {
        self.get(key).and_then(|v| v.as_str().map(str::to_string))
    }

    pub fn set(&self, key: &str, value: Value) {
        self.store.set(&format!("{}{}", self.prefix, key), value);
    }
}
