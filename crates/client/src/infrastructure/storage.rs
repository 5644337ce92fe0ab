//! Key/value storage adapters
//!
//! `FileStorage` keeps a JSON object on disk and an in-memory copy of it.
//! `InMemoryStorage` is the same contract without persistence, for tests and
//! short-lived runs.

use directories::ProjectDirs;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

use crate::ports::outbound::StorageProvider;

const STORAGE_FILE_NAME: &str = "session.json";

/// File-backed storage
///
/// Stores key-value pairs in a JSON file, by default at:
/// - Linux: ~/.config/flowpilot/session.json
/// - macOS: ~/Library/Application Support/io.flowpilot.flowpilot/session.json
/// - Windows: C:\Users\<User>\AppData\Roaming\flowpilot\flowpilot\config\session.json
#[derive(Clone)]
pub struct FileStorage {
    storage_path: PathBuf,
    cache: Arc<RwLock<HashMap<String, String>>>,
}

impl FileStorage {
    /// Open storage at `storage_path`, loading existing entries if the file exists.
    ///
    /// An unreadable or corrupt file is logged and treated as empty.
    pub fn open(storage_path: impl Into<PathBuf>) -> Self {
        let storage_path = storage_path.into();
        let cache = load_entries(&storage_path);

        tracing::debug!(path = ?storage_path, entries = cache.len(), "File storage initialized");

        Self {
            storage_path,
            cache: Arc::new(RwLock::new(cache)),
        }
    }

    /// Platform config directory, falling back to the working directory.
    pub fn default_path() -> PathBuf {
        match ProjectDirs::from("io", "flowpilot", "flowpilot") {
            Some(dirs) => dirs.config_dir().join(STORAGE_FILE_NAME),
            None => PathBuf::from(format!("flowpilot_{STORAGE_FILE_NAME}")),
        }
    }

    pub fn path(&self) -> &Path {
        &self.storage_path
    }

    fn update(&self, apply: impl FnOnce(&mut HashMap<String, String>)) {
        match self.cache.write() {
            Ok(mut guard) => {
                apply(&mut guard);
                // Written under the lock so concurrent updates reach disk in order
                self.persist(&guard);
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to acquire write lock for storage");
            }
        }
    }

    fn persist(&self, entries: &HashMap<String, String>) {
        if let Some(parent) = self.storage_path.parent() {
            if !parent.as_os_str().is_empty() {
                if let Err(e) = fs::create_dir_all(parent) {
                    tracing::error!(
                        error = %e,
                        path = ?parent,
                        "Failed to create storage directory"
                    );
                    return;
                }
            }
        }

        match serde_json::to_string_pretty(entries) {
            Ok(data) => {
                if let Err(e) = fs::write(&self.storage_path, data) {
                    tracing::error!(
                        error = %e,
                        path = ?self.storage_path,
                        "Failed to write storage file"
                    );
                }
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to serialize storage data");
            }
        }
    }
}

fn load_entries(path: &Path) -> HashMap<String, String> {
    if !path.exists() {
        return HashMap::new();
    }
    match fs::read_to_string(path) {
        Ok(data) => match serde_json::from_str::<HashMap<String, String>>(&data) {
            Ok(map) => map,
            Err(e) => {
                tracing::warn!(error = %e, path = ?path, "Failed to parse storage file");
                HashMap::new()
            }
        },
        Err(e) => {
            tracing::warn!(error = %e, path = ?path, "Failed to read storage file");
            HashMap::new()
        }
    }
}

impl StorageProvider for FileStorage {
    fn get(&self, key: &str) -> Option<String> {
        match self.cache.read() {
            Ok(guard) => guard.get(key).cloned(),
            Err(e) => {
                tracing::error!(error = %e, "Failed to acquire read lock for storage");
                None
            }
        }
    }

    fn put(&self, key: &str, value: &str) {
        self.update(|entries| {
            entries.insert(key.to_string(), value.to_string());
        });
    }

    fn remove(&self, key: &str) {
        self.update(|entries| {
            entries.remove(key);
        });
    }
}

/// Non-persistent storage
#[derive(Clone, Default)]
pub struct InMemoryStorage {
    entries: Arc<RwLock<HashMap<String, String>>>,
}

impl InMemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl StorageProvider for InMemoryStorage {
    fn get(&self, key: &str) -> Option<String> {
        self.entries
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .get(key)
            .cloned()
    }

    fn put(&self, key: &str, value: &str) {
        self.entries
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .insert(key.to_string(), value.to_string());
    }

    fn remove(&self, key: &str) {
        self.entries
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .remove(key);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn values_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("session.json");

        let storage = FileStorage::open(&path);
        storage.put("workflow_session_id", "s-1");
        storage.put("workflow_workflow_id", "wf-1");
        storage.remove("workflow_workflow_id");

        let reopened = FileStorage::open(&path);
        assert_eq!(reopened.get("workflow_session_id").as_deref(), Some("s-1"));
        assert_eq!(reopened.get("workflow_workflow_id"), None);
    }

    #[test]
    fn corrupt_file_is_treated_as_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        fs::write(&path, "{not json").unwrap();

        let storage = FileStorage::open(&path);
        assert_eq!(storage.get("anything"), None);

        storage.put("k", "v");
        assert_eq!(FileStorage::open(&path).get("k").as_deref(), Some("v"));
    }

    #[test]
    fn removing_missing_key_is_noop() {
        let storage = InMemoryStorage::new();
        storage.remove("missing");
        storage.put("k", "v");
        storage.put("k", "w");
        assert_eq!(storage.get("k").as_deref(), Some("w"));
    }
}
