//! services/client/src/adapters/storage.rs
//!
//! A `KeyValueStore` kept as one JSON object on disk. Every write rewrites the file.

use jobs_dashboard_core::ports::{KeyValueStore, PortError, PortResult};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};
use tracing::{info, warn};

use crate::error::ClientError;

pub struct FileKeyValueStore {
    path: PathBuf,
    items: Mutex<BTreeMap<String, String>>,
}

impl FileKeyValueStore {
    /// Opens the store at `path`. A missing file starts empty; a corrupt one is
    /// logged and replaced on the next write.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, ClientError> {
        let path = path.into();
        let items = match fs::read_to_string(&path) {
            Ok(raw) => match serde_json::from_str(&raw) {
                Ok(items) => items,
                Err(e) => {
                    warn!(path = %path.display(), "Ignoring corrupt storage file: {}", e);
                    BTreeMap::new()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => return Err(e.into()),
        };
        info!(path = %path.display(), keys = items.len(), "Storage opened");
        Ok(Self {
            path,
            items: Mutex::new(items),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn flush(&self, items: &BTreeMap<String, String>) -> PortResult<()> {
        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir).map_err(|e| PortError::Storage(e.to_string()))?;
        }
        let raw = serde_json::to_string_pretty(items).map_err(|e| PortError::Storage(e.to_string()))?;
        fs::write(&self.path, raw).map_err(|e| PortError::Storage(e.to_string()))
    }
}

impl KeyValueStore for FileKeyValueStore {
    fn get_item(&self, key: &str) -> Option<String> {
        self.items
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    fn set_item(&self, key: &str, value: &str) -> PortResult<()> {
        let mut items = self.items.lock().unwrap_or_else(PoisonError::into_inner);
        items.insert(key.to_string(), value.to_string());
        self.flush(&items)
    }

    fn remove_item(&self, key: &str) -> PortResult<()> {
        let mut items = self.items.lock().unwrap_or_else(PoisonError::into_inner);
        if items.remove(key).is_some() {
            self.flush(&items)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn items_survive_reopening() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("storage.json");

        let store = FileKeyValueStore::open(&path).unwrap();
        assert_eq!(store.get_item("vagas_filters"), None);
        store.set_item("vagas_filters", r#"{"period":"last7days"}"#).unwrap();
        store.set_item("token", "abc").unwrap();
        store.remove_item("token").unwrap();

        let reopened = FileKeyValueStore::open(&path).unwrap();
        assert_eq!(
            reopened.get_item("vagas_filters").as_deref(),
            Some(r#"{"period":"last7days"}"#)
        );
        assert_eq!(reopened.get_item("token"), None);
    }

    #[test]
    fn corrupt_file_starts_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("storage.json");
        fs::write(&path, "{not json").unwrap();

        let store = FileKeyValueStore::open(&path).unwrap();
        assert_eq!(store.get_item("anything"), None);
        store.set_item("user", "{}").unwrap();
        assert!(fs::read_to_string(&path).unwrap().contains("\"user\""));
    }
}
