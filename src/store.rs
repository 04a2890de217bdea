use serde_json::{Map, Value};
use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::app_dirs::AppDirs;

/// Minimal key-value persistence seam. Values are JSON so hosts can back
/// it with whatever store they have; reads are lenient and never fail.
pub trait KvStore {
    fn get(&self, key: &str) -> Option<Value>;
    fn set(&self, key: &str, value: &Value) -> io::Result<()>;
}

/// Store backed by a single JSON object file.
#[derive(Debug, Clone)]
pub struct FileKvStore {
    path: PathBuf,
}

impl FileKvStore {
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        let path = AppDirs::store_path().unwrap_or_else(|| PathBuf::from("stint_store.json"));
        Self { path }
    }

    pub fn with_path<P: AsRef<Path>>(p: P) -> Self {
        Self {
            path: p.as_ref().to_path_buf(),
        }
    }

    // Missing or unparseable file reads as empty; corruption never escapes
    // this module.
    fn read_entries(&self) -> Map<String, Value> {
        if let Ok(bytes) = fs::read(&self.path) {
            if let Ok(entries) = serde_json::from_slice::<Map<String, Value>>(&bytes) {
                return entries;
            }
        }
        Map::new()
    }
}

impl Default for FileKvStore {
    fn default() -> Self {
        Self::new()
    }
}

impl KvStore for FileKvStore {
    fn get(&self, key: &str) -> Option<Value> {
        self.read_entries().get(key).cloned()
    }

    fn set(&self, key: &str, value: &Value) -> io::Result<()> {
        let mut entries = self.read_entries();
        entries.insert(key.to_string(), value.clone());
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_vec_pretty(&entries)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        fs::write(&self.path, data)
    }
}

/// In-memory store for tests and headless hosts.
#[derive(Debug, Default)]
pub struct MemoryKvStore {
    entries: Mutex<HashMap<String, Value>>,
}

impl KvStore for MemoryKvStore {
    fn get(&self, key: &str) -> Option<Value> {
        self.entries.lock().unwrap().get(key).cloned()
    }

    fn set(&self, key: &str, value: &Value) -> io::Result<()> {
        self.entries
            .lock()
            .unwrap()
            .insert(key.to_string(), value.clone());
        Ok(())
    }
}
