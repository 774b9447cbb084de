//! Analysis-result cache: shared contract plus file-backed and in-memory stores.

use el_core::EngineError;
use el_core::EngineResult;
use serde::Deserialize;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::path::PathBuf;
use std::sync::Mutex;

const CACHE_FILE_NAME: &str = "analysis-cache.jsonl";

/// Asynchronous-boundary key-value store keyed by exact page URL.
///
/// Values are raw scoring-service response bodies, stored unmodified. Entries
/// carry no TTL and are only ever overwritten, never deleted, by the engine.
pub trait CacheStore: Send + Sync {
    fn get(&self, key: &str) -> EngineResult<Option<String>>;

    /// Batch lookup; the returned mapping contains only the keys that hit.
    fn get_many(&self, keys: &[String]) -> EngineResult<BTreeMap<String, String>>;

    /// Inserts or overwrites every entry in the mapping.
    fn set(&self, entries: BTreeMap<String, String>) -> EngineResult<()>;
}

#[derive(Debug, Serialize, Deserialize)]
struct CacheRecord {
    key: String,
    value: String,
}

/// Durable store shared by every engine instance pointed at the same root.
///
/// One JSON record per line; the whole file is re-read and re-written on each
/// `set` so concurrent writers converge on a merged view.
#[derive(Debug, Clone)]
pub struct FileCacheStore {
    path: PathBuf,
}

impl FileCacheStore {
    pub fn new(root: PathBuf) -> Self {
        Self {
            path: root.join(CACHE_FILE_NAME),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_all(&self) -> EngineResult<BTreeMap<String, String>> {
        if !self.path.exists() {
            return Ok(BTreeMap::new());
        }

        let content = fs::read_to_string(&self.path).map_err(|error| {
            EngineError::new(
                "cache.read_failed",
                format!("failed to read cache file `{}`: {error}", self.path.display()),
            )
        })?;

        let mut entries = BTreeMap::new();
        for (index, line) in content.lines().enumerate() {
            if line.is_empty() {
                continue;
            }

            let record: CacheRecord = serde_json::from_str(line).map_err(|error| {
                EngineError::new(
                    "cache.record_invalid",
                    format!(
                        "invalid cache record at `{}` line {}: {error}",
                        self.path.display(),
                        index + 1
                    ),
                )
            })?;
            entries.insert(record.key, record.value);
        }

        Ok(entries)
    }

    fn write_all(&self, entries: &BTreeMap<String, String>) -> EngineResult<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|error| {
                EngineError::new(
                    "cache.dir_create_failed",
                    format!(
                        "failed to create cache directory `{}`: {error}",
                        parent.display()
                    ),
                )
            })?;
        }

        let mut encoded = String::new();
        for (key, value) in entries {
            let record = CacheRecord {
                key: key.clone(),
                value: value.clone(),
            };
            let line = serde_json::to_string(&record).map_err(|error| {
                EngineError::new(
                    "cache.record_encode_failed",
                    format!("failed to encode cache record for `{key}`: {error}"),
                )
            })?;
            encoded.push_str(&line);
            encoded.push('\n');
        }

        fs::write(&self.path, encoded).map_err(|error| {
            EngineError::new(
                "cache.write_failed",
                format!(
                    "failed to write cache file `{}`: {error}",
                    self.path.display()
                ),
            )
        })
    }
}

impl CacheStore for FileCacheStore {
    fn get(&self, key: &str) -> EngineResult<Option<String>> {
        Ok(self.read_all()?.remove(key))
    }

    fn get_many(&self, keys: &[String]) -> EngineResult<BTreeMap<String, String>> {
        let mut all = self.read_all()?;
        let mut hits = BTreeMap::new();
        for key in keys {
            if let Some(value) = all.remove(key) {
                hits.insert(key.clone(), value);
            }
        }
        Ok(hits)
    }

    fn set(&self, entries: BTreeMap<String, String>) -> EngineResult<()> {
        let mut all = self.read_all()?;
        all.extend(entries);
        self.write_all(&all)
    }
}

/// In-memory store used by tests and one-shot tooling.
#[derive(Debug, Default)]
pub struct MemoryCacheStore {
    entries: Mutex<BTreeMap<String, String>>,
}

impl MemoryCacheStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn locked(&self) -> EngineResult<std::sync::MutexGuard<'_, BTreeMap<String, String>>> {
        self.entries.lock().map_err(|_| {
            EngineError::new("cache.lock_poisoned", "in-memory cache mutex is poisoned")
        })
    }
}

impl CacheStore for MemoryCacheStore {
    fn get(&self, key: &str) -> EngineResult<Option<String>> {
        Ok(self.locked()?.get(key).cloned())
    }

    fn get_many(&self, keys: &[String]) -> EngineResult<BTreeMap<String, String>> {
        let entries = self.locked()?;
        let mut hits = BTreeMap::new();
        for key in keys {
            if let Some(value) = entries.get(key) {
                hits.insert(key.clone(), value.clone());
            }
        }
        Ok(hits)
    }

    fn set(&self, entries: BTreeMap<String, String>) -> EngineResult<()> {
        self.locked()?.extend(entries);
        Ok(())
    }
}
