//! Path-keyed load-or-compute cache for expensive results.
//!
//! Each key maps to one pretty-printed JSON file inside the cache directory.
//! The numerical modules never touch the cache; callers wrap whole
//! computations (a parameter sweep, a batch of estimates) with it.

use crate::error::Result;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::{Path, PathBuf};

/// JSON file cache rooted at a directory.
#[derive(Debug, Clone)]
pub struct JsonCache {
    dir: PathBuf,
}

impl JsonCache {
    /// Cache in `dir`; the directory is created on first write.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// File backing `key`. Characters outside `[A-Za-z0-9._-]` become `_`.
    pub fn path_for(&self, key: &str) -> PathBuf {
        let name: String = key
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        self.dir.join(format!("{name}.json"))
    }

    /// Whether a stored value exists for `key`.
    pub fn contains(&self, key: &str) -> bool {
        self.path_for(key).is_file()
    }

    /// Load the stored value for `key`, if any.
    pub fn load<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        let path = self.path_for(key);
        if !path.is_file() {
            return Ok(None);
        }
        let json = std::fs::read_to_string(&path)?;
        Ok(Some(serde_json::from_str(&json)?))
    }

    /// Store `value` under `key`, replacing any previous value.
    pub fn store<T: Serialize>(&self, key: &str, value: &T) -> Result<()> {
        std::fs::create_dir_all(&self.dir)?;
        let path = self.path_for(key);
        let json = serde_json::to_string_pretty(value)?;
        std::fs::write(&path, json)?;
        tracing::debug!(path = %path.display(), "cache write");
        Ok(())
    }

    /// Return the stored value for `key`, or compute, store and return it.
    ///
    /// A stored file that fails to parse is an error, not a miss.
    pub fn get_or_compute<T, F>(&self, key: &str, compute: F) -> Result<T>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Result<T>,
    {
        if let Some(value) = self.load(key)? {
            tracing::debug!(key, "cache hit");
            return Ok(value);
        }
        tracing::debug!(key, "cache miss");
        let value = compute()?;
        self.store(key, &value)?;
        Ok(value)
    }

    /// Remove the stored value for `key`. Returns whether a file was removed.
    pub fn invalidate(&self, key: &str) -> Result<bool> {
        let path = self.path_for(key);
        if path.is_file() {
            std::fs::remove_file(&path)?;
            Ok(true)
        } else {
            Ok(false)
        }
    }
}
