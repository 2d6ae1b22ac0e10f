//! On-disk JSON cache.
//!
//! One file per key under a cache directory. Useful for CLI runs, where an
//! in-memory cache would not outlive the process.

use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use super::{glob_to_regex, Cache, CacheError};

#[derive(Serialize, Deserialize)]
struct FileEntry<V> {
    key: String,
    cached_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
    value: V,
}

/// JSON file cache rooted at a directory.
pub struct FileCache<V> {
    dir: PathBuf,
    _value: PhantomData<fn() -> V>,
}

impl<V> FileCache<V> {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            _value: PhantomData,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// File names must stay the same across builds so a cache directory
    /// survives upgrades.
    fn path_for(&self, key: &str) -> PathBuf {
        let readable: String = key
            .chars()
            .take(64)
            .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
            .collect();
        let mut hasher = Sha256::new();
        hasher.update(key.as_bytes());
        self.dir
            .join(format!("{readable}-{:x}.json", hasher.finalize()))
    }

    async fn cache_files(&self) -> Result<Vec<PathBuf>, CacheError> {
        let mut files = Vec::new();
        let mut dir = match tokio::fs::read_dir(&self.dir).await {
            Ok(dir) => dir,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(files),
            Err(e) => return Err(e.into()),
        };
        while let Some(entry) = dir.next_entry().await? {
            let path = entry.path();
            if path.extension().is_some_and(|ext| ext == "json") {
                files.push(path);
            }
        }
        Ok(files)
    }
}

/// Reads just the key of an entry, ignoring its value type.
#[derive(Deserialize)]
struct KeyOnly {
    key: String,
}

#[async_trait]
impl<V> Cache<V> for FileCache<V>
where
    V: Clone + Send + Sync + Serialize + DeserializeOwned + 'static,
{
    async fn get(&self, key: &str) -> Option<V> {
        let path = self.path_for(key);
        let content = tokio::fs::read_to_string(&path).await.ok()?;
        let entry: FileEntry<V> = match serde_json::from_str(&content) {
            Ok(entry) => entry,
            Err(e) => {
                log::warn!("Discarding unreadable cache file {}: {e}", path.display());
                let _ = tokio::fs::remove_file(&path).await;
                return None;
            }
        };
        if entry.key != key {
            return None;
        }
        if entry.expires_at <= Utc::now() {
            // Expired, delete it
            let _ = tokio::fs::remove_file(&path).await;
            return None;
        }
        Some(entry.value)
    }

    async fn set(&self, key: &str, value: V, ttl: Duration) -> Result<(), CacheError> {
        tokio::fs::create_dir_all(&self.dir).await?;
        let now = Utc::now();
        let ttl = chrono::Duration::from_std(ttl).unwrap_or(chrono::Duration::MAX);
        let entry = FileEntry {
            key: key.to_string(),
            cached_at: now,
            expires_at: now.checked_add_signed(ttl).unwrap_or(DateTime::<Utc>::MAX_UTC),
            value,
        };
        let content = serde_json::to_string(&entry)?;
        tokio::fs::write(self.path_for(key), content).await?;
        Ok(())
    }

    async fn invalidate(&self, key: &str) -> Result<bool, CacheError> {
        match tokio::fs::remove_file(self.path_for(key)).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    async fn invalidate_pattern(&self, pattern: &str) -> Result<usize, CacheError> {
        let re = glob_to_regex(pattern)?;
        let mut removed = 0;
        for path in self.cache_files().await? {
            let Ok(content) = tokio::fs::read_to_string(&path).await else {
                continue;
            };
            let Ok(entry) = serde_json::from_str::<KeyOnly>(&content) else {
                continue;
            };
            if re.is_match(&entry.key) {
                tokio::fs::remove_file(&path).await?;
                removed += 1;
            }
        }
        Ok(removed)
    }

    async fn clear(&self) -> Result<(), CacheError> {
        for path in self.cache_files().await? {
            tokio::fs::remove_file(&path).await?;
        }
        Ok(())
    }

    async fn len(&self) -> usize {
        self.cache_files().await.map(|f| f.len()).unwrap_or(0)
    }
}
