//! Pluggable result caches.
//!
//! Every analyzer and the orchestrator talk to a [`Cache`] trait object, so the
//! storage can be swapped (in-memory for a long-running process, JSON files on
//! disk for repeated CLI runs) without touching the analyzers.
//!
//! A read returns `Some(value)` on a hit and `None` on a miss or expiry; callers
//! never infer hits from timestamps.

mod file;
mod memory;

use std::time::Duration;

use async_trait::async_trait;
use regex::Regex;
use thiserror::Error;

pub use file::FileCache;
pub use memory::MemoryCache;

/// Cache backend failure. Reads never fail; writes and invalidations may.
#[derive(Error, Debug)]
pub enum CacheError {
    #[error("Cache I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Cache serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid cache key pattern '{0}'")]
    InvalidPattern(String),
}

/// Key-value store with per-entry TTL.
#[async_trait]
pub trait Cache<V>: Send + Sync
where
    V: Clone + Send + Sync + 'static,
{
    /// Returns the live value for `key`, if any.
    async fn get(&self, key: &str) -> Option<V>;

    async fn set(&self, key: &str, value: V, ttl: Duration) -> Result<(), CacheError>;

    /// Removes one entry. Returns whether it existed.
    async fn invalidate(&self, key: &str) -> Result<bool, CacheError>;

    /// Removes every entry whose key matches a glob (`*` and `?` wildcards).
    /// Returns the number of removed entries.
    async fn invalidate_pattern(&self, pattern: &str) -> Result<usize, CacheError>;

    async fn clear(&self) -> Result<(), CacheError>;

    /// Number of stored entries (expired entries may still be counted).
    async fn len(&self) -> usize;

    async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

/// Builds a namespaced cache key, e.g. `whois:example.com`.
pub fn cache_key(namespace: &str, id: &str) -> String {
    format!("{namespace}:{id}")
}

/// Compiles a glob pattern into an anchored regex.
pub(crate) fn glob_to_regex(pattern: &str) -> Result<Regex, CacheError> {
    let mut re = String::with_capacity(pattern.len() + 8);
    re.push('^');
    for c in pattern.chars() {
        match c {
            '*' => re.push_str(".*"),
            '?' => re.push('.'),
            other => re.push_str(&regex::escape(&other.to_string())),
        }
    }
    re.push('$');
    Regex::new(&re).map_err(|_| CacheError::InvalidPattern(pattern.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_key() {
        assert_eq!(cache_key("whois", "example.com"), "whois:example.com");
    }

    #[test]
    fn test_glob_to_regex() {
        let re = glob_to_regex("whois:*.com").unwrap();
        assert!(re.is_match("whois:example.com"));
        assert!(!re.is_match("ssl:example.com"));
        assert!(!re.is_match("whois:example.org"));

        let re = glob_to_regex("ssl:exampl?.org").unwrap();
        assert!(re.is_match("ssl:example.org"));
        assert!(!re.is_match("ssl:examples.org"));
    }

    #[test]
    fn test_glob_escapes_regex_metacharacters() {
        let re = glob_to_regex("analysis:https://a.com/?q=(1)").unwrap();
        assert!(re.is_match("analysis:https://a.com/xq=(1)"));
        assert!(!re.is_match("analysis:https://aXcom/xq=(1)"));
    }
}
