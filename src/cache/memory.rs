//! In-memory TTL cache backed by moka.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use moka::future::Cache as MokaCache;
use moka::policy::EvictionPolicy;
use moka::Expiry;

use super::{glob_to_regex, Cache, CacheError};
use crate::config::MAX_CACHE_ENTRIES;

/// Stored value plus the TTL it was written with.
#[derive(Clone)]
struct Timed<V> {
    value: V,
    ttl: Duration,
}

/// Expires each entry after the TTL given to its own `set` call.
struct PerEntryTtl;

impl<V> Expiry<String, Timed<V>> for PerEntryTtl {
    fn expire_after_create(
        &self,
        _key: &String,
        value: &Timed<V>,
        _created_at: Instant,
    ) -> Option<Duration> {
        Some(value.ttl)
    }

    fn expire_after_update(
        &self,
        _key: &String,
        value: &Timed<V>,
        _updated_at: Instant,
        _duration_until_expiry: Option<Duration>,
    ) -> Option<Duration> {
        Some(value.ttl)
    }
}

/// Process-local cache bounded by entry count.
///
/// When full, the least recently used entry is evicted.
pub struct MemoryCache<V> {
    entries: MokaCache<String, Timed<V>>,
}

impl<V> Default for MemoryCache<V>
where
    V: Clone + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new(MAX_CACHE_ENTRIES)
    }
}

impl<V> MemoryCache<V>
where
    V: Clone + Send + Sync + 'static,
{
    pub fn new(max_entries: usize) -> Self {
        let entries = MokaCache::builder()
            .max_capacity(max_entries.max(1) as u64)
            .eviction_policy(EvictionPolicy::lru())
            .expire_after(PerEntryTtl)
            .build();
        Self { entries }
    }
}

#[async_trait]
impl<V> Cache<V> for MemoryCache<V>
where
    V: Clone + Send + Sync + 'static,
{
    async fn get(&self, key: &str) -> Option<V> {
        self.entries.get(key).await.map(|timed| timed.value)
    }

    async fn set(&self, key: &str, value: V, ttl: Duration) -> Result<(), CacheError> {
        self.entries
            .insert(key.to_string(), Timed { value, ttl })
            .await;
        Ok(())
    }

    async fn invalidate(&self, key: &str) -> Result<bool, CacheError> {
        Ok(self.entries.remove(key).await.is_some())
    }

    async fn invalidate_pattern(&self, pattern: &str) -> Result<usize, CacheError> {
        let re = glob_to_regex(pattern)?;
        let matching: Vec<String> = self
            .entries
            .iter()
            .filter(|(key, _)| re.is_match(key.as_str()))
            .map(|(key, _)| key.to_string())
            .collect();
        for key in &matching {
            self.entries.invalidate(key).await;
        }
        log::debug!("Invalidated {} cache entries matching {pattern}", matching.len());
        Ok(matching.len())
    }

    async fn clear(&self) -> Result<(), CacheError> {
        self.entries.invalidate_all();
        self.entries.run_pending_tasks().await;
        Ok(())
    }

    async fn len(&self) -> usize {
        // moka applies evictions lazily
        self.entries.run_pending_tasks().await;
        self.entries.entry_count() as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TTL: Duration = Duration::from_secs(60);

    #[tokio::test]
    async fn test_get_and_set() {
        let cache = MemoryCache::default();
        assert_eq!(cache.get("a").await, None::<u32>);
        cache.set("a", 1u32, TTL).await.unwrap();
        assert_eq!(cache.get("a").await, Some(1));
        assert_eq!(cache.len().await, 1);
    }

    #[tokio::test]
    async fn test_entries_expire_with_their_own_ttl() {
        let cache = MemoryCache::default();
        cache
            .set("short", "v".to_string(), Duration::from_millis(50))
            .await
            .unwrap();
        cache.set("long", "w".to_string(), TTL).await.unwrap();
        assert_eq!(cache.get("short").await.as_deref(), Some("v"));

        tokio::time::sleep(Duration::from_millis(150)).await;
        assert_eq!(cache.get("short").await, None);
        assert_eq!(cache.get("long").await.as_deref(), Some("w"));
    }

    #[tokio::test]
    async fn test_rewrite_takes_new_ttl() {
        let cache = MemoryCache::default();
        cache.set("a", 1u8, TTL).await.unwrap();
        cache.set("a", 2u8, Duration::from_millis(50)).await.unwrap();
        tokio::time::sleep(Duration::from_millis(150)).await;
        assert_eq!(cache.get("a").await, None);
    }

    #[tokio::test]
    async fn test_capacity_is_bounded() {
        let cache = MemoryCache::new(2);
        cache.set("first", 1u8, TTL).await.unwrap();
        cache.set("second", 2u8, TTL).await.unwrap();
        cache.set("third", 3u8, TTL).await.unwrap();

        assert_eq!(cache.len().await, 2);
        assert_eq!(cache.get("first").await, None);
        assert_eq!(cache.get("third").await, Some(3));
    }

    #[tokio::test]
    async fn test_overwrite_does_not_evict() {
        let cache = MemoryCache::new(1);
        cache.set("a", 1u8, TTL).await.unwrap();
        cache.set("a", 2u8, TTL).await.unwrap();
        assert_eq!(cache.get("a").await, Some(2));
        assert_eq!(cache.len().await, 1);
    }

    #[tokio::test]
    async fn test_invalidate_and_pattern() {
        let cache = MemoryCache::default();
        cache.set("whois:a.com", 1u8, TTL).await.unwrap();
        cache.set("whois:b.com", 2u8, TTL).await.unwrap();
        cache.set("ssl:a.com", 3u8, TTL).await.unwrap();

        assert!(cache.invalidate("ssl:a.com").await.unwrap());
        assert!(!cache.invalidate("ssl:a.com").await.unwrap());
        assert_eq!(cache.invalidate_pattern("whois:*").await.unwrap(), 2);
        assert!(cache.is_empty().await);
    }

    #[tokio::test]
    async fn test_clear() {
        let cache = MemoryCache::default();
        cache.set("a", 1u8, TTL).await.unwrap();
        cache.clear().await.unwrap();
        assert_eq!(cache.get("a").await, None);
        assert_eq!(cache.len().await, 0);
    }
}
