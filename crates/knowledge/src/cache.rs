//! In-memory content cache with expiry and size-budget eviction.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde_json::Value;
use tokio::sync::RwLock;
use tracing::{debug, info};
use vidya_common::{CachedContent, ContentCache, Result};

use crate::types::{CacheStats, KnowledgeConfig};

/// Share of entries dropped when the cache is over budget.
const EVICTION_FRACTION: f64 = 0.2;

const MAX_EXPIRY_HOURS: u64 = 24 * 365 * 100;

#[derive(Debug, Clone)]
struct Entry {
    data: Value,
    size_bytes: usize,
    cached_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
    last_accessed: DateTime<Utc>,
    access_count: u64,
}

impl Entry {
    fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}

type Key = (String, String);

pub struct InMemoryContentCache {
    max_bytes: u64,
    entries: RwLock<HashMap<Key, Entry>>,
}

impl InMemoryContentCache {
    pub fn new(config: &KnowledgeConfig) -> Self {
        Self::with_budget_bytes(config.max_cache_size_mb.saturating_mul(1024 * 1024))
    }

    pub fn with_budget_bytes(max_bytes: u64) -> Self {
        info!(max_bytes, "Initializing content cache");
        Self {
            max_bytes,
            entries: RwLock::new(HashMap::new()),
        }
    }

    pub fn with_default_config() -> Self {
        Self::new(&KnowledgeConfig::default())
    }

    pub async fn is_content_cached(&self, content_type: &str, content_id: &str) -> bool {
        let entries = self.entries.read().await;
        entries
            .get(&(content_type.to_string(), content_id.to_string()))
            .is_some_and(|e| !e.is_expired(Utc::now()))
    }

    pub async fn stats(&self) -> CacheStats {
        let entries = self.entries.read().await;
        let mut stats = CacheStats::default();
        for ((content_type, _), entry) in entries.iter() {
            stats.total_items += 1;
            stats.total_bytes += entry.size_bytes;
            let usage = stats.by_type.entry(content_type.clone()).or_default();
            usage.count += 1;
            usage.bytes += entry.size_bytes;
        }
        stats.total_mb = stats.total_bytes as f64 / (1024.0 * 1024.0);
        stats
    }

    /// Drop expired entries, then the least-used fifth while over budget.
    /// Returns the number of entries removed.
    pub async fn cleanup(&self) -> usize {
        let mut entries = self.entries.write().await;
        let now = Utc::now();
        let before = entries.len();
        entries.retain(|_, e| !e.is_expired(now));

        let total_bytes: u64 = entries.values().map(|e| e.size_bytes as u64).sum();
        if total_bytes > self.max_bytes {
            let evict = ((entries.len() as f64 * EVICTION_FRACTION) as usize).max(1);
            let mut victims: Vec<(Key, u64, DateTime<Utc>)> = entries
                .iter()
                .map(|(k, e)| (k.clone(), e.access_count, e.last_accessed))
                .collect();
            victims.sort_by(|a, b| a.1.cmp(&b.1).then(a.2.cmp(&b.2)));
            for (key, _, _) in victims.into_iter().take(evict) {
                debug!(content_type = %key.0, content_id = %key.1, "Evicting cached content");
                entries.remove(&key);
            }
        }

        before - entries.len()
    }
}

impl Default for InMemoryContentCache {
    fn default() -> Self {
        Self::with_default_config()
    }
}

#[async_trait]
impl ContentCache for InMemoryContentCache {
    async fn get_cached_content(
        &self,
        content_type: &str,
        content_id: &str,
    ) -> Result<Option<CachedContent>> {
        let mut entries = self.entries.write().await;
        let now = Utc::now();
        let Some(entry) = entries.get_mut(&(content_type.to_string(), content_id.to_string()))
        else {
            return Ok(None);
        };
        if entry.is_expired(now) {
            return Ok(None);
        }

        entry.access_count += 1;
        entry.last_accessed = now;

        Ok(Some(CachedContent {
            content_type: content_type.to_string(),
            content_id: content_id.to_string(),
            data: entry.data.clone(),
            size_bytes: entry.size_bytes,
            cached_at: entry.cached_at,
            expires_at: entry.expires_at,
            access_count: entry.access_count,
        }))
    }

    async fn save_downloaded_content(
        &self,
        content_type: &str,
        content_id: &str,
        data: Value,
        expires_hours: u64,
    ) -> Result<()> {
        let size_bytes = serde_json::to_vec(&data)?.len();
        let now = Utc::now();
        let expires_at = now + Duration::hours(expires_hours.min(MAX_EXPIRY_HOURS) as i64);

        debug!(
            content_type = %content_type,
            content_id = %content_id,
            size_bytes,
            expires_hours,
            "Caching content"
        );

        {
            let mut entries = self.entries.write().await;
            entries.insert(
                (content_type.to_string(), content_id.to_string()),
                Entry {
                    data,
                    size_bytes,
                    cached_at: now,
                    expires_at,
                    last_accessed: now,
                    access_count: 0,
                },
            );
        }

        self.cleanup().await;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn save_and_get() {
        let cache = InMemoryContentCache::with_default_config();
        cache
            .save_downloaded_content("youtube_recommendations", "Science", json!([{"t": 1}]), 48)
            .await
            .unwrap();

        let hit = cache
            .get_cached_content("youtube_recommendations", "Science")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(hit.data, json!([{"t": 1}]));
        assert_eq!(hit.access_count, 1);
        assert!(hit.expires_at > hit.cached_at);

        assert!(cache
            .get_cached_content("youtube_recommendations", "Mathematics")
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn expired_entries_are_invisible() {
        let cache = InMemoryContentCache::with_default_config();
        cache
            .save_downloaded_content("notes", "n1", json!("text"), 0)
            .await
            .unwrap();
        assert!(cache.get_cached_content("notes", "n1").await.unwrap().is_none());
        assert!(!cache.is_content_cached("notes", "n1").await);
        // cleanup on save already dropped it
        assert_eq!(cache.stats().await.total_items, 0);
    }

    #[tokio::test]
    async fn over_budget_evicts_least_accessed() {
        let cache = InMemoryContentCache::with_budget_bytes(40);
        cache
            .save_downloaded_content("video", "popular", json!("aaaaaaaaaa"), 24)
            .await
            .unwrap();
        cache.get_cached_content("video", "popular").await.unwrap();
        cache
            .save_downloaded_content("video", "ignored", json!("bbbbbbbbbb"), 24)
            .await
            .unwrap();
        cache.get_cached_content("video", "ignored").await.unwrap();
        cache.get_cached_content("video", "popular").await.unwrap();

        // Third entry pushes the total past 40 bytes.
        cache
            .save_downloaded_content("video", "fresh", json!("cccccccccccccccccccc"), 24)
            .await
            .unwrap();

        assert!(cache.is_content_cached("video", "popular").await);
        assert!(cache.is_content_cached("video", "ignored").await);
        assert!(!cache.is_content_cached("video", "fresh").await);
    }

    #[tokio::test]
    async fn stats_group_by_type() {
        let cache = InMemoryContentCache::with_default_config();
        cache
            .save_downloaded_content("video", "a", json!({"k": "v"}), 1)
            .await
            .unwrap();
        cache
            .save_downloaded_content("notes", "b", json!({"k": "v"}), 1)
            .await
            .unwrap();
        let stats = cache.stats().await;
        assert_eq!(stats.total_items, 2);
        assert_eq!(stats.by_type.get("video").map(|u| u.count), Some(1));
        assert!(stats.total_bytes > 0);
    }
}
