//! In-memory response cache
//!
//! Successful responses only, keyed by tool and normalised target, each entry
//! valid for a fixed TTL. Nothing is written to disk.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::RwLock;
use std::time::Duration;

use serde::Serialize;
use tokio::time::Instant;
use url::Url;

use crate::tool::{TargetKind, Tool};

/// Entries kept before the oldest are evicted.
const DEFAULT_MAX_ENTRIES: usize = 1_024;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct CacheKey {
    tool: u8,
    target: String,
}

impl CacheKey {
    /// Hosts fold case; URL paths and queries do not.
    fn new(tool: Tool, target: &str) -> Self {
        let target = target.trim();
        let target = match tool.target_kind() {
            TargetKind::Url => Url::parse(target)
                .map_or_else(|_| target.to_string(), |url| url.to_string()),
            _ => target.to_lowercase(),
        };
        Self {
            tool: tool.id(),
            target,
        }
    }
}

#[derive(Debug, Clone)]
struct CacheEntry {
    data: String,
    stored_at: Instant,
}

/// Snapshot of cache usage.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub entries: usize,
    pub hits: u64,
    pub misses: u64,
}

#[derive(Debug)]
pub struct ResponseCache {
    entries: RwLock<HashMap<CacheKey, CacheEntry>>,
    ttl: Duration,
    max_entries: usize,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl ResponseCache {
    pub fn new(ttl: Duration) -> Self {
        Self::with_capacity(ttl, DEFAULT_MAX_ENTRIES)
    }

    pub fn with_capacity(ttl: Duration, max_entries: usize) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            ttl,
            max_entries: max_entries.max(1),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Cached body for `tool`/`target`, if present and not expired.
    pub fn get(&self, tool: Tool, target: &str) -> Option<String> {
        let key = CacheKey::new(tool, target);
        let hit = self.entries.read().ok().and_then(|entries| {
            entries
                .get(&key)
                .filter(|entry| entry.stored_at.elapsed() < self.ttl)
                .map(|entry| entry.data.clone())
        });

        if hit.is_some() {
            self.hits.fetch_add(1, Ordering::Relaxed);
        } else {
            self.misses.fetch_add(1, Ordering::Relaxed);
        }
        hit
    }

    pub fn insert(&self, tool: Tool, target: &str, data: &str) {
        let Ok(mut entries) = self.entries.write() else {
            return;
        };

        entries.insert(
            CacheKey::new(tool, target),
            CacheEntry {
                data: data.to_string(),
                stored_at: Instant::now(),
            },
        );

        if entries.len() > self.max_entries {
            let ttl = self.ttl;
            entries.retain(|_, entry| entry.stored_at.elapsed() < ttl);
        }
        while entries.len() > self.max_entries {
            let oldest = entries
                .iter()
                .min_by_key(|(_, entry)| entry.stored_at)
                .map(|(key, _)| key.clone());
            match oldest {
                Some(key) => entries.remove(&key),
                None => break,
            };
        }
    }

    /// Drop every entry and reset the counters.
    pub fn clear(&self) {
        if let Ok(mut entries) = self.entries.write() {
            entries.clear();
        }
        self.hits.store(0, Ordering::Relaxed);
        self.misses.store(0, Ordering::Relaxed);
    }

    /// Remove expired entries; returns how many were removed.
    pub fn purge_expired(&self) -> usize {
        let Ok(mut entries) = self.entries.write() else {
            return 0;
        };
        let before = entries.len();
        let ttl = self.ttl;
        entries.retain(|_, entry| entry.stored_at.elapsed() < ttl);
        before - entries.len()
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            entries: self.entries.read().map(|e| e.len()).unwrap_or_default(),
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn get_after_insert() {
        let cache = ResponseCache::new(Duration::from_secs(60));
        assert_eq!(cache.get(Tool::Dns, "example.com"), None);
        cache.insert(Tool::Dns, "example.com", "A : 93.184.216.34");
        assert_eq!(
            cache.get(Tool::Dns, "example.com").as_deref(),
            Some("A : 93.184.216.34")
        );
        assert_eq!(
            cache.stats(),
            CacheStats {
                entries: 1,
                hits: 1,
                misses: 1
            }
        );
    }

    #[tokio::test(start_paused = true)]
    async fn key_ignores_case_and_whitespace() {
        let cache = ResponseCache::new(Duration::from_secs(60));
        cache.insert(Tool::Dns, "Example.COM", "data");
        assert!(cache.get(Tool::Dns, "  example.com ").is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn url_key_keeps_path_case() {
        let cache = ResponseCache::new(Duration::from_secs(60));
        cache.insert(Tool::PageLinks, "https://Example.COM/Admin", "admin links");
        assert!(cache.get(Tool::PageLinks, "https://example.com/admin").is_none());
        assert_eq!(
            cache.get(Tool::PageLinks, "HTTPS://example.com/Admin").as_deref(),
            Some("admin links")
        );
    }

    #[tokio::test(start_paused = true)]
    async fn key_includes_tool() {
        let cache = ResponseCache::new(Duration::from_secs(60));
        cache.insert(Tool::Dns, "example.com", "dns");
        assert!(cache.get(Tool::Whois, "example.com").is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn entries_expire() {
        let cache = ResponseCache::new(Duration::from_secs(10));
        cache.insert(Tool::Dns, "example.com", "data");
        tokio::time::advance(Duration::from_secs(9)).await;
        assert!(cache.get(Tool::Dns, "example.com").is_some());
        tokio::time::advance(Duration::from_secs(2)).await;
        assert!(cache.get(Tool::Dns, "example.com").is_none());
        assert_eq!(cache.purge_expired(), 1);
        assert_eq!(cache.stats().entries, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn oldest_evicted_at_capacity() {
        let cache = ResponseCache::with_capacity(Duration::from_secs(600), 2);
        cache.insert(Tool::Dns, "a.com", "a");
        tokio::time::advance(Duration::from_secs(1)).await;
        cache.insert(Tool::Dns, "b.com", "b");
        tokio::time::advance(Duration::from_secs(1)).await;
        cache.insert(Tool::Dns, "c.com", "c");

        assert!(cache.get(Tool::Dns, "a.com").is_none());
        assert!(cache.get(Tool::Dns, "b.com").is_some());
        assert!(cache.get(Tool::Dns, "c.com").is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn clear_resets_everything() {
        let cache = ResponseCache::new(Duration::from_secs(60));
        cache.insert(Tool::Dns, "example.com", "data");
        let _ = cache.get(Tool::Dns, "example.com");
        cache.clear();
        assert_eq!(cache.stats(), CacheStats::default());
    }
}
