//! Arcana Cache -- layered result cache for engine outputs
//!
//! L1 is a per-process in-memory map with per-entry TTL; L2 is an optional
//! Redis store shared across processes. The manager is read-through and
//! write-through: gets check L1 then L2 (promoting L2 hits), puts write
//! both. Cache failures never fail a request -- a put may fail silently and
//! any get error is a miss.

pub mod l1;
pub mod l2;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tracing::{debug, warn};

pub use l1::{CacheEntry, L1Cache};
pub use l2::L2Cache;

/// Default TTL for cached results: 24 hours.
pub const DEFAULT_TTL: Duration = Duration::from_secs(86_400);

/// Aggregate hit/miss statistics.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct CacheStats {
    pub l1_hits: u64,
    pub l2_hits: u64,
    pub misses: u64,
    pub puts: u64,
    pub put_failures: u64,
}

impl CacheStats {
    pub fn hit_rate(&self) -> f64 {
        let total = self.l1_hits + self.l2_hits + self.misses;
        if total == 0 {
            0.0
        } else {
            (self.l1_hits + self.l2_hits) as f64 / total as f64
        }
    }
}

#[derive(Default)]
struct Counters {
    l1_hits: AtomicU64,
    l2_hits: AtomicU64,
    misses: AtomicU64,
    puts: AtomicU64,
    put_failures: AtomicU64,
}

/// Two-layer cache manager.
pub struct CacheManager {
    l1: L1Cache,
    l2: Option<L2Cache>,
    default_ttl: Duration,
    counters: Counters,
}

impl CacheManager {
    /// Build a manager; `redis_url = None` runs L1-only.
    pub fn new(redis_url: Option<&str>, max_l1_entries: usize, default_ttl: Duration) -> Self {
        let l2 = redis_url.and_then(|url| match L2Cache::new(url) {
            Ok(l2) => Some(l2),
            Err(e) => {
                warn!(error = %e, "L2 cache disabled");
                None
            }
        });
        Self {
            l1: L1Cache::new(max_l1_entries),
            l2,
            default_ttl,
            counters: Counters::default(),
        }
    }

    /// In-memory only, with the default TTL. Used by tests and by deployments
    /// without Redis.
    pub fn in_memory() -> Self {
        Self::new(None, 4096, DEFAULT_TTL)
    }

    pub fn default_ttl(&self) -> Duration {
        self.default_ttl
    }

    /// Read-through get: L1, then L2 (promoting hits into L1).
    pub async fn get(&self, key: &str) -> Option<Value> {
        if let Some(value) = self.l1.get(key) {
            self.counters.l1_hits.fetch_add(1, Ordering::Relaxed);
            return Some(value);
        }
        if let Some(ref l2) = self.l2 {
            if let Some(value) = l2.get(key).await {
                self.counters.l2_hits.fetch_add(1, Ordering::Relaxed);
                self.l1.put(key, "", &value, self.default_ttl);
                return Some(value);
            }
        }
        self.counters.misses.fetch_add(1, Ordering::Relaxed);
        None
    }

    /// Write-through put into both layers. L2 failures are swallowed.
    pub async fn put(&self, key: &str, engine_name: &str, value: &Value, ttl: Option<Duration>) {
        let ttl = ttl.unwrap_or(self.default_ttl);
        self.l1.put(key, engine_name, value, ttl);
        self.counters.puts.fetch_add(1, Ordering::Relaxed);

        if let Some(ref l2) = self.l2 {
            if let Err(e) = l2.put(key, value, ttl).await {
                self.counters.put_failures.fetch_add(1, Ordering::Relaxed);
                debug!(key, error = %e, "L2 put failed silently");
            }
        }
    }

    pub async fn invalidate(&self, key: &str) {
        self.l1.invalidate(key);
        if let Some(ref l2) = self.l2 {
            if let Err(e) = l2.invalidate(key).await {
                debug!(key, error = %e, "L2 invalidate failed");
            }
        }
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            l1_hits: self.counters.l1_hits.load(Ordering::Relaxed),
            l2_hits: self.counters.l2_hits.load(Ordering::Relaxed),
            misses: self.counters.misses.load(Ordering::Relaxed),
            puts: self.counters.puts.load(Ordering::Relaxed),
            put_failures: self.counters.put_failures.load(Ordering::Relaxed),
        }
    }

    /// Whether a second layer is configured and reachable at startup.
    pub fn has_l2(&self) -> bool {
        self.l2.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn get_put_through_manager() {
        let cache = CacheManager::in_memory();
        assert_eq!(cache.get("calc:tarot:abc").await, None);

        cache.put("calc:tarot:abc", "tarot", &json!({"card": "The Fool"}), None).await;
        assert_eq!(cache.get("calc:tarot:abc").await, Some(json!({"card": "The Fool"})));

        let stats = cache.stats();
        assert_eq!(stats.l1_hits, 1);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.puts, 1);
    }

    #[tokio::test]
    async fn invalidate_removes_entry() {
        let cache = CacheManager::in_memory();
        cache.put("k", "e", &json!(1), None).await;
        cache.invalidate("k").await;
        assert_eq!(cache.get("k").await, None);
    }

    #[tokio::test]
    async fn hit_rate_reflects_traffic() {
        let cache = CacheManager::in_memory();
        cache.put("k", "e", &json!(1), None).await;
        cache.get("k").await;
        cache.get("k").await;
        cache.get("missing").await;
        let stats = cache.stats();
        assert!((stats.hit_rate() - 2.0 / 3.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn bad_redis_url_degrades_to_l1_only() {
        let cache = CacheManager::new(Some("not-a-url"), 64, DEFAULT_TTL);
        assert!(!cache.has_l2());
        cache.put("k", "e", &json!(1), None).await;
        assert_eq!(cache.get("k").await, Some(json!(1)));
    }
}
