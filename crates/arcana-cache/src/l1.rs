//! L1 cache -- in-memory with per-entry TTL
//!
//! Stores `serde_json::Value` payloads in a `DashMap` for lock-free
//! concurrent reads. Reads after expiry behave as misses and evict the
//! stale entry in passing.

use dashmap::DashMap;
use serde_json::Value;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// One cached entry.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub engine_name: String,
    pub value: Value,
    pub inserted_at: Instant,
    pub ttl: Duration,
}

impl CacheEntry {
    pub fn is_expired(&self) -> bool {
        self.inserted_at.elapsed() >= self.ttl
    }
}

/// In-memory cache layer.
pub struct L1Cache {
    entries: Arc<DashMap<String, CacheEntry>>,
    max_entries: usize,
}

impl L1Cache {
    pub fn new(max_entries: usize) -> Self {
        Self {
            entries: Arc::new(DashMap::new()),
            max_entries,
        }
    }

    /// Fetch a value; expired entries read as `None` and are evicted.
    pub fn get(&self, key: &str) -> Option<Value> {
        let expired = match self.entries.get(key) {
            Some(entry) if entry.is_expired() => true,
            Some(entry) => return Some(entry.value.clone()),
            None => return None,
        };
        if expired {
            self.entries.remove(key);
        }
        None
    }

    /// Insert a value with a TTL. When full, the oldest entry makes room.
    pub fn put(&self, key: &str, engine_name: &str, value: &Value, ttl: Duration) {
        if self.entries.len() >= self.max_entries && !self.entries.contains_key(key) {
            self.evict_oldest();
        }
        self.entries.insert(
            key.to_string(),
            CacheEntry {
                engine_name: engine_name.to_string(),
                value: value.clone(),
                inserted_at: Instant::now(),
                ttl,
            },
        );
    }

    pub fn invalidate(&self, key: &str) {
        self.entries.remove(key);
    }

    pub fn clear(&self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Sweep expired entries; returns how many were dropped.
    pub fn sweep(&self) -> usize {
        let stale: Vec<String> = self
            .entries
            .iter()
            .filter(|e| e.value().is_expired())
            .map(|e| e.key().clone())
            .collect();
        let count = stale.len();
        for key in stale {
            self.entries.remove(&key);
        }
        count
    }

    fn evict_oldest(&self) {
        let oldest = self
            .entries
            .iter()
            .min_by_key(|e| e.value().inserted_at)
            .map(|e| e.key().clone());
        if let Some(key) = oldest {
            self.entries.remove(&key);
        }
    }

    #[cfg(test)]
    pub(crate) fn insert_with_age(&self, key: &str, value: &Value, ttl: Duration, age: Duration) {
        self.entries.insert(
            key.to_string(),
            CacheEntry {
                engine_name: "test".into(),
                value: value.clone(),
                inserted_at: Instant::now() - age,
                ttl,
            },
        );
    }
}
