use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use serde::Serialize;
use sha2::{Digest, Sha256};

/// Internal cache entry with timestamp and its own TTL
struct CacheEntry<T> {
    data: T,
    cached_at: DateTime<Utc>,
    ttl: Duration,
}

impl<T> CacheEntry<T> {
    fn is_fresh(&self, now: DateTime<Utc>) -> bool {
        now - self.cached_at < self.ttl
    }
}

/// Key/TTL cache used by the analysis engines.
///
/// Plain get-or-compute: two concurrent misses on the same key both
/// recompute and the later write wins.
pub struct TtlCache<V> {
    entries: DashMap<String, CacheEntry<V>>,
}

impl<V: Clone> TtlCache<V> {
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
        }
    }

    /// Fresh value for `key`, if any. Expired entries are dropped on read.
    pub fn get(&self, key: &str) -> Option<V> {
        let now = Utc::now();
        if let Some(entry) = self.entries.get(key) {
            if entry.is_fresh(now) {
                return Some(entry.data.clone());
            }
        } else {
            return None;
        }
        self.entries.remove(key);
        None
    }

    pub fn set(&self, key: impl Into<String>, value: V, ttl: Duration) {
        self.entries.insert(
            key.into(),
            CacheEntry {
                data: value,
                cached_at: Utc::now(),
                ttl,
            },
        );
    }

    /// Remove every entry whose key starts with `prefix`. Returns how many were removed.
    pub fn invalidate_prefix(&self, prefix: &str) -> usize {
        let before = self.entries.len();
        self.entries.retain(|key, _| !key.starts_with(prefix));
        before - self.entries.len()
    }

    pub fn purge_expired(&self) -> usize {
        let now = Utc::now();
        let before = self.entries.len();
        self.entries.retain(|_, entry| entry.is_fresh(now));
        before - self.entries.len()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<V: Clone> Default for TtlCache<V> {
    fn default() -> Self {
        Self::new()
    }
}

/// Short SHA-256 fingerprint of any serializable input, used in cache keys
/// so identical inputs map to the same entry.
pub fn fingerprint<T: Serialize + ?Sized>(value: &T) -> String {
    let bytes = serde_json::to_vec(value).unwrap_or_default();
    let mut hasher = Sha256::new();
    hasher.update(&bytes);
    let digest = hex::encode(hasher.finalize());
    digest[..16].to_string()
}
