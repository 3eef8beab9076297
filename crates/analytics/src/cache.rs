//! Result caching keyed by computation name and parameters.
//!
//! Values are stored as JSON so that any key-value store with expiry can stand in
//! for the in-process `InMemoryCache`.

use dashmap::DashMap;
use serde_json::Value;
use std::fmt;
use std::time::{Duration, Instant};

/// Deterministic encoding of a computation plus every parameter affecting it,
/// e.g. `date_range:"52":"26"`.
///
/// Every present part is written as a JSON string literal and an absent one as
/// `null`, so no parameter value can imitate a separator or a missing part.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey(String);

impl CacheKey {
    pub fn new(computation: &str) -> Self {
        Self(computation.to_string())
    }

    pub fn with(mut self, part: impl fmt::Display) -> Self {
        self.0.push(':');
        self.0.push_str(&Value::String(part.to_string()).to_string());
        self
    }

    pub fn with_opt<T: fmt::Display>(mut self, part: Option<T>) -> Self {
        match part {
            Some(value) => self.with(value),
            None => {
                self.0.push_str(":null");
                self
            }
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A key-value store with per-entry expiry. Concurrent writes to the same key are
/// last-write-wins.
pub trait ResultCache: Send + Sync {
    fn get(&self, key: &CacheKey) -> Option<Value>;
    fn set(&self, key: CacheKey, value: Value, ttl: Duration);
}

#[derive(Debug)]
struct CacheEntry {
    value: Value,
    expires_at: Instant,
}

impl CacheEntry {
    fn is_live(&self, now: Instant) -> bool {
        self.expires_at > now
    }
}

/// Process-local cache. Expired entries are misses and are evicted on access.
#[derive(Debug, Default)]
pub struct InMemoryCache {
    entries: DashMap<CacheKey, CacheEntry>,
}

impl InMemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored entries, expired ones included.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drops every expired entry and returns how many were removed.
    pub fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let before = self.entries.len();
        self.entries.retain(|_, entry| entry.is_live(now));
        before.saturating_sub(self.entries.len())
    }
}

impl ResultCache for InMemoryCache {
    fn get(&self, key: &CacheKey) -> Option<Value> {
        let now = Instant::now();
        if let Some(entry) = self.entries.get(key) {
            if entry.is_live(now) {
                return Some(entry.value.clone());
            }
        }
        // The read guard is released; a fresh `set` in between survives.
        self.entries.remove_if(key, |_, entry| !entry.is_live(now));
        None
    }

    fn set(&self, key: CacheKey, value: Value, ttl: Duration) {
        self.entries.insert(
            key,
            CacheEntry {
                value,
                expires_at: Instant::now() + ttl,
            },
        );
    }
}
