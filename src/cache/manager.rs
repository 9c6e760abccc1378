/// In-memory key/value cache with lazy TTL expiry
///
/// Thread-safe, generic over the value type, keyed by resource string.
/// Expired entries are removed only when their key is next accessed; there
/// is no background sweep and no size bound.
use super::config::CacheConfig;
use crate::arguments::is_debug_cache_enabled;
use crate::logger::{self, LogTag};
use chrono::Utc;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::time::Duration;
use tokio::time::Instant;

/// Cache entry with TTL tracking
struct CacheEntry<V> {
    value: V,
    stored_at: Instant,
    /// Wall-clock store time, for diagnostics only
    stored_at_epoch_ms: i64,
}

impl<V> CacheEntry<V> {
    fn new(value: V) -> Self {
        Self {
            value,
            stored_at: Instant::now(),
            stored_at_epoch_ms: Utc::now().timestamp_millis(),
        }
    }

    /// Visible only while `age < ttl`
    fn is_expired(&self, ttl: Duration) -> bool {
        self.stored_at.elapsed() >= ttl
    }
}

/// Read-only view of a live entry's bookkeeping
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheEntryInfo {
    pub stored_at_epoch_ms: i64,
    pub age: Duration,
    pub remaining: Duration,
}

/// Cache metrics for monitoring
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheMetrics {
    pub hits: u64,
    pub misses: u64,
    pub expirations: u64,
    pub inserts: u64,
    pub invalidations: u64,
}

impl CacheMetrics {
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

pub struct TtlCache<V>
where
    V: Clone,
{
    config: CacheConfig,
    data: Mutex<HashMap<String, CacheEntry<V>>>,
    metrics: Mutex<CacheMetrics>,
}

impl<V> TtlCache<V>
where
    V: Clone,
{
    pub fn new(config: CacheConfig) -> Self {
        Self {
            config,
            data: Mutex::new(HashMap::new()),
            metrics: Mutex::new(CacheMetrics::default()),
        }
    }

    /// Get a fresh value, or None if missing or expired
    ///
    /// An expired entry is removed here, so a later `get` cannot resurrect it.
    pub fn get(&self, key: &str) -> Option<V> {
        let mut data = self.data.lock();

        let lookup = data.get(key).map(|entry| {
            if entry.is_expired(self.config.ttl) {
                None
            } else {
                Some(entry.value.clone())
            }
        });

        let expired = match lookup {
            Some(Some(value)) => {
                drop(data);
                self.metrics.lock().hits += 1;
                return Some(value);
            }
            Some(None) => {
                data.remove(key);
                true
            }
            None => false,
        };
        drop(data);

        let mut metrics = self.metrics.lock();
        metrics.misses += 1;
        if expired {
            metrics.expirations += 1;
            if is_debug_cache_enabled() {
                logger::debug(LogTag::Cache, &format!("Entry '{}' expired and was evicted", key));
            }
        }
        None
    }

    /// Store a value, replacing any existing entry with a fresh timestamp
    pub fn set(&self, key: &str, value: V) {
        self.data.lock().insert(key.to_string(), CacheEntry::new(value));
        self.metrics.lock().inserts += 1;
    }

    /// Remove one entry, or everything when `key` is None
    pub fn invalidate(&self, key: Option<&str>) {
        let removed = {
            let mut data = self.data.lock();
            match key {
                Some(key) => data.remove(key).map_or(0, |_| 1),
                None => {
                    let count = data.len();
                    data.clear();
                    count
                }
            }
        };

        self.metrics.lock().invalidations += removed as u64;

        if is_debug_cache_enabled() {
            match key {
                Some(key) => logger::debug(LogTag::Cache, &format!("Invalidated '{}'", key)),
                None => logger::debug(
                    LogTag::Cache,
                    &format!("Invalidated all entries ({} removed)", removed),
                ),
            }
        }
    }

    /// Bookkeeping for a live entry; expired entries are evicted like in `get`
    pub fn entry_info(&self, key: &str) -> Option<CacheEntryInfo> {
        let mut data = self.data.lock();

        let (age, stored_at_epoch_ms) = data
            .get(key)
            .map(|entry| (entry.stored_at.elapsed(), entry.stored_at_epoch_ms))?;

        if age >= self.config.ttl {
            data.remove(key);
            drop(data);
            self.metrics.lock().expirations += 1;
            return None;
        }

        Some(CacheEntryInfo {
            stored_at_epoch_ms,
            age,
            remaining: self.config.ttl - age,
        })
    }

    pub fn ttl(&self) -> Duration {
        self.config.ttl
    }

    pub fn metrics(&self) -> CacheMetrics {
        self.metrics.lock().clone()
    }

    /// Number of stored entries, including expired ones not yet touched
    pub fn len(&self) -> usize {
        self.data.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
