/// Cache configuration
///
/// The TTL is the only knob: entries are never evicted for size, only
/// treated as absent once they are older than `ttl`.
use std::time::Duration;

/// Default freshness window for dashboard resources
pub const DEFAULT_TTL_SECS: u64 = 300;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheConfig {
    /// Time-to-live for cached entries
    pub ttl: Duration,
}

impl CacheConfig {
    /// Dashboard resources (5 minutes)
    pub fn dashboard() -> Self {
        Self {
            ttl: Duration::from_secs(DEFAULT_TTL_SECS),
        }
    }

    /// Custom TTL in seconds
    pub fn custom(ttl_secs: u64) -> Self {
        Self {
            ttl: Duration::from_secs(ttl_secs),
        }
    }

    pub fn with_ttl(ttl: Duration) -> Self {
        Self { ttl }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self::dashboard()
    }
}
