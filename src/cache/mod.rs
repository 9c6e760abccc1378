//! Bounded-staleness result cache
//!
//! `TtlCache` keeps the last value fetched for a resource key and serves it
//! while it is younger than the configured TTL. It avoids *new* requests for
//! recently seen data; collapsing *simultaneous* requests is the broker's job.

pub mod config;
pub mod manager;

pub use config::CacheConfig;
pub use manager::{CacheEntryInfo, CacheMetrics, TtlCache};
