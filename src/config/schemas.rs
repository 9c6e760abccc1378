use crate::cache::CacheConfig;
use crate::config_struct;
use crate::stream::{ReconnectPolicy, StreamConfig};
use std::time::Duration;

// ============================================================================
// REQUEST/RESPONSE ENDPOINT
// ============================================================================

config_struct! {
    /// Request/response endpoint of the analytics service
    pub struct EndpointSettings {
        /// Base URL that resource keys are appended to
        base_url: String = "http://localhost:8000/api/v1".to_string(),

        /// Per-request timeout in seconds
        request_timeout_secs: u64 = 15,

        /// User-Agent header sent with every request
        user_agent: String = "dashsync/0.1".to_string(),
    }
}

// ============================================================================
// TTL CACHE
// ============================================================================

config_struct! {
    /// Cached results older than this are treated as absent
    pub struct CacheSettings {
        ttl_secs: u64 = 300,
    }
}

impl CacheSettings {
    pub fn to_cache_config(&self) -> CacheConfig {
        CacheConfig::custom(self.ttl_secs)
    }
}

// ============================================================================
// UPDATE STREAM
// ============================================================================

config_struct! {
    /// Streaming endpoint and reconnect behaviour
    pub struct StreamSettings {
        /// Subscribe to the update stream at startup
        enabled: bool = true,

        /// Streaming endpoint address
        address: String = "ws://localhost:8000/api/v1/realtime/stream".to_string(),

        /// Keepalive token cadence while the connection is open
        keepalive_secs: u64 = 25,

        /// Handshake timeout
        connect_timeout_secs: u64 = 10,

        /// First reconnect delay; doubles on each consecutive failure
        reconnect_base_secs: u64 = 5,

        /// Upper bound for the reconnect delay
        reconnect_cap_secs: u64 = 20,

        /// Reconnects allowed before the subscription goes dormant
        max_reconnect_attempts: u32 = 3,

        /// Seconds a connection must stay open before the reconnect budget is renewed
        reconnect_stable_secs: u64 = 10,
    }
}

impl StreamSettings {
    pub fn to_stream_config(&self) -> StreamConfig {
        StreamConfig {
            address: self.address.clone(),
            keepalive_interval: Duration::from_secs(self.keepalive_secs),
            connect_timeout: Duration::from_secs(self.connect_timeout_secs),
            reconnect: ReconnectPolicy {
                base: Duration::from_secs(self.reconnect_base_secs),
                cap: Duration::from_secs(self.reconnect_cap_secs),
                max_attempts: self.max_reconnect_attempts,
                stable_after: Duration::from_secs(self.reconnect_stable_secs),
            },
        }
    }
}

// ============================================================================
// PERIODIC REFRESH
// ============================================================================

config_struct! {
    /// Resources refreshed on a fixed cadence
    pub struct RefreshSettings {
        enabled: bool = true,

        interval_secs: u64 = 30,

        /// Resource keys, relative to the endpoint base URL
        resources: Vec<String> = vec![
            "dashboard/insights".to_string(),
            "crisis/signals".to_string(),
        ],
    }
}

// ============================================================================
// ROOT CONFIGURATION
// ============================================================================

config_struct! {
    /// Root configuration structure
    pub struct Config {
        endpoint: EndpointSettings = EndpointSettings::default(),

        cache: CacheSettings = CacheSettings::default(),

        stream: StreamSettings = StreamSettings::default(),

        refresh: RefreshSettings = RefreshSettings::default(),
    }
}
