/// Cache-checked, collapsed resource fetching
///
/// `DataSync` composes the TTL cache, the broker and a request endpoint into
/// the single read path consumers use:
///
/// 1. fresh cache entry -> returned immediately
/// 2. miss -> one collapsed request per key through the broker
/// 3. success -> cache populated inside that single operation
///
/// Stream updates feed `apply_update`, which invalidates what changed.
use crate::broker::{DedupBroker, InFlight};
use crate::cache::{CacheConfig, TtlCache};
use crate::endpoint::RequestEndpoint;
use crate::errors::SyncResult;
use crate::logger::{self, LogTag};
use crate::scheduler::{RefreshScheduler, ScheduleHandle};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

/// What an update payload caused to be invalidated
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Invalidation {
    Resources(Vec<String>),
    All,
}

#[derive(Clone)]
pub struct DataSync {
    cache: Arc<TtlCache<Value>>,
    broker: Arc<DedupBroker<Value>>,
    endpoint: Arc<dyn RequestEndpoint>,
}

impl DataSync {
    pub fn new(cache_config: CacheConfig, endpoint: Arc<dyn RequestEndpoint>) -> Self {
        Self::with_parts(
            Arc::new(TtlCache::new(cache_config)),
            Arc::new(DedupBroker::new()),
            endpoint,
        )
    }

    pub fn with_parts(
        cache: Arc<TtlCache<Value>>,
        broker: Arc<DedupBroker<Value>>,
        endpoint: Arc<dyn RequestEndpoint>,
    ) -> Self {
        Self {
            cache,
            broker,
            endpoint,
        }
    }

    pub fn get_cached(&self, key: &str) -> Option<Value> {
        self.cache.get(key)
    }

    pub fn set_cached(&self, key: &str, value: Value) {
        self.cache.set(key, value);
    }

    /// Drop one key, or the whole cache when `key` is None
    pub fn invalidate(&self, key: Option<&str>) {
        self.cache.invalidate(key);
    }

    /// Fresh cached value, or one collapsed request for it
    pub async fn fetch(&self, key: &str) -> SyncResult<Value> {
        if let Some(value) = self.cache.get(key) {
            return Ok(value);
        }
        self.load(key).await
    }

    /// Skip the cache read but still collapse onto any in-flight request
    pub async fn refresh(&self, key: &str) -> SyncResult<Value> {
        self.load(key).await
    }

    fn load(&self, key: &str) -> InFlight<Value> {
        let endpoint = Arc::clone(&self.endpoint);
        let cache = Arc::clone(&self.cache);
        let resource = key.to_string();

        self.broker.dedupe(key, move || async move {
            let value = endpoint.fetch(&resource).await?;
            cache.set(&resource, value.clone());
            Ok(value)
        })
    }

    /// Invalidate the resources an update names, or everything
    ///
    /// Recognised payload fields: `resources` (array of keys) and
    /// `resource` (single key).
    pub fn apply_update(&self, payload: &Value) -> Invalidation {
        let mut named: Vec<String> = Vec::new();

        if let Some(list) = payload.get("resources").and_then(Value::as_array) {
            named.extend(list.iter().filter_map(Value::as_str).map(str::to_string));
        }
        if let Some(single) = payload.get("resource").and_then(Value::as_str) {
            named.push(single.to_string());
        }

        if named.is_empty() {
            self.cache.invalidate(None);
            logger::debug(LogTag::Cache, "Update without resource names, cache cleared");
            return Invalidation::All;
        }

        named.dedup();
        for key in &named {
            self.cache.invalidate(Some(key));
        }
        Invalidation::Resources(named)
    }

    /// Refresh `key` every `interval`, through the cache and broker
    pub fn schedule_refresh(
        &self,
        scheduler: &RefreshScheduler,
        key: &str,
        interval: Duration,
        enabled: bool,
    ) -> ScheduleHandle {
        let sync = self.clone();
        let key = key.to_string();

        scheduler.start_async(
            move || {
                let sync = sync.clone();
                let key = key.clone();
                async move {
                    match sync.fetch(&key).await {
                        Ok(_) => logger::verbose(LogTag::Scheduler, &format!("Refreshed '{}'", key)),
                        Err(e) => logger::warning(
                            LogTag::Scheduler,
                            &format!("Scheduled refresh of '{}' failed: {}", key, e),
                        ),
                    }
                }
            },
            interval,
            enabled,
        )
    }

    pub fn cache(&self) -> &TtlCache<Value> {
        &self.cache
    }

    pub fn broker(&self) -> &DedupBroker<Value> {
        &self.broker
    }
}
