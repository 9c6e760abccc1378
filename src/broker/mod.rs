//! Request collapsing
//!
//! `DedupBroker` guarantees at most one in-flight operation per key. The
//! first caller for a key starts the operation; every caller arriving while
//! it is outstanding receives a clone of the same shared future and observes
//! the identical result or error. The registry entry is removed as part of
//! settlement, before any waiter sees the output, so a call made after
//! settlement always starts a fresh operation.
//!
//! The operation is driven by a spawned task when a tokio runtime is
//! available, so it settles (and frees its key) even if every caller drops
//! its handle.

use crate::arguments::is_debug_broker_enabled;
use crate::errors::SyncResult;
use crate::logger::{self, LogTag};
use futures::future::{BoxFuture, FutureExt, Shared};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

/// Multi-waiter handle to one in-flight operation
pub type InFlight<T> = Shared<BoxFuture<'static, SyncResult<T>>>;

/// Registry slot for one outstanding operation
struct PendingRequest<T>
where
    T: Clone + Send + Sync + 'static,
{
    generation: u64,
    future: InFlight<T>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BrokerMetrics {
    /// Underlying operations started
    pub started: u64,
    /// Calls served by an already in-flight operation
    pub collapsed: u64,
    pub succeeded: u64,
    pub failed: u64,
}

struct BrokerInner<T>
where
    T: Clone + Send + Sync + 'static,
{
    registry: Mutex<HashMap<String, PendingRequest<T>>>,
    next_generation: Mutex<u64>,
    metrics: Mutex<BrokerMetrics>,
}

impl<T> BrokerInner<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// Remove the entry for `key` only if it is still the same operation
    fn release(&self, key: &str, generation: u64) {
        let mut registry = self.registry.lock();
        if registry.get(key).map(|p| p.generation) == Some(generation) {
            registry.remove(key);
        }
    }
}

/// Frees the registry slot when the operation settles, or if it unwinds
struct Registration<T>
where
    T: Clone + Send + Sync + 'static,
{
    inner: Arc<BrokerInner<T>>,
    key: String,
    generation: u64,
}

impl<T> Drop for Registration<T>
where
    T: Clone + Send + Sync + 'static,
{
    fn drop(&mut self) {
        self.inner.release(&self.key, self.generation);
    }
}

pub struct DedupBroker<T>
where
    T: Clone + Send + Sync + 'static,
{
    inner: Arc<BrokerInner<T>>,
}

impl<T> DedupBroker<T>
where
    T: Clone + Send + Sync + 'static,
{
    pub fn new() -> Self {
        Self {
            inner: Arc::new(BrokerInner {
                registry: Mutex::new(HashMap::new()),
                next_generation: Mutex::new(0),
                metrics: Mutex::new(BrokerMetrics::default()),
            }),
        }
    }

    /// Run `operation` for `key`, or join the one already in flight
    ///
    /// Lookup, thunk call and registration happen under one registry lock,
    /// so the thunk runs at most once per outstanding key. The thunk must
    /// only build its future; calling back into this broker from inside the
    /// thunk deadlocks.
    pub fn dedupe<F, Fut>(&self, key: &str, operation: F) -> InFlight<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = SyncResult<T>> + Send + 'static,
    {
        let mut registry = self.inner.registry.lock();
        if let Some(pending) = registry.get(key) {
            let existing = pending.future.clone();
            drop(registry);
            self.record_collapse(key);
            return existing;
        }

        let operation = operation();

        let generation = {
            let mut next = self.inner.next_generation.lock();
            *next += 1;
            *next
        };

        let registration = Registration {
            inner: Arc::clone(&self.inner),
            key: key.to_string(),
            generation,
        };
        let inner = Arc::clone(&self.inner);
        let future: InFlight<T> = async move {
            let result = operation.await;
            // Free the key before any waiter observes the result
            drop(registration);

            let mut metrics = inner.metrics.lock();
            if result.is_ok() {
                metrics.succeeded += 1;
            } else {
                metrics.failed += 1;
            }
            result
        }
        .boxed()
        .shared();

        registry.insert(
            key.to_string(),
            PendingRequest {
                generation,
                future: future.clone(),
            },
        );
        drop(registry);

        self.inner.metrics.lock().started += 1;
        if is_debug_broker_enabled() {
            logger::debug(
                LogTag::Broker,
                &format!("Started operation for '{}' (generation {})", key, generation),
            );
        }

        if let Ok(handle) = tokio::runtime::Handle::try_current() {
            let driver = future.clone();
            handle.spawn(async move {
                let _ = driver.await;
            });
        }

        future
    }

    fn record_collapse(&self, key: &str) {
        self.inner.metrics.lock().collapsed += 1;
        if is_debug_broker_enabled() {
            logger::debug(
                LogTag::Broker,
                &format!("Collapsed onto in-flight operation for '{}'", key),
            );
        }
    }

    /// Whether an operation for `key` is outstanding
    pub fn in_flight(&self, key: &str) -> bool {
        self.inner.registry.lock().contains_key(key)
    }

    pub fn pending_count(&self) -> usize {
        self.inner.registry.lock().len()
    }

    pub fn metrics(&self) -> BrokerMetrics {
        self.inner.metrics.lock().clone()
    }
}

impl<T> Default for DedupBroker<T>
where
    T: Clone + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::SyncError;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::sync::oneshot;

    #[tokio::test]
    async fn test_concurrent_calls_collapse() {
        let broker: DedupBroker<u32> = DedupBroker::new();
        let calls = Arc::new(AtomicUsize::new(0));
        let (release_tx, release_rx) = oneshot::channel::<()>();

        let counter = Arc::clone(&calls);
        let first = broker.dedupe("insights", move || async move {
            counter.fetch_add(1, Ordering::SeqCst);
            let _ = release_rx.await;
            Ok(42)
        });

        let counter = Arc::clone(&calls);
        let second = broker.dedupe("insights", move || async move {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(7)
        });

        assert!(broker.in_flight("insights"));
        release_tx.send(()).unwrap();

        let (a, b) = tokio::join!(first, second);
        assert_eq!(a, Ok(42));
        assert_eq!(b, Ok(42));
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        let metrics = broker.metrics();
        assert_eq!(metrics.started, 1);
        assert_eq!(metrics.collapsed, 1);
        assert_eq!(metrics.succeeded, 1);
    }

    #[tokio::test]
    async fn test_new_call_after_settlement_runs_again() {
        let broker: DedupBroker<usize> = DedupBroker::new();
        let calls = Arc::new(AtomicUsize::new(0));

        for expected in 1..=3 {
            let counter = Arc::clone(&calls);
            let result = broker
                .dedupe("signals", move || async move {
                    Ok(counter.fetch_add(1, Ordering::SeqCst) + 1)
                })
                .await;
            assert_eq!(result, Ok(expected));
            assert!(!broker.in_flight("signals"));
        }

        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_failure_shared_and_key_freed() {
        let broker: DedupBroker<u32> = DedupBroker::new();
        let (release_tx, release_rx) = oneshot::channel::<()>();

        let first = broker.dedupe("alerts", move || async move {
            let _ = release_rx.await;
            Err(SyncError::request("alerts", Some(500), "internal error"))
        });
        let second = broker.dedupe("alerts", || async { Ok(1) });

        release_tx.send(()).unwrap();
        let (a, b) = tokio::join!(first, second);

        let expected = SyncError::request("alerts", Some(500), "internal error");
        assert_eq!(a, Err(expected.clone()));
        assert_eq!(b, Err(expected));
        assert!(!broker.in_flight("alerts"));

        // Retry after failure starts a fresh operation
        let retry = broker.dedupe("alerts", || async { Ok(2) }).await;
        assert_eq!(retry, Ok(2));
        assert_eq!(broker.metrics().failed, 1);
    }

    #[tokio::test]
    async fn test_immediate_error_is_shared() {
        let broker: DedupBroker<u32> = DedupBroker::new();
        let result = broker
            .dedupe("broken", || async { Err(SyncError::transport("refused")) })
            .await;
        assert_eq!(result, Err(SyncError::transport("refused")));
        assert_eq!(broker.pending_count(), 0);
    }

    #[tokio::test]
    async fn test_distinct_keys_do_not_collapse() {
        let broker: DedupBroker<&'static str> = DedupBroker::new();
        let a = broker.dedupe("a", || async { Ok("a") });
        let b = broker.dedupe("b", || async { Ok("b") });
        assert_eq!(broker.pending_count(), 2);

        let (a, b) = tokio::join!(a, b);
        assert_eq!(a, Ok("a"));
        assert_eq!(b, Ok("b"));
        assert_eq!(broker.metrics().collapsed, 0);
    }

    #[tokio::test]
    async fn test_settles_without_any_waiter() {
        let broker: DedupBroker<u32> = DedupBroker::new();
        let (done_tx, done_rx) = oneshot::channel::<()>();

        drop(broker.dedupe("orphan", move || async move {
            let _ = done_tx.send(());
            Ok(1)
        }));

        // The spawned driver runs the operation even though the handle is gone
        done_rx.await.unwrap();
        for _ in 0..10 {
            if !broker.in_flight("orphan") {
                break;
            }
            tokio::task::yield_now().await;
        }
        assert!(!broker.in_flight("orphan"));
    }

    #[test]
    fn test_racing_threads_invoke_thunk_once() {
        let broker: Arc<DedupBroker<u32>> = Arc::new(DedupBroker::new());
        let thunk_calls = Arc::new(AtomicUsize::new(0));
        let barrier = Arc::new(std::sync::Barrier::new(8));

        let workers: Vec<_> = (0..8)
            .map(|_| {
                let broker = Arc::clone(&broker);
                let thunk_calls = Arc::clone(&thunk_calls);
                let barrier = Arc::clone(&barrier);
                std::thread::spawn(move || {
                    barrier.wait();
                    let _pending = broker.dedupe("overview", move || {
                        thunk_calls.fetch_add(1, Ordering::SeqCst);
                        futures::future::pending::<SyncResult<u32>>()
                    });
                })
            })
            .collect();
        for worker in workers {
            worker.join().unwrap();
        }

        assert_eq!(thunk_calls.load(Ordering::SeqCst), 1);
        let metrics = broker.metrics();
        assert_eq!(metrics.started, 1);
        assert_eq!(metrics.collapsed, 7);
    }
}
