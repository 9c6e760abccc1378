//! Periodic refresh trigger
//!
//! `RefreshScheduler` invokes a caller-supplied action at a fixed cadence.
//! It only handles timing: overlap between a scheduled refresh and other
//! reads of the same resource is suppressed by routing the action through
//! the cache and broker.
//!
//! Semantics:
//! - The first firing happens one full interval after start (or after
//!   re-enable); callers invoke the action themselves for an immediate run.
//! - Missed ticks are delayed, never burst.
//! - Firings of one schedule never overlap: the next tick is not awaited
//!   until the previous firing has completed.
//! - Stopping is idempotent and irreversible. Invocation and stop serialize
//!   on the same gate, so once `stop` returns no synchronous invocation is
//!   running and none will start. The gate is reentrant: an action may stop
//!   its own schedule, and no further firing follows.

use crate::arguments::is_debug_scheduler_enabled;
use crate::logger::{self, LogTag};
use futures::future::{self, BoxFuture, FutureExt};
use parking_lot::{Mutex, ReentrantMutex};
use std::cell::Cell;
use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};

/// Shortest accepted period; tokio intervals reject zero
const MIN_INTERVAL: Duration = Duration::from_millis(1);

type Registry = Mutex<HashMap<u64, ScheduleHandle>>;

struct ScheduleShared {
    id: u64,
    interval: Duration,
    /// Cancellation gate; held while an action's synchronous portion runs
    cancelled: ReentrantMutex<Cell<bool>>,
    enabled: watch::Sender<bool>,
    fire_count: AtomicU64,
    task: Mutex<Option<JoinHandle<()>>>,
    /// Active set of the scheduler that started this schedule
    registry: Weak<Registry>,
}

/// Handle to one periodic timer
///
/// Clones refer to the same schedule. Dropping every handle does not stop
/// the timer; `cancel` (or `RefreshScheduler::stop`) is the only way.
#[derive(Clone)]
pub struct ScheduleHandle {
    shared: Arc<ScheduleShared>,
}

impl ScheduleHandle {
    pub fn id(&self) -> u64 {
        self.shared.id
    }

    pub fn interval(&self) -> Duration {
        self.shared.interval
    }

    /// Number of completed-or-started firings
    pub fn fire_count(&self) -> u64 {
        self.shared.fire_count.load(Ordering::SeqCst)
    }

    pub fn is_enabled(&self) -> bool {
        *self.shared.enabled.borrow()
    }

    pub fn is_active(&self) -> bool {
        !self.shared.cancelled.lock().get()
    }

    /// Suppress or resume firings without discarding the schedule
    ///
    /// Re-enabling starts a fresh interval: the next firing is one full
    /// period after this call. Setting the current value again is a no-op.
    pub fn set_enabled(&self, enabled: bool) {
        let changed = self.shared.enabled.send_if_modified(|current| {
            if *current == enabled {
                false
            } else {
                *current = enabled;
                true
            }
        });

        if changed && is_debug_scheduler_enabled() {
            logger::debug(
                LogTag::Scheduler,
                &format!(
                    "Schedule #{} {}",
                    self.shared.id,
                    if enabled { "enabled" } else { "disabled" }
                ),
            );
        }
    }

    /// Stop the schedule; returns false if it was already stopped
    ///
    /// Also callable from inside this schedule's own action.
    pub fn cancel(&self) -> bool {
        {
            let cancelled = self.shared.cancelled.lock();
            if cancelled.get() {
                return false;
            }
            cancelled.set(true);
        }

        if let Some(task) = self.shared.task.lock().take() {
            task.abort();
        }
        if let Some(registry) = self.shared.registry.upgrade() {
            registry.lock().remove(&self.shared.id);
        }

        if is_debug_scheduler_enabled() {
            logger::debug(
                LogTag::Scheduler,
                &format!(
                    "Schedule #{} stopped after {} firing(s)",
                    self.shared.id,
                    self.fire_count()
                ),
            );
        }
        true
    }
}

impl std::fmt::Debug for ScheduleHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScheduleHandle")
            .field("id", &self.shared.id)
            .field("interval", &self.shared.interval)
            .field("enabled", &self.is_enabled())
            .field("active", &self.is_active())
            .field("fire_count", &self.fire_count())
            .finish()
    }
}

/// Starts and tracks refresh schedules
///
/// Must be used from within a tokio runtime.
pub struct RefreshScheduler {
    next_id: AtomicU64,
    active: Arc<Registry>,
}

impl RefreshScheduler {
    pub fn new() -> Self {
        Self {
            next_id: AtomicU64::new(1),
            active: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Invoke `action` once every `interval` while enabled
    pub fn start<F>(&self, mut action: F, interval: Duration, enabled: bool) -> ScheduleHandle
    where
        F: FnMut() + Send + 'static,
    {
        self.spawn_schedule(
            move || {
                action();
                future::ready(()).boxed()
            },
            interval,
            enabled,
        )
    }

    /// Like `start`, for async actions
    ///
    /// The next tick is not awaited until the returned future completes.
    /// Stopping aborts an in-progress future at its next suspension point.
    pub fn start_async<F, Fut>(&self, mut action: F, interval: Duration, enabled: bool) -> ScheduleHandle
    where
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.spawn_schedule(move || action().boxed(), interval, enabled)
    }

    fn spawn_schedule<F>(&self, action: F, interval: Duration, enabled: bool) -> ScheduleHandle
    where
        F: FnMut() -> BoxFuture<'static, ()> + Send + 'static,
    {
        let interval = if interval < MIN_INTERVAL {
            logger::warning(
                LogTag::Scheduler,
                &format!("Refresh interval {:?} too small, using {:?}", interval, MIN_INTERVAL),
            );
            MIN_INTERVAL
        } else {
            interval
        };

        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let (enabled_tx, enabled_rx) = watch::channel(enabled);
        let shared = Arc::new(ScheduleShared {
            id,
            interval,
            cancelled: ReentrantMutex::new(Cell::new(false)),
            enabled: enabled_tx,
            fire_count: AtomicU64::new(0),
            task: Mutex::new(None),
            registry: Arc::downgrade(&self.active),
        });

        let handle = ScheduleHandle { shared };
        self.active.lock().insert(id, handle.clone());

        let first_tick = Instant::now() + interval;
        let task = tokio::spawn(run_schedule(
            Arc::clone(&handle.shared),
            enabled_rx,
            first_tick,
            action,
        ));
        *handle.shared.task.lock() = Some(task);

        if is_debug_scheduler_enabled() {
            logger::debug(
                LogTag::Scheduler,
                &format!(
                    "Schedule #{} started (interval={:?}, enabled={})",
                    id, interval, enabled
                ),
            );
        }

        handle
    }

    /// Stop a schedule; safe to call any number of times, including from
    /// inside its own action
    pub fn stop(&self, handle: &ScheduleHandle) {
        handle.cancel();
    }

    /// Stop every schedule started by this scheduler
    pub fn stop_all(&self) -> usize {
        let handles: Vec<ScheduleHandle> = self.active.lock().drain().map(|(_, h)| h).collect();
        handles.iter().filter(|handle| handle.cancel()).count()
    }

    pub fn active_count(&self) -> usize {
        self.active.lock().len()
    }
}

impl Default for RefreshScheduler {
    fn default() -> Self {
        Self::new()
    }
}

/// Timer loop for one schedule
async fn run_schedule<F>(
    shared: Arc<ScheduleShared>,
    mut enabled_rx: watch::Receiver<bool>,
    first_tick: Instant,
    mut action: F,
) where
    F: FnMut() -> BoxFuture<'static, ()> + Send + 'static,
{
    let period = shared.interval;
    let mut start_at = first_tick;

    loop {
        // Dormant while disabled; waking up starts a fresh interval
        while !*enabled_rx.borrow_and_update() {
            if enabled_rx.changed().await.is_err() {
                return;
            }
            start_at = Instant::now() + period;
        }

        let mut ticker = interval_at(start_at, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let pending = {
                        let cancelled = shared.cancelled.lock();
                        if cancelled.get() {
                            return;
                        }
                        let count = shared.fire_count.fetch_add(1, Ordering::SeqCst) + 1;
                        if is_debug_scheduler_enabled() {
                            logger::debug(
                                LogTag::Scheduler,
                                &format!("Schedule #{} firing ({})", shared.id, count),
                            );
                        }
                        action()
                    };
                    pending.await;
                    if shared.cancelled.lock().get() {
                        return;
                    }
                }
                changed = enabled_rx.changed() => {
                    if changed.is_err() {
                        return;
                    }
                    // Any toggle restarts the cadence from now
                    start_at = Instant::now() + period;
                    break;
                }
            }
        }
    }
}
