/// Self-healing update stream subscription
///
/// `StreamManager` owns one logical subscription over a possibly-unreliable
/// transport. Lifecycle:
///
/// - `subscribe` (or a reconnect timer firing) moves Idle/Closed to
///   Connecting, unless the subscription was torn down, the reconnect budget
///   is used up, or a connection is already Connecting/Open.
/// - A completed handshake moves to Open, resets the reconnect budget and
///   starts the keepalive token. A connection that drops before the policy's
///   stability window restores the count it had before the handshake.
/// - Any disconnect moves to Closed. If the budget allows, a reconnect is
///   scheduled after `min(base * 2^(n-1), cap)`; otherwise the subscription
///   stays dormant until a new manager is created.
/// - `unsubscribe` is irreversible: it marks the subscription closed before
///   touching the transport, detaches the update callback, cancels every
///   timer and then asks the connection to close. The state is Closing until
///   the connection task has shut the transport, then Closed.
///
/// Every deferred task carries the generation it was started under and is
/// ignored once the manager has moved on.
use super::backoff::ReconnectPolicy;
use super::message::{parse_frame, StreamMessage, KEEPALIVE_FRAME};
use super::state::{ConnectionState, ConnectionStatus};
use super::transport::{StreamTransport, TransportLink};
use crate::arguments::is_debug_stream_enabled;
use crate::errors::SyncError;
use crate::logger::{self, LogTag};
use chrono::{DateTime, Utc};
use futures_util::{SinkExt, StreamExt};
use parking_lot::Mutex;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::{interval_at, sleep, timeout, Instant, MissedTickBehavior};

/// Receives the payload of every update envelope
pub type UpdateCallback = Arc<dyn Fn(Value) + Send + Sync>;

const MIN_KEEPALIVE: Duration = Duration::from_millis(1);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamConfig {
    pub address: String,
    pub keepalive_interval: Duration,
    pub connect_timeout: Duration,
    pub reconnect: ReconnectPolicy,
}

impl StreamConfig {
    pub const DEFAULT_ADDRESS: &'static str = "ws://localhost:8000/api/v1/realtime/stream";
    pub const DEFAULT_KEEPALIVE_SECS: u64 = 25;
    pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;

    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            ..Self::default()
        }
    }
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            address: Self::DEFAULT_ADDRESS.to_string(),
            keepalive_interval: Duration::from_secs(Self::DEFAULT_KEEPALIVE_SECS),
            connect_timeout: Duration::from_secs(Self::DEFAULT_CONNECT_TIMEOUT_SECS),
            reconnect: ReconnectPolicy::default(),
        }
    }
}

struct PendingReconnect {
    delay: Duration,
    timer: JoinHandle<()>,
}

struct ManagerState {
    state: ConnectionState,
    reconnect_attempts: u32,
    intentionally_closed: bool,
    /// Bumped on every connect attempt and on teardown
    generation: u64,
    last_update_at: Option<DateTime<Utc>>,
    /// When the current connection opened, and the attempt count it reset
    opened: Option<(Instant, u32)>,
    pending_reconnect: Option<PendingReconnect>,
    /// Asks the live connection task to close its transport
    close_signal: Option<oneshot::Sender<()>>,
}

impl ManagerState {
    fn snapshot(&self) -> ConnectionStatus {
        ConnectionStatus {
            state: self.state,
            reconnect_attempts: self.reconnect_attempts,
            intentionally_closed: self.intentionally_closed,
            pending_reconnect: self.pending_reconnect.as_ref().map(|p| p.delay),
            last_update_at: self.last_update_at,
        }
    }
}

struct ManagerInner {
    config: StreamConfig,
    transport: Arc<dyn StreamTransport>,
    on_update: Mutex<Option<UpdateCallback>>,
    state: Mutex<ManagerState>,
    status_tx: watch::Sender<ConnectionStatus>,
}

impl ManagerInner {
    fn publish(&self, state: &ManagerState) {
        self.status_tx.send_replace(state.snapshot());
    }

    /// Idle/Closed -> Connecting, if every guard passes
    fn try_begin_attempt(self: &Arc<Self>, state: &mut ManagerState, trigger: &str) -> bool {
        if state.intentionally_closed {
            if is_debug_stream_enabled() {
                logger::debug(LogTag::Stream, &format!("Ignoring {}: subscription closed", trigger));
            }
            return false;
        }
        if state.state.is_active() {
            if is_debug_stream_enabled() {
                logger::debug(
                    LogTag::Stream,
                    &format!("Ignoring {}: connection already {}", trigger, state.state),
                );
            }
            return false;
        }
        if !self.config.reconnect.allows(state.reconnect_attempts) {
            logger::warning(
                LogTag::Stream,
                &format!(
                    "{}; stream stays disconnected",
                    SyncError::ExhaustedRetries {
                        attempts: state.reconnect_attempts
                    }
                ),
            );
            return false;
        }

        state.generation += 1;
        state.state = ConnectionState::Connecting;

        let (close_tx, close_rx) = oneshot::channel();
        state.close_signal = Some(close_tx);

        if is_debug_stream_enabled() {
            logger::debug(
                LogTag::Stream,
                &format!(
                    "Connecting to {} ({}, generation {})",
                    self.config.address, trigger, state.generation
                ),
            );
        }

        tokio::spawn(Arc::clone(self).run_connection(state.generation, close_rx));
        true
    }

    async fn run_connection(self: Arc<Self>, generation: u64, mut close_rx: oneshot::Receiver<()>) {
        let connect = timeout(
            self.config.connect_timeout,
            self.transport.connect(&self.config.address),
        );

        let link = tokio::select! {
            _ = &mut close_rx => {
                self.mark_closed();
                return;
            }
            result = connect => match result {
                Ok(Ok(link)) => link,
                Ok(Err(e)) => {
                    self.handle_disconnect(generation, e);
                    return;
                }
                Err(_) => {
                    self.handle_disconnect(
                        generation,
                        SyncError::transport(format!(
                            "connect timed out after {}s",
                            self.config.connect_timeout.as_secs()
                        )),
                    );
                    return;
                }
            }
        };

        let TransportLink { mut sink, mut stream } = link;

        if !self.mark_open(generation) {
            let _ = sink.close().await;
            self.mark_closed();
            return;
        }

        let period = self.config.keepalive_interval.max(MIN_KEEPALIVE);
        let mut keepalive = interval_at(Instant::now() + period, period);
        keepalive.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let reason = loop {
            tokio::select! {
                _ = &mut close_rx => {
                    let _ = sink.close().await;
                    self.mark_closed();
                    if is_debug_stream_enabled() {
                        logger::debug(LogTag::Stream, "Connection closed by client");
                    }
                    return;
                }
                _ = keepalive.tick() => {
                    if let Err(e) = sink.send(KEEPALIVE_FRAME.to_string()).await {
                        break e;
                    }
                    logger::verbose(LogTag::Stream, "Keepalive sent");
                }
                frame = stream.next() => match frame {
                    Some(Ok(text)) => self.handle_frame(generation, &text),
                    Some(Err(e)) => break e,
                    None => break SyncError::transport("stream ended"),
                }
            }
        };

        drop(sink);
        drop(stream);
        self.handle_disconnect(generation, reason);
    }

    fn mark_open(&self, generation: u64) -> bool {
        let mut state = self.state.lock();
        if state.generation != generation || state.intentionally_closed {
            return false;
        }

        state.state = ConnectionState::Open;
        state.opened = Some((Instant::now(), state.reconnect_attempts));
        state.reconnect_attempts = 0;
        self.publish(&state);

        logger::info(
            LogTag::Stream,
            &format!("Connected to {}", self.config.address),
        );
        true
    }

    /// Closing -> Closed once the transport of a torn-down subscription is shut
    fn mark_closed(&self) {
        let mut state = self.state.lock();
        self.finish_closing(&mut state);
    }

    fn finish_closing(&self, state: &mut ManagerState) {
        if state.intentionally_closed && state.state == ConnectionState::Closing {
            state.state = ConnectionState::Closed;
            self.publish(state);
        }
    }

    fn handle_disconnect(self: &Arc<Self>, generation: u64, reason: SyncError) {
        let mut state = self.state.lock();
        if state.generation != generation {
            // The connection task of a torn-down subscription ended on its own
            self.finish_closing(&mut state);
            return;
        }

        state.close_signal = None;
        state.state = ConnectionState::Closed;

        let policy = &self.config.reconnect;
        if let Some((opened_at, prior_attempts)) = state.opened.take() {
            let open_for = opened_at.elapsed();
            if !policy.is_stable(open_for) {
                if is_debug_stream_enabled() {
                    logger::debug(
                        LogTag::Stream,
                        &format!(
                            "Connection lasted {}ms; keeping {} spent reconnect(s)",
                            open_for.as_millis(),
                            prior_attempts
                        ),
                    );
                }
                state.reconnect_attempts = prior_attempts;
            }
        }

        if state.intentionally_closed {
            self.publish(&state);
            return;
        }

        if policy.allows(state.reconnect_attempts) {
            state.reconnect_attempts += 1;
            let attempt = state.reconnect_attempts;
            let delay = policy.delay_for(attempt);

            logger::warning(
                LogTag::Stream,
                &format!(
                    "Disconnected ({}); reconnect {}/{} in {}s",
                    reason,
                    attempt,
                    policy.max_attempts,
                    delay.as_secs()
                ),
            );

            let inner = Arc::clone(self);
            let timer = tokio::spawn(async move {
                sleep(delay).await;
                inner.reconnect_due(generation);
            });
            state.pending_reconnect = Some(PendingReconnect { delay, timer });
        } else {
            logger::warning(
                LogTag::Stream,
                &format!(
                    "Disconnected ({}); {}",
                    reason,
                    SyncError::ExhaustedRetries {
                        attempts: state.reconnect_attempts
                    }
                ),
            );
        }

        self.publish(&state);
    }

    fn reconnect_due(self: &Arc<Self>, generation: u64) {
        let mut state = self.state.lock();
        if state.generation != generation {
            return;
        }

        state.pending_reconnect = None;
        self.try_begin_attempt(&mut state, "scheduled reconnect");
        self.publish(&state);
    }

    fn handle_frame(&self, generation: u64, text: &str) {
        match parse_frame(text) {
            Ok(StreamMessage::Update(event)) => {
                let callback = {
                    let mut state = self.state.lock();
                    if state.generation != generation || state.intentionally_closed {
                        return;
                    }
                    state.last_update_at = Some(Utc::now());
                    self.publish(&state);
                    self.on_update.lock().clone()
                };

                if is_debug_stream_enabled() {
                    logger::debug(LogTag::Stream, &format!("Update received: {}", event.payload));
                }
                if let Some(callback) = callback {
                    callback(event.payload);
                }
            }
            Ok(StreamMessage::Pong) => {
                logger::verbose(LogTag::Stream, "Keepalive acknowledged");
            }
            Ok(StreamMessage::Other(kind)) => {
                if is_debug_stream_enabled() {
                    logger::debug(LogTag::Stream, &format!("Ignoring '{}' message", kind));
                }
            }
            Err(e) => {
                if is_debug_stream_enabled() {
                    logger::debug(LogTag::Stream, &format!("Dropped frame: {}", e));
                }
            }
        }
    }
}

pub struct StreamManager {
    inner: Arc<ManagerInner>,
}

impl StreamManager {
    /// Must be used from within a tokio runtime.
    pub fn new<F>(config: StreamConfig, transport: Arc<dyn StreamTransport>, on_update: F) -> Self
    where
        F: Fn(Value) + Send + Sync + 'static,
    {
        let (status_tx, _) = watch::channel(ConnectionStatus::default());
        let callback: UpdateCallback = Arc::new(on_update);

        Self {
            inner: Arc::new(ManagerInner {
                config,
                transport,
                on_update: Mutex::new(Some(callback)),
                state: Mutex::new(ManagerState {
                    state: ConnectionState::Idle,
                    reconnect_attempts: 0,
                    intentionally_closed: false,
                    generation: 0,
                    last_update_at: None,
                    opened: None,
                    pending_reconnect: None,
                    close_signal: None,
                }),
                status_tx,
            }),
        }
    }

    /// Start the subscription; false if refused
    ///
    /// Refused while a connection is Connecting or Open, after `unsubscribe`,
    /// and once the reconnect budget is exhausted.
    pub fn subscribe(&self) -> bool {
        let mut state = self.inner.state.lock();
        let started = self.inner.try_begin_attempt(&mut state, "subscribe");
        self.inner.publish(&state);
        started
    }

    /// Tear the subscription down for good; safe to call repeatedly
    pub fn unsubscribe(&self) {
        let mut state = self.inner.state.lock();
        if state.intentionally_closed {
            return;
        }

        state.intentionally_closed = true;
        state.generation += 1;
        *self.inner.on_update.lock() = None;

        if let Some(pending) = state.pending_reconnect.take() {
            pending.timer.abort();
        }
        // A live connection task acknowledges the close by marking Closed
        let closing = state
            .close_signal
            .take()
            .map_or(false, |close| close.send(()).is_ok());
        if closing {
            state.state = ConnectionState::Closing;
        } else if state.state != ConnectionState::Idle {
            state.state = ConnectionState::Closed;
        }
        state.opened = None;

        self.inner.publish(&state);
        logger::info(LogTag::Stream, "Stream subscription closed");
    }

    pub fn connected(&self) -> bool {
        self.inner.state.lock().state == ConnectionState::Open
    }

    pub fn last_update_at(&self) -> Option<DateTime<Utc>> {
        self.inner.state.lock().last_update_at
    }

    pub fn status(&self) -> ConnectionStatus {
        self.inner.state.lock().snapshot()
    }

    /// Receiver that observes every status change
    pub fn watch_status(&self) -> watch::Receiver<ConnectionStatus> {
        self.inner.status_tx.subscribe()
    }

    pub fn config(&self) -> &StreamConfig {
        &self.inner.config
    }
}

impl Drop for StreamManager {
    fn drop(&mut self) {
        self.unsubscribe();
    }
}

#[cfg(test)]
mod tests {
    use super::super::transport::mock::{MockTransport, Outcome};
    use super::*;
    use crate::errors::SyncResult;
    use async_trait::async_trait;

    type Received = Arc<Mutex<Vec<Value>>>;

    fn test_config() -> StreamConfig {
        StreamConfig::new("ws://dashboard.test/api/v1/realtime/stream")
    }

    fn manager_with(transport: Arc<dyn StreamTransport>) -> (StreamManager, Received) {
        let received: Received = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&received);
        let manager = StreamManager::new(test_config(), transport, move |payload| {
            sink.lock().push(payload);
        });
        (manager, received)
    }

    /// Let spawned tasks run without moving the clock meaningfully
    async fn settle() {
        sleep(Duration::from_millis(1)).await;
    }

    fn offsets_secs(times: &[Instant], start: Instant) -> Vec<u64> {
        times.iter().map(|t| t.duration_since(start).as_secs()).collect()
    }

    #[tokio::test(start_paused = true)]
    async fn test_bounded_backoff_then_dormant() {
        let transport = Arc::new(MockTransport::scripted(&[]));
        let start = Instant::now();
        let (manager, _) = manager_with(transport.clone());

        assert!(manager.subscribe());
        settle().await;

        let status = manager.status();
        assert_eq!(status.state, ConnectionState::Closed);
        assert_eq!(status.reconnect_attempts, 1);
        assert_eq!(status.pending_reconnect, Some(Duration::from_secs(5)));

        sleep(Duration::from_secs(15)).await;
        let status = manager.status();
        assert_eq!(status.reconnect_attempts, 3);
        assert_eq!(status.pending_reconnect, Some(Duration::from_secs(20)));

        sleep(Duration::from_secs(60)).await;

        // Delays 5s then 10s; the 20s timer fires with the budget spent
        assert_eq!(offsets_secs(&transport.connect_times(), start), vec![0, 5, 15]);

        let status = manager.status();
        assert_eq!(status.state, ConnectionState::Closed);
        assert_eq!(status.reconnect_attempts, 3);
        assert_eq!(status.pending_reconnect, None);
        assert!(status.is_dormant(3));
        assert!(!manager.connected());

        assert!(!manager.subscribe());
        sleep(Duration::from_secs(60)).await;
        assert_eq!(transport.connect_count(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_unsubscribe_cancels_pending_reconnect() {
        let transport = Arc::new(MockTransport::scripted(&[Outcome::Refuse]));
        let (manager, _) = manager_with(transport.clone());

        assert!(manager.subscribe());
        settle().await;
        assert!(manager.status().pending_reconnect.is_some());

        manager.unsubscribe();
        manager.unsubscribe();

        let status = manager.status();
        assert!(status.intentionally_closed);
        assert_eq!(status.pending_reconnect, None);
        assert_eq!(status.state, ConnectionState::Closed);

        sleep(Duration::from_secs(60)).await;
        assert_eq!(transport.connect_count(), 1);
        assert!(!manager.subscribe());
    }

    #[tokio::test(start_paused = true)]
    async fn test_keepalive_while_open() {
        let transport = Arc::new(MockTransport::scripted(&[Outcome::Accept]));
        let (manager, _) = manager_with(transport.clone());

        assert!(manager.subscribe());
        settle().await;
        assert!(manager.connected());
        let mut server = transport.take_server().unwrap();

        sleep(Duration::from_secs(60)).await;
        let (frames, closed) = server.drain_received();
        assert_eq!(frames, vec!["ping".to_string(), "ping".to_string()]);
        assert!(!closed);

        manager.unsubscribe();
        settle().await;
        let (frames, closed) = server.drain_received();
        assert!(frames.is_empty());
        assert!(closed);
        assert!(!manager.connected());

        // No keepalive after teardown
        sleep(Duration::from_secs(60)).await;
        assert!(server.drain_received().0.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_updates_delivered_and_noise_dropped() {
        let transport = Arc::new(MockTransport::scripted(&[Outcome::Accept]));
        let (manager, received) = manager_with(transport.clone());
        let status_rx = manager.watch_status();

        manager.subscribe();
        settle().await;
        assert!(status_rx.borrow().connected());
        assert_eq!(manager.last_update_at(), None);

        let server = transport.take_server().unwrap();
        server.push("definitely not json");
        server.push(r#"{"type":"pong"}"#);
        server.push(r#"{"type":"heartbeat"}"#);
        server.push(r#"{"type":"update","data":{"resources":["crisis/signals"]},"timestamp":"2024-03-01T12:00:00"}"#);
        settle().await;

        let payloads = received.lock().clone();
        assert_eq!(payloads, vec![serde_json::json!({"resources": ["crisis/signals"]})]);
        assert!(manager.last_update_at().is_some());
        assert!(status_rx.borrow().last_update_at.is_some());

        // Malformed frames are not connection errors
        assert!(manager.connected());
        assert_eq!(manager.status().reconnect_attempts, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_callback_after_unsubscribe() {
        let transport = Arc::new(MockTransport::scripted(&[Outcome::Accept]));
        let (manager, received) = manager_with(transport.clone());

        manager.subscribe();
        settle().await;
        let server = transport.take_server().unwrap();

        manager.unsubscribe();
        server.push(r#"{"type":"update","data":{"x":1}}"#);
        settle().await;

        assert!(received.lock().is_empty());
        assert_eq!(manager.last_update_at(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_duplicate_subscribe_is_refused() {
        let transport = Arc::new(MockTransport::scripted(&[Outcome::Accept, Outcome::Accept]));
        let (manager, _) = manager_with(transport.clone());

        assert!(manager.subscribe());
        // Still connecting
        assert!(!manager.subscribe());
        settle().await;
        // Open
        assert!(!manager.subscribe());

        sleep(Duration::from_secs(30)).await;
        assert_eq!(transport.connect_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_open_resets_reconnect_budget() {
        let transport = Arc::new(MockTransport::scripted(&[
            Outcome::Refuse,
            Outcome::Refuse,
            Outcome::Accept,
            Outcome::Accept,
        ]));
        let (manager, _) = manager_with(transport.clone());

        manager.subscribe();
        sleep(Duration::from_secs(16)).await;
        assert!(manager.connected());
        assert_eq!(manager.status().reconnect_attempts, 0);

        // Open past the stability window, then the server drops it:
        // a fresh budget starts at 5s
        sleep(Duration::from_secs(10)).await;
        let mut server = transport.take_server().unwrap();
        server.disconnect();
        settle().await;

        let status = manager.status();
        assert_eq!(status.state, ConnectionState::Closed);
        assert_eq!(status.reconnect_attempts, 1);
        assert_eq!(status.pending_reconnect, Some(Duration::from_secs(5)));

        sleep(Duration::from_secs(6)).await;
        assert!(manager.connected());
        assert_eq!(transport.connect_count(), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_flapping_server_exhausts_budget() {
        let transport = Arc::new(MockTransport::scripted(&[Outcome::Accept; 4]));
        let (manager, _) = manager_with(transport.clone());
        let mut delays = Vec::new();

        assert!(manager.subscribe());
        for _ in 0..3 {
            settle().await;
            assert!(manager.connected());

            // Accepted, then dropped before it could count as stable
            let mut server = transport.take_server().unwrap();
            server.disconnect();
            settle().await;

            let status = manager.status();
            assert_eq!(status.state, ConnectionState::Closed);
            let delay = status.pending_reconnect.unwrap();
            delays.push(delay);
            sleep(delay).await;
        }

        assert_eq!(
            delays,
            vec![Duration::from_secs(5), Duration::from_secs(10), Duration::from_secs(20)]
        );

        let status = manager.status();
        assert_eq!(status.state, ConnectionState::Closed);
        assert_eq!(status.reconnect_attempts, 3);
        assert_eq!(status.pending_reconnect, None);
        assert!(status.is_dormant(3));
        assert!(!manager.connected());

        sleep(Duration::from_secs(120)).await;
        assert_eq!(transport.connect_count(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_unsubscribe_passes_through_closing() {
        let transport = Arc::new(MockTransport::scripted(&[Outcome::Accept]));
        let (manager, _) = manager_with(transport.clone());

        manager.subscribe();
        settle().await;
        let mut server = transport.take_server().unwrap();
        let mut status_rx = manager.watch_status();

        manager.unsubscribe();
        let status = manager.status();
        assert_eq!(status.state, ConnectionState::Closing);
        assert!(!manager.connected());
        assert!(status.is_dormant(3));
        assert!(!manager.subscribe());

        // The connection task closes the transport, then reports Closed
        settle().await;
        assert_eq!(manager.status().state, ConnectionState::Closed);
        assert!(server.drain_received().1);
        assert_eq!(status_rx.borrow_and_update().state, ConnectionState::Closed);
    }

    struct HangingTransport;

    #[async_trait]
    impl StreamTransport for HangingTransport {
        async fn connect(&self, _address: &str) -> SyncResult<TransportLink> {
            futures::future::pending().await
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_connect_timeout_is_a_disconnect() {
        let (manager, _) = manager_with(Arc::new(HangingTransport));

        manager.subscribe();
        settle().await;
        assert_eq!(manager.status().state, ConnectionState::Connecting);

        sleep(Duration::from_secs(10)).await;
        let status = manager.status();
        assert_eq!(status.state, ConnectionState::Closed);
        assert_eq!(status.reconnect_attempts, 1);
        assert_eq!(status.pending_reconnect, Some(Duration::from_secs(5)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_unsubscribe_during_handshake() {
        let (manager, _) = manager_with(Arc::new(HangingTransport));

        manager.subscribe();
        settle().await;
        manager.unsubscribe();
        assert_eq!(manager.status().state, ConnectionState::Closing);
        sleep(Duration::from_secs(60)).await;

        let status = manager.status();
        assert_eq!(status.state, ConnectionState::Closed);
        assert_eq!(status.reconnect_attempts, 0);
        assert_eq!(status.pending_reconnect, None);
    }
}
