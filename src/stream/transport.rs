//! Duplex text-frame transport
//!
//! The manager only sees a `TransportLink`: a sink of outgoing text frames
//! and a stream of incoming ones. A stream error or end-of-stream is a
//! disconnect. `WsTransport` is the production implementation on
//! tokio-tungstenite.

use crate::arguments::is_debug_stream_enabled;
use crate::errors::{SyncError, SyncResult};
use crate::logger::{self, LogTag};
use async_trait::async_trait;
use futures::future;
use futures::{Sink, Stream};
use futures_util::{SinkExt, StreamExt};
use std::pin::Pin;
use tokio_tungstenite::{connect_async, tungstenite::Message};

pub type FrameSink = Pin<Box<dyn Sink<String, Error = SyncError> + Send>>;
pub type FrameStream = Pin<Box<dyn Stream<Item = SyncResult<String>> + Send>>;

/// One established connection
pub struct TransportLink {
    pub sink: FrameSink,
    pub stream: FrameStream,
}

#[async_trait]
pub trait StreamTransport: Send + Sync {
    /// Open a connection to `address`; failure is a transport error
    async fn connect(&self, address: &str) -> SyncResult<TransportLink>;
}

/// WebSocket transport
#[derive(Debug, Default, Clone)]
pub struct WsTransport;

impl WsTransport {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl StreamTransport for WsTransport {
    async fn connect(&self, address: &str) -> SyncResult<TransportLink> {
        let (ws_stream, response) = connect_async(address)
            .await
            .map_err(|e| SyncError::transport(format!("WebSocket connect to {} failed: {}", address, e)))?;

        if is_debug_stream_enabled() {
            logger::debug(
                LogTag::Stream,
                &format!("WebSocket handshake with {} completed ({})", address, response.status()),
            );
        }

        let (ws_sender, ws_receiver) = ws_stream.split();

        let sink = ws_sender
            .sink_map_err(|e| SyncError::transport(format!("WebSocket send failed: {}", e)))
            .with(|text: String| future::ready(Ok::<Message, SyncError>(Message::Text(text))));

        // Control frames are handled by tungstenite; only text reaches the manager
        let stream = ws_receiver.filter_map(|message| {
            future::ready(match message {
                Ok(Message::Text(text)) => Some(Ok(text)),
                Ok(Message::Close(frame)) => {
                    let reason = frame
                        .map(|f| format!("{} {}", f.code, f.reason))
                        .unwrap_or_else(|| "no close frame".to_string());
                    Some(Err(SyncError::transport(format!("closed by server: {}", reason))))
                }
                Ok(_) => None,
                Err(e) => Some(Err(SyncError::transport(format!("WebSocket error: {}", e)))),
            })
        });

        Ok(TransportLink {
            sink: Box::pin(sink),
            stream: Box::pin(stream),
        })
    }
}

#[cfg(test)]
pub(crate) mod mock {
    //! Scripted in-memory transport for manager tests

    use super::*;
    use futures::channel::mpsc::{self, UnboundedReceiver, UnboundedSender};
    use parking_lot::Mutex;
    use std::collections::VecDeque;
    use tokio::time::Instant;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub enum Outcome {
        Refuse,
        Accept,
    }

    /// Server side of an accepted mock connection
    pub struct MockServer {
        frames: Option<UnboundedSender<SyncResult<String>>>,
        received: UnboundedReceiver<String>,
    }

    impl MockServer {
        pub fn push(&self, frame: &str) {
            if let Some(frames) = &self.frames {
                let _ = frames.unbounded_send(Ok(frame.to_string()));
            }
        }

        /// Drop the connection from the server side
        pub fn disconnect(&mut self) {
            self.frames = None;
        }

        /// Frames the client has sent so far; `None` once the client closed
        pub fn drain_received(&mut self) -> (Vec<String>, bool) {
            let mut frames = Vec::new();
            loop {
                match self.received.try_next() {
                    Ok(Some(frame)) => frames.push(frame),
                    Ok(None) => return (frames, true),
                    Err(_) => return (frames, false),
                }
            }
        }
    }

    /// Outcomes are consumed in order; once the script runs out every
    /// connect is refused.
    #[derive(Default)]
    pub struct MockTransport {
        script: Mutex<VecDeque<Outcome>>,
        connects: Mutex<Vec<Instant>>,
        servers: Mutex<VecDeque<MockServer>>,
    }

    impl MockTransport {
        pub fn scripted(outcomes: &[Outcome]) -> Self {
            Self {
                script: Mutex::new(outcomes.iter().copied().collect()),
                ..Self::default()
            }
        }

        pub fn connect_times(&self) -> Vec<Instant> {
            self.connects.lock().clone()
        }

        pub fn connect_count(&self) -> usize {
            self.connects.lock().len()
        }

        pub fn take_server(&self) -> Option<MockServer> {
            self.servers.lock().pop_front()
        }
    }

    #[async_trait]
    impl StreamTransport for MockTransport {
        async fn connect(&self, address: &str) -> SyncResult<TransportLink> {
            self.connects.lock().push(Instant::now());

            let outcome = self.script.lock().pop_front().unwrap_or(Outcome::Refuse);
            if outcome == Outcome::Refuse {
                return Err(SyncError::transport(format!("connection to {} refused", address)));
            }

            let (frames_tx, frames_rx) = mpsc::unbounded::<SyncResult<String>>();
            let (sent_tx, sent_rx) = mpsc::unbounded::<String>();

            self.servers.lock().push_back(MockServer {
                frames: Some(frames_tx),
                received: sent_rx,
            });

            Ok(TransportLink {
                sink: Box::pin(sent_tx.sink_map_err(|e| SyncError::transport(e.to_string()))),
                stream: Box::pin(frames_rx),
            })
        }
    }
}
