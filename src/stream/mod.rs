//! Realtime update stream
//!
//! One persistent duplex connection to the analytics service's streaming
//! endpoint, reconnected with bounded exponential backoff. Every well-formed
//! `update` envelope is handed to the subscriber callback; the consumer
//! typically uses it to invalidate cached resources.

pub mod backoff;
pub mod manager;
pub mod message;
pub mod state;
pub mod transport;

pub use backoff::ReconnectPolicy;
pub use manager::{StreamConfig, StreamManager, UpdateCallback};
pub use message::{parse_frame, StreamMessage, UpdateEvent, KEEPALIVE_FRAME};
pub use state::{ConnectionState, ConnectionStatus};
pub use transport::{FrameSink, FrameStream, StreamTransport, TransportLink, WsTransport};
