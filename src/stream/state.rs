use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;
use std::time::Duration;

/// Lifecycle of the single logical connection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ConnectionState {
    /// Never subscribed
    Idle,
    /// Handshake in progress
    Connecting,
    Open,
    /// Torn down by the client; the transport is still shutting down
    Closing,
    /// Disconnected; a reconnect may be pending
    Closed,
}

impl ConnectionState {
    /// Connect attempts are refused in these states
    pub fn is_active(&self) -> bool {
        matches!(
            self,
            ConnectionState::Connecting | ConnectionState::Open | ConnectionState::Closing
        )
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ConnectionState::Idle => "idle",
            ConnectionState::Connecting => "connecting",
            ConnectionState::Open => "open",
            ConnectionState::Closing => "closing",
            ConnectionState::Closed => "closed",
        };
        write!(f, "{}", name)
    }
}

/// Observable snapshot of a `StreamManager`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConnectionStatus {
    pub state: ConnectionState,
    pub reconnect_attempts: u32,
    pub intentionally_closed: bool,
    /// Delay of the reconnect currently scheduled, if any
    pub pending_reconnect: Option<Duration>,
    pub last_update_at: Option<DateTime<Utc>>,
}

impl ConnectionStatus {
    pub fn connected(&self) -> bool {
        self.state == ConnectionState::Open
    }

    /// Disconnected for good: torn down, or out of reconnects with nothing pending
    pub fn is_dormant(&self, max_attempts: u32) -> bool {
        match self.state {
            ConnectionState::Closing => self.intentionally_closed,
            ConnectionState::Closed => {
                self.pending_reconnect.is_none()
                    && (self.intentionally_closed || self.reconnect_attempts >= max_attempts)
            }
            _ => false,
        }
    }
}

impl Default for ConnectionStatus {
    fn default() -> Self {
        Self {
            state: ConnectionState::Idle,
            reconnect_attempts: 0,
            intentionally_closed: false,
            pending_reconnect: None,
            last_update_at: None,
        }
    }
}

impl fmt::Display for ConnectionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (attempts={}", self.state, self.reconnect_attempts)?;
        if let Some(delay) = self.pending_reconnect {
            write!(f, ", reconnect in {}s", delay.as_secs())?;
        }
        if self.intentionally_closed {
            write!(f, ", closed by client")?;
        }
        write!(f, ")")
    }
}
