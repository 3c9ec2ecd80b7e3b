//! Configuration, events, and commands for the signaling channel.

use crate::protocol::{ClientSignal, ServerSignal};

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Configuration for connecting to the signaling relay.
#[derive(Debug, Clone)]
pub struct SignalingConfig {
    /// Relay host, with port where needed (e.g. "call.example.org:8080").
    pub host: String,
    /// WebSocket endpoint path on the relay.
    pub path: String,
    /// Use an encrypted transport (wss).
    pub secure: bool,
    /// Connect timeout in seconds.
    pub connect_timeout_secs: u64,
}

impl Default for SignalingConfig {
    fn default() -> Self {
        Self {
            host: "localhost:8080".to_string(),
            path: "/signal".to_string(),
            secure: false,
            connect_timeout_secs: 15,
        }
    }
}

impl SignalingConfig {
    /// Derive the transport scheme from the scheme the hosting page was
    /// served over: an encrypted page gets an encrypted signaling channel.
    pub fn for_page(host: impl Into<String>, page_encrypted: bool) -> Self {
        Self {
            host: host.into(),
            secure: page_encrypted,
            ..Self::default()
        }
    }

    pub(crate) fn ws_url(&self) -> String {
        let scheme = if self.secure { "wss" } else { "ws" };
        format!("{scheme}://{}{}", self.host, self.path)
    }
}

// ---------------------------------------------------------------------------
// Events & Commands
// ---------------------------------------------------------------------------

/// Events emitted by the signaling channel.
#[derive(Debug)]
pub enum SignalingEvent {
    /// Channel established.
    Connected,
    /// Channel closed. No reconnect is attempted.
    Disconnected,
    /// A decoded envelope from the relay. Delivery order per connection is
    /// preserved, but causality across event types is not.
    Signal(ServerSignal),
    /// Error.
    Error(String),
}

/// Commands sent to the background connection task.
#[derive(Debug)]
pub(crate) enum SignalingCommand {
    Send(ClientSignal),
    Close,
}
