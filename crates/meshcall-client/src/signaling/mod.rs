//! Persistent WebSocket channel to the signaling relay.

mod client;
mod connection;
mod types;

pub use client::SignalingClient;
pub use types::{SignalingConfig, SignalingEvent};
