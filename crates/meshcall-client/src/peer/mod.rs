//! Per-peer connection records and their negotiation state machines.

mod engine;
mod manager;
mod types;

pub use engine::PeerEngine;
pub use manager::PeerConnectionManager;
pub use types::{PeerEvent, PeerRecord, PeerState, TransportState};
