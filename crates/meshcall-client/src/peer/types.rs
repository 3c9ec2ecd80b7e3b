//! Types and events for per-peer connection tracking.

use std::collections::VecDeque;

use crate::protocol::IceCandidate;

/// Negotiation progress for one remote peer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PeerState {
    /// Record created, negotiation not started.
    Init,
    /// Local offer applied and sent; waiting for the answer.
    OfferSent,
    /// Waiting for the remote side to open negotiation.
    AwaitingOffer,
    /// Remote description applied, local answer not yet applied.
    HaveRemote,
    /// Offer/answer exchange complete.
    Stable,
    /// Transport reports the connection is up.
    Connected,
    /// Transport-reported failure or disconnect. No retry, no ICE restart.
    Failed,
    /// Removed. Terminal.
    Closed,
}

/// Book-keeping for one remote peer. Exactly one record exists per peer id.
#[derive(Debug, Clone)]
pub struct PeerRecord {
    pub peer_id: String,
    pub username: String,
    pub state: PeerState,
    pub is_initiator: bool,
    /// Candidates that arrived before the remote description, in arrival
    /// order. Drained exactly once, the instant the description is applied.
    pub pending_candidates: VecDeque<IceCandidate>,
    pub remote_description_applied: bool,
}

impl PeerRecord {
    pub(crate) fn new(peer_id: String, username: String, is_initiator: bool) -> Self {
        Self {
            peer_id,
            username,
            state: PeerState::Init,
            is_initiator,
            pending_candidates: VecDeque::new(),
            remote_description_applied: false,
        }
    }
}

/// Transport-level connection state reported by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportState {
    Connected,
    Disconnected,
    Failed,
}

/// Events emitted for the UI layer.
#[derive(Debug, Clone)]
pub enum PeerEvent {
    Added {
        peer_id: String,
        username: String,
        is_initiator: bool,
    },
    /// Offer/answer exchange reached a stable description pair.
    Negotiated { peer_id: String },
    Connected { peer_id: String },
    Failed { peer_id: String },
    /// Record removed; UI and media cleanup may run.
    Removed { peer_id: String, username: String },
}
