//! Capability interface over the native WebRTC engine.
//!
//! The manager drives negotiation through this trait, so who-offers-when and
//! candidate buffering are testable without a real transport stack. NAT
//! traversal, DTLS, and SRTP live behind it and are treated as pre-verified.

use async_trait::async_trait;
use meshcall_common::EngineError;

use crate::media::TrackId;
use crate::protocol::{IceCandidate, SessionDescription};

#[async_trait]
pub trait PeerEngine: Send + Sync {
    /// Allocate the underlying connection for a peer.
    async fn create_peer(&self, peer_id: &str) -> Result<(), EngineError>;

    /// Attach local outgoing tracks to a peer's connection.
    async fn attach_tracks(
        &self,
        peer_id: &str,
        audio: Option<&TrackId>,
        video: Option<&TrackId>,
    ) -> Result<(), EngineError>;

    async fn create_offer(&self, peer_id: &str) -> Result<SessionDescription, EngineError>;

    async fn create_answer(&self, peer_id: &str) -> Result<SessionDescription, EngineError>;

    async fn set_local_description(
        &self,
        peer_id: &str,
        sdp: &SessionDescription,
    ) -> Result<(), EngineError>;

    async fn set_remote_description(
        &self,
        peer_id: &str,
        sdp: &SessionDescription,
    ) -> Result<(), EngineError>;

    async fn add_ice_candidate(
        &self,
        peer_id: &str,
        candidate: &IceCandidate,
    ) -> Result<(), EngineError>;

    /// Swap the outgoing video track. Transport-transparent: requires no
    /// renegotiation.
    async fn replace_outgoing_video_track(
        &self,
        peer_id: &str,
        track: &TrackId,
    ) -> Result<(), EngineError>;

    /// Release the underlying connection.
    async fn close_peer(&self, peer_id: &str);
}
