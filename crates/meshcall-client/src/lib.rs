//! Client-side orchestration for a mesh video call: signaling transport,
//! per-peer negotiation state machines, local media control, and chat.
//!
//! The native WebRTC engine and the capture stack are injected behind the
//! [`peer::PeerEngine`] and [`media::MediaDevices`] traits; this crate
//! decides who offers, when candidates buffer and flush, and how outgoing
//! tracks move between camera and screen across every connection.

pub mod chat;
pub mod identity;
pub mod media;
pub mod peer;
pub mod protocol;
pub mod session;
pub mod signaling;

#[cfg(test)]
pub(crate) mod testing;

pub use chat::{ChatEntry, ChatRelay};
pub use identity::Identity;
pub use media::{MediaController, MediaDevices, MediaEvent, MediaState, TrackId};
pub use peer::{PeerConnectionManager, PeerEngine, PeerEvent, PeerRecord, PeerState};
pub use protocol::{ClientSignal, IceCandidate, RoomMember, SdpType, ServerSignal, SessionDescription};
pub use session::{RoomSession, RoomState};
pub use signaling::{SignalingClient, SignalingConfig, SignalingEvent};
