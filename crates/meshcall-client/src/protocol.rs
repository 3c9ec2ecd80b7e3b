//! Wire protocol for the signaling relay.
//!
//! Every frame is a JSON object with a discriminating `type` field. Field
//! names follow the relay's camelCase convention (`roomId`, `userId`,
//! `senderName`), and the SDP / candidate payloads mirror the browser's
//! `RTCSessionDescription` and `RTCIceCandidateInit` JSON shapes.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Envelopes
// ---------------------------------------------------------------------------

/// Envelopes sent from this client to the relay.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientSignal {
    /// Announce the local username. Sent once, before any room action.
    Login { username: String },
    /// Ask to join a room.
    JoinRoom {
        #[serde(rename = "roomId")]
        room_id: String,
    },
    /// SDP offer addressed to one peer.
    Offer {
        target: String,
        sdp: SessionDescription,
    },
    /// SDP answer addressed to one peer.
    Answer {
        target: String,
        sdp: SessionDescription,
    },
    /// ICE candidate addressed to one peer.
    Candidate {
        target: String,
        candidate: IceCandidate,
    },
    /// Room-wide text message. The relay attaches the sender identity.
    Chat { content: String },
}

/// Envelopes the relay delivers to this client.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerSignal {
    /// Roster snapshot sent once after joining a room.
    ExistingUsers { users: Vec<RoomMember> },
    UserJoined {
        #[serde(rename = "userId")]
        user_id: String,
        username: String,
    },
    UserLeft {
        #[serde(rename = "userId")]
        user_id: String,
        username: String,
    },
    Offer {
        sender: String,
        sdp: SessionDescription,
    },
    Answer {
        sender: String,
        sdp: SessionDescription,
    },
    Candidate {
        sender: String,
        candidate: IceCandidate,
    },
    Chat {
        #[serde(rename = "senderId", skip_serializing_if = "Option::is_none")]
        sender_id: Option<String>,
        #[serde(rename = "senderName")]
        sender_name: String,
        content: String,
    },
}

// ---------------------------------------------------------------------------
// Payloads
// ---------------------------------------------------------------------------

/// A `{userId, username}` roster entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoomMember {
    #[serde(rename = "userId")]
    pub user_id: String,
    pub username: String,
}

/// A session description, used as an offer or an answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionDescription {
    #[serde(rename = "type")]
    pub kind: SdpType,
    pub sdp: String,
}

impl SessionDescription {
    pub fn offer(sdp: impl Into<String>) -> Self {
        Self {
            kind: SdpType::Offer,
            sdp: sdp.into(),
        }
    }

    pub fn answer(sdp: impl Into<String>) -> Self {
        Self {
            kind: SdpType::Answer,
            sdp: sdp.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SdpType {
    Offer,
    Answer,
}

/// A discovered network path proposed for a peer's media transport.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IceCandidate {
    pub candidate: String,
    #[serde(rename = "sdpMid", skip_serializing_if = "Option::is_none")]
    pub sdp_mid: Option<String>,
    #[serde(rename = "sdpMLineIndex", skip_serializing_if = "Option::is_none")]
    pub sdp_m_line_index: Option<u32>,
}
