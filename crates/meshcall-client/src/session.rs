//! Room session — local identity, roster tracking, and signal dispatch.
//!
//! The session is the single place where roster events and inbound envelopes
//! meet the peer registry, which keeps the roster and the set of active peer
//! records in lockstep.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::chat::ChatRelay;
use crate::identity::Identity;
use crate::media::MediaController;
use crate::peer::PeerConnectionManager;
use crate::protocol::{ClientSignal, ServerSignal};
use crate::signaling::SignalingClient;

/// Current room membership as reported by the relay.
#[derive(Debug, Clone, Default)]
pub struct RoomState {
    pub room_id: String,
    /// peer id → username. Mirrors the set of active peer records exactly.
    pub roster: HashMap<String, String>,
}

pub struct RoomSession {
    identity: Option<Identity>,
    room: Option<RoomState>,
    outbound: mpsc::Sender<ClientSignal>,
    peers: Arc<PeerConnectionManager>,
    media: Arc<MediaController>,
    chat: ChatRelay,
    transport: Option<SignalingClient>,
}

impl RoomSession {
    pub fn new(
        outbound: mpsc::Sender<ClientSignal>,
        peers: Arc<PeerConnectionManager>,
        media: Arc<MediaController>,
    ) -> Self {
        Self {
            identity: None,
            room: None,
            chat: ChatRelay::new(outbound.clone()),
            outbound,
            peers,
            media,
            transport: None,
        }
    }

    /// Hand the session the transport handle so `leave` can close it.
    pub fn attach_transport(&mut self, client: SignalingClient) {
        self.transport = Some(client);
    }

    /// Record the local identity and announce it to the relay. Must come
    /// before any room action; a second login is ignored.
    pub async fn login(&mut self, username: &str) {
        let username = username.trim();
        if username.is_empty() {
            return;
        }
        if self.identity.is_some() {
            warn!("Identity is already set, ignoring login");
            return;
        }
        self.identity = Some(Identity::new(username));
        let _ = self
            .outbound
            .send(ClientSignal::Login {
                username: username.to_string(),
            })
            .await;
        info!(username, "Logged in");
    }

    /// Join a room. Local media is brought up before membership is
    /// announced, so the first connections carry tracks when the devices
    /// cooperate; a capture failure degrades to camera-off mode.
    pub async fn join(&mut self, room_id: &str) {
        let room_id = room_id.trim();
        if room_id.is_empty() {
            return;
        }
        if self.room.is_some() {
            warn!(room_id, "Already in a room, ignoring join");
            return;
        }

        if let Err(e) = self.media.acquire_local_media().await {
            warn!(error = %e, "Joining without local media");
        }

        self.room = Some(RoomState {
            room_id: room_id.to_string(),
            roster: HashMap::new(),
        });
        let _ = self
            .outbound
            .send(ClientSignal::JoinRoom {
                room_id: room_id.to_string(),
            })
            .await;
        info!(room_id, "Joining room");
    }

    /// Ingest one envelope from the relay.
    ///
    /// Roster snapshot entries answer (the newcomer offers to us); a later
    /// `user_joined` means we are the established side toward a newcomer who
    /// is the only party guaranteed ready, so they initiate — this asymmetry
    /// avoids simultaneous-offer glare on the initial handshake.
    pub async fn handle_signal(&mut self, signal: ServerSignal) {
        match signal {
            ServerSignal::ExistingUsers { users } => {
                for user in users {
                    self.add_peer(user.user_id, user.username, false).await;
                }
            }
            ServerSignal::UserJoined { user_id, username } => {
                self.chat.push_system(format!("{username} joined the room."));
                self.add_peer(user_id, username, true).await;
            }
            ServerSignal::UserLeft { user_id, username } => {
                if let Some(room) = self.room.as_mut() {
                    room.roster.remove(&user_id);
                }
                self.peers.remove(&user_id).await;
                self.chat.push_system(format!("{username} left the room."));
            }
            ServerSignal::Offer { sender, sdp } => {
                if let Err(e) = self.peers.handle_offer(&sender, sdp).await {
                    warn!(peer_id = %sender, error = %e, "Offer handling failed");
                }
                // An offer may have created a record for a peer the roster
                // has not named yet; mirror it so the two stay in lockstep.
                if self.peers.contains(&sender).await {
                    if let Some(room) = self.room.as_mut() {
                        room.roster.entry(sender).or_default();
                    }
                }
            }
            ServerSignal::Answer { sender, sdp } => {
                if let Err(e) = self.peers.handle_answer(&sender, sdp).await {
                    warn!(peer_id = %sender, error = %e, "Answer handling failed");
                }
            }
            ServerSignal::Candidate { sender, candidate } => {
                self.peers.handle_candidate(&sender, candidate).await;
            }
            ServerSignal::Chat {
                sender_name,
                content,
                ..
            } => {
                self.chat.push_message(sender_name, content);
            }
        }
    }

    /// Send a text message to the room.
    pub async fn send_chat(&self, text: &str) {
        self.chat.send(text).await;
    }

    pub async fn toggle_audio(&self) -> bool {
        self.media.toggle_audio().await
    }

    pub async fn toggle_video(&self) -> bool {
        self.media.toggle_video().await
    }

    pub async fn start_screen_share(&self) -> meshcall_common::Result<()> {
        self.media.start_screen_share(&self.peers).await?;
        Ok(())
    }

    pub async fn stop_screen_share(&self) {
        self.media.stop_screen_share(&self.peers).await;
    }

    /// Leave the room: tear down every peer connection, release local
    /// tracks, close the transport, and drop the roster. In-flight
    /// operations are not cancelled individually.
    pub async fn leave(&mut self) {
        self.peers.close_all().await;
        self.media.release_all().await;
        if let Some(transport) = &self.transport {
            transport.close().await;
        }
        self.room = None;
        self.chat.clear();
        info!("Left room");
    }

    /// Register a remote peer: roster entry first, then the connection, so
    /// the two stay in lockstep. Engine failures are logged, not propagated;
    /// the rest of the room is unaffected.
    async fn add_peer(&mut self, user_id: String, username: String, is_initiator: bool) {
        if let Some(room) = self.room.as_mut() {
            room.roster.insert(user_id.clone(), username.clone());
        }
        if let Err(e) = self.peers.create(&user_id, &username, is_initiator).await {
            warn!(peer_id = %user_id, error = %e, "Peer connection setup failed");
        }
    }

    pub fn identity(&self) -> Option<&Identity> {
        self.identity.as_ref()
    }

    pub fn room(&self) -> Option<&RoomState> {
        self.room.as_ref()
    }

    pub fn chat(&self) -> &ChatRelay {
        &self.chat
    }

    pub fn peers(&self) -> &Arc<PeerConnectionManager> {
        &self.peers
    }

    pub fn media(&self) -> &Arc<MediaController> {
        &self.media
    }
}
