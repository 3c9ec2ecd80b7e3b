//! Peer connection manager — the registry of per-peer records and their
//! negotiation state machines.
//!
//! Independent peer negotiations are not globally serialized: a candidate for
//! peer B may land while peer A's offer/answer exchange is in flight. The
//! candidate buffer is therefore a per-record discipline, never an assumption
//! about arrival order.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use meshcall_common::EngineError;
use tokio::sync::{mpsc, RwLock};
use tracing::{debug, info, warn};

use crate::media::{MediaController, TrackId};
use crate::protocol::{ClientSignal, IceCandidate, SessionDescription};

use super::engine::PeerEngine;
use super::types::{PeerEvent, PeerRecord, PeerState, TransportState};

pub struct PeerConnectionManager {
    engine: Arc<dyn PeerEngine>,
    media: Arc<MediaController>,
    registry: Arc<RwLock<HashMap<String, PeerRecord>>>,
    /// Outbound envelopes, pumped into the signaling channel by the owner.
    signal_tx: mpsc::Sender<ClientSignal>,
    event_tx: mpsc::Sender<PeerEvent>,
}

impl PeerConnectionManager {
    pub fn new(
        engine: Arc<dyn PeerEngine>,
        media: Arc<MediaController>,
        signal_tx: mpsc::Sender<ClientSignal>,
    ) -> (Self, mpsc::Receiver<PeerEvent>) {
        let (event_tx, event_rx) = mpsc::channel(256);
        let mgr = Self {
            engine,
            media,
            registry: Arc::new(RwLock::new(HashMap::new())),
            signal_tx,
            event_tx,
        };
        (mgr, event_rx)
    }

    /// Create a record for a peer. Idempotent: an existing record is returned
    /// untouched and no second negotiation starts.
    ///
    /// If local media is not up yet, the connection is created track-less; no
    /// retry attaches tracks later. An initiator immediately generates and
    /// sends its offer.
    pub async fn create(
        &self,
        peer_id: &str,
        username: &str,
        is_initiator: bool,
    ) -> Result<PeerRecord, EngineError> {
        if let Some(existing) = self.registry.read().await.get(peer_id) {
            debug!(peer_id, "Peer record already exists");
            return Ok(existing.clone());
        }

        info!(peer_id, is_initiator, "Creating peer connection");
        self.engine.create_peer(peer_id).await?;

        let tracks = self.media.outgoing_tracks().await;
        if tracks.is_empty() {
            warn!(peer_id, "No local media, creating track-less connection");
        } else {
            self.engine
                .attach_tracks(peer_id, tracks.audio.as_ref(), tracks.video.as_ref())
                .await?;
        }

        self.registry.write().await.insert(
            peer_id.to_string(),
            PeerRecord::new(peer_id.to_string(), username.to_string(), is_initiator),
        );

        if is_initiator {
            let offer = self.engine.create_offer(peer_id).await?;
            self.engine.set_local_description(peer_id, &offer).await?;
            self.set_state(peer_id, PeerState::OfferSent).await;
            let _ = self
                .signal_tx
                .send(ClientSignal::Offer {
                    target: peer_id.to_string(),
                    sdp: offer,
                })
                .await;
        } else {
            self.set_state(peer_id, PeerState::AwaitingOffer).await;
        }

        let _ = self
            .event_tx
            .send(PeerEvent::Added {
                peer_id: peer_id.to_string(),
                username: username.to_string(),
                is_initiator,
            })
            .await;

        Ok(self
            .registry
            .read()
            .await
            .get(peer_id)
            .cloned()
            .unwrap_or_else(|| {
                PeerRecord::new(peer_id.to_string(), username.to_string(), is_initiator)
            }))
    }

    /// Ingest an offer. A record is created on the fly when the sender is
    /// unknown; a state mismatch is an expected race, logged, never rejected.
    pub async fn handle_offer(
        &self,
        from: &str,
        sdp: SessionDescription,
    ) -> Result<(), EngineError> {
        let state = self.registry.read().await.get(from).map(|r| r.state);
        match state {
            None => {
                self.create(from, "", false).await?;
            }
            Some(state) => {
                debug!(peer_id = from, "Existing peer record found for offer");
                if !matches!(state, PeerState::Init | PeerState::AwaitingOffer) {
                    warn!(
                        peer_id = from,
                        ?state,
                        "Offer arrived in unexpected negotiation state, proceeding"
                    );
                }
            }
        }

        self.engine.set_remote_description(from, &sdp).await?;
        let pending = self.mark_remote_applied(from, PeerState::HaveRemote).await;
        self.apply_candidates(from, pending).await;

        let answer = self.engine.create_answer(from).await?;
        self.engine.set_local_description(from, &answer).await?;
        self.set_state(from, PeerState::Stable).await;

        let _ = self
            .signal_tx
            .send(ClientSignal::Answer {
                target: from.to_string(),
                sdp: answer,
            })
            .await;
        let _ = self
            .event_tx
            .send(PeerEvent::Negotiated {
                peer_id: from.to_string(),
            })
            .await;
        Ok(())
    }

    /// Ingest an answer. Unknown senders are ignored.
    pub async fn handle_answer(
        &self,
        from: &str,
        sdp: SessionDescription,
    ) -> Result<(), EngineError> {
        if !self.registry.read().await.contains_key(from) {
            debug!(peer_id = from, "Answer for unknown peer, ignoring");
            return Ok(());
        }

        self.engine.set_remote_description(from, &sdp).await?;
        let pending = self.mark_remote_applied(from, PeerState::Stable).await;
        self.apply_candidates(from, pending).await;

        let _ = self
            .event_tx
            .send(PeerEvent::Negotiated {
                peer_id: from.to_string(),
            })
            .await;
        Ok(())
    }

    /// Ingest a candidate: applied immediately once the remote description is
    /// in place, buffered FIFO before that, discarded when no record exists.
    pub async fn handle_candidate(&self, from: &str, candidate: IceCandidate) {
        {
            let mut registry = self.registry.write().await;
            match registry.get_mut(from) {
                None => {
                    warn!(peer_id = from, "Candidate for unknown peer, discarding");
                    return;
                }
                Some(record) if !record.remote_description_applied => {
                    record.pending_candidates.push_back(candidate);
                    debug!(
                        peer_id = from,
                        queued = record.pending_candidates.len(),
                        "Queued ICE candidate"
                    );
                    return;
                }
                Some(_) => {}
            }
        }

        if let Err(e) = self.engine.add_ice_candidate(from, &candidate).await {
            warn!(peer_id = from, error = %e, "Failed to apply ICE candidate");
        }
    }

    /// Remove a peer: release the underlying connection, delete the record
    /// and its candidate queue, and notify dependents. Returns the record in
    /// its terminal `Closed` state.
    pub async fn remove(&self, peer_id: &str) -> Option<PeerRecord> {
        let mut record = self.registry.write().await.remove(peer_id)?;
        record.state = PeerState::Closed;
        self.engine.close_peer(peer_id).await;
        let _ = self
            .event_tx
            .send(PeerEvent::Removed {
                peer_id: peer_id.to_string(),
                username: record.username.clone(),
            })
            .await;
        info!(peer_id, "Peer connection removed");
        Some(record)
    }

    /// Engine-reported transport state. Failure and disconnect park the
    /// record in `Failed`; nothing retries.
    pub async fn handle_transport_state(&self, peer_id: &str, transport: TransportState) {
        let known = {
            let mut registry = self.registry.write().await;
            match registry.get_mut(peer_id) {
                Some(record) => {
                    record.state = match transport {
                        TransportState::Connected => PeerState::Connected,
                        TransportState::Disconnected | TransportState::Failed => PeerState::Failed,
                    };
                    true
                }
                None => false,
            }
        };
        if !known {
            debug!(peer_id, "Transport state for unknown peer");
            return;
        }

        match transport {
            TransportState::Connected => {
                info!(peer_id, "Peer connected");
                let _ = self
                    .event_tx
                    .send(PeerEvent::Connected {
                        peer_id: peer_id.to_string(),
                    })
                    .await;
            }
            TransportState::Disconnected | TransportState::Failed => {
                warn!(peer_id, ?transport, "Peer transport failed");
                let _ = self
                    .event_tx
                    .send(PeerEvent::Failed {
                        peer_id: peer_id.to_string(),
                    })
                    .await;
            }
        }
    }

    /// Swap the outgoing video track on every active connection. Failures on
    /// one connection never block the others.
    pub async fn replace_outgoing_video(&self, track: &TrackId) {
        for peer_id in self.peer_ids().await {
            if let Err(e) = self
                .engine
                .replace_outgoing_video_track(&peer_id, track)
                .await
            {
                warn!(peer_id = %peer_id, error = %e, "Video track replacement failed");
            }
        }
    }

    /// Remove every peer. Part of session teardown.
    pub async fn close_all(&self) {
        for peer_id in self.peer_ids().await {
            self.remove(&peer_id).await;
        }
    }

    pub async fn peer_ids(&self) -> Vec<String> {
        self.registry.read().await.keys().cloned().collect()
    }

    pub async fn snapshot(&self, peer_id: &str) -> Option<PeerRecord> {
        self.registry.read().await.get(peer_id).cloned()
    }

    pub async fn contains(&self, peer_id: &str) -> bool {
        self.registry.read().await.contains_key(peer_id)
    }

    pub async fn len(&self) -> usize {
        self.registry.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.registry.read().await.is_empty()
    }

    async fn set_state(&self, peer_id: &str, state: PeerState) {
        if let Some(record) = self.registry.write().await.get_mut(peer_id) {
            record.state = state;
        }
    }

    /// Flip `remote_description_applied` and take the pending queue in one
    /// step, so the queue drains exactly once.
    async fn mark_remote_applied(&self, peer_id: &str, state: PeerState) -> VecDeque<IceCandidate> {
        let mut registry = self.registry.write().await;
        match registry.get_mut(peer_id) {
            Some(record) => {
                record.remote_description_applied = true;
                record.state = state;
                std::mem::take(&mut record.pending_candidates)
            }
            None => VecDeque::new(),
        }
    }

    async fn apply_candidates(&self, peer_id: &str, pending: VecDeque<IceCandidate>) {
        if pending.is_empty() {
            return;
        }
        debug!(peer_id, count = pending.len(), "Flushing queued candidates");
        for candidate in pending {
            if let Err(e) = self.engine.add_ice_candidate(peer_id, &candidate).await {
                warn!(peer_id, error = %e, "Failed to apply queued candidate");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::SdpType;
    use crate::testing::{EngineCall, FakeDevices, FakeEngine};

    struct Fixture {
        engine: Arc<FakeEngine>,
        manager: PeerConnectionManager,
        signal_rx: mpsc::Receiver<ClientSignal>,
        _events: mpsc::Receiver<PeerEvent>,
    }

    async fn fixture(with_media: bool) -> Fixture {
        let engine = Arc::new(FakeEngine::new());
        let (media, _media_events) = MediaController::new(Arc::new(FakeDevices::new()));
        let media = Arc::new(media);
        if with_media {
            media.acquire_local_media().await.unwrap();
        }
        let (signal_tx, signal_rx) = mpsc::channel(64);
        let (manager, events) = PeerConnectionManager::new(engine.clone(), media, signal_tx);
        Fixture {
            engine,
            manager,
            signal_rx,
            _events: events,
        }
    }

    fn cand(payload: &str) -> IceCandidate {
        IceCandidate {
            candidate: payload.to_string(),
            sdp_mid: Some("0".into()),
            sdp_m_line_index: Some(0),
        }
    }

    fn drain(rx: &mut mpsc::Receiver<ClientSignal>) -> Vec<ClientSignal> {
        let mut out = Vec::new();
        while let Ok(signal) = rx.try_recv() {
            out.push(signal);
        }
        out
    }

    #[tokio::test]
    async fn create_is_idempotent() {
        let mut f = fixture(true).await;

        let first = f.manager.create("u1", "bob", true).await.unwrap();
        let second = f.manager.create("u1", "bob", true).await.unwrap();

        assert_eq!(first.peer_id, second.peer_id);
        assert_eq!(second.state, PeerState::OfferSent);
        assert_eq!(f.manager.len().await, 1);
        assert_eq!(
            f.engine.count(|c| matches!(c, EngineCall::CreatePeer(_))),
            1
        );

        let offers = drain(&mut f.signal_rx)
            .into_iter()
            .filter(|s| matches!(s, ClientSignal::Offer { .. }))
            .count();
        assert_eq!(offers, 1);
    }

    #[tokio::test]
    async fn initiator_offers_and_non_initiator_waits() {
        let mut f = fixture(true).await;

        f.manager.create("u1", "bob", false).await.unwrap();
        assert_eq!(
            f.manager.snapshot("u1").await.unwrap().state,
            PeerState::AwaitingOffer
        );
        assert!(drain(&mut f.signal_rx).is_empty());

        f.manager.create("u2", "eve", true).await.unwrap();
        assert_eq!(
            f.manager.snapshot("u2").await.unwrap().state,
            PeerState::OfferSent
        );
        match drain(&mut f.signal_rx).as_slice() {
            [ClientSignal::Offer { target, sdp }] => {
                assert_eq!(target, "u2");
                assert_eq!(sdp.kind, SdpType::Offer);
            }
            other => panic!("unexpected envelopes: {other:?}"),
        }
    }

    #[tokio::test]
    async fn offer_from_unknown_peer_gets_exactly_one_answer() {
        let mut f = fixture(true).await;

        f.manager
            .handle_offer("u9", SessionDescription::offer("remote"))
            .await
            .unwrap();

        let record = f.manager.snapshot("u9").await.unwrap();
        assert!(!record.is_initiator);
        assert!(record.remote_description_applied);
        assert_eq!(record.state, PeerState::Stable);

        match drain(&mut f.signal_rx).as_slice() {
            [ClientSignal::Answer { target, sdp }] => {
                assert_eq!(target, "u9");
                assert_eq!(sdp.kind, SdpType::Answer);
            }
            other => panic!("unexpected envelopes: {other:?}"),
        }
    }

    #[tokio::test]
    async fn candidates_buffer_then_flush_once_in_arrival_order() {
        let f = fixture(true).await;
        f.manager.create("u1", "bob", false).await.unwrap();

        f.manager.handle_candidate("u1", cand("a")).await;
        f.manager.handle_candidate("u1", cand("b")).await;
        f.manager.handle_candidate("u1", cand("c")).await;

        assert!(f.engine.applied_candidates("u1").is_empty());
        assert_eq!(
            f.manager.snapshot("u1").await.unwrap().pending_candidates.len(),
            3
        );

        f.manager
            .handle_offer("u1", SessionDescription::offer("remote"))
            .await
            .unwrap();

        assert_eq!(f.engine.applied_candidates("u1"), vec!["a", "b", "c"]);
        assert!(f
            .manager
            .snapshot("u1")
            .await
            .unwrap()
            .pending_candidates
            .is_empty());

        // Post-description candidates apply immediately; nothing re-flushes.
        f.manager.handle_candidate("u1", cand("d")).await;
        assert_eq!(f.engine.applied_candidates("u1"), vec!["a", "b", "c", "d"]);
    }

    #[tokio::test]
    async fn answer_flushes_pending_candidates() {
        let f = fixture(true).await;
        f.manager.create("u1", "bob", true).await.unwrap();

        f.manager.handle_candidate("u1", cand("x")).await;
        f.manager.handle_candidate("u1", cand("y")).await;
        assert!(f.engine.applied_candidates("u1").is_empty());

        f.manager
            .handle_answer("u1", SessionDescription::answer("remote"))
            .await
            .unwrap();

        assert_eq!(f.engine.applied_candidates("u1"), vec!["x", "y"]);
        assert_eq!(
            f.manager.snapshot("u1").await.unwrap().state,
            PeerState::Stable
        );
    }

    #[tokio::test]
    async fn candidate_for_unknown_peer_is_discarded() {
        let f = fixture(true).await;

        f.manager.handle_candidate("ghost", cand("a")).await;

        assert!(f.engine.applied_candidates("ghost").is_empty());
        assert!(f.manager.is_empty().await);
    }

    #[tokio::test]
    async fn answer_for_unknown_peer_is_ignored() {
        let f = fixture(true).await;

        f.manager
            .handle_answer("ghost", SessionDescription::answer("remote"))
            .await
            .unwrap();

        assert_eq!(f.engine.count(|c| matches!(c, EngineCall::SetRemote(_))), 0);
    }

    #[tokio::test]
    async fn remove_deletes_record_and_queue() {
        let f = fixture(true).await;
        f.manager.create("u1", "bob", false).await.unwrap();
        f.manager.handle_candidate("u1", cand("a")).await;

        let removed = f.manager.remove("u1").await.unwrap();

        assert_eq!(removed.state, PeerState::Closed);
        assert!(!f.manager.contains("u1").await);
        assert_eq!(f.engine.count(|c| matches!(c, EngineCall::ClosePeer(_))), 1);

        assert!(f.manager.remove("u1").await.is_none());

        // A straggler candidate after removal is discarded without error.
        f.manager.handle_candidate("u1", cand("b")).await;
        assert!(f.engine.applied_candidates("u1").is_empty());
    }

    #[tokio::test]
    async fn transport_failure_parks_record_in_failed() {
        let f = fixture(true).await;
        f.manager.create("u1", "bob", true).await.unwrap();

        f.manager
            .handle_transport_state("u1", TransportState::Connected)
            .await;
        assert_eq!(
            f.manager.snapshot("u1").await.unwrap().state,
            PeerState::Connected
        );

        f.manager
            .handle_transport_state("u1", TransportState::Failed)
            .await;
        assert_eq!(
            f.manager.snapshot("u1").await.unwrap().state,
            PeerState::Failed
        );
    }

    #[tokio::test]
    async fn replacement_failure_on_one_peer_does_not_block_others() {
        let f = fixture(true).await;
        f.manager.create("u1", "bob", false).await.unwrap();
        f.manager.create("u2", "eve", false).await.unwrap();
        f.engine.fail_replace_for("u1");

        let track = TrackId::new("screen-video");
        f.manager.replace_outgoing_video(&track).await;

        assert!(f.engine.replaced_video("u1").is_empty());
        assert_eq!(f.engine.replaced_video("u2"), vec![track]);
    }

    #[tokio::test]
    async fn glare_offer_proceeds_past_state_mismatch() {
        let mut f = fixture(true).await;
        f.manager.create("u1", "bob", true).await.unwrap();
        drain(&mut f.signal_rx);

        // An offer lands while ours is in flight. Proceed, do not reject.
        f.manager
            .handle_offer("u1", SessionDescription::offer("remote"))
            .await
            .unwrap();

        assert_eq!(
            f.manager.snapshot("u1").await.unwrap().state,
            PeerState::Stable
        );
        let answers = drain(&mut f.signal_rx)
            .into_iter()
            .filter(|s| matches!(s, ClientSignal::Answer { .. }))
            .count();
        assert_eq!(answers, 1);
    }

    #[tokio::test]
    async fn connection_without_local_media_is_track_less() {
        let f = fixture(false).await;

        f.manager.create("u1", "bob", false).await.unwrap();

        assert_eq!(f.engine.count(|c| matches!(c, EngineCall::CreatePeer(_))), 1);
        assert_eq!(
            f.engine.count(|c| matches!(c, EngineCall::AttachTracks(_))),
            0
        );
    }
}
