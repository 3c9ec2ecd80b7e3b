//! In-memory fakes for the engine and device capability traits.

use std::collections::HashSet;
use std::sync::Mutex;

use async_trait::async_trait;
use meshcall_common::{EngineError, MediaError};
use tokio::sync::oneshot;

use crate::media::{CameraCapture, MediaDevices, ScreenCapture, TrackId};
use crate::peer::PeerEngine;
use crate::protocol::{IceCandidate, SessionDescription};

// ---------------------------------------------------------------------------
// Fake engine
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum EngineCall {
    CreatePeer(String),
    AttachTracks(String),
    CreateOffer(String),
    CreateAnswer(String),
    SetLocal(String),
    SetRemote(String),
    AddCandidate(String, String),
    ReplaceVideo(String, TrackId),
    ClosePeer(String),
}

#[derive(Default)]
pub(crate) struct FakeEngine {
    calls: Mutex<Vec<EngineCall>>,
    fail_replace_for: Mutex<HashSet<String>>,
}

impl FakeEngine {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn fail_replace_for(&self, peer_id: &str) {
        self.fail_replace_for
            .lock()
            .unwrap()
            .insert(peer_id.to_string());
    }

    pub(crate) fn count(&self, pred: impl Fn(&EngineCall) -> bool) -> usize {
        self.calls.lock().unwrap().iter().filter(|c| pred(c)).count()
    }

    /// Candidate payloads applied for a peer, in application order.
    pub(crate) fn applied_candidates(&self, peer_id: &str) -> Vec<String> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter_map(|call| match call {
                EngineCall::AddCandidate(id, payload) if id == peer_id => Some(payload.clone()),
                _ => None,
            })
            .collect()
    }

    /// Video tracks swapped in for a peer, in order.
    pub(crate) fn replaced_video(&self, peer_id: &str) -> Vec<TrackId> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter_map(|call| match call {
                EngineCall::ReplaceVideo(id, track) if id == peer_id => Some(track.clone()),
                _ => None,
            })
            .collect()
    }

    fn record(&self, call: EngineCall) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl PeerEngine for FakeEngine {
    async fn create_peer(&self, peer_id: &str) -> Result<(), EngineError> {
        self.record(EngineCall::CreatePeer(peer_id.to_string()));
        Ok(())
    }

    async fn attach_tracks(
        &self,
        peer_id: &str,
        _audio: Option<&TrackId>,
        _video: Option<&TrackId>,
    ) -> Result<(), EngineError> {
        self.record(EngineCall::AttachTracks(peer_id.to_string()));
        Ok(())
    }

    async fn create_offer(&self, peer_id: &str) -> Result<SessionDescription, EngineError> {
        self.record(EngineCall::CreateOffer(peer_id.to_string()));
        Ok(SessionDescription::offer(format!("offer-for-{peer_id}")))
    }

    async fn create_answer(&self, peer_id: &str) -> Result<SessionDescription, EngineError> {
        self.record(EngineCall::CreateAnswer(peer_id.to_string()));
        Ok(SessionDescription::answer(format!("answer-for-{peer_id}")))
    }

    async fn set_local_description(
        &self,
        peer_id: &str,
        _sdp: &SessionDescription,
    ) -> Result<(), EngineError> {
        self.record(EngineCall::SetLocal(peer_id.to_string()));
        Ok(())
    }

    async fn set_remote_description(
        &self,
        peer_id: &str,
        _sdp: &SessionDescription,
    ) -> Result<(), EngineError> {
        self.record(EngineCall::SetRemote(peer_id.to_string()));
        Ok(())
    }

    async fn add_ice_candidate(
        &self,
        peer_id: &str,
        candidate: &IceCandidate,
    ) -> Result<(), EngineError> {
        self.record(EngineCall::AddCandidate(
            peer_id.to_string(),
            candidate.candidate.clone(),
        ));
        Ok(())
    }

    async fn replace_outgoing_video_track(
        &self,
        peer_id: &str,
        track: &TrackId,
    ) -> Result<(), EngineError> {
        if self.fail_replace_for.lock().unwrap().contains(peer_id) {
            return Err(EngineError::Track(format!("replace failed for {peer_id}")));
        }
        self.record(EngineCall::ReplaceVideo(peer_id.to_string(), track.clone()));
        Ok(())
    }

    async fn close_peer(&self, peer_id: &str) {
        self.record(EngineCall::ClosePeer(peer_id.to_string()));
    }
}

// ---------------------------------------------------------------------------
// Fake devices
// ---------------------------------------------------------------------------

pub(crate) struct FakeDevices {
    fail_camera: bool,
    screen_error: Option<ScreenFailure>,
    toggles: Mutex<Vec<(TrackId, bool)>>,
    stopped: Mutex<Vec<TrackId>>,
    screen_ended: Mutex<Option<oneshot::Sender<()>>>,
}

pub(crate) enum ScreenFailure {
    Denied,
    Unsupported,
}

impl FakeDevices {
    pub(crate) fn new() -> Self {
        Self {
            fail_camera: false,
            screen_error: None,
            toggles: Mutex::new(Vec::new()),
            stopped: Mutex::new(Vec::new()),
            screen_ended: Mutex::new(None),
        }
    }

    pub(crate) fn without_camera() -> Self {
        Self {
            fail_camera: true,
            ..Self::new()
        }
    }

    pub(crate) fn failing_screen(failure: ScreenFailure) -> Self {
        Self {
            screen_error: Some(failure),
            ..Self::new()
        }
    }

    /// Simulate an OS-level "stop sharing" on the current capture.
    pub(crate) fn end_screen_capture(&self) {
        if let Some(tx) = self.screen_ended.lock().unwrap().take() {
            let _ = tx.send(());
        }
    }

    pub(crate) fn toggles(&self) -> Vec<(TrackId, bool)> {
        self.toggles.lock().unwrap().clone()
    }

    pub(crate) fn stopped(&self) -> Vec<TrackId> {
        self.stopped.lock().unwrap().clone()
    }
}

#[async_trait]
impl MediaDevices for FakeDevices {
    async fn acquire_user_media(&self) -> Result<CameraCapture, MediaError> {
        if self.fail_camera {
            return Err(MediaError::Acquisition("permission denied".into()));
        }
        Ok(CameraCapture {
            audio: TrackId::new("cam-audio"),
            video: TrackId::new("cam-video"),
        })
    }

    async fn acquire_display_media(&self) -> Result<ScreenCapture, MediaError> {
        match self.screen_error {
            Some(ScreenFailure::Denied) => return Err(MediaError::ScreenShareDenied),
            Some(ScreenFailure::Unsupported) => return Err(MediaError::ScreenShareUnsupported),
            None => {}
        }
        let (tx, rx) = oneshot::channel();
        *self.screen_ended.lock().unwrap() = Some(tx);
        Ok(ScreenCapture {
            video: TrackId::new("screen-video"),
            ended: rx,
        })
    }

    async fn set_track_enabled(&self, track: &TrackId, enabled: bool) {
        self.toggles.lock().unwrap().push((track.clone(), enabled));
    }

    async fn stop_track(&self, track: &TrackId) {
        self.stopped.lock().unwrap().push(track.clone());
    }
}
