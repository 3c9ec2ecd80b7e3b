//! Media controller — capture lifecycle, mute toggles, screen share.

use std::sync::Arc;

use meshcall_common::MediaError;
use tokio::sync::{mpsc, RwLock};
use tracing::{info, warn};

use crate::peer::PeerConnectionManager;

use super::devices::{CameraCapture, MediaDevices, ScreenCapture};
use super::types::{MediaEvent, MediaState, OutgoingTracks, TrackId};

/// Owns local capture and the screen-share track-replacement workflow.
///
/// Camera and microphone tracks are shared by every active peer connection;
/// only this controller stops or replaces them.
pub struct MediaController {
    devices: Arc<dyn MediaDevices>,
    state: Arc<RwLock<MediaState>>,
    event_tx: mpsc::Sender<MediaEvent>,
}

impl MediaController {
    pub fn new(devices: Arc<dyn MediaDevices>) -> (Self, mpsc::Receiver<MediaEvent>) {
        let (event_tx, event_rx) = mpsc::channel(256);
        let controller = Self {
            devices,
            state: Arc::new(RwLock::new(MediaState::default())),
            event_tx,
        };
        (controller, event_rx)
    }

    /// Request combined camera + microphone capture.
    ///
    /// Failure is reported and non-fatal: the session continues in
    /// camera-off mode and no retry is attempted.
    pub async fn acquire_local_media(&self) -> Result<(), MediaError> {
        match self.devices.acquire_user_media().await {
            Ok(CameraCapture { audio, video }) => {
                let mut state = self.state.write().await;
                state.camera_audio = Some(audio);
                state.camera_video = Some(video);
                state.audio_enabled = true;
                state.video_enabled = true;
                drop(state);

                let _ = self.event_tx.send(MediaEvent::CameraReady).await;
                info!("Local media acquired");
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "Could not access camera/microphone");
                let _ = self
                    .event_tx
                    .send(MediaEvent::AcquisitionFailed(e.to_string()))
                    .await;
                Err(e)
            }
        }
    }

    /// Flip the microphone. The track is muted in place, never removed, so
    /// no renegotiation happens. Returns the new enabled state.
    pub async fn toggle_audio(&self) -> bool {
        let (enabled, track) = {
            let mut state = self.state.write().await;
            state.audio_enabled = !state.audio_enabled;
            (state.audio_enabled, state.camera_audio.clone())
        };
        if let Some(track) = track {
            self.devices.set_track_enabled(&track, enabled).await;
        }
        let _ = self.event_tx.send(MediaEvent::AudioToggled { enabled }).await;
        enabled
    }

    /// Flip the camera. Same in-place discipline as [`toggle_audio`](Self::toggle_audio).
    pub async fn toggle_video(&self) -> bool {
        let (enabled, track) = {
            let mut state = self.state.write().await;
            state.video_enabled = !state.video_enabled;
            (state.video_enabled, state.camera_video.clone())
        };
        if let Some(track) = track {
            self.devices.set_track_enabled(&track, enabled).await;
        }
        let _ = self.event_tx.send(MediaEvent::VideoToggled { enabled }).await;
        enabled
    }

    /// Start display capture and swap it in as the outgoing video track on
    /// every active connection. Per-connection replacement failures do not
    /// block the others.
    pub async fn start_screen_share(
        &self,
        peers: &PeerConnectionManager,
    ) -> Result<(), MediaError> {
        if self.state.read().await.screen_sharing {
            return Ok(());
        }

        let ScreenCapture { video, ended } = match self.devices.acquire_display_media().await {
            Ok(capture) => capture,
            Err(MediaError::ScreenShareDenied) => {
                // User cancelled the picker. Benign.
                info!("Screen share cancelled");
                return Err(MediaError::ScreenShareDenied);
            }
            Err(e) => {
                warn!(error = %e, "Screen capture failed");
                return Err(e);
            }
        };

        {
            let mut state = self.state.write().await;
            state.screen_video = Some(video.clone());
            state.screen_sharing = true;
        }

        peers.replace_outgoing_video(&video).await;

        // OS-level "stop sharing" surfaces here; the owner reverts to camera.
        let event_tx = self.event_tx.clone();
        tokio::spawn(async move {
            if ended.await.is_ok() {
                let _ = event_tx.send(MediaEvent::ScreenShareEnded).await;
            }
        });

        let _ = self.event_tx.send(MediaEvent::ScreenShareStarted).await;
        info!(track = %video, "Screen share started");
        Ok(())
    }

    /// Release the screen capture and swap the camera track back in on every
    /// active connection.
    pub async fn stop_screen_share(&self, peers: &PeerConnectionManager) {
        let (screen, camera) = {
            let mut state = self.state.write().await;
            if !state.screen_sharing {
                return;
            }
            state.screen_sharing = false;
            (state.screen_video.take(), state.camera_video.clone())
        };

        if let Some(track) = screen {
            self.devices.stop_track(&track).await;
        }
        if let Some(camera) = camera {
            peers.replace_outgoing_video(&camera).await;
        }

        let _ = self.event_tx.send(MediaEvent::ScreenShareStopped).await;
        info!("Screen share stopped");
    }

    /// The tracks a newly created peer connection should carry right now:
    /// microphone audio plus the screen track while sharing, the camera
    /// track otherwise.
    pub async fn outgoing_tracks(&self) -> OutgoingTracks {
        let state = self.state.read().await;
        let video = if state.screen_sharing {
            state.screen_video.clone()
        } else {
            state.camera_video.clone()
        };
        OutgoingTracks {
            audio: state.camera_audio.clone(),
            video,
        }
    }

    /// Snapshot of the current media state.
    pub async fn snapshot(&self) -> MediaState {
        self.state.read().await.clone()
    }

    /// Stop every local track. Part of session teardown.
    pub async fn release_all(&self) {
        let tracks: Vec<TrackId> = {
            let mut state = self.state.write().await;
            state.screen_sharing = false;
            [
                state.camera_audio.take(),
                state.camera_video.take(),
                state.screen_video.take(),
            ]
            .into_iter()
            .flatten()
            .collect()
        };
        for track in tracks {
            self.devices.stop_track(&track).await;
        }
    }
}
