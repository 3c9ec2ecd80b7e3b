//! Types and events for local media state.

use std::fmt;

/// Opaque handle to a local capture track owned by the device layer.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TrackId(String);

impl TrackId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TrackId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Local capture state.
///
/// The outgoing video track for every connection is the camera track or the
/// screen track, never both.
#[derive(Debug, Clone, Default)]
pub struct MediaState {
    pub audio_enabled: bool,
    pub video_enabled: bool,
    pub screen_sharing: bool,
    pub camera_audio: Option<TrackId>,
    pub camera_video: Option<TrackId>,
    pub screen_video: Option<TrackId>,
}

/// The tracks currently attached to new peer connections. Empty when local
/// media never came up (camera-off mode).
#[derive(Debug, Clone, Default)]
pub struct OutgoingTracks {
    pub audio: Option<TrackId>,
    pub video: Option<TrackId>,
}

impl OutgoingTracks {
    pub fn is_empty(&self) -> bool {
        self.audio.is_none() && self.video.is_none()
    }
}

/// Events emitted for the UI layer.
#[derive(Debug, Clone)]
pub enum MediaEvent {
    /// Camera and microphone capture is up.
    CameraReady,
    /// Capture failed; the session continues in camera-off mode.
    AcquisitionFailed(String),
    AudioToggled { enabled: bool },
    VideoToggled { enabled: bool },
    ScreenShareStarted,
    ScreenShareStopped,
    /// The capture was stopped outside the app (OS-level "stop sharing").
    /// The owner should call `stop_screen_share` to revert to camera.
    ScreenShareEnded,
}
