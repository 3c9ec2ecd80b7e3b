//! Capability interface over the native capture stack.

use async_trait::async_trait;
use meshcall_common::MediaError;
use tokio::sync::oneshot;

use super::types::TrackId;

/// Combined camera + microphone capture.
#[derive(Debug)]
pub struct CameraCapture {
    pub audio: TrackId,
    pub video: TrackId,
}

/// Display capture. `ended` fires when the capture is stopped outside the
/// app, e.g. an OS-level "stop sharing" control.
#[derive(Debug)]
pub struct ScreenCapture {
    pub video: TrackId,
    pub ended: oneshot::Receiver<()>,
}

/// Native capture devices, injected so media logic runs without real
/// hardware.
#[async_trait]
pub trait MediaDevices: Send + Sync {
    /// Request combined audio+video capture.
    async fn acquire_user_media(&self) -> Result<CameraCapture, MediaError>;

    /// Request display capture.
    async fn acquire_display_media(&self) -> Result<ScreenCapture, MediaError>;

    /// Enable or disable a track in place. The track stays attached to its
    /// connections; this never triggers renegotiation.
    async fn set_track_enabled(&self, track: &TrackId, enabled: bool);

    /// Stop a track and release the underlying capture resource.
    async fn stop_track(&self, track: &TrackId);
}
