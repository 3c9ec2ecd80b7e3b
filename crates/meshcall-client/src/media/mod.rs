//! Local capture state and the screen-share track-replacement workflow.

mod controller;
mod devices;
mod types;

pub use controller::MediaController;
pub use devices::{CameraCapture, MediaDevices, ScreenCapture};
pub use types::{MediaEvent, MediaState, OutgoingTracks, TrackId};
