#[derive(Debug, thiserror::Error)]
pub enum MediaError {
    #[error("media acquisition failed: {0}")]
    Acquisition(String),

    #[error("screen capture is not supported in this environment")]
    ScreenShareUnsupported,

    #[error("screen share request was denied")]
    ScreenShareDenied,

    #[error("track replacement failed: {0}")]
    TrackReplacement(String),
}

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("negotiation error: {0}")]
    Negotiation(String),

    #[error("candidate error: {0}")]
    Candidate(String),

    #[error("track error: {0}")]
    Track(String),

    #[error("no connection for peer: {0}")]
    UnknownPeer(String),
}

#[derive(Debug, thiserror::Error)]
pub enum CallError {
    #[error(transparent)]
    Media(#[from] MediaError),

    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error("signaling error: {0}")]
    Signaling(String),

    #[error("{0}")]
    Other(String),
}
