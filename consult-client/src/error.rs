use crate::call::CallState;
use crate::media::MediaKind;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MediaError {
    #[error("permission to use media devices was denied: {0}")]
    Denied(String),

    #[error("no {0} input device available")]
    Unavailable(MediaKind),

    #[error("neither audio nor video was requested")]
    NothingRequested,

    #[error("track '{0}' has been stopped")]
    Stopped(String),

    #[error(transparent)]
    Rtc(#[from] webrtc::Error),
}

#[derive(Debug, Error)]
pub enum SignalingError {
    #[error("failed to connect to relay: {0}")]
    Connect(#[from] tokio_tungstenite::tungstenite::Error),

    #[error("relay refused the connection: {0}")]
    Refused(String),

    #[error("signaling channel closed")]
    Closed,

    #[error("failed to encode signal: {0}")]
    Encode(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum PeerError {
    #[error("negotiation failed: {0}")]
    Negotiation(String),

    #[error("invalid ICE candidate: {0}")]
    Candidate(String),

    #[error(transparent)]
    Rtc(#[from] webrtc::Error),
}

#[derive(Debug, Error)]
pub enum SessionApiError {
    #[error(transparent)]
    Http(#[from] reqwest::Error),

    #[error("session API answered {0}")]
    Status(reqwest::StatusCode),
}

#[derive(Debug, Error)]
pub enum CallError {
    #[error("call has already ended")]
    Ended,

    #[error("timed out waiting for the call")]
    Timeout,

    #[error("invalid call state transition {from:?} -> {to:?}")]
    InvalidTransition { from: CallState, to: CallState },
}
