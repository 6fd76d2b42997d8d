mod rtc_peer;

pub use rtc_peer::*;

use crate::error::PeerError;
use crate::media::{LocalMediaStream, MediaKind};
use async_trait::async_trait;
use consult_core::{IceCandidatePayload, IceServerConfig};
use tokio::sync::mpsc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PeerLinkState {
    New,
    Connecting,
    Connected,
    Disconnected,
    Failed,
    Closed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteTrackInfo {
    pub track_id: String,
    pub stream_id: String,
    pub kind: MediaKind,
}

/// What the peer connection reports back to the call.
#[derive(Debug, Clone)]
pub enum PeerEvent {
    /// Trickle ICE: relay this to the other party.
    LocalCandidate(IceCandidatePayload),
    /// Remote media arrived and is bound to the remote view.
    RemoteTrack(RemoteTrackInfo),
    StateChanged(PeerLinkState),
}

/// The single peer connection of a call.
#[async_trait]
pub trait PeerLink: Send + Sync {
    /// Caller side: create an offer and apply it locally.
    async fn create_offer(&self) -> Result<String, PeerError>;

    /// Callee side: apply the remote offer, then create and apply an answer.
    async fn accept_offer(&self, sdp: String) -> Result<String, PeerError>;

    /// Caller side: apply the remote answer.
    async fn accept_answer(&self, sdp: String) -> Result<(), PeerError>;

    async fn add_ice_candidate(&self, candidate: IceCandidatePayload) -> Result<(), PeerError>;

    async fn close(&self) -> Result<(), PeerError>;
}

/// Builds the peer connection once the first remote party shows up, using
/// the ICE servers of the call it serves. Every local track is attached
/// before the link is returned.
#[async_trait]
pub trait PeerFactory: Send + Sync {
    async fn create(
        &self,
        ice_servers: &[IceServerConfig],
        local: Option<&LocalMediaStream>,
        events: mpsc::Sender<PeerEvent>,
    ) -> Result<Box<dyn PeerLink>, PeerError>;
}
