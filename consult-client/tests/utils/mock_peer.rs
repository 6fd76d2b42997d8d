use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;

use consult_client::PeerError;
use consult_client::media::{LocalMediaStream, MediaKind};
use consult_client::peer::{
    PeerEvent, PeerFactory, PeerLink, PeerLinkState, RemoteTrackInfo,
};
use consult_core::{IceCandidatePayload, IceServerConfig};

pub const MOCK_OFFER: &str = "v=0\r\no=- mock-offer\r\n";
pub const MOCK_ANSWER: &str = "v=0\r\no=- mock-answer\r\n";

/// What the call asked of its peer connection.
#[derive(Debug, Default)]
pub struct PeerLog {
    pub created: AtomicUsize,
    pub attached_tracks: AtomicUsize,
    pub offers: AtomicUsize,
    pub offers_accepted: AtomicUsize,
    pub answers_accepted: AtomicUsize,
    pub closed: AtomicUsize,
    pub candidates: Mutex<Vec<IceCandidatePayload>>,
    pub ice_servers: Mutex<Vec<IceServerConfig>>,
}

impl PeerLog {
    pub fn count(counter: &AtomicUsize) -> usize {
        counter.load(Ordering::SeqCst)
    }

    pub fn candidates(&self) -> Vec<IceCandidatePayload> {
        self.candidates.lock().unwrap().clone()
    }

    /// The ICE servers the last peer connection was built with.
    pub fn ice_servers(&self) -> Vec<IceServerConfig> {
        self.ice_servers.lock().unwrap().clone()
    }
}

pub fn host_candidate(tag: &str) -> IceCandidatePayload {
    IceCandidatePayload {
        candidate: format!("candidate:{} 1 udp 2122260223 10.0.0.2 54321 typ host", tag),
        sdp_mid: Some("0".into()),
        sdp_m_line_index: Some(0),
    }
}

/// Peer connections that "connect" as soon as a description is applied.
#[derive(Clone, Default)]
pub struct MockPeerFactory {
    pub log: Arc<PeerLog>,
}

#[async_trait]
impl PeerFactory for MockPeerFactory {
    async fn create(
        &self,
        ice_servers: &[IceServerConfig],
        local: Option<&LocalMediaStream>,
        events: mpsc::Sender<PeerEvent>,
    ) -> Result<Box<dyn PeerLink>, PeerError> {
        self.log.created.fetch_add(1, Ordering::SeqCst);
        *self.log.ice_servers.lock().unwrap() = ice_servers.to_vec();
        self.log.attached_tracks.fetch_add(
            local.map(|s| s.tracks().count()).unwrap_or(0),
            Ordering::SeqCst,
        );

        let _ = events
            .send(PeerEvent::LocalCandidate(host_candidate("local")))
            .await;

        Ok(Box::new(MockPeer {
            log: self.log.clone(),
            events,
        }))
    }
}

pub struct MockPeer {
    log: Arc<PeerLog>,
    events: mpsc::Sender<PeerEvent>,
}

impl MockPeer {
    async fn come_up(&self) {
        let _ = self
            .events
            .send(PeerEvent::StateChanged(PeerLinkState::Connected))
            .await;
        let _ = self
            .events
            .send(PeerEvent::RemoteTrack(RemoteTrackInfo {
                track_id: "remote-video".into(),
                stream_id: "remote".into(),
                kind: MediaKind::Video,
            }))
            .await;
    }
}

#[async_trait]
impl PeerLink for MockPeer {
    async fn create_offer(&self) -> Result<String, PeerError> {
        self.log.offers.fetch_add(1, Ordering::SeqCst);
        Ok(MOCK_OFFER.into())
    }

    async fn accept_offer(&self, sdp: String) -> Result<String, PeerError> {
        if sdp.is_empty() {
            return Err(PeerError::Negotiation("empty offer".into()));
        }
        self.log.offers_accepted.fetch_add(1, Ordering::SeqCst);
        self.come_up().await;
        Ok(MOCK_ANSWER.into())
    }

    async fn accept_answer(&self, _sdp: String) -> Result<(), PeerError> {
        self.log.answers_accepted.fetch_add(1, Ordering::SeqCst);
        self.come_up().await;
        Ok(())
    }

    async fn add_ice_candidate(&self, candidate: IceCandidatePayload) -> Result<(), PeerError> {
        if candidate.candidate.contains("bogus") {
            return Err(PeerError::Candidate(candidate.candidate));
        }
        self.log.candidates.lock().unwrap().push(candidate);
        Ok(())
    }

    async fn close(&self) -> Result<(), PeerError> {
        self.log.closed.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
