use crate::error::PeerError;
use crate::media::{LocalMediaStream, MediaKind};
use crate::peer::{PeerEvent, PeerFactory, PeerLink, PeerLinkState, RemoteTrackInfo};
use async_trait::async_trait;
use consult_core::{IceCandidatePayload, IceServerConfig};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info};
use webrtc::api::APIBuilder;
use webrtc::api::interceptor_registry::register_default_interceptors;
use webrtc::api::media_engine::MediaEngine;
use webrtc::ice_transport::ice_candidate::{RTCIceCandidate, RTCIceCandidateInit};
use webrtc::ice_transport::ice_server::RTCIceServer;
use webrtc::interceptor::registry::Registry;
use webrtc::peer_connection::RTCPeerConnection;
use webrtc::peer_connection::configuration::RTCConfiguration;
use webrtc::peer_connection::peer_connection_state::RTCPeerConnectionState;
use webrtc::peer_connection::sdp::session_description::RTCSessionDescription;
use webrtc::rtp_transceiver::rtp_codec::RTPCodecType;
use webrtc::track::track_local::TrackLocal;
use webrtc::track::track_remote::TrackRemote;

/// Where remote media ends up once it arrives.
#[async_trait]
pub trait RemoteRenderer: Send + Sync {
    async fn render(&self, track: Arc<TrackRemote>);
}

/// Reads and discards RTP so the receive buffers keep draining.
#[derive(Debug, Default, Clone, Copy)]
pub struct DiscardRenderer;

#[async_trait]
impl RemoteRenderer for DiscardRenderer {
    async fn render(&self, track: Arc<TrackRemote>) {
        while track.read_rtp().await.is_ok() {}
        debug!("Remote track {} ended", track.id());
    }
}

/// webrtc-rs backed peer connections.
#[derive(Clone)]
pub struct RtcPeerFactory {
    renderer: Arc<dyn RemoteRenderer>,
}

impl Default for RtcPeerFactory {
    fn default() -> Self {
        Self::new()
    }
}

impl RtcPeerFactory {
    pub fn new() -> Self {
        Self {
            renderer: Arc::new(DiscardRenderer),
        }
    }

    pub fn with_renderer(mut self, renderer: Arc<dyn RemoteRenderer>) -> Self {
        self.renderer = renderer;
        self
    }
}

#[async_trait]
impl PeerFactory for RtcPeerFactory {
    async fn create(
        &self,
        ice_servers: &[IceServerConfig],
        local: Option<&LocalMediaStream>,
        events: mpsc::Sender<PeerEvent>,
    ) -> Result<Box<dyn PeerLink>, PeerError> {
        let peer = RtcPeer::new(ice_servers, local, events, self.renderer.clone()).await?;
        Ok(Box::new(peer))
    }
}

pub struct RtcPeer {
    peer_connection: Arc<RTCPeerConnection>,
}

impl RtcPeer {
    pub async fn new(
        ice_servers: &[IceServerConfig],
        local: Option<&LocalMediaStream>,
        events: mpsc::Sender<PeerEvent>,
        renderer: Arc<dyn RemoteRenderer>,
    ) -> Result<Self, PeerError> {
        let mut media_engine = MediaEngine::default();
        media_engine.register_default_codecs()?;

        let registry = register_default_interceptors(Registry::new(), &mut media_engine)?;

        let api = APIBuilder::new()
            .with_media_engine(media_engine)
            .with_interceptor_registry(registry)
            .build();

        let rtc_config = RTCConfiguration {
            ice_servers: ice_servers
                .iter()
                .map(|server| RTCIceServer {
                    urls: server.urls.clone(),
                    username: server.username.clone().unwrap_or_default(),
                    credential: server.credential.clone().unwrap_or_default(),
                    ..Default::default()
                })
                .collect(),
            ..Default::default()
        };

        let peer_connection = Arc::new(api.new_peer_connection(rtc_config).await?);

        if let Some(stream) = local {
            for track in stream.tracks() {
                let rtc_track: Arc<dyn TrackLocal + Send + Sync> = track.rtc_track();
                let rtp_sender = peer_connection.add_track(rtc_track).await?;

                // RTCP has to be read for interceptors like NACK to work.
                tokio::spawn(async move {
                    let mut rtcp_buf = vec![0u8; 1500];
                    while rtp_sender.read(&mut rtcp_buf).await.is_ok() {}
                });
                debug!("Attached local {} track", track.kind());
            }
        }

        let state_tx = events.clone();
        peer_connection.on_peer_connection_state_change(Box::new(
            move |s: RTCPeerConnectionState| {
                let tx = state_tx.clone();
                Box::pin(async move {
                    info!("Peer connection state changed: {}", s);
                    let state = match s {
                        RTCPeerConnectionState::Connecting => PeerLinkState::Connecting,
                        RTCPeerConnectionState::Connected => PeerLinkState::Connected,
                        RTCPeerConnectionState::Disconnected => PeerLinkState::Disconnected,
                        RTCPeerConnectionState::Failed => PeerLinkState::Failed,
                        RTCPeerConnectionState::Closed => PeerLinkState::Closed,
                        _ => PeerLinkState::New,
                    };
                    let _ = tx.send(PeerEvent::StateChanged(state)).await;
                })
            },
        ));

        let ice_tx = events.clone();
        peer_connection.on_ice_candidate(Box::new(move |c: Option<RTCIceCandidate>| {
            let tx = ice_tx.clone();
            Box::pin(async move {
                let Some(candidate) = c else { return };
                let Ok(init) = candidate.to_json() else {
                    return;
                };
                let payload = IceCandidatePayload {
                    candidate: init.candidate,
                    sdp_mid: init.sdp_mid,
                    sdp_m_line_index: init.sdp_mline_index,
                };
                let _ = tx.send(PeerEvent::LocalCandidate(payload)).await;
            })
        }));

        let track_tx = events;
        peer_connection.on_track(Box::new(move |track: Arc<TrackRemote>, _, _| {
            let tx = track_tx.clone();
            let renderer = renderer.clone();
            Box::pin(async move {
                let info = RemoteTrackInfo {
                    track_id: track.id(),
                    stream_id: track.stream_id(),
                    kind: match track.kind() {
                        RTPCodecType::Audio => MediaKind::Audio,
                        _ => MediaKind::Video,
                    },
                };
                info!("Remote {} track {} received", info.kind, info.track_id);
                let _ = tx.send(PeerEvent::RemoteTrack(info)).await;

                tokio::spawn(async move { renderer.render(track).await });
            })
        }));

        Ok(Self { peer_connection })
    }
}

#[async_trait]
impl PeerLink for RtcPeer {
    async fn create_offer(&self) -> Result<String, PeerError> {
        let offer = self.peer_connection.create_offer(None).await?;
        self.peer_connection
            .set_local_description(offer.clone())
            .await?;
        Ok(offer.sdp)
    }

    async fn accept_offer(&self, sdp: String) -> Result<String, PeerError> {
        let offer = RTCSessionDescription::offer(sdp)?;
        self.peer_connection.set_remote_description(offer).await?;

        let answer = self.peer_connection.create_answer(None).await?;
        self.peer_connection
            .set_local_description(answer.clone())
            .await?;
        Ok(answer.sdp)
    }

    async fn accept_answer(&self, sdp: String) -> Result<(), PeerError> {
        let answer = RTCSessionDescription::answer(sdp)?;
        self.peer_connection.set_remote_description(answer).await?;
        Ok(())
    }

    async fn add_ice_candidate(&self, candidate: IceCandidatePayload) -> Result<(), PeerError> {
        if candidate.candidate.trim().is_empty() {
            return Err(PeerError::Candidate("empty candidate line".into()));
        }
        let init = RTCIceCandidateInit {
            candidate: candidate.candidate,
            sdp_mid: candidate.sdp_mid,
            sdp_mline_index: candidate.sdp_m_line_index,
            ..Default::default()
        };
        self.peer_connection.add_ice_candidate(init).await?;
        Ok(())
    }

    async fn close(&self) -> Result<(), PeerError> {
        self.peer_connection.close().await?;
        Ok(())
    }
}
