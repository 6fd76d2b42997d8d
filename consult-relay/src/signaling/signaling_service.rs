use crate::config::RelayConfig;
use crate::room::{RoomCommand, RoomManager};
use crate::signaling::SignalingOutput;
use async_trait::async_trait;
use axum::extract::ws::Message;
use consult_core::{PeerId, RoomKey, SignalMessage};
use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{error, info, warn};

/// Outbound queues of every open socket.
#[derive(Default)]
pub struct PeerSockets {
    peers: DashMap<PeerId, mpsc::UnboundedSender<Message>>,
}

#[async_trait]
impl SignalingOutput for PeerSockets {
    async fn send_signal(&self, peer_id: PeerId, signal: SignalMessage) {
        let Some(peer) = self.peers.get(&peer_id) else {
            warn!(
                "Attempted to send '{}' to disconnected peer {}",
                signal.kind(),
                peer_id
            );
            return;
        };

        match serde_json::to_string(&signal) {
            Ok(json) => {
                if let Err(e) = peer.send(Message::Text(json.into())) {
                    error!("Failed to send WS message to {}: {}", peer_id, e);
                }
            }
            Err(e) => error!("Failed to serialize signal message: {}", e),
        }
    }
}

#[derive(Clone)]
pub struct SignalingService {
    sockets: Arc<PeerSockets>,
    memberships: Arc<DashMap<PeerId, RoomKey>>,
    rooms: RoomManager,
}

impl SignalingService {
    pub fn new(config: &RelayConfig) -> Self {
        let sockets = Arc::new(PeerSockets::default());
        let rooms = RoomManager::new(sockets.clone(), config.broadcast);

        Self {
            sockets,
            memberships: Arc::new(DashMap::new()),
            rooms,
        }
    }

    pub fn rooms(&self) -> &RoomManager {
        &self.rooms
    }

    pub fn add_peer(&self, peer_id: PeerId, tx: mpsc::UnboundedSender<Message>) {
        self.sockets.peers.insert(peer_id, tx);
    }

    /// Put the peer in `room`, leaving whatever room it was in before.
    pub async fn join(&self, peer_id: PeerId, room: RoomKey) {
        if let Some(previous) = self.memberships.insert(peer_id, room.clone()) {
            if previous == room {
                return;
            }
            info!("Peer {} switches from '{}' to '{}'", peer_id, previous, room);
            self.rooms.leave(&previous, peer_id).await;
        }
        self.rooms.join(&room, peer_id).await;
    }

    /// Hand a room-scoped event to the sender's room.
    pub async fn relay(&self, peer_id: PeerId, signal: SignalMessage) {
        let Some(joined) = self.memberships.get(&peer_id).map(|room| room.clone()) else {
            warn!(
                "Peer {} sent '{}' before joining a room",
                peer_id,
                signal.kind()
            );
            return;
        };

        if signal.room() != Some(&joined) {
            warn!(
                "Peer {} sent '{}' for {:?} but is in '{}'",
                peer_id,
                signal.kind(),
                signal.room().map(RoomKey::as_str),
                joined
            );
            return;
        }

        self.rooms
            .dispatch(&joined, RoomCommand::Signal { peer_id, signal })
            .await;
    }

    /// Socket closed: forget it and leave its room.
    pub async fn disconnect(&self, peer_id: PeerId) {
        self.sockets.peers.remove(&peer_id);
        if let Some((_, room)) = self.memberships.remove(&peer_id) {
            self.rooms.leave(&room, peer_id).await;
        }
    }
}
