use crate::config::BroadcastPolicy;
use crate::room::room_command::RoomCommand;
use crate::signaling::SignalingOutput;
use consult_core::{PeerId, RoomKey, SignalMessage};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// One relay room. Owns its member list and fans events out through the
/// signaling output; every mutation happens on this task.
pub struct Room {
    key: RoomKey,
    members: Vec<PeerId>,
    command_rx: mpsc::Receiver<RoomCommand>,
    signaling: Arc<dyn SignalingOutput>,
    broadcast: BroadcastPolicy,
}

impl Room {
    pub fn new(
        key: RoomKey,
        command_rx: mpsc::Receiver<RoomCommand>,
        signaling: Arc<dyn SignalingOutput>,
        broadcast: BroadcastPolicy,
    ) -> Self {
        Self {
            key,
            members: Vec::new(),
            command_rx,
            signaling,
            broadcast,
        }
    }

    pub async fn run(mut self) {
        info!("Room '{}' event loop started", self.key);

        while let Some(cmd) = self.command_rx.recv().await {
            self.handle_command(cmd).await;
        }

        info!("Room '{}' event loop finished", self.key);
    }

    async fn handle_command(&mut self, cmd: RoomCommand) {
        match cmd {
            RoomCommand::Join { peer_id } => {
                if self.members.contains(&peer_id) {
                    debug!("Peer {} already in room '{}'", peer_id, self.key);
                    return;
                }

                info!("Peer {} joined room '{}'", peer_id, self.key);
                self.members.push(peer_id);

                if self.members.len() > 2 {
                    warn!(
                        "Room '{}' now has {} members; calls are strictly 1:1",
                        self.key,
                        self.members.len()
                    );
                }

                self.send_to_others(peer_id, SignalMessage::UserConnected { peer_id })
                    .await;
            }

            RoomCommand::Signal { peer_id, signal } => {
                if !self.members.contains(&peer_id) {
                    warn!(
                        "Dropping '{}' from {}: not a member of room '{}'",
                        signal.kind(),
                        peer_id,
                        self.key
                    );
                    return;
                }
                self.handle_signal(peer_id, signal).await;
            }

            RoomCommand::Leave { peer_id } => {
                self.members.retain(|id| *id != peer_id);
                info!(
                    "Peer {} left room '{}' ({} remaining)",
                    peer_id,
                    self.key,
                    self.members.len()
                );
            }
        }
    }

    async fn handle_signal(&mut self, from: PeerId, signal: SignalMessage) {
        match signal {
            SignalMessage::Offer { .. }
            | SignalMessage::Answer { .. }
            | SignalMessage::IceCandidate { .. } => {
                debug!("Relaying '{}' from {} in '{}'", signal.kind(), from, self.key);
                self.send_to_others(from, signal).await;
            }

            SignalMessage::SendMessage { message, .. } => {
                let echo = SignalMessage::ReceiveMessage { message };
                match self.broadcast {
                    BroadcastPolicy::IncludeSender => self.send_to_all(echo).await,
                    BroadcastPolicy::ExcludeSender => self.send_to_others(from, echo).await,
                }
            }

            SignalMessage::JoinRoom { .. }
            | SignalMessage::UserConnected { .. }
            | SignalMessage::ReceiveMessage { .. } => {
                warn!(
                    "Unexpected '{}' from {} in room '{}'",
                    signal.kind(),
                    from,
                    self.key
                );
            }
        }
    }

    async fn send_to_others(&self, from: PeerId, signal: SignalMessage) {
        for peer_id in self.members.iter().filter(|id| **id != from) {
            self.signaling.send_signal(*peer_id, signal.clone()).await;
        }
    }

    async fn send_to_all(&self, signal: SignalMessage) {
        for peer_id in &self.members {
            self.signaling.send_signal(*peer_id, signal.clone()).await;
        }
    }
}
