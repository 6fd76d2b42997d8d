use crate::config::BroadcastPolicy;
use crate::room::{Room, RoomCommand};
use crate::signaling::SignalingOutput;
use consult_core::{PeerId, RoomKey};
use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{error, info};

struct RoomEntry {
    tx: mpsc::Sender<RoomCommand>,
    members: usize,
}

/// Creates rooms on first join and forgets them once the last member
/// leaves. Membership counts are adjusted under the map's entry lock so a
/// join racing the last leave never lands in a discarded room.
#[derive(Clone)]
pub struct RoomManager {
    rooms: Arc<DashMap<RoomKey, RoomEntry>>,
    signaling: Arc<dyn SignalingOutput>,
    broadcast: BroadcastPolicy,
}

impl RoomManager {
    pub fn new(signaling: Arc<dyn SignalingOutput>, broadcast: BroadcastPolicy) -> Self {
        Self {
            rooms: Arc::new(DashMap::new()),
            signaling,
            broadcast,
        }
    }

    pub async fn join(&self, key: &RoomKey, peer_id: PeerId) {
        let tx = {
            let mut entry = self
                .rooms
                .entry(key.clone())
                .or_insert_with(|| self.spawn_room(key));
            entry.members += 1;
            entry.tx.clone()
        };

        if let Err(e) = tx.send(RoomCommand::Join { peer_id }).await {
            error!("Room '{}' died before {} could join: {}", key, peer_id, e);
        }
    }

    pub async fn dispatch(&self, key: &RoomKey, cmd: RoomCommand) {
        let Some(tx) = self.rooms.get(key).map(|entry| entry.tx.clone()) else {
            error!("No room '{}' for {:?}", key, cmd);
            return;
        };
        if let Err(e) = tx.send(cmd).await {
            error!("Room '{}' died: {}", key, e);
        }
    }

    pub async fn leave(&self, key: &RoomKey, peer_id: PeerId) {
        self.dispatch(key, RoomCommand::Leave { peer_id }).await;

        if let Some(mut entry) = self.rooms.get_mut(key) {
            entry.members = entry.members.saturating_sub(1);
        }
        if self.rooms.remove_if(key, |_, entry| entry.members == 0).is_some() {
            info!("Room '{}' is empty, releasing it", key);
        }
    }

    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }

    fn spawn_room(&self, key: &RoomKey) -> RoomEntry {
        info!("Creating new room: {}", key);
        let (tx, rx) = mpsc::channel(100);

        let room = Room::new(key.clone(), rx, self.signaling.clone(), self.broadcast);
        tokio::spawn(room.run());

        RoomEntry { tx, members: 0 }
    }
}
