use consult_core::{PeerId, SignalMessage};

/// Commands fed into a room by the signaling layer.
#[derive(Debug)]
pub enum RoomCommand {
    /// A socket asked to join the room.
    Join { peer_id: PeerId },

    /// A room-scoped event from a member, to be fanned out.
    Signal {
        peer_id: PeerId,
        signal: SignalMessage,
    },

    /// The socket left the room or disconnected.
    Leave { peer_id: PeerId },
}
