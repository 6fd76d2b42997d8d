use async_trait::async_trait;
use consult_core::{PeerId, SignalMessage};

/// Implemented by whatever holds the peers' sockets, so a room can push
/// events to a member without knowing the transport.
#[async_trait]
pub trait SignalingOutput: Send + Sync {
    /// Deliver one event to one connected peer.
    async fn send_signal(&self, peer_id: PeerId, signal: SignalMessage);
}
