mod chat;
mod peer;
mod room;
mod signaling;

pub use chat::ChatMessage;
pub use peer::PeerId;
pub use room::RoomKey;
pub use signaling::{IceCandidatePayload, IceServerConfig, SignalMessage, default_ice_servers};
