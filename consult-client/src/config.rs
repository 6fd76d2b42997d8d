use crate::chat::EchoPolicy;
use crate::media::MediaConstraints;
use consult_core::{IceServerConfig, RoomKey, default_ice_servers};

/// Everything a call needs to know about itself. Collaborator endpoints
/// (relay URL, session API) live in the services handed to the session.
#[derive(Debug, Clone)]
pub struct CallConfig {
    /// Appointment the call belongs to; doubles as the relay room.
    pub room: RoomKey,
    /// Shown as `senderName` on outgoing chat.
    pub display_name: String,
    pub ice_servers: Vec<IceServerConfig>,
    pub echo: EchoPolicy,
    pub media: MediaConstraints,
}

impl CallConfig {
    pub fn new(room: RoomKey, display_name: impl Into<String>) -> Self {
        Self {
            room,
            display_name: display_name.into(),
            ice_servers: default_ice_servers(),
            echo: EchoPolicy::default(),
            media: MediaConstraints::default(),
        }
    }
}
