use crate::model::chat::ChatMessage;
use crate::model::peer::PeerId;
use crate::model::room::RoomKey;
use crate::utils::{DEFAULT_STUN_ADDR, DEFAULT_STUN_ADDR_2, DEFAULT_STUN_ADDR_3};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IceServerConfig {
    pub urls: Vec<String>,
    pub username: Option<String>,
    pub credential: Option<String>,
}

impl IceServerConfig {
    pub fn stun(url: impl Into<String>) -> Self {
        Self {
            urls: vec![url.into()],
            username: None,
            credential: None,
        }
    }
}

/// The fixed public STUN set. No TURN relay is configured.
pub fn default_ice_servers() -> Vec<IceServerConfig> {
    vec![
        IceServerConfig::stun(DEFAULT_STUN_ADDR),
        IceServerConfig::stun(DEFAULT_STUN_ADDR_2),
        IceServerConfig::stun(DEFAULT_STUN_ADDR_3),
    ]
}

/// Same shape as the browser's `RTCIceCandidateInit`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IceCandidatePayload {
    pub candidate: String,
    #[serde(default)]
    pub sdp_mid: Option<String>,
    #[serde(default)]
    pub sdp_m_line_index: Option<u16>,
}

/// Every event exchanged with the relay.
///
/// Encoded as `{"event": "offer", "data": {...}}`. Client-originated events
/// carry the room they are scoped to; relay-originated ones do not.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(
    tag = "event",
    content = "data",
    rename_all = "kebab-case",
    rename_all_fields = "camelCase"
)]
pub enum SignalMessage {
    JoinRoom {
        room: RoomKey,
    },
    UserConnected {
        peer_id: PeerId,
    },
    Offer {
        room: RoomKey,
        sdp: String,
    },
    Answer {
        room: RoomKey,
        sdp: String,
    },
    IceCandidate {
        room: RoomKey,
        candidate: IceCandidatePayload,
    },
    SendMessage {
        room: RoomKey,
        message: ChatMessage,
    },
    ReceiveMessage {
        message: ChatMessage,
    },
}

impl SignalMessage {
    pub fn room(&self) -> Option<&RoomKey> {
        match self {
            Self::JoinRoom { room }
            | Self::Offer { room, .. }
            | Self::Answer { room, .. }
            | Self::IceCandidate { room, .. }
            | Self::SendMessage { room, .. } => Some(room),
            Self::UserConnected { .. } | Self::ReceiveMessage { .. } => None,
        }
    }

    /// Short event name, as it appears on the wire.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::JoinRoom { .. } => "join-room",
            Self::UserConnected { .. } => "user-connected",
            Self::Offer { .. } => "offer",
            Self::Answer { .. } => "answer",
            Self::IceCandidate { .. } => "ice-candidate",
            Self::SendMessage { .. } => "send-message",
            Self::ReceiveMessage { .. } => "receive-message",
        }
    }
}
