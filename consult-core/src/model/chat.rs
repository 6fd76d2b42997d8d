use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// In-call text message. Lives only as long as the call; nothing here
/// persists it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    /// Minted by the sender; repeated deliveries carry the same id.
    pub id: Uuid,
    pub sender_name: String,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

impl ChatMessage {
    pub fn new(sender_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            sender_name: sender_name.into(),
            message: message.into(),
            timestamp: Utc::now(),
        }
    }
}
