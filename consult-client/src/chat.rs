use consult_core::ChatMessage;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use uuid::Uuid;

/// What the relay does with a `send-message` from us.
///
/// The relay contract is ambiguous here, so the call has to be told.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EchoPolicy {
    /// The relay echoes our own messages back; append only on echo.
    #[default]
    RelayIncludesSender,
    /// The relay never echoes; append locally once sent.
    RelayExcludesSender,
}

/// In-memory message log for one call. A message id is appended at most
/// once, however many times it is delivered.
#[derive(Debug, Default, Clone)]
pub struct ChatLog {
    messages: Vec<ChatMessage>,
    seen: HashSet<Uuid>,
}

impl ChatLog {
    /// Returns `false` if the message was already in the log.
    pub fn push(&mut self, message: ChatMessage) -> bool {
        if !self.seen.insert(message.id) {
            return false;
        }
        self.messages.push(message);
        true
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}
