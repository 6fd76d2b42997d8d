use crate::error::CallError;
use std::fmt;

/// Lifecycle of one call, as the view shows it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CallState {
    /// Mounted, waiting for the other party.
    #[default]
    Idle,
    /// Offer/answer under way.
    Connecting,
    Connected,
    /// Torn down. Terminal.
    Closed,
}

impl CallState {
    pub fn can_transition(self, next: CallState) -> bool {
        matches!(
            (self, next),
            (CallState::Idle, CallState::Connecting)
                | (CallState::Connecting, CallState::Connected)
                | (CallState::Idle | CallState::Connecting | CallState::Connected, CallState::Closed)
        )
    }

    pub fn transition(&mut self, next: CallState) -> Result<(), CallError> {
        if !self.can_transition(next) {
            return Err(CallError::InvalidTransition {
                from: *self,
                to: next,
            });
        }
        *self = next;
        Ok(())
    }

    pub fn is_closed(self) -> bool {
        self == CallState::Closed
    }
}

impl fmt::Display for CallState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CallState::Idle => "idle",
            CallState::Connecting => "connecting",
            CallState::Connected => "connected",
            CallState::Closed => "closed",
        };
        f.write_str(name)
    }
}

/// Which side of the offer/answer exchange this participant ended up on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// Was already in the room; sends the offer.
    Caller,
    /// Joined second; answers.
    Callee,
}
