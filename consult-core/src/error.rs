use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CoreError {
    #[error("room key must not be empty")]
    EmptyRoomKey,

    #[error("invalid peer id '{0}'")]
    InvalidPeerId(String),
}
