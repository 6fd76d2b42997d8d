//! Client side of a 1:1 video consultation.
//!
//! A [`CallSession`] task owns the local media stream, the peer connection
//! and the signaling channel for one call. The front-end talks to it through
//! a [`CallHandle`] and watches [`CallSnapshot`]s.

mod call;
mod chat;
mod config;
mod error;
pub mod media;
pub mod peer;
pub mod session_api;
pub mod signaling;

pub use call::{CallHandle, CallServices, CallSession, CallSnapshot, CallState, Role};
pub use chat::{ChatLog, EchoPolicy};
pub use config::CallConfig;
pub use error::{CallError, MediaError, PeerError, SessionApiError, SignalingError};
