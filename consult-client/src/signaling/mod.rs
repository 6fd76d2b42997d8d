mod ws_transport;

pub use ws_transport::*;

use crate::error::SignalingError;
use async_trait::async_trait;
use consult_core::SignalMessage;
use std::sync::Arc;
use tokio::sync::mpsc;

/// Outbound half of the relay connection.
#[async_trait]
pub trait SignalingTransport: Send + Sync {
    async fn emit(&self, signal: SignalMessage) -> Result<(), SignalingError>;

    /// Close the channel. Safe to call more than once.
    async fn disconnect(&self);

    fn is_connected(&self) -> bool;
}

/// A live relay connection: where to send, and what arrives.
pub struct SignalingChannel {
    pub transport: Arc<dyn SignalingTransport>,
    pub inbound: mpsc::Receiver<SignalMessage>,
}

/// Opens the relay connection. Called once per call, after media
/// acquisition has settled.
#[async_trait]
pub trait SignalingConnector: Send + Sync {
    async fn connect(&self) -> Result<SignalingChannel, SignalingError>;
}
