use serde::{Deserialize, Serialize};
use std::net::SocketAddr;

/// Whether a `send-message` is echoed back to the peer that sent it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BroadcastPolicy {
    #[default]
    IncludeSender,
    ExcludeSender,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelayConfig {
    pub bind_addr: SocketAddr,
    pub broadcast: BroadcastPolicy,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 5000)),
            broadcast: BroadcastPolicy::default(),
        }
    }
}
