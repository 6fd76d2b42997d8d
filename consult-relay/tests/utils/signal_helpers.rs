use anyhow::{Context, Result};
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::mpsc;

use consult_relay::RelayConfig;

use super::mock_signaling::Delivery;

/// Timeout for a single expected delivery (ms).
pub const SIGNAL_TIMEOUT_MS: u64 = 2000;

/// How long to wait before concluding nothing else is coming (ms).
pub const QUIET_PERIOD_MS: u64 = 200;

/// Wait for the next delivery from a room.
pub async fn next_delivery(rx: &mut mpsc::UnboundedReceiver<Delivery>) -> Result<Delivery> {
    tokio::time::timeout(Duration::from_millis(SIGNAL_TIMEOUT_MS), rx.recv())
        .await
        .context("Timeout waiting for delivery")?
        .context("Delivery channel closed")
}

/// Assert the room stays quiet for a short while.
pub async fn expect_no_delivery(rx: &mut mpsc::UnboundedReceiver<Delivery>) {
    let res = tokio::time::timeout(Duration::from_millis(QUIET_PERIOD_MS), rx.recv()).await;
    assert!(res.is_err(), "unexpected delivery: {:?}", res);
}

/// Start a relay on an ephemeral port and return its WebSocket URL.
pub async fn spawn_relay(config: RelayConfig) -> Result<String> {
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;

    tokio::spawn(async move {
        if let Err(e) = consult_relay::serve_on(listener, config).await {
            tracing::error!("[SignalHelper] relay stopped: {}", e);
        }
    });

    Ok(format!("ws://{}/ws", addr))
}
