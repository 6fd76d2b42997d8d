use anyhow::{Context, Result};
use futures::{SinkExt, StreamExt};
use std::time::Duration;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};

use consult_core::SignalMessage;

use super::signal_helpers::{QUIET_PERIOD_MS, SIGNAL_TIMEOUT_MS};

/// Raw WebSocket peer speaking the relay protocol.
pub struct TestClient {
    ws: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

impl TestClient {
    pub async fn connect(url: &str) -> Result<Self> {
        let (ws, _) = connect_async(url)
            .await
            .context("Failed to connect to relay")?;
        Ok(Self { ws })
    }

    pub async fn send(&mut self, signal: &SignalMessage) -> Result<()> {
        let json = serde_json::to_string(signal)?;
        self.send_raw(&json).await
    }

    pub async fn send_raw(&mut self, text: &str) -> Result<()> {
        self.ws
            .send(Message::Text(text.to_owned().into()))
            .await
            .context("Failed to send frame")
    }

    /// Next relay event, skipping control frames.
    pub async fn recv(&mut self) -> Result<SignalMessage> {
        let timeout = Duration::from_millis(SIGNAL_TIMEOUT_MS);
        loop {
            let frame = tokio::time::timeout(timeout, self.ws.next())
                .await
                .context("Timeout waiting for relay event")?
                .context("Relay closed the socket")??;

            if let Message::Text(text) = frame {
                return serde_json::from_str(text.as_str()).context("Undecodable relay event");
            }
        }
    }

    /// Assert nothing arrives for a short while.
    pub async fn expect_silence(&mut self) {
        let res =
            tokio::time::timeout(Duration::from_millis(QUIET_PERIOD_MS), self.ws.next()).await;
        assert!(res.is_err(), "unexpected frame: {:?}", res);
    }

    pub async fn close(mut self) -> Result<()> {
        self.ws.close(None).await.context("Failed to close socket")
    }
}
