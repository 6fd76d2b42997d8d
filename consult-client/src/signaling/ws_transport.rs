use crate::error::SignalingError;
use crate::signaling::{SignalingChannel, SignalingConnector, SignalingTransport};
use async_trait::async_trait;
use consult_core::SignalMessage;
use futures::{SinkExt, StreamExt};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::mpsc;
use tokio::task::AbortHandle;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, info, warn};

const INBOUND_CAPACITY: usize = 256;

/// Connects to the relay's WebSocket endpoint.
#[derive(Debug, Clone)]
pub struct WsConnector {
    url: String,
}

impl WsConnector {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }
}

#[async_trait]
impl SignalingConnector for WsConnector {
    async fn connect(&self) -> Result<SignalingChannel, SignalingError> {
        let (socket, _) = connect_async(self.url.as_str()).await?;
        info!("Connected to relay at {}", self.url);

        let (mut sink, mut stream) = socket.split();
        let (out_tx, mut out_rx) = mpsc::unbounded_channel::<Message>();
        let (in_tx, in_rx) = mpsc::channel(INBOUND_CAPACITY);
        let connected = Arc::new(AtomicBool::new(true));

        tokio::spawn(async move {
            while let Some(msg) = out_rx.recv().await {
                let closing = matches!(msg, Message::Close(_));
                if sink.send(msg).await.is_err() || closing {
                    break;
                }
            }
        });

        let recv_task = tokio::spawn({
            let connected = connected.clone();
            async move {
                while let Some(frame) = stream.next().await {
                    let text = match frame {
                        Ok(Message::Text(text)) => text,
                        Ok(Message::Close(_)) => break,
                        Ok(_) => continue,
                        Err(e) => {
                            warn!("Relay socket error: {}", e);
                            break;
                        }
                    };

                    match serde_json::from_str::<SignalMessage>(text.as_str()) {
                        Ok(signal) => {
                            debug!("WS IN: {}", signal.kind());
                            if in_tx.send(signal).await.is_err() {
                                break;
                            }
                        }
                        Err(e) => warn!("Skipping malformed relay event: {}", e),
                    }
                }
                connected.store(false, Ordering::SeqCst);
                info!("Relay connection closed");
            }
        });

        let transport = WsTransport {
            outbound: out_tx,
            connected,
            recv_task: recv_task.abort_handle(),
        };

        Ok(SignalingChannel {
            transport: Arc::new(transport),
            inbound: in_rx,
        })
    }
}

pub struct WsTransport {
    outbound: mpsc::UnboundedSender<Message>,
    connected: Arc<AtomicBool>,
    recv_task: AbortHandle,
}

#[async_trait]
impl SignalingTransport for WsTransport {
    async fn emit(&self, signal: SignalMessage) -> Result<(), SignalingError> {
        if !self.is_connected() {
            return Err(SignalingError::Closed);
        }
        let json = serde_json::to_string(&signal)?;
        debug!("WS OUT: {}", signal.kind());
        self.outbound
            .send(Message::Text(json.into()))
            .map_err(|_| SignalingError::Closed)
    }

    async fn disconnect(&self) {
        if !self.connected.swap(false, Ordering::SeqCst) {
            return;
        }
        let _ = self.outbound.send(Message::Close(None));
        self.recv_task.abort();
        info!("Disconnected from relay");
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }
}
