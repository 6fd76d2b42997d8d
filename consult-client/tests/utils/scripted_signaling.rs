use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc;

use consult_client::SignalingError;
use consult_client::signaling::{SignalingChannel, SignalingConnector, SignalingTransport};
use consult_core::SignalMessage;

use super::call_helpers::WAIT;

#[derive(Default)]
struct ScriptState {
    emitted: Mutex<Vec<SignalMessage>>,
    inject: Mutex<Option<mpsc::Sender<SignalMessage>>>,
    connected: AtomicBool,
    disconnects: AtomicUsize,
    refuse: bool,
    hang: bool,
}

/// A relay the test plays by hand: records what the call emits and lets the
/// test push relay events in.
#[derive(Clone, Default)]
pub struct ScriptedSignaling {
    state: Arc<ScriptState>,
}

impl ScriptedSignaling {
    pub fn new() -> Self {
        Self::default()
    }

    /// A relay that is never reachable.
    pub fn refusing() -> Self {
        Self {
            state: Arc::new(ScriptState {
                refuse: true,
                ..Default::default()
            }),
        }
    }

    /// A relay whose handshake never completes.
    pub fn hanging() -> Self {
        Self {
            state: Arc::new(ScriptState {
                hang: true,
                ..Default::default()
            }),
        }
    }

    /// Deliver an event as if the relay sent it. Waits for the call to connect.
    pub async fn inject(&self, signal: SignalMessage) {
        let deadline = tokio::time::Instant::now() + WAIT;
        loop {
            let tx = self.state.inject.lock().unwrap().clone();
            if let Some(tx) = tx {
                tx.send(signal).await.expect("call stopped reading");
                return;
            }
            assert!(
                tokio::time::Instant::now() < deadline,
                "call never connected to the scripted relay"
            );
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    }

    pub fn emitted(&self) -> Vec<SignalMessage> {
        self.state.emitted.lock().unwrap().clone()
    }

    pub fn emitted_kinds(&self) -> Vec<&'static str> {
        self.emitted().iter().map(|s| s.kind()).collect()
    }

    pub fn count(&self, kind: &str) -> usize {
        self.emitted_kinds().iter().filter(|k| **k == kind).count()
    }

    /// Poll until `kind` has been emitted `n` times.
    pub async fn wait_for_emitted(&self, kind: &str, n: usize) {
        let deadline = tokio::time::Instant::now() + WAIT;
        while self.count(kind) < n {
            assert!(
                tokio::time::Instant::now() < deadline,
                "expected {} '{}' events, saw {:?}",
                n,
                kind,
                self.emitted_kinds()
            );
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    }

    pub fn disconnects(&self) -> usize {
        self.state.disconnects.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SignalingConnector for ScriptedSignaling {
    async fn connect(&self) -> Result<SignalingChannel, SignalingError> {
        if self.state.refuse {
            return Err(SignalingError::Refused("scripted relay is down".into()));
        }
        if self.state.hang {
            std::future::pending::<()>().await;
        }
        let (tx, rx) = mpsc::channel(64);
        *self.state.inject.lock().unwrap() = Some(tx);
        self.state.connected.store(true, Ordering::SeqCst);

        Ok(SignalingChannel {
            transport: Arc::new(self.clone()),
            inbound: rx,
        })
    }
}

#[async_trait]
impl SignalingTransport for ScriptedSignaling {
    async fn emit(&self, signal: SignalMessage) -> Result<(), SignalingError> {
        if !self.is_connected() {
            return Err(SignalingError::Closed);
        }
        self.state.emitted.lock().unwrap().push(signal);
        Ok(())
    }

    async fn disconnect(&self) {
        self.state.disconnects.fetch_add(1, Ordering::SeqCst);
        self.state.connected.store(false, Ordering::SeqCst);
        self.state.inject.lock().unwrap().take();
    }

    fn is_connected(&self) -> bool {
        self.state.connected.load(Ordering::SeqCst)
    }
}
