use crate::call::state::{CallState, Role};
use crate::error::CallError;
use crate::media::LocalMediaStream;
use crate::peer::RemoteTrackInfo;
use consult_core::ChatMessage;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot, watch};

#[derive(Debug)]
pub(crate) enum CallCommand {
    ToggleMicrophone,
    ToggleCamera,
    SendChat(String),
    EndCall { done: oneshot::Sender<()> },
}

/// What the call view renders.
#[derive(Debug, Clone, Default)]
pub struct CallSnapshot {
    pub state: CallState,
    pub role: Option<Role>,
    /// Bound to the self-preview while present.
    pub local_media: Option<LocalMediaStream>,
    pub signaling_connected: bool,
    pub microphone_enabled: bool,
    pub camera_enabled: bool,
    pub remote_tracks: Vec<RemoteTrackInfo>,
    pub messages: Vec<ChatMessage>,
}

impl CallSnapshot {
    pub fn local_preview(&self) -> bool {
        self.local_media.is_some()
    }

    pub fn remote_video_bound(&self) -> bool {
        !self.remote_tracks.is_empty()
    }
}

/// Controls for a running call. Dropping every clone unmounts the call
/// without recording a session end.
#[derive(Debug, Clone)]
pub struct CallHandle {
    commands: mpsc::Sender<CallCommand>,
    snapshots: watch::Receiver<CallSnapshot>,
}

impl CallHandle {
    pub(crate) fn new(
        commands: mpsc::Sender<CallCommand>,
        snapshots: watch::Receiver<CallSnapshot>,
    ) -> Self {
        Self {
            commands,
            snapshots,
        }
    }

    pub fn snapshot(&self) -> CallSnapshot {
        self.snapshots.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<CallSnapshot> {
        self.snapshots.clone()
    }

    pub async fn toggle_microphone(&self) -> Result<(), CallError> {
        self.send(CallCommand::ToggleMicrophone).await
    }

    pub async fn toggle_camera(&self) -> Result<(), CallError> {
        self.send(CallCommand::ToggleCamera).await
    }

    pub async fn send_chat(&self, text: impl Into<String>) -> Result<(), CallError> {
        self.send(CallCommand::SendChat(text.into())).await
    }

    /// Records the session end, releases peer, media and relay, and waits
    /// until that is done. Ending an ended call is a no-op.
    pub async fn end_call(&self) -> Result<(), CallError> {
        let (done_tx, done_rx) = oneshot::channel();
        if self
            .commands
            .send(CallCommand::EndCall { done: done_tx })
            .await
            .is_err()
        {
            return Ok(());
        }
        let _ = done_rx.await;
        Ok(())
    }

    /// Waits until a snapshot satisfies `predicate`.
    pub async fn wait_for(
        &self,
        timeout: Duration,
        predicate: impl FnMut(&CallSnapshot) -> bool,
    ) -> Result<CallSnapshot, CallError> {
        let mut rx = self.snapshots.clone();
        let waited = tokio::time::timeout(timeout, rx.wait_for(predicate)).await;
        match waited {
            Ok(Ok(snapshot)) => Ok(snapshot.clone()),
            Ok(Err(_)) => Err(CallError::Ended),
            Err(_) => Err(CallError::Timeout),
        }
    }

    async fn send(&self, cmd: CallCommand) -> Result<(), CallError> {
        self.commands.send(cmd).await.map_err(|_| CallError::Ended)
    }
}
