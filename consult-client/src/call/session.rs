use crate::call::handle::{CallCommand, CallHandle, CallSnapshot};
use crate::call::state::{CallState, Role};
use crate::chat::{ChatLog, EchoPolicy};
use crate::config::CallConfig;
use crate::media::{LocalMediaStream, MediaDevices, MediaKind};
use crate::peer::{PeerEvent, PeerFactory, PeerLink, PeerLinkState, RemoteTrackInfo};
use crate::session_api::SessionRegistry;
use crate::signaling::{SignalingConnector, SignalingTransport};
use consult_core::{ChatMessage, IceCandidatePayload, SignalMessage};
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

const COMMAND_CAPACITY: usize = 32;
const PEER_EVENT_CAPACITY: usize = 256;

/// The collaborators a call is wired to.
#[derive(Clone)]
pub struct CallServices {
    pub devices: Arc<dyn MediaDevices>,
    pub signaling: Arc<dyn SignalingConnector>,
    pub peers: Arc<dyn PeerFactory>,
    pub sessions: Arc<dyn SessionRegistry>,
}

/// Why a mount was cut short.
enum Unmount {
    Ended(oneshot::Sender<()>),
    Dropped,
}

/// One mounted call view.
///
/// Runs as its own task and is the only owner of the local stream, the peer
/// link and the relay transport. Everything else sees it through a
/// [`CallHandle`].
pub struct CallSession {
    config: CallConfig,
    services: CallServices,
    state: CallState,
    role: Option<Role>,
    media: Option<LocalMediaStream>,
    peer: Option<Box<dyn PeerLink>>,
    remote_described: bool,
    pending_candidates: Vec<IceCandidatePayload>,
    remote_tracks: Vec<RemoteTrackInfo>,
    chat: ChatLog,
    signaling: Option<Arc<dyn SignalingTransport>>,
    inbound: Option<mpsc::Receiver<SignalMessage>>,
    peer_tx: mpsc::Sender<PeerEvent>,
    peer_rx: mpsc::Receiver<PeerEvent>,
    command_rx: mpsc::Receiver<CallCommand>,
    session_start: Option<JoinHandle<()>>,
    snapshot_tx: watch::Sender<CallSnapshot>,
}

impl CallSession {
    /// Mounts the call: spawns the session task and returns its handle.
    pub fn start(config: CallConfig, services: CallServices) -> CallHandle {
        let (command_tx, command_rx) = mpsc::channel(COMMAND_CAPACITY);
        let (snapshot_tx, snapshot_rx) = watch::channel(CallSnapshot::default());
        let (peer_tx, peer_rx) = mpsc::channel(PEER_EVENT_CAPACITY);

        let session = Self {
            config,
            services,
            state: CallState::Idle,
            role: None,
            media: None,
            peer: None,
            remote_described: false,
            pending_candidates: Vec::new(),
            remote_tracks: Vec::new(),
            chat: ChatLog::default(),
            signaling: None,
            inbound: None,
            peer_tx,
            peer_rx,
            command_rx,
            session_start: None,
            snapshot_tx,
        };
        tokio::spawn(session.run());

        CallHandle::new(command_tx, snapshot_rx)
    }

    async fn run(mut self) {
        info!("Call for appointment '{}' mounted", self.config.room);

        match self.mount().await {
            Ok(()) => self.serve().await,
            Err(Unmount::Ended(done)) => {
                info!("Call ended while mounting");
                self.finish(done).await;
            }
            Err(Unmount::Dropped) => {
                info!("Call handle dropped while mounting. Tearing down.");
                self.teardown().await;
            }
        }

        info!("Call for appointment '{}' finished", self.config.room);
    }

    async fn serve(&mut self) {
        loop {
            tokio::select! {
                cmd = self.command_rx.recv() => {
                    match cmd {
                        Some(CallCommand::EndCall { done }) => {
                            self.finish(done).await;
                            break;
                        }
                        Some(c) => self.handle_command(c).await,
                        None => {
                            info!("Call handle dropped. Tearing down.");
                            self.teardown().await;
                            break;
                        }
                    }
                }

                signal = next_signal(&mut self.inbound) => {
                    match signal {
                        Some(s) => self.handle_signal(s).await,
                        None => {
                            warn!("Signaling channel dropped; the call will not reconnect");
                            self.inbound = None;
                            self.publish();
                        }
                    }
                }

                evt = self.peer_rx.recv() => {
                    if let Some(e) = evt {
                        self.handle_peer_event(e).await;
                    }
                }
            }
        }
    }

    /// Acquire media, then connect and join. Neither failure aborts the call,
    /// but ending the call or dropping the handle does.
    async fn mount(&mut self) -> Result<(), Unmount> {
        let devices = self.services.devices.clone();
        let constraints = self.config.media;
        let acquired = self
            .serve_until(async move { devices.get_user_media(constraints).await })
            .await?;
        match acquired {
            Ok(stream) => self.media = Some(stream),
            Err(e) => warn!("Continuing without local media: {}", e),
        }
        self.publish();

        let connector = self.services.signaling.clone();
        let connected = self
            .serve_until(async move { connector.connect().await })
            .await?;
        let channel = match connected {
            Ok(channel) => channel,
            Err(e) => {
                warn!("Could not reach the relay, call stays idle: {}", e);
                return Ok(());
            }
        };
        self.signaling = Some(channel.transport);
        self.inbound = Some(channel.inbound);

        let join = SignalMessage::JoinRoom {
            room: self.config.room.clone(),
        };
        if self.emit(join).await {
            info!("Joined room '{}'", self.config.room);

            let sessions = self.services.sessions.clone();
            let room = self.config.room.clone();
            self.session_start = Some(tokio::spawn(async move {
                if let Err(e) = sessions.session_started(&room).await {
                    warn!("Failed to record session start for '{}': {}", room, e);
                }
            }));
        }
        self.publish();
        Ok(())
    }

    /// Drives one mount step while still answering the handle.
    async fn serve_until<T>(&mut self, step: impl Future<Output = T>) -> Result<T, Unmount> {
        tokio::pin!(step);
        loop {
            tokio::select! {
                out = &mut step => return Ok(out),

                cmd = self.command_rx.recv() => {
                    match cmd {
                        Some(CallCommand::EndCall { done }) => return Err(Unmount::Ended(done)),
                        Some(c) => self.handle_command(c).await,
                        None => return Err(Unmount::Dropped),
                    }
                }
            }
        }
    }

    /// Ends the call and releases the caller waiting on it.
    async fn finish(&mut self, done: oneshot::Sender<()>) {
        self.end_call().await;
        self.command_rx.close();
        let _ = done.send(());
    }

    async fn handle_command(&mut self, cmd: CallCommand) {
        match cmd {
            CallCommand::ToggleMicrophone => self.toggle(MediaKind::Audio),
            CallCommand::ToggleCamera => self.toggle(MediaKind::Video),
            CallCommand::SendChat(text) => self.send_chat(text).await,
            CallCommand::EndCall { .. } => {}
        }
    }

    async fn handle_signal(&mut self, signal: SignalMessage) {
        match signal {
            SignalMessage::UserConnected { peer_id } => {
                if self.role.is_some() || self.state != CallState::Idle {
                    warn!("Ignoring user-connected from {}: call already has a peer", peer_id);
                    return;
                }
                info!("Peer {} joined, sending offer", peer_id);
                self.role = Some(Role::Caller);

                let Some(peer) = self.ensure_peer().await else {
                    return;
                };
                let sdp = match peer.create_offer().await {
                    Ok(sdp) => sdp,
                    Err(e) => {
                        error!("Failed to create offer: {}", e);
                        return;
                    }
                };

                self.set_state(CallState::Connecting);
                let room = self.config.room.clone();
                self.emit(SignalMessage::Offer { room, sdp }).await;
            }

            SignalMessage::Offer { sdp, .. } => {
                if self.role.is_some() || self.state != CallState::Idle {
                    warn!("Rejecting offer: renegotiation is not supported");
                    return;
                }
                info!("Received offer, answering");
                self.role = Some(Role::Callee);

                let Some(peer) = self.ensure_peer().await else {
                    return;
                };
                let answer = match peer.accept_offer(sdp).await {
                    Ok(answer) => answer,
                    Err(e) => {
                        error!("Failed to answer offer: {}", e);
                        return;
                    }
                };

                self.remote_described = true;
                self.flush_candidates().await;
                self.set_state(CallState::Connecting);
                let room = self.config.room.clone();
                self.emit(SignalMessage::Answer { room, sdp: answer })
                    .await;
            }

            SignalMessage::Answer { sdp, .. } => {
                if self.role != Some(Role::Caller) || self.remote_described {
                    warn!("Ignoring unexpected answer");
                    return;
                }
                let Some(peer) = &self.peer else {
                    return;
                };
                if let Err(e) = peer.accept_answer(sdp).await {
                    error!("Failed to apply answer: {}", e);
                    return;
                }
                info!("Answer applied");

                self.remote_described = true;
                self.flush_candidates().await;
            }

            SignalMessage::IceCandidate { candidate, .. } => {
                if self.peer.is_some() && self.remote_described {
                    self.add_candidate(candidate).await;
                } else {
                    debug!("Queueing ICE candidate until the remote description is set");
                    self.pending_candidates.push(candidate);
                }
            }

            SignalMessage::ReceiveMessage { message } => {
                if self.chat.push(message) {
                    self.publish();
                } else {
                    debug!("Duplicate chat delivery ignored");
                }
            }

            SignalMessage::JoinRoom { .. } | SignalMessage::SendMessage { .. } => {
                warn!("Unexpected '{}' from relay", signal.kind());
            }
        }
    }

    async fn handle_peer_event(&mut self, event: PeerEvent) {
        match event {
            PeerEvent::LocalCandidate(candidate) => {
                let room = self.config.room.clone();
                self.emit(SignalMessage::IceCandidate { room, candidate })
                    .await;
            }

            PeerEvent::RemoteTrack(track) => {
                if self.remote_tracks.iter().any(|t| t.track_id == track.track_id) {
                    return;
                }
                self.remote_tracks.push(track);
                self.publish();
            }

            PeerEvent::StateChanged(PeerLinkState::Connected) => {
                if self.state == CallState::Connecting {
                    info!("Peer connection established");
                    self.set_state(CallState::Connected);
                }
            }

            PeerEvent::StateChanged(s @ (PeerLinkState::Disconnected | PeerLinkState::Failed)) => {
                warn!("Peer connection {:?}; no reconnection is attempted", s);
            }

            PeerEvent::StateChanged(s) => debug!("Peer connection {:?}", s),
        }
    }

    /// Builds the peer link on first use, with every local track attached.
    async fn ensure_peer(&mut self) -> Option<&dyn PeerLink> {
        if self.peer.is_none() {
            let created = self
                .services
                .peers
                .create(
                    &self.config.ice_servers,
                    self.media.as_ref(),
                    self.peer_tx.clone(),
                )
                .await;
            match created {
                Ok(peer) => self.peer = Some(peer),
                Err(e) => {
                    error!("Failed to create peer connection: {}", e);
                    return None;
                }
            }
        }
        self.peer.as_deref()
    }

    async fn add_candidate(&self, candidate: IceCandidatePayload) {
        let Some(peer) = &self.peer else {
            return;
        };
        if let Err(e) = peer.add_ice_candidate(candidate).await {
            warn!("Discarding ICE candidate: {}", e);
        }
    }

    async fn flush_candidates(&mut self) {
        let pending = std::mem::take(&mut self.pending_candidates);
        if !pending.is_empty() {
            debug!("Applying {} queued ICE candidates", pending.len());
        }
        for candidate in pending {
            self.add_candidate(candidate).await;
        }
    }

    fn toggle(&mut self, kind: MediaKind) {
        let track = self.media.as_ref().and_then(|m| match kind {
            MediaKind::Audio => m.audio(),
            MediaKind::Video => m.video(),
        });
        let Some(track) = track else {
            debug!("No local {} track to toggle", kind);
            return;
        };
        track.set_enabled(!track.is_enabled());
        info!("Local {} {}", kind, if track.is_enabled() { "on" } else { "off" });
        self.publish();
    }

    async fn send_chat(&mut self, text: String) {
        if text.trim().is_empty() {
            return;
        }
        let message = ChatMessage::new(self.config.display_name.clone(), text);
        let signal = SignalMessage::SendMessage {
            room: self.config.room.clone(),
            message: message.clone(),
        };

        if self.emit(signal).await && self.config.echo == EchoPolicy::RelayExcludesSender {
            self.chat.push(message);
            self.publish();
        }
    }

    async fn end_call(&mut self) {
        info!("Ending call for appointment '{}'", self.config.room);
        // The end record must not overtake the start record.
        if let Some(start) = self.session_start.take() {
            if let Err(e) = start.await {
                warn!("Session start task failed: {}", e);
            }
        }
        if let Err(e) = self.services.sessions.session_ended(&self.config.room).await {
            warn!("Failed to record session end for '{}': {}", self.config.room, e);
        }
        self.teardown().await;
    }

    /// Releases everything the call owns. Safe to run more than once.
    async fn teardown(&mut self) {
        if let Some(peer) = self.peer.take() {
            if let Err(e) = peer.close().await {
                warn!("Error closing peer connection: {}", e);
            }
        }
        if let Some(media) = self.media.take() {
            media.stop_all();
        }
        if let Some(transport) = self.signaling.take() {
            transport.disconnect().await;
        }
        self.inbound = None;
        self.pending_candidates.clear();

        if !self.state.is_closed() {
            self.set_state(CallState::Closed);
        }
    }

    async fn emit(&self, signal: SignalMessage) -> bool {
        let kind = signal.kind();
        let Some(transport) = &self.signaling else {
            warn!("Dropping '{}': not connected to the relay", kind);
            return false;
        };
        match transport.emit(signal).await {
            Ok(()) => true,
            Err(e) => {
                warn!("Failed to send '{}': {}", kind, e);
                false
            }
        }
    }

    fn set_state(&mut self, next: CallState) {
        if let Err(e) = self.state.transition(next) {
            warn!("{}", e);
        }
        self.publish();
    }

    fn publish(&self) {
        let media = self.media.as_ref();
        let snapshot = CallSnapshot {
            state: self.state,
            role: self.role,
            local_media: self.media.clone(),
            signaling_connected: self.inbound.is_some()
                && self.signaling.as_ref().is_some_and(|t| t.is_connected()),
            microphone_enabled: media
                .and_then(|m| m.audio())
                .is_some_and(|t| t.is_enabled()),
            camera_enabled: media
                .and_then(|m| m.video())
                .is_some_and(|t| t.is_enabled()),
            remote_tracks: self.remote_tracks.clone(),
            messages: self.chat.messages().to_vec(),
        };
        self.snapshot_tx.send_replace(snapshot);
    }
}

async fn next_signal(inbound: &mut Option<mpsc::Receiver<SignalMessage>>) -> Option<SignalMessage> {
    match inbound {
        Some(rx) => rx.recv().await,
        None => std::future::pending().await,
    }
}
