use crate::error::MediaError;
use crate::media::MediaKind;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::debug;
use webrtc::api::media_engine::{MIME_TYPE_OPUS, MIME_TYPE_VP8};
use webrtc::media::Sample;
use webrtc::rtp_transceiver::rtp_codec::RTCRtpCodecCapability;
use webrtc::track::track_local::track_local_static_sample::TrackLocalStaticSample;

/// One captured input. Whoever drives the capture device writes samples
/// here; the peer connection sends whatever gets through.
pub struct LocalTrack {
    kind: MediaKind,
    track: Arc<TrackLocalStaticSample>,
    enabled: AtomicBool,
    stopped: AtomicBool,
}

impl LocalTrack {
    pub fn new(kind: MediaKind, stream_id: &str) -> Self {
        let codec = match kind {
            MediaKind::Audio => RTCRtpCodecCapability {
                mime_type: MIME_TYPE_OPUS.to_owned(),
                clock_rate: 48_000,
                channels: 2,
                ..Default::default()
            },
            MediaKind::Video => RTCRtpCodecCapability {
                mime_type: MIME_TYPE_VP8.to_owned(),
                clock_rate: 90_000,
                ..Default::default()
            },
        };

        let track = TrackLocalStaticSample::new(codec, kind.to_string(), stream_id.to_owned());

        Self {
            kind,
            track: Arc::new(track),
            enabled: AtomicBool::new(true),
            stopped: AtomicBool::new(false),
        }
    }

    pub fn kind(&self) -> MediaKind {
        self.kind
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::SeqCst)
    }

    /// Mute or unmute in place. Nothing is renegotiated.
    pub fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::SeqCst);
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::SeqCst)
    }

    /// Release the input. Returns `false` if it was already stopped.
    pub fn stop(&self) -> bool {
        let was_running = !self.stopped.swap(true, Ordering::SeqCst);
        if was_running {
            debug!("Stopped local {} track", self.kind);
        }
        was_running
    }

    pub fn rtc_track(&self) -> Arc<TrackLocalStaticSample> {
        self.track.clone()
    }

    /// Push one encoded frame. Frames written while the track is disabled
    /// are dropped.
    pub async fn write_sample(&self, sample: &Sample) -> Result<(), MediaError> {
        if self.is_stopped() {
            return Err(MediaError::Stopped(self.kind.to_string()));
        }
        if !self.is_enabled() {
            return Ok(());
        }
        self.track.write_sample(sample).await?;
        Ok(())
    }
}

impl fmt::Debug for LocalTrack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LocalTrack")
            .field("kind", &self.kind)
            .field("enabled", &self.is_enabled())
            .field("stopped", &self.is_stopped())
            .finish()
    }
}

/// The self-preview stream: at most one audio and one video track.
#[derive(Debug, Clone)]
pub struct LocalMediaStream {
    id: String,
    audio: Option<Arc<LocalTrack>>,
    video: Option<Arc<LocalTrack>>,
}

impl LocalMediaStream {
    pub fn new(id: impl Into<String>, audio: bool, video: bool) -> Self {
        let id = id.into();
        let audio = audio.then(|| Arc::new(LocalTrack::new(MediaKind::Audio, &id)));
        let video = video.then(|| Arc::new(LocalTrack::new(MediaKind::Video, &id)));
        Self { id, audio, video }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn audio(&self) -> Option<&Arc<LocalTrack>> {
        self.audio.as_ref()
    }

    pub fn video(&self) -> Option<&Arc<LocalTrack>> {
        self.video.as_ref()
    }

    pub fn tracks(&self) -> impl Iterator<Item = &Arc<LocalTrack>> {
        self.audio.iter().chain(self.video.iter())
    }

    pub fn stop_all(&self) {
        for track in self.tracks() {
            track.stop();
        }
    }

    pub fn is_live(&self) -> bool {
        self.tracks().any(|track| !track.is_stopped())
    }
}
