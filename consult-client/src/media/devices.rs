use crate::error::MediaError;
use crate::media::{LocalMediaStream, MediaConstraints, MediaKind};
use async_trait::async_trait;
use tracing::info;
use uuid::Uuid;

/// Camera/microphone access, the `getUserMedia` of the call.
#[async_trait]
pub trait MediaDevices: Send + Sync {
    async fn get_user_media(
        &self,
        constraints: MediaConstraints,
    ) -> Result<LocalMediaStream, MediaError>;
}

/// Hands out sample-fed tracks without touching any hardware. The embedder
/// writes encoded frames into the returned tracks.
#[derive(Debug, Clone, Copy)]
pub struct SyntheticDevices {
    microphone: bool,
    camera: bool,
}

impl Default for SyntheticDevices {
    fn default() -> Self {
        Self {
            microphone: true,
            camera: true,
        }
    }
}

impl SyntheticDevices {
    /// A host with a microphone and no camera.
    pub fn without_camera() -> Self {
        Self {
            camera: false,
            ..Self::default()
        }
    }

    /// A host with a camera and no microphone.
    pub fn without_microphone() -> Self {
        Self {
            microphone: false,
            ..Self::default()
        }
    }
}

#[async_trait]
impl MediaDevices for SyntheticDevices {
    async fn get_user_media(
        &self,
        constraints: MediaConstraints,
    ) -> Result<LocalMediaStream, MediaError> {
        if !constraints.audio && !constraints.video {
            return Err(MediaError::NothingRequested);
        }
        if constraints.audio && !self.microphone {
            return Err(MediaError::Unavailable(MediaKind::Audio));
        }
        if constraints.video && !self.camera {
            return Err(MediaError::Unavailable(MediaKind::Video));
        }

        let stream = LocalMediaStream::new(
            Uuid::new_v4().to_string(),
            constraints.audio,
            constraints.video,
        );
        info!(
            "Acquired local stream {} (audio: {}, video: {})",
            stream.id(),
            constraints.audio,
            constraints.video
        );
        Ok(stream)
    }
}

/// Behaves like a browser whose user said no.
#[derive(Debug, Default, Clone, Copy)]
pub struct UnavailableDevices;

#[async_trait]
impl MediaDevices for UnavailableDevices {
    async fn get_user_media(
        &self,
        _constraints: MediaConstraints,
    ) -> Result<LocalMediaStream, MediaError> {
        Err(MediaError::Denied("no capture devices on this host".into()))
    }
}
