use crate::media::LocalMediaStream;
use bytes::Bytes;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{MissedTickBehavior, interval};
use tracing::debug;
use webrtc::media::Sample;

/// One 20 ms Opus frame of silence.
const OPUS_SILENCE: [u8; 3] = [0xf8, 0xff, 0xfe];
const FRAME: Duration = Duration::from_millis(20);

/// Keeps the audio track flowing with silence until it is stopped, so the
/// far end sees a live track without a real microphone behind it.
pub fn spawn_silence_feeder(stream: &LocalMediaStream) -> Option<JoinHandle<()>> {
    let track = stream.audio()?.clone();

    Some(tokio::spawn(async move {
        let mut ticker = interval(FRAME);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let sample = Sample {
            data: Bytes::from_static(&OPUS_SILENCE),
            duration: FRAME,
            ..Default::default()
        };

        loop {
            ticker.tick().await;
            if let Err(e) = track.write_sample(&sample).await {
                debug!("Silence feeder stopping: {}", e);
                break;
            }
        }
    }))
}
