use crate::integration::{connect_as_callee, scripted_call};
use crate::utils::{QUIET, init_tracing, wait_for};

#[tokio::test]
async fn test_toggles_flip_tracks_in_place_without_signaling() {
    init_tracing();
    let call = scripted_call();
    connect_as_callee(&call).await;
    tokio::time::sleep(QUIET).await;

    let before = call.relay.emitted().len();
    let stream = call.handle.snapshot().local_media.unwrap();
    let audio = stream.audio().unwrap().clone();
    let video = stream.video().unwrap().clone();

    call.handle.toggle_microphone().await.unwrap();
    let snapshot = wait_for(&call.handle, |s| !s.microphone_enabled).await;
    assert!(!audio.is_enabled());
    assert!(snapshot.camera_enabled);

    call.handle.toggle_camera().await.unwrap();
    wait_for(&call.handle, |s| !s.camera_enabled).await;
    assert!(!video.is_enabled());

    call.handle.toggle_microphone().await.unwrap();
    call.handle.toggle_camera().await.unwrap();
    wait_for(&call.handle, |s| s.microphone_enabled && s.camera_enabled).await;
    assert!(audio.is_enabled() && video.is_enabled());

    tokio::time::sleep(QUIET).await;
    assert_eq!(call.relay.emitted().len(), before);
    assert_eq!(call.relay.count("offer"), 0);
}
