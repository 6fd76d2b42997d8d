use consult_core::{PeerId, RoomKey, SignalMessage};
use consult_relay::{RelayConfig, SignalingService};
use tokio::sync::mpsc;

use crate::integration::{appointment, init_tracing};

#[tokio::test]
async fn test_room_is_released_after_last_member_leaves() {
    init_tracing();

    let service = SignalingService::new(&RelayConfig::default());
    let first = PeerId::new();
    let second = PeerId::new();
    let (tx_first, _rx_first) = mpsc::unbounded_channel();
    let (tx_second, _rx_second) = mpsc::unbounded_channel();
    service.add_peer(first, tx_first);
    service.add_peer(second, tx_second);

    service.join(first, appointment()).await;
    service.join(second, appointment()).await;
    assert_eq!(service.rooms().room_count(), 1);

    service.disconnect(first).await;
    assert_eq!(service.rooms().room_count(), 1);

    service.disconnect(second).await;
    assert_eq!(service.rooms().room_count(), 0);
}

#[tokio::test]
async fn test_switching_rooms_leaves_the_previous_one() {
    init_tracing();

    let service = SignalingService::new(&RelayConfig::default());
    let peer = PeerId::new();
    let (tx, _rx) = mpsc::unbounded_channel();
    service.add_peer(peer, tx);

    service.join(peer, appointment()).await;
    service
        .join(peer, RoomKey::new("appt-456").unwrap())
        .await;
    assert_eq!(service.rooms().room_count(), 1);

    // Still scoped to the old room: dropped, nothing panics.
    service
        .relay(
            peer,
            SignalMessage::Offer {
                room: appointment(),
                sdp: "stale".into(),
            },
        )
        .await;

    service.disconnect(peer).await;
    assert_eq!(service.rooms().room_count(), 0);
}
