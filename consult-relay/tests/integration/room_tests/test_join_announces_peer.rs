use consult_core::{PeerId, SignalMessage};
use consult_relay::{BroadcastPolicy, RoomCommand};

use crate::integration::{create_test_room, init_tracing};
use crate::utils::{expect_no_delivery, next_delivery};

#[tokio::test]
async fn test_second_peer_is_announced_to_first() {
    init_tracing();

    let (room_tx, mut delivery_rx, _signaling) = create_test_room(BroadcastPolicy::default());
    let first = PeerId::new();
    let second = PeerId::new();

    room_tx
        .send(RoomCommand::Join { peer_id: first })
        .await
        .unwrap();
    // Nobody else is around yet.
    expect_no_delivery(&mut delivery_rx).await;

    room_tx
        .send(RoomCommand::Join { peer_id: second })
        .await
        .unwrap();

    let delivery = next_delivery(&mut delivery_rx).await.unwrap();
    assert_eq!(delivery.peer_id, first);
    assert_eq!(
        delivery.signal,
        SignalMessage::UserConnected { peer_id: second }
    );
    expect_no_delivery(&mut delivery_rx).await;
}

#[tokio::test]
async fn test_rejoin_is_not_announced_twice() {
    init_tracing();

    let (room_tx, mut delivery_rx, _signaling) = create_test_room(BroadcastPolicy::default());
    let first = PeerId::new();
    let second = PeerId::new();

    for peer_id in [first, second, second] {
        room_tx.send(RoomCommand::Join { peer_id }).await.unwrap();
    }

    let delivery = next_delivery(&mut delivery_rx).await.unwrap();
    assert_eq!(delivery.peer_id, first);
    expect_no_delivery(&mut delivery_rx).await;
}
