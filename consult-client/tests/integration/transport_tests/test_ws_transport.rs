use std::time::Duration;

use consult_client::SignalingError;
use consult_client::signaling::{SignalingConnector, WsConnector};
use consult_core::{PeerId, SignalMessage};
use consult_relay::RelayConfig;

use crate::utils::{WAIT, appointment, init_tracing, spawn_relay};

#[tokio::test]
async fn test_join_announces_over_websocket() {
    init_tracing();
    let url = spawn_relay(RelayConfig::default()).await.unwrap();
    let connector = WsConnector::new(url);

    let mut first = connector.connect().await.unwrap();
    let second = connector.connect().await.unwrap();
    assert!(first.transport.is_connected());

    let join = SignalMessage::JoinRoom {
        room: appointment(),
    };
    first.transport.emit(join.clone()).await.unwrap();
    tokio::time::sleep(Duration::from_millis(100)).await;
    second.transport.emit(join).await.unwrap();

    let announced = tokio::time::timeout(WAIT, first.inbound.recv())
        .await
        .unwrap()
        .unwrap();
    assert!(matches!(announced, SignalMessage::UserConnected { .. }));

    first.transport.disconnect().await;
    first.transport.disconnect().await;
    assert!(!first.transport.is_connected());
    assert!(matches!(
        first
            .transport
            .emit(SignalMessage::UserConnected {
                peer_id: PeerId::new()
            })
            .await,
        Err(SignalingError::Closed)
    ));
}

#[tokio::test]
async fn test_unreachable_relay_fails_to_connect() {
    init_tracing();
    let connector = WsConnector::new("ws://127.0.0.1:1/ws");

    let result = connector.connect().await;

    assert!(matches!(result, Err(SignalingError::Connect(_))));
}
