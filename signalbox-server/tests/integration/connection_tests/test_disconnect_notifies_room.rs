use signalbox_core::{ConnectionId, PeerId};

use crate::integration::{create_test_registry, init_tracing};
use crate::utils::{
    DELIVERY_TIMEOUT_MS, announce_msg, disconnect, drain, send_text, snapshot, wait_for_message,
};

#[tokio::test]
async fn test_disconnect_notifies_room() {
    init_tracing();

    let (cmd_tx, mut sent_rx, _output) = create_test_registry();
    let conn_a4 = ConnectionId::new();
    let conn_b4 = ConnectionId::new();

    send_text(&cmd_tx, conn_a4, &announce_msg("a4", "close-test")).await.unwrap();
    send_text(&cmd_tx, conn_b4, &announce_msg("b4", "close-test")).await.unwrap();
    snapshot(&cmd_tx).await.unwrap();
    drain(&mut sent_rx);

    disconnect(&cmd_tx, conn_a4).await.unwrap();

    let delivered = wait_for_message(&mut sent_rx, DELIVERY_TIMEOUT_MS)
        .await
        .expect("b4 should be told a4 left");
    assert_eq!(delivered.connection, conn_b4);
    assert_eq!(
        delivered.message,
        r#"/leave|{"id":"a4"}|{"room":"close-test"}"#
    );

    let state = snapshot(&cmd_tx).await.unwrap();
    assert_eq!(state.members_of("close-test"), vec![PeerId::from("b4")]);
    assert_eq!(state.peer_count(), 1);

    // A second disconnect for the same connection is harmless.
    disconnect(&cmd_tx, conn_a4).await.unwrap();
    disconnect(&cmd_tx, ConnectionId::new()).await.unwrap();
    assert_eq!(snapshot(&cmd_tx).await.unwrap(), state);
}
