use std::time::Duration;

use crate::integration::init_tracing;
use crate::utils::{WsClient, announce_msg, start_test_server, wait_for_members};

#[tokio::test]
async fn test_websocket_relay() {
    init_tracing();

    let (addr, service) = start_test_server(Duration::from_secs(30))
        .await
        .expect("Failed to start server");

    let mut a = WsClient::connect(addr).await.expect("connect a");
    let mut b = WsClient::connect(addr).await.expect("connect b");
    let mut c = WsClient::connect(addr).await.expect("connect c");

    a.send(&announce_msg("a", "ws-room")).await.unwrap();
    wait_for_members(&service, "ws-room", 1).await.unwrap();

    b.send(&announce_msg("b", "ws-room")).await.unwrap();
    assert_eq!(a.recv().await.unwrap(), announce_msg("b", "ws-room"));

    c.send(&announce_msg("c", "ws-room")).await.unwrap();
    assert_eq!(a.recv().await.unwrap(), announce_msg("c", "ws-room"));
    assert_eq!(b.recv().await.unwrap(), announce_msg("c", "ws-room"));

    // Direct message reaches only its destination.
    let offer = r#"/to|b|/offer|{"id":"a"}|sdp-blob"#;
    a.send(offer).await.unwrap();
    assert_eq!(b.recv().await.unwrap(), offer);

    // Custom broadcast reaches everyone else; c's first message is this one,
    // so it never saw the offer.
    let hello = r#"/hello|{"id":"a"}"#;
    a.send(hello).await.unwrap();
    assert_eq!(b.recv().await.unwrap(), hello);
    assert_eq!(c.recv().await.unwrap(), hello);

    // Dropping a connection makes the registry synthesize a leave.
    a.close().await.unwrap();
    let leave = r#"/leave|{"id":"a"}|{"room":"ws-room"}"#;
    assert_eq!(b.recv().await.unwrap(), leave);
    assert_eq!(c.recv().await.unwrap(), leave);

    wait_for_members(&service, "ws-room", 2).await.unwrap();
}
