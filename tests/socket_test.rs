use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use serde_json::json;
use tokio::net::TcpListener;
use tokio_tungstenite::accept_async;
use tokio_tungstenite::tungstenite::Message;

use rewards_notify::socket::{SocketClient, SocketEvent, SocketIntent};

async fn next_event(events: &mut tokio::sync::broadcast::Receiver<SocketEvent>) -> SocketEvent {
    tokio::time::timeout(Duration::from_secs(5), events.recv())
        .await
        .expect("event within 5s")
        .expect("event stream open")
}

#[tokio::test]
async fn full_round_trip_against_a_real_server() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    // Minimal notification server: push one record, then echo back the
    // first intent frame the client emits.
    let server = tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        let mut ws = accept_async(stream).await.unwrap();

        let push = json!({
            "event": "newNotification",
            "data": {
                "id": "n1",
                "type": "payment_received",
                "title": "Payment received",
                "message": "You received 20 points",
                "createdAt": "2026-01-04T10:00:00Z",
            },
        });
        ws.send(Message::Text(push.to_string())).await.unwrap();

        while let Some(Ok(msg)) = ws.next().await {
            if let Message::Text(text) = msg {
                return text;
            }
        }
        panic!("client never emitted an intent");
    });

    let mut client = SocketClient::new(format!("ws://{addr}/socket"), Some("token".to_owned()));
    let mut events = client.subscribe();

    client.connect().await.expect("connect");
    assert!(client.is_connected());
    // Idempotent: a second connect on a live connection is a no-op.
    client.connect().await.expect("re-connect no-op");

    // Collect until the pushed notification arrives; the Connected event
    // may land before or after it depending on reader scheduling.
    let mut saw_connected = false;
    let pushed = loop {
        match next_event(&mut events).await {
            SocketEvent::Connected => saw_connected = true,
            SocketEvent::NewNotification(n) => break n,
            other => panic!("unexpected event: {other:?}"),
        }
    };
    assert!(saw_connected || matches!(next_event(&mut events).await, SocketEvent::Connected));
    assert_eq!(pushed.id, "n1");
    assert_eq!(pushed.title, "Payment received");

    client.emit(SocketIntent::MarkRead {
        id: "n1".to_owned(),
    });

    let frame = tokio::time::timeout(Duration::from_secs(5), server)
        .await
        .expect("server within 5s")
        .expect("server task");
    let value: serde_json::Value = serde_json::from_str(&frame).unwrap();
    assert_eq!(value["event"], "markRead");
    assert_eq!(value["data"]["id"], "n1");

    client.disconnect();
    assert!(!client.is_connected());
}

#[tokio::test]
async fn malformed_frames_surface_as_error_events() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        let mut ws = accept_async(stream).await.unwrap();
        ws.send(Message::Text("definitely not json".to_owned()))
            .await
            .unwrap();
        // Keep the connection open long enough for the client to parse.
        tokio::time::sleep(Duration::from_secs(2)).await;
    });

    let mut client = SocketClient::new(format!("ws://{addr}/socket"), Some("token".to_owned()));
    let mut events = client.subscribe();
    client.connect().await.expect("connect");

    loop {
        match next_event(&mut events).await {
            SocketEvent::Error(message) => {
                assert!(message.contains("malformed"), "got: {message}");
                break;
            }
            SocketEvent::Connected => {}
            other => panic!("unexpected event: {other:?}"),
        }
    }

    // The connection survives a bad frame.
    assert!(client.is_connected());
    client.disconnect();
}
