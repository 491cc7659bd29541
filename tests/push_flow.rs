//! End-to-end exercise of the public connection API over an in-memory stream.

use std::collections::BTreeMap;

use serde_json::{Value, json};
use tokio::io::{AsyncReadExt, DuplexStream, duplex};

use apnc::{
    connection::{ConnectionHandle, Termination},
    frame::{FRAME_OVERHEAD, parse_frame, read_u16},
    message::NotificationMessage,
    payload::{Alert, LocalizedAlert},
    token::DeviceToken,
};

const TOKEN_HEX: &str = "0123456789abcdef0123456789abcdef0123456789abcdef0123456789abcdef";

fn token() -> DeviceToken { DeviceToken::from_hex(TOKEN_HEX).expect("valid token") }

/// Read exactly one frame from the gateway side of the stream.
async fn read_frame(server: &mut DuplexStream) -> Vec<u8> {
    let mut head = vec![0u8; FRAME_OVERHEAD];
    server.read_exact(&mut head).await.expect("frame head");
    let payload_len = read_u16(&head[35..37]).expect("payload length") as usize;
    let mut payload = vec![0u8; payload_len];
    server.read_exact(&mut payload).await.expect("frame payload");
    head.extend_from_slice(&payload);
    head
}

fn payload_json(frame_bytes: &[u8]) -> Value {
    let frame = parse_frame(frame_bytes).expect("well-formed frame");
    assert_eq!(frame.token, token());
    serde_json::from_slice(&frame.payload).expect("JSON payload")
}

#[tokio::test]
async fn frames_are_transmitted_in_send_order() {
    let (client, mut server) = duplex(16 * 1024);
    let handle = ConnectionHandle::spawn(client);

    for text in ["first", "second"] {
        let mut message = NotificationMessage::new(token());
        message.alert = Some(Alert::Text(text.to_owned()));
        handle.send(message).await.expect("send");
    }

    let first = payload_json(&read_frame(&mut server).await);
    let second = payload_json(&read_frame(&mut server).await);
    assert_eq!(first, json!({"alert": "first"}));
    assert_eq!(second, json!({"alert": "second"}));

    handle.stop().await.expect("stop");
    assert!(matches!(handle.join().await, Termination::Normal));
}

#[tokio::test]
async fn full_message_survives_the_wire() {
    let (client, mut server) = duplex(16 * 1024);
    let handle = ConnectionHandle::spawn(client);

    let mut message = NotificationMessage::new(token());
    message.alert = Some(Alert::Localized(LocalizedAlert::new(
        "GREETING".to_owned(),
        vec!["Bob".to_owned()],
    )));
    message.badge = Some(3);
    message.sound = Some("chime".to_owned());
    let mut extra = BTreeMap::new();
    extra.insert("thread".to_owned(), json!("inbox"));
    extra.insert("ignored".to_owned(), json!({"nested": true}));
    message.extra = extra;
    handle.send(message).await.expect("send");

    let payload = payload_json(&read_frame(&mut server).await);
    assert_eq!(
        payload,
        json!({
            "alert": {"loc-key": "GREETING", "loc-args": ["Bob"]},
            "badge": 3,
            "sound": "chime",
            "thread": "inbox",
        })
    );

    handle.stop().await.expect("stop");
    assert!(matches!(handle.join().await, Termination::Normal));
}

#[tokio::test]
async fn gateway_close_terminates_the_session() {
    let (client, server) = duplex(1024);
    let handle = ConnectionHandle::spawn(client);
    drop(server);
    assert!(matches!(handle.join().await, Termination::PeerClosed));
}

#[tokio::test]
async fn unexpected_gateway_input_terminates_the_session() {
    let (client, mut server) = duplex(1024);
    let handle = ConnectionHandle::spawn(client);
    tokio::io::AsyncWriteExt::write_all(&mut server, &[8, 0, 0, 0, 0, 1])
        .await
        .expect("write");
    let reason = handle.join().await;
    assert!(matches!(reason, Termination::Unrecognized(_)));
}
