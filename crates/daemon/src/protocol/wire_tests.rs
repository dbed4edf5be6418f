// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::time::Duration;

use serde_json::json;

use super::{decode, encode, read_message, write_message, ProtocolError, MAX_FRAME_LEN};

const TIMEOUT: Duration = Duration::from_secs(1);

#[test]
fn frames_carry_big_endian_length() {
    let frame = encode(&json!({"a": 1})).unwrap();
    let len = u32::from_be_bytes([frame[0], frame[1], frame[2], frame[3]]);
    assert_eq!(len as usize, frame.len() - 4);
    let value: serde_json::Value = decode(&frame[4..]).unwrap();
    assert_eq!(value["a"], 1);
}

#[tokio::test]
async fn round_trip_over_a_duplex_pipe() {
    let (mut client, mut server) = tokio::io::duplex(1024);
    let message = json!({"method": "health.get", "params": {}});
    write_message(&mut client, &message, TIMEOUT).await.unwrap();
    let received: serde_json::Value = read_message(&mut server, TIMEOUT).await.unwrap();
    assert_eq!(received, message);
}

#[tokio::test]
async fn closed_connection_is_reported() {
    let (client, mut server) = tokio::io::duplex(1024);
    drop(client);
    let err = read_message::<_, serde_json::Value>(&mut server, TIMEOUT).await.unwrap_err();
    assert!(matches!(err, ProtocolError::ConnectionClosed));
}

#[tokio::test]
async fn oversized_frames_are_rejected() {
    let (mut client, mut server) = tokio::io::duplex(64);
    let mut bogus = Vec::new();
    bogus.extend_from_slice(&(MAX_FRAME_LEN + 1).to_be_bytes());
    tokio::io::AsyncWriteExt::write_all(&mut client, &bogus).await.unwrap();
    let err = read_message::<_, serde_json::Value>(&mut server, TIMEOUT).await.unwrap_err();
    assert!(matches!(err, ProtocolError::FrameTooLarge(_)));
}

#[tokio::test]
async fn truncated_payload_is_a_closed_connection() {
    let (mut client, mut server) = tokio::io::duplex(1024);
    let mut frame = encode(&json!({"x": true})).unwrap();
    frame.truncate(frame.len() - 2);
    tokio::io::AsyncWriteExt::write_all(&mut client, &frame).await.unwrap();
    drop(client);
    let err = read_message::<_, serde_json::Value>(&mut server, TIMEOUT).await.unwrap_err();
    assert!(matches!(err, ProtocolError::ConnectionClosed));
}

#[tokio::test]
async fn malformed_json_is_reported() {
    let (mut client, mut server) = tokio::io::duplex(1024);
    let payload = b"not json";
    let mut frame = Vec::new();
    frame.extend_from_slice(&(payload.len() as u32).to_be_bytes());
    frame.extend_from_slice(payload);
    tokio::io::AsyncWriteExt::write_all(&mut client, &frame).await.unwrap();
    let err = read_message::<_, serde_json::Value>(&mut server, TIMEOUT).await.unwrap_err();
    assert!(matches!(err, ProtocolError::Malformed(_)));
}
