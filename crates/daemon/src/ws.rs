// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! WebSocket event fan-out.
//!
//! Subscribers connect to the WS port and receive every domain event as
//! a JSON text frame. Backpressure is handled by the event bus: a
//! subscriber that stops draining is dropped there, which closes the
//! socket here.

use futures_util::{SinkExt, StreamExt};
use tokio::net::{TcpListener, TcpStream};
use tokio_tungstenite::tungstenite::Message;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use crate::event_bus::EventBus;

/// Accept WebSocket subscribers until shutdown.
pub(crate) async fn run_ws_server(listener: TcpListener, bus: EventBus, cancel: CancellationToken) {
    info!("websocket listener running");
    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                info!("websocket listener stopping");
                return;
            }
            result = listener.accept() => match result {
                Ok((stream, addr)) => {
                    debug!(%addr, "websocket connection");
                    let bus = bus.clone();
                    let cancel = cancel.clone();
                    tokio::spawn(async move {
                        if let Err(e) = serve_subscriber(stream, bus, cancel).await {
                            debug!(error = %e, "websocket subscriber ended");
                        }
                    });
                }
                Err(e) => error!(error = %e, "websocket accept failed"),
            },
        }
    }
}

async fn serve_subscriber(
    stream: TcpStream,
    bus: EventBus,
    cancel: CancellationToken,
) -> Result<(), tokio_tungstenite::tungstenite::Error> {
    let ws = tokio_tungstenite::accept_async(stream).await?;
    let (mut sink, mut source) = ws.split();
    let (sub_id, mut rx) = bus.subscribe(None);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            event = rx.recv() => match event {
                Some(event) => {
                    let text = match serde_json::to_string(&event) {
                        Ok(text) => text,
                        Err(e) => {
                            error!(error = %e, "event serialization failed");
                            continue;
                        }
                    };
                    if sink.send(Message::text(text)).await.is_err() {
                        break;
                    }
                }
                // Dropped by the bus (slow subscriber)
                None => break,
            },
            message = source.next() => match message {
                Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                Some(Ok(Message::Ping(payload))) => {
                    let _ = sink.send(Message::Pong(payload)).await;
                }
                // Subscribers only listen; anything else is ignored
                Some(Ok(_)) => {}
            },
        }
    }

    bus.unsubscribe(sub_id);
    let _ = sink.send(Message::Close(None)).await;
    Ok(())
}
