// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Minimal HTTP/1.1 health endpoint.
//!
//! Serves `GET /healthz` with a JSON body for load balancers and uptime
//! probes. Hand-rolled on purpose: one route does not need a web
//! framework, and the daemon's other surfaces are raw sockets already.

use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use crate::listener::ListenCtx;

pub(crate) async fn run_http_server(
    listener: TcpListener,
    ctx: Arc<ListenCtx>,
    cancel: CancellationToken,
) {
    info!("http health listener running");
    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                info!("http health listener stopping");
                return;
            }
            result = listener.accept() => match result {
                Ok((stream, _)) => {
                    let ctx = Arc::clone(&ctx);
                    tokio::spawn(async move {
                        if let Err(e) = serve_probe(stream, &ctx).await {
                            debug!(error = %e, "health probe connection error");
                        }
                    });
                }
                Err(e) => error!(error = %e, "http accept failed"),
            },
        }
    }
}

async fn serve_probe(
    stream: tokio::net::TcpStream,
    ctx: &ListenCtx,
) -> Result<(), std::io::Error> {
    let mut stream = stream;
    let mut reader = BufReader::new(&mut stream);
    let mut request_line = String::new();
    reader.read_line(&mut request_line).await?;

    let path = request_line.split_whitespace().nth(1).unwrap_or("/");
    let (status, body) = if path == "/healthz" || path == "/" {
        let body = serde_json::json!({
            "ok": ctx.engine.store.healthy(),
            "uptimeMs": ctx.start_time.elapsed().as_millis() as u64,
            "version": env!("CARGO_PKG_VERSION"),
        })
        .to_string();
        ("200 OK", body)
    } else {
        ("404 Not Found", "{\"error\":\"not found\"}".to_string())
    };

    let response = format!(
        "HTTP/1.1 {status}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
        body.len(),
    );
    stream.write_all(response.as_bytes()).await?;
    stream.flush().await
}
