// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `mhd` — the muxherd daemon.

use std::io::Write as _;

use tracing::info;
use tracing_subscriber::EnvFilter;

use mh_daemon::{env, exit_code, startup};

fn init_tracing() -> Option<tracing_appender::non_blocking::WorkerGuard> {
    let filter = EnvFilter::try_from_env("MUXHERD_LOG")
        .unwrap_or_else(|_| EnvFilter::new("info"));

    match env::data_dir() {
        Some(data_dir) => {
            let appender = tracing_appender::rolling::daily(data_dir.join("logs"), "mhd.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(writer)
                .with_ansi(false)
                .init();
            Some(guard)
        }
        None => {
            tracing_subscriber::fmt().with_env_filter(filter).init();
            None
        }
    }
}

fn main() {
    let exit = run();
    std::process::exit(exit);
}

fn run() -> i32 {
    let runtime = match tokio::runtime::Runtime::new() {
        Ok(runtime) => runtime,
        Err(e) => {
            let _ = writeln!(std::io::stderr(), "mhd: failed to start runtime: {e}");
            return exit_code::CONFIG;
        }
    };

    runtime.block_on(async {
        let _log_guard = init_tracing();

        let started = match startup().await {
            Ok(started) => started,
            Err(e) => {
                // Startup failures go to stderr too: tracing may write
                // to a file the operator is not watching yet.
                let _ = writeln!(std::io::stderr(), "mhd: {e}");
                return e.exit_code();
            }
        };
        info!(version = env!("CARGO_PKG_VERSION"), "daemon up");

        // Wait for SIGTERM / SIGINT / client-requested shutdown
        let reason = wait_for_shutdown(&started.shutdown_requested).await;
        info!(reason, "shutting down");

        // Stop accepting work, let in-flight RPCs drain, flush beliefs
        started.engine.begin_shutdown();
        tokio::time::sleep(env::drain_timeout()).await;
        drop(started.lock_file);

        exit_code::CLEAN
    })
}

async fn wait_for_shutdown(requested: &tokio::sync::Notify) -> &'static str {
    let sigterm = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(_) => std::future::pending().await,
        }
    };
    tokio::select! {
        _ = tokio::signal::ctrl_c() => "SIGINT",
        _ = sigterm => "SIGTERM",
        _ = requested.notified() => "client request",
    }
}
