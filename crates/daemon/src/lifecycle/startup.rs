// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon startup: configuration, lock file, store, engine, listeners,
//! background workers.

use std::fs::File;
use std::io::Write as _;
use std::sync::Arc;
use std::time::{Duration, Instant};

use fs2::FileExt;
use tokio::net::{TcpListener, UnixListener};
use tokio::sync::Notify;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use mh_adapters::{RuntimeRegistry, TmuxDriver};
use mh_core::{built_in_templates, Clock, Config, SystemClock};
use mh_engine::Engine;
use mh_storage::Store;

use crate::env;
use crate::event_bus::EventBus;
use crate::http::run_http_server;
use crate::listener::{ListenCtx, Listener};
use crate::ws::run_ws_server;

use super::{spawn_supervised, LifecycleError};

/// Everything main() needs after startup.
pub struct StartupResult {
    pub engine: Arc<Engine<SystemClock>>,
    pub shutdown_requested: Arc<Notify>,
    pub cancel: CancellationToken,
    /// Held for the process lifetime; dropping releases the daemon lock.
    pub lock_file: File,
}

/// Load configuration from `<data_dir>/config.toml` + environment.
fn load_config() -> Result<Config, LifecycleError> {
    let data_dir = env::data_dir().ok_or(LifecycleError::NoDataDir)?;
    let config_path = data_dir.join("config.toml");
    let mut config = if config_path.exists() {
        let text = std::fs::read_to_string(&config_path).map_err(LifecycleError::ConfigIo)?;
        Config::from_toml(&text)?
    } else {
        Config::default()
    };
    config.data_dir = data_dir;

    if let Some(port) = env::tcp_port() {
        config.tcp_port = Some(port);
    }
    if let Some(port) = env::ws_port() {
        config.ws_port = port;
    }
    if let Some(port) = env::http_port() {
        config.http_port = Some(port);
    }
    if let Some(provider) = env::default_provider() {
        config.default_provider = provider;
    }
    if let Some(provider) = env::fallback_provider() {
        config.fallback_provider = Some(provider);
    }
    Ok(config)
}

/// Bring the daemon up; on success, background workers are running.
pub async fn startup() -> Result<StartupResult, LifecycleError> {
    let config = load_config()?;
    std::fs::create_dir_all(&config.data_dir)?;
    std::fs::create_dir_all(config.logs_dir())?;

    // Single-instance lock, held for the process lifetime
    let lock_path = config.lock_path();
    let lock_file = std::fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(false)
        .open(&lock_path)?;
    lock_file
        .try_lock_exclusive()
        .map_err(|_| LifecycleError::LockHeld(lock_path.clone()))?;
    let mut lock_file = lock_file;
    lock_file.set_len(0)?;
    writeln!(lock_file, "{}", std::process::id())?;

    // Store + event bus
    let bus = EventBus::new();
    let store = Arc::new(Store::open(&config.db_path(), Arc::new(bus.clone()))?);
    store.seed_templates(&built_in_templates(SystemClock.epoch_ms()))?;
    info!(path = %config.db_path().display(), "store open");

    // Engine
    let registry = Arc::new(RuntimeRegistry::new(
        config.default_provider.clone(),
        config.fallback_provider.clone(),
        &config.providers,
    ));
    let mux = Arc::new(TmuxDriver::new());
    let engine = Arc::new(Engine::new(
        Arc::clone(&store),
        mux,
        registry,
        Arc::new(bus.clone()),
        config.runtime_defs(),
        config.periods.clone(),
        SystemClock,
    ));

    // Reconcile persisted beliefs against tmux before serving clients
    engine.reconcile_tick().await;

    let cancel = engine.shutdown_token();
    let shutdown_requested = Arc::new(Notify::new());
    let ctx = Arc::new(ListenCtx {
        engine: Arc::clone(&engine),
        bus: bus.clone(),
        start_time: Instant::now(),
        shutdown: Arc::clone(&shutdown_requested),
    });

    // Unix socket (remove a stale one from a dead daemon first)
    let socket_path = config.socket_path();
    if socket_path.exists() {
        std::fs::remove_file(&socket_path)?;
    }
    let unix = UnixListener::bind(&socket_path).map_err(LifecycleError::Bind)?;
    info!(path = %socket_path.display(), "unix socket bound");

    let tcp = match config.tcp_port {
        Some(port) => {
            let listener = TcpListener::bind(("127.0.0.1", port))
                .await
                .map_err(LifecycleError::Bind)?;
            info!(port, "tcp listener bound");
            Some(listener)
        }
        None => None,
    };

    let listener = Listener::new(unix, tcp, Arc::clone(&ctx));
    tokio::spawn(listener.run(cancel.clone()));

    // WebSocket event subscribers
    let ws_listener = TcpListener::bind(("127.0.0.1", config.ws_port))
        .await
        .map_err(LifecycleError::Bind)?;
    info!(port = config.ws_port, "websocket listener bound");
    tokio::spawn(run_ws_server(ws_listener, bus.clone(), cancel.clone()));

    // Optional HTTP health probes
    if let Some(port) = config.http_port {
        match TcpListener::bind(("127.0.0.1", port)).await {
            Ok(listener) => {
                info!(port, "http health listener bound");
                tokio::spawn(run_http_server(listener, Arc::clone(&ctx), cancel.clone()));
            }
            Err(e) => warn!(port, error = %e, "http health listener unavailable"),
        }
    }

    // The three long-running workers, supervised with backoff
    let periods = engine.periods().clone();
    spawn_supervised(
        "orchestrator",
        Duration::from_millis(periods.orchestrator_ms),
        cancel.clone(),
        {
            let engine = Arc::clone(&engine);
            move || {
                let engine = Arc::clone(&engine);
                async move { engine.orchestrator_tick().await }
            }
        },
    );
    spawn_supervised(
        "autoclose",
        Duration::from_millis(periods.autoclose_ms),
        cancel.clone(),
        {
            let engine = Arc::clone(&engine);
            move || {
                let engine = Arc::clone(&engine);
                async move { engine.autoclose_tick().await }
            }
        },
    );
    spawn_supervised(
        "reconciler",
        Duration::from_millis(periods.reconcile_ms),
        cancel.clone(),
        {
            let engine = Arc::clone(&engine);
            move || {
                let engine = Arc::clone(&engine);
                async move { engine.reconcile_tick().await }
            }
        },
    );

    Ok(StartupResult { engine, shutdown_requested, cancel, lock_file })
}
