// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Supervised background workers.
//!
//! Each worker runs its tick on a fixed period until shutdown. If the
//! tick task dies (panic inside a dependency, aborted runtime), the
//! supervisor restarts it with exponential backoff.

use std::future::Future;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{error, info};

const BACKOFF_INITIAL: Duration = Duration::from_secs(1);
const BACKOFF_MAX: Duration = Duration::from_secs(60);

/// Spawn a supervised periodic worker. `tick` is invoked once per
/// period; the factory shape lets the supervisor restart the loop after
/// a crash.
pub(crate) fn spawn_supervised<F, Fut>(
    name: &'static str,
    period: Duration,
    cancel: CancellationToken,
    tick: F,
) where
    F: Fn() -> Fut + Send + Sync + Clone + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    tokio::spawn(async move {
        let mut backoff = BACKOFF_INITIAL;
        loop {
            let loop_cancel = cancel.clone();
            let loop_tick = tick.clone();
            let handle = tokio::spawn(async move {
                run_loop(name, period, loop_cancel, loop_tick).await;
            });

            match handle.await {
                Ok(()) => {
                    // Clean exit only happens at shutdown
                    return;
                }
                Err(e) => {
                    error!(worker = name, error = %e, backoff = ?backoff, "worker died, restarting");
                    tokio::select! {
                        _ = cancel.cancelled() => return,
                        _ = tokio::time::sleep(backoff) => {}
                    }
                    backoff = (backoff * 2).min(BACKOFF_MAX);
                }
            }
        }
    });
}

async fn run_loop<F, Fut>(name: &'static str, period: Duration, cancel: CancellationToken, tick: F)
where
    F: Fn() -> Fut,
    Fut: Future<Output = ()>,
{
    info!(worker = name, period = ?period, "worker running");
    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                info!(worker = name, "worker stopping");
                return;
            }
            _ = tokio::time::sleep(period) => {}
        }
        tick().await;
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    use super::*;

    #[tokio::test]
    async fn worker_ticks_until_cancelled() {
        let counter = Arc::new(AtomicU32::new(0));
        let cancel = CancellationToken::new();
        let ticks = Arc::clone(&counter);
        spawn_supervised("test", Duration::from_millis(5), cancel.clone(), move || {
            let ticks = Arc::clone(&ticks);
            async move {
                ticks.fetch_add(1, Ordering::SeqCst);
            }
        });

        tokio::time::sleep(Duration::from_millis(60)).await;
        cancel.cancel();
        let seen = counter.load(Ordering::SeqCst);
        assert!(seen >= 2, "expected several ticks, saw {seen}");

        tokio::time::sleep(Duration::from_millis(30)).await;
        let after = counter.load(Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(30)).await;
        assert!(
            counter.load(Ordering::SeqCst) <= after + 1,
            "worker must stop ticking after cancel"
        );
    }
}
