//! The persistent cycle loop.
//!
//! One cycle per interval, a fresh browser connection per cycle, and a
//! chunked sleep so termination signals are honored within seconds. An
//! in-flight cycle is allowed to finish; the signal is checked between
//! sleep increments and between cycles, never mid-application.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use jobagent::browser::CdpBrowser;
use jobagent::config::AppConfig;
use jobagent::engine::CycleOrchestrator;
use tracing::{error, info};

use crate::server::{ServicePhase, ServiceState};

const SLEEP_CHUNK: Duration = Duration::from_secs(5);

pub(crate) async fn run_service(
    config: &AppConfig,
    orchestrator: &CycleOrchestrator,
    state: Arc<ServiceState>,
) {
    let shutdown = shutdown_flag();

    state.mark_started();
    info!(
        interval_seconds = config.engine.cycle_interval.as_secs(),
        "application service started"
    );

    while !shutdown.load(Ordering::Relaxed) {
        state.set_phase(ServicePhase::Applying);

        match CdpBrowser::connect(&config.browser.cdp_endpoint).await {
            Ok(session) => {
                let applied = orchestrator.run_cycle(&session).await;
                state.record_cycle(applied);
            }
            Err(err) => {
                error!(error = %err, "browser endpoint unavailable; skipping this cycle");
            }
        }

        state.set_phase(ServicePhase::Sleeping);
        info!(
            seconds = config.engine.cycle_interval.as_secs(),
            "sleeping until next cycle"
        );

        let mut remaining = config.engine.cycle_interval;
        while !remaining.is_zero() && !shutdown.load(Ordering::Relaxed) {
            let chunk = remaining.min(SLEEP_CHUNK);
            tokio::time::sleep(chunk).await;
            remaining = remaining.saturating_sub(chunk);
        }
    }

    state.set_phase(ServicePhase::Stopped);
    info!("service stopped gracefully");
}

/// Flag flipped by SIGTERM or ctrl-c.
fn shutdown_flag() -> Arc<AtomicBool> {
    let flag = Arc::new(AtomicBool::new(false));
    let watcher = flag.clone();
    tokio::spawn(async move {
        wait_for_signal().await;
        info!("termination signal received; finishing current work");
        watcher.store(true, Ordering::Relaxed);
    });
    flag
}

async fn wait_for_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut terminate) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {}
                    _ = terminate.recv() => {}
                }
            }
            Err(_) => {
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }
    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}
