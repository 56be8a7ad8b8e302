//! Process status server and the shared service state it reports.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use axum_prometheus::PrometheusMetricLayer;
use chrono::{DateTime, Utc};
use jobagent::config::AppConfig;
use jobagent::error::AppError;
use jobagent::telemetry;
use serde::Serialize;
use serde_json::json;
use tracing::{error, info};

use crate::cli::ServeArgs;
use crate::infra::{self, PlatformFilter};
use crate::scheduler;

/// Lifecycle phase reported by the status endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ServicePhase {
    Starting,
    Running,
    Applying,
    Sleeping,
    Stopped,
}

impl ServicePhase {
    fn label(&self) -> &'static str {
        match self {
            ServicePhase::Starting => "starting",
            ServicePhase::Running => "running",
            ServicePhase::Applying => "applying",
            ServicePhase::Sleeping => "sleeping",
            ServicePhase::Stopped => "stopped",
        }
    }
}

/// Counters shared between the driving worker and the status server. The
/// worker writes between cycles; the server only reads.
pub(crate) struct ServiceState {
    phase: Mutex<ServicePhase>,
    started_at: Mutex<Option<DateTime<Utc>>>,
    last_cycle: Mutex<Option<DateTime<Utc>>>,
    total_applied: AtomicU64,
    cycles: AtomicU64,
}

impl ServiceState {
    pub(crate) fn new() -> Self {
        Self {
            phase: Mutex::new(ServicePhase::Starting),
            started_at: Mutex::new(None),
            last_cycle: Mutex::new(None),
            total_applied: AtomicU64::new(0),
            cycles: AtomicU64::new(0),
        }
    }

    pub(crate) fn mark_started(&self) {
        *self.started_at.lock().expect("state mutex poisoned") = Some(Utc::now());
        self.set_phase(ServicePhase::Running);
    }

    pub(crate) fn set_phase(&self, phase: ServicePhase) {
        *self.phase.lock().expect("state mutex poisoned") = phase;
    }

    pub(crate) fn record_cycle(&self, applied: u32) {
        self.total_applied
            .fetch_add(u64::from(applied), Ordering::Relaxed);
        self.cycles.fetch_add(1, Ordering::Relaxed);
        *self.last_cycle.lock().expect("state mutex poisoned") = Some(Utc::now());
    }

    pub(crate) fn snapshot(&self) -> StatusDocument {
        StatusDocument {
            status: self.phase.lock().expect("state mutex poisoned").label(),
            started_at: self
                .started_at
                .lock()
                .expect("state mutex poisoned")
                .map(|ts| ts.to_rfc3339()),
            last_cycle: self
                .last_cycle
                .lock()
                .expect("state mutex poisoned")
                .map(|ts| ts.to_rfc3339()),
            total_applied: self.total_applied.load(Ordering::Relaxed),
            cycles: self.cycles.load(Ordering::Relaxed),
        }
    }

    fn is_ready(&self) -> bool {
        *self.phase.lock().expect("state mutex poisoned") != ServicePhase::Starting
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct StatusDocument {
    pub(crate) status: &'static str,
    pub(crate) started_at: Option<String>,
    pub(crate) last_cycle: Option<String>,
    pub(crate) total_applied: u64,
    pub(crate) cycles: u64,
}

/// Liveness, readiness, and the machine-readable status document.
pub(crate) fn status_router(state: Arc<ServiceState>) -> Router {
    Router::new()
        .route("/health", get(healthcheck))
        .route("/ready", get(readiness_endpoint))
        .route("/status", get(status_endpoint))
        .with_state(state)
}

async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

async fn readiness_endpoint(State(state): State<Arc<ServiceState>>) -> impl IntoResponse {
    if state.is_ready() {
        (StatusCode::OK, Json(json!({ "status": "ready" })))
    } else {
        (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({ "status": "initializing" })),
        )
    }
}

async fn status_endpoint(State(state): State<Arc<ServiceState>>) -> Json<StatusDocument> {
    Json(state.snapshot())
}

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }

    telemetry::init(&config.telemetry)?;

    let filter = PlatformFilter::from_flags(args.linkedin_only, args.indeed_only);
    let orchestrator = infra::build_orchestrator(&config, filter);
    let state = Arc::new(ServiceState::new());

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let app = status_router(state.clone())
        .route(
            "/metrics",
            get(move || {
                let handle = prometheus_handle.clone();
                async move {
                    (
                        StatusCode::OK,
                        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
                        handle.render(),
                    )
                }
            }),
        )
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(?config.environment, %addr, "status server listening");

    let server_task = tokio::spawn(async move {
        if let Err(err) = axum::serve(listener, app).await {
            error!(error = %err, "status server terminated");
        }
    });

    scheduler::run_service(&config, &orchestrator, state).await;

    server_task.abort();
    Ok(())
}
