//! HTTP API for triggering runs and inspecting results.
//!
//! A small Axum surface meant for a reverse-proxied LAN deployment:
//! trigger a run, list blueprints, fetch the latest report. Runs triggered
//! here execute in background tasks; the response only acknowledges the
//! start.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
};
use serde::Serialize;
use std::sync::Arc;

use crate::blueprint;
use crate::config::Config;
use crate::report::RunReport;
use crate::runner::{self, RunGuard};

/// Shared application context passed to all handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub guard: RunGuard,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    status: String,
    module: String,
    version: String,
}

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    status: String,
}

impl StatusResponse {
    fn new(status: impl Into<String>) -> Json<Self> {
        Json(Self {
            status: status.into(),
        })
    }
}

/// GET /health - Health check endpoint
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        module: "mixcrate".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// GET /blueprints - All parseable blueprints in the blueprints directory
pub async fn list_blueprints(State(state): State<AppState>) -> Json<Vec<blueprint::Blueprint>> {
    Json(blueprint::load_dir(&state.config.paths.blueprints))
}

/// POST /run/:name - Start a run for one blueprint
///
/// Returns 202 once the run is spawned; 404 for an unknown blueprint; 409
/// when a run for this blueprint is already in flight.
pub async fn trigger_run(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<(StatusCode, Json<StatusResponse>), (StatusCode, Json<StatusResponse>)> {
    let blueprint = blueprint::find_by_name(&state.config.paths.blueprints, &name)
        .map_err(|e| (StatusCode::NOT_FOUND, StatusResponse::new(e.to_string())))?;

    if state.guard.is_running(&name) {
        return Err((
            StatusCode::CONFLICT,
            StatusResponse::new(format!("a run for {name} is already in flight")),
        ));
    }

    let config = Arc::clone(&state.config);
    let guard = state.guard.clone();
    tokio::spawn(async move {
        if let Err(e) = runner::run_blueprint(&config, &guard, &blueprint).await {
            tracing::error!(playlist = %blueprint.name, error = %e, "run failed");
        }
    });

    Ok((StatusCode::ACCEPTED, StatusResponse::new("started")))
}

/// GET /report/:name - Latest run report for a blueprint
pub async fn latest_report(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<RunReport>, (StatusCode, Json<StatusResponse>)> {
    match crate::report::latest(&state.config.paths, &name) {
        Ok(Some(report)) => Ok(Json(report)),
        Ok(None) => Err((
            StatusCode::NOT_FOUND,
            StatusResponse::new(format!("no report for {name}")),
        )),
        Err(e) => {
            tracing::error!(playlist = %name, error = %e, "report lookup failed");
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                StatusResponse::new(e.to_string()),
            ))
        }
    }
}

/// Build the router with all routes.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/blueprints", get(list_blueprints))
        .route("/run/:name", post(trigger_run))
        .route("/report/:name", get(latest_report))
        .with_state(state)
}

/// Run the HTTP API until ctrl-c.
pub async fn run(config: Arc<Config>, guard: RunGuard) -> anyhow::Result<()> {
    let bind = config.server.bind.clone();
    let app = router(AppState { config, guard });

    let listener = tokio::net::TcpListener::bind(&bind).await?;
    tracing::info!(addr = %bind, "HTTP API listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("shutdown signal received");
        })
        .await?;

    Ok(())
}
