use std::{net::SocketAddr, sync::Arc};

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use shared::{
    domain::{ResolutionId, Subcommittee},
    error::{ApiError, ErrorCode},
    protocol::{
        AssignmentRequest, AssignmentResponse, ResolutionAssignments, ASSIGN_RESOLUTION_ROUTE,
        RESOLUTION_ASSIGNMENTS_ROUTE, SUBCOMMITTEES_ROUTE,
    },
};
use tower_http::limit::RequestBodyLimitLayer;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

mod api;
mod app_state;
mod config;

use api::{assign_resolution, list_subcommittees, resolution_assignments, ApiContext};
use app_state::AppState;
use config::load_settings;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let settings = load_settings();
    info!(
        subcommittees = settings.subcommittees.len(),
        "catalog loaded"
    );
    let state = AppState {
        api: ApiContext::new(settings.subcommittees),
    };
    let app = build_router(Arc::new(state), settings.max_body_bytes);

    let addr: SocketAddr = settings.server_bind.parse()?;
    info!(%addr, "server listening");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

fn build_router(state: Arc<AppState>, max_body_bytes: usize) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route(SUBCOMMITTEES_ROUTE, get(http_list_subcommittees))
        .route(ASSIGN_RESOLUTION_ROUTE, post(http_assign_resolution))
        .route(RESOLUTION_ASSIGNMENTS_ROUTE, get(http_resolution_assignments))
        .layer(RequestBodyLimitLayer::new(max_body_bytes))
        .with_state(state)
}

fn status_for(code: ErrorCode) -> StatusCode {
    match code {
        ErrorCode::NotFound => StatusCode::NOT_FOUND,
        ErrorCode::Validation => StatusCode::BAD_REQUEST,
        ErrorCode::Conflict => StatusCode::CONFLICT,
        ErrorCode::Internal => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

async fn healthz() -> &'static str {
    "ok"
}

async fn http_list_subcommittees(State(state): State<Arc<AppState>>) -> Json<Vec<Subcommittee>> {
    Json(list_subcommittees(&state.api))
}

async fn http_assign_resolution(
    State(state): State<Arc<AppState>>,
    Path(resolution_id): Path<i64>,
    Json(req): Json<AssignmentRequest>,
) -> (StatusCode, Json<AssignmentResponse>) {
    match assign_resolution(&state.api, ResolutionId(resolution_id), req).await {
        Ok(_) => (StatusCode::OK, Json(AssignmentResponse::accepted())),
        Err(err) => {
            warn!(resolution_id, code = ?err.code, message = %err.message, "assignment rejected");
            (status_for(err.code), Json(AssignmentResponse::rejected(err.message)))
        }
    }
}

async fn http_resolution_assignments(
    State(state): State<Arc<AppState>>,
    Path(resolution_id): Path<i64>,
) -> Result<Json<ResolutionAssignments>, (StatusCode, Json<ApiError>)> {
    resolution_assignments(&state.api, ResolutionId(resolution_id))
        .await
        .map(Json)
        .map_err(|e| (status_for(e.code), Json(e)))
}

#[cfg(test)]
#[path = "tests/main_tests.rs"]
mod tests;
