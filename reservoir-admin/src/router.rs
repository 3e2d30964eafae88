//! The admin HTTP surface: one `axum` handler per route, each
//! delegating straight to the [`AdminState`]'s `ReservoirMap` and
//! translating its result through [`AdminError`].

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json};
use axum::routing::{get, put};
use axum::Router;

use reservoir_core::stats::{FlowStats, ReservoirSnapshot, ReservoirStats, RuntimeStats, Version};

use crate::error::AdminError;
use crate::state::AdminState;

/// Assembles the full admin router over the given state. The caller
/// layers on tracing/CORS middleware and binds a listener.
pub fn build_router(state: AdminState) -> Router {
    Router::new()
        .route("/v1/stats", get(runtime_stats))
        .route("/v1/version", get(version))
        .route("/v1/flows", get(flows))
        .route("/v1/flows/{name}", get(flow).put(start_flow).delete(stop_flow))
        .route("/v1/reservoirs", get(reservoirs))
        .route("/v1/reservoirs/{name}", get(reservoir).put(retrieve_reservoir).delete(dispose_reservoir))
        .with_state(state)
}

async fn runtime_stats(State(state): State<AdminState>) -> Json<RuntimeStats> {
    let reservoir_count = state.reservoirs.reservoir_count().await;
    let running_count = state.reservoirs.running_count().await;
    let task_count = state.reservoirs.task_count().await;
    Json(RuntimeStats::collect(reservoir_count, running_count, task_count))
}

async fn version() -> Json<Version> {
    Json(Version::current())
}

async fn flows(State(state): State<AdminState>) -> Result<Json<FlowStats>, AdminError> {
    let flows = state.reservoirs.get_flows().await?;
    if flows.is_empty() {
        return Err(AdminError::Core(reservoir_core::CoreError::NotFound("<no reservoirs registered>".to_string())));
    }
    Ok(Json(flows))
}

async fn flow(State(state): State<AdminState>, Path(name): Path<String>) -> Result<Json<Vec<String>>, AdminError> {
    let flow = state.reservoirs.get_flow(&name).await?;
    Ok(Json(flow))
}

async fn start_flow(State(state): State<AdminState>, Path(name): Path<String>) -> Result<impl IntoResponse, AdminError> {
    state.reservoirs.start(&name).await?;
    Ok((StatusCode::OK, format!("reservoir '{name}' started")))
}

async fn stop_flow(State(state): State<AdminState>, Path(name): Path<String>) -> Result<impl IntoResponse, AdminError> {
    state.reservoirs.update_final_and_wait(&name).await?;
    Ok((StatusCode::OK, format!("reservoir '{name}' stopped")))
}

async fn reservoirs(State(state): State<AdminState>) -> Result<Json<ReservoirStats>, AdminError> {
    let stats = state.reservoirs.get_reservoirs().await?;
    if stats.is_empty() {
        return Err(AdminError::Core(reservoir_core::CoreError::NotFound("<no reservoirs registered>".to_string())));
    }
    Ok(Json(stats))
}

async fn reservoir(State(state): State<AdminState>, Path(name): Path<String>) -> Result<Json<ReservoirSnapshot>, AdminError> {
    let (stats, stopped, disposed) = state.reservoirs.get_reservoir(&name).await?;
    Ok(Json(ReservoirSnapshot { stats, stopped, disposed }))
}

async fn retrieve_reservoir(State(state): State<AdminState>, Path(name): Path<String>) -> Result<impl IntoResponse, AdminError> {
    state.reservoirs.retrieve(&name).await?;
    Ok((StatusCode::OK, format!("reservoir '{name}' retrieved")))
}

async fn dispose_reservoir(State(state): State<AdminState>, Path(name): Path<String>) -> Result<impl IntoResponse, AdminError> {
    state.reservoirs.dispose(&name).await?;
    Ok((StatusCode::OK, format!("reservoir '{name}' disposed")))
}
