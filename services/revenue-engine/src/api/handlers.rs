use std::collections::BTreeMap;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use types::ids::PlatformId;
use types::metrics::{ConsolidatedTotals, PlatformMetrics};
use types::transfer::TransferRecord;

use super::error::ApiError;
use super::models::{HealthResponse, HistoryQuery, TransferRequest};
use super::state::AppState;
use crate::engine::Dashboard;

pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let totals = state.engine.ledger().totals().await;
    Json(HealthResponse {
        status: "ok",
        version: crate::SERVICE_VERSION,
        platforms: state.engine.ledger().len().await,
        healthy_platforms: totals.healthy_platforms,
    })
}

pub async fn get_dashboard(State(state): State<AppState>) -> Json<Dashboard> {
    Json(state.engine.dashboard().await)
}

pub async fn list_platforms(
    State(state): State<AppState>,
) -> Json<BTreeMap<PlatformId, PlatformMetrics>> {
    Json(state.engine.ledger().snapshot().await)
}

pub async fn get_platform(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<PlatformMetrics>, ApiError> {
    let found = match PlatformId::try_new(id.as_str()) {
        Some(platform) => state.engine.ledger().get(&platform).await,
        None => None,
    };
    found.map(Json).ok_or(ApiError::NotFound(id))
}

pub async fn trigger_refresh(State(state): State<AppState>) -> Json<ConsolidatedTotals> {
    Json(state.engine.refresh(Utc::now()).await.totals)
}

pub async fn create_transfer(
    State(state): State<AppState>,
    Json(payload): Json<TransferRequest>,
) -> Result<(StatusCode, Json<TransferRecord>), ApiError> {
    let record = state.engine.transfer(payload.amount).await?;
    Ok((StatusCode::CREATED, Json(record)))
}

pub async fn list_transfers(
    State(state): State<AppState>,
    Query(query): Query<HistoryQuery>,
) -> Json<Vec<TransferRecord>> {
    Json(state.engine.history(query.limit).await)
}
