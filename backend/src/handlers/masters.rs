//! Product master handlers

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;

use crate::error::AppResult;
use crate::models::ProductMaster;
use crate::services::master::{CleanupCandidate, CleanupResult, CreateMasterInput};
use crate::services::MasterService;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct CleanupQuery {
    /// Overrides the configured idle period
    pub idle_days: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct CleanupRequest {
    pub product_codes: Vec<String>,
    pub idle_days: Option<u32>,
}

/// Get a product master
pub async fn get_master(
    State(state): State<AppState>,
    Path(product_code): Path<String>,
) -> AppResult<Json<ProductMaster>> {
    let service = MasterService::new(state.db);
    let master = service.get(&product_code).await?;
    Ok(Json(master))
}

/// Create an operator-entered master
pub async fn create_master(
    State(state): State<AppState>,
    Json(input): Json<CreateMasterInput>,
) -> AppResult<(StatusCode, Json<ProductMaster>)> {
    let service = MasterService::new(state.db);
    let master = service.create_manual(input).await?;
    Ok((StatusCode::CREATED, Json(master)))
}

/// List masters eligible for cleanup
pub async fn list_cleanup_candidates(
    State(state): State<AppState>,
    Query(query): Query<CleanupQuery>,
) -> AppResult<Json<Vec<CleanupCandidate>>> {
    let idle_days = query.idle_days.unwrap_or(state.config.cleanup.idle_days);
    let service = MasterService::new(state.db);
    let candidates = service.cleanup_candidates(idle_days).await?;
    Ok(Json(candidates))
}

/// Delete the selected masters that still qualify for cleanup
pub async fn delete_idle_masters(
    State(state): State<AppState>,
    Json(request): Json<CleanupRequest>,
) -> AppResult<Json<CleanupResult>> {
    let idle_days = request.idle_days.unwrap_or(state.config.cleanup.idle_days);
    let service = MasterService::new(state.db);
    let result = service.delete_idle(request.product_codes, idle_days).await?;
    Ok(Json(result))
}
