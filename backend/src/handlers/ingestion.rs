//! Ingestion handlers for parsed delivery, usage and inventory files

use axum::{extract::State, Json};
use serde::Deserialize;

use crate::error::AppResult;
use crate::models::{dedup_records, IngestSummary, InputKind, UnifiedInputRecord};
use crate::services::reprocess::ReprocessSummary;
use crate::services::{IngestionService, ReprocessService};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct IngestRequest {
    pub records: Vec<UnifiedInputRecord>,
}

async fn ingest(state: AppState, kind: InputKind, request: IngestRequest) -> AppResult<Json<IngestSummary>> {
    let received = request.records.len();
    let records = dedup_records(kind, request.records);
    if records.len() < received {
        tracing::debug!(
            kind = kind.as_str(),
            dropped = received - records.len(),
            "duplicate lines dropped"
        );
    }

    let service = IngestionService::new(state.db);
    let mut summary = service.ingest(kind, records).await?;
    summary.received = received;
    Ok(Json(summary))
}

/// Ingest delivery slip lines (returns carry `is_return`)
pub async fn ingest_deliveries(
    State(state): State<AppState>,
    Json(request): Json<IngestRequest>,
) -> AppResult<Json<IngestSummary>> {
    ingest(state, InputKind::Delivery, request).await
}

/// Ingest dispensing lines
pub async fn ingest_usages(
    State(state): State<AppState>,
    Json(request): Json<IngestRequest>,
) -> AppResult<Json<IngestSummary>> {
    ingest(state, InputKind::Usage, request).await
}

/// Ingest physical count lines
pub async fn ingest_inventories(
    State(state): State<AppState>,
    Json(request): Json<IngestRequest>,
) -> AppResult<Json<IngestSummary>> {
    ingest(state, InputKind::Inventory, request).await
}

/// Run the reprocessing sweep over provisional rows
pub async fn reprocess(State(state): State<AppState>) -> AppResult<Json<ReprocessSummary>> {
    let service = ReprocessService::new(state.db);
    let summary = service.run().await?;
    Ok(Json(summary))
}
