//! Ledger row deletion handlers

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;

use crate::error::{AppError, AppResult};
use crate::models::TransactionFlag;
use crate::services::transactions::DeleteResult;
use crate::services::TransactionService;
use crate::AppState;
use shared::validate_ledger_date;

#[derive(Debug, Deserialize)]
pub struct DateFlagQuery {
    pub date: String,
    pub flag: i16,
}

/// Delete one ledger row
pub async fn delete_transaction(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> AppResult<Json<DeleteResult>> {
    let service = TransactionService::new(state.db);
    let result = service.delete_by_id(id).await?;
    Ok(Json(result))
}

/// Delete every row of a delivery slip
pub async fn delete_by_receipt(
    State(state): State<AppState>,
    Path(receipt_number): Path<String>,
) -> AppResult<Json<DeleteResult>> {
    let service = TransactionService::new(state.db);
    let result = service.delete_by_receipt(&receipt_number).await?;
    Ok(Json(result))
}

/// Delete every row with a given date and flag
pub async fn delete_by_date_and_flag(
    State(state): State<AppState>,
    Query(query): Query<DateFlagQuery>,
) -> AppResult<Json<DeleteResult>> {
    validate_ledger_date(&query.date).map_err(|m| AppError::validation("date", m))?;

    let service = TransactionService::new(state.db);
    let result = service
        .delete_by_date_and_flag(&query.date, TransactionFlag::from_code(query.flag))
        .await?;
    Ok(Json(result))
}
