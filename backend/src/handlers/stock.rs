//! Stock balance handlers

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;

use crate::error::{AppError, AppResult};
use crate::services::stock::StockBalance;
use crate::services::StockService;
use crate::AppState;
use shared::validate_ledger_date;

#[derive(Debug, Deserialize)]
pub struct StockQuery {
    /// `YYYYMMDD`; omitted means the current balance
    pub as_of: Option<String>,
}

/// Current balance of every product with ledger rows
pub async fn list_stock(State(state): State<AppState>) -> AppResult<Json<Vec<StockBalance>>> {
    let service = StockService::new(state.db);
    let balances = service.all_balances().await?;
    Ok(Json(balances))
}

/// Balance of one product
pub async fn get_stock(
    State(state): State<AppState>,
    Path(product_code): Path<String>,
    Query(query): Query<StockQuery>,
) -> AppResult<Json<StockBalance>> {
    if let Some(date) = query.as_of.as_deref() {
        validate_ledger_date(date).map_err(|m| AppError::validation("as_of", m))?;
    }

    let service = StockService::new(state.db);
    let balance = service
        .balance_as_of(&product_code, query.as_of.as_deref())
        .await?;
    Ok(Json(balance))
}
