//! Ledger and report handlers, with CSV export where rows are flat

use axum::{
    extract::{Query, State},
    http::header,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::error::AppResult;
use crate::models::{LedgerReport, StockLevelItem};
use crate::services::ledger::{ExportFormat, LedgerQuery};
use crate::services::LedgerService;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct ReportQuery {
    #[serde(flatten)]
    pub ledger: LedgerQuery,
    #[serde(default)]
    pub format: ExportFormat,
}

fn service(state: AppState) -> LedgerService {
    LedgerService::new(state.db, state.config.reports.clone())
}

fn csv_response<T: Serialize>(rows: &[T], filename: &str) -> AppResult<Response> {
    let csv = LedgerService::export_to_csv(rows)?;
    Ok((
        [
            (header::CONTENT_TYPE, "text/csv".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", filename),
            ),
        ],
        csv,
    )
        .into_response())
}

/// Get the grouped ledger
pub async fn get_ledger(
    State(state): State<AppState>,
    Query(query): Query<LedgerQuery>,
) -> AppResult<Json<LedgerReport>> {
    let report = service(state).ledger(&query).await?;
    Ok(Json(report))
}

/// Get the dead stock report
pub async fn get_dead_stock(
    State(state): State<AppState>,
    Query(query): Query<ReportQuery>,
) -> AppResult<Response> {
    let items = service(state).dead_stock(&query.ledger).await?;

    match query.format {
        ExportFormat::Csv => csv_response(&items, "dead_stock.csv"),
        ExportFormat::Json => Ok(Json(items).into_response()),
    }
}

/// Get the stock valuation report
pub async fn get_valuation(
    State(state): State<AppState>,
    Query(query): Query<ReportQuery>,
) -> AppResult<Response> {
    let service = service(state);

    match query.format {
        ExportFormat::Csv => {
            let rows = service.valuation_rows(&query.ledger).await?;
            csv_response(&rows, "valuation.csv")
        }
        ExportFormat::Json => {
            let report = service.valuation(&query.ledger).await?;
            Ok(Json(report).into_response())
        }
    }
}

/// Get package variants that are candidates for return
pub async fn get_return_candidates(
    State(state): State<AppState>,
    Query(query): Query<LedgerQuery>,
) -> AppResult<Json<Vec<StockLevelItem>>> {
    let items = service(state).return_candidates(&query).await?;
    Ok(Json(items))
}

/// Get package variants below their reorder point
pub async fn get_reorder_list(
    State(state): State<AppState>,
    Query(query): Query<LedgerQuery>,
) -> AppResult<Json<Vec<StockLevelItem>>> {
    let items = service(state).reorder_list(&query).await?;
    Ok(Json(items))
}
