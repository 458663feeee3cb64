//! Route definitions for the Pharmacy Inventory Platform

use axum::{
    routing::{delete, get, post},
    Router,
};

use crate::{handlers, AppState};

/// Create API routes
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(handlers::health_check))
        // File ingestion and the reprocessing sweep
        .nest("/ingest", ingest_routes())
        .route("/reprocess", post(handlers::reprocess))
        // Theoretical stock
        .route("/stock", get(handlers::list_stock))
        .route("/stock/:product_code", get(handlers::get_stock))
        // Ledger and derived reports
        .route("/ledger", get(handlers::get_ledger))
        .nest("/reports", report_routes())
        // Master catalog
        .nest("/masters", master_routes())
        // Operator deletions
        .nest("/transactions", transaction_routes())
        .route("/sequences/:name/reset", post(handlers::reset_sequence))
}

fn ingest_routes() -> Router<AppState> {
    Router::new()
        .route("/deliveries", post(handlers::ingest_deliveries))
        .route("/usages", post(handlers::ingest_usages))
        .route("/inventories", post(handlers::ingest_inventories))
}

fn report_routes() -> Router<AppState> {
    Router::new()
        .route("/dead-stock", get(handlers::get_dead_stock))
        .route("/valuation", get(handlers::get_valuation))
        .route("/return-candidates", get(handlers::get_return_candidates))
        .route("/reorder", get(handlers::get_reorder_list))
}

fn master_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(handlers::create_master))
        .route(
            "/cleanup",
            get(handlers::list_cleanup_candidates).post(handlers::delete_idle_masters),
        )
        .route("/:product_code", get(handlers::get_master))
}

fn transaction_routes() -> Router<AppState> {
    Router::new()
        .route("/", delete(handlers::delete_by_date_and_flag))
        .route("/receipt/:receipt_number", delete(handlers::delete_by_receipt))
        .route("/:id", delete(handlers::delete_transaction))
}
