//! HTTP handlers

pub mod health;
pub mod ingestion;
pub mod ledger;
pub mod masters;
pub mod sequences;
pub mod stock;
pub mod transactions;

pub use health::health_check;
pub use ingestion::{ingest_deliveries, ingest_inventories, ingest_usages, reprocess};
pub use ledger::{
    get_dead_stock, get_ledger, get_reorder_list, get_return_candidates, get_valuation,
};
pub use masters::{create_master, delete_idle_masters, get_master, list_cleanup_candidates};
pub use sequences::reset_sequence;
pub use stock::{get_stock, list_stock};
pub use transactions::{delete_by_date_and_flag, delete_by_receipt, delete_transaction};
