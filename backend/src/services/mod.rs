//! Business logic services for the Pharmacy Inventory Platform

pub mod ingestion;
pub mod ledger;
pub mod master;
pub mod reprocess;
pub mod sequence;
pub mod stock;
pub mod transactions;

pub use ingestion::IngestionService;
pub use ledger::LedgerService;
pub use master::MasterService;
pub use reprocess::ReprocessService;
pub use sequence::SequenceService;
pub use stock::StockService;
pub use transactions::TransactionService;
