//! Shared types and core algorithms for the Pharmacy Inventory Platform
//!
//! This crate holds the stock ledger and master resolution engine: the
//! domain models, the checkpoint-plus-delta balance math, ledger
//! aggregation, and the resolver that maps incoming line items onto
//! product masters. It has no database dependency; the backend supplies
//! persistence through the [`resolver::MasterStore`] seam.

pub mod error;
pub mod key;
pub mod ledger;
pub mod models;
pub mod processing;
pub mod reports;
pub mod resolver;
pub mod stock;
pub mod types;
pub mod validation;

pub use error::*;
pub use key::*;
pub use models::*;
pub use types::*;
pub use validation::*;
