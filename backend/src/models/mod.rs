//! Domain models for the Pharmacy Inventory Platform
//!
//! Re-exports models from the shared crate

pub use shared::models::*;
