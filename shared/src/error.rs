//! Error taxonomy for the ledger and resolution core

use thiserror::Error;

/// Errors surfaced by the core to the caller's transaction boundary.
///
/// None of these are retried inside the core; the enclosing batch is
/// rolled back by the caller.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    /// A referenced sequence or master is absent when required
    #[error("Not found: {0}")]
    NotFound(String),

    /// Store error while reading or writing during master resolution
    #[error("Master resolution failed: {0}")]
    ResolutionFailure(String),

    /// Store error while scanning the transaction log
    #[error("Stock calculation failed: {0}")]
    CalculationFailure(String),

    /// Input that cannot produce a resolution key
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// Result type alias for core operations
pub type CoreResult<T> = Result<T, CoreError>;
