//! Ledger transaction models

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Movement kind of a ledger row.
///
/// The numeric codes are the persisted values; anything outside the known
/// set is carried as `Other` and contributes nothing to a balance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "i16", from = "i16")]
pub enum TransactionFlag {
    /// Physical count
    Checkpoint,
    Delivery,
    /// Returned to the wholesaler
    Return,
    Dispense,
    AdjustIn,
    AdjustOut,
    ManualIn,
    ManualOut,
    Other(i16),
}

impl TransactionFlag {
    pub fn from_code(code: i16) -> Self {
        match code {
            0 => TransactionFlag::Checkpoint,
            1 => TransactionFlag::Delivery,
            2 => TransactionFlag::Return,
            3 => TransactionFlag::Dispense,
            4 => TransactionFlag::AdjustIn,
            5 => TransactionFlag::AdjustOut,
            11 => TransactionFlag::ManualIn,
            12 => TransactionFlag::ManualOut,
            other => TransactionFlag::Other(other),
        }
    }

    pub fn code(&self) -> i16 {
        match self {
            TransactionFlag::Checkpoint => 0,
            TransactionFlag::Delivery => 1,
            TransactionFlag::Return => 2,
            TransactionFlag::Dispense => 3,
            TransactionFlag::AdjustIn => 4,
            TransactionFlag::AdjustOut => 5,
            TransactionFlag::ManualIn => 11,
            TransactionFlag::ManualOut => 12,
            TransactionFlag::Other(code) => *code,
        }
    }

    /// Multiplier applied to a movement's quantity in balance math.
    /// Checkpoints are not signed; they reset the base instead.
    pub fn sign(&self) -> i32 {
        match self {
            TransactionFlag::Delivery | TransactionFlag::AdjustIn | TransactionFlag::ManualIn => 1,
            TransactionFlag::Return
            | TransactionFlag::Dispense
            | TransactionFlag::AdjustOut
            | TransactionFlag::ManualOut => -1,
            TransactionFlag::Checkpoint | TransactionFlag::Other(_) => 0,
        }
    }

    pub fn is_checkpoint(&self) -> bool {
        matches!(self, TransactionFlag::Checkpoint)
    }

    /// Quantity with the flag's sign applied
    pub fn signed(&self, quantity: Decimal) -> Decimal {
        quantity * Decimal::from(self.sign())
    }
}

impl From<i16> for TransactionFlag {
    fn from(code: i16) -> Self {
        TransactionFlag::from_code(code)
    }
}

impl From<TransactionFlag> for i16 {
    fn from(flag: TransactionFlag) -> Self {
        flag.code()
    }
}

/// Provenance of a ledger row: whether it was resolved against an
/// authoritative master at ingest time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProcessingStatus {
    Completed,
    Provisional,
}

impl ProcessingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProcessingStatus::Completed => "completed",
            ProcessingStatus::Provisional => "provisional",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "completed" => Some(ProcessingStatus::Completed),
            "provisional" => Some(ProcessingStatus::Provisional),
            _ => None,
        }
    }
}

/// Anything the balance math can fold
pub trait StockEntry {
    fn product_code(&self) -> &str;
    /// Sortable `YYYYMMDD` date
    fn date(&self) -> &str;
    fn flag(&self) -> TransactionFlag;
    /// Quantity in the catalog's canonical unit
    fn quantity(&self) -> Decimal;
}

/// Slim projection of a ledger row used by the stock calculators
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockMovement {
    pub id: i64,
    pub product_code: String,
    pub transaction_date: String,
    pub flag: TransactionFlag,
    pub quantity: Decimal,
}

impl StockEntry for StockMovement {
    fn product_code(&self) -> &str {
        &self.product_code
    }

    fn date(&self) -> &str {
        &self.transaction_date
    }

    fn flag(&self) -> TransactionFlag {
        self.flag
    }

    fn quantity(&self) -> Decimal {
        self.quantity
    }
}

/// A persisted ledger row
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionRecord {
    /// Monotonic sequence id; orders rows sharing a date
    pub id: i64,
    pub transaction_date: String,
    pub receipt_number: String,
    pub client_code: String,
    pub product_code: String,
    pub catalog_group_code: String,
    pub product_name: String,
    pub kana_name: String,
    pub package_form: String,
    pub package_spec: String,
    pub usage_class: String,
    pub flag: TransactionFlag,
    /// Quantity as it arrived (packages for deliveries)
    pub quantity: Decimal,
    pub quantity_in_catalog_unit: Decimal,
    pub quantity_in_product_unit: Decimal,
    /// Catalog-unit quantity per package at ingest time
    pub package_ratio: Decimal,
    pub catalog_unit_name: String,
    pub unit_price: Decimal,
    pub subtotal: Decimal,
    pub reference_price: Decimal,
    pub processing_status: ProcessingStatus,
    pub created_at: DateTime<Utc>,
}

impl StockEntry for TransactionRecord {
    fn product_code(&self) -> &str {
        &self.product_code
    }

    fn date(&self) -> &str {
        &self.transaction_date
    }

    fn flag(&self) -> TransactionFlag {
        self.flag
    }

    fn quantity(&self) -> Decimal {
        self.quantity_in_catalog_unit
    }
}

/// A ledger row ready to be inserted
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewTransaction {
    pub transaction_date: String,
    pub receipt_number: String,
    pub client_code: String,
    pub product_code: String,
    pub catalog_group_code: String,
    pub product_name: String,
    pub kana_name: String,
    pub package_form: String,
    pub package_spec: String,
    pub usage_class: String,
    pub flag: TransactionFlag,
    pub quantity: Decimal,
    pub quantity_in_catalog_unit: Decimal,
    pub quantity_in_product_unit: Decimal,
    pub package_ratio: Decimal,
    pub catalog_unit_name: String,
    pub unit_price: Decimal,
    pub subtotal: Decimal,
    pub reference_price: Decimal,
    pub processing_status: ProcessingStatus,
}
