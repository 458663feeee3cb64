//! Report structures built from the ledger

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{ProcessingStatus, TransactionFlag};

/// Package variant key within a catalog group
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PackageSignature {
    pub package_form: String,
    pub inner_qty: Decimal,
    pub unit_name: String,
}

/// One emitted ledger line
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerLine {
    pub id: i64,
    pub transaction_date: String,
    pub product_code: String,
    pub product_name: String,
    pub receipt_number: String,
    pub flag: TransactionFlag,
    pub quantity: Decimal,
    /// Quantity with the flag's sign; zero for checkpoints
    pub signed_quantity: Decimal,
    /// Sub-group balance after this line
    pub running_balance: Decimal,
    pub processing_status: ProcessingStatus,
}

/// Ledger for one package variant
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PackageLedger {
    pub signature: PackageSignature,
    pub product_codes: Vec<String>,
    pub lines: Vec<LedgerLine>,
    pub ending_balance: Decimal,
    /// Catalog-unit quantity in one package
    pub pack_qty_catalog_unit: Decimal,
    /// Reference price per catalog unit
    pub reference_price: Decimal,
    /// Purchase price per catalog unit
    pub unit_purchase_price: Decimal,
    /// Last date with a dispense movement, if any
    pub last_dispensed: Option<String>,
}

/// Ledger for one catalog group
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerGroup {
    pub catalog_group_code: String,
    pub product_name: String,
    pub kana_name: String,
    pub usage_class: String,
    pub has_authoritative_master: bool,
    pub packages: Vec<PackageLedger>,
    pub ending_balance: Decimal,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LedgerReport {
    pub groups: Vec<LedgerGroup>,
}

/// Dead-stock candidate row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeadStockItem {
    pub catalog_group_code: String,
    pub product_name: String,
    pub kana_name: String,
    pub usage_class: String,
    pub ending_balance: Decimal,
    pub last_dispensed: Option<String>,
}

/// Valuation of one package variant
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValuationLine {
    pub package_form: String,
    pub inner_qty: Decimal,
    pub unit_name: String,
    pub ending_balance: Decimal,
    pub reference_price: Decimal,
    pub unit_purchase_price: Decimal,
    pub reference_value: Decimal,
    pub purchase_value: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValuationGroup {
    pub catalog_group_code: String,
    pub product_name: String,
    pub usage_class: String,
    pub needs_verification: bool,
    pub lines: Vec<ValuationLine>,
    pub reference_value: Decimal,
    pub purchase_value: Decimal,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ValuationReport {
    pub groups: Vec<ValuationGroup>,
    pub total_reference_value: Decimal,
    pub total_purchase_value: Decimal,
}

/// Flat valuation row for CSV export
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValuationCsvRow {
    pub catalog_group_code: String,
    pub product_name: String,
    pub package_form: String,
    pub inner_qty: Decimal,
    pub unit_name: String,
    pub ending_balance: Decimal,
    pub reference_value: Decimal,
    pub purchase_value: Decimal,
    pub needs_verification: bool,
}

/// Package variant whose stock is compared against its reorder point
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockLevelItem {
    pub catalog_group_code: String,
    pub product_name: String,
    pub package_form: String,
    pub inner_qty: Decimal,
    pub unit_name: String,
    pub product_codes: Vec<String>,
    pub ending_balance: Decimal,
    pub reorder_point: Decimal,
    /// Whole packages: surplus for return candidates, shortfall for reorders
    pub packages: Decimal,
}
