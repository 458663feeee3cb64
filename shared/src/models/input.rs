//! Unified input records produced by the file parsers

use serde::{Deserialize, Serialize};

/// Which kind of file a batch came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InputKind {
    Delivery,
    Usage,
    Inventory,
}

impl InputKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            InputKind::Delivery => "delivery",
            InputKind::Usage => "usage",
            InputKind::Inventory => "inventory",
        }
    }
}

/// One parsed line item.
///
/// Numeric fields arrive as raw text; the record processors parse them
/// and fall back to zero on malformed values.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnifiedInputRecord {
    /// `YYYYMMDD`
    pub date: String,
    #[serde(default)]
    pub product_code: String,
    #[serde(default)]
    pub product_name: String,
    #[serde(default)]
    pub quantity: String,
    #[serde(default)]
    pub unit_price: String,
    #[serde(default)]
    pub subtotal: String,
    #[serde(default)]
    pub receipt_number: String,
    #[serde(default)]
    pub client_code: String,
    /// Delivery slips mark returns to the wholesaler
    #[serde(default)]
    pub is_return: bool,
}

impl UnifiedInputRecord {
    /// Key the ingestion glue uses to drop duplicate lines of one kind
    pub fn dedup_key(&self, kind: InputKind) -> String {
        match kind {
            InputKind::Delivery => format!(
                "{}|{}|{}|{}|{}",
                self.receipt_number, self.product_code, self.product_name, self.quantity, self.is_return
            ),
            InputKind::Usage => format!(
                "{}|{}|{}|{}",
                self.date, self.product_code, self.product_name, self.quantity
            ),
            InputKind::Inventory => {
                format!("{}|{}|{}", self.date, self.product_code, self.product_name)
            }
        }
    }
}

/// Keep the first record for each dedup key, preserving order
pub fn dedup_records(kind: InputKind, records: Vec<UnifiedInputRecord>) -> Vec<UnifiedInputRecord> {
    let mut seen = std::collections::HashSet::new();
    records
        .into_iter()
        .filter(|r| seen.insert(r.dedup_key(kind)))
        .collect()
}

/// Outcome of one ingestion batch
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngestSummary {
    pub received: usize,
    pub inserted: usize,
    pub skipped: usize,
    pub provisional: usize,
    pub masters_created: usize,
}
