//! Resolution keys and sequence code formatting

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};

/// Reserved prefix for name-based product codes.
///
/// Thirteen nines never appears as a prefix of a real JAN code that
/// carries a trailing name, so the storage form stays unambiguous.
pub const SYNTHETIC_PREFIX: &str = "9999999999999";

/// Key used to look up or create a product master.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum ResolutionKey {
    /// A usable product code
    ByCode(String),
    /// No usable code; keyed by the display name
    ByName(String),
}

impl ResolutionKey {
    /// Build the key for an incoming line item.
    ///
    /// An incoming code is always taken as a real code, even when it
    /// happens to start with [`SYNTHETIC_PREFIX`]. Returns `None` when the
    /// code is empty or the all-zero sentinel and the name is blank.
    pub fn for_item(product_code: &str, display_name: &str) -> Option<Self> {
        let code = product_code.trim();
        if !is_missing_code(code) {
            return Some(ResolutionKey::ByCode(code.to_string()));
        }
        let name = display_name.trim();
        if name.is_empty() {
            None
        } else {
            Some(ResolutionKey::ByName(name.to_string()))
        }
    }

    /// Parse a product code as stored in `product_master` or on a ledger row.
    /// Only stored codes may carry the synthetic prefix.
    pub fn from_storage_code(code: &str) -> Self {
        match code.strip_prefix(SYNTHETIC_PREFIX) {
            Some(name) if !name.is_empty() => ResolutionKey::ByName(name.to_string()),
            _ => ResolutionKey::ByCode(code.to_string()),
        }
    }

    /// Product code written to the store for this key
    pub fn storage_code(&self) -> String {
        match self {
            ResolutionKey::ByCode(code) => code.clone(),
            ResolutionKey::ByName(name) => format!("{}{}", SYNTHETIC_PREFIX, name),
        }
    }

    pub fn is_synthetic(&self) -> bool {
        matches!(self, ResolutionKey::ByName(_))
    }
}

/// Empty codes and codes made only of zeros carry no identity
pub fn is_missing_code(code: &str) -> bool {
    code.is_empty() || code.chars().all(|c| c == '0')
}

/// Format an issued sequence number: prefix plus zero-padded value
pub fn format_sequence_code(prefix: &str, value: i64, padding: usize) -> String {
    format!("{}{:0width$}", prefix, value, width = padding)
}

/// Value a sequence issues next, given its locked `last_no` row.
/// A missing row is `NotFound`; sequences are never created on demand.
pub fn next_sequence_value(name: &str, last_no: Option<i64>) -> CoreResult<i64> {
    last_no
        .map(|n| n + 1)
        .ok_or_else(|| CoreError::NotFound(format!("sequence {}", name)))
}

/// Largest numeric suffix among codes that start with `prefix`.
///
/// Codes whose remainder is not purely numeric are ignored. Returns 0
/// when nothing matches.
pub fn max_numeric_suffix<'a, I>(codes: I, prefix: &str) -> i64
where
    I: IntoIterator<Item = &'a str>,
{
    codes
        .into_iter()
        .filter_map(|code| code.strip_prefix(prefix))
        .filter(|rest| !rest.is_empty() && rest.chars().all(|c| c.is_ascii_digit()))
        .filter_map(|rest| rest.parse::<i64>().ok())
        .max()
        .unwrap_or(0)
}
