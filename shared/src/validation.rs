//! Validation utilities for the Pharmacy Inventory Platform
//!
//! Covers the input boundary of the record processors and the operator
//! surfaces: ledger dates, product codes and lenient numeric parsing.

use std::str::FromStr;

use chrono::{Duration, NaiveDate};
use rust_decimal::Decimal;

/// Storage format of ledger dates
pub const LEDGER_DATE_FORMAT: &str = "%Y%m%d";

// ============================================================================
// Ledger Dates
// ============================================================================

/// Validate a `YYYYMMDD` ledger date
pub fn validate_ledger_date(date: &str) -> Result<(), &'static str> {
    if date.len() != 8 || !date.chars().all(|c| c.is_ascii_digit()) {
        return Err("Date must be 8 digits (YYYYMMDD)");
    }
    NaiveDate::parse_from_str(date, LEDGER_DATE_FORMAT)
        .map(|_| ())
        .map_err(|_| "Date is not a valid calendar day")
}

/// Format a calendar date as a ledger date
pub fn to_ledger_date(date: NaiveDate) -> String {
    date.format(LEDGER_DATE_FORMAT).to_string()
}

/// Ledger date `days` before `today`
pub fn ledger_date_days_before(today: NaiveDate, days: u32) -> String {
    to_ledger_date(today - Duration::days(i64::from(days)))
}

// ============================================================================
// Product Codes
// ============================================================================

/// Validate a product code typed by an operator (JAN-13 or an internal
/// alphanumeric code of up to 20 characters)
pub fn validate_product_code(code: &str) -> Result<(), &'static str> {
    let code = code.trim();
    if code.is_empty() {
        return Err("Product code must not be empty");
    }
    if code.len() > 20 {
        return Err("Product code must be at most 20 characters");
    }
    if !code.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err("Product code must be alphanumeric");
    }
    Ok(())
}

// ============================================================================
// Numeric Fields
// ============================================================================

/// Parse a numeric input field, treating blanks and malformed values as
/// zero. Thousands separators are accepted.
pub fn parse_decimal_or_zero(raw: &str) -> Decimal {
    let cleaned: String = raw.trim().chars().filter(|c| *c != ',').collect();
    if cleaned.is_empty() {
        return Decimal::ZERO;
    }
    Decimal::from_str(&cleaned).unwrap_or(Decimal::ZERO)
}

/// Validate that a package ratio is not negative
pub fn validate_package_ratio(ratio: Decimal) -> Result<(), &'static str> {
    if ratio < Decimal::ZERO {
        return Err("Package quantity cannot be negative");
    }
    Ok(())
}
