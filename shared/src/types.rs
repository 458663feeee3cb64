//! Common types used across the platform

use serde::{Deserialize, Serialize};

/// Lowest priority, used for classification codes outside the table
pub const FALLBACK_USAGE_PRIORITY: u8 = 7;

/// Dispensing category of a product, ordered by pharmacy convention
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UsageClass {
    Internal,
    External,
    Dental,
    Injection,
    Device,
    Other,
    Unclassified,
}

impl UsageClass {
    /// Map a stored classification code. Both the numeric codes and the
    /// single-character catalog labels are accepted.
    pub fn from_code(code: &str) -> Self {
        match code.trim() {
            "1" | "内" => UsageClass::Internal,
            "2" | "外" => UsageClass::External,
            "3" | "歯" => UsageClass::Dental,
            "4" | "注" => UsageClass::Injection,
            "5" | "機" => UsageClass::Device,
            "6" | "他" => UsageClass::Other,
            _ => UsageClass::Unclassified,
        }
    }

    pub fn priority(&self) -> u8 {
        match self {
            UsageClass::Internal => 1,
            UsageClass::External => 2,
            UsageClass::Dental => 3,
            UsageClass::Injection => 4,
            UsageClass::Device => 5,
            UsageClass::Other => 6,
            UsageClass::Unclassified => FALLBACK_USAGE_PRIORITY,
        }
    }
}

/// Sort priority for a raw classification code
pub fn usage_priority(code: &str) -> u8 {
    UsageClass::from_code(code).priority()
}

/// Regulatory drug categories used by ledger filters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DrugType {
    Narcotic,
    Psychotropic,
    Poison,
    Deleterious,
}

impl DrugType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DrugType::Narcotic => "narcotic",
            DrugType::Psychotropic => "psychotropic",
            DrugType::Poison => "poison",
            DrugType::Deleterious => "deleterious",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim() {
            "narcotic" => Some(DrugType::Narcotic),
            "psychotropic" => Some(DrugType::Psychotropic),
            "poison" => Some(DrugType::Poison),
            "deleterious" => Some(DrugType::Deleterious),
            _ => None,
        }
    }
}
