//! Product master models

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::DrugType;

/// Where a master came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Origin {
    /// Imported from the reference catalog
    Authoritative,
    /// Synthesized during ingestion with no reference match
    Provisional,
    /// Entered by an operator
    Manual,
}

impl Origin {
    /// Tag persisted in `product_master.origin`
    pub fn as_tag(&self) -> &'static str {
        match self {
            Origin::Authoritative => "JCSHMS",
            Origin::Provisional => "PROVISIONAL",
            Origin::Manual => "MANUAL",
        }
    }

    /// Any tag other than the two reserved ones is an operator entry
    pub fn from_tag(tag: &str) -> Self {
        match tag.trim() {
            "JCSHMS" => Origin::Authoritative,
            "PROVISIONAL" => Origin::Provisional,
            _ => Origin::Manual,
        }
    }

    pub fn is_authoritative(&self) -> bool {
        matches!(self, Origin::Authoritative)
    }
}

/// Canonical catalog entry, one per product code
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductMaster {
    pub product_code: String,
    pub catalog_group_code: String,
    pub product_name: String,
    pub kana_name: String,
    pub maker_name: String,
    pub package_form: String,
    pub package_spec: String,
    pub usage_class: String,
    /// Catalog-unit quantity in one package
    pub pack_qty_catalog_unit: Decimal,
    /// Product-unit quantity in one package
    pub pack_qty_product_unit: Decimal,
    pub catalog_unit_code: String,
    pub catalog_unit_name: String,
    pub product_unit_code: String,
    pub product_unit_name: String,
    /// Reference price per catalog unit
    pub reference_price: Decimal,
    /// Purchase price per package
    pub purchase_price: Decimal,
    pub is_narcotic: bool,
    pub is_psychotropic: bool,
    pub is_poison: bool,
    pub is_deleterious: bool,
    pub origin: Origin,
}

impl ProductMaster {
    /// Placeholder master for an item with no reference match; the display
    /// name is kept exactly as it arrived
    pub fn provisional(product_code: String, catalog_group_code: String, product_name: &str) -> Self {
        Self {
            product_code,
            catalog_group_code,
            product_name: product_name.to_string(),
            kana_name: String::new(),
            maker_name: String::new(),
            package_form: String::new(),
            package_spec: String::new(),
            usage_class: String::new(),
            pack_qty_catalog_unit: Decimal::ZERO,
            pack_qty_product_unit: Decimal::ZERO,
            catalog_unit_code: String::new(),
            catalog_unit_name: String::new(),
            product_unit_code: String::new(),
            product_unit_name: String::new(),
            reference_price: Decimal::ZERO,
            purchase_price: Decimal::ZERO,
            is_narcotic: false,
            is_psychotropic: false,
            is_poison: false,
            is_deleterious: false,
            origin: Origin::Provisional,
        }
    }

    pub fn has_drug_type(&self, drug_type: DrugType) -> bool {
        match drug_type {
            DrugType::Narcotic => self.is_narcotic,
            DrugType::Psychotropic => self.is_psychotropic,
            DrugType::Poison => self.is_poison,
            DrugType::Deleterious => self.is_deleterious,
        }
    }

    /// Purchase price of one catalog unit.
    ///
    /// Always divides by the catalog-unit ratio, since balances are kept in
    /// catalog units. Zero when the ratio is unknown.
    pub fn unit_purchase_price(&self) -> Decimal {
        if self.pack_qty_catalog_unit.is_zero() {
            Decimal::ZERO
        } else {
            self.purchase_price / self.pack_qty_catalog_unit
        }
    }
}

/// Filter for selecting masters into a ledger
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MasterFilter {
    /// Case-insensitive substring of product or kana name
    pub name_contains: Option<String>,
    /// Any-of match; empty means no restriction
    #[serde(default)]
    pub drug_types: Vec<DrugType>,
}

impl MasterFilter {
    pub fn matches(&self, master: &ProductMaster) -> bool {
        if let Some(needle) = self.name_contains.as_deref().map(str::trim) {
            if !needle.is_empty() {
                let needle = needle.to_lowercase();
                let hit = master.product_name.to_lowercase().contains(&needle)
                    || master.kana_name.to_lowercase().contains(&needle);
                if !hit {
                    return false;
                }
            }
        }
        self.drug_types.is_empty() || self.drug_types.iter().any(|t| master.has_drug_type(*t))
    }
}
