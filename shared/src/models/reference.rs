//! Reference catalog entries (read-only national drug master import)

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{Origin, ProductMaster};

/// One row of the reference catalog
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReferenceEntry {
    pub product_code: String,
    pub product_name: String,
    pub kana_name: String,
    pub maker_name: String,
    /// Empty when the catalog carries no group code
    pub catalog_group_code: String,
    pub package_form: String,
    pub package_spec: String,
    pub usage_class: String,
    pub pack_qty_catalog_unit: Decimal,
    pub pack_qty_product_unit: Decimal,
    pub catalog_unit_code: String,
    pub catalog_unit_name: String,
    pub product_unit_code: String,
    pub product_unit_name: String,
    pub reference_price: Decimal,
    pub purchase_price: Decimal,
    pub is_narcotic: bool,
    pub is_psychotropic: bool,
    pub is_poison: bool,
    pub is_deleterious: bool,
}

impl ReferenceEntry {
    /// Entries without a display name are not usable for resolution
    pub fn is_usable(&self) -> bool {
        !self.product_name.trim().is_empty()
    }

    pub fn has_catalog_group(&self) -> bool {
        !self.catalog_group_code.trim().is_empty()
    }

    /// Build an authoritative master from this entry
    pub fn to_master(&self, catalog_group_code: String) -> ProductMaster {
        ProductMaster {
            product_code: self.product_code.clone(),
            catalog_group_code,
            product_name: self.product_name.clone(),
            kana_name: self.kana_name.clone(),
            maker_name: self.maker_name.clone(),
            package_form: self.package_form.clone(),
            package_spec: self.package_spec.clone(),
            usage_class: self.usage_class.clone(),
            pack_qty_catalog_unit: self.pack_qty_catalog_unit,
            pack_qty_product_unit: self.pack_qty_product_unit,
            catalog_unit_code: self.catalog_unit_code.clone(),
            catalog_unit_name: self.catalog_unit_name.clone(),
            product_unit_code: self.product_unit_code.clone(),
            product_unit_name: self.product_unit_name.clone(),
            reference_price: self.reference_price,
            purchase_price: self.purchase_price,
            is_narcotic: self.is_narcotic,
            is_psychotropic: self.is_psychotropic,
            is_poison: self.is_poison,
            is_deleterious: self.is_deleterious,
            origin: Origin::Authoritative,
        }
    }
}
