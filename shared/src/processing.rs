//! Record processors: turn a resolved line item into a ledger row

use rust_decimal::Decimal;

use std::collections::{HashMap, HashSet};

use crate::models::{
    InputKind, NewTransaction, ProcessingStatus, ProductMaster, TransactionFlag,
    TransactionRecord, UnifiedInputRecord,
};
use crate::validation::parse_decimal_or_zero;

/// Quantities derived from a raw line quantity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DerivedQuantities {
    pub catalog_unit: Decimal,
    pub product_unit: Decimal,
    pub package_ratio: Decimal,
}

/// Unknown package ratios (zero) count as one unit per package
fn effective_ratio(ratio: Decimal) -> Decimal {
    if ratio > Decimal::ZERO {
        ratio
    } else {
        Decimal::ONE
    }
}

/// Convert a raw quantity using the master's per-package ratios.
///
/// Deliveries count packages; usage and physical counts are already in
/// catalog units.
pub fn derive_quantities(kind: InputKind, quantity: Decimal, master: &ProductMaster) -> DerivedQuantities {
    let catalog_ratio = effective_ratio(master.pack_qty_catalog_unit);
    let product_ratio = effective_ratio(master.pack_qty_product_unit);

    match kind {
        InputKind::Delivery => DerivedQuantities {
            catalog_unit: quantity * catalog_ratio,
            product_unit: quantity * product_ratio,
            package_ratio: master.pack_qty_catalog_unit,
        },
        InputKind::Usage | InputKind::Inventory => DerivedQuantities {
            catalog_unit: quantity,
            product_unit: quantity / catalog_ratio * product_ratio,
            package_ratio: master.pack_qty_catalog_unit,
        },
    }
}

pub fn flag_for(kind: InputKind, record: &UnifiedInputRecord) -> TransactionFlag {
    match kind {
        InputKind::Delivery if record.is_return => TransactionFlag::Return,
        InputKind::Delivery => TransactionFlag::Delivery,
        InputKind::Usage => TransactionFlag::Dispense,
        InputKind::Inventory => TransactionFlag::Checkpoint,
    }
}

/// Rows resolved against an authoritative master are complete; anything
/// else stays provisional for good.
pub fn status_for(master: &ProductMaster) -> ProcessingStatus {
    if master.origin.is_authoritative() {
        ProcessingStatus::Completed
    } else {
        ProcessingStatus::Provisional
    }
}

/// Build the ledger row for one record and its resolved master
pub fn build_transaction(kind: InputKind, record: &UnifiedInputRecord, master: &ProductMaster) -> NewTransaction {
    // Returns may arrive with a negative count; the flag carries the sign.
    let quantity = parse_decimal_or_zero(&record.quantity).abs();
    let derived = derive_quantities(kind, quantity, master);
    let unit_price = parse_decimal_or_zero(&record.unit_price);
    let subtotal = match parse_decimal_or_zero(&record.subtotal) {
        s if s.is_zero() => unit_price * quantity,
        s => s.abs(),
    };

    NewTransaction {
        transaction_date: record.date.trim().to_string(),
        receipt_number: record.receipt_number.trim().to_string(),
        client_code: record.client_code.trim().to_string(),
        product_code: master.product_code.clone(),
        catalog_group_code: master.catalog_group_code.clone(),
        product_name: master.product_name.clone(),
        kana_name: master.kana_name.clone(),
        package_form: master.package_form.clone(),
        package_spec: master.package_spec.clone(),
        usage_class: master.usage_class.clone(),
        flag: flag_for(kind, record),
        quantity,
        quantity_in_catalog_unit: derived.catalog_unit,
        quantity_in_product_unit: derived.product_unit,
        package_ratio: derived.package_ratio,
        catalog_unit_name: master.catalog_unit_name.clone(),
        unit_price,
        subtotal,
        reference_price: master.reference_price,
        processing_status: status_for(master),
    }
}

/// Master-derived fields refreshed on a provisional row by the
/// reprocessing sweep. Flag, quantities and status are not part of it.
#[derive(Debug, Clone, PartialEq)]
pub struct MasterFields {
    pub catalog_group_code: String,
    pub product_name: String,
    pub kana_name: String,
    pub package_form: String,
    pub package_spec: String,
    pub usage_class: String,
    pub package_ratio: Decimal,
    pub catalog_unit_name: String,
    pub reference_price: Decimal,
}

impl From<&ProductMaster> for MasterFields {
    fn from(master: &ProductMaster) -> Self {
        Self {
            catalog_group_code: master.catalog_group_code.clone(),
            product_name: master.product_name.clone(),
            kana_name: master.kana_name.clone(),
            package_form: master.package_form.clone(),
            package_spec: master.package_spec.clone(),
            usage_class: master.usage_class.clone(),
            package_ratio: master.pack_qty_catalog_unit,
            catalog_unit_name: master.catalog_unit_name.clone(),
            reference_price: master.reference_price,
        }
    }
}

impl MasterFields {
    /// Copy the master-derived fields onto a ledger row
    pub fn apply_to(&self, row: &mut TransactionRecord) {
        row.catalog_group_code = self.catalog_group_code.clone();
        row.product_name = self.product_name.clone();
        row.kana_name = self.kana_name.clone();
        row.package_form = self.package_form.clone();
        row.package_spec = self.package_spec.clone();
        row.usage_class = self.usage_class.clone();
        row.package_ratio = self.package_ratio;
        row.catalog_unit_name = self.catalog_unit_name.clone();
        row.reference_price = self.reference_price;
    }
}

/// Refresh of one product's provisional rows
#[derive(Debug, Clone, PartialEq)]
pub struct RowRefresh {
    pub product_code: String,
    pub fields: MasterFields,
}

/// Pick the provisional rows the reprocessing sweep refreshes.
///
/// `masters` are the current masters as readers see them. A product's
/// provisional rows are refreshed once an authoritative master exists for
/// its code; completed rows and rows still backed by a non-authoritative
/// master are left alone. One entry per product, in first-seen order.
pub fn plan_refresh<'a, I>(rows: I, masters: &[ProductMaster]) -> Vec<RowRefresh>
where
    I: IntoIterator<Item = &'a TransactionRecord>,
{
    let by_code: HashMap<&str, &ProductMaster> = masters
        .iter()
        .map(|m| (m.product_code.as_str(), m))
        .collect();
    let mut seen = HashSet::new();

    rows.into_iter()
        .filter(|row| row.processing_status == ProcessingStatus::Provisional)
        .filter(|row| seen.insert(row.product_code.as_str()))
        .filter_map(|row| {
            let master = by_code.get(row.product_code.as_str())?;
            master.origin.is_authoritative().then(|| RowRefresh {
                product_code: row.product_code.clone(),
                fields: MasterFields::from(*master),
            })
        })
        .collect()
}
