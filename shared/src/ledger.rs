//! Ledger aggregation by catalog group and package variant

use std::collections::{BTreeMap, HashMap};

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::models::{
    LedgerGroup, LedgerLine, LedgerReport, PackageLedger, PackageSignature, ProductMaster,
    TransactionFlag, TransactionRecord,
};
use crate::stock::RunningBalance;
use crate::types::usage_priority;

/// Date window for emitted lines (inclusive, `YYYYMMDD`).
///
/// Rows after `to` are left out of the fold entirely. Rows before `from`
/// are folded so balances stay correct, but produce no lines.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LineWindow {
    pub from: Option<String>,
    pub to: Option<String>,
}

impl LineWindow {
    fn folds(&self, date: &str) -> bool {
        self.to.as_deref().map_or(true, |to| date <= to)
    }

    fn emits(&self, date: &str) -> bool {
        self.from.as_deref().map_or(true, |from| date >= from)
    }
}

pub fn package_signature(master: &ProductMaster) -> PackageSignature {
    PackageSignature {
        package_form: master.package_form.clone(),
        inner_qty: master.pack_qty_catalog_unit,
        unit_name: master.catalog_unit_name.clone(),
    }
}

/// Group key; masters never lack a group code once persisted, but a
/// blank one falls back to the product code rather than merging strangers.
fn group_key(master: &ProductMaster) -> &str {
    if master.catalog_group_code.trim().is_empty() {
        &master.product_code
    } else {
        &master.catalog_group_code
    }
}

/// Build the grouped ledger for the selected masters.
///
/// `transactions` may contain rows for products outside `masters`; those
/// are ignored.
pub fn build_ledger(
    masters: &[ProductMaster],
    transactions: &[TransactionRecord],
    window: &LineWindow,
) -> LedgerReport {
    let mut rows_by_product: HashMap<&str, Vec<&TransactionRecord>> = HashMap::new();
    for tx in transactions.iter().filter(|t| window.folds(&t.transaction_date)) {
        rows_by_product.entry(tx.product_code.as_str()).or_default().push(tx);
    }

    let mut groups: BTreeMap<&str, Vec<&ProductMaster>> = BTreeMap::new();
    for master in masters {
        groups.entry(group_key(master)).or_default().push(master);
    }

    let mut ledger_groups: Vec<LedgerGroup> = groups
        .into_iter()
        .map(|(code, mut members)| {
            members.sort_by(|a, b| a.product_code.cmp(&b.product_code));
            build_group(code, &members, &rows_by_product, window)
        })
        .collect();

    ledger_groups.sort_by(|a, b| {
        usage_priority(&a.usage_class)
            .cmp(&usage_priority(&b.usage_class))
            .then_with(|| a.kana_name.cmp(&b.kana_name))
            .then_with(|| a.catalog_group_code.cmp(&b.catalog_group_code))
    });

    LedgerReport {
        groups: ledger_groups,
    }
}

fn build_group(
    code: &str,
    members: &[&ProductMaster],
    rows_by_product: &HashMap<&str, Vec<&TransactionRecord>>,
    window: &LineWindow,
) -> LedgerGroup {
    let representative = members
        .iter()
        .find(|m| m.origin.is_authoritative())
        .or_else(|| members.first())
        .copied();

    let mut variants: BTreeMap<PackageSignature, Vec<&ProductMaster>> = BTreeMap::new();
    for master in members {
        variants.entry(package_signature(master)).or_default().push(*master);
    }

    let packages: Vec<PackageLedger> = variants
        .into_iter()
        .map(|(signature, variant_members)| {
            build_package(signature, &variant_members, rows_by_product, window)
        })
        .collect();

    let ending_balance = packages.iter().map(|p| p.ending_balance).sum();

    LedgerGroup {
        catalog_group_code: code.to_string(),
        product_name: representative.map(|m| m.product_name.clone()).unwrap_or_default(),
        kana_name: representative.map(|m| m.kana_name.clone()).unwrap_or_default(),
        usage_class: representative.map(|m| m.usage_class.clone()).unwrap_or_default(),
        has_authoritative_master: members.iter().any(|m| m.origin.is_authoritative()),
        packages,
        ending_balance,
    }
}

fn build_package(
    signature: PackageSignature,
    members: &[&ProductMaster],
    rows_by_product: &HashMap<&str, Vec<&TransactionRecord>>,
    window: &LineWindow,
) -> PackageLedger {
    let mut rows: Vec<&TransactionRecord> = members
        .iter()
        .filter_map(|m| rows_by_product.get(m.product_code.as_str()))
        .flatten()
        .copied()
        .collect();
    rows.sort_by(|a, b| {
        a.transaction_date
            .cmp(&b.transaction_date)
            .then_with(|| a.id.cmp(&b.id))
    });

    let mut fold = RunningBalance::new(rows.iter().copied());
    let mut lines = Vec::new();
    let mut last_dispensed: Option<String> = None;

    for row in &rows {
        let running_balance = fold.apply(*row);
        if row.flag == TransactionFlag::Dispense {
            last_dispensed = Some(row.transaction_date.clone());
        }
        if window.emits(&row.transaction_date) {
            lines.push(LedgerLine {
                id: row.id,
                transaction_date: row.transaction_date.clone(),
                product_code: row.product_code.clone(),
                product_name: row.product_name.clone(),
                receipt_number: row.receipt_number.clone(),
                flag: row.flag,
                quantity: row.quantity_in_catalog_unit,
                signed_quantity: row.flag.signed(row.quantity_in_catalog_unit),
                running_balance,
                processing_status: row.processing_status,
            });
        }
    }

    let priced = members
        .iter()
        .find(|m| m.origin.is_authoritative())
        .or_else(|| members.first());

    PackageLedger {
        pack_qty_catalog_unit: signature.inner_qty,
        signature,
        product_codes: members.iter().map(|m| m.product_code.clone()).collect(),
        lines,
        ending_balance: fold.total(),
        reference_price: priced.map(|m| m.reference_price).unwrap_or(Decimal::ZERO),
        unit_purchase_price: priced.map(|m| m.unit_purchase_price()).unwrap_or(Decimal::ZERO),
        last_dispensed,
    }
}
