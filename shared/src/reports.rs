//! Report variants derived from a built ledger

use rust_decimal::{Decimal, RoundingStrategy};

use crate::models::{
    DeadStockItem, LedgerGroup, LedgerReport, PackageLedger, StockLevelItem, TransactionFlag,
    ValuationCsvRow, ValuationGroup, ValuationLine, ValuationReport,
};

/// Groups with no dispense movement on or after `since`
pub fn dead_stock(report: &LedgerReport, since: &str) -> Vec<DeadStockItem> {
    report
        .groups
        .iter()
        .filter(|group| {
            group
                .packages
                .iter()
                .all(|p| p.last_dispensed.as_deref().map_or(true, |d| d < since))
        })
        .map(|group| DeadStockItem {
            catalog_group_code: group.catalog_group_code.clone(),
            product_name: group.product_name.clone(),
            kana_name: group.kana_name.clone(),
            usage_class: group.usage_class.clone(),
            ending_balance: group.ending_balance,
            last_dispensed: group
                .packages
                .iter()
                .filter_map(|p| p.last_dispensed.clone())
                .max(),
        })
        .collect()
}

/// Value ending balances at reference and purchase price.
///
/// A group needs verification when none of its masters came from the
/// reference catalog, unless its usage class is exempt.
pub fn valuation(report: &LedgerReport, exempt_usage_classes: &[String]) -> ValuationReport {
    let groups: Vec<ValuationGroup> = report
        .groups
        .iter()
        .map(|group| {
            let lines: Vec<ValuationLine> = group.packages.iter().map(value_package).collect();
            let exempt = exempt_usage_classes
                .iter()
                .any(|c| c.trim() == group.usage_class.trim());
            ValuationGroup {
                catalog_group_code: group.catalog_group_code.clone(),
                product_name: group.product_name.clone(),
                usage_class: group.usage_class.clone(),
                needs_verification: !group.has_authoritative_master && !exempt,
                reference_value: lines.iter().map(|l| l.reference_value).sum(),
                purchase_value: lines.iter().map(|l| l.purchase_value).sum(),
                lines,
            }
        })
        .collect();

    ValuationReport {
        total_reference_value: groups.iter().map(|g| g.reference_value).sum(),
        total_purchase_value: groups.iter().map(|g| g.purchase_value).sum(),
        groups,
    }
}

fn value_package(package: &PackageLedger) -> ValuationLine {
    ValuationLine {
        package_form: package.signature.package_form.clone(),
        inner_qty: package.signature.inner_qty,
        unit_name: package.signature.unit_name.clone(),
        ending_balance: package.ending_balance,
        reference_price: package.reference_price,
        unit_purchase_price: package.unit_purchase_price,
        reference_value: package.ending_balance * package.reference_price,
        purchase_value: package.ending_balance * package.unit_purchase_price,
    }
}

/// Flatten a valuation into one row per package for export
pub fn valuation_csv_rows(report: &ValuationReport) -> Vec<ValuationCsvRow> {
    report
        .groups
        .iter()
        .flat_map(|group| {
            group.lines.iter().map(move |line| ValuationCsvRow {
                catalog_group_code: group.catalog_group_code.clone(),
                product_name: group.product_name.clone(),
                package_form: line.package_form.clone(),
                inner_qty: line.inner_qty,
                unit_name: line.unit_name.clone(),
                ending_balance: line.ending_balance,
                reference_value: line.reference_value,
                purchase_value: line.purchase_value,
                needs_verification: group.needs_verification,
            })
        })
        .collect()
}

/// Parameters for reorder-point derivation
#[derive(Debug, Clone)]
pub struct ReorderPolicy {
    /// First `YYYYMMDD` date of the usage window
    pub usage_since: String,
    pub window_days: u32,
    pub coverage_days: u32,
}

impl ReorderPolicy {
    /// Average daily dispensed quantity over the window times coverage days
    pub fn reorder_point(&self, package: &PackageLedger) -> Decimal {
        if self.window_days == 0 {
            return Decimal::ZERO;
        }
        let dispensed: Decimal = package
            .lines
            .iter()
            .filter(|l| l.flag == TransactionFlag::Dispense && l.transaction_date >= self.usage_since)
            .map(|l| l.quantity)
            .sum();
        dispensed / Decimal::from(self.window_days) * Decimal::from(self.coverage_days)
    }
}

fn pack_size(package: &PackageLedger) -> Decimal {
    if package.pack_qty_catalog_unit > Decimal::ZERO {
        package.pack_qty_catalog_unit
    } else {
        Decimal::ONE
    }
}

fn stock_level(group: &LedgerGroup, package: &PackageLedger, reorder_point: Decimal, packages: Decimal) -> StockLevelItem {
    StockLevelItem {
        catalog_group_code: group.catalog_group_code.clone(),
        product_name: group.product_name.clone(),
        package_form: package.signature.package_form.clone(),
        inner_qty: package.signature.inner_qty,
        unit_name: package.signature.unit_name.clone(),
        product_codes: package.product_codes.clone(),
        ending_balance: package.ending_balance,
        reorder_point,
        packages,
    }
}

/// Package variants holding more than the reorder point plus one package.
/// `packages` is the whole-package surplus above the reorder point.
pub fn return_candidates(report: &LedgerReport, policy: &ReorderPolicy) -> Vec<StockLevelItem> {
    let mut items = Vec::new();
    for group in &report.groups {
        for package in &group.packages {
            let reorder_point = policy.reorder_point(package);
            if package.ending_balance > reorder_point + package.pack_qty_catalog_unit {
                let surplus = ((package.ending_balance - reorder_point) / pack_size(package))
                    .round_dp_with_strategy(0, RoundingStrategy::ToZero);
                items.push(stock_level(group, package, reorder_point, surplus));
            }
        }
    }
    items
}

/// Package variants below their reorder point.
/// `packages` is the whole-package order needed to reach it.
pub fn reorder_list(report: &LedgerReport, policy: &ReorderPolicy) -> Vec<StockLevelItem> {
    let mut items = Vec::new();
    for group in &report.groups {
        for package in &group.packages {
            let reorder_point = policy.reorder_point(package);
            if package.ending_balance < reorder_point {
                let shortfall = ((reorder_point - package.ending_balance) / pack_size(package))
                    .round_dp_with_strategy(0, RoundingStrategy::AwayFromZero);
                items.push(stock_level(group, package, reorder_point, shortfall));
            }
        }
    }
    items
}
