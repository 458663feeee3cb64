//! Ledger aggregation and report tests
//!
//! Tests for the grouped ledger and the reports built on it:
//! - Group ordering by usage class, kana and group code
//! - Package sub-groups and running balances
//! - Dead stock, valuation, return candidates and reorder lists

use chrono::Utc;
use rust_decimal::Decimal;
use shared::ledger::{build_ledger, LineWindow};
use shared::reports::{dead_stock, reorder_list, return_candidates, valuation, valuation_csv_rows, ReorderPolicy};
use shared::stock::all_balances;
use shared::{Origin, ProcessingStatus, ProductMaster, TransactionFlag, TransactionRecord};
use std::str::FromStr;

// Helper to create Decimal from string
fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

fn master(code: &str, group: &str, kana: &str, usage: &str, inner_qty: &str, origin: Origin) -> ProductMaster {
    ProductMaster {
        kana_name: kana.to_string(),
        usage_class: usage.to_string(),
        package_form: "PTP".to_string(),
        pack_qty_catalog_unit: dec(inner_qty),
        pack_qty_product_unit: dec("1"),
        catalog_unit_name: "錠".to_string(),
        reference_price: dec("10"),
        purchase_price: dec(inner_qty) * dec("8"),
        origin,
        ..ProductMaster::provisional(code.to_string(), group.to_string(), &format!("Product {}", code))
    }
}

fn row(id: i64, product: &str, date: &str, flag: TransactionFlag, qty: &str) -> TransactionRecord {
    TransactionRecord {
        id,
        transaction_date: date.to_string(),
        receipt_number: format!("R{}", id),
        client_code: String::new(),
        product_code: product.to_string(),
        catalog_group_code: String::new(),
        product_name: String::new(),
        kana_name: String::new(),
        package_form: String::new(),
        package_spec: String::new(),
        usage_class: String::new(),
        flag,
        quantity: dec(qty),
        quantity_in_catalog_unit: dec(qty),
        quantity_in_product_unit: dec(qty),
        package_ratio: Decimal::ONE,
        catalog_unit_name: String::new(),
        unit_price: Decimal::ZERO,
        subtotal: Decimal::ZERO,
        reference_price: Decimal::ZERO,
        processing_status: ProcessingStatus::Completed,
        created_at: Utc::now(),
    }
}

fn policy() -> ReorderPolicy {
    ReorderPolicy {
        usage_since: "20240101".to_string(),
        window_days: 10,
        coverage_days: 5,
    }
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod unit_tests {
    use super::*;

    /// Groups sort by usage priority; unknown classes go last
    #[test]
    fn test_groups_ordered_by_usage_class() {
        let masters = vec![
            master("P1", "G-EXTERNAL", "ア", "2", "10", Origin::Authoritative),
            master("P2", "G-INTERNAL", "ア", "1", "10", Origin::Authoritative),
            master("P3", "G-OTHER", "ア", "9", "10", Origin::Authoritative),
        ];

        let report = build_ledger(&masters, &[], &LineWindow::default());
        let order: Vec<&str> = report.groups.iter().map(|g| g.catalog_group_code.as_str()).collect();

        assert_eq!(order, vec!["G-INTERNAL", "G-EXTERNAL", "G-OTHER"]);
    }

    /// Ties on usage class fall back to kana, then group code
    #[test]
    fn test_groups_ordered_by_kana_then_code() {
        let masters = vec![
            master("P1", "G2", "イ", "1", "10", Origin::Authoritative),
            master("P2", "G3", "ア", "1", "10", Origin::Authoritative),
            master("P3", "G1", "イ", "内", "10", Origin::Authoritative),
        ];

        let report = build_ledger(&masters, &[], &LineWindow::default());
        let order: Vec<&str> = report.groups.iter().map(|g| g.catalog_group_code.as_str()).collect();

        assert_eq!(order, vec!["G3", "G1", "G2"]);
    }

    /// Package variants within a group are ledgered separately
    #[test]
    fn test_package_variants_split_group() {
        let masters = vec![
            master("P100", "G1", "ア", "1", "100", Origin::Authoritative),
            master("P500", "G1", "ア", "1", "500", Origin::Authoritative),
            master("P100B", "G1", "ア", "1", "100", Origin::Manual),
        ];
        let rows = vec![
            row(1, "P100", "20240101", TransactionFlag::Delivery, "100"),
            row(2, "P500", "20240101", TransactionFlag::Delivery, "500"),
            row(3, "P100B", "20240102", TransactionFlag::Delivery, "100"),
        ];

        let report = build_ledger(&masters, &rows, &LineWindow::default());
        assert_eq!(report.groups.len(), 1);

        let group = &report.groups[0];
        assert_eq!(group.packages.len(), 2);
        assert_eq!(group.packages[0].product_codes, vec!["P100".to_string(), "P100B".to_string()]);
        assert_eq!(group.packages[0].ending_balance, dec("200"));
        assert_eq!(group.packages[1].ending_balance, dec("500"));
        assert_eq!(group.ending_balance, dec("700"));
        assert!(group.has_authoritative_master);
    }

    /// Running balance follows the checkpoint rule line by line
    #[test]
    fn test_running_balance_per_line() {
        let masters = vec![master("P1", "G1", "ア", "1", "10", Origin::Authoritative)];
        let rows = vec![
            row(1, "P1", "20240101", TransactionFlag::Delivery, "30"),
            row(2, "P1", "20240102", TransactionFlag::Dispense, "5"),
            row(3, "P1", "20240103", TransactionFlag::Dispense, "4"),
            row(4, "P1", "20240103", TransactionFlag::Checkpoint, "20"),
            row(5, "P1", "20240104", TransactionFlag::Return, "2"),
        ];

        let report = build_ledger(&masters, &rows, &LineWindow::default());
        let package = &report.groups[0].packages[0];
        let balances: Vec<Decimal> = package.lines.iter().map(|l| l.running_balance).collect();

        // the dispense on the count's day shows from 20240104 on
        assert_eq!(balances, vec![dec("30"), dec("25"), dec("25"), dec("20"), dec("14")]);
        assert_eq!(package.lines[1].signed_quantity, dec("-5"));
        assert_eq!(package.lines[3].signed_quantity, Decimal::ZERO);
        assert_eq!(package.ending_balance, dec("14"));
        assert_eq!(package.last_dispensed.as_deref(), Some("20240103"));
    }

    /// Sub-group ending balances agree with the stock calculator
    #[test]
    fn test_ending_balance_matches_stock_calculator() {
        let masters = vec![
            master("P1", "G1", "ア", "1", "10", Origin::Authoritative),
            master("P2", "G1", "ア", "1", "10", Origin::Provisional),
        ];
        let rows = vec![
            row(1, "P1", "20240101", TransactionFlag::Checkpoint, "50"),
            row(2, "P2", "20240101", TransactionFlag::Delivery, "12"),
            row(3, "P1", "20240102", TransactionFlag::Dispense, "7"),
            row(4, "P2", "20240103", TransactionFlag::Checkpoint, "3"),
            row(5, "P2", "20240104", TransactionFlag::AdjustIn, "1"),
        ];

        let report = build_ledger(&masters, &rows, &LineWindow::default());
        let balances = all_balances(&rows);
        let expected: Decimal = balances.values().copied().sum();

        assert_eq!(report.groups[0].packages[0].ending_balance, expected);
        assert_eq!(expected, dec("47"));
    }

    /// Rows before the window fold into the balance without lines
    #[test]
    fn test_window_hides_lines_but_keeps_balance() {
        let masters = vec![master("P1", "G1", "ア", "1", "10", Origin::Authoritative)];
        let rows = vec![
            row(1, "P1", "20240101", TransactionFlag::Delivery, "30"),
            row(2, "P1", "20240105", TransactionFlag::Dispense, "5"),
            row(3, "P1", "20240110", TransactionFlag::Delivery, "10"),
        ];
        let window = LineWindow {
            from: Some("20240102".to_string()),
            to: Some("20240106".to_string()),
        };

        let report = build_ledger(&masters, &rows, &window);
        let package = &report.groups[0].packages[0];

        assert_eq!(package.lines.len(), 1);
        assert_eq!(package.lines[0].running_balance, dec("25"));
        assert_eq!(package.ending_balance, dec("25"));
    }

    /// Groups without recent dispensing are dead stock
    #[test]
    fn test_dead_stock_uses_lookback() {
        let masters = vec![
            master("P1", "G-ACTIVE", "ア", "1", "10", Origin::Authoritative),
            master("P2", "G-DEAD", "イ", "1", "10", Origin::Authoritative),
        ];
        let rows = vec![
            row(1, "P1", "20240101", TransactionFlag::Delivery, "30"),
            row(2, "P2", "20240101", TransactionFlag::Delivery, "30"),
            row(3, "P1", "20240301", TransactionFlag::Dispense, "1"),
            row(4, "P2", "20240105", TransactionFlag::Dispense, "1"),
        ];

        let report = build_ledger(&masters, &rows, &LineWindow::default());
        let dead = dead_stock(&report, "20240201");

        assert_eq!(dead.len(), 1);
        assert_eq!(dead[0].catalog_group_code, "G-DEAD");
        assert_eq!(dead[0].last_dispensed.as_deref(), Some("20240105"));
        assert_eq!(dead[0].ending_balance, dec("29"));
    }

    /// Valuation prices per catalog unit and flags unverified groups
    #[test]
    fn test_valuation_flags_groups_without_authoritative_master() {
        let masters = vec![
            master("P1", "G1", "ア", "1", "10", Origin::Authoritative),
            master("P2", "G2", "イ", "1", "10", Origin::Provisional),
            master("P3", "G3", "ウ", "5", "10", Origin::Manual),
        ];
        let rows = vec![
            row(1, "P1", "20240101", TransactionFlag::Delivery, "20"),
            row(2, "P2", "20240101", TransactionFlag::Delivery, "5"),
            row(3, "P3", "20240101", TransactionFlag::Delivery, "1"),
        ];

        let report = build_ledger(&masters, &rows, &LineWindow::default());
        let result = valuation(&report, &["5".to_string(), "6".to_string()]);

        let g1 = &result.groups[0];
        assert_eq!(g1.catalog_group_code, "G1");
        assert!(!g1.needs_verification);
        assert_eq!(g1.reference_value, dec("200"));
        // purchase price 80 per 10-unit package
        assert_eq!(g1.purchase_value, dec("160"));

        assert!(result.groups[1].needs_verification);
        assert!(!result.groups[2].needs_verification);
        assert_eq!(result.total_reference_value, dec("260"));
        assert_eq!(valuation_csv_rows(&result).len(), 3);
    }

    /// Zero package ratio gives a zero unit purchase price
    #[test]
    fn test_unit_purchase_price_with_unknown_ratio() {
        let m = master("P1", "G1", "ア", "1", "0", Origin::Provisional);
        assert_eq!(m.unit_purchase_price(), Decimal::ZERO);

        let m = master("P1", "G1", "ア", "1", "25", Origin::Authoritative);
        assert_eq!(m.unit_purchase_price(), dec("8"));
    }

    /// Stock above reorder point plus a package is a return candidate
    #[test]
    fn test_return_candidates() {
        let masters = vec![
            master("P1", "G1", "ア", "1", "10", Origin::Authoritative),
            master("P2", "G2", "イ", "1", "10", Origin::Authoritative),
        ];
        let rows = vec![
            row(1, "P1", "20240101", TransactionFlag::Checkpoint, "100"),
            row(2, "P1", "20240102", TransactionFlag::Dispense, "20"),
            row(3, "P2", "20240101", TransactionFlag::Checkpoint, "25"),
            row(4, "P2", "20240102", TransactionFlag::Dispense, "20"),
        ];

        let report = build_ledger(&masters, &rows, &LineWindow::default());
        let items = return_candidates(&report, &policy());

        // reorder point: 20 / 10 days * 5 days = 10
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].catalog_group_code, "G1");
        assert_eq!(items[0].reorder_point, dec("10"));
        assert_eq!(items[0].ending_balance, dec("80"));
        assert_eq!(items[0].packages, dec("7"));
    }

    /// Stock below the reorder point is listed with whole packages to order
    #[test]
    fn test_reorder_list() {
        let masters = vec![
            master("P1", "G1", "ア", "1", "10", Origin::Authoritative),
            master("P2", "G2", "イ", "1", "0", Origin::Provisional),
        ];
        let rows = vec![
            row(1, "P1", "20240101", TransactionFlag::Checkpoint, "25"),
            row(2, "P1", "20240102", TransactionFlag::Dispense, "40"),
            row(3, "P2", "20240101", TransactionFlag::Checkpoint, "50"),
            row(4, "P2", "20240102", TransactionFlag::Dispense, "4"),
        ];

        let report = build_ledger(&masters, &rows, &LineWindow::default());
        let items = reorder_list(&report, &policy());

        // P1: reorder point 40 / 10 * 5 = 20 against a balance of -15
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].product_codes, vec!["P1".to_string()]);
        assert_eq!(items[0].reorder_point, dec("20"));
        assert_eq!(items[0].packages, dec("4"));
    }

    /// Rows for products outside the selection are ignored
    #[test]
    fn test_unselected_products_ignored() {
        let masters = vec![master("P1", "G1", "ア", "1", "10", Origin::Authoritative)];
        let rows = vec![
            row(1, "P1", "20240101", TransactionFlag::Delivery, "3"),
            row(2, "P9", "20240101", TransactionFlag::Delivery, "300"),
        ];

        let report = build_ledger(&masters, &rows, &LineWindow::default());

        assert_eq!(report.groups.len(), 1);
        assert_eq!(report.groups[0].ending_balance, dec("3"));
    }
}
