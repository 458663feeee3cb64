//! Theoretical stock balances: checkpoint-plus-delta
//!
//! A product's balance is anchored by its most recent physical count
//! (flag 0). Every checkpoint row on that date is added into the base, and
//! signed movements from that date onwards are applied on top. The count is
//! authoritative for its own day: asking for the balance on the checkpoint
//! date returns the count alone, while any later date also picks up the
//! movements that share the checkpoint date.

use std::collections::{HashMap, HashSet};

use rust_decimal::Decimal;

use crate::models::StockEntry;

/// Balance of one product's entries, optionally bounded by `as_of`
/// (inclusive, `YYYYMMDD`). Entries belonging to other products must be
/// filtered out by the caller.
pub fn balance_as_of<'a, E, I>(entries: I, as_of: Option<&str>) -> Decimal
where
    E: StockEntry + 'a,
    I: IntoIterator<Item = &'a E>,
{
    let in_range: Vec<&E> = entries
        .into_iter()
        .filter(|e| as_of.map_or(true, |bound| e.date() <= bound))
        .collect();

    let checkpoint_date = in_range
        .iter()
        .filter(|e| e.flag().is_checkpoint())
        .map(|e| e.date())
        .max();

    match checkpoint_date {
        Some(cp) => {
            let base: Decimal = in_range
                .iter()
                .filter(|e| e.flag().is_checkpoint() && e.date() == cp)
                .map(|e| e.quantity())
                .sum();
            if as_of == Some(cp) {
                return base;
            }
            let net: Decimal = in_range
                .iter()
                .filter(|e| !e.flag().is_checkpoint() && e.date() >= cp)
                .map(|e| e.flag().signed(e.quantity()))
                .sum();
            base + net
        }
        None => in_range
            .iter()
            .filter(|e| !e.flag().is_checkpoint())
            .map(|e| e.flag().signed(e.quantity()))
            .sum(),
    }
}

/// Current balance of every product in one pass over the full log
pub fn all_balances<E: StockEntry>(entries: &[E]) -> HashMap<String, Decimal> {
    let mut by_product: HashMap<&str, Vec<&E>> = HashMap::new();
    for entry in entries {
        by_product.entry(entry.product_code()).or_default().push(entry);
    }

    by_product
        .into_iter()
        .map(|(code, rows)| (code.to_string(), balance_as_of(rows.iter().copied(), None)))
        .collect()
}

/// Streaming form of the checkpoint-plus-delta rule.
///
/// Feed entries ordered by (date, sequence id). Balances are tracked per
/// product so a stream mixing several products still agrees with
/// [`balance_as_of`] for each of them. Movements on a counted day are held
/// back until a later date is seen, so the balance returned by
/// [`RunningBalance::apply`] on that day stays at the count, while
/// [`RunningBalance::total`] and [`RunningBalance::product_balance`] include them.
#[derive(Debug, Default)]
pub struct RunningBalance {
    checkpoint_days: HashSet<(String, String)>,
    products: HashMap<String, ProductFold>,
    total: Decimal,
    held: Decimal,
}

#[derive(Debug, Default)]
struct ProductFold {
    balance: Decimal,
    reset_on: Option<String>,
    held: Decimal,
    held_on: Option<String>,
}

impl RunningBalance {
    /// Prepare a fold over `entries`; needs the full set up front to know
    /// which (product, date) pairs carry a checkpoint.
    pub fn new<'a, E, I>(entries: I) -> Self
    where
        E: StockEntry + 'a,
        I: IntoIterator<Item = &'a E>,
    {
        let checkpoint_days = entries
            .into_iter()
            .filter(|e| e.flag().is_checkpoint())
            .map(|e| (e.product_code().to_string(), e.date().to_string()))
            .collect();
        Self {
            checkpoint_days,
            ..Default::default()
        }
    }

    /// Apply one entry and return the combined balance shown for its line
    pub fn apply<E: StockEntry>(&mut self, entry: &E) -> Decimal {
        self.release_held_before(entry.date());

        let day_key = (entry.product_code().to_string(), entry.date().to_string());
        let counted_day = self.checkpoint_days.contains(&day_key);
        let fold = self.products.entry(day_key.0).or_default();
        let before = fold.balance;

        if counted_day {
            if entry.flag().is_checkpoint() {
                if fold.reset_on.as_deref() == Some(entry.date()) {
                    fold.balance += entry.quantity();
                } else {
                    fold.balance = entry.quantity();
                    fold.reset_on = Some(day_key.1);
                }
            } else {
                let delta = entry.flag().signed(entry.quantity());
                fold.held += delta;
                fold.held_on = Some(day_key.1);
                self.held += delta;
            }
        } else {
            fold.balance += entry.flag().signed(entry.quantity());
        }

        self.total += fold.balance - before;
        self.total
    }

    /// Fold movements held on earlier counted days into their balances
    fn release_held_before(&mut self, date: &str) {
        for fold in self.products.values_mut() {
            let earlier = fold.held_on.as_deref().map_or(false, |d| d < date);
            if earlier {
                fold.balance += fold.held;
                self.total += fold.held;
                self.held -= fold.held;
                fold.held = Decimal::ZERO;
                fold.held_on = None;
            }
        }
    }

    /// Balance of everything applied so far, held movements included
    pub fn total(&self) -> Decimal {
        self.total + self.held
    }

    pub fn product_balance(&self, product_code: &str) -> Decimal {
        self.products
            .get(product_code)
            .map(|f| f.balance + f.held)
            .unwrap_or(Decimal::ZERO)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{StockMovement, TransactionFlag};

    fn mv(id: i64, date: &str, flag: i16, qty: i64) -> StockMovement {
        StockMovement {
            id,
            product_code: "P".to_string(),
            transaction_date: date.to_string(),
            flag: TransactionFlag::from_code(flag),
            quantity: Decimal::from(qty),
        }
    }

    #[test]
    fn test_empty_log_is_zero() {
        let rows: Vec<StockMovement> = vec![];
        assert_eq!(balance_as_of(&rows, None), Decimal::ZERO);
        assert!(all_balances(&rows).is_empty());
    }

    #[test]
    fn test_movement_before_checkpoint_is_overridden() {
        let rows = vec![mv(1, "20240101", 1, 50), mv(2, "20240105", 0, 10), mv(3, "20240106", 3, 4)];
        assert_eq!(balance_as_of(&rows, None), Decimal::from(6));
        assert_eq!(balance_as_of(&rows, Some("20240104")), Decimal::from(50));
    }

    #[test]
    fn test_running_balance_reset_is_per_day() {
        let rows = vec![mv(1, "20240105", 0, 10), mv(2, "20240105", 0, 5), mv(3, "20240107", 0, 7)];
        let mut fold = RunningBalance::new(&rows);
        let seen: Vec<Decimal> = rows.iter().map(|r| fold.apply(r)).collect();
        assert_eq!(seen, vec![Decimal::from(10), Decimal::from(15), Decimal::from(7)]);
    }

    #[test]
    fn test_same_day_movement_counts_from_next_day() {
        let rows = vec![mv(1, "20240110", 0, 100), mv(2, "20240110", 1, 20)];
        assert_eq!(balance_as_of(&rows, Some("20240110")), Decimal::from(100));
        assert_eq!(balance_as_of(&rows, Some("20240111")), Decimal::from(120));
        assert_eq!(balance_as_of(&rows, None), Decimal::from(120));
    }
}
