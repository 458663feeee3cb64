//! Reprocessing sweep for provisional ledger rows

use std::collections::{BTreeSet, HashSet};

use serde::Serialize;
use shared::processing::plan_refresh;
use shared::Origin;
use sqlx::PgPool;

use super::master::{load_masters, supersede_from_references};
use super::transactions::{load_provisional, refresh_provisional_rows};
use crate::error::AppResult;

#[derive(Debug, Clone, Default, Serialize)]
pub struct ReprocessSummary {
    /// Provisional masters now shadowed by a reference entry
    pub superseded: usize,
    /// Provisional rows examined
    pub examined: usize,
    /// Rows whose master fields were refreshed
    pub refreshed: u64,
}

#[derive(Clone)]
pub struct ReprocessService {
    db: PgPool,
}

impl ReprocessService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Copy authoritative master fields onto provisional rows whose product
    /// now has one, either stored or through a reference entry that
    /// supersedes the provisional master.
    ///
    /// Masters are not rewritten. Rows keep their flag, quantities and
    /// provisional status.
    pub async fn run(&self) -> AppResult<ReprocessSummary> {
        let mut tx = self.db.begin().await?;

        let rows = load_provisional(&mut tx).await?;
        let codes: Vec<String> = rows
            .iter()
            .map(|r| r.product_code.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        let stored = load_masters(&mut tx, &codes).await?;
        let provisional: HashSet<String> = stored
            .iter()
            .filter(|m| m.origin == Origin::Provisional)
            .map(|m| m.product_code.clone())
            .collect();
        let masters = supersede_from_references(&mut tx, stored).await?;

        let mut summary = ReprocessSummary {
            superseded: masters
                .iter()
                .filter(|m| m.origin.is_authoritative() && provisional.contains(&m.product_code))
                .count(),
            examined: rows.len(),
            refreshed: 0,
        };

        for refresh in plan_refresh(&rows, &masters) {
            summary.refreshed +=
                refresh_provisional_rows(&mut tx, &refresh.product_code, &refresh.fields).await?;
        }

        tx.commit().await?;

        tracing::info!(
            superseded = summary.superseded,
            examined = summary.examined,
            refreshed = summary.refreshed,
            "reprocessing sweep finished"
        );
        Ok(summary)
    }
}
