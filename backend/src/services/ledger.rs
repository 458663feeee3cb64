//! Ledger and report service
//! Builds the grouped ledger and the reports derived from it

use chrono::Utc;
use serde::{Deserialize, Serialize};
use shared::ledger::{build_ledger, LineWindow};
use shared::reports::{self, ReorderPolicy};
use shared::{
    ledger_date_days_before, validate_ledger_date, DeadStockItem, DrugType, LedgerReport,
    MasterFilter, StockLevelItem, ValuationCsvRow, ValuationReport,
};
use sqlx::PgPool;

use super::master::MasterService;
use super::transactions::load_for_products;
use crate::config::ReportsConfig;
use crate::error::{AppError, AppResult};

/// Query for a ledger or a report built on one
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LedgerQuery {
    /// Case-insensitive substring of product or kana name
    pub name: Option<String>,
    /// Comma separated drug types (narcotic, psychotropic, poison, deleterious)
    pub drug_types: Option<String>,
    /// First `YYYYMMDD` date to emit lines for
    pub from: Option<String>,
    /// Last `YYYYMMDD` date to include
    pub to: Option<String>,
}

impl LedgerQuery {
    fn filter(&self) -> AppResult<MasterFilter> {
        let mut drug_types = Vec::new();
        for raw in self
            .drug_types
            .as_deref()
            .unwrap_or("")
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
        {
            let drug_type = DrugType::from_str(raw)
                .ok_or_else(|| AppError::validation("drug_types", format!("Unknown drug type: {}", raw)))?;
            drug_types.push(drug_type);
        }

        Ok(MasterFilter {
            name_contains: self.name.clone(),
            drug_types,
        })
    }

    fn window(&self) -> AppResult<LineWindow> {
        for (field, value) in [("from", &self.from), ("to", &self.to)] {
            if let Some(date) = value {
                validate_ledger_date(date).map_err(|m| AppError::validation(field, m))?;
            }
        }
        if let (Some(from), Some(to)) = (&self.from, &self.to) {
            if from > to {
                return Err(AppError::validation("from", "from must not be after to"));
            }
        }
        Ok(LineWindow {
            from: self.from.clone(),
            to: self.to.clone(),
        })
    }
}

/// Report output format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    #[default]
    Json,
    Csv,
}

/// Ledger service
#[derive(Clone)]
pub struct LedgerService {
    db: PgPool,
    settings: ReportsConfig,
}

impl LedgerService {
    pub fn new(db: PgPool, settings: ReportsConfig) -> Self {
        Self { db, settings }
    }

    /// Grouped ledger for the masters matching `query`
    pub async fn ledger(&self, query: &LedgerQuery) -> AppResult<LedgerReport> {
        let filter = query.filter()?;
        let window = query.window()?;

        let masters = MasterService::new(self.db.clone()).list_matching(&filter).await?;
        let codes: Vec<String> = masters.iter().map(|m| m.product_code.clone()).collect();

        let mut conn = self.db.acquire().await?;
        let transactions = load_for_products(&mut conn, &codes, window.to.as_deref()).await?;

        let report = build_ledger(&masters, &transactions, &window);
        tracing::debug!(
            groups = report.groups.len(),
            rows = transactions.len(),
            "ledger built"
        );
        Ok(report)
    }

    /// Groups with stock and no dispensing in the lookback window
    pub async fn dead_stock(&self, query: &LedgerQuery) -> AppResult<Vec<DeadStockItem>> {
        let report = self.ledger(query).await?;
        let since = self.days_ago(self.settings.dead_stock_lookback_days);
        Ok(reports::dead_stock(&report, &since))
    }

    /// Stock valuation at reference and purchase price
    pub async fn valuation(&self, query: &LedgerQuery) -> AppResult<ValuationReport> {
        let report = self.ledger(query).await?;
        Ok(reports::valuation(
            &report,
            &self.settings.valuation_exempt_usage_classes,
        ))
    }

    /// Flattened valuation for CSV export
    pub async fn valuation_rows(&self, query: &LedgerQuery) -> AppResult<Vec<ValuationCsvRow>> {
        let valuation = self.valuation(query).await?;
        Ok(reports::valuation_csv_rows(&valuation))
    }

    /// Package variants holding more than they are likely to use
    pub async fn return_candidates(&self, query: &LedgerQuery) -> AppResult<Vec<StockLevelItem>> {
        let report = self.ledger(query).await?;
        Ok(reports::return_candidates(&report, &self.reorder_policy()))
    }

    /// Package variants below their reorder point
    pub async fn reorder_list(&self, query: &LedgerQuery) -> AppResult<Vec<StockLevelItem>> {
        let report = self.ledger(query).await?;
        Ok(reports::reorder_list(&report, &self.reorder_policy()))
    }

    fn reorder_policy(&self) -> ReorderPolicy {
        ReorderPolicy {
            usage_since: self.days_ago(self.settings.usage_window_days),
            window_days: self.settings.usage_window_days,
            coverage_days: self.settings.coverage_days,
        }
    }

    fn days_ago(&self, days: u32) -> String {
        ledger_date_days_before(Utc::now().date_naive(), days)
    }

    /// Export report data as CSV
    pub fn export_to_csv<T: Serialize>(data: &[T]) -> AppResult<String> {
        let mut wtr = csv::Writer::from_writer(vec![]);
        for record in data {
            wtr.serialize(record)
                .map_err(|e| AppError::Internal(format!("CSV serialization error: {}", e)))?;
        }
        let bytes = wtr
            .into_inner()
            .map_err(|e| AppError::Internal(format!("CSV writer error: {}", e)))?;
        String::from_utf8(bytes).map_err(|e| AppError::Internal(format!("UTF-8 conversion error: {}", e)))
    }
}
