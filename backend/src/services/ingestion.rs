//! Record processors: resolve and write one batch of delivery, usage or
//! inventory lines

use shared::processing::build_transaction;
use shared::resolver::{batch_codes, find_or_create, ResolutionContext};
use shared::{
    validate_ledger_date, CoreError, IngestSummary, InputKind, ProcessingStatus, ResolutionKey,
    UnifiedInputRecord,
};
use sqlx::PgPool;

use super::master::{load_masters, load_references, PgMasterStore};
use super::transactions::insert_transaction;
use crate::error::{AppError, AppResult};

/// Ingestion service
#[derive(Clone)]
pub struct IngestionService {
    db: PgPool,
}

impl IngestionService {
    /// Create a new IngestionService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Process one batch in a single transaction.
    ///
    /// Lines with neither a product code nor a name are skipped. Any
    /// resolution or write failure rolls back the whole batch, including
    /// masters created for it.
    pub async fn ingest(&self, kind: InputKind, records: Vec<UnifiedInputRecord>) -> AppResult<IngestSummary> {
        for (idx, record) in records.iter().enumerate() {
            validate_ledger_date(record.date.trim())
                .map_err(|m| AppError::validation("date", format!("line {}: {}", idx + 1, m)))?;
        }

        let mut summary = IngestSummary {
            received: records.len(),
            ..Default::default()
        };

        let mut tx = self.db.begin().await?;

        // Prefetch everything the batch could hit
        let codes = batch_codes(
            records
                .iter()
                .map(|r| (r.product_code.as_str(), r.product_name.as_str())),
        );
        let masters = load_masters(&mut tx, &codes)
            .await
            .map_err(|e| CoreError::ResolutionFailure(e.to_string()))?;
        let references = load_references(&mut tx, &codes)
            .await
            .map_err(|e| CoreError::ResolutionFailure(e.to_string()))?;
        let mut ctx = ResolutionContext::new(masters, references);

        for record in &records {
            if ResolutionKey::for_item(&record.product_code, &record.product_name).is_none() {
                tracing::warn!(kind = kind.as_str(), date = %record.date, "line without code or name skipped");
                summary.skipped += 1;
                continue;
            }

            let (master, _) = find_or_create(
                &mut PgMasterStore::new(&mut tx),
                &mut ctx,
                &record.product_code,
                &record.product_name,
            )
            .await?;

            let row = build_transaction(kind, record, &master);
            if row.processing_status == ProcessingStatus::Provisional {
                summary.provisional += 1;
            }
            insert_transaction(&mut tx, &row).await?;
            summary.inserted += 1;
        }

        summary.masters_created = ctx.created();
        tx.commit().await?;

        tracing::info!(
            kind = kind.as_str(),
            received = summary.received,
            inserted = summary.inserted,
            skipped = summary.skipped,
            provisional = summary.provisional,
            masters_created = summary.masters_created,
            "batch ingested"
        );
        Ok(summary)
    }
}
