//! Ledger row persistence and operator deletions

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use shared::processing::MasterFields;
use shared::{NewTransaction, ProcessingStatus, TransactionFlag, TransactionRecord};
use sqlx::{FromRow, PgConnection, PgPool};

use crate::error::{AppError, AppResult};

const TRANSACTION_COLUMNS: &str = "id, transaction_date, receipt_number, client_code, product_code, \
     catalog_group_code, product_name, kana_name, package_form, package_spec, usage_class, flag, \
     quantity, quantity_in_catalog_unit, quantity_in_product_unit, package_ratio, catalog_unit_name, \
     unit_price, subtotal, reference_price, processing_status, created_at";

/// Row for `transaction_records` queries
#[derive(Debug, FromRow)]
struct TransactionRow {
    id: i64,
    transaction_date: String,
    receipt_number: String,
    client_code: String,
    product_code: String,
    catalog_group_code: String,
    product_name: String,
    kana_name: String,
    package_form: String,
    package_spec: String,
    usage_class: String,
    flag: i16,
    quantity: Decimal,
    quantity_in_catalog_unit: Decimal,
    quantity_in_product_unit: Decimal,
    package_ratio: Decimal,
    catalog_unit_name: String,
    unit_price: Decimal,
    subtotal: Decimal,
    reference_price: Decimal,
    processing_status: String,
    created_at: DateTime<Utc>,
}

impl From<TransactionRow> for TransactionRecord {
    fn from(r: TransactionRow) -> Self {
        TransactionRecord {
            id: r.id,
            transaction_date: r.transaction_date,
            receipt_number: r.receipt_number,
            client_code: r.client_code,
            product_code: r.product_code,
            catalog_group_code: r.catalog_group_code,
            product_name: r.product_name,
            kana_name: r.kana_name,
            package_form: r.package_form,
            package_spec: r.package_spec,
            usage_class: r.usage_class,
            flag: TransactionFlag::from_code(r.flag),
            quantity: r.quantity,
            quantity_in_catalog_unit: r.quantity_in_catalog_unit,
            quantity_in_product_unit: r.quantity_in_product_unit,
            package_ratio: r.package_ratio,
            catalog_unit_name: r.catalog_unit_name,
            unit_price: r.unit_price,
            subtotal: r.subtotal,
            reference_price: r.reference_price,
            processing_status: ProcessingStatus::from_str(&r.processing_status)
                .unwrap_or(ProcessingStatus::Provisional),
            created_at: r.created_at,
        }
    }
}

/// Insert one ledger row and return its sequence id
pub async fn insert_transaction(conn: &mut PgConnection, tx: &NewTransaction) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar::<_, i64>(
        r#"
        INSERT INTO transaction_records (
            transaction_date, receipt_number, client_code, product_code, catalog_group_code,
            product_name, kana_name, package_form, package_spec, usage_class, flag, quantity,
            quantity_in_catalog_unit, quantity_in_product_unit, package_ratio, catalog_unit_name,
            unit_price, subtotal, reference_price, processing_status
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18, $19, $20)
        RETURNING id
        "#,
    )
    .bind(&tx.transaction_date)
    .bind(&tx.receipt_number)
    .bind(&tx.client_code)
    .bind(&tx.product_code)
    .bind(&tx.catalog_group_code)
    .bind(&tx.product_name)
    .bind(&tx.kana_name)
    .bind(&tx.package_form)
    .bind(&tx.package_spec)
    .bind(&tx.usage_class)
    .bind(tx.flag.code())
    .bind(tx.quantity)
    .bind(tx.quantity_in_catalog_unit)
    .bind(tx.quantity_in_product_unit)
    .bind(tx.package_ratio)
    .bind(&tx.catalog_unit_name)
    .bind(tx.unit_price)
    .bind(tx.subtotal)
    .bind(tx.reference_price)
    .bind(tx.processing_status.as_str())
    .fetch_one(&mut *conn)
    .await
}

/// Ledger rows for the given products up to `to` (inclusive), ordered by
/// date then sequence id
pub async fn load_for_products(
    conn: &mut PgConnection,
    product_codes: &[String],
    to: Option<&str>,
) -> Result<Vec<TransactionRecord>, sqlx::Error> {
    let query = format!(
        "SELECT {} FROM transaction_records \
         WHERE product_code = ANY($1) AND ($2::TEXT IS NULL OR transaction_date <= $2) \
         ORDER BY transaction_date, id",
        TRANSACTION_COLUMNS
    );
    let rows = sqlx::query_as::<_, TransactionRow>(&query)
        .bind(product_codes)
        .bind(to)
        .fetch_all(&mut *conn)
        .await?;

    Ok(rows.into_iter().map(Into::into).collect())
}

/// Every provisional row, ordered by date then sequence id
pub async fn load_provisional(conn: &mut PgConnection) -> Result<Vec<TransactionRecord>, sqlx::Error> {
    let query = format!(
        "SELECT {} FROM transaction_records WHERE processing_status = $1 ORDER BY transaction_date, id",
        TRANSACTION_COLUMNS
    );
    let rows = sqlx::query_as::<_, TransactionRow>(&query)
        .bind(ProcessingStatus::Provisional.as_str())
        .fetch_all(&mut *conn)
        .await?;

    Ok(rows.into_iter().map(Into::into).collect())
}

/// Overwrite master-derived fields on a product's provisional rows.
/// Flag, quantities and processing status are left as they are.
pub async fn refresh_provisional_rows(
    conn: &mut PgConnection,
    product_code: &str,
    fields: &MasterFields,
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(
        r#"
        UPDATE transaction_records
        SET catalog_group_code = $1, product_name = $2, kana_name = $3, package_form = $4,
            package_spec = $5, usage_class = $6, package_ratio = $7, catalog_unit_name = $8,
            reference_price = $9
        WHERE product_code = $10 AND processing_status = $11
        "#,
    )
    .bind(&fields.catalog_group_code)
    .bind(&fields.product_name)
    .bind(&fields.kana_name)
    .bind(&fields.package_form)
    .bind(&fields.package_spec)
    .bind(&fields.usage_class)
    .bind(fields.package_ratio)
    .bind(&fields.catalog_unit_name)
    .bind(fields.reference_price)
    .bind(product_code)
    .bind(ProcessingStatus::Provisional.as_str())
    .execute(&mut *conn)
    .await?;

    Ok(result.rows_affected())
}

#[derive(Debug, Clone, Serialize)]
pub struct DeleteResult {
    pub deleted: u64,
}

/// Operator deletions of ledger rows
#[derive(Clone)]
pub struct TransactionService {
    db: PgPool,
}

impl TransactionService {
    /// Create a new TransactionService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Delete one row by sequence id
    pub async fn delete_by_id(&self, id: i64) -> AppResult<DeleteResult> {
        let result = sqlx::query("DELETE FROM transaction_records WHERE id = $1")
            .bind(id)
            .execute(&self.db)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Transaction".to_string()));
        }

        tracing::info!(id, "transaction deleted");
        Ok(DeleteResult { deleted: 1 })
    }

    /// Delete every row of one delivery slip
    pub async fn delete_by_receipt(&self, receipt_number: &str) -> AppResult<DeleteResult> {
        let receipt_number = receipt_number.trim();
        if receipt_number.is_empty() {
            return Err(AppError::validation("receipt_number", "Receipt number must not be empty"));
        }

        let result = sqlx::query("DELETE FROM transaction_records WHERE receipt_number = $1")
            .bind(receipt_number)
            .execute(&self.db)
            .await?;

        tracing::info!(receipt_number, deleted = result.rows_affected(), "receipt deleted");
        Ok(DeleteResult {
            deleted: result.rows_affected(),
        })
    }

    /// Delete every row with the given date and flag
    pub async fn delete_by_date_and_flag(&self, date: &str, flag: TransactionFlag) -> AppResult<DeleteResult> {
        let result = sqlx::query("DELETE FROM transaction_records WHERE transaction_date = $1 AND flag = $2")
            .bind(date)
            .bind(flag.code())
            .execute(&self.db)
            .await?;

        tracing::info!(date, flag = flag.code(), deleted = result.rows_affected(), "rows deleted");
        Ok(DeleteResult {
            deleted: result.rows_affected(),
        })
    }
}
