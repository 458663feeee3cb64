//! Stock calculator service: theoretical balances from the ledger

use rust_decimal::Decimal;
use serde::Serialize;
use shared::{stock, CoreError, CoreResult, StockMovement, TransactionFlag};
use sqlx::{FromRow, PgConnection, PgPool};

use crate::error::AppResult;

/// Row for movement scans
#[derive(Debug, FromRow)]
struct MovementRow {
    id: i64,
    product_code: String,
    transaction_date: String,
    flag: i16,
    quantity_in_catalog_unit: Decimal,
}

impl From<MovementRow> for StockMovement {
    fn from(r: MovementRow) -> Self {
        StockMovement {
            id: r.id,
            product_code: r.product_code,
            transaction_date: r.transaction_date,
            flag: TransactionFlag::from_code(r.flag),
            quantity: r.quantity_in_catalog_unit,
        }
    }
}

/// Scan ledger movements, optionally for one product and up to `as_of`
/// (inclusive). Ordered by date then sequence id.
pub async fn load_movements(
    conn: &mut PgConnection,
    product_code: Option<&str>,
    as_of: Option<&str>,
) -> CoreResult<Vec<StockMovement>> {
    let rows = sqlx::query_as::<_, MovementRow>(
        r#"
        SELECT id, product_code, transaction_date, flag, quantity_in_catalog_unit
        FROM transaction_records
        WHERE ($1::TEXT IS NULL OR product_code = $1)
          AND ($2::TEXT IS NULL OR transaction_date <= $2)
        ORDER BY transaction_date, id
        "#,
    )
    .bind(product_code)
    .bind(as_of)
    .fetch_all(&mut *conn)
    .await
    .map_err(|e| CoreError::CalculationFailure(e.to_string()))?;

    Ok(rows.into_iter().map(Into::into).collect())
}

/// Balance of one product
#[derive(Debug, Clone, Serialize)]
pub struct StockBalance {
    pub product_code: String,
    pub as_of: Option<String>,
    pub quantity: Decimal,
}

/// Stock calculator service
#[derive(Clone)]
pub struct StockService {
    db: PgPool,
}

impl StockService {
    /// Create a new StockService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Balance of one product, now or as of a `YYYYMMDD` date.
    /// A product with no rows has a zero balance.
    pub async fn balance_as_of(&self, product_code: &str, as_of: Option<&str>) -> AppResult<StockBalance> {
        let mut conn = self.db.acquire().await?;
        let movements = load_movements(&mut conn, Some(product_code), as_of).await?;

        Ok(StockBalance {
            product_code: product_code.to_string(),
            as_of: as_of.map(str::to_string),
            quantity: stock::balance_as_of(&movements, as_of),
        })
    }

    /// Current balance of every product with ledger rows, by product code
    pub async fn all_balances(&self) -> AppResult<Vec<StockBalance>> {
        let mut conn = self.db.acquire().await?;
        let movements = load_movements(&mut conn, None, None).await?;

        let mut balances: Vec<StockBalance> = stock::all_balances(&movements)
            .into_iter()
            .map(|(product_code, quantity)| StockBalance {
                product_code,
                as_of: None,
                quantity,
            })
            .collect();
        balances.sort_by(|a, b| a.product_code.cmp(&b.product_code));

        tracing::debug!(products = balances.len(), "bulk balances computed");
        Ok(balances)
    }
}
