//! Sequence generator for minted catalog group and product codes

use serde::Serialize;
use shared::{format_sequence_code, max_numeric_suffix, next_sequence_value, CoreError, CoreResult};
use sqlx::{PgConnection, PgPool};

use crate::error::{AppError, AppResult};

/// Named sequences and the codes they feed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SequenceKind {
    CatalogGroup,
    ProductCode,
}

impl SequenceKind {
    pub fn name(&self) -> &'static str {
        match self {
            SequenceKind::CatalogGroup => "catalog_group",
            SequenceKind::ProductCode => "product_code",
        }
    }

    pub fn prefix(&self) -> &'static str {
        match self {
            SequenceKind::CatalogGroup => "MA4",
            SequenceKind::ProductCode => "MA2",
        }
    }

    pub fn padding(&self) -> usize {
        9
    }

    /// `product_master` column holding codes minted from this sequence
    fn column(&self) -> &'static str {
        match self {
            SequenceKind::CatalogGroup => "catalog_group_code",
            SequenceKind::ProductCode => "product_code",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "catalog_group" => Some(SequenceKind::CatalogGroup),
            "product_code" => Some(SequenceKind::ProductCode),
            _ => None,
        }
    }
}

/// Issue the next code for `kind` inside the caller's transaction
pub async fn next_code(conn: &mut PgConnection, kind: SequenceKind) -> CoreResult<String> {
    next(conn, kind.name(), kind.prefix(), kind.padding()).await
}

/// Increment sequence `name` and format the new value.
///
/// The row is locked until the surrounding transaction ends; a rollback
/// undoes the increment.
pub async fn next(conn: &mut PgConnection, name: &str, prefix: &str, padding: usize) -> CoreResult<String> {
    let last_no: Option<i64> =
        sqlx::query_scalar("SELECT last_no FROM code_sequences WHERE name = $1 FOR UPDATE")
            .bind(name)
            .fetch_optional(&mut *conn)
            .await
            .map_err(|e| CoreError::ResolutionFailure(e.to_string()))?;

    let next_no = next_sequence_value(name, last_no)?;

    sqlx::query("UPDATE code_sequences SET last_no = $1 WHERE name = $2")
        .bind(next_no)
        .bind(name)
        .execute(&mut *conn)
        .await
        .map_err(|e| CoreError::ResolutionFailure(e.to_string()))?;

    Ok(format_sequence_code(prefix, next_no, padding))
}

/// Sequence maintenance after bulk imports that bypassed issuance
#[derive(Clone)]
pub struct SequenceService {
    db: PgPool,
}

#[derive(Debug, Clone, Serialize)]
pub struct SequenceReset {
    pub name: String,
    pub last_no: i64,
}

impl SequenceService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Set `last_no` to the highest numeric suffix among existing codes
    pub async fn reset(&self, kind: SequenceKind) -> AppResult<SequenceReset> {
        let mut tx = self.db.begin().await?;

        let exists: Option<i64> =
            sqlx::query_scalar("SELECT last_no FROM code_sequences WHERE name = $1 FOR UPDATE")
                .bind(kind.name())
                .fetch_optional(&mut *tx)
                .await?;
        if exists.is_none() {
            return Err(AppError::NotFound(format!("Sequence {}", kind.name())));
        }

        let query = format!(
            "SELECT {col} FROM product_master WHERE {col} LIKE $1",
            col = kind.column()
        );
        let codes: Vec<String> = sqlx::query_scalar(&query)
            .bind(format!("{}%", kind.prefix()))
            .fetch_all(&mut *tx)
            .await?;
        let last_no = max_numeric_suffix(codes.iter().map(String::as_str), kind.prefix());

        sqlx::query("UPDATE code_sequences SET last_no = $1 WHERE name = $2")
            .bind(last_no)
            .bind(kind.name())
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        tracing::info!(sequence = kind.name(), last_no, "sequence reset");
        Ok(SequenceReset {
            name: kind.name().to_string(),
            last_no,
        })
    }
}
