//! Product master persistence, read-time superseding, manual catalog edits and cleanup

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use shared::resolver::{supersede_all, MasterStore};
use shared::{
    ledger_date_days_before, stock, validate_package_ratio, validate_product_code, CoreError,
    CoreResult, MasterFilter, Origin, ProductMaster, ReferenceEntry,
};
use sqlx::{FromRow, PgConnection, PgPool};
use validator::Validate;

use super::sequence::{self, SequenceKind};
use super::stock::load_movements;
use crate::error::{AppError, AppResult};

const MASTER_COLUMNS: &str = "product_code, catalog_group_code, product_name, kana_name, maker_name, \
     package_form, package_spec, usage_class, pack_qty_catalog_unit, pack_qty_product_unit, \
     catalog_unit_code, catalog_unit_name, product_unit_code, product_unit_name, \
     reference_price, purchase_price, is_narcotic, is_psychotropic, is_poison, is_deleterious";

/// Row for `product_master` queries
#[derive(Debug, FromRow)]
struct MasterRow {
    product_code: String,
    catalog_group_code: String,
    product_name: String,
    kana_name: String,
    maker_name: String,
    package_form: String,
    package_spec: String,
    usage_class: String,
    pack_qty_catalog_unit: Decimal,
    pack_qty_product_unit: Decimal,
    catalog_unit_code: String,
    catalog_unit_name: String,
    product_unit_code: String,
    product_unit_name: String,
    reference_price: Decimal,
    purchase_price: Decimal,
    is_narcotic: bool,
    is_psychotropic: bool,
    is_poison: bool,
    is_deleterious: bool,
    origin: String,
}

impl From<MasterRow> for ProductMaster {
    fn from(r: MasterRow) -> Self {
        ProductMaster {
            product_code: r.product_code,
            catalog_group_code: r.catalog_group_code,
            product_name: r.product_name,
            kana_name: r.kana_name,
            maker_name: r.maker_name,
            package_form: r.package_form,
            package_spec: r.package_spec,
            usage_class: r.usage_class,
            pack_qty_catalog_unit: r.pack_qty_catalog_unit,
            pack_qty_product_unit: r.pack_qty_product_unit,
            catalog_unit_code: r.catalog_unit_code,
            catalog_unit_name: r.catalog_unit_name,
            product_unit_code: r.product_unit_code,
            product_unit_name: r.product_unit_name,
            reference_price: r.reference_price,
            purchase_price: r.purchase_price,
            is_narcotic: r.is_narcotic,
            is_psychotropic: r.is_psychotropic,
            is_poison: r.is_poison,
            is_deleterious: r.is_deleterious,
            origin: Origin::from_tag(&r.origin),
        }
    }
}

/// Row for `reference_products` queries
#[derive(Debug, FromRow)]
struct ReferenceRow {
    product_code: String,
    catalog_group_code: String,
    product_name: String,
    kana_name: String,
    maker_name: String,
    package_form: String,
    package_spec: String,
    usage_class: String,
    pack_qty_catalog_unit: Decimal,
    pack_qty_product_unit: Decimal,
    catalog_unit_code: String,
    catalog_unit_name: String,
    product_unit_code: String,
    product_unit_name: String,
    reference_price: Decimal,
    purchase_price: Decimal,
    is_narcotic: bool,
    is_psychotropic: bool,
    is_poison: bool,
    is_deleterious: bool,
}

impl From<ReferenceRow> for ReferenceEntry {
    fn from(r: ReferenceRow) -> Self {
        ReferenceEntry {
            product_code: r.product_code,
            product_name: r.product_name,
            kana_name: r.kana_name,
            maker_name: r.maker_name,
            catalog_group_code: r.catalog_group_code,
            package_form: r.package_form,
            package_spec: r.package_spec,
            usage_class: r.usage_class,
            pack_qty_catalog_unit: r.pack_qty_catalog_unit,
            pack_qty_product_unit: r.pack_qty_product_unit,
            catalog_unit_code: r.catalog_unit_code,
            catalog_unit_name: r.catalog_unit_name,
            product_unit_code: r.product_unit_code,
            product_unit_name: r.product_unit_name,
            reference_price: r.reference_price,
            purchase_price: r.purchase_price,
            is_narcotic: r.is_narcotic,
            is_psychotropic: r.is_psychotropic,
            is_poison: r.is_poison,
            is_deleterious: r.is_deleterious,
        }
    }
}

/// Masters for the given product codes
pub async fn load_masters(conn: &mut PgConnection, codes: &[String]) -> Result<Vec<ProductMaster>, sqlx::Error> {
    let query = format!(
        "SELECT {}, origin FROM product_master WHERE product_code = ANY($1)",
        MASTER_COLUMNS
    );
    let rows = sqlx::query_as::<_, MasterRow>(&query)
        .bind(codes)
        .fetch_all(&mut *conn)
        .await?;
    Ok(rows.into_iter().map(Into::into).collect())
}

/// Reference entries for the given product codes
pub async fn load_references(conn: &mut PgConnection, codes: &[String]) -> Result<Vec<ReferenceEntry>, sqlx::Error> {
    let query = format!(
        "SELECT {} FROM reference_products WHERE product_code = ANY($1)",
        MASTER_COLUMNS
    );
    let rows = sqlx::query_as::<_, ReferenceRow>(&query)
        .bind(codes)
        .fetch_all(&mut *conn)
        .await?;
    Ok(rows.into_iter().map(Into::into).collect())
}

/// Stored masters as readers see them: provisional ones are superseded by
/// reference entries that now cover their product codes
pub async fn supersede_from_references(
    conn: &mut PgConnection,
    masters: Vec<ProductMaster>,
) -> Result<Vec<ProductMaster>, sqlx::Error> {
    let codes: Vec<String> = masters
        .iter()
        .filter(|m| m.origin == Origin::Provisional)
        .map(|m| m.product_code.clone())
        .collect();
    if codes.is_empty() {
        return Ok(masters);
    }
    let references = load_references(&mut *conn, &codes).await?;
    Ok(supersede_all(masters, &references))
}

/// Insert a new master
async fn write_master(conn: &mut PgConnection, m: &ProductMaster) -> Result<(), sqlx::Error> {
    let query = format!(
        "INSERT INTO product_master ({}, origin) VALUES \
         ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18, $19, $20, $21)",
        MASTER_COLUMNS
    );

    sqlx::query(&query)
        .bind(&m.product_code)
        .bind(&m.catalog_group_code)
        .bind(&m.product_name)
        .bind(&m.kana_name)
        .bind(&m.maker_name)
        .bind(&m.package_form)
        .bind(&m.package_spec)
        .bind(&m.usage_class)
        .bind(m.pack_qty_catalog_unit)
        .bind(m.pack_qty_product_unit)
        .bind(&m.catalog_unit_code)
        .bind(&m.catalog_unit_name)
        .bind(&m.product_unit_code)
        .bind(&m.product_unit_name)
        .bind(m.reference_price)
        .bind(m.purchase_price)
        .bind(m.is_narcotic)
        .bind(m.is_psychotropic)
        .bind(m.is_poison)
        .bind(m.is_deleterious)
        .bind(m.origin.as_tag())
        .execute(&mut *conn)
        .await?;
    Ok(())
}

/// [`MasterStore`] over an open PostgreSQL transaction
pub struct PgMasterStore<'c> {
    conn: &'c mut PgConnection,
}

impl<'c> PgMasterStore<'c> {
    pub fn new(conn: &'c mut PgConnection) -> Self {
        Self { conn }
    }
}

#[async_trait]
impl MasterStore for PgMasterStore<'_> {
    async fn next_catalog_group_code(&mut self) -> CoreResult<String> {
        sequence::next_code(&mut *self.conn, SequenceKind::CatalogGroup).await
    }

    async fn insert_master(&mut self, master: &ProductMaster) -> CoreResult<()> {
        write_master(&mut *self.conn, master)
            .await
            .map_err(|e| CoreError::ResolutionFailure(e.to_string()))
    }
}

/// Input for an operator-entered master
#[derive(Debug, Deserialize, Validate)]
pub struct CreateMasterInput {
    pub product_code: Option<String>,
    pub catalog_group_code: Option<String>,
    #[validate(length(min = 1, max = 200))]
    pub product_name: String,
    #[serde(default)]
    pub kana_name: String,
    #[serde(default)]
    pub maker_name: String,
    #[serde(default)]
    pub package_form: String,
    #[serde(default)]
    pub package_spec: String,
    #[serde(default)]
    #[validate(length(max = 8))]
    pub usage_class: String,
    #[serde(default)]
    pub pack_qty_catalog_unit: Decimal,
    #[serde(default)]
    pub pack_qty_product_unit: Decimal,
    #[serde(default)]
    pub catalog_unit_code: String,
    #[serde(default)]
    pub catalog_unit_name: String,
    #[serde(default)]
    pub product_unit_code: String,
    #[serde(default)]
    pub product_unit_name: String,
    #[serde(default)]
    pub reference_price: Decimal,
    #[serde(default)]
    pub purchase_price: Decimal,
    #[serde(default)]
    pub is_narcotic: bool,
    #[serde(default)]
    pub is_psychotropic: bool,
    #[serde(default)]
    pub is_poison: bool,
    #[serde(default)]
    pub is_deleterious: bool,
}

/// Zero-stock master with no recent movement
#[derive(Debug, Clone, Serialize)]
pub struct CleanupCandidate {
    pub product_code: String,
    pub catalog_group_code: String,
    pub product_name: String,
    pub origin: Origin,
    pub last_movement: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CleanupResult {
    pub deleted: Vec<String>,
    pub rejected: Vec<String>,
}

/// Master catalog service
#[derive(Clone)]
pub struct MasterService {
    db: PgPool,
}

impl MasterService {
    /// Create a new MasterService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Get a master by product code, superseded when the reference
    /// catalog now covers it
    pub async fn get(&self, product_code: &str) -> AppResult<ProductMaster> {
        let mut conn = self.db.acquire().await?;
        let stored = load_masters(&mut conn, &[product_code.to_string()]).await?;
        supersede_from_references(&mut conn, stored)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| AppError::NotFound("Product master".to_string()))
    }

    /// Masters matching a ledger filter, ordered by product code
    pub async fn list_matching(&self, filter: &MasterFilter) -> AppResult<Vec<ProductMaster>> {
        let query = format!(
            "SELECT {}, origin FROM product_master ORDER BY product_code",
            MASTER_COLUMNS
        );
        let mut conn = self.db.acquire().await?;
        let rows = sqlx::query_as::<_, MasterRow>(&query)
            .fetch_all(&mut *conn)
            .await?;

        let stored: Vec<ProductMaster> = rows.into_iter().map(ProductMaster::from).collect();
        Ok(supersede_from_references(&mut conn, stored)
            .await?
            .into_iter()
            .filter(|m| filter.matches(m))
            .collect())
    }

    /// Create an operator-entered master, minting missing codes
    pub async fn create_manual(&self, input: CreateMasterInput) -> AppResult<ProductMaster> {
        input.validate()?;
        validate_package_ratio(input.pack_qty_catalog_unit)
            .map_err(|m| AppError::validation("pack_qty_catalog_unit", m))?;
        validate_package_ratio(input.pack_qty_product_unit)
            .map_err(|m| AppError::validation("pack_qty_product_unit", m))?;

        let given_code = input
            .product_code
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .map(str::to_string);
        if let Some(code) = &given_code {
            validate_product_code(code).map_err(|m| AppError::validation("product_code", m))?;
        }

        let mut tx = self.db.begin().await?;

        let product_code = match given_code {
            Some(code) => {
                let exists = sqlx::query_scalar::<_, bool>(
                    "SELECT EXISTS(SELECT 1 FROM product_master WHERE product_code = $1)",
                )
                .bind(&code)
                .fetch_one(&mut *tx)
                .await?;
                if exists {
                    return Err(AppError::Conflict(format!("Product master {} already exists", code)));
                }
                code
            }
            None => sequence::next_code(&mut tx, SequenceKind::ProductCode).await?,
        };

        let catalog_group_code = match input
            .catalog_group_code
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
        {
            Some(code) => code.to_string(),
            None => sequence::next_code(&mut tx, SequenceKind::CatalogGroup).await?,
        };

        let master = ProductMaster {
            product_code,
            catalog_group_code,
            product_name: input.product_name.trim().to_string(),
            kana_name: input.kana_name,
            maker_name: input.maker_name,
            package_form: input.package_form,
            package_spec: input.package_spec,
            usage_class: input.usage_class,
            pack_qty_catalog_unit: input.pack_qty_catalog_unit,
            pack_qty_product_unit: input.pack_qty_product_unit,
            catalog_unit_code: input.catalog_unit_code,
            catalog_unit_name: input.catalog_unit_name,
            product_unit_code: input.product_unit_code,
            product_unit_name: input.product_unit_name,
            reference_price: input.reference_price,
            purchase_price: input.purchase_price,
            is_narcotic: input.is_narcotic,
            is_psychotropic: input.is_psychotropic,
            is_poison: input.is_poison,
            is_deleterious: input.is_deleterious,
            origin: Origin::Manual,
        };

        write_master(&mut tx, &master).await?;
        tx.commit().await?;

        tracing::info!(product_code = %master.product_code, "manual master created");
        Ok(master)
    }

    /// Zero-stock masters with no movement in the last `idle_days`
    pub async fn cleanup_candidates(&self, idle_days: u32) -> AppResult<Vec<CleanupCandidate>> {
        let mut conn = self.db.acquire().await?;
        let cutoff = ledger_date_days_before(Utc::now().date_naive(), idle_days);
        find_idle_masters(&mut conn, &cutoff, None).await
    }

    /// Delete the requested masters that still qualify for cleanup.
    ///
    /// Both conditions are checked again inside the delete transaction;
    /// codes that no longer qualify are reported back untouched.
    pub async fn delete_idle(&self, codes: Vec<String>, idle_days: u32) -> AppResult<CleanupResult> {
        let cutoff = ledger_date_days_before(Utc::now().date_naive(), idle_days);
        let mut tx = self.db.begin().await?;

        let eligible: Vec<String> = find_idle_masters(&mut tx, &cutoff, Some(codes.as_slice()))
            .await?
            .into_iter()
            .map(|c| c.product_code)
            .collect();

        sqlx::query("DELETE FROM product_master WHERE product_code = ANY($1)")
            .bind(&eligible)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        let rejected = codes.into_iter().filter(|c| !eligible.contains(c)).collect();
        tracing::info!(deleted = eligible.len(), "idle masters deleted");
        Ok(CleanupResult {
            deleted: eligible,
            rejected,
        })
    }
}

/// Masters whose bulk balance is zero and whose last movement is before
/// `cutoff`, optionally restricted to `only`
async fn find_idle_masters(
    conn: &mut PgConnection,
    cutoff: &str,
    only: Option<&[String]>,
) -> AppResult<Vec<CleanupCandidate>> {
    let query = format!(
        "SELECT {}, origin FROM product_master ORDER BY product_code",
        MASTER_COLUMNS
    );
    let masters: Vec<ProductMaster> = sqlx::query_as::<_, MasterRow>(&query)
        .fetch_all(&mut *conn)
        .await?
        .into_iter()
        .map(Into::into)
        .filter(|m: &ProductMaster| only.map_or(true, |codes| codes.contains(&m.product_code)))
        .collect();

    let movements = load_movements(&mut *conn, None, None).await?;
    let balances = stock::all_balances(&movements);

    let mut last_movement: HashMap<&str, &str> = HashMap::new();
    for mv in &movements {
        let entry = last_movement.entry(mv.product_code.as_str()).or_insert("");
        if mv.transaction_date.as_str() > *entry {
            *entry = mv.transaction_date.as_str();
        }
    }

    Ok(masters
        .into_iter()
        .filter(|m| balances.get(&m.product_code).map_or(true, |b| b.is_zero()))
        .filter_map(|m| {
            let last = last_movement.get(m.product_code.as_str()).map(|d| d.to_string());
            match &last {
                Some(d) if d.as_str() >= cutoff => None,
                _ => Some(CleanupCandidate {
                    product_code: m.product_code,
                    catalog_group_code: m.catalog_group_code,
                    product_name: m.product_name,
                    origin: m.origin,
                    last_movement: last,
                }),
            }
        })
        .collect())
}
