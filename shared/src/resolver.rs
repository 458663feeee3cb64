//! Master resolution: map a line item onto a product master
//!
//! Resolution runs inside the caller's write transaction. The batch keeps
//! a [`ResolutionContext`] holding the masters and reference entries it
//! prefetched; anything created during the batch is added to it, so a key
//! is resolved against the store at most once per batch.
//!
//! Provisional masters are never rewritten. When the reference catalog
//! later covers a provisional master's product code, readers see the
//! reference entry in its place through [`supersede`].

use std::collections::HashMap;

use async_trait::async_trait;

use crate::error::{CoreError, CoreResult};
use crate::key::ResolutionKey;
use crate::models::{Origin, ProductMaster, ReferenceEntry};

/// Writes the resolver needs from the store, scoped to one transaction
#[async_trait]
pub trait MasterStore: Send {
    /// Issue the next catalog group code from its sequence
    async fn next_catalog_group_code(&mut self) -> CoreResult<String>;

    /// Persist a newly created master
    async fn insert_master(&mut self, master: &ProductMaster) -> CoreResult<()>;
}

/// How a call to [`find_or_create`] was satisfied
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    Cached,
    FromReference,
    Provisional,
}

/// Per-batch snapshot of masters and reference entries.
///
/// Lives exactly as long as one ingestion transaction.
#[derive(Debug, Default)]
pub struct ResolutionContext {
    /// Keyed by storage code, the primary key of the store
    masters: HashMap<String, ProductMaster>,
    references: HashMap<String, ReferenceEntry>,
    created: usize,
}

impl ResolutionContext {
    /// Prefetched masters are cached as seen through [`supersede`]
    pub fn new(masters: Vec<ProductMaster>, references: Vec<ReferenceEntry>) -> Self {
        let references: HashMap<String, ReferenceEntry> = references
            .into_iter()
            .map(|r| (r.product_code.clone(), r))
            .collect();
        Self {
            masters: masters
                .into_iter()
                .map(|m| {
                    let reference = references.get(&m.product_code);
                    let master = supersede(m, reference);
                    (master.product_code.clone(), master)
                })
                .collect(),
            references,
            created: 0,
        }
    }

    pub fn master(&self, key: &ResolutionKey) -> Option<&ProductMaster> {
        self.masters.get(&key.storage_code())
    }

    pub fn reference(&self, product_code: &str) -> Option<&ReferenceEntry> {
        self.references.get(product_code)
    }

    /// Number of masters created through this context
    pub fn created(&self) -> usize {
        self.created
    }
}

/// The master readers should see for a stored record.
///
/// A provisional master is shadowed by a usable reference entry carrying
/// the same product code. The result is authoritative and keeps the stored
/// catalog group code when the entry has none. Every other master is
/// returned as stored.
pub fn supersede(master: ProductMaster, reference: Option<&ReferenceEntry>) -> ProductMaster {
    if master.origin != Origin::Provisional {
        return master;
    }
    match reference.filter(|r| r.is_usable() && r.product_code == master.product_code) {
        Some(entry) => {
            let group_code = if entry.has_catalog_group() {
                entry.catalog_group_code.trim().to_string()
            } else {
                master.catalog_group_code
            };
            entry.to_master(group_code)
        }
        None => master,
    }
}

/// [`supersede`] applied to a batch of stored masters
pub fn supersede_all(masters: Vec<ProductMaster>, references: &[ReferenceEntry]) -> Vec<ProductMaster> {
    let by_code: HashMap<&str, &ReferenceEntry> = references
        .iter()
        .map(|r| (r.product_code.as_str(), r))
        .collect();
    masters
        .into_iter()
        .map(|m| {
            let reference = by_code.get(m.product_code.as_str()).copied();
            supersede(m, reference)
        })
        .collect()
}

/// Distinct storage codes for a batch of line items, in first-seen order.
/// Used to prefetch masters and reference entries in one round trip each.
pub fn batch_codes<'a, I>(items: I) -> Vec<String>
where
    I: IntoIterator<Item = (&'a str, &'a str)>,
{
    let mut seen = std::collections::HashSet::new();
    items
        .into_iter()
        .filter_map(|(code, name)| ResolutionKey::for_item(code, name))
        .map(|key| key.storage_code())
        .filter(|code| seen.insert(code.clone()))
        .collect()
}

/// Return the master for a line item, creating it when needed.
///
/// A cached master is returned without touching the store. Otherwise a
/// real product code with a usable reference entry becomes an
/// authoritative master; anything else becomes a provisional placeholder
/// with a freshly minted catalog group code.
pub async fn find_or_create<S>(
    store: &mut S,
    ctx: &mut ResolutionContext,
    product_code: &str,
    display_name: &str,
) -> CoreResult<(ProductMaster, Resolution)>
where
    S: MasterStore + ?Sized,
{
    let key = ResolutionKey::for_item(product_code, display_name).ok_or_else(|| {
        CoreError::InvalidInput("line item has neither a product code nor a name".to_string())
    })?;

    let storage_code = key.storage_code();
    if let Some(master) = ctx.masters.get(&storage_code) {
        return Ok((master.clone(), Resolution::Cached));
    }

    let reference = match &key {
        ResolutionKey::ByCode(code) => ctx.references.get(code).filter(|r| r.is_usable()).cloned(),
        ResolutionKey::ByName(_) => None,
    };

    let (master, resolution) = match reference {
        Some(entry) => {
            let group_code = if entry.has_catalog_group() {
                entry.catalog_group_code.trim().to_string()
            } else {
                store.next_catalog_group_code().await?
            };
            (entry.to_master(group_code), Resolution::FromReference)
        }
        None => {
            let group_code = store.next_catalog_group_code().await?;
            let master = ProductMaster::provisional(storage_code.clone(), group_code, display_name);
            (master, Resolution::Provisional)
        }
    };

    store.insert_master(&master).await?;
    tracing::debug!(
        product_code = %master.product_code,
        catalog_group_code = %master.catalog_group_code,
        origin = master.origin.as_tag(),
        "created product master"
    );

    ctx.masters.insert(storage_code, master.clone());
    ctx.created += 1;
    Ok((master, resolution))
}
