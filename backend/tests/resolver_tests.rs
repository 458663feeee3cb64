//! Master resolution tests
//!
//! Tests for find-or-create against an in-memory store:
//! - Cached masters never touch the store
//! - Sentinel and empty codes falling back to the display name
//! - Reference catalog hits becoming authoritative masters
//! - Sequence failures aborting resolution
//! - Provisional masters superseded by later reference entries

use async_trait::async_trait;
use rust_decimal::Decimal;
use shared::resolver::{
    batch_codes, find_or_create, supersede, supersede_all, MasterStore, Resolution, ResolutionContext,
};
use shared::{format_sequence_code, CoreError, CoreResult, Origin, ProductMaster, ReferenceEntry};
use std::str::FromStr;

// Helper to create Decimal from string
fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

/// Store double recording every write
#[derive(Default)]
struct MemoryStore {
    last_group_no: i64,
    inserted: Vec<ProductMaster>,
    fail_sequence: bool,
    missing_sequence: bool,
    fail_insert: bool,
}

#[async_trait]
impl MasterStore for MemoryStore {
    async fn next_catalog_group_code(&mut self) -> CoreResult<String> {
        if self.fail_sequence {
            return Err(CoreError::ResolutionFailure("sequence row locked".to_string()));
        }
        if self.missing_sequence {
            return Err(CoreError::NotFound("sequence catalog_group".to_string()));
        }
        self.last_group_no += 1;
        Ok(format_sequence_code("MA4", self.last_group_no, 9))
    }

    async fn insert_master(&mut self, master: &ProductMaster) -> CoreResult<()> {
        if self.fail_insert {
            return Err(CoreError::ResolutionFailure("duplicate product code".to_string()));
        }
        self.inserted.push(master.clone());
        Ok(())
    }
}

fn reference(code: &str, name: &str, group: &str) -> ReferenceEntry {
    ReferenceEntry {
        product_code: code.to_string(),
        product_name: name.to_string(),
        kana_name: "アセトアミノフェン".to_string(),
        maker_name: "Example Pharma".to_string(),
        catalog_group_code: group.to_string(),
        package_form: "PTP".to_string(),
        package_spec: "100T".to_string(),
        usage_class: "1".to_string(),
        pack_qty_catalog_unit: dec("100"),
        pack_qty_product_unit: dec("10"),
        catalog_unit_code: "T".to_string(),
        catalog_unit_name: "錠".to_string(),
        product_unit_code: "S".to_string(),
        product_unit_name: "シート".to_string(),
        reference_price: dec("5.9"),
        purchase_price: dec("500"),
        is_narcotic: false,
        is_psychotropic: false,
        is_poison: false,
        is_deleterious: false,
    }
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod unit_tests {
    use super::*;

    /// Resolving the same key twice creates one master
    #[test]
    fn test_find_or_create_is_idempotent() {
        tokio_test::block_on(async {
            let mut store = MemoryStore::default();
            let mut ctx = ResolutionContext::default();

            let (first, how_first) = find_or_create(&mut store, &mut ctx, "4987123456789", "ACME TABLET")
                .await
                .unwrap();
            let (second, how_second) = find_or_create(&mut store, &mut ctx, "4987123456789", "ACME TABLET")
                .await
                .unwrap();

            assert_eq!(how_first, Resolution::Provisional);
            assert_eq!(how_second, Resolution::Cached);
            assert_eq!(first, second);
            assert_eq!(store.inserted.len(), 1);
            assert_eq!(ctx.created(), 1);
        });
    }

    /// Sentinel and empty codes resolve to the same name-keyed master
    #[test]
    fn test_sentinel_code_resolves_by_name() {
        tokio_test::block_on(async {
            let mut store = MemoryStore::default();
            let mut ctx = ResolutionContext::default();

            let (zeros, _) = find_or_create(&mut store, &mut ctx, "0000000000000", "ACME TABLET")
                .await
                .unwrap();
            let (blank, how) = find_or_create(&mut store, &mut ctx, "", "ACME TABLET")
                .await
                .unwrap();

            assert_eq!(zeros.product_code, "9999999999999ACME TABLET");
            assert_eq!(blank.product_code, zeros.product_code);
            assert_eq!(how, Resolution::Cached);
            assert_eq!(zeros.origin, Origin::Provisional);
            assert_eq!(zeros.catalog_group_code, "MA4000000001");
            assert_eq!(store.inserted.len(), 1);
        });
    }

    /// Neither code nor name is an input error
    #[test]
    fn test_missing_code_and_name_rejected() {
        tokio_test::block_on(async {
            let mut store = MemoryStore::default();
            let mut ctx = ResolutionContext::default();

            let err = find_or_create(&mut store, &mut ctx, "000", "  ").await.unwrap_err();

            assert!(matches!(err, CoreError::InvalidInput(_)));
            assert!(store.inserted.is_empty());
        });
    }

    /// A usable reference entry becomes an authoritative master with its
    /// own group code
    #[test]
    fn test_reference_entry_becomes_authoritative() {
        tokio_test::block_on(async {
            let mut store = MemoryStore::default();
            let mut ctx = ResolutionContext::new(
                Vec::new(),
                vec![reference("4987000000011", "Acetaminophen 200mg", "1141007F1")],
            );

            let (master, how) = find_or_create(&mut store, &mut ctx, "4987000000011", "whatever")
                .await
                .unwrap();

            assert_eq!(how, Resolution::FromReference);
            assert_eq!(master.origin, Origin::Authoritative);
            assert_eq!(master.catalog_group_code, "1141007F1");
            assert_eq!(master.product_name, "Acetaminophen 200mg");
            assert_eq!(master.pack_qty_catalog_unit, dec("100"));
            assert_eq!(store.last_group_no, 0);
        });
    }

    /// A reference entry without a group code gets one minted
    #[test]
    fn test_reference_without_group_mints_code() {
        tokio_test::block_on(async {
            let mut store = MemoryStore::default();
            let mut ctx = ResolutionContext::new(
                Vec::new(),
                vec![reference("4987000000028", "Loxoprofen 60mg", " ")],
            );

            let (master, _) = find_or_create(&mut store, &mut ctx, "4987000000028", "")
                .await
                .unwrap();

            assert_eq!(master.origin, Origin::Authoritative);
            assert_eq!(master.catalog_group_code, "MA4000000001");
        });
    }

    /// Reference rows without a name are ignored
    #[test]
    fn test_unusable_reference_gives_provisional() {
        tokio_test::block_on(async {
            let mut store = MemoryStore::default();
            let mut ctx = ResolutionContext::new(
                Vec::new(),
                vec![reference("4987000000035", "", "2149001F1")],
            );

            let (master, how) = find_or_create(&mut store, &mut ctx, "4987000000035", "Line name")
                .await
                .unwrap();

            assert_eq!(how, Resolution::Provisional);
            assert_eq!(master.product_code, "4987000000035");
            assert_eq!(master.product_name, "Line name");
            assert_eq!(master.pack_qty_catalog_unit, Decimal::ZERO);
        });
    }

    /// Prefetched masters are returned as they are
    #[test]
    fn test_prefetched_master_is_cached() {
        tokio_test::block_on(async {
            let existing = ProductMaster::provisional(
                "9999999999999GAUZE".to_string(),
                "MA4000000042".to_string(),
                "GAUZE",
            );
            let mut store = MemoryStore::default();
            let mut ctx = ResolutionContext::new(vec![existing.clone()], Vec::new());

            let (master, how) = find_or_create(&mut store, &mut ctx, "", "GAUZE").await.unwrap();

            assert_eq!(how, Resolution::Cached);
            assert_eq!(master, existing);
            assert!(store.inserted.is_empty());
            assert_eq!(ctx.created(), 0);
        });
    }

    /// A failing sequence aborts without writing anything
    #[test]
    fn test_sequence_failure_propagates() {
        tokio_test::block_on(async {
            let mut store = MemoryStore {
                fail_sequence: true,
                ..Default::default()
            };
            let mut ctx = ResolutionContext::default();

            let err = find_or_create(&mut store, &mut ctx, "4987999999999", "Unknown")
                .await
                .unwrap_err();

            assert!(matches!(err, CoreError::ResolutionFailure(_)));
            assert!(store.inserted.is_empty());
            assert_eq!(ctx.created(), 0);
        });
    }

    /// Prefetch codes are distinct and keep first-seen order
    #[test]
    fn test_batch_codes_dedupes_keys() {
        let items = vec![
            ("4987000000011", "A"),
            ("0000000000000", "ACME TABLET"),
            ("4987000000011", "A again"),
            ("", "ACME TABLET"),
            ("", ""),
        ];

        let codes = batch_codes(items);

        assert_eq!(
            codes,
            vec![
                "4987000000011".to_string(),
                "9999999999999ACME TABLET".to_string()
            ]
        );
    }

    /// A missing sequence row is reported as such and writes nothing
    #[test]
    fn test_missing_sequence_is_not_found() {
        tokio_test::block_on(async {
            let mut store = MemoryStore {
                missing_sequence: true,
                ..Default::default()
            };
            let mut ctx = ResolutionContext::default();

            let err = find_or_create(&mut store, &mut ctx, "", "GAUZE")
                .await
                .unwrap_err();

            assert_eq!(err, CoreError::NotFound("sequence catalog_group".to_string()));
            assert!(store.inserted.is_empty());
            assert_eq!(ctx.created(), 0);
        });
    }

    /// A failed insert leaves nothing cached for the key
    #[test]
    fn test_failed_insert_is_not_cached() {
        tokio_test::block_on(async {
            let mut store = MemoryStore {
                fail_insert: true,
                ..Default::default()
            };
            let mut ctx = ResolutionContext::default();

            let err = find_or_create(&mut store, &mut ctx, "4987000000042", "Line name")
                .await
                .unwrap_err();
            assert!(matches!(err, CoreError::ResolutionFailure(_)));
            assert_eq!(ctx.created(), 0);

            store.fail_insert = false;
            let (_, how) = find_or_create(&mut store, &mut ctx, "4987000000042", "Line name")
                .await
                .unwrap();
            assert_eq!(how, Resolution::Provisional);
            assert_eq!(store.inserted.len(), 1);
        });
    }

    /// Placeholders keep the display name exactly as it arrived
    #[test]
    fn test_provisional_keeps_raw_display_name() {
        tokio_test::block_on(async {
            let mut store = MemoryStore::default();
            let mut ctx = ResolutionContext::default();

            let (by_name, _) = find_or_create(&mut store, &mut ctx, "", "  ACME TABLET ")
                .await
                .unwrap();
            let (by_code, _) = find_or_create(&mut store, &mut ctx, "4987000000059", " Gauze 5cm")
                .await
                .unwrap();

            assert_eq!(by_name.product_code, "9999999999999ACME TABLET");
            assert_eq!(by_name.product_name, "  ACME TABLET ");
            assert_eq!(by_code.product_name, " Gauze 5cm");
        });
    }

    /// Incoming codes that start with the synthetic prefix stay codes
    #[test]
    fn test_prefixed_incoming_code_is_a_real_code() {
        tokio_test::block_on(async {
            let mut store = MemoryStore::default();
            let mut ctx = ResolutionContext::new(
                Vec::new(),
                vec![reference("9999999999999123", "Odd Code Tablet", "3999001F1")],
            );

            let (master, how) = find_or_create(&mut store, &mut ctx, "9999999999999123", "Line name")
                .await
                .unwrap();

            assert_eq!(how, Resolution::FromReference);
            assert_eq!(master.product_code, "9999999999999123");
            assert_eq!(master.origin, Origin::Authoritative);
        });
    }

    /// A prefetched provisional master is read through a reference entry
    /// that now covers its code; nothing is written
    #[test]
    fn test_prefetched_provisional_is_superseded() {
        tokio_test::block_on(async {
            let stored = ProductMaster::provisional(
                "4987000000011".to_string(),
                "MA4000000007".to_string(),
                "acetaminophen?",
            );
            let mut store = MemoryStore::default();
            let mut ctx = ResolutionContext::new(
                vec![stored],
                vec![reference("4987000000011", "Acetaminophen 200mg", "1141007F1")],
            );

            let (master, how) = find_or_create(&mut store, &mut ctx, "4987000000011", "acetaminophen?")
                .await
                .unwrap();

            assert_eq!(how, Resolution::Cached);
            assert_eq!(master.origin, Origin::Authoritative);
            assert_eq!(master.product_name, "Acetaminophen 200mg");
            assert_eq!(master.catalog_group_code, "1141007F1");
            assert!(store.inserted.is_empty());
        });
    }

    /// Superseding keeps the stored group code when the entry has none
    #[test]
    fn test_supersede_keeps_stored_group_code() {
        let stored = ProductMaster::provisional(
            "4987000000028".to_string(),
            "MA4000000003".to_string(),
            "loxo",
        );
        let entry = reference("4987000000028", "Loxoprofen 60mg", "");

        let seen = supersede(stored, Some(&entry));

        assert_eq!(seen.origin, Origin::Authoritative);
        assert_eq!(seen.catalog_group_code, "MA4000000003");
        assert_eq!(seen.pack_qty_catalog_unit, dec("100"));
    }

    /// Only provisional masters with a usable matching entry are superseded
    #[test]
    fn test_supersede_leaves_other_masters_alone() {
        let manual = ProductMaster {
            origin: Origin::Manual,
            ..ProductMaster::provisional("4987000000011".to_string(), "MA4000000001".to_string(), "Manual")
        };
        let unusable = ProductMaster::provisional(
            "4987000000035".to_string(),
            "MA4000000002".to_string(),
            "No name entry",
        );
        let uncovered = ProductMaster::provisional(
            "9999999999999GAUZE".to_string(),
            "MA4000000003".to_string(),
            "GAUZE",
        );
        let references = vec![
            reference("4987000000011", "Acetaminophen 200mg", "1141007F1"),
            reference("4987000000035", "", "2149001F1"),
        ];

        let seen = supersede_all(
            vec![manual.clone(), unusable.clone(), uncovered.clone()],
            &references,
        );

        assert_eq!(seen, vec![manual, unusable, uncovered]);
    }
}
