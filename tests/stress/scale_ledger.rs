//! Scale test: 10K-entry ledgers.
//!
//! Validates that the in-memory index, the query layer, and the service
//! stay exact as the ledger grows.

use levelbook::index::LedgerIndex;
use levelbook::query::query_entries;
use levelbook::{
    CategoryId, EntryDraft, EntryId, LedgerQuery, OwnerId, ProgressionService, SortOrder, XpEntry,
    XpSource,
};

fn scale_entry(owner: &OwnerId, i: u64) -> XpEntry {
    let category = match i % 3 {
        0 => "cat_body",
        1 => "cat_mind",
        _ => "cat_soul",
    };
    XpEntry {
        id: EntryId(format!("xp_scale{i}")),
        owner: owner.clone(),
        category: CategoryId(category.to_string()),
        sub_category: None,
        amount: (i % 10) as i64 + 1,
        source: XpSource::Manual,
        recorded_at: i * 1_000_000,
        note: None,
    }
}

#[test]
fn stress_10k_entry_index() {
    let owner = OwnerId::derive("scale-index");
    let entries: Vec<XpEntry> = (0..10_000).map(|i| scale_entry(&owner, i)).collect();

    let idx = LedgerIndex::from_entries(entries);
    assert_eq!(idx.len(), 10_000);

    // Each block of 10 amounts sums to 55
    assert_eq!(idx.total_amount(), 55 * 1_000);

    // Category fan-out stays exact
    assert_eq!(idx.by_category(&CategoryId("cat_body".into())).len(), 3_334);
    assert_eq!(idx.by_category(&CategoryId("cat_mind".into())).len(), 3_333);
    assert_eq!(idx.by_category(&CategoryId("cat_soul".into())).len(), 3_333);

    // A 1000-second slice returns exactly its 1000 entries, inclusive
    let slice = idx.by_time_range(1_000 * 1_000_000, 1_999 * 1_000_000);
    assert_eq!(slice.len(), 1_000);
    assert!(slice.iter().all(|e| e.recorded_at >= 1_000 * 1_000_000));
    assert!(slice.iter().all(|e| e.recorded_at <= 1_999 * 1_000_000));

    // Filtered, sorted, limited query over the full index
    let page = query_entries(
        &idx,
        &LedgerQuery {
            category: Some(CategoryId("cat_body".into())),
            sort: SortOrder::NewestFirst,
            limit: Some(100),
            ..Default::default()
        },
    );
    assert_eq!(page.len(), 100);
    assert_eq!(page[0].recorded_at, 9_999 * 1_000_000);
    assert!(page
        .windows(2)
        .all(|pair| pair[0].recorded_at >= pair[1].recorded_at));
}

#[test]
fn stress_index_churn() {
    let owner = OwnerId::derive("scale-churn");
    let mut idx = LedgerIndex::new();

    for i in 0..2_000 {
        idx.insert(scale_entry(&owner, i));
    }
    let full_total = idx.total_amount();

    // Remove every even entry
    let mut removed_total = 0;
    for i in (0..2_000).step_by(2) {
        let removed = idx
            .remove(&EntryId(format!("xp_scale{i}")))
            .expect("entry should be removable");
        removed_total += removed.amount;
    }

    assert_eq!(idx.len(), 1_000);
    assert_eq!(idx.total_amount(), full_total - removed_total);

    // Removed IDs are gone from every view
    assert!(idx.get(&EntryId("xp_scale0".into())).is_none());
    assert!(idx.get(&EntryId("xp_scale1".into())).is_some());
    assert!(idx.by_time_range(0, u64::MAX).len() == 1_000);

    // Removing twice is a no-op
    assert!(idx.remove(&EntryId("xp_scale0".into())).is_none());
}

#[test]
fn stress_1k_appends_through_service() {
    let tmp = tempfile::tempdir().unwrap();
    let svc = ProgressionService::new(tmp.path()).expect("service should open");

    let profile = svc.create_owner("scale-service").unwrap();
    let owner = profile.owner;
    let category = svc.add_category(&owner, "Body", None, None).unwrap();

    for _ in 0..1_000 {
        svc.append_xp(&owner, EntryDraft::new(category.id.clone(), 5))
            .expect("append should succeed");
    }

    let profile = svc.profile(&owner).unwrap();
    assert_eq!(profile.total_xp, 5_000);
    assert_eq!(profile.level, 51);
    assert_eq!(profile.rank, "A");

    // Pagination covers the whole ledger with no gaps
    let mut seen = 0;
    for page in 1..=10 {
        let entries = svc.list_xp(&owner, page, 100).unwrap();
        assert_eq!(entries.len(), 100, "page {page} should be full");
        seen += entries.len();
    }
    assert_eq!(seen, 1_000);
    assert!(svc.list_xp(&owner, 11, 100).unwrap().is_empty());

    // A fresh service re-hydrates the same ledger from disk
    drop(svc);
    let svc = ProgressionService::new(tmp.path()).expect("service should reopen");
    let outcome = svc.recompute(&owner).unwrap();
    assert_eq!(outcome.profile.total_xp, 5_000);
    assert_eq!(outcome.profile.level, 51);
}
