//! Stress test: create many owners, verify all have unique IDs, and all
//! keep fully isolated ledgers and profiles.

use std::collections::HashSet;

use levelbook::{EntryDraft, OwnerId, ProgressionService};

#[test]
fn stress_1000_unique_owner_ids() {
    let mut ids = HashSet::new();

    // Derive 1000 owner IDs
    for i in 0..1000 {
        let id = OwnerId::derive(&format!("owner-{i}"));

        // Each ID must be unique
        assert!(
            ids.insert(id.0.clone()),
            "Duplicate owner ID found: {}",
            id.0
        );
        assert!(id.0.starts_with("own_"));
    }

    assert_eq!(ids.len(), 1000);
}

#[test]
fn stress_50_owners_with_isolated_ledgers() {
    let tmp = tempfile::tempdir().unwrap();
    let svc = ProgressionService::new(tmp.path()).expect("service should open");

    let mut owners = Vec::with_capacity(50);

    // Each owner gets their own category and a distinct XP total
    for i in 0..50u32 {
        let profile = svc
            .create_owner(&format!("owner-{i}"))
            .expect("owner creation should succeed");
        let category = svc
            .add_category(&profile.owner, "Body", None, None)
            .expect("category should be added");

        let amount = i64::from(i + 1) * 10;
        svc.append_xp(&profile.owner, EntryDraft::new(category.id, amount))
            .expect("append should succeed");

        owners.push((profile.owner, amount));
    }

    // Every profile reports exactly its own total
    for (owner, amount) in &owners {
        let profile = svc.profile(owner).expect("profile should load");
        assert_eq!(
            profile.total_xp, *amount,
            "owner {owner} should keep an isolated total"
        );
        assert_eq!(svc.list_xp(owner, 1, 100).unwrap().len(), 1);
    }

    // The listing covers everyone exactly once
    let listed = svc.list_owners().expect("listing should succeed");
    assert_eq!(listed.len(), 50);
    let listed: HashSet<_> = listed.into_iter().collect();
    for (owner, _) in &owners {
        assert!(listed.contains(owner), "owner {owner} should be listed");
    }
}

#[test]
fn stress_owner_recompute_storm() {
    let tmp = tempfile::tempdir().unwrap();
    let svc = ProgressionService::new(tmp.path()).unwrap();

    let profile = svc.create_owner("storm").unwrap();
    let owner = profile.owner;
    let category = svc.add_category(&owner, "Body", None, None).unwrap();

    for _ in 0..20 {
        svc.append_xp(&owner, EntryDraft::new(category.id.clone(), 7))
            .unwrap();
    }

    // Repeated recomputes never drift
    for _ in 0..100 {
        let outcome = svc.recompute(&owner).unwrap();
        assert_eq!(outcome.profile.total_xp, 140);
        assert_eq!(outcome.profile.level, 2);
        assert!(!outcome.leveled_up());
        assert!(!outcome.leveled_down());
    }
}
