//! Integration test: full end-to-end workflow.
//!
//! Tests the complete lifecycle:
//! 1. Create an owner with catalog and rulebook
//! 2. Log XP and watch the profile level up
//! 3. Edit and delete entries (profile follows exactly)
//! 4. Complete habits and read streaks
//! 5. Aggregate radar stats
//! 6. Rewrite the rulebook and recompute under the new rules

use std::collections::BTreeMap;

use levelbook::{
    EntryDraft, EntryPatch, HabitKind, LevelbookError, ProgressionService, RadarRange,
    RulebookPatch,
};

fn two_band_ranks() -> BTreeMap<String, String> {
    let mut map = BTreeMap::new();
    map.insert("1".to_string(), "E".to_string());
    map.insert("5".to_string(), "D".to_string());
    map
}

#[test]
fn full_workflow_owner_to_rulebook_rewrite() {
    let tmp = tempfile::tempdir().unwrap();
    let svc = ProgressionService::new(tmp.path()).expect("service should open");

    // ── Step 1: Create the owner, catalog, and rulebook ─────────────────
    let profile = svc.create_owner("Avery").expect("owner creation should succeed");
    let owner = profile.owner.clone();
    assert!(owner.0.starts_with("own_"));
    assert_eq!(profile.total_xp, 0);
    assert_eq!(profile.level, 1);
    assert_eq!(profile.rank, "E");

    let body = svc
        .add_category(&owner, "Body", Some("#e74c3c".into()), None)
        .expect("category should be added");
    let mind = svc
        .add_category(&owner, "Mind", None, None)
        .expect("category should be added");
    let cardio = svc
        .add_sub_category(&owner, &body.id, "Cardio")
        .expect("sub-category should be added");

    svc.update_rulebook(
        &owner,
        RulebookPatch {
            level_rank_map: Some(two_band_ranks()),
            ..Default::default()
        },
    )
    .expect("rank map update should validate");

    // ── Step 2: Log XP and level up ─────────────────────────────────────
    svc.append_xp(&owner, EntryDraft::new(body.id.clone(), 150))
        .expect("append should succeed");
    let outcome = svc
        .append_xp(
            &owner,
            EntryDraft::new(body.id.clone(), 260).sub_category(cardio.id.clone()),
        )
        .expect("append should succeed");

    // floor(410 / 100) + 1 = 5, which crosses into the "D" band.
    assert_eq!(outcome.profile.total_xp, 410);
    assert_eq!(outcome.profile.level, 5);
    assert_eq!(outcome.profile.rank, "D");
    assert!(outcome.leveled_up());

    // ── Step 3: Edit and delete entries ─────────────────────────────────
    // An extra 50-XP entry, then deleting it, lands back exactly on 410.
    let appended = svc
        .append_xp(&owner, EntryDraft::new(mind.id.clone(), 50))
        .expect("append should succeed");
    assert_eq!(appended.profile.total_xp, 460);

    let newest = svc.list_xp(&owner, 1, 1).expect("list should succeed");
    assert_eq!(newest[0].amount, 50);
    let outcome = svc
        .delete_xp(&owner, &newest[0].id)
        .expect("delete should succeed");
    assert_eq!(outcome.profile.total_xp, 410);
    assert_eq!(outcome.profile.level, 5);
    assert_eq!(outcome.profile.rank, "D");

    // Shrinking the 150-XP entry to 100 drops the profile below the
    // "D" band: 360 XP, level 4, rank "E".
    let entries = svc.list_xp(&owner, 1, 10).expect("list should succeed");
    let oldest = entries.last().expect("ledger should have entries");
    assert_eq!(oldest.amount, 150);
    let oldest_id = oldest.id.clone();
    let outcome = svc
        .update_xp(
            &owner,
            &oldest_id,
            EntryPatch {
                amount: Some(100),
                ..Default::default()
            },
        )
        .expect("update should succeed");
    assert_eq!(outcome.profile.total_xp, 360);
    assert_eq!(outcome.profile.level, 4);
    assert_eq!(outcome.profile.rank, "E");
    assert!(outcome.leveled_down());

    // ── Step 4: Complete habits and read streaks ────────────────────────
    let run = svc
        .add_habit(&owner, "Run", HabitKind::Binary, 25, &body.id, Some(&cardio.id))
        .expect("habit should be added");
    let pushups = svc
        .add_habit(&owner, "Pushups", HabitKind::Counter, 2, &body.id, None)
        .expect("habit should be added");

    let outcome = svc
        .complete_habit(&owner, &run.id, 1, Some("5k".into()))
        .expect("binary completion should succeed");
    assert_eq!(outcome.profile.total_xp, 385);

    let outcome = svc
        .complete_habit(&owner, &pushups.id, 40, None)
        .expect("counter completion should succeed");
    assert_eq!(outcome.profile.total_xp, 385 + 80);

    assert_eq!(svc.streak_for_habit(&owner, &run.id).unwrap(), 1);
    assert_eq!(svc.streak_for_sub_category(&owner, &cardio.id).unwrap(), 1);
    assert_eq!(svc.streak_for_category(&owner, &body.id).unwrap(), 1);

    // ── Step 5: Radar stats ─────────────────────────────────────────────
    let stats = svc
        .radar(&owner, RadarRange::All)
        .expect("radar should aggregate");
    assert_eq!(stats.len(), 2, "every category appears");
    let body_row = stats.iter().find(|s| s.name == "Body").unwrap();
    let mind_row = stats.iter().find(|s| s.name == "Mind").unwrap();
    assert_eq!(body_row.total_xp + mind_row.total_xp, 465);
    assert_eq!(body_row.habit_count, 2);
    assert_eq!(mind_row.habit_count, 0);

    let groups = svc
        .sub_category_radar(&owner)
        .expect("sub radar should aggregate");
    let body_group = groups.iter().find(|g| g.category.name == "Body").unwrap();
    assert_eq!(body_group.sub_categories.len(), 1);
    assert_eq!(body_group.sub_categories[0].name, "Cardio");
    // 260 from the manual cardio entry plus 25 from the run.
    assert_eq!(body_group.sub_categories[0].total_xp, 285);

    // ── Step 6: Rewrite the rulebook ────────────────────────────────────
    let config = svc
        .update_rulebook(
            &owner,
            RulebookPatch {
                xp_level_formula: Some("floor(xp / 50) + 1".into()),
                ..Default::default()
            },
        )
        .expect("formula update should validate");
    assert_eq!(config.xp_level_formula, "floor(xp / 50) + 1");

    // 465 XP at the doubled pace → floor(465 / 50) + 1 = 10.
    let profile = svc.profile(&owner).expect("profile should load");
    assert_eq!(profile.total_xp, 465);
    assert_eq!(profile.level, 10);
    assert_eq!(profile.rank, "D");

    // A broken patch is rejected and the working config survives.
    let err = svc
        .update_rulebook(
            &owner,
            RulebookPatch {
                xp_level_formula: Some("xp +".into()),
                ..Default::default()
            },
        )
        .unwrap_err();
    assert!(matches!(err, LevelbookError::Rulebook { .. }));
    assert_eq!(
        svc.rulebook(&owner).unwrap().xp_level_formula,
        "floor(xp / 50) + 1"
    );

    // Reset restores the default pace.
    svc.reset_rulebook(&owner).expect("reset should succeed");
    assert_eq!(svc.profile(&owner).unwrap().level, 5);
}

#[test]
fn workflow_state_survives_restart() {
    let tmp = tempfile::tempdir().unwrap();
    let owner;
    let body_id;

    {
        let svc = ProgressionService::new(tmp.path()).expect("service should open");
        let profile = svc.create_owner("Robin").unwrap();
        owner = profile.owner;
        let body = svc.add_category(&owner, "Body", None, None).unwrap();
        body_id = body.id.clone();
        svc.append_xp(&owner, EntryDraft::new(body.id, 230)).unwrap();
    }

    // A fresh service over the same directory sees everything.
    let svc = ProgressionService::new(tmp.path()).expect("service should reopen");
    let profile = svc.profile(&owner).expect("profile should load");
    assert_eq!(profile.display_name, "Robin");
    assert_eq!(profile.total_xp, 230);
    assert_eq!(profile.level, 3);

    let entries = svc.list_xp(&owner, 1, 10).unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].category, body_id);

    // And the hydrated ledger drives recomputation identically.
    let outcome = svc.recompute(&owner).unwrap();
    assert_eq!(outcome.profile.total_xp, 230);
    assert_eq!(outcome.profile.level, 3);
}

#[test]
fn workflow_owners_do_not_interfere() {
    let tmp = tempfile::tempdir().unwrap();
    let svc = ProgressionService::new(tmp.path()).unwrap();

    let alice = svc.create_owner("Alice").unwrap().owner;
    let bob = svc.create_owner("Bob").unwrap().owner;
    assert_ne!(alice, bob);

    let alice_cat = svc.add_category(&alice, "Body", None, None).unwrap();
    let bob_cat = svc.add_category(&bob, "Body", None, None).unwrap();
    assert_ne!(alice_cat.id, bob_cat.id, "catalog IDs are owner-scoped");

    svc.append_xp(&alice, EntryDraft::new(alice_cat.id.clone(), 500))
        .unwrap();
    svc.append_xp(&bob, EntryDraft::new(bob_cat.id, 70)).unwrap();

    assert_eq!(svc.profile(&alice).unwrap().total_xp, 500);
    assert_eq!(svc.profile(&bob).unwrap().total_xp, 70);

    // Alice's entries are invisible to Bob, in both list and radar.
    assert_eq!(svc.list_xp(&bob, 1, 50).unwrap().len(), 1);
    let bob_radar = svc.radar(&bob, RadarRange::All).unwrap();
    assert_eq!(bob_radar[0].total_xp, 70);

    // Alice's categories cannot be used in Bob's ledger.
    let err = svc
        .append_xp(&bob, EntryDraft::new(alice_cat.id, 10))
        .unwrap_err();
    assert!(matches!(err, LevelbookError::NotFound(_)));

    // Clearing Bob leaves Alice alone.
    svc.clear_xp(&bob).unwrap();
    assert_eq!(svc.profile(&bob).unwrap().total_xp, 0);
    assert_eq!(svc.profile(&alice).unwrap().total_xp, 500);
}
