//! Edge case tests: formula grammar limits, save-time validation,
//! runtime resolution failures, manual mode, and title fallbacks.

use std::collections::BTreeMap;

use levelbook::rulebook::{resolve, Formula, RulebookConfig, RulebookMode};
use levelbook::{
    CategoryId, EntryDraft, LevelbookError, OwnerId, ProgressionService, RulebookPatch,
};

fn string_map(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

fn service_with_owner() -> (tempfile::TempDir, ProgressionService, OwnerId, CategoryId) {
    let tmp = tempfile::tempdir().unwrap();
    let svc = ProgressionService::new(tmp.path()).expect("service should open");
    let profile = svc.create_owner("rulebook-tester").unwrap();
    let category = svc
        .add_category(&profile.owner, "Body", None, None)
        .unwrap();
    (tmp, svc, profile.owner, category.id)
}

// === Formula Grammar Edge Cases ===

#[test]
fn edge_formula_function_combinations() {
    let f = Formula::parse("min(max(floor(xp / 10), 1), 99)").unwrap();
    assert_eq!(f.eval_level(0).unwrap(), 1);
    assert_eq!(f.eval_level(55).unwrap(), 5);
    assert_eq!(f.eval_level(5_000).unwrap(), 99);

    let f = Formula::parse("ceil(xp / 3) - floor(xp / 3)").unwrap();
    assert_eq!(f.eval(3).unwrap(), 0.0);
    assert_eq!(f.eval(4).unwrap(), 1.0);
}

#[test]
fn edge_formula_level_saturates_at_u32_max() {
    // "xp" alone can exceed any level representation
    let f = Formula::parse("xp").unwrap();
    assert_eq!(f.eval_level(u64::MAX).unwrap(), u32::MAX);
    assert_eq!(f.eval_level(7).unwrap(), 7);
}

#[test]
fn edge_formula_rejects_foreign_syntax() {
    // Exponent, modulo, and call syntax from other languages
    assert!(Formula::parse("xp ** 2").is_err());
    assert!(Formula::parse("xp % 100").is_err());
    assert!(Formula::parse("Math.sqrt(xp)").is_err());
    assert!(Formula::parse("pow(xp, 2)").is_err());
    assert!(Formula::parse("xp; 1").is_err());
}

// === Save-time Validation Edge Cases ===

#[test]
fn edge_update_rejects_broken_maps() {
    let (_tmp, svc, owner, _) = service_with_owner();
    let before = svc.rulebook(&owner).unwrap();

    // Empty map
    let err = svc
        .update_rulebook(
            &owner,
            RulebookPatch {
                level_rank_map: Some(BTreeMap::new()),
                ..Default::default()
            },
        )
        .unwrap_err();
    assert!(matches!(err, LevelbookError::Rulebook { .. }));

    // Non-numeric key
    let err = svc
        .update_rulebook(
            &owner,
            RulebookPatch {
                level_rank_map: Some(string_map(&[("ten", "E")])),
                ..Default::default()
            },
        )
        .unwrap_err();
    assert!(matches!(err, LevelbookError::Rulebook { .. }));

    // Keys that collide once parsed
    let err = svc
        .update_rulebook(
            &owner,
            RulebookPatch {
                level_rank_map: Some(string_map(&[("5", "E"), ("05", "D")])),
                ..Default::default()
            },
        )
        .unwrap_err();
    assert!(matches!(err, LevelbookError::Rulebook { .. }));

    // Every rejection left the active config untouched
    let after = svc.rulebook(&owner).unwrap();
    assert_eq!(after.level_rank_map, before.level_rank_map);
    assert_eq!(after.updated_at, before.updated_at);
}

#[test]
fn edge_update_rejects_formula_failing_probe() {
    let (_tmp, svc, owner, _) = service_with_owner();

    // Parses cleanly, divides by zero at the xp = 0 probe
    let err = svc
        .update_rulebook(
            &owner,
            RulebookPatch {
                xp_level_formula: Some("100 / xp".into()),
                ..Default::default()
            },
        )
        .unwrap_err();
    assert!(matches!(err, LevelbookError::Rulebook { .. }));

    let config = svc.rulebook(&owner).unwrap();
    assert_eq!(config.xp_level_formula, "floor(xp / 100) + 1");
}

// === Runtime Resolution Failures ===

#[test]
fn edge_formula_failing_at_one_total_surfaces_on_recompute() {
    let (_tmp, svc, owner, category) = service_with_owner();

    // Survives the 0 and 1000 probes, fails at exactly xp = 500
    svc.update_rulebook(
        &owner,
        RulebookPatch {
            xp_level_formula: Some("100 / (xp - 500)".into()),
            ..Default::default()
        },
    )
    .expect("the probes cannot see the bad total");

    let err = svc
        .append_xp(&owner, EntryDraft::new(category, 500))
        .unwrap_err();
    assert!(matches!(err, LevelbookError::Rulebook { .. }));

    // The entry landed; only the recompute failed
    assert_eq!(svc.list_xp(&owner, 1, 10).unwrap().len(), 1);
    assert_eq!(svc.profile(&owner).unwrap().total_xp, 0);

    // Repairing the rulebook folds the stuck entry back in
    svc.update_rulebook(
        &owner,
        RulebookPatch {
            xp_level_formula: Some("floor(xp / 100) + 1".into()),
            ..Default::default()
        },
    )
    .unwrap();
    let profile = svc.profile(&owner).unwrap();
    assert_eq!(profile.total_xp, 500);
    assert_eq!(profile.level, 6);
}

// === Manual Mode Edge Cases ===

#[test]
fn edge_manual_mode_reads_keys_as_xp_thresholds() {
    let (_tmp, svc, owner, category) = service_with_owner();

    svc.update_rulebook(
        &owner,
        RulebookPatch {
            mode: Some(RulebookMode::Manual),
            level_rank_map: Some(string_map(&[
                ("0", "Bronze"),
                ("100", "Silver"),
                ("400", "Gold"),
            ])),
            ..Default::default()
        },
    )
    .unwrap();

    // Below the second threshold
    svc.append_xp(&owner, EntryDraft::new(category.clone(), 99))
        .unwrap();
    let profile = svc.profile(&owner).unwrap();
    assert_eq!((profile.level, profile.rank.as_str()), (1, "Bronze"));

    // Crossing a threshold bumps the position-based level
    svc.append_xp(&owner, EntryDraft::new(category.clone(), 1))
        .unwrap();
    let profile = svc.profile(&owner).unwrap();
    assert_eq!((profile.level, profile.rank.as_str()), (2, "Silver"));

    let outcome = svc
        .append_xp(&owner, EntryDraft::new(category, 300))
        .unwrap();
    assert_eq!(outcome.profile.level, 3);
    assert_eq!(outcome.profile.rank, "Gold");
    assert!(outcome.leveled_up());
}

#[test]
fn edge_same_map_reads_differently_per_mode() {
    let (_tmp, svc, owner, category) = service_with_owner();
    let map = string_map(&[("1", "E"), ("5", "D")]);

    svc.update_rulebook(
        &owner,
        RulebookPatch {
            level_rank_map: Some(map.clone()),
            ..Default::default()
        },
    )
    .unwrap();
    svc.append_xp(&owner, EntryDraft::new(category, 410)).unwrap();

    // AUTO: formula gives level 5, keys are level thresholds
    let profile = svc.profile(&owner).unwrap();
    assert_eq!((profile.level, profile.rank.as_str()), (5, "D"));

    // MANUAL: the same keys become XP thresholds, position gives the level
    svc.update_rulebook(
        &owner,
        RulebookPatch {
            mode: Some(RulebookMode::Manual),
            ..Default::default()
        },
    )
    .unwrap();
    let profile = svc.profile(&owner).unwrap();
    assert_eq!((profile.level, profile.rank.as_str()), (2, "D"));
}

#[test]
fn edge_manual_resolution_is_monotonic() {
    let mut config = RulebookConfig::default_for(OwnerId::derive("monotonic"));
    config.mode = RulebookMode::Manual;
    config.level_rank_map = string_map(&[("0", "E"), ("75", "D"), ("220", "C"), ("800", "B")]);

    let mut previous = 0;
    for xp in (0..1_000).step_by(7) {
        let r = resolve(xp, &config).unwrap();
        assert!(
            r.level >= previous,
            "level regressed from {previous} at xp = {xp}"
        );
        assert!(r.level <= 4);
        previous = r.level;
    }
    assert_eq!(previous, 4);
}

// === Title Edge Cases ===

#[test]
fn edge_unmapped_rank_falls_back_to_default_title() {
    let (_tmp, svc, owner, _) = service_with_owner();

    // "Mythic" appears in the rank map but has no title entry
    svc.update_rulebook(
        &owner,
        RulebookPatch {
            level_rank_map: Some(string_map(&[("1", "Mythic")])),
            ..Default::default()
        },
    )
    .unwrap();

    let profile = svc.profile(&owner).unwrap();
    assert_eq!(profile.rank, "Mythic");
    assert_eq!(profile.title, "Adventurer");

    // Adding the title picks it up on the next recompute
    svc.update_rulebook(
        &owner,
        RulebookPatch {
            rank_titles: Some(string_map(&[("Mythic", "World Eater")])),
            ..Default::default()
        },
    )
    .unwrap();
    assert_eq!(svc.profile(&owner).unwrap().title, "World Eater");
}
