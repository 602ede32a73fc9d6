//! Custom Rulebook — reshape the level curve, ranks, titles, and mode.
//!
//! Run with:
//!   cargo run --example custom_rulebook -p levelbook

use std::collections::BTreeMap;

use levelbook::ledger::EntryDraft;
use levelbook::progression::ProgressionService;
use levelbook::rulebook::{Formula, RulebookMode, RulebookPatch};

fn string_map(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

fn main() {
    let store = tempfile::tempdir().expect("temp dir for the store");
    let service = ProgressionService::new(store.path()).expect("service should open");

    // ── Setup: an owner with 410 XP ─────────────────────────────────────────
    let profile = service.create_owner("Robin").expect("owner creation");
    let owner = profile.owner.clone();
    let body = service
        .add_category(&owner, "Body", None, None)
        .expect("category creation");
    let outcome = service
        .append_xp(&owner, EntryDraft::new(body.id.clone(), 410))
        .expect("append");

    let config = service.rulebook(&owner).expect("rulebook");
    println!("Default rulebook:");
    println!("  Mode:    {:?}", config.mode);
    println!("  Formula: {}", config.xp_level_formula);
    println!("  Ranks:   {:?}", config.level_rank_map);
    println!(
        "  410 XP resolves to level {} / rank {} / \"{}\"",
        outcome.profile.level, outcome.profile.rank, outcome.profile.title
    );
    println!();

    // ── 1. The formula language ─────────────────────────────────────────────
    //
    // Formulas are arithmetic over one variable `xp` with floor, ceil,
    // min, and max. The result is floored to a whole level and clamped
    // to at least 1.
    let formula = Formula::parse("min(floor(xp / 100) + 1, 50)").expect("parse");
    println!("Formula 'min(floor(xp / 100) + 1, 50)':");
    for xp in [0u64, 410, 1_000_000] {
        println!("  xp {:>9} -> level {}", xp, formula.eval_level(xp).expect("eval"));
    }

    let sinking = Formula::parse("floor(xp / 100) - 10").expect("parse");
    println!(
        "Formula 'floor(xp / 100) - 10' at xp 0 -> level {} (clamped to 1)",
        sinking.eval_level(0).expect("eval")
    );
    println!();

    // ── 2. A steeper curve ──────────────────────────────────────────────────
    //
    // Patching the formula revalidates the whole config and recomputes
    // the profile under the new rules.
    service
        .update_rulebook(
            &owner,
            RulebookPatch {
                xp_level_formula: Some("floor(xp / 50) + 1".to_string()),
                ..RulebookPatch::default()
            },
        )
        .expect("formula patch");
    let profile = service.profile(&owner).expect("profile");
    println!("After 'floor(xp / 50) + 1':");
    println!(
        "  410 XP -> level {} / rank {} / \"{}\"",
        profile.level, profile.rank, profile.title
    );
    println!();

    // ── 3. Custom ranks and titles ──────────────────────────────────────────
    //
    // The rank map keys are level thresholds in AUTO mode. Titles hang off
    // ranks; a rank with no title falls back to the default.
    service
        .update_rulebook(
            &owner,
            RulebookPatch {
                level_rank_map: Some(string_map(&[
                    ("1", "Bronze"),
                    ("5", "Silver"),
                    ("9", "Gold"),
                ])),
                rank_titles: Some(string_map(&[
                    ("Bronze", "Beginner"),
                    ("Silver", "Contender"),
                    ("Gold", "Champion"),
                ])),
                ..RulebookPatch::default()
            },
        )
        .expect("rank patch");
    let profile = service.profile(&owner).expect("profile");
    println!("After custom ranks:");
    println!(
        "  level {} -> rank {} / \"{}\"",
        profile.level, profile.rank, profile.title
    );
    println!();

    // ── 4. Manual mode ──────────────────────────────────────────────────────
    //
    // MANUAL mode ignores the formula and reads the same map's keys as
    // XP thresholds; the level is the matched entry's position.
    service
        .update_rulebook(
            &owner,
            RulebookPatch {
                mode: Some(RulebookMode::Manual),
                level_rank_map: Some(string_map(&[
                    ("0", "Bronze"),
                    ("250", "Silver"),
                    ("400", "Gold"),
                ])),
                ..RulebookPatch::default()
            },
        )
        .expect("mode patch");
    let profile = service.profile(&owner).expect("profile");
    println!("Manual mode with XP thresholds 0 / 250 / 400:");
    println!(
        "  410 XP -> level {} / rank {} / \"{}\"",
        profile.level, profile.rank, profile.title
    );
    println!();

    // ── 5. Broken patches are rejected ──────────────────────────────────────
    //
    // Validation runs before anything is written, so a bad patch leaves
    // the active config untouched.
    let err = service
        .update_rulebook(
            &owner,
            RulebookPatch {
                xp_level_formula: Some("xp ** 2".to_string()),
                ..RulebookPatch::default()
            },
        )
        .expect_err("'**' is not part of the formula language");
    println!("Patch 'xp ** 2' rejected:");
    println!("  {err}");
    let kept = service.rulebook(&owner).expect("rulebook");
    println!("  Active mode is still {:?}", kept.mode);
    println!();

    // ── 6. Reset ────────────────────────────────────────────────────────────
    let config = service.reset_rulebook(&owner).expect("reset");
    let profile = service.profile(&owner).expect("profile");
    println!("After reset:");
    println!("  Formula: {}", config.xp_level_formula);
    println!(
        "  410 XP -> level {} / rank {} / \"{}\"",
        profile.level, profile.rank, profile.title
    );
    println!();

    println!("All operations completed successfully.");
}
