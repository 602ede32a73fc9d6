//! Basic Progression — create an owner, log XP, complete habits, read radar.
//!
//! Run with:
//!   cargo run --example basic_progression -p levelbook

use levelbook::ledger::EntryDraft;
use levelbook::progression::ProgressionService;
use levelbook::radar::RadarRange;
use levelbook::time::micros_to_rfc3339;
use levelbook::HabitKind;

fn main() {
    let store = tempfile::tempdir().expect("temp dir for the store");
    let service = ProgressionService::new(store.path()).expect("service should open");

    // ── 1. Create an owner ──────────────────────────────────────────────────
    //
    // An owner is one person's whole progression world: profile, ledger,
    // catalog, and rulebook. The ID is a short prefix-hash minted at
    // creation, so every create call yields a distinct owner even when
    // display names repeat.
    let profile = service.create_owner("Avery").expect("owner creation");
    let owner = profile.owner.clone();

    println!("Owner created");
    println!("  ID:       {owner}");
    println!("  Name:     {}", profile.display_name);
    println!(
        "  Start:    level {} / rank {} / \"{}\"",
        profile.level, profile.rank, profile.title
    );
    println!();

    // ── 2. Build the catalog ────────────────────────────────────────────────
    //
    // Categories group XP; sub-categories refine a category. Entries can be
    // filed under either.
    let body = service
        .add_category(&owner, "Body", Some("#e74c3c".to_string()), None)
        .expect("category creation");
    let mind = service
        .add_category(&owner, "Mind", None, None)
        .expect("category creation");
    let cardio = service
        .add_sub_category(&owner, &body.id, "Cardio")
        .expect("sub-category creation");

    println!("Catalog:");
    println!("  {} -> {}", body.name, body.id);
    println!("  {} -> {}", mind.name, mind.id);
    println!("  {} / {} -> {}", body.name, cardio.name, cardio.id);
    println!();

    // ── 3. Log XP ───────────────────────────────────────────────────────────
    //
    // Every append recomputes the profile through the owner's rulebook.
    // The default formula is floor(xp / 100) + 1, so 410 XP lands on
    // level 5.
    let outcome = service
        .append_xp(&owner, EntryDraft::new(body.id.clone(), 150))
        .expect("append");
    println!("Logged +150 Body XP -> level {}", outcome.profile.level);

    let outcome = service
        .append_xp(
            &owner,
            EntryDraft::new(body.id.clone(), 260)
                .sub_category(cardio.id.clone())
                .note("long ride"),
        )
        .expect("append");
    println!(
        "Logged +260 Body/Cardio XP -> level {}",
        outcome.profile.level
    );
    if outcome.leveled_up() {
        println!(
            "  Level up! {} -> {}",
            outcome.previous_level, outcome.profile.level
        );
    }
    println!(
        "  Profile: {} XP, rank {}, \"{}\"",
        outcome.profile.total_xp, outcome.profile.rank, outcome.profile.title
    );
    println!();

    // ── 4. Habits ───────────────────────────────────────────────────────────
    //
    // A habit is a reusable XP template. Binary habits complete once per
    // call; counter habits multiply their reward by the count.
    let run = service
        .add_habit(&owner, "Run", HabitKind::Binary, 25, &body.id, Some(&cardio.id))
        .expect("habit creation");
    let pushups = service
        .add_habit(&owner, "Pushups", HabitKind::Counter, 2, &body.id, None)
        .expect("habit creation");

    let outcome = service
        .complete_habit(&owner, &run.id, 1, Some("5k along the river".to_string()))
        .expect("completion");
    println!("Completed '{}' -> +25 XP", run.name);

    let outcome2 = service
        .complete_habit(&owner, &pushups.id, 40, None)
        .expect("completion");
    println!(
        "Completed '{}' x40 -> +{} XP",
        pushups.name,
        outcome2.profile.total_xp - outcome.profile.total_xp
    );
    println!("  Profile: {} XP, level {}", outcome2.profile.total_xp, outcome2.profile.level);
    println!();

    // ── 5. Browse the ledger ────────────────────────────────────────────────
    //
    // Pages are newest-first. Habit completions carry their source habit.
    let page = service.list_xp(&owner, 1, 10).expect("list");
    println!("Ledger ({} entries):", page.len());
    for entry in &page {
        println!(
            "  {}  {:+5}  [{}]  {}",
            micros_to_rfc3339(entry.recorded_at),
            entry.amount,
            entry.source.as_tag(),
            entry.note.as_deref().unwrap_or("")
        );
    }
    println!();

    // ── 6. Radar and streaks ────────────────────────────────────────────────
    //
    // The radar gives one row per category: windowed XP, window-scoped
    // level, streak, and the active habit count. Everything was logged
    // today, so the streak is 1.
    let stats = service.radar(&owner, RadarRange::All).expect("radar");
    println!("Radar (all time):");
    for stat in &stats {
        println!(
            "  {:<6} {:>5} XP  level {:<3} streak {}  habits {}",
            stat.name, stat.total_xp, stat.level, stat.streak, stat.habit_count
        );
    }

    let streak = service
        .streak_for_category(&owner, &body.id)
        .expect("streak");
    println!("Body streak: {streak} day(s)");
    println!();

    println!("All operations completed successfully.");
}
