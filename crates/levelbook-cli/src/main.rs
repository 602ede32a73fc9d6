//! Levelbook CLI — `lvb` command.
//!
//! Provides a command-line interface for logging XP, completing habits,
//! editing the rulebook, and inspecting levels, streaks, and radar
//! stats.

use std::collections::BTreeMap;
use std::path::PathBuf;

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};

use levelbook::{
    Catalog, CategoryId, EntryDraft, EntryId, EntryPatch, HabitId, HabitKind, OwnerId,
    ProgressionService, RadarRange, RulebookMode, RulebookPatch, SubCategoryId, XpEntry,
};

// ── Directory helpers ─────────────────────────────────────────────────────────

fn levelbook_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("LEVELBOOK_DIR") {
        return PathBuf::from(dir);
    }
    let home = std::env::var("HOME").expect("HOME not set");
    PathBuf::from(home).join(".levelbook")
}

// ── Time helpers ──────────────────────────────────────────────────────────────

fn micros_to_datetime(micros: u64) -> String {
    let secs = (micros / 1_000_000) as i64;
    let datetime = chrono::DateTime::from_timestamp(secs, 0)
        .unwrap_or_else(|| chrono::DateTime::from_timestamp(0, 0).unwrap());
    datetime.format("%Y-%m-%d %H:%M:%S UTC").to_string()
}

/// Parse an instant given as RFC 3339 ("2026-03-10T08:30:00Z") or as a
/// bare microsecond timestamp.
fn parse_instant_to_micros(s: &str) -> Result<u64> {
    let s = s.trim();
    if let Ok(micros) = s.parse::<u64>() {
        return Ok(micros);
    }
    let parsed = chrono::DateTime::parse_from_rfc3339(s)
        .map_err(|_| anyhow!("invalid instant '{s}' (expected RFC 3339 or microseconds)"))?;
    u64::try_from(parsed.timestamp_micros()).map_err(|_| anyhow!("instant '{s}' is before 1970"))
}

// ── Argument parsing helpers ──────────────────────────────────────────────────

fn parse_range(s: &str) -> Result<RadarRange> {
    match s.to_ascii_lowercase().as_str() {
        "week" => Ok(RadarRange::Week),
        "month" => Ok(RadarRange::Month),
        "all" => Ok(RadarRange::All),
        other => Err(anyhow!("unknown range '{other}' (expected week, month, or all)")),
    }
}

fn parse_kind(s: &str) -> Result<HabitKind> {
    match s.to_ascii_lowercase().as_str() {
        "binary" => Ok(HabitKind::Binary),
        "counter" => Ok(HabitKind::Counter),
        other => Err(anyhow!("unknown habit kind '{other}' (expected binary or counter)")),
    }
}

fn parse_mode(s: &str) -> Result<RulebookMode> {
    match s.to_ascii_lowercase().as_str() {
        "auto" => Ok(RulebookMode::Auto),
        "manual" => Ok(RulebookMode::Manual),
        other => Err(anyhow!("unknown mode '{other}' (expected auto or manual)")),
    }
}

fn parse_string_map(label: &str, s: &str) -> Result<BTreeMap<String, String>> {
    serde_json::from_str(s)
        .with_context(|| format!("invalid --{label} value (expected a JSON object of strings)"))
}

// ── Owner & catalog resolution ────────────────────────────────────────────────

/// Resolve `--owner` to an owner ID. Accepts the `own_` ID or a display
/// name; with no argument, the sole existing owner is used.
fn resolve_owner(svc: &ProgressionService, arg: Option<&str>) -> Result<OwnerId> {
    if let Some(arg) = arg {
        if arg.starts_with("own_") {
            let owner = OwnerId(arg.to_string());
            svc.profile(&owner)
                .with_context(|| format!("owner '{arg}' not found"))?;
            return Ok(owner);
        }
        let mut matches = Vec::new();
        for owner in svc.list_owners()? {
            let profile = svc.profile(&owner)?;
            if profile.display_name.eq_ignore_ascii_case(arg) {
                matches.push(owner);
            }
        }
        return match matches.len() {
            0 => Err(anyhow!("no owner named '{arg}' — run `lvb owner list`")),
            1 => Ok(matches.remove(0)),
            _ => Err(anyhow!(
                "several owners are named '{arg}' — pass the own_ ID instead"
            )),
        };
    }

    let mut owners = svc.list_owners()?;
    match owners.len() {
        0 => Err(anyhow!("no owners yet — run `lvb owner create --name NAME`")),
        1 => Ok(owners.remove(0)),
        _ => Err(anyhow!("several owners exist — pass --owner")),
    }
}

/// Resolve a category given as a `cat_` ID or a name.
fn resolve_category(catalog: &Catalog, s: &str) -> Result<CategoryId> {
    if s.starts_with("cat_") {
        return match catalog.category(&CategoryId(s.to_string())) {
            Some(c) => Ok(c.id.clone()),
            None => Err(anyhow!("category '{s}' not found")),
        };
    }
    catalog
        .category_by_name(s)
        .map(|c| c.id.clone())
        .ok_or_else(|| anyhow!("no category named '{s}' — run `lvb category list`"))
}

/// Resolve a sub-category given as a `sub_` ID or a name.
fn resolve_sub_category(catalog: &Catalog, s: &str) -> Result<SubCategoryId> {
    if s.starts_with("sub_") {
        return match catalog.sub_category(&SubCategoryId(s.to_string())) {
            Some(sc) => Ok(sc.id.clone()),
            None => Err(anyhow!("sub-category '{s}' not found")),
        };
    }
    catalog
        .sub_category_by_name(s)
        .map(|sc| sc.id.clone())
        .ok_or_else(|| anyhow!("no sub-category named '{s}' — run `lvb category list`"))
}

/// Resolve a habit given as a `hab_` ID or a name.
fn resolve_habit(catalog: &Catalog, s: &str) -> Result<HabitId> {
    if s.starts_with("hab_") {
        return match catalog.habit(&HabitId(s.to_string())) {
            Some(h) => Ok(h.id.clone()),
            None => Err(anyhow!("habit '{s}' not found")),
        };
    }
    catalog
        .habit_by_name(s)
        .map(|h| h.id.clone())
        .ok_or_else(|| anyhow!("no habit named '{s}' — run `lvb habit list`"))
}

fn category_name(catalog: &Catalog, id: &CategoryId) -> String {
    catalog
        .category(id)
        .map(|c| c.name.clone())
        .unwrap_or_else(|| id.0.clone())
}

fn sub_category_name(catalog: &Catalog, id: &SubCategoryId) -> String {
    catalog
        .sub_category(id)
        .map(|sc| sc.name.clone())
        .unwrap_or_else(|| id.0.clone())
}

// ── CLI structure ─────────────────────────────────────────────────────────────

/// Levelbook CLI — log XP, complete habits, and watch levels, ranks, and
/// streaks grow.
#[derive(Parser, Debug)]
#[command(
    name = "lvb",
    about = "Levelbook CLI",
    version,
    long_about = "lvb — Levelbook CLI\n\nLog XP into a per-owner ledger, complete habits, edit the rulebook\nthat maps XP to levels and ranks, and inspect streaks and radar stats."
)]
struct Cli {
    /// Owner ID (own_...) or display name (default: the only owner)
    #[arg(long, global = true)]
    owner: Option<String>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Manage owners
    Owner {
        #[command(subcommand)]
        subcommand: OwnerCommands,
    },

    /// Display the owner's profile
    Profile,

    /// Re-derive the profile from the ledger and the rulebook
    Recompute,

    /// Reset the profile (optionally wiping the ledger)
    Reset {
        /// Also delete every ledger entry
        #[arg(long)]
        clear_ledger: bool,
    },

    /// Manage the XP ledger
    Xp {
        #[command(subcommand)]
        subcommand: XpCommands,
    },

    /// Manage habits
    Habit {
        #[command(subcommand)]
        subcommand: HabitCommands,
    },

    /// Manage categories and sub-categories
    Category {
        #[command(subcommand)]
        subcommand: CategoryCommands,
    },

    /// Per-category stats for a time range
    Radar {
        /// Time range (week, month, all)
        #[arg(long, default_value = "week")]
        range: String,
    },

    /// All-time sub-category breakdown grouped by category
    Subradar,

    /// Current streak for a habit, category, or sub-category
    Streak {
        /// Habit ID or name
        #[arg(long)]
        habit: Option<String>,

        /// Category ID or name
        #[arg(long)]
        category: Option<String>,

        /// Sub-category ID or name
        #[arg(long)]
        sub_category: Option<String>,
    },

    /// Manage the rulebook (levels, ranks, titles)
    Rulebook {
        #[command(subcommand)]
        subcommand: RulebookCommands,
    },
}

#[derive(Subcommand, Debug)]
enum OwnerCommands {
    /// Create a new owner
    Create {
        /// Display name for the new owner
        #[arg(long)]
        name: String,
    },

    /// List all owners
    List,
}

#[derive(Subcommand, Debug)]
enum XpCommands {
    /// Append a manual XP entry
    Append {
        /// Category ID or name
        #[arg(long)]
        category: String,

        /// Sub-category ID or name
        #[arg(long)]
        sub_category: Option<String>,

        /// XP amount (negative deducts)
        #[arg(long, allow_hyphen_values = true)]
        amount: i64,

        /// Free-form note
        #[arg(long)]
        note: Option<String>,

        /// Backdate to an instant (RFC 3339 or microseconds)
        #[arg(long)]
        at: Option<String>,
    },

    /// List ledger entries, most recent first
    List {
        /// Page number (1-based)
        #[arg(long, default_value = "1")]
        page: u32,

        /// Entries per page
        #[arg(long, default_value = "20")]
        page_size: u32,
    },

    /// List ledger entries inside a time window, oldest first
    Window {
        /// Window start (RFC 3339 or microseconds)
        #[arg(long)]
        from: String,

        /// Window end (RFC 3339 or microseconds)
        #[arg(long)]
        to: String,
    },

    /// Edit an existing entry
    Update {
        /// Entry ID (xp_...)
        entry_id: String,

        /// New category ID or name
        #[arg(long)]
        category: Option<String>,

        /// New sub-category ID or name
        #[arg(long)]
        sub_category: Option<String>,

        /// Remove the sub-category
        #[arg(long)]
        clear_sub_category: bool,

        /// New XP amount
        #[arg(long, allow_hyphen_values = true)]
        amount: Option<i64>,

        /// New note
        #[arg(long)]
        note: Option<String>,

        /// Remove the note
        #[arg(long)]
        clear_note: bool,

        /// New instant (RFC 3339 or microseconds)
        #[arg(long)]
        at: Option<String>,
    },

    /// Delete an entry
    Delete {
        /// Entry ID (xp_...)
        entry_id: String,
    },

    /// Delete every entry in the ledger
    Clear,
}

#[derive(Subcommand, Debug)]
enum HabitCommands {
    /// Add a habit
    Add {
        /// Habit name
        #[arg(long)]
        name: String,

        /// Habit kind (binary completes once per call, counter multiplies)
        #[arg(long, default_value = "binary")]
        kind: String,

        /// XP awarded per completion
        #[arg(long)]
        xp: i64,

        /// Category ID or name
        #[arg(long)]
        category: String,

        /// Sub-category ID or name
        #[arg(long)]
        sub_category: Option<String>,
    },

    /// List habits
    List,

    /// Record a habit completion
    Complete {
        /// Habit ID or name
        habit: String,

        /// Completion count (counter habits only)
        #[arg(long, default_value = "1")]
        count: u32,

        /// Free-form note
        #[arg(long)]
        note: Option<String>,
    },

    /// Deactivate a habit (keeps its history)
    Pause {
        /// Habit ID or name
        habit: String,
    },

    /// Reactivate a paused habit
    Resume {
        /// Habit ID or name
        habit: String,
    },
}

#[derive(Subcommand, Debug)]
enum CategoryCommands {
    /// Add a category
    Add {
        /// Category name
        #[arg(long)]
        name: String,

        /// Display color (hex or name, stored as-is)
        #[arg(long)]
        color: Option<String>,

        /// Display icon (stored as-is)
        #[arg(long)]
        icon: Option<String>,
    },

    /// Add a sub-category under a category
    AddSub {
        /// Parent category ID or name
        #[arg(long)]
        category: String,

        /// Sub-category name
        #[arg(long)]
        name: String,
    },

    /// List categories, sub-categories, and habit counts
    List,
}

#[derive(Subcommand, Debug)]
enum RulebookCommands {
    /// Print the active rulebook config as JSON
    Show,

    /// Patch the rulebook (validated before anything is written)
    Set {
        /// Resolution mode (auto or manual)
        #[arg(long)]
        mode: Option<String>,

        /// Level formula, e.g. "floor(xp / 100) + 1"
        #[arg(long)]
        formula: Option<String>,

        /// Rank map as a JSON object, e.g. '{"1":"E","10":"D"}'
        #[arg(long)]
        ranks: Option<String>,

        /// Rank titles as a JSON object, e.g. '{"E":"Novice"}'
        #[arg(long)]
        titles: Option<String>,
    },

    /// Restore the default rulebook
    Reset,
}

// ── Main entry point ──────────────────────────────────────────────────────────

fn main() {
    env_logger::init();

    let cli = Cli::parse();
    let verbose = cli.verbose;
    let owner_arg = cli.owner.clone();

    let result = run(cli.command, owner_arg.as_deref(), verbose);
    if let Err(e) = result {
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}

fn run(command: Commands, owner_arg: Option<&str>, verbose: bool) -> Result<()> {
    let svc =
        ProgressionService::new(levelbook_dir()).context("failed to open the levelbook store")?;

    match command {
        Commands::Owner { subcommand } => match subcommand {
            OwnerCommands::Create { name } => cmd_owner_create(&svc, &name),
            OwnerCommands::List => cmd_owner_list(&svc, verbose),
        },
        Commands::Profile => cmd_profile(&svc, owner_arg, verbose),
        Commands::Recompute => cmd_recompute(&svc, owner_arg),
        Commands::Reset { clear_ledger } => cmd_reset(&svc, owner_arg, clear_ledger),
        Commands::Xp { subcommand } => match subcommand {
            XpCommands::Append {
                category,
                sub_category,
                amount,
                note,
                at,
            } => cmd_xp_append(
                &svc,
                owner_arg,
                &category,
                sub_category.as_deref(),
                amount,
                note,
                at.as_deref(),
            ),
            XpCommands::List { page, page_size } => {
                cmd_xp_list(&svc, owner_arg, page, page_size, verbose)
            }
            XpCommands::Window { from, to } => cmd_xp_window(&svc, owner_arg, &from, &to, verbose),
            XpCommands::Update {
                entry_id,
                category,
                sub_category,
                clear_sub_category,
                amount,
                note,
                clear_note,
                at,
            } => cmd_xp_update(
                &svc,
                owner_arg,
                &entry_id,
                category.as_deref(),
                sub_category.as_deref(),
                clear_sub_category,
                amount,
                note,
                clear_note,
                at.as_deref(),
            ),
            XpCommands::Delete { entry_id } => cmd_xp_delete(&svc, owner_arg, &entry_id),
            XpCommands::Clear => cmd_xp_clear(&svc, owner_arg),
        },
        Commands::Habit { subcommand } => match subcommand {
            HabitCommands::Add {
                name,
                kind,
                xp,
                category,
                sub_category,
            } => cmd_habit_add(
                &svc,
                owner_arg,
                &name,
                &kind,
                xp,
                &category,
                sub_category.as_deref(),
            ),
            HabitCommands::List => cmd_habit_list(&svc, owner_arg, verbose),
            HabitCommands::Complete { habit, count, note } => {
                cmd_habit_complete(&svc, owner_arg, &habit, count, note)
            }
            HabitCommands::Pause { habit } => cmd_habit_set_active(&svc, owner_arg, &habit, false),
            HabitCommands::Resume { habit } => cmd_habit_set_active(&svc, owner_arg, &habit, true),
        },
        Commands::Category { subcommand } => match subcommand {
            CategoryCommands::Add { name, color, icon } => {
                cmd_category_add(&svc, owner_arg, &name, color, icon)
            }
            CategoryCommands::AddSub { category, name } => {
                cmd_category_add_sub(&svc, owner_arg, &category, &name)
            }
            CategoryCommands::List => cmd_category_list(&svc, owner_arg, verbose),
        },
        Commands::Radar { range } => cmd_radar(&svc, owner_arg, &range),
        Commands::Subradar => cmd_subradar(&svc, owner_arg),
        Commands::Streak {
            habit,
            category,
            sub_category,
        } => cmd_streak(
            &svc,
            owner_arg,
            habit.as_deref(),
            category.as_deref(),
            sub_category.as_deref(),
        ),
        Commands::Rulebook { subcommand } => match subcommand {
            RulebookCommands::Show => cmd_rulebook_show(&svc, owner_arg),
            RulebookCommands::Set {
                mode,
                formula,
                ranks,
                titles,
            } => cmd_rulebook_set(
                &svc,
                owner_arg,
                mode.as_deref(),
                formula,
                ranks.as_deref(),
                titles.as_deref(),
            ),
            RulebookCommands::Reset => cmd_rulebook_reset(&svc, owner_arg),
        },
    }
}

// ── Owner commands ────────────────────────────────────────────────────────────

/// `lvb owner create --name NAME`
fn cmd_owner_create(svc: &ProgressionService, name: &str) -> Result<()> {
    let profile = svc.create_owner(name)?;

    println!("Created owner '{}'", profile.display_name);
    println!("  ID:    {}", profile.owner);
    println!("  Level: {} ({} — {})", profile.level, profile.rank, profile.title);
    Ok(())
}

/// `lvb owner list`
fn cmd_owner_list(svc: &ProgressionService, verbose: bool) -> Result<()> {
    let owners = svc.list_owners()?;
    if owners.is_empty() {
        println!("No owners yet — run `lvb owner create --name NAME`");
        return Ok(());
    }

    println!("Owners ({}):", owners.len());
    for owner in owners {
        let profile = svc.profile(&owner)?;
        println!(
            "  {} — {} XP, level {} ({})",
            profile.display_name, profile.total_xp, profile.level, profile.rank
        );
        if verbose {
            println!("      ID: {}", profile.owner);
            println!("      Created: {}", micros_to_datetime(profile.created_at));
        }
    }
    Ok(())
}

// ── Profile commands ──────────────────────────────────────────────────────────

/// `lvb profile`
fn cmd_profile(svc: &ProgressionService, owner_arg: Option<&str>, verbose: bool) -> Result<()> {
    let owner = resolve_owner(svc, owner_arg)?;
    let profile = svc.profile(&owner)?;

    println!("Profile: {}", profile.display_name);
    println!("  Owner:    {}", profile.owner);
    println!("  Total XP: {}", profile.total_xp);
    println!("  Level:    {}", profile.level);
    println!("  Rank:     {} ({})", profile.rank, profile.title);

    if verbose {
        println!("  Created:  {}", micros_to_datetime(profile.created_at));
        println!("  Updated:  {}", micros_to_datetime(profile.updated_at));
    }
    Ok(())
}

/// `lvb recompute`
fn cmd_recompute(svc: &ProgressionService, owner_arg: Option<&str>) -> Result<()> {
    let owner = resolve_owner(svc, owner_arg)?;
    let outcome = svc.recompute(&owner)?;
    print_outcome("Recomputed", &outcome);
    Ok(())
}

/// `lvb reset [--clear-ledger]`
fn cmd_reset(svc: &ProgressionService, owner_arg: Option<&str>, clear_ledger: bool) -> Result<()> {
    let owner = resolve_owner(svc, owner_arg)?;
    let outcome = svc.reset_profile(&owner, clear_ledger)?;
    if clear_ledger {
        println!("Ledger cleared");
    }
    print_outcome("Profile reset", &outcome);
    Ok(())
}

// ── XP commands ───────────────────────────────────────────────────────────────

/// `lvb xp append --category CAT --amount N [--sub-category SUB] [--note N] [--at T]`
fn cmd_xp_append(
    svc: &ProgressionService,
    owner_arg: Option<&str>,
    category: &str,
    sub_category: Option<&str>,
    amount: i64,
    note: Option<String>,
    at: Option<&str>,
) -> Result<()> {
    let owner = resolve_owner(svc, owner_arg)?;
    let catalog = svc.catalog(&owner)?;

    let mut draft = EntryDraft::new(resolve_category(&catalog, category)?, amount);
    if let Some(sub) = sub_category {
        draft = draft.sub_category(resolve_sub_category(&catalog, sub)?);
    }
    if let Some(note) = note {
        draft = draft.note(note);
    }
    if let Some(at) = at {
        draft = draft.recorded_at(parse_instant_to_micros(at)?);
    }

    let outcome = svc.append_xp(&owner, draft)?;
    print_outcome(&format!("Logged {amount} XP"), &outcome);
    Ok(())
}

/// `lvb xp list [--page P] [--page-size N]`
fn cmd_xp_list(
    svc: &ProgressionService,
    owner_arg: Option<&str>,
    page: u32,
    page_size: u32,
    verbose: bool,
) -> Result<()> {
    let owner = resolve_owner(svc, owner_arg)?;
    let catalog = svc.catalog(&owner)?;
    let entries = svc.list_xp(&owner, page, page_size)?;

    if entries.is_empty() {
        println!("No entries on page {page}");
        return Ok(());
    }

    println!("Ledger (page {page}, {} entries):", entries.len());
    for entry in &entries {
        print_entry(&catalog, entry, verbose);
    }
    Ok(())
}

/// `lvb xp window --from T --to T`
fn cmd_xp_window(
    svc: &ProgressionService,
    owner_arg: Option<&str>,
    from: &str,
    to: &str,
    verbose: bool,
) -> Result<()> {
    let owner = resolve_owner(svc, owner_arg)?;
    let catalog = svc.catalog(&owner)?;
    let from = parse_instant_to_micros(from)?;
    let to = parse_instant_to_micros(to)?;
    let entries = svc.list_xp_window(&owner, from, to)?;

    if entries.is_empty() {
        println!("No entries in the window");
        return Ok(());
    }

    println!("Ledger window ({} entries):", entries.len());
    for entry in &entries {
        print_entry(&catalog, entry, verbose);
    }
    Ok(())
}

/// `lvb xp update ENTRY_ID [--amount N] [--category CAT] ...`
#[allow(clippy::too_many_arguments)]
fn cmd_xp_update(
    svc: &ProgressionService,
    owner_arg: Option<&str>,
    entry_id: &str,
    category: Option<&str>,
    sub_category: Option<&str>,
    clear_sub_category: bool,
    amount: Option<i64>,
    note: Option<String>,
    clear_note: bool,
    at: Option<&str>,
) -> Result<()> {
    let owner = resolve_owner(svc, owner_arg)?;
    let catalog = svc.catalog(&owner)?;

    let patch = EntryPatch {
        category: category
            .map(|c| resolve_category(&catalog, c))
            .transpose()?,
        sub_category: sub_category
            .map(|s| resolve_sub_category(&catalog, s))
            .transpose()?,
        clear_sub_category,
        amount,
        note,
        clear_note,
        recorded_at: at.map(parse_instant_to_micros).transpose()?,
    };

    let outcome = svc.update_xp(&owner, &EntryId(entry_id.to_string()), patch)?;
    print_outcome("Entry updated", &outcome);
    Ok(())
}

/// `lvb xp delete ENTRY_ID`
fn cmd_xp_delete(svc: &ProgressionService, owner_arg: Option<&str>, entry_id: &str) -> Result<()> {
    let owner = resolve_owner(svc, owner_arg)?;
    let outcome = svc.delete_xp(&owner, &EntryId(entry_id.to_string()))?;
    print_outcome("Entry deleted", &outcome);
    Ok(())
}

/// `lvb xp clear`
fn cmd_xp_clear(svc: &ProgressionService, owner_arg: Option<&str>) -> Result<()> {
    let owner = resolve_owner(svc, owner_arg)?;
    svc.clear_xp(&owner)?;
    let profile = svc.profile(&owner)?;
    println!("Ledger cleared");
    println!("  Total XP: {}", profile.total_xp);
    println!("  Level:    {}", profile.level);
    Ok(())
}

// ── Habit commands ────────────────────────────────────────────────────────────

/// `lvb habit add --name NAME --xp N --category CAT [--kind K] [--sub-category SUB]`
fn cmd_habit_add(
    svc: &ProgressionService,
    owner_arg: Option<&str>,
    name: &str,
    kind: &str,
    xp: i64,
    category: &str,
    sub_category: Option<&str>,
) -> Result<()> {
    let owner = resolve_owner(svc, owner_arg)?;
    let catalog = svc.catalog(&owner)?;

    let category_id = resolve_category(&catalog, category)?;
    let sub_id = sub_category
        .map(|s| resolve_sub_category(&catalog, s))
        .transpose()?;

    let habit = svc.add_habit(
        &owner,
        name,
        parse_kind(kind)?,
        xp,
        &category_id,
        sub_id.as_ref(),
    )?;

    println!("Added habit '{}'", habit.name);
    println!("  ID:       {}", habit.id);
    println!("  Kind:     {:?}", habit.kind);
    println!("  Reward:   {} XP", habit.xp_reward);
    println!("  Category: {}", category_name(&catalog, &habit.category));
    if let Some(sub) = &habit.sub_category {
        println!("  Sub:      {}", sub_category_name(&catalog, sub));
    }
    Ok(())
}

/// `lvb habit list`
fn cmd_habit_list(svc: &ProgressionService, owner_arg: Option<&str>, verbose: bool) -> Result<()> {
    let owner = resolve_owner(svc, owner_arg)?;
    let catalog = svc.catalog(&owner)?;

    if catalog.habits.is_empty() {
        println!("No habits yet — run `lvb habit add`");
        return Ok(());
    }

    println!("Habits ({}):", catalog.habits.len());
    for habit in &catalog.habits {
        let state = if habit.active { "" } else { " [paused]" };
        println!(
            "  {} — {:?}, {} XP, {}{}",
            habit.name,
            habit.kind,
            habit.xp_reward,
            category_name(&catalog, &habit.category),
            state
        );
        if verbose {
            println!("      ID: {}", habit.id);
            if let Some(sub) = &habit.sub_category {
                println!("      Sub: {}", sub_category_name(&catalog, sub));
            }
        }
    }
    Ok(())
}

/// `lvb habit complete HABIT [--count N] [--note N]`
fn cmd_habit_complete(
    svc: &ProgressionService,
    owner_arg: Option<&str>,
    habit: &str,
    count: u32,
    note: Option<String>,
) -> Result<()> {
    let owner = resolve_owner(svc, owner_arg)?;
    let catalog = svc.catalog(&owner)?;
    let habit_id = resolve_habit(&catalog, habit)?;

    let outcome = svc.complete_habit(&owner, &habit_id, count, note)?;
    let streak = svc.streak_for_habit(&owner, &habit_id)?;

    print_outcome("Habit completed", &outcome);
    println!("  Streak:   {streak} day(s)");
    Ok(())
}

/// `lvb habit pause HABIT` / `lvb habit resume HABIT`
fn cmd_habit_set_active(
    svc: &ProgressionService,
    owner_arg: Option<&str>,
    habit: &str,
    active: bool,
) -> Result<()> {
    let owner = resolve_owner(svc, owner_arg)?;
    let catalog = svc.catalog(&owner)?;
    let habit_id = resolve_habit(&catalog, habit)?;

    let habit = svc.set_habit_active(&owner, &habit_id, active)?;
    if habit.active {
        println!("Habit '{}' is active", habit.name);
    } else {
        println!("Habit '{}' is paused (history kept)", habit.name);
    }
    Ok(())
}

// ── Category commands ─────────────────────────────────────────────────────────

/// `lvb category add --name NAME [--color C] [--icon I]`
fn cmd_category_add(
    svc: &ProgressionService,
    owner_arg: Option<&str>,
    name: &str,
    color: Option<String>,
    icon: Option<String>,
) -> Result<()> {
    let owner = resolve_owner(svc, owner_arg)?;
    let category = svc.add_category(&owner, name, color, icon)?;

    println!("Added category '{}'", category.name);
    println!("  ID: {}", category.id);
    Ok(())
}

/// `lvb category add-sub --category CAT --name NAME`
fn cmd_category_add_sub(
    svc: &ProgressionService,
    owner_arg: Option<&str>,
    category: &str,
    name: &str,
) -> Result<()> {
    let owner = resolve_owner(svc, owner_arg)?;
    let catalog = svc.catalog(&owner)?;
    let category_id = resolve_category(&catalog, category)?;

    let sub = svc.add_sub_category(&owner, &category_id, name)?;
    println!(
        "Added sub-category '{}' under '{}'",
        sub.name,
        category_name(&catalog, &category_id)
    );
    println!("  ID: {}", sub.id);
    Ok(())
}

/// `lvb category list`
fn cmd_category_list(
    svc: &ProgressionService,
    owner_arg: Option<&str>,
    verbose: bool,
) -> Result<()> {
    let owner = resolve_owner(svc, owner_arg)?;
    let catalog = svc.catalog(&owner)?;

    if catalog.categories.is_empty() {
        println!("No categories yet — run `lvb category add --name NAME`");
        return Ok(());
    }

    println!("Categories ({}):", catalog.categories.len());
    for category in &catalog.categories {
        println!(
            "  {} — {} active habit(s)",
            category.name,
            catalog.active_habit_count(&category.id)
        );
        if verbose {
            println!("      ID: {}", category.id);
        }
        for sub in catalog.sub_categories_of(&category.id) {
            println!(
                "      {} — {} active habit(s)",
                sub.name,
                catalog.active_habit_count_sub(&sub.id)
            );
            if verbose {
                println!("          ID: {}", sub.id);
            }
        }
    }
    Ok(())
}

// ── Radar & streak commands ───────────────────────────────────────────────────

/// `lvb radar [--range week|month|all]`
fn cmd_radar(svc: &ProgressionService, owner_arg: Option<&str>, range: &str) -> Result<()> {
    let owner = resolve_owner(svc, owner_arg)?;
    let range = parse_range(range)?;
    let stats = svc.radar(&owner, range)?;

    if stats.is_empty() {
        println!("No categories yet — run `lvb category add --name NAME`");
        return Ok(());
    }

    println!("Radar ({range}):");
    for stat in &stats {
        println!(
            "  {} — {} XP, level {}, streak {}d, 7d {} / 30d {}, {} habit(s)",
            stat.name,
            stat.total_xp,
            stat.level,
            stat.streak,
            stat.last7_days_xp,
            stat.last30_days_xp,
            stat.habit_count
        );
    }
    Ok(())
}

/// `lvb subradar`
fn cmd_subradar(svc: &ProgressionService, owner_arg: Option<&str>) -> Result<()> {
    let owner = resolve_owner(svc, owner_arg)?;
    let groups = svc.sub_category_radar(&owner)?;

    if groups.is_empty() {
        println!("No categories yet — run `lvb category add --name NAME`");
        return Ok(());
    }

    println!("Sub-category radar (all time):");
    for group in &groups {
        println!(
            "  {} — {} XP, level {}",
            group.category.name, group.category.total_xp, group.category.level
        );
        if group.sub_categories.is_empty() {
            println!("      (no sub-categories)");
        }
        for sub in &group.sub_categories {
            println!(
                "      {} — {} XP, level {}, streak {}d, 7d {} / 30d {}",
                sub.name,
                sub.total_xp,
                sub.level,
                sub.streak,
                sub.last7_days_xp,
                sub.last30_days_xp
            );
        }
    }
    Ok(())
}

/// `lvb streak (--habit H | --category C | --sub-category S)`
fn cmd_streak(
    svc: &ProgressionService,
    owner_arg: Option<&str>,
    habit: Option<&str>,
    category: Option<&str>,
    sub_category: Option<&str>,
) -> Result<()> {
    let owner = resolve_owner(svc, owner_arg)?;
    let catalog = svc.catalog(&owner)?;

    let (label, streak) = match (habit, category, sub_category) {
        (Some(habit), None, None) => {
            let id = resolve_habit(&catalog, habit)?;
            (habit, svc.streak_for_habit(&owner, &id)?)
        }
        (None, Some(category), None) => {
            let id = resolve_category(&catalog, category)?;
            (category, svc.streak_for_category(&owner, &id)?)
        }
        (None, None, Some(sub)) => {
            let id = resolve_sub_category(&catalog, sub)?;
            (sub, svc.streak_for_sub_category(&owner, &id)?)
        }
        _ => {
            return Err(anyhow!(
                "pass exactly one of --habit, --category, or --sub-category"
            ))
        }
    };

    println!("Streak for '{label}': {streak} day(s)");
    Ok(())
}

// ── Rulebook commands ─────────────────────────────────────────────────────────

/// `lvb rulebook show`
fn cmd_rulebook_show(svc: &ProgressionService, owner_arg: Option<&str>) -> Result<()> {
    let owner = resolve_owner(svc, owner_arg)?;
    let config = svc.rulebook(&owner)?;
    let json = serde_json::to_string_pretty(&config).context("failed to render rulebook")?;
    println!("{json}");
    Ok(())
}

/// `lvb rulebook set [--mode M] [--formula F] [--ranks JSON] [--titles JSON]`
fn cmd_rulebook_set(
    svc: &ProgressionService,
    owner_arg: Option<&str>,
    mode: Option<&str>,
    formula: Option<String>,
    ranks: Option<&str>,
    titles: Option<&str>,
) -> Result<()> {
    let owner = resolve_owner(svc, owner_arg)?;

    let patch = RulebookPatch {
        mode: mode.map(parse_mode).transpose()?,
        xp_level_formula: formula,
        level_rank_map: ranks.map(|r| parse_string_map("ranks", r)).transpose()?,
        rank_titles: titles.map(|t| parse_string_map("titles", t)).transpose()?,
        ..Default::default()
    };

    let config = svc.update_rulebook(&owner, patch)?;
    let profile = svc.profile(&owner)?;

    println!("Rulebook updated");
    println!("  Mode:    {:?}", config.mode);
    println!("  Formula: {}", config.xp_level_formula);
    println!("  Ranks:   {} band(s)", config.level_rank_map.len());
    println!(
        "  Profile: level {} ({} — {})",
        profile.level, profile.rank, profile.title
    );
    Ok(())
}

/// `lvb rulebook reset`
fn cmd_rulebook_reset(svc: &ProgressionService, owner_arg: Option<&str>) -> Result<()> {
    let owner = resolve_owner(svc, owner_arg)?;
    let config = svc.reset_rulebook(&owner)?;
    let profile = svc.profile(&owner)?;

    println!("Rulebook reset to defaults");
    println!("  Formula: {}", config.xp_level_formula);
    println!(
        "  Profile: level {} ({} — {})",
        profile.level, profile.rank, profile.title
    );
    Ok(())
}

// ── Output helpers ────────────────────────────────────────────────────────────

fn print_outcome(headline: &str, outcome: &levelbook::RecomputeOutcome) {
    println!("{headline}");
    println!("  Total XP: {}", outcome.profile.total_xp);
    println!(
        "  Level:    {} ({} — {})",
        outcome.profile.level, outcome.profile.rank, outcome.profile.title
    );
    if outcome.leveled_up() {
        println!(
            "  Level up! {} -> {}",
            outcome.previous_level, outcome.profile.level
        );
    } else if outcome.leveled_down() {
        println!(
            "  Level down: {} -> {}",
            outcome.previous_level, outcome.profile.level
        );
    }
}

fn print_entry(catalog: &Catalog, entry: &XpEntry, verbose: bool) {
    let grouping = match &entry.sub_category {
        Some(sub) => format!(
            "{}/{}",
            category_name(catalog, &entry.category),
            sub_category_name(catalog, sub)
        ),
        None => category_name(catalog, &entry.category),
    };
    let sign = if entry.amount >= 0 { "+" } else { "" };
    println!(
        "  {}  {sign}{} XP  {grouping}  ({})",
        micros_to_datetime(entry.recorded_at),
        entry.amount,
        entry.source.as_tag()
    );
    if let Some(note) = &entry.note {
        println!("      note: {note}");
    }
    if verbose {
        println!("      ID: {}", entry.id);
    }
}
