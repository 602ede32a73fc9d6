//! Levelbook JSON-RPC server.
//!
//! Implements a stdio-based JSON-RPC 2.0 server that exposes the
//! progression engine to a host application (request routing, sessions,
//! and presentation live on the host side).
//!
//! # Protocol
//!
//! Reads newline-delimited JSON-RPC 2.0 requests from stdin and writes
//! responses to stdout. Each request and response is a single line. A
//! request without an `id` is a notification: it is processed but gets
//! no response.

use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use serde_json::{json, Value};

use levelbook::{
    CategoryId, EntryDraft, EntryId, EntryPatch, HabitId, HabitKind, LevelbookError, OwnerId,
    ProgressionService, RadarRange, RecomputeOutcome, RulebookPatch, SubCategoryId,
};

// ── Error codes ───────────────────────────────────────────────────────────────

const PARSE_ERROR: i64 = -32700;
const INVALID_REQUEST: i64 = -32600;
const METHOD_NOT_FOUND: i64 = -32601;
const INVALID_PARAMS: i64 = -32602;
const SERVER_ERROR: i64 = -32000;
const NOT_FOUND: i64 = -32001;
const RULEBOOK_INVALID: i64 = -32002;

// ── Directory helpers ─────────────────────────────────────────────────────────

fn levelbook_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("LEVELBOOK_DIR") {
        return PathBuf::from(dir);
    }
    let home = std::env::var("HOME").expect("HOME not set");
    PathBuf::from(home).join(".levelbook")
}

// ── Failures ──────────────────────────────────────────────────────────────────

/// A dispatch failure ready to become a JSON-RPC error object.
struct RpcFailure {
    code: i64,
    message: String,
}

impl RpcFailure {
    fn invalid_params(message: impl Into<String>) -> Self {
        Self {
            code: INVALID_PARAMS,
            message: message.into(),
        }
    }

    fn method_not_found(method: &str) -> Self {
        Self {
            code: METHOD_NOT_FOUND,
            message: format!("method not found: {method}"),
        }
    }
}

impl From<LevelbookError> for RpcFailure {
    fn from(err: LevelbookError) -> Self {
        let code = match &err {
            LevelbookError::Validation(_) => INVALID_PARAMS,
            LevelbookError::NotFound(_) => NOT_FOUND,
            LevelbookError::Rulebook { .. } => RULEBOOK_INVALID,
            _ => SERVER_ERROR,
        };
        Self {
            code,
            message: err.to_string(),
        }
    }
}

// ── JSON-RPC helpers ──────────────────────────────────────────────────────────

fn ok_result(id: Value, result: Value) -> Value {
    json!({
        "jsonrpc": "2.0",
        "id": id,
        "result": result,
    })
}

fn rpc_error(id: Value, code: i64, message: impl Into<String>) -> Value {
    json!({
        "jsonrpc": "2.0",
        "id": id,
        "error": {
            "code": code,
            "message": message.into()
        }
    })
}

// ── Param helpers ─────────────────────────────────────────────────────────────

fn param_str<'a>(params: &'a Value, key: &str) -> Result<&'a str, RpcFailure> {
    params
        .get(key)
        .and_then(Value::as_str)
        .ok_or_else(|| RpcFailure::invalid_params(format!("missing or invalid param: {key}")))
}

fn param_i64(params: &Value, key: &str) -> Result<i64, RpcFailure> {
    params
        .get(key)
        .and_then(Value::as_i64)
        .ok_or_else(|| RpcFailure::invalid_params(format!("missing or invalid param: {key}")))
}

fn param_u64(params: &Value, key: &str) -> Result<u64, RpcFailure> {
    params
        .get(key)
        .and_then(Value::as_u64)
        .ok_or_else(|| RpcFailure::invalid_params(format!("missing or invalid param: {key}")))
}

fn param_bool(params: &Value, key: &str) -> Result<bool, RpcFailure> {
    params
        .get(key)
        .and_then(Value::as_bool)
        .ok_or_else(|| RpcFailure::invalid_params(format!("missing or invalid param: {key}")))
}

fn param_owner(params: &Value) -> Result<OwnerId, RpcFailure> {
    Ok(OwnerId(param_str(params, "owner")?.to_string()))
}

fn opt_str<'a>(params: &'a Value, key: &str) -> Option<&'a str> {
    params.get(key).and_then(Value::as_str)
}

fn opt_u64(params: &Value, key: &str) -> Option<u64> {
    params.get(key).and_then(Value::as_u64)
}

fn opt_u32(params: &Value, key: &str) -> Option<u32> {
    params
        .get(key)
        .and_then(Value::as_u64)
        .and_then(|n| u32::try_from(n).ok())
}

fn opt_bool(params: &Value, key: &str) -> Option<bool> {
    params.get(key).and_then(Value::as_bool)
}

fn to_json<T: serde::Serialize>(value: &T) -> Result<Value, RpcFailure> {
    serde_json::to_value(value).map_err(|e| RpcFailure {
        code: SERVER_ERROR,
        message: format!("failed to encode result: {e}"),
    })
}

fn from_json<T: serde::de::DeserializeOwned>(label: &str, value: Value) -> Result<T, RpcFailure> {
    serde_json::from_value(value)
        .map_err(|e| RpcFailure::invalid_params(format!("invalid {label}: {e}")))
}

// ── RPC server ────────────────────────────────────────────────────────────────

struct RpcServer {
    svc: ProgressionService,
}

impl RpcServer {
    fn new(base_dir: impl Into<PathBuf>) -> Result<Self, LevelbookError> {
        Ok(Self {
            svc: ProgressionService::new(base_dir)?,
        })
    }

    /// Route a JSON-RPC request to the appropriate handler.
    ///
    /// Returns `Value::Null` for notifications (no `id`), meaning no
    /// response should be written.
    fn handle_request(&self, request: Value) -> Value {
        let id = request.get("id").cloned();
        let method = match request.get("method").and_then(|m| m.as_str()) {
            Some(m) => m.to_string(),
            None => {
                return match id {
                    Some(id) => rpc_error(id, INVALID_REQUEST, "missing method"),
                    None => Value::Null,
                }
            }
        };
        let params = request
            .get("params")
            .cloned()
            .unwrap_or(Value::Object(Default::default()));

        let outcome = self.dispatch(&method, &params);

        match id {
            Some(id) => match outcome {
                Ok(result) => ok_result(id, result),
                Err(failure) => rpc_error(id, failure.code, failure.message),
            },
            None => Value::Null,
        }
    }

    fn dispatch(&self, method: &str, params: &Value) -> Result<Value, RpcFailure> {
        match method {
            "ping" => Ok(json!({})),

            "owner.create" => self.owner_create(params),
            "owner.list" => self.owner_list(),

            "profile.get" => self.profile_get(params),
            "profile.reset" => self.profile_reset(params),
            "recompute" => self.recompute(params),

            "xp.append" => self.xp_append(params),
            "xp.update" => self.xp_update(params),
            "xp.delete" => self.xp_delete(params),
            "xp.clear" => self.xp_clear(params),
            "xp.list" => self.xp_list(params),
            "xp.window" => self.xp_window(params),

            "radar.get" => self.radar_get(params),
            "radar.sub" => self.radar_sub(params),

            "streak.habit" => self.streak_habit(params),
            "streak.category" => self.streak_category(params),
            "streak.sub_category" => self.streak_sub_category(params),

            "rulebook.get" => self.rulebook_get(params),
            "rulebook.update" => self.rulebook_update(params),
            "rulebook.reset" => self.rulebook_reset(params),

            "catalog.get" => self.catalog_get(params),
            "category.add" => self.category_add(params),
            "sub_category.add" => self.sub_category_add(params),
            "habit.add" => self.habit_add(params),
            "habit.set_active" => self.habit_set_active(params),
            "habit.complete" => self.habit_complete(params),

            other => Err(RpcFailure::method_not_found(other)),
        }
    }

    // ── Owner handlers ────────────────────────────────────────────────────────

    fn owner_create(&self, params: &Value) -> Result<Value, RpcFailure> {
        let display_name = param_str(params, "display_name")?;
        let profile = self.svc.create_owner(display_name)?;
        to_json(&profile)
    }

    fn owner_list(&self) -> Result<Value, RpcFailure> {
        let owners = self.svc.list_owners()?;
        to_json(&owners)
    }

    // ── Profile handlers ──────────────────────────────────────────────────────

    fn profile_get(&self, params: &Value) -> Result<Value, RpcFailure> {
        let owner = param_owner(params)?;
        let profile = self.svc.profile(&owner)?;
        to_json(&profile)
    }

    fn profile_reset(&self, params: &Value) -> Result<Value, RpcFailure> {
        let owner = param_owner(params)?;
        let clear_ledger = opt_bool(params, "clear_ledger").unwrap_or(false);
        let outcome = self.svc.reset_profile(&owner, clear_ledger)?;
        outcome_json(&outcome)
    }

    fn recompute(&self, params: &Value) -> Result<Value, RpcFailure> {
        let owner = param_owner(params)?;
        let outcome = self.svc.recompute(&owner)?;
        outcome_json(&outcome)
    }

    // ── Ledger handlers ───────────────────────────────────────────────────────

    fn xp_append(&self, params: &Value) -> Result<Value, RpcFailure> {
        let owner = param_owner(params)?;
        let category = CategoryId(param_str(params, "category")?.to_string());
        let amount = param_i64(params, "amount")?;

        let mut draft = EntryDraft::new(category, amount);
        if let Some(sub) = opt_str(params, "sub_category") {
            draft = draft.sub_category(SubCategoryId(sub.to_string()));
        }
        if let Some(note) = opt_str(params, "note") {
            draft = draft.note(note);
        }
        if let Some(at) = opt_u64(params, "recorded_at") {
            draft = draft.recorded_at(at);
        }

        let outcome = self.svc.append_xp(&owner, draft)?;
        outcome_json(&outcome)
    }

    fn xp_update(&self, params: &Value) -> Result<Value, RpcFailure> {
        let owner = param_owner(params)?;
        let entry = EntryId(param_str(params, "entry")?.to_string());
        let patch: EntryPatch = from_json(
            "patch",
            params.get("patch").cloned().unwrap_or(json!({})),
        )?;

        let outcome = self.svc.update_xp(&owner, &entry, patch)?;
        outcome_json(&outcome)
    }

    fn xp_delete(&self, params: &Value) -> Result<Value, RpcFailure> {
        let owner = param_owner(params)?;
        let entry = EntryId(param_str(params, "entry")?.to_string());
        let outcome = self.svc.delete_xp(&owner, &entry)?;
        outcome_json(&outcome)
    }

    fn xp_clear(&self, params: &Value) -> Result<Value, RpcFailure> {
        let owner = param_owner(params)?;
        self.svc.clear_xp(&owner)?;
        Ok(json!({"cleared": true}))
    }

    fn xp_list(&self, params: &Value) -> Result<Value, RpcFailure> {
        let owner = param_owner(params)?;
        let page = opt_u32(params, "page").unwrap_or(1);
        let page_size = opt_u32(params, "page_size").unwrap_or(20);
        let entries = self.svc.list_xp(&owner, page, page_size)?;
        to_json(&entries)
    }

    fn xp_window(&self, params: &Value) -> Result<Value, RpcFailure> {
        let owner = param_owner(params)?;
        let from = param_u64(params, "from")?;
        let to = param_u64(params, "to")?;
        let entries = self.svc.list_xp_window(&owner, from, to)?;
        to_json(&entries)
    }

    // ── Radar & streak handlers ───────────────────────────────────────────────

    fn radar_get(&self, params: &Value) -> Result<Value, RpcFailure> {
        let owner = param_owner(params)?;
        let range: RadarRange = from_json(
            "range",
            params.get("range").cloned().unwrap_or(json!("week")),
        )?;
        let stats = self.svc.radar(&owner, range)?;
        to_json(&stats)
    }

    fn radar_sub(&self, params: &Value) -> Result<Value, RpcFailure> {
        let owner = param_owner(params)?;
        let groups = self.svc.sub_category_radar(&owner)?;
        to_json(&groups)
    }

    fn streak_habit(&self, params: &Value) -> Result<Value, RpcFailure> {
        let owner = param_owner(params)?;
        let habit = HabitId(param_str(params, "habit")?.to_string());
        let streak = self.svc.streak_for_habit(&owner, &habit)?;
        Ok(json!({"streak": streak}))
    }

    fn streak_category(&self, params: &Value) -> Result<Value, RpcFailure> {
        let owner = param_owner(params)?;
        let category = CategoryId(param_str(params, "category")?.to_string());
        let streak = self.svc.streak_for_category(&owner, &category)?;
        Ok(json!({"streak": streak}))
    }

    fn streak_sub_category(&self, params: &Value) -> Result<Value, RpcFailure> {
        let owner = param_owner(params)?;
        let sub = SubCategoryId(param_str(params, "sub_category")?.to_string());
        let streak = self.svc.streak_for_sub_category(&owner, &sub)?;
        Ok(json!({"streak": streak}))
    }

    // ── Rulebook handlers ─────────────────────────────────────────────────────

    fn rulebook_get(&self, params: &Value) -> Result<Value, RpcFailure> {
        let owner = param_owner(params)?;
        let config = self.svc.rulebook(&owner)?;
        to_json(&config)
    }

    fn rulebook_update(&self, params: &Value) -> Result<Value, RpcFailure> {
        let owner = param_owner(params)?;
        let patch: RulebookPatch = from_json(
            "patch",
            params.get("patch").cloned().unwrap_or(json!({})),
        )?;
        let config = self.svc.update_rulebook(&owner, patch)?;
        to_json(&config)
    }

    fn rulebook_reset(&self, params: &Value) -> Result<Value, RpcFailure> {
        let owner = param_owner(params)?;
        let config = self.svc.reset_rulebook(&owner)?;
        to_json(&config)
    }

    // ── Catalog handlers ──────────────────────────────────────────────────────

    fn catalog_get(&self, params: &Value) -> Result<Value, RpcFailure> {
        let owner = param_owner(params)?;
        let catalog = self.svc.catalog(&owner)?;
        to_json(&catalog)
    }

    fn category_add(&self, params: &Value) -> Result<Value, RpcFailure> {
        let owner = param_owner(params)?;
        let name = param_str(params, "name")?;
        let color = opt_str(params, "color").map(str::to_string);
        let icon = opt_str(params, "icon").map(str::to_string);
        let category = self.svc.add_category(&owner, name, color, icon)?;
        to_json(&category)
    }

    fn sub_category_add(&self, params: &Value) -> Result<Value, RpcFailure> {
        let owner = param_owner(params)?;
        let category = CategoryId(param_str(params, "category")?.to_string());
        let name = param_str(params, "name")?;
        let sub = self.svc.add_sub_category(&owner, &category, name)?;
        to_json(&sub)
    }

    fn habit_add(&self, params: &Value) -> Result<Value, RpcFailure> {
        let owner = param_owner(params)?;
        let name = param_str(params, "name")?;
        let kind: HabitKind = from_json(
            "kind",
            params.get("kind").cloned().unwrap_or(json!("binary")),
        )?;
        let xp_reward = param_i64(params, "xp_reward")?;
        let category = CategoryId(param_str(params, "category")?.to_string());
        let sub_category = opt_str(params, "sub_category").map(|s| SubCategoryId(s.to_string()));

        let habit = self.svc.add_habit(
            &owner,
            name,
            kind,
            xp_reward,
            &category,
            sub_category.as_ref(),
        )?;
        to_json(&habit)
    }

    fn habit_set_active(&self, params: &Value) -> Result<Value, RpcFailure> {
        let owner = param_owner(params)?;
        let habit = HabitId(param_str(params, "habit")?.to_string());
        let active = param_bool(params, "active")?;
        let habit = self.svc.set_habit_active(&owner, &habit, active)?;
        to_json(&habit)
    }

    fn habit_complete(&self, params: &Value) -> Result<Value, RpcFailure> {
        let owner = param_owner(params)?;
        let habit = HabitId(param_str(params, "habit")?.to_string());
        let count = opt_u32(params, "count").unwrap_or(1);
        let note = opt_str(params, "note").map(str::to_string);
        let outcome = self.svc.complete_habit(&owner, &habit, count, note)?;
        outcome_json(&outcome)
    }
}

/// Encode a recompute outcome with the level transition spelled out.
fn outcome_json(outcome: &RecomputeOutcome) -> Result<Value, RpcFailure> {
    let profile = to_json(&outcome.profile)?;
    Ok(json!({
        "profile": profile,
        "previous_level": outcome.previous_level,
        "leveled_up": outcome.leveled_up(),
        "leveled_down": outcome.leveled_down(),
    }))
}

// ── main ──────────────────────────────────────────────────────────────────────

fn main() {
    // Log to stderr (stdout is reserved for JSON-RPC responses).
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_max_level(tracing::Level::WARN)
        .init();

    let server = match RpcServer::new(levelbook_dir()) {
        Ok(server) => server,
        Err(e) => {
            eprintln!("failed to open the levelbook store: {e}");
            std::process::exit(1);
        }
    };

    let stdin = io::stdin();
    let stdout = io::stdout();

    for line in stdin.lock().lines() {
        let line = match line {
            Ok(l) => l,
            Err(e) => {
                eprintln!("stdin read error: {e}");
                break;
            }
        };

        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        let request: Value = match serde_json::from_str(trimmed) {
            Ok(v) => v,
            Err(e) => {
                let err = rpc_error(Value::Null, PARSE_ERROR, format!("parse error: {e}"));
                let mut out = stdout.lock();
                let _ = serde_json::to_writer(&mut out, &err);
                let _ = out.write_all(b"\n");
                let _ = out.flush();
                continue;
            }
        };

        let response = server.handle_request(request);

        // Notifications return Value::Null — don't write a response.
        if response.is_null() {
            continue;
        }

        let mut out = stdout.lock();
        if let Err(e) = serde_json::to_writer(&mut out, &response) {
            eprintln!("failed to write response: {e}");
            break;
        }
        if let Err(e) = out.write_all(b"\n") {
            eprintln!("failed to write newline: {e}");
            break;
        }
        if let Err(e) = out.flush() {
            eprintln!("failed to flush stdout: {e}");
            break;
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
