//! Rebuilds a valid [`AppState`] from an untrusted stored document.
//!
//! Every field is checked on its own and falls back independently, so one bad value
//! never costs the rest of the document. Nothing in here can fail.

use std::collections::HashSet;

use chrono::{DateTime, NaiveDate, Utc};
use serde_json::{Map, Value};
use taskstreak_core::{
    clock::Moment,
    date::DateKey,
    streak::{derive_streak, DailyCompletions, StreakDraft},
    tasks::{
        clean_description, clean_title, sanitize_tags, AppState, Priority, Settings, Task, TaskId,
        Theme,
    },
};
use tracing::debug;

/// Decoded outer shape of a stored document.
#[derive(Debug, Clone, PartialEq)]
pub enum Envelope {
    /// `{ "version": n, "state": ... }`
    Versioned { version: i64, state: Value },
    /// Anything else that is a JSON object: the bare state written by version 1.
    Legacy(Value),
}

impl Envelope {
    pub fn version(&self) -> i64 {
        match self {
            Envelope::Versioned { version, .. } => *version,
            Envelope::Legacy(_) => 1,
        }
    }

    pub fn into_state(self) -> Value {
        match self {
            Envelope::Versioned { state, .. } | Envelope::Legacy(state) => state,
        }
    }
}

/// `None` when the bytes are not JSON or not a JSON object.
pub fn parse_envelope(raw: &[u8]) -> Option<Envelope> {
    let parsed: Value = serde_json::from_slice(raw).ok()?;
    let Value::Object(mut object) = parsed else {
        return None;
    };
    let version = object.get("version").and_then(as_version);
    match (version, object.contains_key("state")) {
        (Some(version), true) => Some(Envelope::Versioned {
            version,
            state: object.remove("state").unwrap_or(Value::Null),
        }),
        _ => Some(Envelope::Legacy(Value::Object(object))),
    }
}

fn as_version(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        _ => None,
    }
}

/// Sanitize a decoded state payload into a structurally valid state.
pub fn migrate_state(raw: &Value, fallback_theme: Theme, moment: &Moment) -> AppState {
    let Some(root) = raw.as_object() else {
        debug!("stored state is not an object; starting empty");
        return AppState::empty(fallback_theme);
    };

    let tasks = sanitize_tasks(root.get("tasks"), moment);

    let empty = Map::new();
    let streak_raw = root.get("streak").and_then(Value::as_object).unwrap_or(&empty);

    let mut daily_completions = streak_raw
        .get("dailyCompletions")
        .and_then(Value::as_object)
        .map(sanitize_daily_completions)
        .unwrap_or_default();
    if daily_completions.is_empty() {
        daily_completions = completions_from_tasks(&tasks, moment);
    }

    let history_dates = streak_raw
        .get("historyDates")
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .filter_map(|s| DateKey::parse(s).ok())
                .collect()
        })
        .unwrap_or_default();

    let best = streak_raw
        .get("best")
        .and_then(coerce_number)
        .filter(|n| n.is_finite())
        .map(|n| n.floor().clamp(0.0, f64::from(u32::MAX)) as u32)
        .unwrap_or(0);

    let theme = root
        .get("settings")
        .and_then(|s| s.get("theme"))
        .and_then(Value::as_str)
        .and_then(|t| t.parse::<Theme>().ok())
        .unwrap_or(fallback_theme);

    AppState {
        tasks,
        streak: derive_streak(
            StreakDraft {
                daily_completions,
                history_dates,
                best,
            },
            moment.today(),
        ),
        settings: Settings { theme },
    }
}

fn sanitize_tasks(raw: Option<&Value>, moment: &Moment) -> Vec<Task> {
    let Some(items) = raw.and_then(Value::as_array) else {
        return Vec::new();
    };
    let mut seen_ids = HashSet::new();
    items
        .iter()
        .enumerate()
        .filter_map(|(index, item)| {
            let task = sanitize_task(item, &mut seen_ids, moment);
            if task.is_none() {
                debug!(index, "dropping stored task without a usable title");
            }
            task
        })
        .collect()
}

fn sanitize_task(raw: &Value, seen_ids: &mut HashSet<String>, moment: &Moment) -> Option<Task> {
    let object = raw.as_object()?;
    let title = object.get("title").and_then(Value::as_str).and_then(clean_title)?;

    let id = match object.get("id").and_then(Value::as_str) {
        Some(id) if !id.is_empty() && seen_ids.insert(id.to_string()) => TaskId::from(id),
        _ => {
            let fresh = TaskId::generate();
            seen_ids.insert(fresh.to_string());
            fresh
        }
    };

    let created_at = object
        .get("createdAt")
        .and_then(parse_instant)
        .unwrap_or_else(|| moment.utc());
    let updated_at = object
        .get("updatedAt")
        .and_then(parse_instant)
        .unwrap_or(created_at);

    let tags = object
        .get("tags")
        .and_then(Value::as_array)
        .map(|items| sanitize_tags(items.iter().filter_map(Value::as_str)))
        .unwrap_or_default();

    Some(Task {
        id,
        title,
        description: clean_description(object.get("description").and_then(Value::as_str)),
        priority: sanitize_priority(object.get("priority")),
        deadline: object
            .get("deadline")
            .and_then(Value::as_str)
            .and_then(|d| DateKey::parse(d).ok()),
        created_at,
        updated_at,
        done: object.get("done").is_some_and(is_truthy),
        completed_at: object.get("completedAt").and_then(parse_instant),
        tags,
    })
}

fn sanitize_priority(raw: Option<&Value>) -> Priority {
    match raw.and_then(Value::as_str) {
        Some("Low") => Priority::Low,
        Some("High") => Priority::High,
        _ => Priority::Medium,
    }
}

fn sanitize_daily_completions(raw: &Map<String, Value>) -> DailyCompletions {
    raw.iter()
        .filter_map(|(day, count)| {
            let day = DateKey::parse(day).ok()?;
            let count = coerce_number(count).filter(|n| n.is_finite() && *n > 0.0)?;
            let count = count.floor().min(f64::from(u32::MAX)) as u32;
            (count > 0).then_some((day, count))
        })
        .collect()
}

/// One completion per task on the day of its last `completedAt`.
/// Recovers streak data from documents written before the daily map existed.
fn completions_from_tasks(tasks: &[Task], moment: &Moment) -> DailyCompletions {
    let mut daily = DailyCompletions::new();
    for at in tasks.iter().filter_map(|task| task.completed_at) {
        *daily.entry(moment.day_of(at)).or_insert(0) += 1;
    }
    daily
}

fn parse_instant(raw: &Value) -> Option<DateTime<Utc>> {
    let text = raw.as_str()?.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(text) {
        return Some(parsed.with_timezone(&Utc));
    }
    if let Ok(parsed) = DateTime::parse_from_rfc2822(text) {
        return Some(parsed.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// Numbers and numeric strings; everything else is not a number.
fn coerce_number(raw: &Value) -> Option<f64> {
    match raw {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
}

fn is_truthy(raw: &Value) -> bool {
    match raw {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}
