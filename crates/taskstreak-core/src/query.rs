//! Read-only views over a state snapshot: filtering, ordering, deadline labels and
//! the headline numbers.

use std::{cmp::Ordering, collections::BTreeMap, str::FromStr};

use crate::{
    clock::Moment,
    date::DateKey,
    streak::completions_for_last_days,
    tasks::{AppState, Task},
};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StatusFilter {
    #[default]
    All,
    Active,
    Done,
}

impl FromStr for StatusFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "all" => Ok(StatusFilter::All),
            "active" => Ok(StatusFilter::Active),
            "done" => Ok(StatusFilter::Done),
            other => Err(format!("unknown status filter: {other}")),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortKey {
    #[default]
    Deadline,
    Priority,
    CreatedAt,
}

impl FromStr for SortKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "deadline" => Ok(SortKey::Deadline),
            "priority" => Ok(SortKey::Priority),
            "created" | "created-at" => Ok(SortKey::CreatedAt),
            other => Err(format!("unknown sort key: {other}")),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskQuery {
    pub status: StatusFilter,
    /// Case-insensitive title substring.
    pub text: Option<String>,
    pub sort: SortKey,
}

/// Tasks matching `query`, in the requested order.
pub fn visible_tasks<'a>(tasks: &'a [Task], query: &TaskQuery) -> Vec<&'a Task> {
    let needle = query
        .text
        .as_deref()
        .map(|t| t.trim().to_lowercase())
        .filter(|t| !t.is_empty());

    let mut out: Vec<&Task> = tasks
        .iter()
        .filter(|task| match query.status {
            StatusFilter::All => true,
            StatusFilter::Active => !task.done,
            StatusFilter::Done => task.done,
        })
        .filter(|task| {
            needle
                .as_deref()
                .is_none_or(|n| task.title.to_lowercase().contains(n))
        })
        .collect();

    match query.sort {
        SortKey::Deadline => out.sort_by(|a, b| by_deadline(a, b)),
        SortKey::Priority => out.sort_by(|a, b| by_priority(a, b)),
        SortKey::CreatedAt => out.sort_by(|a, b| newest_first(a, b)),
    }
    out
}

fn newest_first(a: &Task, b: &Task) -> Ordering {
    b.created_at.cmp(&a.created_at)
}

/// Tasks with a deadline first, earliest first; ties and undated tasks newest first.
fn by_deadline(a: &Task, b: &Task) -> Ordering {
    match (a.deadline, b.deadline) {
        (Some(x), Some(y)) => x.cmp(&y).then_with(|| newest_first(a, b)),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => newest_first(a, b),
    }
}

fn by_priority(a: &Task, b: &Task) -> Ordering {
    b.priority
        .weight()
        .cmp(&a.priority.weight())
        .then_with(|| by_deadline(a, b))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeadlineStatus {
    NoDeadline,
    Overdue { days: i64 },
    DueToday,
    DueTomorrow,
    Upcoming { days: i64 },
    ClosedAfter { days: i64 },
    ClosedOnDeadline,
    ClosedBefore,
}

pub fn deadline_status(deadline: Option<DateKey>, done: bool, today: DateKey) -> DeadlineStatus {
    let Some(deadline) = deadline else {
        return DeadlineStatus::NoDeadline;
    };
    let diff = today.days_until(deadline);
    match (done, diff) {
        (false, d) if d < 0 => DeadlineStatus::Overdue { days: -d },
        (false, 0) => DeadlineStatus::DueToday,
        (false, 1) => DeadlineStatus::DueTomorrow,
        (false, d) => DeadlineStatus::Upcoming { days: d },
        (true, d) if d < 0 => DeadlineStatus::ClosedAfter { days: -d },
        (true, 0) => DeadlineStatus::ClosedOnDeadline,
        (true, _) => DeadlineStatus::ClosedBefore,
    }
}

pub fn is_overdue(task: &Task, today: DateKey) -> bool {
    matches!(
        deadline_status(task.deadline, task.done, today),
        DeadlineStatus::Overdue { .. }
    )
}

/// Headline numbers shown above the task list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dashboard {
    pub completed_today: u32,
    pub completed_last_7_days: u64,
    pub active: usize,
    pub done: usize,
    pub current_streak: u32,
    pub best_streak: u32,
}

pub fn dashboard(state: &AppState, today: DateKey) -> Dashboard {
    let active = state.tasks.iter().filter(|t| !t.done).count();
    Dashboard {
        completed_today: state.streak.completions_on(today),
        completed_last_7_days: completions_for_last_days(&state.streak.daily_completions, 7, today),
        active,
        done: state.tasks.len() - active,
        current_streak: state.streak.current,
        best_streak: state.streak.best,
    }
}

/// Completed tasks grouped by completion day, newest day and newest completion first.
pub fn completion_log<'a>(tasks: &'a [Task], moment: &Moment) -> Vec<(DateKey, Vec<&'a Task>)> {
    let mut groups: BTreeMap<DateKey, Vec<&Task>> = BTreeMap::new();
    for task in tasks {
        if let Some(at) = task.completed_at {
            groups.entry(moment.day_of(at)).or_default().push(task);
        }
    }
    groups
        .into_iter()
        .rev()
        .map(|(day, mut items)| {
            items.sort_by(|a, b| b.completed_at.cmp(&a.completed_at));
            (day, items)
        })
        .collect()
}
