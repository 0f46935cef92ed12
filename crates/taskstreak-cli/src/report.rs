//! Plain-text rendering of tasks and statistics.

use std::fmt::Write as _;

use taskstreak_core::{
    clock::Moment,
    date::DateKey,
    query::{completion_log, dashboard, deadline_status, DeadlineStatus},
    tasks::{AppState, Priority, Task},
};

const SHORT_ID_LEN: usize = 8;

pub fn short_id(task: &Task) -> &str {
    let id = task.id.as_str();
    id.char_indices()
        .nth(SHORT_ID_LEN)
        .map_or(id, |(end, _)| &id[..end])
}

fn days(n: i64) -> String {
    if n == 1 {
        "1 day".to_string()
    } else {
        format!("{n} days")
    }
}

pub fn deadline_label(status: DeadlineStatus) -> String {
    match status {
        DeadlineStatus::NoDeadline => "no deadline".to_string(),
        DeadlineStatus::Overdue { days: n } => format!("overdue by {}", days(n)),
        DeadlineStatus::DueToday => "due today".to_string(),
        DeadlineStatus::DueTomorrow => "due tomorrow".to_string(),
        DeadlineStatus::Upcoming { days: n } => format!("due in {}", days(n)),
        DeadlineStatus::ClosedAfter { days: n } => format!("closed {} past deadline", days(n)),
        DeadlineStatus::ClosedOnDeadline => "closed on deadline".to_string(),
        DeadlineStatus::ClosedBefore => "closed before deadline".to_string(),
    }
}

fn priority_label(priority: Priority) -> &'static str {
    match priority {
        Priority::Low => "low",
        Priority::Medium => "med",
        Priority::High => "HIGH",
    }
}

pub fn task_line(task: &Task, today: DateKey) -> String {
    let mark = if task.done { "x" } else { " " };
    let mut line = format!(
        "{} [{mark}] {:<4} {}",
        short_id(task),
        priority_label(task.priority),
        task.title
    );
    if let Some(deadline) = task.deadline {
        let status = deadline_status(Some(deadline), task.done, today);
        let _ = write!(line, "  ({deadline}, {})", deadline_label(status));
    }
    line
}

pub fn stats(state: &AppState, today: DateKey) -> String {
    let board = dashboard(state, today);
    let mut out = String::new();
    let _ = writeln!(out, "Current streak: {}", days(i64::from(board.current_streak)));
    let _ = writeln!(out, "Best streak:    {}", days(i64::from(board.best_streak)));
    let _ = writeln!(out, "Done today:     {}", board.completed_today);
    let _ = writeln!(out, "Last 7 days:    {}", board.completed_last_7_days);
    let _ = write!(out, "Tasks:          {} active, {} done", board.active, board.done);
    out
}

pub fn history(state: &AppState, moment: &Moment) -> String {
    let log = completion_log(&state.tasks, moment);
    if log.is_empty() {
        return "No completed tasks yet.".to_string();
    }
    let mut out = String::new();
    for (day, tasks) in log {
        let _ = writeln!(out, "{day}");
        for task in tasks {
            let time = task
                .completed_at
                .map(|at| moment.local(at).format("%H:%M").to_string())
                .unwrap_or_default();
            let _ = writeln!(out, "  {time} {}", task.title);
        }
    }
    out.trim_end().to_string()
}
