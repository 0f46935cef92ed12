//! State transitions. Every action consumes the previous snapshot and returns the next
//! one; unknown ids and blank titles leave the state untouched.

use tracing::debug;

use crate::{
    clock::Moment,
    streak::{derive_streak, increment_daily_completions, StreakDraft},
    tasks::{
        clean_description, clean_title, sanitize_tags, AppState, NewTask, Settings, Task,
        TaskChanges, TaskId, Theme,
    },
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    AddTask(NewTask),
    UpdateTask { id: TaskId, changes: TaskChanges },
    DeleteTask { id: TaskId },
    ToggleDone { id: TaskId },
    SetTheme(Theme),
}

pub fn reduce(state: AppState, action: Action, moment: &Moment) -> AppState {
    match action {
        Action::AddTask(input) => add_task(state, input, moment),
        Action::UpdateTask { id, changes } => update_task(state, &id, changes, moment),
        Action::DeleteTask { id } => delete_task(state, &id, moment),
        Action::ToggleDone { id } => toggle_done(state, &id, moment),
        Action::SetTheme(theme) => AppState {
            settings: Settings { theme },
            ..state
        },
    }
}

/// Re-derive `current` for the moment's day; history is left as is.
fn refresh_streak(mut state: AppState, moment: &Moment) -> AppState {
    state.streak = state.streak.refreshed(moment.today());
    state
}

fn add_task(mut state: AppState, input: NewTask, moment: &Moment) -> AppState {
    let Some(title) = clean_title(&input.title) else {
        debug!("ignoring add with blank title");
        return state;
    };
    let now = moment.utc();
    let task = Task {
        id: TaskId::generate(),
        title,
        description: clean_description(input.description.as_deref()),
        priority: input.priority,
        deadline: input.deadline,
        created_at: now,
        updated_at: now,
        done: false,
        completed_at: None,
        tags: sanitize_tags(&input.tags),
    };
    state.tasks.insert(0, task);
    refresh_streak(state, moment)
}

fn update_task(
    mut state: AppState,
    id: &TaskId,
    changes: TaskChanges,
    moment: &Moment,
) -> AppState {
    let Some(title) = clean_title(&changes.title) else {
        debug!(%id, "ignoring update with blank title");
        return state;
    };
    let Some(idx) = state.tasks.iter().position(|task| &task.id == id) else {
        debug!(%id, "ignoring update for unknown task");
        return state;
    };
    let task = &mut state.tasks[idx];
    task.title = title;
    task.description = clean_description(changes.description.as_deref());
    task.priority = changes.priority;
    task.deadline = changes.deadline;
    task.tags = sanitize_tags(&changes.tags);
    task.updated_at = moment.utc();
    refresh_streak(state, moment)
}

fn delete_task(mut state: AppState, id: &TaskId, moment: &Moment) -> AppState {
    state.tasks.retain(|task| &task.id != id);
    refresh_streak(state, moment)
}

/// Completing records today at most once per task; reopening never retracts history.
fn toggle_done(mut state: AppState, id: &TaskId, moment: &Moment) -> AppState {
    let Some(idx) = state.tasks.iter().position(|task| &task.id == id) else {
        debug!(%id, "ignoring toggle for unknown task");
        return state;
    };
    let task = &mut state.tasks[idx];

    let today = moment.today();
    let now = moment.utc();
    let completing = !task.done;
    let already_counted_today = task.completed_at.map(|at| moment.day_of(at)) == Some(today);

    task.done = completing;
    task.updated_at = now;
    if completing {
        task.completed_at = Some(now);
    }

    state.streak = if completing && !already_counted_today {
        let mut draft = StreakDraft::from(&state.streak);
        draft.daily_completions = increment_daily_completions(draft.daily_completions, today);
        draft.history_dates.push(today);
        derive_streak(draft, today)
    } else {
        state.streak.refreshed(today)
    };
    state
}
