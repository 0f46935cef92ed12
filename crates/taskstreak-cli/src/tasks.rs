use color_eyre::{eyre::eyre, Result};
use taskstreak_core::{
    clock::Clock,
    date::{is_deadline_allowed, DateKey, DEADLINE_LOOKBACK_DAYS},
    query::{visible_tasks, TaskQuery},
    reducer::Action,
    storage::StateStore,
    tasks::{clean_title, AppState, NewTask, Task, TaskChanges, TaskId},
};
use taskstreak_state::Tracker;

use crate::{cli::TaskCommand, report};

/// Execute a task subcommand against the tracker; returns the lines to print.
pub async fn handle<S: StateStore, C: Clock>(
    cmd: TaskCommand,
    tracker: &mut Tracker<S, C>,
) -> Result<Vec<String>> {
    let today = tracker.moment().today();

    match cmd {
        TaskCommand::List {
            status,
            query,
            sort,
        } => {
            let query = TaskQuery {
                status,
                text: query,
                sort,
            };
            let tasks = visible_tasks(&tracker.state().tasks, &query);
            if tasks.is_empty() {
                return Ok(vec![
                    "No tasks yet. Add one with `taskstreak task add <title>`.".to_string(),
                ]);
            }
            let mut lines = Vec::new();
            for task in tasks {
                lines.push(report::task_line(task, today));
                if let Some(desc) = &task.description {
                    lines.push(format!("    {desc}"));
                }
                if !task.tags.is_empty() {
                    lines.push(format!("    tags: {}", task.tags.join(", ")));
                }
            }
            Ok(lines)
        }
        TaskCommand::Add {
            title,
            description,
            priority,
            deadline,
            tag,
        } => {
            let title = clean_title(&title.join(" ")).ok_or_else(|| eyre!("title is empty"))?;
            check_deadline(deadline, today)?;
            let state = tracker
                .dispatch(Action::AddTask(NewTask {
                    title,
                    description,
                    priority,
                    deadline,
                    tags: tag,
                }))
                .await;
            let task = state
                .tasks
                .first()
                .ok_or_else(|| eyre!("task was not created"))?;
            Ok(vec![format!("Created task {}: {}", task.id, task.title)])
        }
        TaskCommand::Edit {
            id,
            title,
            description,
            priority,
            deadline,
            clear_deadline,
            tag,
        } => {
            let task = resolve(tracker.state(), &id)?;
            let id = task.id.clone();
            let mut changes = TaskChanges::from_task(task);
            if let Some(title) = title {
                changes.title = clean_title(&title).ok_or_else(|| eyre!("title is empty"))?;
            }
            if description.is_some() {
                changes.description = description;
            }
            if let Some(priority) = priority {
                changes.priority = priority;
            }
            if deadline.is_some() {
                check_deadline(deadline, today)?;
                changes.deadline = deadline;
            }
            if clear_deadline {
                changes.deadline = None;
            }
            if !tag.is_empty() {
                changes.tags = tag;
            }
            let state = tracker
                .dispatch(Action::UpdateTask {
                    id: id.clone(),
                    changes,
                })
                .await;
            let title = state.task(&id).map(|t| t.title.as_str()).unwrap_or_default();
            Ok(vec![format!("Updated: {title}")])
        }
        TaskCommand::Toggle { id } => {
            let id = resolve(tracker.state(), &id)?.id.clone();
            let state = tracker.dispatch(Action::ToggleDone { id: id.clone() }).await;
            let task = state.task(&id).ok_or_else(|| eyre!("task disappeared"))?;
            let line = if task.done {
                format!(
                    "Marked done: {} (streak: {})",
                    task.title, state.streak.current
                )
            } else {
                format!("Reopened: {}", task.title)
            };
            Ok(vec![line])
        }
        TaskCommand::Rm { id } => {
            let task = resolve(tracker.state(), &id)?;
            let (id, title) = (task.id.clone(), task.title.clone());
            tracker.dispatch(Action::DeleteTask { id }).await;
            Ok(vec![format!("Deleted: {title}")])
        }
    }
}

fn resolve<'a>(state: &'a AppState, id: &str) -> Result<&'a Task> {
    state
        .task(&TaskId::from(id))
        .or_else(|| state.find_by_prefix(id))
        .ok_or_else(|| eyre!("no task matches id {id:?}"))
}

fn check_deadline(deadline: Option<DateKey>, today: DateKey) -> Result<()> {
    match deadline {
        Some(d) if !is_deadline_allowed(d, today) => Err(eyre!(
            "deadline {d} is more than {DEADLINE_LOOKBACK_DAYS} days in the past"
        )),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use taskstreak_core::{
        clock::{FixedClock, Moment},
        storage::InMemoryStateStore,
        tasks::{Priority, Theme},
    };
    use taskstreak_state::StateRepository;

    use super::*;

    async fn tracker() -> Tracker<InMemoryStateStore, FixedClock> {
        let at = chrono::DateTime::parse_from_rfc3339("2024-01-10T12:00:00Z").expect("parse");
        Tracker::open(
            StateRepository::new(InMemoryStateStore::new()),
            FixedClock(Moment::new(at)),
            Theme::Light,
        )
        .await
    }

    fn add(title: &str) -> TaskCommand {
        TaskCommand::Add {
            title: vec![title.into()],
            description: None,
            priority: Priority::Medium,
            deadline: None,
            tag: vec![],
        }
    }

    #[tokio::test]
    async fn add_then_toggle_by_prefix() {
        let mut tracker = tracker().await;
        handle(add("Example"), &mut tracker).await.expect("add");
        let id = tracker.state().tasks[0].id.to_string();

        let out = handle(TaskCommand::Toggle { id: id[..6].to_string() }, &mut tracker)
            .await
            .expect("toggle");
        assert_eq!(out, vec!["Marked done: Example (streak: 1)".to_string()]);
        let out = handle(TaskCommand::Toggle { id }, &mut tracker)
            .await
            .expect("toggle");
        assert_eq!(out, vec!["Reopened: Example".to_string()]);
    }

    #[tokio::test]
    async fn edit_keeps_omitted_fields() {
        let mut tracker = tracker().await;
        handle(
            TaskCommand::Add {
                title: vec!["Plan".into(), "trip".into()],
                description: Some("flights".into()),
                priority: Priority::High,
                deadline: DateKey::from_ymd(2024, 2, 1),
                tag: vec!["travel".into()],
            },
            &mut tracker,
        )
        .await
        .expect("add");
        let id = tracker.state().tasks[0].id.to_string();

        handle(
            TaskCommand::Edit {
                id,
                title: Some("Plan holiday".into()),
                description: None,
                priority: None,
                deadline: None,
                clear_deadline: true,
                tag: vec![],
            },
            &mut tracker,
        )
        .await
        .expect("edit");
        let task = &tracker.state().tasks[0];
        assert_eq!(task.title, "Plan holiday");
        assert_eq!(task.description.as_deref(), Some("flights"));
        assert_eq!(task.priority, Priority::High);
        assert_eq!(task.deadline, None);
        assert_eq!(task.tags, vec!["travel".to_string()]);
    }

    #[tokio::test]
    async fn rejects_stale_deadline_and_unknown_id() {
        let mut tracker = tracker().await;
        let err = handle(
            TaskCommand::Add {
                title: vec!["Old".into()],
                description: None,
                priority: Priority::Low,
                deadline: DateKey::from_ymd(2022, 1, 1),
                tag: vec![],
            },
            &mut tracker,
        )
        .await;
        assert!(err.is_err());
        assert!(tracker.state().tasks.is_empty());

        let err = handle(TaskCommand::Rm { id: "nope".into() }, &mut tracker).await;
        assert!(err.is_err());
    }

    #[tokio::test]
    async fn list_reports_empty_state() {
        let mut tracker = tracker().await;
        let out = handle(
            TaskCommand::List {
                status: Default::default(),
                query: None,
                sort: Default::default(),
            },
            &mut tracker,
        )
        .await
        .expect("list");
        assert_eq!(out.len(), 1);
        assert!(out[0].starts_with("No tasks yet"));
    }
}
