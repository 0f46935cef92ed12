use clap::{Parser, Subcommand};
use taskstreak_core::{
    date::DateKey,
    query::{SortKey, StatusFilter},
    tasks::{Priority, Theme},
};

/// CLI surface definition.
#[derive(Parser, Debug)]
#[command(
    name = "taskstreak",
    about = "Local task tracker that keeps your completion streak",
    version,
    propagate_version = true
)]
pub struct Cli {
    /// Optional subcommand; defaults to showing stats when absent.
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Manage tasks.
    #[command(subcommand)]
    Task(TaskCommand),
    /// Show streak and completion counts.
    Stats,
    /// List completed tasks grouped by day.
    History,
    /// Switch the stored color theme.
    Theme { theme: Theme },
    /// Check that the data directory is writable.
    Health,
    /// Print version and exit.
    Version,
    /// Manage CLI configuration.
    #[command(subcommand)]
    Config(ConfigCommand),
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum TaskCommand {
    /// List tasks.
    List {
        /// all, active or done.
        #[arg(long, default_value = "all")]
        status: StatusFilter,
        /// Only titles containing this text.
        #[arg(long)]
        query: Option<String>,
        /// deadline, priority or created.
        #[arg(long, default_value = "deadline")]
        sort: SortKey,
    },
    /// Create a task.
    Add {
        #[arg(required = true, num_args = 1..)]
        title: Vec<String>,
        #[arg(long, short)]
        description: Option<String>,
        #[arg(long, short, default_value = "medium")]
        priority: Priority,
        /// YYYY-MM-DD
        #[arg(long)]
        deadline: Option<DateKey>,
        #[arg(long, short)]
        tag: Vec<String>,
    },
    /// Change fields of an existing task; omitted fields are kept.
    Edit {
        /// Task id or a unique prefix of one.
        id: String,
        #[arg(long)]
        title: Option<String>,
        #[arg(long, short)]
        description: Option<String>,
        #[arg(long, short)]
        priority: Option<Priority>,
        #[arg(long, conflicts_with = "clear_deadline")]
        deadline: Option<DateKey>,
        #[arg(long)]
        clear_deadline: bool,
        /// Replaces all tags when given.
        #[arg(long, short)]
        tag: Vec<String>,
    },
    /// Mark a task done, or open again if already done.
    Toggle { id: String },
    /// Delete a task.
    Rm { id: String },
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum ConfigCommand {
    /// Create a default config file if one does not exist.
    Init,
}
