mod cli;
mod config;
mod report;
mod storage;
mod tasks;

use crate::cli::ConfigCommand;
use clap::Parser;
use color_eyre::Result;
use taskstreak_core::{
    clock::{Clock, SystemClock},
    reducer::Action,
    storage::StateStore,
};
use taskstreak_state::Tracker;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    init_tracing();

    let cli = cli::Cli::parse();
    let config = config::load()?;
    match cli.command.unwrap_or(cli::Command::Stats) {
        cli::Command::Version => print_version(),
        cli::Command::Health => run_health_check(&config).await?,
        cli::Command::Config(ConfigCommand::Init) => init_config(&config)?,
        cli::Command::Task(cmd) => {
            let mut tracker = open_tracker(&config).await?;
            for line in tasks::handle(cmd, &mut tracker).await? {
                println!("{line}");
            }
        }
        cli::Command::Stats => {
            let tracker = open_tracker(&config).await?;
            let today = tracker.moment().today();
            println!("{}", report::stats(tracker.state(), today));
        }
        cli::Command::History => {
            let tracker = open_tracker(&config).await?;
            println!("{}", report::history(tracker.state(), &tracker.moment()));
        }
        cli::Command::Theme { theme } => {
            let mut tracker = open_tracker(&config).await?;
            tracker.dispatch(Action::SetTheme(theme)).await;
            println!("Theme set to {}", theme.as_str());
        }
    }

    Ok(())
}

fn init_tracing() {
    // Respect user-provided filters, default to info to avoid noisy stdout.
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let fmt_layer = tracing_subscriber::fmt::layer().with_target(false);
    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .init();
}

fn print_version() {
    println!("taskstreak {}", env!("CARGO_PKG_VERSION"));
}

async fn open_tracker(
    config: &config::Config,
) -> Result<Tracker<taskstreak_storage::file_store::FileStateStore, SystemClock>> {
    let repo = storage::repository_from_config(config)?;
    let clock = SystemClock::new(config.zone()?);
    Ok(Tracker::open(repo, clock, config.fallback_theme()).await)
}

/// Runs a quick write/read/remove probe against the data directory.
async fn run_health_check(config: &config::Config) -> Result<()> {
    let store = storage::store_from_config(config)?;
    run_store_health(&store).await?;
    let today = SystemClock::new(config.zone()?).moment().today();
    println!("Storage: ok ({})", store.root().display());
    println!("Today: {today}");
    Ok(())
}

async fn run_store_health<S: StateStore>(store: &S) -> Result<()> {
    let probe_key = "health_probe";
    let payload = b"ok";
    store
        .write(probe_key, payload)
        .await
        .map_err(|e| color_eyre::eyre::eyre!(e.to_string()))?;
    let round_trip = store
        .read(probe_key)
        .await
        .map_err(|e| color_eyre::eyre::eyre!(e.to_string()))?;
    store
        .remove(probe_key)
        .await
        .map_err(|e| color_eyre::eyre::eyre!(e.to_string()))?;

    if round_trip != payload {
        color_eyre::eyre::bail!("storage round-trip failed");
    }
    Ok(())
}

fn init_config(config: &config::Config) -> Result<()> {
    let path = config::write_default_if_missing(config)?;
    println!("Config initialized at {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use taskstreak_storage::file_store::FileStateStore;

    use super::*;

    #[tokio::test]
    async fn health_check_with_temp_store_succeeds() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = FileStateStore::new(dir.path());
        run_store_health(&store)
            .await
            .expect("health check should succeed");
    }

    #[tokio::test]
    async fn health_check_reports_unwritable_root() {
        let dir = tempfile::tempdir().expect("tempdir");
        let file = dir.path().join("not-a-dir");
        std::fs::write(&file, b"x").expect("write");
        let store = FileStateStore::new(&file);
        assert!(run_store_health(&store).await.is_err());
    }
}
