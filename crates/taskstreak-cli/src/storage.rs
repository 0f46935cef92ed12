use std::path::PathBuf;

use crate::config::Config;
use color_eyre::Result;
use dirs::data_dir;
use taskstreak_state::StateRepository;
use taskstreak_storage::file_store::FileStateStore;
use tracing::debug;

/// Resolve the default data directory for TaskStreak.
pub fn default_data_dir() -> Result<PathBuf> {
    let base = data_dir().ok_or_else(|| color_eyre::eyre::eyre!("no data dir available"))?;
    Ok(base.join("taskstreak"))
}

/// Build the file store, honouring the config override.
pub fn store_from_config(config: &Config) -> Result<FileStateStore> {
    let root = match &config.data_dir {
        Some(root) => {
            debug!(?root, "initializing state store (config override)");
            root.clone()
        }
        None => {
            let root = default_data_dir()?;
            debug!(?root, "initializing state store");
            root
        }
    };
    Ok(FileStateStore::new(root))
}

pub fn repository_from_config(config: &Config) -> Result<StateRepository<FileStateStore>> {
    Ok(StateRepository::new(store_from_config(config)?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_override_wins() {
        let cfg = Config {
            data_dir: Some(PathBuf::from("/tmp/streaks")),
            theme: None,
            timezone: None,
        };
        let store = store_from_config(&cfg).expect("store");
        assert_eq!(store.root(), PathBuf::from("/tmp/streaks").as_path());
    }
}
