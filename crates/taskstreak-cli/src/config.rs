use std::{
    fs,
    path::{Path, PathBuf},
};

use color_eyre::{eyre::eyre, Result};
use dirs::config_dir;
use serde::{Deserialize, Serialize};
use taskstreak_core::{clock::Zone, tasks::Theme};

/// User-level configuration loaded from `~/.config/taskstreak/config.toml` (platform-specific).
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq, Eq)]
pub struct Config {
    /// Override for the data directory.
    pub data_dir: Option<PathBuf>,
    /// Theme used when no theme has been stored yet.
    pub theme: Option<Theme>,
    /// `local` or an IANA name such as `Europe/Berlin`; decides where days begin.
    pub timezone: Option<String>,
}

impl Config {
    /// Configured theme, else the terminal's hint, else light.
    pub fn fallback_theme(&self) -> Theme {
        self.theme
            .or_else(|| {
                std::env::var("COLORFGBG")
                    .ok()
                    .and_then(|v| theme_from_colorfgbg(&v))
            })
            .unwrap_or_default()
    }

    /// Zone the wall clock is read in; the machine's own when unset.
    pub fn zone(&self) -> Result<Zone> {
        match &self.timezone {
            Some(name) => name.parse::<Zone>().map_err(|e| eyre!(e)),
            None => Ok(Zone::Local),
        }
    }
}

/// `COLORFGBG` is `fg;bg` (sometimes `fg;extra;bg`); low background indices are dark.
fn theme_from_colorfgbg(value: &str) -> Option<Theme> {
    let bg: u8 = value.rsplit(';').next()?.trim().parse().ok()?;
    Some(if bg <= 6 || bg == 8 {
        Theme::Dark
    } else {
        Theme::Light
    })
}

/// Load config from the default path; if missing, return defaults.
pub fn load() -> Result<Config> {
    let path = default_path()?;
    load_from_path(path)
}

/// Load config from a given path; if missing or empty, return defaults.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<Config> {
    let path = path.as_ref();
    if !path.exists() {
        return Ok(Config::default());
    }
    let contents = fs::read_to_string(path)?;
    if contents.trim().is_empty() {
        return Ok(Config::default());
    }
    let cfg: Config = toml::from_str(&contents)?;
    Ok(cfg)
}

/// Resolve the default config path (platform aware).
pub fn default_path() -> Result<PathBuf> {
    let base = config_dir().ok_or_else(|| eyre!("no config dir available"))?;
    Ok(base.join("taskstreak").join("config.toml"))
}

/// Write the given config to the default path unless a file is already there.
pub fn write_default_if_missing(config: &Config) -> Result<PathBuf> {
    write_to_path_if_missing(config, &default_path()?)
}

fn write_to_path_if_missing(config: &Config, path: &Path) -> Result<PathBuf> {
    if path.exists() {
        return Ok(path.to_path_buf());
    }
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let body = toml::to_string_pretty(config)?;
    fs::write(path, body)?;
    Ok(path.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn returns_default_when_missing() {
        let dir = tempfile::tempdir().expect("tempdir");
        let cfg = load_from_path(dir.path().join("config.toml")).expect("load");
        assert_eq!(cfg, Config::default());
    }

    #[test]
    fn returns_default_when_blank() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("config.toml");
        fs::write(&path, "  \n").expect("write");
        assert_eq!(load_from_path(&path).expect("load"), Config::default());
    }

    #[test]
    fn parses_custom_config() {
        let contents = r#"
            data_dir = "/tmp/taskstreak-data"
            theme = "dark"
        "#;
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("config.toml");
        fs::write(&path, contents).expect("write temp config");

        let cfg = load_from_path(&path).expect("load");
        assert_eq!(
            cfg,
            Config {
                data_dir: Some(PathBuf::from("/tmp/taskstreak-data")),
                theme: Some(Theme::Dark),
                timezone: None,
            }
        );
        assert_eq!(cfg.fallback_theme(), Theme::Dark);
    }

    #[test]
    fn rejects_unknown_theme() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("config.toml");
        fs::write(&path, "theme = \"sepia\"").expect("write");
        assert!(load_from_path(&path).is_err());
    }

    #[test]
    fn write_default_creates_file_once() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("nested").join("config.toml");
        let cfg = Config {
            data_dir: Some(PathBuf::from("/tmp/taskstreak-data")),
            theme: None,
            timezone: Some("Europe/Berlin".into()),
        };

        write_to_path_if_missing(&cfg, &path).expect("write should succeed");
        let other = Config {
            data_dir: None,
            theme: Some(Theme::Light),
            timezone: None,
        };
        let second = write_to_path_if_missing(&other, &path).expect("second write ok");
        assert_eq!(second, path);
        let loaded: Config =
            toml::from_str(&fs::read_to_string(&path).expect("read")).expect("parse");
        assert_eq!(loaded, cfg);
    }

    #[test]
    fn resolves_configured_zone() {
        assert_eq!(Config::default().zone().expect("zone"), Zone::Local);
        let cfg: Config = toml::from_str("timezone = \"Europe/Berlin\"").expect("parse");
        assert_eq!(
            cfg.zone().expect("zone"),
            "Europe/Berlin".parse::<Zone>().expect("zone")
        );
        let bad = Config {
            timezone: Some("Nowhere/Special".into()),
            ..Config::default()
        };
        assert!(bad.zone().is_err());
    }

    #[test]
    fn reads_terminal_background_hint() {
        assert_eq!(theme_from_colorfgbg("15;0"), Some(Theme::Dark));
        assert_eq!(theme_from_colorfgbg("0;15"), Some(Theme::Light));
        assert_eq!(theme_from_colorfgbg("15;default;0"), Some(Theme::Dark));
        assert_eq!(theme_from_colorfgbg("garbage"), None);
    }
}
