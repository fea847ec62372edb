//! CLI configuration file and path resolution.
//!
//! # Responsibility
//! - Load `config.toml` from the platform config directory, writing a
//!   default one on first run.
//! - Resolve the database file and log directory.
//!
//! # Invariants
//! - Database path precedence: `--db`, then `LIFEDASH_DB`, then the config
//!   file, then the platform data directory.

use color_eyre::eyre::{eyre, Result, WrapErr};
use directories::{BaseDirs, ProjectDirs};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const DB_PATH_ENV: &str = "LIFEDASH_DB";
const CONFIG_FILE_NAME: &str = "config.toml";
const DB_FILE_NAME: &str = "lifedash.sqlite3";
const LOG_DIR_NAME: &str = "logs";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CliConfig {
    /// Database file; `~/` is expanded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub database_path: Option<String>,
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Absolute log directory; defaults to `<data dir>/logs`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_dir: Option<String>,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            database_path: None,
            log_level: default_log_level(),
            log_dir: None,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

impl CliConfig {
    /// Loads `path`, or the platform config file when `path` is `None`.
    ///
    /// A missing platform config file is created with defaults; a missing
    /// explicit file is an error.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        if let Some(path) = path {
            return Self::read(path);
        }

        let Some(config_path) = default_config_path() else {
            return Ok(Self::default());
        };
        if config_path.exists() {
            return Self::read(&config_path);
        }

        let config = Self::default();
        if let Err(err) = config.save(&config_path) {
            eprintln!("warning: could not write default config: {err:#}");
        }
        Ok(config)
    }

    fn read(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .wrap_err_with(|| format!("failed to read config file {}", path.display()))?;
        toml::from_str(&contents)
            .wrap_err_with(|| format!("failed to parse config file {}", path.display()))
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .wrap_err_with(|| format!("failed to create {}", parent.display()))?;
        }
        let contents = toml::to_string_pretty(self).wrap_err("failed to serialize config")?;
        fs::write(path, contents)
            .wrap_err_with(|| format!("failed to write config file {}", path.display()))
    }

    /// Database file for this run.
    pub fn database_path(&self, flag: Option<&Path>, env_value: Option<String>) -> Result<PathBuf> {
        if let Some(path) = flag {
            return Ok(path.to_path_buf());
        }
        if let Some(raw) = env_value {
            let trimmed = raw.trim();
            if !trimmed.is_empty() {
                return Ok(expand_path(trimmed));
            }
        }
        if let Some(raw) = self.database_path.as_deref() {
            return Ok(expand_path(raw));
        }
        data_dir()
            .map(|dir| dir.join(DB_FILE_NAME))
            .ok_or_else(|| eyre!("could not determine a data directory; pass --db"))
    }

    /// Log directory for this run, if one can be determined.
    pub fn log_dir(&self) -> Option<PathBuf> {
        match self.log_dir.as_deref() {
            Some(raw) => Some(expand_path(raw)),
            None => data_dir().map(|dir| dir.join(LOG_DIR_NAME)),
        }
    }
}

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("com", "lifedash", "lifedash")
}

pub fn default_config_path() -> Option<PathBuf> {
    project_dirs().map(|dirs| dirs.config_dir().join(CONFIG_FILE_NAME))
}

fn data_dir() -> Option<PathBuf> {
    project_dirs().map(|dirs| dirs.data_dir().to_path_buf())
}

/// Expands a leading `~/` to the home directory.
pub fn expand_path(raw: &str) -> PathBuf {
    if let Some(rest) = raw.strip_prefix("~/") {
        if let Some(dirs) = BaseDirs::new() {
            return dirs.home_dir().join(rest);
        }
    }
    PathBuf::from(raw)
}

#[cfg(test)]
mod tests {
    use super::CliConfig;
    use std::path::{Path, PathBuf};

    #[test]
    fn flag_wins_over_env_and_file() {
        let config = CliConfig {
            database_path: Some("/from/config.db".to_string()),
            ..CliConfig::default()
        };

        let path = config
            .database_path(
                Some(Path::new("/from/flag.db")),
                Some("/from/env.db".to_string()),
            )
            .unwrap();

        assert_eq!(path, PathBuf::from("/from/flag.db"));
    }

    #[test]
    fn env_wins_over_file_unless_blank() {
        let config = CliConfig {
            database_path: Some("/from/config.db".to_string()),
            ..CliConfig::default()
        };

        let from_env = config
            .database_path(None, Some("/from/env.db".to_string()))
            .unwrap();
        assert_eq!(from_env, PathBuf::from("/from/env.db"));

        let from_file = config.database_path(None, Some("  ".to_string())).unwrap();
        assert_eq!(from_file, PathBuf::from("/from/config.db"));
    }

    #[test]
    fn load_reads_partial_file_with_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "database_path = \"/tmp/x.db\"\n").unwrap();

        let config = CliConfig::load(Some(&path)).unwrap();

        assert_eq!(config.database_path.as_deref(), Some("/tmp/x.db"));
        assert_eq!(config.log_level, "info");
        assert_eq!(config.log_dir, None);
    }

    #[test]
    fn load_rejects_missing_explicit_file() {
        let dir = tempfile::tempdir().unwrap();
        assert!(CliConfig::load(Some(&dir.path().join("absent.toml"))).is_err());
    }

    #[test]
    fn save_then_load_keeps_values() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        let config = CliConfig {
            database_path: Some("/data/lifedash.sqlite3".to_string()),
            log_level: "debug".to_string(),
            log_dir: Some("/data/logs".to_string()),
        };

        config.save(&path).unwrap();

        assert_eq!(CliConfig::load(Some(&path)).unwrap(), config);
    }
}
