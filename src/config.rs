use std::{
    fs,
    path::{Path, PathBuf},
};

use directories::ProjectDirs;
use log::debug;
use serde::{Deserialize, Serialize};

use crate::{CnError, Result};

/// Application configuration settings.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Config {
    /// Directory holding the archive document
    pub data_dir: PathBuf,

    /// Directory for backups
    pub backup_dir: PathBuf,

    /// Maximum number of full backups to keep (0 keeps all)
    pub max_backups: u32,

    /// Snapshot the current document into the backup directory before
    /// every overwrite
    pub auto_backup: bool,

    /// Calendar target: days with entries per month
    pub monthly_goal: u32,
}

impl Default for Config {
    fn default() -> Self {
        let (data_dir, backup_dir) = match ProjectDirs::from("", "", "canvasnotes") {
            Some(dirs) => (
                dirs.data_dir().to_path_buf(),
                dirs.data_dir().join("backups"),
            ),
            None => (PathBuf::from("."), PathBuf::from("backups")),
        };

        Config {
            data_dir,
            backup_dir,
            max_backups: 10,
            auto_backup: false,
            monthly_goal: 20,
        }
    }
}

impl Config {
    /// Default location of the configuration file.
    pub fn default_path() -> PathBuf {
        ProjectDirs::from("", "", "canvasnotes")
            .map(|dirs| dirs.config_dir().join("config.json"))
            .unwrap_or_else(|| PathBuf::from("config.json"))
    }

    /// Loads the configuration from `path`, falling back to defaults when no
    /// file exists there yet.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!("No config file at {}, using defaults", path.display());
            return Ok(Config::default());
        }

        let content = fs::read_to_string(path)?;
        serde_json::from_str(&content).map_err(|e| CnError::ConfigError {
            message: format!("Failed to parse {}: {}", path.display(), e),
        })
    }

    /// Writes the configuration to `path`, creating parent directories.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|_| CnError::DirectoryError {
                path: parent.to_path_buf(),
            })?;
        }
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        debug!("Configuration saved to {}", path.display());
        Ok(())
    }

    /// Applies a `key=value` assignment from the `config --set` command.
    pub fn set(&mut self, assignment: &str) -> Result<()> {
        let (key, value) = assignment.split_once('=').ok_or_else(|| CnError::ConfigError {
            message: format!("Expected key=value, got '{}'", assignment),
        })?;
        let value = value.trim();

        match key.trim() {
            "data_dir" => self.data_dir = PathBuf::from(value),
            "backup_dir" => self.backup_dir = PathBuf::from(value),
            "max_backups" => {
                self.max_backups = value.parse().map_err(|_| CnError::ConfigError {
                    message: format!("max_backups must be a number, got '{}'", value),
                })?
            }
            "auto_backup" => {
                self.auto_backup = value.parse().map_err(|_| CnError::ConfigError {
                    message: format!("auto_backup must be true or false, got '{}'", value),
                })?
            }
            "monthly_goal" => {
                self.monthly_goal = value.parse().map_err(|_| CnError::ConfigError {
                    message: format!("monthly_goal must be a number, got '{}'", value),
                })?
            }
            other => {
                return Err(CnError::ConfigError {
                    message: format!("Unknown configuration key: {}", other),
                })
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_parses_known_keys() {
        let mut config = Config::default();
        config.set("max_backups=3").unwrap();
        config.set("auto_backup=true").unwrap();
        config.set("monthly_goal = 25").unwrap();
        assert_eq!(config.max_backups, 3);
        assert!(config.auto_backup);
        assert_eq!(config.monthly_goal, 25);
    }

    #[test]
    fn set_rejects_unknown_keys_and_bad_values() {
        let mut config = Config::default();
        assert!(config.set("nope=1").is_err());
        assert!(config.set("max_backups=lots").is_err());
        assert!(config.set("just-a-word").is_err());
    }
}
