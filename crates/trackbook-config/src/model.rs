use std::{ffi::OsString, path::PathBuf};

use serde::{Deserialize, Serialize};

use crate::ConfigError;

/// Environment variable that relocates the data directory when the config does not.
pub const HOME_ENV: &str = "TRACKBOOK_HOME";

/// User configuration. Every field has a default so older files keep loading.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Directory holding `accounts.json`, `transactions.json` and `backups/`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<PathBuf>,
    #[serde(default = "Config::default_backup_retention")]
    pub backup_retention: usize,
    /// Account that absorbs splits of deleted accounts when no substitute is given.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delete_substitute: Option<String>,
    #[serde(default = "Config::default_color")]
    pub color: bool,
    #[serde(default = "Config::default_log_filter")]
    pub log_filter: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: None,
            backup_retention: Self::default_backup_retention(),
            delete_substitute: None,
            color: Self::default_color(),
            log_filter: Self::default_log_filter(),
        }
    }
}

impl Config {
    pub fn default_backup_retention() -> usize {
        5
    }

    pub fn default_color() -> bool {
        true
    }

    pub fn default_log_filter() -> String {
        "trackbook=info".into()
    }

    /// Explicit `data_dir`, else `$TRACKBOOK_HOME`, else `~/.trackbook`.
    pub fn resolve_data_dir(&self) -> PathBuf {
        self.resolve_data_dir_with(std::env::var_os(HOME_ENV))
    }

    pub fn resolve_data_dir_with(&self, env_home: Option<OsString>) -> PathBuf {
        if let Some(path) = &self.data_dir {
            return path.clone();
        }
        if let Some(home) = env_home.filter(|value| !value.is_empty()) {
            return PathBuf::from(home);
        }
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".trackbook")
    }

    /// Rejects values that load fine but cannot be honoured.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.backup_retention == 0 {
            return Err(ConfigError::Invalid {
                field: "backup_retention",
                reason: "at least one backup must be kept".into(),
            });
        }
        if self.log_filter.trim().is_empty() {
            return Err(ConfigError::Invalid {
                field: "log_filter",
                reason: "must not be empty".into(),
            });
        }
        Ok(())
    }

    /// Trimmed substitute name, ignoring blanks.
    pub fn substitute(&self) -> Option<&str> {
        self.delete_substitute
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
    }
}
