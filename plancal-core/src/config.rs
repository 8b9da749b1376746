//! Global plancal configuration.

use std::path::PathBuf;

use config::{Config, File};
use serde::{Deserialize, Serialize};

use crate::error::{PlancalError, PlancalResult};
use crate::log::UNKNOWN_ORIGIN;

static DEFAULT_DATA_FILE: &str = "~/.local/share/plancal/store.json";

fn default_data_file() -> PathBuf {
    PathBuf::from(DEFAULT_DATA_FILE)
}

fn is_default_data_file(p: &PathBuf) -> bool {
    *p == default_data_file()
}

fn default_origin() -> String {
    UNKNOWN_ORIGIN.to_string()
}

fn is_default_origin(s: &String) -> bool {
    s == UNKNOWN_ORIGIN
}

/// Global configuration at ~/.config/plancal/config.toml
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct GlobalConfig {
    /// Where the document store file lives.
    #[serde(default = "default_data_file", skip_serializing_if = "is_default_data_file")]
    pub data_file: PathBuf,

    /// Origin label recorded in change-log entries.
    #[serde(default = "default_origin", skip_serializing_if = "is_default_origin")]
    pub origin: String,

    /// Account used when none is passed on the command line.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_account: Option<String>,

    /// Project used when none is passed on the command line.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_project: Option<String>,
}

impl Default for GlobalConfig {
    fn default() -> Self {
        GlobalConfig {
            data_file: default_data_file(),
            origin: default_origin(),
            default_account: None,
            default_project: None,
        }
    }
}

impl GlobalConfig {
    pub fn config_path() -> PlancalResult<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| PlancalError::Config("Could not determine config directory".into()))?
            .join("plancal");

        Ok(config_dir.join("config.toml"))
    }

    pub fn load() -> PlancalResult<Self> {
        let config_path = Self::config_path()?;

        Config::builder()
            .add_source(File::from(config_path).required(false))
            .build()
            .map_err(|e| PlancalError::Config(e.to_string()))?
            .try_deserialize()
            .map_err(|e| PlancalError::Config(e.to_string()))
    }

    /// Save the current config to ~/.config/plancal/config.toml
    pub fn save(&self) -> PlancalResult<()> {
        let config_path = Self::config_path()?;

        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                PlancalError::Config(format!("Could not create config directory: {e}"))
            })?;
        }

        let content =
            toml::to_string_pretty(self).map_err(|e| PlancalError::Config(e.to_string()))?;

        std::fs::write(&config_path, content)
            .map_err(|e| PlancalError::Config(format!("Could not write config file: {e}")))?;

        Ok(())
    }

    /// The store file path with `~` expanded.
    pub fn data_path(&self) -> PathBuf {
        let expanded = shellexpand::tilde(&self.data_file.to_string_lossy()).into_owned();
        PathBuf::from(expanded)
    }
}
