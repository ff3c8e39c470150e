//! Configuration file support for swimedit.
//!
//! Configuration is loaded from `$XDG_CONFIG_HOME/swimedit/config.toml`.

use crate::analysis::DEFAULT_BEST_TIME_DISTANCES;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Application configuration
#[derive(Clone, Debug, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub data: DataConfig,

    #[serde(default)]
    pub editing: EditingConfig,

    #[serde(default)]
    pub analysis: AnalysisConfig,
}

/// Data storage configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DataConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
        }
    }
}

/// Editing behaviour
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EditingConfig {
    /// Append applied edits to the journal
    #[serde(default = "default_journal")]
    pub journal: bool,
}

impl Default for EditingConfig {
    fn default() -> Self {
        Self {
            journal: default_journal(),
        }
    }
}

/// Analysis tables
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// Distances for the best times table, in pool units
    #[serde(default = "default_best_time_distances")]
    pub best_time_distances: Vec<u32>,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            best_time_distances: default_best_time_distances(),
        }
    }
}

fn home_dir() -> PathBuf {
    dirs::home_dir().unwrap_or_else(|| PathBuf::from("."))
}

// Default value functions
fn default_data_dir() -> PathBuf {
    let base = dirs::data_local_dir().unwrap_or_else(|| home_dir().join(".local/share"));
    base.join("swimedit")
}

fn default_journal() -> bool {
    true
}

fn default_best_time_distances() -> Vec<u32> {
    DEFAULT_BEST_TIME_DISTANCES.to_vec()
}

impl Config {
    /// Load configuration from the standard config path
    pub fn load() -> Result<Self> {
        let config_path = Self::default_config_path();
        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            tracing::info!("No config file found at {:?}, using defaults", config_path);
            Ok(Self::default())
        }
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        config.validate()?;
        tracing::info!("Loaded config from {:?}", path);
        Ok(config)
    }

    /// Reject values the engine cannot work with
    pub fn validate(&self) -> Result<()> {
        if self.analysis.best_time_distances.contains(&0) {
            return Err(Error::Config(
                "best_time_distances must be positive".into(),
            ));
        }
        Ok(())
    }

    /// Get the default config file path
    pub fn default_config_path() -> PathBuf {
        let base = dirs::config_dir().unwrap_or_else(|| home_dir().join(".config"));
        base.join("swimedit").join("config.toml")
    }

    /// Save the current configuration to the default path
    pub fn save(&self) -> Result<()> {
        let config_path = Self::default_config_path();
        self.save_to(&config_path)
    }

    /// Save the current configuration to a specific path
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, contents)?;
        tracing::info!("Saved config to {:?}", path);
        Ok(())
    }
}
