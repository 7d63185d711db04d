use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use serde::Deserialize;
use tally_import::{CategoryRuleEngine, RuleFileError};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Invalid config file: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Could not determine a home directory")]
    NoHomeDirectory,
    #[error("Invalid rules seed: {0}")]
    Rules(#[from] RuleFileError),
}

/// Settings read from `config.toml` in the platform config directory.
/// Every field is optional in the file.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Where the database lives. Defaults to the platform data directory.
    pub data_dir: Option<PathBuf>,
    pub database_file: String,
    /// Rules TOML applied once, when the stored rule table is empty.
    pub rules_seed: Option<PathBuf>,
    /// Used when `RUST_LOG` is unset.
    pub log_filter: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_dir: None,
            database_file: "tally.db".to_string(),
            rules_seed: None,
            log_filter: "info".to_string(),
        }
    }
}

impl AppConfig {
    pub fn project_dirs() -> Result<ProjectDirs, ConfigError> {
        ProjectDirs::from("com", "tally", "Tally").ok_or(ConfigError::NoHomeDirectory)
    }

    /// Load `<config dir>/config.toml`, falling back to defaults when absent.
    pub fn load() -> Result<Self, ConfigError> {
        let dirs = Self::project_dirs()?;
        Self::load_from(&dirs.config_dir().join("config.toml"))
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => Self::from_toml(&content),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "no config file, using defaults");
                Ok(Self::default())
            }
            Err(source) => Err(ConfigError::Io {
                path: path.to_path_buf(),
                source,
            }),
        }
    }

    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    pub fn data_dir(&self) -> Result<PathBuf, ConfigError> {
        match &self.data_dir {
            Some(dir) => Ok(dir.clone()),
            None => Ok(Self::project_dirs()?.data_dir().to_path_buf()),
        }
    }

    pub fn database_path(&self) -> Result<PathBuf, ConfigError> {
        Ok(self.data_dir()?.join(&self.database_file))
    }

    /// The configured rule seed, if any.
    pub fn load_rules_seed(&self) -> Result<Option<CategoryRuleEngine>, ConfigError> {
        let Some(path) = &self.rules_seed else {
            return Ok(None);
        };
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.clone(),
            source,
        })?;
        Ok(Some(CategoryRuleEngine::from_toml(&content)?))
    }
}
