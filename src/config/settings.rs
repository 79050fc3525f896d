use crate::audit::CommandHistory;
use crate::git::{DEFAULT_LOG_LIMIT, GitExecutor};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tracing::warn;

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// File name of the application document inside the config directory
pub const DATA_FILE_NAME: &str = "rock-data.json";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Failed to serialize config: {0}")]
    SerializeError(#[from] toml::ser::Error),

    #[error("Config directory not found")]
    DirectoryNotFound,

    #[error("Invalid config value: {0}")]
    InvalidValue(String),
}

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub data: DataConfig,
    #[serde(default)]
    pub git: GitConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct DataConfig {
    /// Location of rock-data.json; defaults to the config directory
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct GitConfig {
    pub binary: String,
    /// Unset means git commands may run forever
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout_seconds: Option<u64>,
    pub log_limit: usize,
}

impl Default for GitConfig {
    fn default() -> Self {
        Self {
            binary: "git".to_string(),
            timeout_seconds: None,
            log_limit: DEFAULT_LOG_LIMIT,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub log_commands: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            log_commands: false,
        }
    }
}

impl Config {
    /// Get the config directory path
    pub fn config_dir() -> Result<PathBuf, ConfigError> {
        let home = std::env::var("HOME").map_err(|_| ConfigError::DirectoryNotFound)?;
        Ok(PathBuf::from(home).join(".config").join("rock"))
    }

    /// Get the config file path
    pub fn config_path() -> Result<PathBuf, ConfigError> {
        Ok(Self::config_dir()?.join("config.toml"))
    }

    /// Load configuration from the default location; no file means defaults
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_or_default_from(Self::config_path()?)
    }

    /// Load configuration from a file, failing if it does not exist
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;

        config.validate()?;

        Ok(config)
    }

    /// Load configuration, falling back to defaults when the file is missing
    pub fn load_or_default_from<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        match Self::load_from(path) {
            Err(ConfigError::ReadError(e)) if e.kind() == std::io::ErrorKind::NotFound => {
                Ok(Self::default_config())
            }
            other => other,
        }
    }

    /// Save configuration to the default location
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(Self::config_path()?)
    }

    pub fn save_to<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        self.validate()?;

        let path = path.as_ref();
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)?;
        }

        fs::write(path, toml::to_string_pretty(self)?)?;
        Ok(())
    }

    pub fn default_config() -> Self {
        Self::default()
    }

    /// Validate configuration values
    fn validate(&self) -> Result<(), ConfigError> {
        if self.git.binary.trim().is_empty() {
            return Err(ConfigError::InvalidValue(
                "git.binary must not be empty".to_string(),
            ));
        }

        if self.git.timeout_seconds == Some(0) {
            return Err(ConfigError::InvalidValue(
                "git.timeout_seconds must be greater than 0 (omit it to disable the timeout)"
                    .to_string(),
            ));
        }

        if self.git.log_limit == 0 {
            return Err(ConfigError::InvalidValue(
                "git.log_limit must be greater than 0".to_string(),
            ));
        }

        if !LOG_LEVELS.contains(&self.logging.level.as_str()) {
            return Err(ConfigError::InvalidValue(format!(
                "Unknown logging.level: {}. Expected one of {}",
                self.logging.level,
                LOG_LEVELS.join(", ")
            )));
        }

        Ok(())
    }

    /// Where the application document lives
    pub fn data_path(&self) -> Result<PathBuf, ConfigError> {
        match &self.data.path {
            Some(path) => Ok(path.clone()),
            None => Ok(Self::config_dir()?.join(DATA_FILE_NAME)),
        }
    }

    /// Git executor honouring the `[git]` and `[logging]` sections
    pub fn executor(&self) -> GitExecutor {
        let mut executor = GitExecutor::new().with_binary(&self.git.binary);

        if let Some(seconds) = self.git.timeout_seconds {
            executor = executor.with_timeout(Duration::from_secs(seconds));
        }

        if self.logging.log_commands {
            match Self::config_dir().and_then(|dir| CommandHistory::in_dir(dir).map_err(ConfigError::from)) {
                Ok(history) => executor = executor.with_history(history),
                Err(e) => warn!(error = %e, "Command history disabled"),
            }
        }

        executor
    }
}
