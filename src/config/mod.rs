pub mod settings;

pub use settings::{Config, ConfigError, DATA_FILE_NAME, DataConfig, GitConfig, LoggingConfig};
