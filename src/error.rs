use std::io;
use thiserror::Error;

use crate::config::settings::ConfigError;

/// Errors that can occur during git operations
#[derive(Debug, Error)]
pub enum GitError {
    #[error("Not a git repository: {0}")]
    NotARepository(String),

    #[error("Git command failed: {0}")]
    CommandFailed(String),

    #[error("Failed to clone repository: {0}")]
    CloneFailed(String),

    #[error("Git command timed out after {0}s: {1}")]
    Timeout(u64, String),

    #[error("Failed to execute git: {0}")]
    Spawn(#[source] io::Error),
}

/// Errors raised by the JSON document store
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Failed to access data file: {0}")]
    Io(#[from] io::Error),

    #[error("Failed to encode data file: {0}")]
    Json(#[from] serde_json::Error),
}

/// Top-level application error that wraps all module-specific errors
///
/// Used by the CLI and the JSON-lines bridge. Module errors convert via
/// `From` so `?` works across layers.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Git error: {0}")]
    Git(#[from] GitError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Result type for git operations
pub type GitResult<T> = std::result::Result<T, GitError>;

/// Result type for document store operations
pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Result type for application-level operations
pub type AppResult<T> = std::result::Result<T, AppError>;
