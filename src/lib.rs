pub mod api;
pub mod audit;
pub mod config;
pub mod error;
pub mod git;
pub mod logging;
pub mod repos;
pub mod store;

// Re-export commonly used types for convenience
pub use error::{AppError, AppResult, GitError, GitResult, StoreError, StoreResult};
pub use git::{
    CommandRunner, FileStatus, FileStatusEntry, GitApi, GitBranch, GitCommit, GitExecutor,
    GitStatus, Lookup,
};
pub use repos::RepositoryCoordinator;
pub use store::{Document, JsonDocumentStore, RegisteredRepo};
