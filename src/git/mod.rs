pub mod executor;
pub mod model;
pub mod parser;
pub mod repository;

// Re-export commonly used types
pub use executor::{CommandOutput, CommandRunner, GitExecutor};
pub use model::{FileStatus, FileStatusEntry, GitBranch, GitCommit, GitStatus, Lookup};
pub use parser::{ParseDefect, parse_branches, parse_log, parse_status};
pub use repository::{DEFAULT_LOG_LIMIT, GitApi};
