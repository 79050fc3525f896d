use crate::audit::CommandHistory;
use crate::error::{GitError, GitResult};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::{Output, Stdio};
use std::time::Duration;
use tokio::process::Command;
use tracing::{debug, warn};

/// Runs one git command line against a working tree
///
/// Implementations return stdout with surrounding whitespace trimmed and
/// fail only when the command itself fails.
#[async_trait]
pub trait CommandRunner: Send + Sync {
    async fn run(&self, dir: &Path, args: &[&str]) -> GitResult<String>;
}

/// Result of executing a git command
#[derive(Debug, Clone)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: i32,
    pub success: bool,
}

/// Spawns the git binary, one subprocess per call
///
/// No timeout unless one is set with [`GitExecutor::with_timeout`]; a hung
/// git process otherwise hangs the caller.
#[derive(Debug, Clone)]
pub struct GitExecutor {
    binary: PathBuf,
    timeout: Option<Duration>,
    history: Option<CommandHistory>,
}

impl GitExecutor {
    pub fn new() -> Self {
        Self {
            binary: PathBuf::from("git"),
            timeout: None,
            history: None,
        }
    }

    /// Use a different git binary
    pub fn with_binary<P: AsRef<Path>>(mut self, binary: P) -> Self {
        self.binary = binary.as_ref().to_path_buf();
        self
    }

    /// Kill the subprocess and fail with [`GitError::Timeout`] after `timeout`
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Append every invocation to a command history log
    pub fn with_history(mut self, history: CommandHistory) -> Self {
        self.history = Some(history);
        self
    }

    pub fn binary(&self) -> &Path {
        &self.binary
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// Execute a git command in `dir` and return the raw output
    ///
    /// `args` excludes the binary itself, e.g. `["status", "--porcelain"]`.
    pub async fn execute(&self, dir: &Path, args: &[&str]) -> GitResult<CommandOutput> {
        let mut command = Command::new(&self.binary);
        command
            .args(args)
            .current_dir(dir)
            .stdin(Stdio::null())
            .kill_on_drop(true);

        debug!(dir = %dir.display(), args = ?args, "running git");

        let output = match self.timeout {
            Some(limit) => tokio::time::timeout(limit, command.output())
                .await
                .map_err(|_| GitError::Timeout(limit.as_secs(), args.join(" ")))?,
            None => command.output().await,
        }
        .map_err(GitError::Spawn)?;

        if let Some(history) = &self.history {
            record_history(history.clone(), dir, args, output.status.code().unwrap_or(-1)).await;
        }

        self.process_output(output, args)
    }

    /// Process command output into CommandOutput struct
    fn process_output(&self, output: Output, args: &[&str]) -> GitResult<CommandOutput> {
        let stdout = String::from_utf8_lossy(&output.stdout).to_string();
        let stderr = String::from_utf8_lossy(&output.stderr).to_string();
        let exit_code = output.status.code().unwrap_or(-1);
        let success = output.status.success();

        if !success {
            return Err(GitError::CommandFailed(format!(
                "Command 'git {}' failed with exit code {}: {}",
                args.join(" "),
                exit_code,
                stderr.trim()
            )));
        }

        // stderr alone never fails a command
        let advisory = stderr.trim();
        if !advisory.is_empty() {
            if advisory.contains("warning") {
                debug!(stderr = advisory, "git warning");
            } else {
                warn!(stderr = advisory, "git wrote to stderr");
            }
        }

        Ok(CommandOutput {
            stdout,
            stderr,
            exit_code,
            success,
        })
    }
}

/// Append to the history file on the blocking pool; failures are only logged
async fn record_history(history: CommandHistory, dir: &Path, args: &[&str], exit_code: i32) {
    let dir = dir.to_path_buf();
    let args: Vec<String> = args.iter().map(|arg| arg.to_string()).collect();

    let recorded = tokio::task::spawn_blocking(move || {
        let args: Vec<&str> = args.iter().map(String::as_str).collect();
        history.record(&dir, &args, exit_code)
    })
    .await;

    match recorded {
        Ok(Ok(())) => {}
        Ok(Err(e)) => warn!(error = %e, "Failed to write command history"),
        Err(e) => warn!(error = %e, "Command history task failed"),
    }
}

impl Default for GitExecutor {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CommandRunner for GitExecutor {
    async fn run(&self, dir: &Path, args: &[&str]) -> GitResult<String> {
        let output = self.execute(dir, args).await?;
        Ok(output.stdout.trim().to_string())
    }
}
