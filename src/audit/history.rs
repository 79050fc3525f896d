use chrono::Utc;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

const MAX_LOG_SIZE: u64 = 10 * 1024 * 1024; // 10MB

pub const HISTORY_FILE_NAME: &str = "history.log";

/// Append-only record of every git invocation
#[derive(Debug, Clone)]
pub struct CommandHistory {
    log_path: PathBuf,
}

impl CommandHistory {
    /// History file named `history.log` inside `dir`
    pub fn in_dir<P: AsRef<Path>>(dir: P) -> std::io::Result<Self> {
        Self::with_path(dir.as_ref().join(HISTORY_FILE_NAME))
    }

    /// History file at an explicit path
    pub fn with_path<P: AsRef<Path>>(path: P) -> std::io::Result<Self> {
        let log_path = path.as_ref().to_path_buf();

        if let Some(parent) = log_path.parent() {
            fs::create_dir_all(parent)?;
        }

        Ok(Self { log_path })
    }

    /// Append one invocation: `[ts] [user] [repo] [exit:N] git <args>`
    pub fn record(&self, repo_path: &Path, args: &[&str], exit_code: i32) -> std::io::Result<()> {
        self.rotate_if_needed()?;

        let timestamp = Utc::now().to_rfc3339();
        let user = std::env::var("USER").unwrap_or_else(|_| "unknown".to_string());

        let entry = format!(
            "[{}] [{}] [{}] [exit:{}] git {}\n",
            timestamp,
            user,
            repo_path.display(),
            exit_code,
            args.join(" ")
        );

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.log_path)?;

        file.write_all(entry.as_bytes())?;
        file.flush()?;

        Ok(())
    }

    /// history.log -> history.log.1 once it passes MAX_LOG_SIZE
    fn rotate_if_needed(&self) -> std::io::Result<()> {
        let metadata = match fs::metadata(&self.log_path) {
            Ok(metadata) => metadata,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(()),
            Err(e) => return Err(e),
        };

        if metadata.len() > MAX_LOG_SIZE {
            fs::rename(&self.log_path, self.log_path.with_extension("log.1"))?;
        }

        Ok(())
    }

    pub fn log_path(&self) -> &Path {
        &self.log_path
    }
}
