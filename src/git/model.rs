use serde::{Deserialize, Serialize};

/// Change classification for a single path in the working tree
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileStatus {
    Modified,
    Added,
    Deleted,
    Untracked,
    Renamed,
}

/// One line of `status --porcelain` output
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileStatusEntry {
    pub path: String,
    pub status: FileStatus,
    /// True when the index holds the change, not only the working tree
    pub staged: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub old_path: Option<String>,
}

/// Snapshot of a working tree, rebuilt on every status query
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GitStatus {
    pub branch: String,
    pub ahead: u32,
    pub behind: u32,
    pub files: Vec<FileStatusEntry>,
    pub has_uncommitted: bool,
}

impl GitStatus {
    pub const UNKNOWN_BRANCH: &'static str = "unknown";

    /// Build a snapshot; `has_uncommitted` always follows `files`
    pub fn new(branch: String, ahead: u32, behind: u32, files: Vec<FileStatusEntry>) -> Self {
        let has_uncommitted = !files.is_empty();
        Self {
            branch,
            ahead,
            behind,
            files,
            has_uncommitted,
        }
    }
}

impl Default for GitStatus {
    fn default() -> Self {
        Self::new(Self::UNKNOWN_BRANCH.to_string(), 0, 0, Vec::new())
    }
}

/// A commit from the log, newest first
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GitCommit {
    pub sha: String,
    pub short_sha: String,
    pub message: String,
    pub author: String,
    pub email: String,
    pub date: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub branch: Option<String>,
}

impl GitCommit {
    /// First line of the message
    pub fn subject(&self) -> &str {
        self.message.lines().next().unwrap_or("")
    }
}

/// A local or remote-tracking branch from `branch -a -vv`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GitBranch {
    pub name: String,
    pub current: bool,
    pub remote: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub upstream: Option<String>,
}

/// Outcome of a lookup whose failure is not an error
///
/// Keeps "git could not answer" apart from a legitimately empty answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup<T> {
    Found(T),
    Unavailable,
}

impl<T> Lookup<T> {
    pub fn into_option(self) -> Option<T> {
        match self {
            Lookup::Found(value) => Some(value),
            Lookup::Unavailable => None,
        }
    }
}

impl<T: Default> Lookup<T> {
    /// Collapse to the value or its default, as the boundary API reports it
    pub fn unwrap_or_default(self) -> T {
        self.into_option().unwrap_or_default()
    }
}
