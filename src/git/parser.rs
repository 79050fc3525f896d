use crate::git::model::{FileStatus, FileStatusEntry, GitBranch, GitCommit, GitStatus};
use thiserror::Error;
use tracing::debug;

/// Marker written after every commit by [`LOG_FORMAT`]
pub const COMMIT_SENTINEL: &str = "---COMMIT---";

/// `--pretty=format:` string understood by [`parse_log`]
pub const LOG_FORMAT: &str = "%H%n%h%n%an%n%ae%n%ai%n%s%n%b%n---COMMIT---";

/// sha, short sha, author, email, date, subject
const MIN_COMMIT_LINES: usize = 6;

const REMOTE_PREFIX: &str = "remotes/";

/// A single record the parsers could not make sense of
///
/// Never escapes the public parse functions: defective records are logged
/// and dropped, a defective branch header degrades to defaults.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseDefect {
    #[error("status output has no branch header")]
    MissingHeader,

    #[error("unrecognised branch header: {0:?}")]
    BadHeader(String),

    #[error("status line too short: {0:?}")]
    ShortStatusLine(String),

    #[error("commit block has {0} lines, expected at least {1}")]
    ShortCommitBlock(usize, usize),

    #[error("empty branch line")]
    EmptyBranchLine,
}

/// Branch and tracking information from the `## ...` status header
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BranchHeader {
    pub branch: String,
    pub upstream: Option<String>,
    pub ahead: u32,
    pub behind: u32,
}

/// Parse `git status --porcelain --branch` output
pub fn parse_status(output: &str) -> GitStatus {
    let mut lines = output.lines().filter(|line| !line.trim().is_empty()).peekable();

    let header = match lines.peek() {
        Some(line) if line.starts_with("##") => {
            let line = lines.next().unwrap_or_default();
            parse_branch_header(line)
        }
        _ => Err(ParseDefect::MissingHeader),
    };

    let (branch, ahead, behind) = match header {
        Ok(header) => (header.branch, header.ahead, header.behind),
        Err(defect) => {
            debug!(%defect, "falling back to unknown branch");
            (GitStatus::UNKNOWN_BRANCH.to_string(), 0, 0)
        }
    };

    let files = lines
        .filter_map(|line| match parse_status_line(line) {
            Ok(entry) => Some(entry),
            Err(defect) => {
                debug!(%defect, "skipping status line");
                None
            }
        })
        .collect();

    GitStatus::new(branch, ahead, behind, files)
}

/// Parse the header line: `## <branch>[...<upstream>][ [ahead N][, ]behind N]]`
pub fn parse_branch_header(line: &str) -> Result<BranchHeader, ParseDefect> {
    let rest = line
        .strip_prefix("##")
        .ok_or(ParseDefect::MissingHeader)?
        .trim();

    let (head, tracking) = match rest
        .strip_suffix(']')
        .and_then(|s| s.rfind(" [").map(|idx| (&s[..idx], &s[idx + 2..])))
    {
        Some((head, tracking)) => (head, Some(tracking)),
        None => (rest, None),
    };

    // Unborn branches: "No commits yet on main" (older git: "Initial commit on main")
    let head = head
        .strip_prefix("No commits yet on ")
        .or_else(|| head.strip_prefix("Initial commit on "))
        .unwrap_or(head);

    let (branch, upstream) = match head.split_once("...") {
        Some((branch, upstream)) => (branch.trim(), Some(upstream.trim().to_string())),
        None => (head.trim(), None),
    };

    if branch.is_empty() {
        return Err(ParseDefect::BadHeader(line.to_string()));
    }

    let mut ahead = 0;
    let mut behind = 0;
    if let Some(tracking) = tracking {
        for part in tracking.split(',').map(str::trim) {
            if let Some(n) = part.strip_prefix("ahead ") {
                ahead = n.trim().parse().unwrap_or(0);
            } else if let Some(n) = part.strip_prefix("behind ") {
                behind = n.trim().parse().unwrap_or(0);
            }
        }
    }

    Ok(BranchHeader {
        branch: branch.to_string(),
        upstream,
        ahead,
        behind,
    })
}

/// Parse one `XY path` entry line
pub fn parse_status_line(line: &str) -> Result<FileStatusEntry, ParseDefect> {
    let short = || ParseDefect::ShortStatusLine(line.to_string());

    let mut chars = line.chars();
    let (Some(index_code), Some(worktree_code)) = (chars.next(), chars.next()) else {
        return Err(short());
    };

    // Exactly one separator character, then the path as printed
    let path = chars
        .as_str()
        .get(1..)
        .filter(|path| !path.is_empty())
        .ok_or_else(short)?;

    let (status, staged) = classify_status_code(index_code, worktree_code);

    let (path, old_path) = match (status, path.split_once(" -> ")) {
        (FileStatus::Renamed, Some((old, new))) => (new.to_string(), Some(old.to_string())),
        _ => (path.to_string(), None),
    };

    Ok(FileStatusEntry {
        path,
        status,
        staged,
        old_path,
    })
}

/// Map a porcelain `XY` code pair to a status and staged flag
///
/// The index code wins when it names a change. Only entries with nothing
/// staged look at the worktree code, so `MD` stays a staged modification.
pub fn classify_status_code(index_code: char, worktree_code: char) -> (FileStatus, bool) {
    let (mut status, staged) = match index_code {
        'A' => (FileStatus::Added, true),
        'M' => (FileStatus::Modified, true),
        'D' => (FileStatus::Deleted, true),
        'R' => (FileStatus::Renamed, true),
        '?' => (FileStatus::Untracked, false),
        _ => (FileStatus::Modified, false),
    };

    if !staged {
        match worktree_code {
            'M' => status = FileStatus::Modified,
            'D' => status = FileStatus::Deleted,
            _ => {}
        }
    }

    (status, staged)
}

/// Parse `git log --pretty=format:<LOG_FORMAT>` output, keeping git's order
pub fn parse_log(output: &str) -> Vec<GitCommit> {
    output
        .split(COMMIT_SENTINEL)
        .map(str::trim)
        .filter(|block| !block.is_empty())
        .filter_map(|block| match parse_commit_block(block) {
            Ok(commit) => Some(commit),
            Err(defect) => {
                debug!(%defect, "dropping commit block");
                None
            }
        })
        .collect()
}

/// Parse one sentinel-delimited commit block
pub fn parse_commit_block(block: &str) -> Result<GitCommit, ParseDefect> {
    let lines: Vec<&str> = block.lines().collect();
    if lines.len() < MIN_COMMIT_LINES {
        return Err(ParseDefect::ShortCommitBlock(lines.len(), MIN_COMMIT_LINES));
    }

    Ok(GitCommit {
        sha: lines[0].to_string(),
        short_sha: lines[1].to_string(),
        author: lines[2].to_string(),
        email: lines[3].to_string(),
        date: lines[4].to_string(),
        message: lines[5..].join("\n").trim().to_string(),
        branch: None,
    })
}

/// Parse `git branch -a -vv` output
pub fn parse_branches(output: &str) -> Vec<GitBranch> {
    output
        .lines()
        .filter(|line| !line.trim().is_empty())
        .filter_map(|line| match parse_branch_line(line) {
            Ok(branch) => Some(branch),
            Err(defect) => {
                debug!(%defect, "skipping branch line");
                None
            }
        })
        .collect()
}

/// Parse one branch line
///
/// Format: `* main 1234abc [origin/main: ahead 1] Commit message`
/// or:     `  remotes/origin/dev abcd123 Commit message`
pub fn parse_branch_line(line: &str) -> Result<GitBranch, ParseDefect> {
    let current = line.starts_with('*');
    let clean = line.strip_prefix('*').unwrap_or(line).trim_start();

    let name = if clean.starts_with('(') {
        // "(HEAD detached at 1234abc)" contains spaces
        match clean.find(')') {
            Some(end) => &clean[..=end],
            None => clean,
        }
    } else {
        clean.split_whitespace().next().unwrap_or_default()
    };

    if name.is_empty() {
        return Err(ParseDefect::EmptyBranchLine);
    }

    let (name, remote) = match name.strip_prefix(REMOTE_PREFIX) {
        Some(stripped) => (stripped, true),
        None => (name, false),
    };

    Ok(GitBranch {
        name: name.to_string(),
        current,
        remote,
        upstream: bracketed(line).map(str::to_string),
    })
}

/// First non-empty `[...]` group in the line
fn bracketed(line: &str) -> Option<&str> {
    let start = line.find('[')?;
    let rest = &line[start + 1..];
    let end = rest.find(']')?;
    (end > 0).then(|| &rest[..end])
}
