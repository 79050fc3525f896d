use crate::error::{GitError, GitResult};
use crate::git::executor::{CommandRunner, GitExecutor};
use crate::git::model::{GitBranch, GitCommit, GitStatus, Lookup};
use crate::git::parser::{self, LOG_FORMAT};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

/// Number of commits returned by [`GitApi::log`] when no limit is given
pub const DEFAULT_LOG_LIMIT: usize = 20;

/// Operations on local working trees
///
/// Stateless: every call names the repository path it works on and maps to
/// one git invocation (two for a commit with an explicit file list).
/// Concurrent calls against the same path are not serialised.
#[derive(Clone)]
pub struct GitApi {
    runner: Arc<dyn CommandRunner>,
    log_limit: usize,
}

impl GitApi {
    pub fn new(runner: Arc<dyn CommandRunner>) -> Self {
        Self {
            runner,
            log_limit: DEFAULT_LOG_LIMIT,
        }
    }

    /// Facade over the `git` found on PATH
    pub fn system() -> Self {
        Self::new(Arc::new(GitExecutor::new()))
    }

    /// Change the limit used when [`GitApi::log`] is called without one
    pub fn with_log_limit(mut self, limit: usize) -> Self {
        self.log_limit = limit;
        self
    }

    /// Check whether git recognises `path` as a repository; never fails
    ///
    /// Any successful `rev-parse` counts, so bare repositories and `.git`
    /// directories verify too.
    pub async fn verify(&self, path: &Path) -> bool {
        match self.runner.run(path, &["rev-parse", "--is-inside-work-tree"]).await {
            Ok(_) => true,
            Err(e) => {
                debug!(path = %path.display(), error = %e, "not a working tree");
                false
            }
        }
    }

    /// Branch, tracking counts and changed files
    pub async fn status(&self, path: &Path) -> GitResult<GitStatus> {
        let output = self.runner.run(path, &["status", "--porcelain", "--branch"]).await?;
        Ok(parser::parse_status(&output))
    }

    /// Most recent commits first; `None` uses the configured limit
    pub async fn log(&self, path: &Path, limit: Option<usize>) -> GitResult<Vec<GitCommit>> {
        let format = format!("--pretty=format:{}", LOG_FORMAT);
        let limit = limit.unwrap_or(self.log_limit).to_string();

        let output = self.runner.run(path, &["log", &format, "-n", &limit]).await?;
        Ok(parser::parse_log(&output))
    }

    /// Local and remote-tracking branches
    pub async fn branches(&self, path: &Path) -> GitResult<Vec<GitBranch>> {
        let output = self.runner.run(path, &["branch", "-a", "-vv"]).await?;
        Ok(parser::parse_branches(&output))
    }

    /// Name of the checked-out branch, empty when HEAD is detached
    pub async fn current_branch(&self, path: &Path) -> GitResult<String> {
        self.runner.run(path, &["branch", "--show-current"]).await
    }

    /// Stage `files` (if any) and commit
    ///
    /// With an empty list nothing is staged and whatever the index already
    /// holds is committed.
    pub async fn commit(&self, path: &Path, message: &str, files: &[String]) -> GitResult<()> {
        if !files.is_empty() {
            let mut args = vec!["add", "--"];
            args.extend(files.iter().map(String::as_str));
            self.runner.run(path, &args).await?;
        }

        self.runner.run(path, &["commit", "-m", message]).await?;
        info!(path = %path.display(), files = files.len(), "committed");
        Ok(())
    }

    pub async fn push(&self, path: &Path) -> GitResult<()> {
        self.runner.run(path, &["push"]).await.map(drop)
    }

    pub async fn pull(&self, path: &Path) -> GitResult<()> {
        self.runner.run(path, &["pull"]).await.map(drop)
    }

    pub async fn fetch(&self, path: &Path) -> GitResult<()> {
        self.runner.run(path, &["fetch"]).await.map(drop)
    }

    /// Check out an existing branch
    pub async fn switch_branch(&self, path: &Path, branch: &str) -> GitResult<()> {
        self.runner.run(path, &["checkout", branch]).await.map(drop)
    }

    /// Create a branch from HEAD and check it out
    pub async fn create_branch(&self, path: &Path, branch: &str) -> GitResult<()> {
        self.runner.run(path, &["checkout", "-b", branch]).await.map(drop)
    }

    /// Clone `url` into `destination`, which must not exist yet
    ///
    /// Runs from the destination's parent directory.
    pub async fn clone_repository(&self, url: &str, destination: &Path) -> GitResult<()> {
        let parent = match destination.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        let target = destination
            .file_name()
            .unwrap_or(destination.as_os_str())
            .to_string_lossy()
            .into_owned();

        self.runner
            .run(&parent, &["clone", "--", url, &target])
            .await
            .map_err(|e| {
                GitError::CloneFailed(match e {
                    GitError::CommandFailed(message) => message,
                    other => other.to_string(),
                })
            })?;

        info!(url, destination = %destination.display(), "cloned");
        Ok(())
    }

    /// URL of the `origin` remote
    pub async fn remote_url(&self, path: &Path) -> Lookup<String> {
        match self.runner.run(path, &["remote", "get-url", "origin"]).await {
            Ok(url) => Lookup::Found(url),
            Err(e) => {
                debug!(path = %path.display(), error = %e, "no origin remote");
                Lookup::Unavailable
            }
        }
    }
}

impl fmt::Debug for GitApi {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GitApi")
            .field("log_limit", &self.log_limit)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// Answers by subcommand and records every call
    #[derive(Default)]
    struct ScriptedRunner {
        responses: HashMap<&'static str, Result<String, String>>,
        calls: Mutex<Vec<(PathBuf, Vec<String>)>>,
    }

    impl ScriptedRunner {
        fn respond(mut self, subcommand: &'static str, output: &str) -> Self {
            self.responses.insert(subcommand, Ok(output.to_string()));
            self
        }

        fn fail(mut self, subcommand: &'static str, message: &str) -> Self {
            self.responses.insert(subcommand, Err(message.to_string()));
            self
        }

        fn calls(&self) -> Vec<(PathBuf, Vec<String>)> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl CommandRunner for ScriptedRunner {
        async fn run(&self, dir: &Path, args: &[&str]) -> GitResult<String> {
            self.calls.lock().unwrap().push((
                dir.to_path_buf(),
                args.iter().map(|a| a.to_string()).collect(),
            ));

            match self.responses.get(args[0]) {
                Some(Ok(output)) => Ok(output.clone()),
                Some(Err(message)) => Err(GitError::CommandFailed(message.clone())),
                None => Ok(String::new()),
            }
        }
    }

    fn api(runner: ScriptedRunner) -> (GitApi, Arc<ScriptedRunner>) {
        let runner = Arc::new(runner);
        (GitApi::new(runner.clone()), runner)
    }

    #[tokio::test]
    async fn test_commit_without_files_skips_staging() {
        let (git, runner) = api(ScriptedRunner::default());

        git.commit(Path::new("/repo"), "Ship it", &[]).await.unwrap();

        let calls = runner.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].1, vec!["commit", "-m", "Ship it"]);
    }

    #[tokio::test]
    async fn test_commit_stages_listed_files() {
        let (git, runner) = api(ScriptedRunner::default());
        let files = vec!["src/main.rs".to_string(), "my notes.md".to_string()];

        git.commit(Path::new("/repo"), "Say \"hi\"", &files).await.unwrap();

        let calls = runner.calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0].1, vec!["add", "--", "src/main.rs", "my notes.md"]);
        assert_eq!(calls[1].1, vec!["commit", "-m", "Say \"hi\""]);
    }

    #[tokio::test]
    async fn test_commit_stops_when_staging_fails() {
        let (git, runner) = api(ScriptedRunner::default().fail("add", "pathspec did not match"));

        let result = git.commit(Path::new("/repo"), "msg", &["nope".to_string()]).await;

        assert!(matches!(result, Err(GitError::CommandFailed(_))));
        assert_eq!(runner.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_verify_swallows_failure() {
        let (git, _) = api(ScriptedRunner::default().fail("rev-parse", "not a git repository"));
        assert!(!git.verify(Path::new("/tmp")).await);

        let (git, _) = api(ScriptedRunner::default().respond("rev-parse", "true"));
        assert!(git.verify(Path::new("/repo")).await);

        // Bare repositories and .git directories print "false" but succeed
        let (git, _) = api(ScriptedRunner::default().respond("rev-parse", "false"));
        assert!(git.verify(Path::new("/repo/.git")).await);
    }

    #[tokio::test]
    async fn test_status_parses_runner_output() {
        let (git, runner) = api(
            ScriptedRunner::default().respond("status", "## main...origin/main [behind 3]\n?? new.txt"),
        );

        let status = git.status(Path::new("/repo")).await.unwrap();

        assert_eq!(status.branch, "main");
        assert_eq!(status.behind, 3);
        assert_eq!(status.files.len(), 1);
        assert_eq!(runner.calls()[0].1, vec!["status", "--porcelain", "--branch"]);
    }

    #[tokio::test]
    async fn test_status_propagates_failure() {
        let (git, _) = api(ScriptedRunner::default().fail("status", "not a git repository"));
        assert!(git.status(Path::new("/tmp")).await.is_err());
    }

    #[tokio::test]
    async fn test_log_uses_default_and_explicit_limits() {
        let (git, runner) = api(ScriptedRunner::default());

        git.log(Path::new("/repo"), None).await.unwrap();
        git.log(Path::new("/repo"), Some(5)).await.unwrap();

        let calls = runner.calls();
        assert_eq!(calls[0].1[1], format!("--pretty=format:{}", LOG_FORMAT));
        assert_eq!(calls[0].1[2..], ["-n", "20"]);
        assert_eq!(calls[1].1[2..], ["-n", "5"]);
    }

    #[tokio::test]
    async fn test_configured_log_limit() {
        let runner = Arc::new(ScriptedRunner::default());
        let git = GitApi::new(runner.clone()).with_log_limit(50);

        git.log(Path::new("/repo"), None).await.unwrap();
        assert_eq!(runner.calls()[0].1[3], "50");
    }

    #[tokio::test]
    async fn test_branch_commands() {
        let (git, runner) = api(ScriptedRunner::default());

        git.switch_branch(Path::new("/repo"), "dev").await.unwrap();
        git.create_branch(Path::new("/repo"), "feature/x").await.unwrap();

        let calls = runner.calls();
        assert_eq!(calls[0].1, vec!["checkout", "dev"]);
        assert_eq!(calls[1].1, vec!["checkout", "-b", "feature/x"]);
    }

    #[tokio::test]
    async fn test_sync_commands_have_no_flags() {
        let (git, runner) = api(ScriptedRunner::default());

        git.push(Path::new("/repo")).await.unwrap();
        git.pull(Path::new("/repo")).await.unwrap();
        git.fetch(Path::new("/repo")).await.unwrap();

        let args: Vec<Vec<String>> = runner.calls().into_iter().map(|(_, a)| a).collect();
        assert_eq!(args, vec![vec!["push"], vec!["pull"], vec!["fetch"]]);
    }

    #[tokio::test]
    async fn test_push_without_upstream_fails() {
        let (git, _) = api(ScriptedRunner::default().fail("push", "no upstream branch"));
        let err = git.push(Path::new("/repo")).await.unwrap_err();
        assert!(err.to_string().contains("no upstream branch"));
    }

    #[tokio::test]
    async fn test_clone_runs_in_parent_directory() {
        let (git, runner) = api(ScriptedRunner::default());

        git.clone_repository("https://example.com/rock.git", Path::new("/work/projects/rock"))
            .await
            .unwrap();

        let calls = runner.calls();
        assert_eq!(calls[0].0, PathBuf::from("/work/projects"));
        assert_eq!(calls[0].1, vec!["clone", "--", "https://example.com/rock.git", "rock"]);
    }

    #[tokio::test]
    async fn test_clone_url_is_never_an_option() {
        let (git, runner) = api(ScriptedRunner::default());

        git.clone_repository("--upload-pack=touch /tmp/pwned", Path::new("/work/rock"))
            .await
            .unwrap();

        let args = &runner.calls()[0].1;
        assert_eq!(args[..2], ["clone", "--"]);
        assert_eq!(args[2], "--upload-pack=touch /tmp/pwned");
    }

    #[tokio::test]
    async fn test_clone_relative_destination() {
        let (git, runner) = api(ScriptedRunner::default());

        git.clone_repository("https://example.com/rock.git", Path::new("rock")).await.unwrap();

        assert_eq!(runner.calls()[0].0, PathBuf::from("."));
    }

    #[tokio::test]
    async fn test_clone_failure_is_clone_specific() {
        let (git, _) = api(ScriptedRunner::default().fail("clone", "repository not found"));

        let err = git
            .clone_repository("https://example.com/missing.git", Path::new("/work/missing"))
            .await
            .unwrap_err();

        assert!(matches!(err, GitError::CloneFailed(_)));
        assert!(err.to_string().starts_with("Failed to clone repository"));
    }

    #[tokio::test]
    async fn test_remote_url_lookup() {
        let (git, _) = api(ScriptedRunner::default().respond("remote", "git@example.com:me/rock.git"));
        assert_eq!(
            git.remote_url(Path::new("/repo")).await,
            Lookup::Found("git@example.com:me/rock.git".to_string())
        );

        let (git, _) = api(ScriptedRunner::default().fail("remote", "No such remote 'origin'"));
        assert_eq!(git.remote_url(Path::new("/repo")).await, Lookup::Unavailable);
    }

    #[tokio::test]
    async fn test_current_branch_detached_is_empty() {
        let (git, _) = api(ScriptedRunner::default());
        assert_eq!(git.current_branch(Path::new("/repo")).await.unwrap(), "");
    }
}
