use crate::error::{GitError, GitResult};
use crate::git::{GitApi, GitStatus};
use crate::store::RegisteredRepo;
use chrono::{DateTime, Utc};
use futures::future::join_all;
use std::collections::HashMap;
use std::path::Path;
use tracing::{info, warn};
use uuid::Uuid;

/// Name shown for a repository whose path has no final component
const UNNAMED_REPOSITORY: &str = "Unknown";

/// Runs git queries across every registered repository
///
/// Each repository is queried independently and concurrently; one failing
/// repository is logged and left out of the result.
#[derive(Debug, Clone)]
pub struct RepositoryCoordinator {
    git: GitApi,
}

impl RepositoryCoordinator {
    pub fn new(git: GitApi) -> Self {
        Self { git }
    }

    /// Status of every repository, keyed by id; failed repositories are absent
    pub async fn refresh_all(&self, repos: &[RegisteredRepo]) -> HashMap<String, GitStatus> {
        let results = join_all(repos.iter().map(|repo| async move {
            (repo, self.git.status(&repo.path).await)
        }))
        .await;

        results
            .into_iter()
            .filter_map(|(repo, result)| match result {
                Ok(status) => Some((repo.id.clone(), status)),
                Err(e) => {
                    warn!(repo = %repo.name, path = %repo.path.display(), error = %e, "Failed to load status");
                    None
                }
            })
            .collect()
    }

    /// Fetch every repository; returns the fetch time of each one that succeeded
    pub async fn fetch_all(&self, repos: &[RegisteredRepo]) -> HashMap<String, DateTime<Utc>> {
        let results = join_all(repos.iter().map(|repo| async move {
            let result = self.git.fetch(&repo.path).await;
            (repo, result.map(|_| Utc::now()))
        }))
        .await;

        results
            .into_iter()
            .filter_map(|(repo, result)| match result {
                Ok(at) => Some((repo.id.clone(), at)),
                Err(e) => {
                    warn!(repo = %repo.name, path = %repo.path.display(), error = %e, "Failed to fetch");
                    None
                }
            })
            .collect()
    }

    /// Build a registration for the working tree at `path`
    ///
    /// The caller persists the returned record.
    pub async fn register(&self, path: &Path) -> GitResult<RegisteredRepo> {
        if !self.git.verify(path).await {
            return Err(GitError::NotARepository(path.display().to_string()));
        }

        let remote_url = self
            .git
            .remote_url(path)
            .await
            .into_option()
            .filter(|url| !url.is_empty());

        let name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| UNNAMED_REPOSITORY.to_string());

        let repo = RegisteredRepo {
            id: Uuid::new_v4().to_string(),
            name,
            path: path.to_path_buf(),
            remote_url,
            last_fetched: Some(Utc::now()),
            favicon: None,
        };

        info!(id = %repo.id, name = %repo.name, "registered repository");
        Ok(repo)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::git::CommandRunner;
    use async_trait::async_trait;
    use std::path::PathBuf;
    use std::sync::Arc;

    /// Fails every command run under a path containing "broken"
    struct FlakyRunner;

    #[async_trait]
    impl CommandRunner for FlakyRunner {
        async fn run(&self, dir: &Path, args: &[&str]) -> GitResult<String> {
            if dir.to_string_lossy().contains("broken") {
                return Err(GitError::CommandFailed("fatal: not a git repository".to_string()));
            }

            match args {
                ["rev-parse", ..] => Ok("true".to_string()),
                ["remote", ..] if dir.ends_with("local-only") => {
                    Err(GitError::CommandFailed("No such remote 'origin'".to_string()))
                }
                ["remote", ..] => Ok(format!("https://example.com/{}.git", dir.display())),
                ["status", ..] => Ok(format!("## {}\n?? notes.md", dir.display())),
                _ => Ok(String::new()),
            }
        }
    }

    fn coordinator() -> RepositoryCoordinator {
        RepositoryCoordinator::new(GitApi::new(Arc::new(FlakyRunner)))
    }

    fn repo(id: &str, path: &str) -> RegisteredRepo {
        RegisteredRepo {
            id: id.to_string(),
            name: id.to_string(),
            path: PathBuf::from(path),
            remote_url: None,
            last_fetched: None,
            favicon: None,
        }
    }

    #[tokio::test]
    async fn test_refresh_skips_failed_repository() {
        let repos = vec![repo("a", "alpha"), repo("b", "/work/broken"), repo("c", "gamma")];

        let statuses = coordinator().refresh_all(&repos).await;

        assert_eq!(statuses.len(), 2);
        assert_eq!(statuses["a"].branch, "alpha");
        assert_eq!(statuses["c"].branch, "gamma");
        assert!(!statuses.contains_key("b"));
    }

    #[tokio::test]
    async fn test_refresh_empty() {
        assert!(coordinator().refresh_all(&[]).await.is_empty());
    }

    #[tokio::test]
    async fn test_fetch_all_reports_successes() {
        let repos = vec![repo("a", "/work/alpha"), repo("b", "/work/broken")];

        let fetched = coordinator().fetch_all(&repos).await;

        assert_eq!(fetched.len(), 1);
        assert!(fetched.contains_key("a"));
    }

    #[tokio::test]
    async fn test_register_builds_record() {
        let registered = coordinator().register(Path::new("/work/rock")).await.unwrap();

        assert_eq!(registered.name, "rock");
        assert_eq!(registered.path, PathBuf::from("/work/rock"));
        assert_eq!(registered.remote_url.as_deref(), Some("https://example.com//work/rock.git"));
        assert!(registered.last_fetched.is_some());
        assert!(Uuid::parse_str(&registered.id).is_ok());
    }

    #[tokio::test]
    async fn test_register_without_origin() {
        let registered = coordinator().register(Path::new("/work/local-only")).await.unwrap();
        assert_eq!(registered.remote_url, None);
    }

    #[tokio::test]
    async fn test_register_rejects_non_repository() {
        let result = coordinator().register(Path::new("/work/broken")).await;
        assert!(matches!(result, Err(GitError::NotARepository(_))));
    }

    #[tokio::test]
    async fn test_register_root_path_is_unnamed() {
        let registered = coordinator().register(Path::new("/")).await.unwrap();
        assert_eq!(registered.name, "Unknown");
    }
}
