use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};

/// A working tree the user asked to track
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisteredRepo {
    pub id: String,
    pub name: String,
    pub path: PathBuf,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remote_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_fetched: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub favicon: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GitSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub github_token: Option<String>,
    #[serde(default)]
    pub auto_fetch: bool,
}

/// The whole application document (`rock-data.json`)
///
/// Only the git collections are typed; everything else (calendar, tasks,
/// finance) passes through untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    #[serde(default)]
    pub git_repositories: Vec<RegisteredRepo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub git_settings: Option<GitSettings>,
    #[serde(flatten)]
    pub other: Map<String, Value>,
}

impl Document {
    pub fn repository(&self, id: &str) -> Option<&RegisteredRepo> {
        self.git_repositories.iter().find(|r| r.id == id)
    }

    pub fn repository_by_path(&self, path: &Path) -> Option<&RegisteredRepo> {
        self.git_repositories.iter().find(|r| r.path == path)
    }

    /// Append a repository; returns false if its id or path is already registered
    pub fn add_repository(&mut self, repo: RegisteredRepo) -> bool {
        if self.repository(&repo.id).is_some() || self.repository_by_path(&repo.path).is_some() {
            return false;
        }
        self.git_repositories.push(repo);
        true
    }

    /// Returns false if no repository had this id
    pub fn remove_repository(&mut self, id: &str) -> bool {
        let before = self.git_repositories.len();
        self.git_repositories.retain(|r| r.id != id);
        self.git_repositories.len() != before
    }

    pub fn set_last_fetched(&mut self, id: &str, at: DateTime<Utc>) -> bool {
        match self.git_repositories.iter_mut().find(|r| r.id == id) {
            Some(repo) => {
                repo.last_fetched = Some(at);
                true
            }
            None => false,
        }
    }
}
