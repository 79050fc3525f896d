use crate::error::AppResult;
use crate::git::GitApi;
use crate::store::{Document, JsonDocumentStore};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tracing::error;

/// One call across the process boundary, tagged by channel name
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "channel", rename_all_fields = "camelCase")]
pub enum Request {
    #[serde(rename = "git-verify-repo")]
    VerifyRepo { repo_path: PathBuf },

    #[serde(rename = "git-status")]
    Status { repo_path: PathBuf },

    #[serde(rename = "git-log")]
    Log {
        repo_path: PathBuf,
        #[serde(default)]
        limit: Option<usize>,
    },

    #[serde(rename = "git-branches")]
    Branches { repo_path: PathBuf },

    #[serde(rename = "git-current-branch")]
    CurrentBranch { repo_path: PathBuf },

    #[serde(rename = "git-commit")]
    Commit {
        repo_path: PathBuf,
        message: String,
        #[serde(default)]
        files: Vec<String>,
    },

    #[serde(rename = "git-push")]
    Push { repo_path: PathBuf },

    #[serde(rename = "git-pull")]
    Pull { repo_path: PathBuf },

    #[serde(rename = "git-fetch")]
    Fetch { repo_path: PathBuf },

    #[serde(rename = "git-switch-branch")]
    SwitchBranch { repo_path: PathBuf, branch: String },

    #[serde(rename = "git-create-branch")]
    CreateBranch { repo_path: PathBuf, branch_name: String },

    #[serde(rename = "git-clone")]
    CloneRepository { url: String, destination_path: PathBuf },

    #[serde(rename = "git-remote-url")]
    RemoteUrl { repo_path: PathBuf },

    #[serde(rename = "get-data")]
    GetData,

    #[serde(rename = "save-data")]
    SaveData { data: Document },

    #[serde(rename = "get-data-path")]
    GetDataPath,
}

impl Request {
    pub fn channel(&self) -> &'static str {
        match self {
            Request::VerifyRepo { .. } => "git-verify-repo",
            Request::Status { .. } => "git-status",
            Request::Log { .. } => "git-log",
            Request::Branches { .. } => "git-branches",
            Request::CurrentBranch { .. } => "git-current-branch",
            Request::Commit { .. } => "git-commit",
            Request::Push { .. } => "git-push",
            Request::Pull { .. } => "git-pull",
            Request::Fetch { .. } => "git-fetch",
            Request::SwitchBranch { .. } => "git-switch-branch",
            Request::CreateBranch { .. } => "git-create-branch",
            Request::CloneRepository { .. } => "git-clone",
            Request::RemoteUrl { .. } => "git-remote-url",
            Request::GetData => "get-data",
            Request::SaveData { .. } => "save-data",
            Request::GetDataPath => "get-data-path",
        }
    }
}

/// Reply written by [`Bridge::serve`], one per request line
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Response {
    Ok(Value),
    Error(String),
}

/// Dispatches boundary requests to git and the document store
#[derive(Debug, Clone)]
pub struct Bridge {
    git: GitApi,
    store: Arc<JsonDocumentStore>,
}

impl Bridge {
    pub fn new(git: GitApi, store: Arc<JsonDocumentStore>) -> Self {
        Self { git, store }
    }

    /// Run one request; failures are logged with their channel and returned
    pub async fn handle(&self, request: Request) -> AppResult<Value> {
        let channel = request.channel();
        let result = self.dispatch(request).await;

        if let Err(e) = &result {
            error!(channel, error = %e, "request failed");
        }

        result
    }

    async fn dispatch(&self, request: Request) -> AppResult<Value> {
        let git = &self.git;

        let value = match request {
            Request::VerifyRepo { repo_path } => Value::Bool(git.verify(&repo_path).await),
            Request::Status { repo_path } => serde_json::to_value(git.status(&repo_path).await?)?,
            Request::Log { repo_path, limit } => {
                serde_json::to_value(git.log(&repo_path, limit).await?)?
            }
            Request::Branches { repo_path } => {
                serde_json::to_value(git.branches(&repo_path).await?)?
            }
            Request::CurrentBranch { repo_path } => {
                Value::String(git.current_branch(&repo_path).await?)
            }
            Request::Commit {
                repo_path,
                message,
                files,
            } => {
                git.commit(&repo_path, &message, &files).await?;
                Value::Null
            }
            Request::Push { repo_path } => {
                git.push(&repo_path).await?;
                Value::Null
            }
            Request::Pull { repo_path } => {
                git.pull(&repo_path).await?;
                Value::Null
            }
            Request::Fetch { repo_path } => {
                git.fetch(&repo_path).await?;
                Value::Null
            }
            Request::SwitchBranch { repo_path, branch } => {
                git.switch_branch(&repo_path, &branch).await?;
                Value::Null
            }
            Request::CreateBranch {
                repo_path,
                branch_name,
            } => {
                git.create_branch(&repo_path, &branch_name).await?;
                Value::Null
            }
            Request::CloneRepository {
                url,
                destination_path,
            } => {
                git.clone_repository(&url, &destination_path).await?;
                Value::Null
            }
            // Unavailable reads as "" for callers that only know strings
            Request::RemoteUrl { repo_path } => {
                Value::String(git.remote_url(&repo_path).await.unwrap_or_default())
            }
            Request::GetData => serde_json::to_value(self.store.get_document().await)?,
            Request::SaveData { data } => match self.store.save_document(&data).await {
                Ok(()) => Value::Bool(true),
                Err(e) => {
                    error!(error = %e, "Failed to write data file");
                    Value::Bool(false)
                }
            },
            Request::GetDataPath => {
                Value::String(self.store.data_path().display().to_string())
            }
        };

        Ok(value)
    }

    /// Answer newline-delimited JSON requests until `reader` is exhausted
    pub async fn serve<R, W>(&self, reader: R, mut writer: W) -> AppResult<()>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let mut lines = reader.lines();

        while let Some(line) = lines.next_line().await? {
            if line.trim().is_empty() {
                continue;
            }

            let response = match serde_json::from_str::<Request>(&line) {
                Ok(request) => match self.handle(request).await {
                    Ok(value) => Response::Ok(value),
                    Err(e) => Response::Error(e.to_string()),
                },
                Err(e) => Response::Error(format!("Invalid request: {}", e)),
            };

            let mut encoded = serde_json::to_string(&response)?;
            encoded.push('\n');
            writer.write_all(encoded.as_bytes()).await?;
            writer.flush().await?;
        }

        Ok(())
    }
}
