use crate::error::StoreResult;
use crate::store::document::{Document, RegisteredRepo};
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::sync::Mutex;
use tracing::{debug, error};

/// The application document stored as one pretty-printed JSON file
///
/// `update_document` serialises read-modify-write cycles issued through the
/// same store. Other processes writing the file are not coordinated with.
#[derive(Debug)]
pub struct JsonDocumentStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonDocumentStore {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn data_path(&self) -> &Path {
        &self.path
    }

    /// Current document; a missing or unreadable file reads as empty
    pub async fn get_document(&self) -> Document {
        match self.read().await {
            Ok(document) => document,
            Err(e) => {
                error!(path = %self.path.display(), error = %e, "Failed to read data file");
                Document::default()
            }
        }
    }

    /// Replace the whole document; the last writer wins
    pub async fn save_document(&self, document: &Document) -> StoreResult<()> {
        let _guard = self.write_lock.lock().await;
        self.write(document).await
    }

    /// Apply `mutator` to the stored document and persist the result
    ///
    /// Fails without writing if the current file cannot be read, so a
    /// corrupt document is never silently replaced.
    pub async fn update_document<F>(&self, mutator: F) -> StoreResult<Document>
    where
        F: FnOnce(&mut Document),
    {
        let _guard = self.write_lock.lock().await;

        let mut document = self.read().await?;
        mutator(&mut document);
        self.write(&document).await?;

        Ok(document)
    }

    pub async fn list_repositories(&self) -> Vec<RegisteredRepo> {
        self.get_document().await.git_repositories
    }

    /// Register a repository; returns false if its id or path is already present
    pub async fn add_repository(&self, repo: RegisteredRepo) -> StoreResult<bool> {
        let mut added = false;
        self.update_document(|document| added = document.add_repository(repo))
            .await?;
        Ok(added)
    }

    pub async fn remove_repository(&self, id: &str) -> StoreResult<bool> {
        let mut removed = false;
        self.update_document(|document| removed = document.remove_repository(id))
            .await?;
        Ok(removed)
    }

    /// Stamp `lastFetched` for each id in `fetched`
    pub async fn record_fetched(&self, fetched: &HashMap<String, DateTime<Utc>>) -> StoreResult<()> {
        if fetched.is_empty() {
            return Ok(());
        }

        self.update_document(|document| {
            for (id, at) in fetched {
                document.set_last_fetched(id, *at);
            }
        })
        .await?;
        Ok(())
    }

    async fn read(&self) -> StoreResult<Document> {
        match fs::read_to_string(&self.path).await {
            Ok(raw) => Ok(serde_json::from_str(&raw)?),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "No data file yet");
                Ok(Document::default())
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Write to a sibling temp file, then rename over the document
    async fn write(&self, document: &Document) -> StoreResult<()> {
        if let Some(dir) = self.path.parent() {
            if !dir.as_os_str().is_empty() {
                fs::create_dir_all(dir).await?;
            }
        }

        let encoded = serde_json::to_string_pretty(document)?;
        let staging = self.path.with_extension("json.tmp");
        fs::write(&staging, encoded).await?;
        fs::rename(&staging, &self.path).await?;

        Ok(())
    }
}
