//! Whole-snapshot JSON persistence.
//!
//! Every mutation reads the full document, applies the change, and writes
//! the document back. Operations are serialized by an internal mutex;
//! between processes the layout is last-write-wins, which is the accepted
//! weakness of this design rather than a hidden requirement.

use crate::models::{ClickEvent, LinkRecord};
use crate::storage::{LinkStore, StoreError, StoreResult};
use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;

#[derive(Debug, Default, Serialize, Deserialize)]
struct Document {
    urlshort_urls: Vec<LinkRecord>,
}

pub struct JsonFileStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    async fn load(&self) -> Result<Document> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) => serde_json::from_slice(&bytes)
                .with_context(|| format!("malformed link document at {}", self.path.display())),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(Document::default()),
            Err(err) => Err(err).with_context(|| {
                format!("failed to read link document at {}", self.path.display())
            }),
        }
    }

    async fn save(&self, document: &Document) -> Result<()> {
        let bytes = serde_json::to_vec_pretty(document)?;
        tokio::fs::write(&self.path, bytes)
            .await
            .with_context(|| format!("failed to write link document at {}", self.path.display()))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl LinkStore for JsonFileStore {
    async fn init(&self) -> Result<()> {
        let _guard = self.lock.lock().await;
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await.with_context(|| {
                    format!("failed to create data directory {}", parent.display())
                })?;
            }
        }
        if tokio::fs::try_exists(&self.path).await? {
            // Validate the existing document up front so a corrupt file
            // fails at startup, not on the first request.
            self.load().await?;
        } else {
            self.save(&Document::default()).await?;
        }
        Ok(())
    }

    async fn snapshot(&self) -> Result<Vec<LinkRecord>> {
        let _guard = self.lock.lock().await;
        Ok(self.load().await?.urlshort_urls)
    }

    async fn insert(&self, record: LinkRecord) -> StoreResult<()> {
        let _guard = self.lock.lock().await;
        let mut document = self.load().await?;
        if document
            .urlshort_urls
            .iter()
            .any(|r| r.shortcode == record.shortcode)
        {
            return Err(StoreError::Conflict);
        }
        document.urlshort_urls.push(record);
        self.save(&document).await?;
        Ok(())
    }

    async fn find(&self, shortcode: &str) -> Result<Option<LinkRecord>> {
        let _guard = self.lock.lock().await;
        let document = self.load().await?;
        Ok(document
            .urlshort_urls
            .into_iter()
            .find(|r| r.shortcode == shortcode))
    }

    async fn record_click(&self, shortcode: &str, event: ClickEvent) -> StoreResult<()> {
        let _guard = self.lock.lock().await;
        let mut document = self.load().await?;
        let record = document
            .urlshort_urls
            .iter_mut()
            .find(|r| r.shortcode == shortcode)
            .ok_or(StoreError::NotFound)?;
        record.clicks.push(event);
        record.click_count += 1;
        self.save(&document).await?;
        Ok(())
    }
}
