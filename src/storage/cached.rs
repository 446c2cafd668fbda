use crate::models::{ClickEvent, LinkRecord};
use crate::storage::{LinkStore, StoreResult};
use anyhow::Result;
use async_trait::async_trait;
use moka::future::Cache;
use std::sync::Arc;
use std::time::Duration;

/// Read-caching wrapper around an inner store.
///
/// Lookups populate a bounded moka cache; mutations write through to the
/// inner store and refresh or invalidate the affected entry, so a cached
/// record never disagrees with the click history on the resolution path.
pub struct CachedStore {
    inner: Arc<dyn LinkStore>,
    read_cache: Cache<String, Option<LinkRecord>>,
}

impl CachedStore {
    pub fn new(inner: Arc<dyn LinkStore>, max_entries: u64) -> Self {
        let read_cache = Cache::builder()
            .max_capacity(max_entries)
            .time_to_live(Duration::from_secs(300))
            .build();

        Self { inner, read_cache }
    }
}

#[async_trait]
impl LinkStore for CachedStore {
    async fn init(&self) -> Result<()> {
        self.inner.init().await
    }

    async fn snapshot(&self) -> Result<Vec<LinkRecord>> {
        // Reporting always reads the authoritative collection.
        self.inner.snapshot().await
    }

    async fn insert(&self, record: LinkRecord) -> StoreResult<()> {
        let shortcode = record.shortcode.clone();
        let cached = record.clone();
        self.inner.insert(record).await?;
        self.read_cache.insert(shortcode, Some(cached)).await;
        Ok(())
    }

    async fn find(&self, shortcode: &str) -> Result<Option<LinkRecord>> {
        if let Some(cached) = self.read_cache.get(shortcode).await {
            return Ok(cached);
        }

        let result = self.inner.find(shortcode).await?;
        self.read_cache
            .insert(shortcode.to_string(), result.clone())
            .await;
        Ok(result)
    }

    async fn record_click(&self, shortcode: &str, event: ClickEvent) -> StoreResult<()> {
        self.inner.record_click(shortcode, event).await?;
        // The inner record changed shape; drop the stale copy.
        self.read_cache.invalidate(shortcode).await;
        Ok(())
    }
}
