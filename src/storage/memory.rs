use crate::models::{ClickEvent, LinkRecord};
use crate::storage::{LinkStore, StoreError, StoreResult};
use anyhow::Result;
use async_trait::async_trait;
use tokio::sync::RwLock;

/// In-memory store, used standalone and as the unit-test backend.
///
/// Records are kept in a Vec so that snapshot order is insertion order.
#[derive(Default)]
pub struct MemoryStore {
    records: RwLock<Vec<LinkRecord>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl LinkStore for MemoryStore {
    async fn init(&self) -> Result<()> {
        Ok(())
    }

    async fn snapshot(&self) -> Result<Vec<LinkRecord>> {
        Ok(self.records.read().await.clone())
    }

    async fn insert(&self, record: LinkRecord) -> StoreResult<()> {
        let mut records = self.records.write().await;
        if records.iter().any(|r| r.shortcode == record.shortcode) {
            return Err(StoreError::Conflict);
        }
        records.push(record);
        Ok(())
    }

    async fn find(&self, shortcode: &str) -> Result<Option<LinkRecord>> {
        let records = self.records.read().await;
        Ok(records.iter().find(|r| r.shortcode == shortcode).cloned())
    }

    async fn record_click(&self, shortcode: &str, event: ClickEvent) -> StoreResult<()> {
        let mut records = self.records.write().await;
        match records.iter_mut().find(|r| r.shortcode == shortcode) {
            Some(record) => {
                record.clicks.push(event);
                record.click_count += 1;
                Ok(())
            }
            None => Err(StoreError::NotFound),
        }
    }
}
