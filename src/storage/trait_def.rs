use crate::models::{ClickEvent, LinkRecord};
use anyhow::Result;
use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("shortcode already exists")]
    Conflict,
    #[error("shortcode not found")]
    NotFound,
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Keyed storage of link records.
///
/// Uniqueness is owned here: `insert` is put-if-absent on the shortcode,
/// even though batch submission pre-checks against a snapshot. Records are
/// never deleted; expired links stay around for reporting.
#[async_trait]
pub trait LinkStore: Send + Sync {
    /// Prepare the backend (create the snapshot file, etc.)
    async fn init(&self) -> Result<()>;

    /// Full copy of the store in insertion order, used for batch
    /// uniqueness checks and reporting
    async fn snapshot(&self) -> Result<Vec<LinkRecord>>;

    /// Insert a new record; `Conflict` when the shortcode is taken
    async fn insert(&self, record: LinkRecord) -> StoreResult<()>;

    /// Look up a single record by shortcode
    async fn find(&self, shortcode: &str) -> Result<Option<LinkRecord>>;

    /// Append a click event and bump the click count in one
    /// read-modify-write; `NotFound` when no record matches
    async fn record_click(&self, shortcode: &str, event: ClickEvent) -> StoreResult<()>;
}
