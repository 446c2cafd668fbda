//! Read-only reporting over the link store.
//!
//! The report is a pure projection of a single snapshot: per-link click
//! history for display plus aggregate totals. Nothing here mutates the
//! store or caches beyond the one snapshot it was built from.

pub mod geo;

pub use geo::{GeoClient, GeoInfo};

use crate::models::{ClickEvent, LinkRecord};
use crate::storage::LinkStore;
use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkStats {
    pub shortcode: String,
    pub target_url: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub expired: bool,
    pub click_count: u64,
    pub clicks: Vec<ClickEvent>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Totals {
    pub total_links: usize,
    pub active_links: usize,
    pub total_clicks: u64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsReport {
    pub links: Vec<LinkStats>,
    pub totals: Totals,
}

pub async fn report(store: &dyn LinkStore, now: DateTime<Utc>) -> Result<StatsReport> {
    let snapshot = store.snapshot().await?;

    let totals = Totals {
        total_links: snapshot.len(),
        active_links: snapshot.iter().filter(|r| !r.is_expired(now)).count(),
        total_clicks: snapshot.iter().map(|r| r.click_count).sum(),
    };

    let links = snapshot.into_iter().map(|r| link_stats(r, now)).collect();

    Ok(StatsReport { links, totals })
}

fn link_stats(record: LinkRecord, now: DateTime<Utc>) -> LinkStats {
    let expired = record.is_expired(now);
    LinkStats {
        shortcode: record.shortcode,
        target_url: record.target_url,
        created_at: record.created_at,
        expires_at: record.expires_at,
        expired,
        click_count: record.click_count,
        clicks: record.clicks,
    }
}
