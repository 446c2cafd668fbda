//! Shortcode resolution.
//!
//! Resolution classifies a shortcode into exactly one terminal outcome.
//! Only the redirect outcome mutates the store, by appending one click
//! event; the caller owns the navigation side effect. Geolocation is a
//! bounded best-effort enrichment and its absence never delays or fails
//! the redirect beyond the client timeout. Every terminal state emits a
//! telemetry event so broken-link traffic is visible to operators.

use crate::analytics::{GeoClient, GeoInfo};
use crate::models::ClickEvent;
use crate::storage::{LinkStore, StoreError};
use crate::telemetry::{Package, Telemetry};
use anyhow::Result;
use chrono::{DateTime, Utc};
use std::net::IpAddr;
use std::sync::Arc;

/// Terminal states of a resolution attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The link is live; the caller should navigate to `target`.
    Redirect { target: String },
    NotFound,
    Expired,
    /// No shortcode was supplied; no lookup was attempted.
    MissingCode,
}

pub struct Resolver {
    store: Arc<dyn LinkStore>,
    geo: Option<Arc<GeoClient>>,
    telemetry: Telemetry,
}

impl Resolver {
    pub fn new(
        store: Arc<dyn LinkStore>,
        geo: Option<Arc<GeoClient>>,
        telemetry: Telemetry,
    ) -> Self {
        Self {
            store,
            geo,
            telemetry,
        }
    }

    pub async fn resolve(
        &self,
        shortcode: &str,
        client_ip: Option<IpAddr>,
        referrer: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<Outcome> {
        let shortcode = shortcode.trim();
        if shortcode.is_empty() {
            self.telemetry
                .error(Package::Api, "redirect requested without a shortcode");
            return Ok(Outcome::MissingCode);
        }

        let record = match self.store.find(shortcode).await? {
            Some(record) => record,
            None => {
                self.telemetry.warn(
                    Package::Api,
                    format!("redirection failed: shortcode {shortcode} not found"),
                );
                return Ok(Outcome::NotFound);
            }
        };

        if record.is_expired(now) {
            self.telemetry.warn(
                Package::Api,
                format!("redirection failed: shortcode {shortcode} expired"),
            );
            return Ok(Outcome::Expired);
        }

        let geo = self.enrich(client_ip).await;
        let event = ClickEvent {
            timestamp: now,
            source: classify_source(referrer).to_string(),
            country: geo.country,
            region: geo.region,
        };

        match self.store.record_click(shortcode, event).await {
            Ok(()) => {}
            Err(StoreError::NotFound) => {
                // The record vanished between lookup and click. The store
                // never deletes, so this only happens under an external
                // writer; classify rather than redirect without history.
                self.telemetry.warn(
                    Package::Api,
                    format!("redirection failed: shortcode {shortcode} not found"),
                );
                return Ok(Outcome::NotFound);
            }
            Err(err) => return Err(err.into()),
        }

        self.telemetry.info(
            Package::Api,
            format!("redirected /{shortcode} to {}", record.target_url),
        );
        Ok(Outcome::Redirect {
            target: record.target_url,
        })
    }

    async fn enrich(&self, client_ip: Option<IpAddr>) -> GeoInfo {
        match (&self.geo, client_ip) {
            (Some(geo), Some(ip)) => geo.lookup(ip).await,
            _ => GeoInfo::default(),
        }
    }
}

/// Coarse click-origin classification from the referrer.
pub fn classify_source(referrer: Option<&str>) -> &'static str {
    match referrer {
        Some(r) if r.contains("mail") => "email",
        _ => "browser",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::LinkRecord;
    use crate::storage::MemoryStore;
    use crate::telemetry::Journal;
    use chrono::Duration;
    use tempfile::tempdir;

    fn resolver(store: Arc<dyn LinkStore>) -> Resolver {
        Resolver::new(store, None, Telemetry::disabled())
    }

    #[tokio::test]
    async fn missing_code_skips_the_lookup() {
        let resolver = resolver(Arc::new(MemoryStore::new()));
        let outcome = resolver.resolve("", None, None, Utc::now()).await.unwrap();
        assert_eq!(outcome, Outcome::MissingCode);
    }

    #[tokio::test]
    async fn unknown_code_is_not_found() {
        let resolver = resolver(Arc::new(MemoryStore::new()));
        let outcome = resolver
            .resolve("nothere", None, None, Utc::now())
            .await
            .unwrap();
        assert_eq!(outcome, Outcome::NotFound);
    }

    #[tokio::test]
    async fn expired_link_records_no_click() {
        let store = Arc::new(MemoryStore::new());
        let created = Utc::now();
        store
            .insert(LinkRecord::new("brief", "https://example.com", created, 1))
            .await
            .unwrap();

        let resolver = resolver(store.clone());
        // 61 seconds after creation of a 1-minute link.
        let outcome = resolver
            .resolve("brief", None, None, created + Duration::seconds(61))
            .await
            .unwrap();

        assert_eq!(outcome, Outcome::Expired);
        let record = store.find("brief").await.unwrap().unwrap();
        assert_eq!(record.click_count, 0);
        assert!(record.clicks.is_empty());
    }

    #[tokio::test]
    async fn expiry_boundary_counts_as_expired() {
        let store = Arc::new(MemoryStore::new());
        let created = Utc::now();
        store
            .insert(LinkRecord::new("edge", "https://example.com", created, 1))
            .await
            .unwrap();

        let resolver = resolver(store);
        let outcome = resolver
            .resolve("edge", None, None, created + Duration::minutes(1))
            .await
            .unwrap();
        assert_eq!(outcome, Outcome::Expired);
    }

    #[tokio::test]
    async fn three_resolutions_append_three_ordered_clicks() {
        let store = Arc::new(MemoryStore::new());
        let created = Utc::now();
        store
            .insert(LinkRecord::new("hot", "https://example.com", created, 30))
            .await
            .unwrap();

        let resolver = resolver(store.clone());
        for i in 1..=3 {
            let outcome = resolver
                .resolve("hot", None, None, created + Duration::seconds(i))
                .await
                .unwrap();
            assert_eq!(
                outcome,
                Outcome::Redirect {
                    target: "https://example.com".to_string()
                }
            );
        }

        let record = store.find("hot").await.unwrap().unwrap();
        assert_eq!(record.click_count, 3);
        assert_eq!(record.clicks.len(), 3);
        let timestamps: Vec<_> = record.clicks.iter().map(|c| c.timestamp).collect();
        let mut sorted = timestamps.clone();
        sorted.sort();
        assert_eq!(timestamps, sorted);
    }

    #[tokio::test]
    async fn click_timestamps_never_precede_creation() {
        let store = Arc::new(MemoryStore::new());
        let created = Utc::now();
        store
            .insert(LinkRecord::new("ts", "https://example.com", created, 30))
            .await
            .unwrap();

        let resolver = resolver(store.clone());
        resolver
            .resolve("ts", None, None, created + Duration::seconds(5))
            .await
            .unwrap();

        let record = store.find("ts").await.unwrap().unwrap();
        assert!(record.clicks[0].timestamp >= record.created_at);
    }

    #[test]
    fn referrer_heuristic() {
        assert_eq!(classify_source(Some("https://mail.google.com/")), "email");
        assert_eq!(classify_source(Some("https://news.site/")), "browser");
        assert_eq!(classify_source(None), "browser");
    }

    #[tokio::test]
    async fn terminal_states_reach_the_journal() {
        let dir = tempdir().unwrap();
        let journal = Arc::new(Journal::new(dir.path().join("urlshort_logs.json")));
        let store = Arc::new(MemoryStore::new());
        let created = Utc::now();
        store
            .insert(LinkRecord::new("seen", "https://example.com", created, 1))
            .await
            .unwrap();

        let resolver = Resolver::new(
            store,
            None,
            Telemetry::new(None, Some(journal.clone())),
        );
        resolver
            .resolve("seen", None, None, created)
            .await
            .unwrap();
        resolver.resolve("ghost", None, None, created).await.unwrap();
        resolver
            .resolve("seen", None, None, created + Duration::minutes(2))
            .await
            .unwrap();

        let entries = journal.entries();
        assert_eq!(entries.len(), 3);
        assert!(entries[0].message.contains("redirected /seen"));
        assert!(entries[1].message.contains("ghost not found"));
        assert!(entries[2].message.contains("seen expired"));
    }
}
