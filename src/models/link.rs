use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// A single short link and its accumulated click history.
///
/// `shortcode` is the primary key; `created_at` and `expires_at` are fixed
/// at creation and never renewed. `clicks` is append-only and its length
/// always equals `click_count`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkRecord {
    pub shortcode: String,
    pub target_url: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub click_count: u64,
    pub clicks: Vec<ClickEvent>,
}

/// One recorded redirect through a short link.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClickEvent {
    pub timestamp: DateTime<Utc>,
    pub source: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
}

impl LinkRecord {
    pub fn new(
        shortcode: impl Into<String>,
        target_url: impl Into<String>,
        created_at: DateTime<Utc>,
        validity_minutes: i64,
    ) -> Self {
        Self {
            shortcode: shortcode.into(),
            target_url: target_url.into(),
            created_at,
            expires_at: created_at + Duration::minutes(validity_minutes),
            click_count: 0,
            clicks: Vec::new(),
        }
    }

    /// A record is live strictly while `now < expires_at`; resolving at the
    /// exact expiry instant is already expired.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}
