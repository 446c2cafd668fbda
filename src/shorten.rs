//! Batch link submission.
//!
//! A batch checks uniqueness against one snapshot taken at its start, and
//! every code accepted along the way, custom or allocated, is folded into
//! the exclusion set immediately so two rows of the same batch can never
//! collide with each other. Rows fail independently: errors are collected
//! per row and do not abort their siblings, and a batch with zero valid
//! rows persists nothing.

use crate::models::LinkRecord;
use crate::shortcode::{self, DEFAULT_CODE_LENGTH};
use crate::storage::LinkStore;
use crate::validate::{self, ValidationError};
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use thiserror::Error;

pub const DEFAULT_VALIDITY_MINUTES: i64 = 30;

/// One submitted form row. Blank fields are the usual case: the submit
/// form always posts a fixed number of rows.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SubmissionRow {
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub validity: String,
    #[serde(default)]
    pub shortcode: String,
}

impl SubmissionRow {
    fn is_blank(&self) -> bool {
        self.url.trim().is_empty()
            && self.validity.trim().is_empty()
            && self.shortcode.trim().is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SubmitError {
    #[error("URL must be absolute with scheme http or https")]
    InvalidUrl,
    #[error("shortcode must be 1-16 alphanumeric characters")]
    InvalidShortcode,
    #[error("validity must be a positive integer of minutes")]
    InvalidValidity,
    #[error("shortcode already exists")]
    ShortcodeTaken,
}

impl From<ValidationError> for SubmitError {
    fn from(err: ValidationError) -> Self {
        match err {
            ValidationError::InvalidUrl => SubmitError::InvalidUrl,
            ValidationError::InvalidShortcode => SubmitError::InvalidShortcode,
            ValidationError::InvalidValidity => SubmitError::InvalidValidity,
        }
    }
}

/// Errors for one rejected row, keyed by its position in the batch.
#[derive(Debug, Clone, Serialize)]
pub struct RowRejection {
    pub row: usize,
    #[serde(skip)]
    pub errors: Vec<SubmitError>,
    pub messages: Vec<String>,
}

impl RowRejection {
    fn new(row: usize, errors: Vec<SubmitError>) -> Self {
        let messages = errors.iter().map(|e| e.to_string()).collect();
        Self {
            row,
            errors,
            messages,
        }
    }
}

#[derive(Debug, Default)]
pub struct BatchOutcome {
    pub created: Vec<LinkRecord>,
    pub rejected: Vec<RowRejection>,
}

pub async fn shorten_batch(
    store: &dyn LinkStore,
    rows: &[SubmissionRow],
    now: DateTime<Utc>,
) -> Result<BatchOutcome> {
    let snapshot = store.snapshot().await?;
    let mut taken: HashSet<String> = snapshot.into_iter().map(|r| r.shortcode).collect();

    let mut outcome = BatchOutcome::default();

    for (row_index, row) in rows.iter().enumerate() {
        if row.is_blank() {
            continue;
        }

        let mut errors = Vec::new();

        let url = row.url.trim();
        if let Err(err) = validate::validate_url(url) {
            errors.push(err.into());
        }

        let validity = row.validity.trim();
        let validity_minutes = if validity.is_empty() {
            DEFAULT_VALIDITY_MINUTES
        } else {
            match validate::validate_validity_period(validity) {
                Ok(minutes) => minutes,
                Err(err) => {
                    errors.push(err.into());
                    DEFAULT_VALIDITY_MINUTES
                }
            }
        };

        let custom = row.shortcode.trim();
        let mut code = None;
        if !custom.is_empty() {
            if let Err(err) = validate::validate_shortcode(custom) {
                errors.push(err.into());
            } else if taken.contains(custom) {
                errors.push(SubmitError::ShortcodeTaken);
            } else {
                code = Some(custom.to_string());
            }
        }

        if !errors.is_empty() {
            outcome.rejected.push(RowRejection::new(row_index, errors));
            continue;
        }

        let code = match code {
            Some(code) => code,
            // Practically unreachable exhaustion is fatal, not a row error.
            None => shortcode::allocate(&taken, DEFAULT_CODE_LENGTH)
                .context("shortcode allocation exhausted")?,
        };

        taken.insert(code.clone());
        outcome
            .created
            .push(LinkRecord::new(code, url, now, validity_minutes));
    }

    for record in &outcome.created {
        store.insert(record.clone()).await.with_context(|| {
            format!("failed to persist shortcode {}", record.shortcode)
        })?;
    }

    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{LinkStore, MemoryStore};
    use chrono::Duration;

    fn row(url: &str, validity: &str, shortcode: &str) -> SubmissionRow {
        SubmissionRow {
            url: url.to_string(),
            validity: validity.to_string(),
            shortcode: shortcode.to_string(),
        }
    }

    #[tokio::test]
    async fn generated_code_with_explicit_validity() {
        let store = MemoryStore::new();
        let now = Utc::now();

        let outcome = shorten_batch(&store, &[row("https://example.com", "1", "")], now)
            .await
            .unwrap();

        assert!(outcome.rejected.is_empty());
        let created = &outcome.created[0];
        assert_eq!(created.shortcode.len(), 6);
        assert!(created.shortcode.chars().all(|c| c.is_ascii_alphanumeric()));
        assert_eq!(created.expires_at, now + Duration::minutes(1));
        assert!(store.find(&created.shortcode).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn blank_validity_defaults_to_thirty_minutes() {
        let store = MemoryStore::new();
        let now = Utc::now();

        let outcome = shorten_batch(&store, &[row("https://example.com", "", "")], now)
            .await
            .unwrap();

        assert_eq!(
            outcome.created[0].expires_at,
            now + Duration::minutes(DEFAULT_VALIDITY_MINUTES)
        );
    }

    #[tokio::test]
    async fn custom_code_taken_on_second_submission() {
        let store = MemoryStore::new();
        let now = Utc::now();

        let first = shorten_batch(&store, &[row("https://example.com", "", "promo")], now)
            .await
            .unwrap();
        assert_eq!(first.created[0].shortcode, "promo");

        let second = shorten_batch(&store, &[row("https://example.org", "", "promo")], now)
            .await
            .unwrap();
        assert!(second.created.is_empty());
        assert_eq!(second.rejected[0].errors, vec![SubmitError::ShortcodeTaken]);
        // Nothing was persisted for the losing batch.
        assert_eq!(store.snapshot().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn in_batch_custom_codes_cannot_collide() {
        let store = MemoryStore::new();

        let outcome = shorten_batch(
            &store,
            &[
                row("https://example.com/a", "", "same"),
                row("https://example.com/b", "", "same"),
            ],
            Utc::now(),
        )
        .await
        .unwrap();

        assert_eq!(outcome.created.len(), 1);
        assert_eq!(outcome.rejected.len(), 1);
        assert_eq!(outcome.rejected[0].row, 1);
        assert_eq!(outcome.rejected[0].errors, vec![SubmitError::ShortcodeTaken]);
    }

    #[tokio::test]
    async fn generated_codes_in_one_batch_are_unique() {
        let store = MemoryStore::new();
        let rows: Vec<SubmissionRow> = (0..5)
            .map(|i| row(&format!("https://example.com/{i}"), "", ""))
            .collect();

        let outcome = shorten_batch(&store, &rows, Utc::now()).await.unwrap();

        let codes: HashSet<String> = outcome
            .created
            .iter()
            .map(|r| r.shortcode.clone())
            .collect();
        assert_eq!(codes.len(), 5);
    }

    #[tokio::test]
    async fn invalid_rows_do_not_abort_siblings() {
        let store = MemoryStore::new();

        let outcome = shorten_batch(
            &store,
            &[
                row("ftp://example.com", "0", ""),
                row("https://example.com", "", "ok1"),
            ],
            Utc::now(),
        )
        .await
        .unwrap();

        assert_eq!(outcome.created.len(), 1);
        assert_eq!(outcome.created[0].shortcode, "ok1");
        assert_eq!(outcome.rejected.len(), 1);
        assert_eq!(outcome.rejected[0].row, 0);
        assert_eq!(
            outcome.rejected[0].errors,
            vec![SubmitError::InvalidUrl, SubmitError::InvalidValidity]
        );
    }

    #[tokio::test]
    async fn all_invalid_batch_persists_nothing() {
        let store = MemoryStore::new();

        let outcome = shorten_batch(
            &store,
            &[
                row("not a url", "", ""),
                row("https://example.com", "abc", "bad_code!"),
            ],
            Utc::now(),
        )
        .await
        .unwrap();

        assert!(outcome.created.is_empty());
        assert_eq!(outcome.rejected.len(), 2);
        assert!(store.snapshot().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn blank_rows_are_skipped_without_errors() {
        let store = MemoryStore::new();

        let outcome = shorten_batch(
            &store,
            &[
                SubmissionRow::default(),
                row("https://example.com", "", ""),
                SubmissionRow::default(),
            ],
            Utc::now(),
        )
        .await
        .unwrap();

        assert_eq!(outcome.created.len(), 1);
        assert!(outcome.rejected.is_empty());
    }

    #[tokio::test]
    async fn uniqueness_holds_across_many_codeless_batches() {
        let store = MemoryStore::new();
        for _ in 0..20 {
            shorten_batch(
                &store,
                &[
                    row("https://example.com/a", "", ""),
                    row("https://example.com/b", "", ""),
                ],
                Utc::now(),
            )
            .await
            .unwrap();
        }

        let snapshot = store.snapshot().await.unwrap();
        let codes: HashSet<&str> = snapshot.iter().map(|r| r.shortcode.as_str()).collect();
        assert_eq!(codes.len(), snapshot.len());
        assert_eq!(snapshot.len(), 40);
    }
}
