use axum::{extract::State, http::StatusCode, Json};
use chrono::Utc;
use serde::Serialize;
use std::sync::Arc;

use crate::analytics::{self, StatsReport};
use crate::models::LinkRecord;
use crate::shorten::{self, RowRejection, SubmissionRow};
use crate::storage::LinkStore;
use crate::telemetry::{Package, Telemetry};

pub struct AppState {
    pub store: Arc<dyn LinkStore>,
    pub telemetry: Telemetry,
}

#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShortenResponse {
    pub created: Vec<LinkRecord>,
    pub rejected: Vec<RowRejection>,
}

/// Submit a batch of link rows.
///
/// Rows succeed and fail independently; the response always carries both
/// lists. 201 when at least one link was created, 400 when none were.
pub async fn shorten_links(
    State(state): State<Arc<AppState>>,
    Json(rows): Json<Vec<SubmissionRow>>,
) -> Result<(StatusCode, Json<ShortenResponse>), (StatusCode, Json<ErrorResponse>)> {
    let outcome = shorten::shorten_batch(state.store.as_ref(), &rows, Utc::now())
        .await
        .map_err(|err| {
            tracing::error!("batch submission failed: {err:#}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: "failed to persist links".to_string(),
                }),
            )
        })?;

    for record in &outcome.created {
        let minutes = (record.expires_at - record.created_at).num_minutes();
        state.telemetry.info(
            Package::Api,
            format!(
                "shortened {} as /{} valid for {} min",
                record.target_url, record.shortcode, minutes
            ),
        );
    }

    let status = if outcome.created.is_empty() {
        StatusCode::BAD_REQUEST
    } else {
        StatusCode::CREATED
    };

    Ok((
        status,
        Json(ShortenResponse {
            created: outcome.created,
            rejected: outcome.rejected,
        }),
    ))
}

/// Statistics over every link in the store.
pub async fn stats(
    State(state): State<Arc<AppState>>,
) -> Result<Json<StatsReport>, (StatusCode, Json<ErrorResponse>)> {
    match analytics::report(state.store.as_ref(), Utc::now()).await {
        Ok(report) => Ok(Json(report)),
        Err(err) => {
            tracing::error!("statistics read failed: {err:#}");
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: "failed to read statistics".to_string(),
                }),
            ))
        }
    }
}

/// Health check endpoint
pub async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "OK" }))
}
