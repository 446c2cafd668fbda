use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;

use crate::storage::LinkStore;
use crate::telemetry::Telemetry;

use super::handlers::{health_check, shorten_links, stats, AppState};

pub fn create_api_router(store: Arc<dyn LinkStore>, telemetry: Telemetry) -> Router {
    let state = Arc::new(AppState { store, telemetry });

    Router::new()
        .route("/", get(health_check).post(shorten_links))
        .route("/stats", get(stats))
        .with_state(state)
}
