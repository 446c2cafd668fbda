use axum::{routing::get, Router};
use std::sync::Arc;
use std::time::Duration;

use crate::resolve::Resolver;

use super::handlers::{redirect_url, RedirectState};

pub fn create_redirect_router(resolver: Resolver, delay: Duration) -> Router {
    let state = Arc::new(RedirectState { resolver, delay });

    Router::new()
        .route("/{code}", get(redirect_url))
        .with_state(state)
}
