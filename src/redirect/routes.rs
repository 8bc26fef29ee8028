use axum::{routing::get, Router};
use std::sync::Arc;

use crate::shortener::ShorteningService;

use super::handlers::{redirect_url, RedirectState};

pub fn create_redirect_router(service: Arc<ShorteningService>) -> Router {
    let state = Arc::new(RedirectState { service });

    Router::new()
        .route("/{code}", get(redirect_url))
        .with_state(state)
}
