use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;

use crate::redirect::{create_redirect_router, middleware::log_latency};
use crate::shortener::ShorteningService;

use super::handlers::{health_check, shorten_url, top_domains, AppState};

pub fn create_api_router(service: Arc<ShorteningService>) -> Router {
    let state = Arc::new(AppState { service });

    Router::new()
        .route("/shorten", post(shorten_url))
        .route("/metrics", get(top_domains))
        .route("/health", get(health_check))
        .with_state(state)
}

/// Full HTTP surface: api routes, redirects and request latency logging
pub fn create_app(service: Arc<ShorteningService>) -> Router {
    create_api_router(Arc::clone(&service))
        .merge(create_redirect_router(service))
        .layer(middleware::from_fn(log_latency))
}
