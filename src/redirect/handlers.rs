use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Redirect},
};
use std::sync::Arc;

use crate::shortener::{ResolveError, ShorteningService};

pub struct RedirectState {
    pub service: Arc<ShorteningService>,
}

/// Redirect to original URL
pub async fn redirect_url(
    State(state): State<Arc<RedirectState>>,
    Path(code): Path<String>,
) -> impl IntoResponse {
    match state.service.resolve(&code).await {
        Ok(target) => Redirect::permanent(&target.long_url).into_response(),
        Err(ResolveError::MalformedCode) => {
            (StatusCode::BAD_REQUEST, "Malformed short code").into_response()
        }
        Err(ResolveError::NotFound) => (StatusCode::NOT_FOUND, "URL not found").into_response(),
        Err(ResolveError::Expired) => {
            tracing::debug!(short_code = %code, "Redirect requested for expired link");
            (StatusCode::NOT_FOUND, "URL has expired").into_response()
        }
    }
}
