use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;
use std::sync::Arc;

use crate::analytics::DomainCount;
use crate::models::{ShortenRequest, ShortenResponse};
use crate::shortener::{ShortenError, ShorteningService};
use crate::storage::StorageStats;

pub struct AppState {
    pub service: Arc<ShorteningService>,
}

#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<&'static str>,
}

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    #[serde(flatten)]
    pub stats: StorageStats,
}

/// Create (or look up) the short URL for a long URL
pub async fn shorten_url(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<ShortenRequest>, JsonRejection>,
) -> Result<Json<ShortenResponse>, (StatusCode, Json<ErrorResponse>)> {
    let Json(payload) = payload.map_err(|rejection| {
        tracing::debug!(error = %rejection, "Rejected shorten request body");
        (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                error: "Invalid URL".to_string(),
                reason: Some("malformed_body"),
            }),
        )
    })?;

    match state.service.shorten(payload).await {
        Ok(response) => Ok(Json(response)),
        Err(ShortenError::Validation(err)) => Err((
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                error: "Invalid URL".to_string(),
                reason: Some(err.reason()),
            }),
        )),
        Err(err @ ShortenError::CodeSpaceExhausted { .. }) => {
            tracing::error!(error = %err, "Failed to allocate short code");
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: "Failed to generate unique short code".to_string(),
                    reason: None,
                }),
            ))
        }
        Err(err @ ShortenError::ExpiryOutOfRange) => {
            tracing::error!(error = %err, "Failed to compute link expiry");
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: "Failed to compute link expiry".to_string(),
                    reason: None,
                }),
            ))
        }
    }
}

/// Most shortened domains as of the last aggregation cycle
pub async fn top_domains(State(state): State<Arc<AppState>>) -> Json<Vec<DomainCount>> {
    Json(state.service.top_domains().await)
}

/// Health check endpoint
pub async fn health_check(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "OK".to_string(),
        stats: state.service.stats().await,
    })
}
