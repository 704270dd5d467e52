use std::sync::Arc;

use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use tracing::error;

use crate::application::{SamplerStatus, StatusSnapshot};
use crate::domain::{Counter, Target};
use crate::ports::{MetricStore, StoreError};

/// Custom error type that implements IntoResponse
#[derive(Debug)]
pub struct AppError(String);

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        (StatusCode::INTERNAL_SERVER_ERROR, self.0).into_response()
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        error!("Failed to render metrics: {}", err);
        AppError(err.to_string())
    }
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub target: Target,
    pub store: Arc<dyn MetricStore>,
    pub status: Arc<SamplerStatus>,
}

/// Currently published values for the target
#[derive(Debug, Serialize)]
pub struct PublishedValues {
    pub sent_bits_per_second: Option<f64>,
    pub sent_retransmits: Option<f64>,
    pub received_bits_per_second: Option<f64>,
    pub received_retransmits: Option<f64>,
    pub error_count: u64,
}

/// Response for /api/status
#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub timestamp: String,
    pub target: Target,
    pub sampler: StatusSnapshot,
    pub metrics: PublishedValues,
}

/// Handler for GET /metrics
pub async fn metrics_handler(State(state): State<AppState>) -> Result<Response, AppError> {
    let body = state.store.render()?;
    Ok(([(header::CONTENT_TYPE, prometheus::TEXT_FORMAT)], body).into_response())
}

/// Handler for GET /api/health
pub async fn health_handler() -> (StatusCode, Json<serde_json::Value>) {
    (
        StatusCode::OK,
        Json(serde_json::json!({
            "status": "healthy",
            "service": "iperfmon"
        })),
    )
}

/// Handler for GET /api/status
pub async fn status_handler(State(state): State<AppState>) -> Json<StatusResponse> {
    let store = &state.store;
    let target = &state.target;
    let published = store.published(target);

    Json(StatusResponse {
        timestamp: chrono::Utc::now().to_rfc3339(),
        target: target.clone(),
        sampler: state.status.snapshot(),
        metrics: PublishedValues {
            sent_bits_per_second: published.map(|r| r.sent.bits_per_second),
            sent_retransmits: published.map(|r| r.sent.retransmits),
            received_bits_per_second: published.map(|r| r.received.bits_per_second),
            received_retransmits: published.map(|r| r.received.retransmits),
            error_count: store.count(Counter::Errors, target),
        },
    })
}
