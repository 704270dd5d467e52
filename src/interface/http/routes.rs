use std::sync::Arc;

use axum::{routing::get, Router};
use tower_http::trace::TraceLayer;

use crate::application::SamplerStatus;
use crate::domain::Target;
use crate::ports::MetricStore;

use super::handlers::{health_handler, metrics_handler, status_handler, AppState};

pub fn create_router(
    target: Target,
    store: Arc<dyn MetricStore>,
    status: Arc<SamplerStatus>,
) -> Router {
    let state = AppState {
        target,
        store,
        status,
    };

    Router::new()
        .route("/metrics", get(metrics_handler))
        // API routes
        .route("/api/health", get(health_handler))
        .route("/api/status", get(status_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
