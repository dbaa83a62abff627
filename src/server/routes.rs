//! Route definitions

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};

use super::handlers::{health, metrics, model_info, predict, refresh_model, root, AppState};

/// Create the API router
pub fn api_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .route("/model", get(model_info))
        .route("/predict", post(predict))
        .route("/refresh-model", post(refresh_model))
        .route("/metrics", get(metrics))
}
