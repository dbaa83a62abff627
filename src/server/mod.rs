//! HTTP server for price inference
//!
//! JSON API over the executor plus a Prometheus scrape endpoint.

mod handlers;
mod routes;

use std::sync::Arc;

use anyhow::Result;
use axum::extract::DefaultBodyLimit;
use axum::Router;
use tokio::net::TcpListener;
use tower::limit::ConcurrencyLimitLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::config::ServerConfig;

pub use handlers::{
    AppState, ErrorDetail, ErrorResponse, HealthResponse, ModelInfoResponse, PredictResponse,
    PricePrediction, RefreshResponse, RootResponse,
};
pub use routes::api_routes;

/// Build the application router with its middleware stack
pub fn router(state: Arc<AppState>, config: &ServerConfig) -> Router {
    let app = Router::new()
        .merge(api_routes())
        .layer(DefaultBodyLimit::max(config.max_body_size))
        .layer(TimeoutLayer::new(config.request_timeout()))
        .layer(ConcurrencyLimitLayer::new(config.max_concurrent_requests))
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    if config.cors_enabled {
        let cors = CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);
        app.layer(cors)
    } else {
        app
    }
}

/// Start the HTTP inference server
pub async fn start(state: Arc<AppState>, config: ServerConfig) -> Result<()> {
    let app = router(state, &config);

    let addr = config.addr();
    let listener = TcpListener::bind(&addr).await?;

    tracing::info!("Server listening on http://{}", addr);
    tracing::info!("API endpoints:");
    tracing::info!("  GET  / - API and model status");
    tracing::info!("  GET  /health - Health check");
    tracing::info!("  GET  /model - Active model details");
    tracing::info!("  POST /predict - Batch price prediction");
    tracing::info!("  POST /refresh-model - Reload model from the registry");
    tracing::info!("  GET  /metrics - Prometheus metrics");

    axum::serve(listener, app).await?;

    Ok(())
}
