//! HTTP server command

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;

use crate::engine::{Executor, ModelIdentity};
use crate::loader;
use crate::monitoring::{self, InferenceMetrics};
use crate::server::{self, AppState};

/// Start the inference server
pub async fn serve(
    config_path: Option<PathBuf>,
    port: Option<u16>,
    host: Option<String>,
    local: bool,
) -> Result<()> {
    let mut config = super::load_config(config_path.as_deref(), local)?;
    if let Some(port) = port {
        config.server.port = port;
    }
    if let Some(host) = host {
        config.server.host = host;
    }

    // Metric handles bind to the recorder present when they are created
    let prometheus = if config.server.metrics_enabled {
        Some(monitoring::install_prometheus()?)
    } else {
        None
    };
    let executor = Arc::new(Executor::new(
        ModelIdentity::from(&config.registry),
        InferenceMetrics::new(),
    ));
    let store = loader::open_store(&config.registry)?;

    // Serve even if the first load fails; /predict answers 503 until a
    // refresh succeeds
    tracing::info!("Pre-loading model: {}", config.registry.model_ref());
    match executor
        .refresh(store.as_ref(), &config.registry, &config.codec)
        .await
    {
        Ok(bundle) => tracing::info!(run_id = %bundle.run_id(), "Model loaded successfully"),
        Err(e) => tracing::warn!("Starting without a model: {}", e),
    }

    let server_config = config.server.clone();
    let mut state = AppState::new(executor, store, config);
    if let Some(handle) = prometheus {
        state = state.with_prometheus(handle);
    }

    tracing::info!("Starting server at http://{}", server_config.addr());
    server::start(Arc::new(state), server_config).await?;

    Ok(())
}
