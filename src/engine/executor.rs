//! Inference executor
//!
//! Owns the active artifact bundle and serves predictions from it. The bundle
//! sits behind one `Arc` that a refresh swaps atomically, so in-flight
//! requests finish on the bundle they started with.

use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::{Mutex, RwLock};

use crate::codec::{CodecSchema, RawRecord};
use crate::config::RegistryConfig;
use crate::error::{InferenceError, InferenceResult};
use crate::loader::{self, ArtifactStore};
use crate::model::ModelQuality;
use crate::monitoring::InferenceMetrics;

use super::{ArtifactBundle, Prediction};

/// Registered model served by an executor
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModelIdentity {
    pub name: String,
    pub alias: String,
}

impl ModelIdentity {
    pub fn new(name: impl Into<String>, alias: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            alias: alias.into(),
        }
    }
}

impl From<&RegistryConfig> for ModelIdentity {
    fn from(config: &RegistryConfig) -> Self {
        Self::new(config.model_name.clone(), config.alias.clone())
    }
}

impl std::fmt::Display for ModelIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}@{}", self.name, self.alias)
    }
}

/// Read-only view of the executor
#[derive(Debug, Clone, Serialize)]
pub struct ExecutorStatus {
    pub model: ModelIdentity,
    pub ready: bool,
    pub run_id: Option<String>,
    pub loaded_at: Option<DateTime<Utc>>,
    pub quality: Option<ModelQuality>,
}

/// Inference executor
pub struct Executor {
    identity: ModelIdentity,
    active: RwLock<Option<Arc<ArtifactBundle>>>,
    /// Serializes refreshes; predictions never wait on it
    refresh_lock: Mutex<()>,
    metrics: InferenceMetrics,
}

impl Executor {
    /// Create an executor with no bundle (not ready)
    pub fn new(identity: ModelIdentity, metrics: InferenceMetrics) -> Self {
        Self {
            identity,
            active: RwLock::new(None),
            refresh_lock: Mutex::new(()),
            metrics,
        }
    }

    pub fn identity(&self) -> &ModelIdentity {
        &self.identity
    }

    /// The bundle serving right now, if any
    pub async fn snapshot(&self) -> Option<Arc<ArtifactBundle>> {
        self.active.read().await.clone()
    }

    pub async fn is_ready(&self) -> bool {
        self.active.read().await.is_some()
    }

    pub async fn status(&self) -> ExecutorStatus {
        let bundle = self.snapshot().await;
        ExecutorStatus {
            model: self.identity.clone(),
            ready: bundle.is_some(),
            run_id: bundle.as_ref().map(|b| b.run_id().to_string()),
            loaded_at: bundle.as_ref().map(|b| b.loaded_at()),
            quality: bundle.as_ref().map(|b| *b.quality()),
        }
    }

    /// Make `bundle` the active one and publish its quality metrics
    pub async fn install(&self, bundle: ArtifactBundle) -> Arc<ArtifactBundle> {
        let bundle = Arc::new(bundle);
        self.metrics
            .set_quality(bundle.quality(), bundle.loaded_at().timestamp());

        let previous = self.active.write().await.replace(Arc::clone(&bundle));
        tracing::info!(
            model = %self.identity,
            run_id = %bundle.run_id(),
            previous = previous.as_ref().map(|b| b.run_id()).unwrap_or("none"),
            "Installed model bundle"
        );
        bundle
    }

    /// Load a fresh bundle and swap it in.
    ///
    /// The load happens outside the lock. On failure the previous bundle
    /// stays active.
    pub async fn refresh(
        &self,
        store: &dyn ArtifactStore,
        config: &RegistryConfig,
        schema: &CodecSchema,
    ) -> InferenceResult<Arc<ArtifactBundle>> {
        let _guard = self.refresh_lock.lock().await;

        match loader::load_bundle(store, config, schema).await {
            Ok(bundle) => {
                self.metrics.record_refresh(true);
                Ok(self.install(bundle).await)
            }
            Err(e) => {
                self.metrics.record_refresh(false);
                tracing::error!(
                    model = %self.identity,
                    store = %store.describe(),
                    error = %format!("{:#}", e),
                    "Model refresh failed; keeping current bundle"
                );
                Err(InferenceError::ArtifactLoadFailed(format!("{:#}", e)))
            }
        }
    }

    /// Predict prices for a batch, same length and order as the input
    pub async fn predict(&self, records: Vec<RawRecord>) -> InferenceResult<Vec<Prediction>> {
        let bundle = self.snapshot().await.ok_or(InferenceError::NotReady)?;
        if records.is_empty() {
            return Err(InferenceError::InvalidInput(
                "request contains no records".to_string(),
            ));
        }

        let start = Instant::now();
        let result = tokio::task::spawn_blocking(move || bundle.infer(&records))
            .await
            .unwrap_or_else(|e| {
                Err(InferenceError::InferenceFailed(format!(
                    "inference task failed: {}",
                    e
                )))
            });
        let elapsed = start.elapsed();

        match &result {
            Ok(predictions) => {
                let prices: Vec<f64> = predictions.iter().map(|p| p.predicted_value).collect();
                self.metrics.record_batch(&prices, elapsed);
                tracing::debug!(
                    rows = prices.len(),
                    elapsed_ms = elapsed.as_millis() as u64,
                    "Prediction batch served"
                );
            }
            Err(e) => {
                self.metrics.record_failure(elapsed);
                tracing::warn!(error = %e, "Prediction batch failed");
            }
        }
        result
    }
}
