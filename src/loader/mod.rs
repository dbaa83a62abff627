//! Artifact loading
//!
//! A bundle is resolved from a registered model alias to one training run,
//! whose five artifacts are downloaded together and validated against each
//! other. Stores:
//! - MLflow tracking server (the production registry)
//! - Local directory mirror (offline use, populated by `pricer pull`)

mod layout;
mod local;
mod mlflow;

pub use layout::{scan_models, scan_runs, Layout, ModelEntry};
pub use local::LocalStore;
pub use mlflow::MlflowStore;

use std::collections::BTreeMap;
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::codec::{CodecSchema, FeatureCodec, OrdinalEncoder, StandardScaler, TargetEncoder};
use crate::config::{RegistryConfig, StoreKind};
use crate::engine::ArtifactBundle;
use crate::model::{ModelArtifact, ModelQuality, TrainingParams};

/// Metadata logged by a training run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunRecord {
    #[serde(default)]
    pub metrics: BTreeMap<String, f64>,
    #[serde(default)]
    pub params: BTreeMap<String, String>,
}

/// Source of model runs and their artifacts
#[async_trait]
pub trait ArtifactStore: Send + Sync {
    /// Human-readable location, for logs
    fn describe(&self) -> String;

    /// Resolve `model@alias` to a run id
    async fn resolve_alias(&self, model: &str, alias: &str) -> Result<String>;

    /// Raw bytes of one artifact of a run
    async fn fetch_artifact(&self, run_id: &str, path: &str) -> Result<Vec<u8>>;

    /// Metrics and parameters of a run
    async fn fetch_run(&self, run_id: &str) -> Result<RunRecord>;
}

/// Open the store selected by the configuration
pub fn open_store(config: &RegistryConfig) -> Result<Arc<dyn ArtifactStore>> {
    match config.store {
        StoreKind::Registry => Ok(Arc::new(MlflowStore::new(
            &config.tracking_uri,
            config.request_timeout(),
        )?)),
        StoreKind::Local => Ok(Arc::new(LocalStore::new(config.artifact_dir.clone()))),
    }
}

/// Undecoded artifacts of one run
struct RunArtifacts {
    run_id: String,
    model: Vec<u8>,
    scaler: Vec<u8>,
    target_encoder: Vec<u8>,
    ordinal_encoder: Vec<u8>,
    features: Vec<u8>,
    record: RunRecord,
}

async fn fetch_run_artifacts(
    store: &dyn ArtifactStore,
    config: &RegistryConfig,
) -> Result<RunArtifacts> {
    let run_id = store
        .resolve_alias(&config.model_name, &config.alias)
        .await
        .with_context(|| format!("failed to resolve {}", config.model_ref()))?;

    let files = &config.artifacts;
    let fetch = |path: &str| {
        let run_id = run_id.clone();
        let path = path.to_string();
        async move {
            store
                .fetch_artifact(&run_id, &path)
                .await
                .with_context(|| format!("missing artifact '{}' in run {}", path, run_id))
        }
    };

    let (model, scaler, target_encoder, ordinal_encoder, features, record) = futures::try_join!(
        fetch(&files.model),
        fetch(&files.scaler),
        fetch(&files.target_encoder),
        fetch(&files.ordinal_encoder),
        fetch(&files.features),
        async {
            store
                .fetch_run(&run_id)
                .await
                .with_context(|| format!("failed to fetch run {}", run_id))
        },
    )?;

    Ok(RunArtifacts {
        run_id,
        model,
        scaler,
        target_encoder,
        ordinal_encoder,
        features,
        record,
    })
}

fn parse<T: DeserializeOwned>(name: &str, bytes: &[u8]) -> Result<T> {
    serde_json::from_slice(bytes).with_context(|| format!("malformed artifact '{}'", name))
}

fn assemble(
    artifacts: &RunArtifacts,
    config: &RegistryConfig,
    schema: &CodecSchema,
) -> Result<ArtifactBundle> {
    let files = &config.artifacts;
    let scaler: StandardScaler = parse(&files.scaler, &artifacts.scaler)?;
    let target_encoder: TargetEncoder = parse(&files.target_encoder, &artifacts.target_encoder)?;
    let ordinal_encoder: OrdinalEncoder =
        parse(&files.ordinal_encoder, &artifacts.ordinal_encoder)?;
    let features: Vec<String> = parse(&files.features, &artifacts.features)?;

    let codec = FeatureCodec::new(
        schema.clone(),
        scaler,
        target_encoder,
        ordinal_encoder,
        features,
    )?;
    let model = ModelArtifact::from_json(&artifacts.model)
        .and_then(ModelArtifact::into_model)
        .with_context(|| format!("invalid model artifact '{}'", files.model))?;

    ArtifactBundle::new(
        artifacts.run_id.clone(),
        model,
        codec,
        ModelQuality::from_run_metrics(&artifacts.record.metrics),
        TrainingParams::from_run_params(&artifacts.record.params),
    )
}

/// Load and validate a complete bundle for the configured alias.
///
/// Fails unless every artifact is present and consistent; a partial bundle is
/// never returned.
pub async fn load_bundle(
    store: &dyn ArtifactStore,
    config: &RegistryConfig,
    schema: &CodecSchema,
) -> Result<ArtifactBundle> {
    tracing::info!(
        model = %config.model_ref(),
        store = %store.describe(),
        "Loading model bundle"
    );

    let artifacts = fetch_run_artifacts(store, config).await?;
    let bundle = assemble(&artifacts, config, schema)?;

    tracing::info!(
        run_id = %bundle.run_id(),
        kind = bundle.model().kind(),
        features = bundle.codec().model_features().len(),
        params = ?bundle.params(),
        "Model bundle loaded"
    );
    Ok(bundle)
}

/// Copy the configured alias from `source` into a local mirror.
///
/// The bundle is validated before anything is written, and the alias is
/// written last. Returns the run id.
pub async fn pull_bundle(
    source: &dyn ArtifactStore,
    dest: &LocalStore,
    config: &RegistryConfig,
    schema: &CodecSchema,
) -> Result<String> {
    let artifacts = fetch_run_artifacts(source, config).await?;
    assemble(&artifacts, config, schema)
        .map_err(|e| anyhow!("refusing to mirror an invalid bundle: {:#}", e))?;

    let files = &config.artifacts;
    let run_id = &artifacts.run_id;
    for (path, bytes) in [
        (&files.model, &artifacts.model),
        (&files.scaler, &artifacts.scaler),
        (&files.target_encoder, &artifacts.target_encoder),
        (&files.ordinal_encoder, &artifacts.ordinal_encoder),
        (&files.features, &artifacts.features),
    ] {
        dest.write_artifact(run_id, path, bytes).await?;
    }
    dest.write_run(run_id, &artifacts.record).await?;
    dest.write_alias(&config.model_name, &config.alias, run_id)
        .await?;

    Ok(run_id.clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::RawRecord;
    use crate::engine::fixtures;

    fn local_config(root: &std::path::Path) -> RegistryConfig {
        RegistryConfig {
            store: StoreKind::Local,
            artifact_dir: root.to_path_buf(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_load_bundle() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalStore::new(dir.path());
        let config = local_config(dir.path());
        fixtures::write_bundle(&store, &config, "run-1", 10_000.0).await;

        let bundle = load_bundle(&store, &config, &CodecSchema::default())
            .await
            .unwrap();
        assert_eq!(bundle.run_id(), "run-1");
        assert_eq!(bundle.quality().mae, 1523.4);
        assert_eq!(bundle.params().n_estimators, Some(200));

        let predictions = bundle.infer(&[fixtures::toyota_gas()]).unwrap();
        assert_eq!(predictions[0].predicted_value, 22_000.0);
    }

    #[tokio::test]
    async fn test_open_store_local() {
        let dir = tempfile::tempdir().unwrap();
        let config = local_config(dir.path());
        fixtures::write_bundle(&LocalStore::new(dir.path()), &config, "run-1", 0.0).await;

        let store = open_store(&config).unwrap();
        assert!(store.describe().starts_with("local:"));
        assert!(load_bundle(store.as_ref(), &config, &CodecSchema::default())
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn test_missing_artifact_fails_whole_load() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalStore::new(dir.path());
        let config = local_config(dir.path());
        fixtures::write_bundle(&store, &config, "run-1", 0.0).await;
        std::fs::remove_file(dir.path().join("runs/run-1/artifacts/scaler.json")).unwrap();

        let err = load_bundle(&store, &config, &CodecSchema::default())
            .await
            .unwrap_err();
        assert!(format!("{:#}", err).contains("scaler.json"));
    }

    #[tokio::test]
    async fn test_inconsistent_bundle_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalStore::new(dir.path());
        let config = local_config(dir.path());
        fixtures::write_bundle(&store, &config, "run-1", 0.0).await;

        // Two coefficients against three features
        store
            .write_artifact(
                "run-1",
                &config.artifacts.model,
                br#"{"kind": "linear", "coefficients": [1.0, 2.0], "intercept": 0.0}"#,
            )
            .await
            .unwrap();
        assert!(load_bundle(&store, &config, &CodecSchema::default())
            .await
            .is_err());

        store
            .write_artifact("run-1", &config.artifacts.model, b"not json")
            .await
            .unwrap();
        assert!(load_bundle(&store, &config, &CodecSchema::default())
            .await
            .is_err());
    }

    #[tokio::test]
    async fn test_unknown_alias() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalStore::new(dir.path());
        let config = RegistryConfig {
            alias: "champion".to_string(),
            ..local_config(dir.path())
        };
        fixtures::write_bundle(&store, &local_config(dir.path()), "run-1", 0.0).await;

        let err = load_bundle(&store, &config, &CodecSchema::default())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("xgboost_regressor@champion"));
    }

    #[tokio::test]
    async fn test_pull_bundle() {
        let source_dir = tempfile::tempdir().unwrap();
        let mirror_dir = tempfile::tempdir().unwrap();
        let source = LocalStore::new(source_dir.path());
        let mirror = LocalStore::new(mirror_dir.path());
        let config = local_config(source_dir.path());
        fixtures::write_bundle(&source, &config, "run-9", 500.0).await;

        let run_id = pull_bundle(&source, &mirror, &config, &CodecSchema::default())
            .await
            .unwrap();
        assert_eq!(run_id, "run-9");

        let bundle = load_bundle(&mirror, &config, &CodecSchema::default())
            .await
            .unwrap();
        assert_eq!(bundle.run_id(), "run-9");
        let record = RawRecord::new().with("horsepower", 100.0);
        assert!(bundle.infer(&[record]).is_ok());
    }
}
