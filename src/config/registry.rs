//! Model registry and artifact store settings

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Where artifact bundles are fetched from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreKind {
    /// MLflow tracking server
    Registry,
    /// Local directory mirror (see `pricer pull`)
    Local,
}

impl std::str::FromStr for StoreKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "registry" | "mlflow" => Ok(StoreKind::Registry),
            "local" | "fs" => Ok(StoreKind::Local),
            other => Err(anyhow::anyhow!("unknown artifact store: '{}'", other)),
        }
    }
}

/// Artifact file names within a training run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArtifactFiles {
    #[serde(default = "default_model_file")]
    pub model: String,
    #[serde(default = "default_scaler_file")]
    pub scaler: String,
    #[serde(default = "default_target_encoder_file")]
    pub target_encoder: String,
    #[serde(default = "default_ordinal_encoder_file")]
    pub ordinal_encoder: String,
    #[serde(default = "default_features_file")]
    pub features: String,
}

fn default_model_file() -> String {
    "car_price_model.json".to_string()
}

fn default_scaler_file() -> String {
    "scaler.json".to_string()
}

fn default_target_encoder_file() -> String {
    "target_encoder.json".to_string()
}

fn default_ordinal_encoder_file() -> String {
    "ordinal_encoder.json".to_string()
}

fn default_features_file() -> String {
    "model_features.json".to_string()
}

impl Default for ArtifactFiles {
    fn default() -> Self {
        Self {
            model: default_model_file(),
            scaler: default_scaler_file(),
            target_encoder: default_target_encoder_file(),
            ordinal_encoder: default_ordinal_encoder_file(),
            features: default_features_file(),
        }
    }
}

impl ArtifactFiles {
    /// All artifact paths of a complete bundle
    pub fn all(&self) -> [&str; 5] {
        [
            &self.model,
            &self.scaler,
            &self.target_encoder,
            &self.ordinal_encoder,
            &self.features,
        ]
    }
}

/// Registry configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegistryConfig {
    /// MLflow tracking server URI
    #[serde(default = "default_tracking_uri")]
    pub tracking_uri: String,

    /// Registered model name
    #[serde(default = "default_model_name")]
    pub model_name: String,

    /// Registered model alias (stage)
    #[serde(default = "default_alias")]
    pub alias: String,

    /// Root of the local artifact mirror
    #[serde(default = "default_artifact_dir")]
    pub artifact_dir: PathBuf,

    /// Which store to load from
    #[serde(default = "default_store")]
    pub store: StoreKind,

    /// Timeout for each registry HTTP call, in seconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    #[serde(default)]
    pub artifacts: ArtifactFiles,
}

fn default_tracking_uri() -> String {
    "http://localhost:5000".to_string()
}

fn default_model_name() -> String {
    "xgboost_regressor".to_string()
}

fn default_alias() -> String {
    "prod".to_string()
}

fn default_artifact_dir() -> PathBuf {
    PathBuf::from("./models")
}

fn default_store() -> StoreKind {
    StoreKind::Registry
}

fn default_request_timeout() -> u64 {
    30
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            tracking_uri: default_tracking_uri(),
            model_name: default_model_name(),
            alias: default_alias(),
            artifact_dir: default_artifact_dir(),
            store: default_store(),
            request_timeout_secs: default_request_timeout(),
            artifacts: ArtifactFiles::default(),
        }
    }
}

impl RegistryConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// `name@alias`, as shown in logs and status output
    pub fn model_ref(&self) -> String {
        format!("{}@{}", self.model_name, self.alias)
    }
}
