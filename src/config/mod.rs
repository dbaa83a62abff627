//! Configuration system for pricer
//!
//! PricerConfig groups registry, server and codec settings. It loads from a
//! YAML or JSON file; selected fields can then be overridden from the
//! environment, which is how container deployments configure it.

mod registry;
mod server;

pub use registry::{ArtifactFiles, RegistryConfig, StoreKind};
pub use server::ServerConfig;

use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};

use crate::codec::CodecSchema;

pub const ENV_TRACKING_URI: &str = "MLFLOW_TRACKING_URI";
pub const ENV_MODEL_NAME: &str = "PRICER_MODEL_NAME";
pub const ENV_MODEL_ALIAS: &str = "PRICER_MODEL_ALIAS";
pub const ENV_ARTIFACT_DIR: &str = "PRICER_ARTIFACT_DIR";
pub const ENV_STORE: &str = "PRICER_STORE";

/// Pricer configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PricerConfig {
    /// Model registry and artifact store
    #[serde(default)]
    pub registry: RegistryConfig,

    /// HTTP server settings (only for `pricer serve`)
    #[serde(default)]
    pub server: ServerConfig,

    /// Feature codec column layout
    #[serde(default)]
    pub codec: CodecSchema,
}

impl PricerConfig {
    /// Load configuration from a YAML file
    pub fn from_yaml<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let config: Self = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Load configuration from a JSON file
    pub fn from_json<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let config: Self = serde_json::from_str(&content)?;
        Ok(config)
    }

    /// Load from an optional file (format by extension), then apply
    /// environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => {
                let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
                match ext {
                    "yaml" | "yml" => Self::from_yaml(path),
                    "json" => Self::from_json(path),
                    _ => Err(anyhow!("unsupported config format: .{}", ext)),
                }
                .with_context(|| format!("failed to load config from {}", path.display()))?
            }
            None => Self::default(),
        };
        config.apply_env_from(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Apply overrides from a variable lookup
    pub fn apply_env_from<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(uri) = lookup(ENV_TRACKING_URI) {
            self.registry.tracking_uri = uri;
        }
        if let Some(name) = lookup(ENV_MODEL_NAME) {
            self.registry.model_name = name;
        }
        if let Some(alias) = lookup(ENV_MODEL_ALIAS) {
            self.registry.alias = alias;
        }
        if let Some(dir) = lookup(ENV_ARTIFACT_DIR) {
            self.registry.artifact_dir = PathBuf::from(dir);
        }
        if let Some(store) = lookup(ENV_STORE) {
            self.registry.store = store
                .parse()
                .with_context(|| format!("invalid {}", ENV_STORE))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    #[test]
    fn test_pricer_config_yaml() {
        let yaml = r#"
registry:
  tracking_uri: http://mlflow:5000
  model_name: random_forest_regressor
  alias: staging
  store: local
  artifact_dir: /var/lib/pricer/models

server:
  port: 8080
  host: 127.0.0.1
  max_concurrent_requests: 4
  strict_input: true

codec:
  name_column: carname
"#;
        let config: PricerConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.registry.tracking_uri, "http://mlflow:5000");
        assert_eq!(config.registry.model_ref(), "random_forest_regressor@staging");
        assert_eq!(config.registry.store, StoreKind::Local);
        assert_eq!(config.registry.artifacts.scaler, "scaler.json");
        assert_eq!(config.server.addr(), "127.0.0.1:8080");
        assert!(config.server.strict_input);
        assert_eq!(config.server.request_timeout_secs, 300);
        assert_eq!(config.codec.name_column, "carname");
        assert_eq!(config.codec.brand_column, "carbrand");
    }

    #[test]
    fn test_defaults() {
        let config = PricerConfig::default();
        assert_eq!(config.registry.model_ref(), "xgboost_regressor@prod");
        assert_eq!(config.registry.store, StoreKind::Registry);
        assert_eq!(config.server.port, 8005);
        assert!(!config.server.strict_input);
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = [
            (ENV_TRACKING_URI, "http://registry:5000"),
            (ENV_MODEL_ALIAS, "champion"),
            (ENV_STORE, "local"),
        ]
        .into_iter()
        .collect();

        let mut config = PricerConfig::default();
        config
            .apply_env_from(|key| env.get(key).map(|v| v.to_string()))
            .unwrap();

        assert_eq!(config.registry.tracking_uri, "http://registry:5000");
        assert_eq!(config.registry.alias, "champion");
        assert_eq!(config.registry.model_name, "xgboost_regressor");
        assert_eq!(config.registry.store, StoreKind::Local);
    }

    #[test]
    fn test_invalid_store_override() {
        let mut config = PricerConfig::default();
        let result = config.apply_env_from(|key| (key == ENV_STORE).then(|| "s3".to_string()));
        assert!(result.is_err());
    }

    #[test]
    fn test_load_rejects_unknown_extension() {
        assert!(PricerConfig::load(Some(Path::new("pricer.toml"))).is_err());
    }
}
