//! Artifact store backed by a local directory mirror

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;

use super::layout::Layout;
use super::{ArtifactStore, RunRecord};

/// Reads bundles from (and writes them to) a directory tree
#[derive(Debug, Clone)]
pub struct LocalStore {
    layout: Layout,
}

impl LocalStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            layout: Layout::new(root),
        }
    }

    pub fn root(&self) -> &Path {
        self.layout.root()
    }

    async fn read_aliases(&self, model: &str) -> Result<BTreeMap<String, String>> {
        let path = self.layout.aliases_path(model)?;
        match tokio::fs::read(&path).await {
            Ok(bytes) => serde_json::from_slice(&bytes)
                .with_context(|| format!("invalid alias file {}", path.display())),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(e) => Err(e).with_context(|| format!("failed to read {}", path.display())),
        }
    }

    /// Point `model@alias` at a run, keeping the model's other aliases
    pub async fn write_alias(&self, model: &str, alias: &str, run_id: &str) -> Result<()> {
        self.layout.run_dir(run_id)?;
        let mut aliases = self.read_aliases(model).await?;
        aliases.insert(alias.to_string(), run_id.to_string());

        let path = self.layout.aliases_path(model)?;
        write_file(&path, &serde_json::to_vec_pretty(&aliases)?).await
    }

    pub async fn write_run(&self, run_id: &str, record: &RunRecord) -> Result<()> {
        let path = self.layout.run_record_path(run_id)?;
        write_file(&path, &serde_json::to_vec_pretty(record)?).await
    }

    pub async fn write_artifact(&self, run_id: &str, artifact: &str, bytes: &[u8]) -> Result<()> {
        let path = self.layout.artifact_path(run_id, artifact)?;
        write_file(&path, bytes).await
    }
}

async fn write_file(path: &Path, bytes: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    tokio::fs::write(path, bytes)
        .await
        .with_context(|| format!("failed to write {}", path.display()))
}

#[async_trait]
impl ArtifactStore for LocalStore {
    fn describe(&self) -> String {
        format!("local:{}", self.layout.root().display())
    }

    async fn resolve_alias(&self, model: &str, alias: &str) -> Result<String> {
        self.read_aliases(model)
            .await?
            .remove(alias)
            .ok_or_else(|| anyhow!("no run registered for {}@{}", model, alias))
    }

    async fn fetch_artifact(&self, run_id: &str, path: &str) -> Result<Vec<u8>> {
        let file = self.layout.artifact_path(run_id, path)?;
        tokio::fs::read(&file)
            .await
            .with_context(|| format!("failed to read artifact {}", file.display()))
    }

    async fn fetch_run(&self, run_id: &str) -> Result<RunRecord> {
        let path = self.layout.run_record_path(run_id)?;
        match tokio::fs::read(&path).await {
            Ok(bytes) => serde_json::from_slice(&bytes)
                .with_context(|| format!("invalid run record {}", path.display())),
            // Runs copied without metadata still serve
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::warn!(run_id, "No run record found; training metrics unavailable");
                Ok(RunRecord::default())
            }
            Err(e) => Err(e).with_context(|| format!("failed to read {}", path.display())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_alias_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalStore::new(dir.path());

        assert!(store.resolve_alias("xgboost_regressor", "prod").await.is_err());

        store
            .write_alias("xgboost_regressor", "staging", "run-1")
            .await
            .unwrap();
        store
            .write_alias("xgboost_regressor", "prod", "run-2")
            .await
            .unwrap();

        assert_eq!(
            store.resolve_alias("xgboost_regressor", "prod").await.unwrap(),
            "run-2"
        );
        assert_eq!(
            store
                .resolve_alias("xgboost_regressor", "staging")
                .await
                .unwrap(),
            "run-1"
        );
    }

    #[tokio::test]
    async fn test_artifacts_and_runs() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalStore::new(dir.path());

        store
            .write_artifact("run-1", "model_features.json", br#"["horsepower"]"#)
            .await
            .unwrap();
        assert_eq!(
            store
                .fetch_artifact("run-1", "model_features.json")
                .await
                .unwrap(),
            br#"["horsepower"]"#.to_vec()
        );
        assert!(store.fetch_artifact("run-1", "scaler.json").await.is_err());

        // No run.json yet: empty record
        assert_eq!(store.fetch_run("run-1").await.unwrap(), RunRecord::default());

        let record = RunRecord {
            metrics: [("mae".to_string(), 1523.4)].into_iter().collect(),
            params: [("n_estimators".to_string(), "200".to_string())]
                .into_iter()
                .collect(),
        };
        store.write_run("run-1", &record).await.unwrap();
        assert_eq!(store.fetch_run("run-1").await.unwrap(), record);
    }

    #[tokio::test]
    async fn test_rejects_traversal() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalStore::new(dir.path());
        assert!(store.fetch_artifact("..", "scaler.json").await.is_err());
        assert!(store.fetch_artifact("run", "../../x").await.is_err());
        assert!(store.write_alias("model", "prod", "../x").await.is_err());
    }
}
