//! Local artifact mirror layout
//!
//! ```text
//! <root>/<model>/aliases.json           {"prod": "<run_id>", ...}
//! <root>/runs/<run_id>/run.json         {"metrics": {..}, "params": {..}}
//! <root>/runs/<run_id>/artifacts/<file>
//! ```

use std::collections::BTreeMap;
use std::path::{Component, Path, PathBuf};

use anyhow::{anyhow, bail, Result};

const RUNS_DIR: &str = "runs";
const ALIASES_FILE: &str = "aliases.json";
const RUN_FILE: &str = "run.json";
const ARTIFACTS_DIR: &str = "artifacts";

/// Path helpers for one mirror root
#[derive(Debug, Clone)]
pub struct Layout {
    root: PathBuf,
}

impl Layout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn aliases_path(&self, model: &str) -> Result<PathBuf> {
        check_name(model, "model name")?;
        Ok(self.root.join(model).join(ALIASES_FILE))
    }

    pub fn run_dir(&self, run_id: &str) -> Result<PathBuf> {
        check_name(run_id, "run id")?;
        Ok(self.root.join(RUNS_DIR).join(run_id))
    }

    pub fn run_record_path(&self, run_id: &str) -> Result<PathBuf> {
        Ok(self.run_dir(run_id)?.join(RUN_FILE))
    }

    pub fn artifact_path(&self, run_id: &str, artifact: &str) -> Result<PathBuf> {
        check_relative(artifact)?;
        Ok(self.run_dir(run_id)?.join(ARTIFACTS_DIR).join(artifact))
    }
}

/// A registered model found in the mirror
#[derive(Debug, Clone, PartialEq)]
pub struct ModelEntry {
    pub name: String,
    /// alias -> run id
    pub aliases: BTreeMap<String, String>,
}

/// Find registered models (directories holding an `aliases.json`)
pub fn scan_models(root: &Path) -> Result<Vec<ModelEntry>> {
    let mut models = Vec::new();
    if !root.is_dir() {
        return Ok(models);
    }

    for entry in std::fs::read_dir(root)? {
        let entry = entry?;
        let name = entry.file_name().to_string_lossy().to_string();
        if name == RUNS_DIR || !entry.path().is_dir() {
            continue;
        }
        let aliases_path = entry.path().join(ALIASES_FILE);
        if !aliases_path.exists() {
            continue;
        }
        let content = std::fs::read_to_string(&aliases_path)?;
        let aliases = serde_json::from_str(&content)
            .map_err(|e| anyhow!("invalid {}: {}", aliases_path.display(), e))?;
        models.push(ModelEntry { name, aliases });
    }

    models.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(models)
}

/// Run ids present in the mirror
pub fn scan_runs(root: &Path) -> Result<Vec<String>> {
    let runs_dir = root.join(RUNS_DIR);
    let mut runs = Vec::new();
    if !runs_dir.is_dir() {
        return Ok(runs);
    }
    for entry in std::fs::read_dir(&runs_dir)? {
        let entry = entry?;
        if entry.path().join(RUN_FILE).exists() {
            runs.push(entry.file_name().to_string_lossy().to_string());
        }
    }
    runs.sort();
    Ok(runs)
}

/// Model names and run ids become single path components
fn check_name(value: &str, what: &str) -> Result<()> {
    let valid = !value.is_empty()
        && value != "."
        && value != ".."
        && value
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'));
    if !valid {
        bail!("invalid {}: '{}'", what, value);
    }
    Ok(())
}

/// Artifact paths may nest but must stay inside the run
fn check_relative(path: &str) -> Result<()> {
    let p = Path::new(path);
    if path.is_empty() || !p.components().all(|c| matches!(c, Component::Normal(_))) {
        bail!("invalid artifact path: '{}'", path);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paths() {
        let layout = Layout::new("/srv/models");
        assert_eq!(
            layout.aliases_path("xgboost_regressor").unwrap(),
            PathBuf::from("/srv/models/xgboost_regressor/aliases.json")
        );
        assert_eq!(
            layout.artifact_path("3f2a", "scaler.json").unwrap(),
            PathBuf::from("/srv/models/runs/3f2a/artifacts/scaler.json")
        );
        assert_eq!(
            layout.artifact_path("3f2a", "preprocessing/scaler.json").unwrap(),
            PathBuf::from("/srv/models/runs/3f2a/artifacts/preprocessing/scaler.json")
        );
    }

    #[test]
    fn test_rejects_escaping_paths() {
        let layout = Layout::new("/srv/models");
        assert!(layout.run_dir("../etc").is_err());
        assert!(layout.run_dir("").is_err());
        assert!(layout.run_dir("..").is_err());
        assert!(layout.aliases_path("a/b").is_err());
        assert!(layout.artifact_path("run", "../run.json").is_err());
        assert!(layout.artifact_path("run", "/etc/passwd").is_err());
        assert!(layout.artifact_path("run", "").is_err());
    }

    #[test]
    fn test_scan_empty_root() {
        let dir = tempfile::tempdir().unwrap();
        assert!(scan_models(dir.path()).unwrap().is_empty());
        assert!(scan_runs(dir.path()).unwrap().is_empty());
        assert!(scan_models(&dir.path().join("missing")).unwrap().is_empty());
    }

    #[test]
    fn test_scan_models_and_runs() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();

        std::fs::create_dir_all(root.join("xgboost_regressor")).unwrap();
        std::fs::write(
            root.join("xgboost_regressor/aliases.json"),
            r#"{"prod": "run-b", "staging": "run-a"}"#,
        )
        .unwrap();
        std::fs::create_dir_all(root.join("not_a_model")).unwrap();
        for run in ["run-b", "run-a"] {
            std::fs::create_dir_all(root.join("runs").join(run)).unwrap();
            std::fs::write(root.join("runs").join(run).join("run.json"), "{}").unwrap();
        }
        std::fs::create_dir_all(root.join("runs/incomplete")).unwrap();

        let models = scan_models(root).unwrap();
        assert_eq!(models.len(), 1);
        assert_eq!(models[0].name, "xgboost_regressor");
        assert_eq!(models[0].aliases["prod"], "run-b");

        assert_eq!(scan_runs(root).unwrap(), vec!["run-a", "run-b"]);
    }
}
