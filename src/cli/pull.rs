//! Mirror a registry bundle into a local directory

use std::path::PathBuf;

use anyhow::Result;

use crate::loader::{pull_bundle, LocalStore, MlflowStore};

/// Pull the configured alias from the MLflow registry
pub async fn pull(config_path: Option<PathBuf>, output: Option<PathBuf>) -> Result<()> {
    let config = super::load_config(config_path.as_deref(), false)?;
    let output_dir = output.unwrap_or_else(|| config.registry.artifact_dir.clone());

    let source = MlflowStore::new(&config.registry.tracking_uri, config.registry.request_timeout())?;
    let mirror = LocalStore::new(&output_dir);

    println!("Pulling {} from {}", config.registry.model_ref(), config.registry.tracking_uri);

    let run_id = pull_bundle(&source, &mirror, &config.registry, &config.codec).await?;

    println!("  Run: {}", run_id);
    for file in config.registry.artifacts.all() {
        println!("  Downloaded: {}", file);
    }
    println!("\nBundle mirrored to: {}", output_dir.display());
    println!("Serve it with 'pricer serve --local'");

    Ok(())
}
