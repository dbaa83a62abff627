//! List models command

use std::path::PathBuf;

use anyhow::Result;

use crate::loader::{scan_models, scan_runs};

/// List models and runs in a local mirror
pub async fn list(dir: PathBuf) -> Result<()> {
    if !dir.exists() {
        println!("No models directory found at: {}", dir.display());
        println!("\nSet PRICER_ARTIFACT_DIR or run 'pricer pull' to create one.");
        return Ok(());
    }

    println!("Models in {}:\n", dir.display());

    let models = scan_models(&dir)?;
    if models.is_empty() {
        println!("  No models found.");
        println!("\nTo add models:");
        println!("  - Use 'pricer pull' to mirror the registry alias");
    }
    for model in &models {
        println!("  {}", model.name);
        for (alias, run_id) in &model.aliases {
            println!("    @{} -> {}", alias, run_id);
        }
    }

    let runs = scan_runs(&dir)?;
    if !runs.is_empty() {
        println!("\nRuns:");
        for run in runs {
            println!("  {}", run);
        }
    }

    Ok(())
}
