//! Model info command

use std::path::PathBuf;

use anyhow::Result;

use crate::loader::{load_bundle, open_store};

/// Show the bundle the configured alias resolves to
pub async fn info(config_path: Option<PathBuf>, local: bool) -> Result<()> {
    let config = super::load_config(config_path.as_deref(), local)?;
    let store = open_store(&config.registry)?;
    let bundle = load_bundle(store.as_ref(), &config.registry, &config.codec).await?;

    println!("Model: {}\n", config.registry.model_ref());
    println!("Store: {}", store.describe());
    println!("Run: {}", bundle.run_id());
    println!("Kind: {}", bundle.model().kind());

    let features = bundle.codec().model_features();
    println!("\nFeatures ({}):", features.len());
    for feature in features {
        println!("  {}", feature);
    }

    let quality = bundle.quality();
    println!("\nTraining metrics:");
    println!("  MAE:  {:.2}", quality.mae);
    println!("  RMSE: {:.2}", quality.rmse);
    println!("  MSE:  {:.2}", quality.mse);
    println!("  MAPE: {:.2}", quality.mape);
    println!("  R2:   {:.3}", quality.r2);

    let params = bundle.params();
    println!("\nParameters:");
    if let Some(model_type) = &params.model_type {
        println!("  Model type: {}", model_type);
    }
    if let Some(n) = params.n_estimators {
        println!("  Estimators: {}", n);
    }
    if let Some(depth) = params.max_depth {
        println!("  Max depth: {}", depth);
    }
    if let Some(lr) = params.learning_rate {
        println!("  Learning rate: {}", lr);
    }
    if let Some(scaling) = &params.scaling {
        println!("  Scaling: {}", scaling);
    }
    for (key, value) in &params.extra {
        println!("  {}: {}", key, value);
    }

    Ok(())
}
