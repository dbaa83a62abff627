//! Offline batch prediction command

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tokio::io::AsyncReadExt;

use crate::codec::RawRecord;
use crate::engine::{Executor, ModelIdentity};
use crate::loader;
use crate::monitoring::InferenceMetrics;
use crate::server::{PredictResponse, PricePrediction};

/// Predict prices for the records in `input` and print them as JSON
pub async fn predict(input: PathBuf, config_path: Option<PathBuf>, local: bool) -> Result<()> {
    let config = super::load_config(config_path.as_deref(), local)?;
    let records = read_records(&input).await?;

    let executor = Executor::new(
        ModelIdentity::from(&config.registry),
        InferenceMetrics::new(),
    );
    let store = loader::open_store(&config.registry)?;
    executor
        .refresh(store.as_ref(), &config.registry, &config.codec)
        .await?;

    let predictions = executor.predict(records).await?;
    let response = PredictResponse {
        predictions: predictions
            .into_iter()
            .map(|p| PricePrediction {
                predicted_price: p.predicted_value,
            })
            .collect(),
    };
    println!("{}", serde_json::to_string_pretty(&response)?);

    Ok(())
}

async fn read_records(input: &Path) -> Result<Vec<RawRecord>> {
    let content = if input == Path::new("-") {
        let mut buf = String::new();
        tokio::io::stdin().read_to_string(&mut buf).await?;
        buf
    } else {
        tokio::fs::read_to_string(input)
            .await
            .with_context(|| format!("failed to read {}", input.display()))?
    };
    parse_records(&content)
}

/// A JSON array of records, or a single record object
fn parse_records(content: &str) -> Result<Vec<RawRecord>> {
    let value: serde_json::Value = serde_json::from_str(content).context("input is not JSON")?;
    let records = if value.is_array() {
        serde_json::from_value(value)?
    } else {
        vec![serde_json::from_value(value)?]
    };
    Ok(records)
}
