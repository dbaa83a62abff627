//! A loaded, validated model bundle

use anyhow::{bail, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::codec::{FeatureCodec, RawRecord};
use crate::error::{InferenceError, InferenceResult};
use crate::model::{ModelQuality, SharedModel, TrainingParams};

/// One predicted price
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Prediction {
    pub predicted_value: f64,
}

/// Model, fitted preprocessing and run metadata from one training run.
///
/// Immutable once built; a refresh replaces the whole bundle.
#[derive(Debug)]
pub struct ArtifactBundle {
    run_id: String,
    model: SharedModel,
    codec: FeatureCodec,
    quality: ModelQuality,
    params: TrainingParams,
    loaded_at: DateTime<Utc>,
}

impl ArtifactBundle {
    pub fn new(
        run_id: String,
        model: SharedModel,
        codec: FeatureCodec,
        quality: ModelQuality,
        params: TrainingParams,
    ) -> Result<Self> {
        let features = codec.model_features().len();
        if model.n_features() != features {
            bail!(
                "model expects {} features but the feature list has {}",
                model.n_features(),
                features
            );
        }
        Ok(Self {
            run_id,
            model,
            codec,
            quality,
            params,
            loaded_at: Utc::now(),
        })
    }

    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    pub fn model(&self) -> &SharedModel {
        &self.model
    }

    pub fn codec(&self) -> &FeatureCodec {
        &self.codec
    }

    pub fn quality(&self) -> &ModelQuality {
        &self.quality
    }

    pub fn params(&self) -> &TrainingParams {
        &self.params
    }

    pub fn loaded_at(&self) -> DateTime<Utc> {
        self.loaded_at
    }

    /// Encode and predict a batch in one synchronous pass.
    ///
    /// All or nothing: a failing row fails the batch.
    pub fn infer(&self, records: &[RawRecord]) -> InferenceResult<Vec<Prediction>> {
        let rows = self.codec.encode_batch(records);
        let values = self
            .model
            .predict_batch(&rows)
            .map_err(|e| InferenceError::InferenceFailed(format!("{:#}", e)))?;

        if values.len() != records.len() {
            return Err(InferenceError::InferenceFailed(format!(
                "model returned {} predictions for {} records",
                values.len(),
                records.len()
            )));
        }
        if let Some(row) = values.iter().position(|v| !v.is_finite()) {
            return Err(InferenceError::InferenceFailed(format!(
                "non-finite prediction for row {}",
                row
            )));
        }

        Ok(values
            .into_iter()
            .map(|predicted_value| Prediction { predicted_value })
            .collect())
    }
}
