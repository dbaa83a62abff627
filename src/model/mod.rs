//! Trained regressors.
//!
//! The serving side only needs one contract from a model: given a feature
//! vector in training order, return a price. Models arrive as JSON artifacts
//! tagged by `kind`.

mod linear;
mod metadata;
mod tree;

pub use linear::LinearModel;
pub use metadata::{ModelQuality, TrainingParams};
pub use tree::{Aggregation, Node, Tree, TreeEnsemble};

use std::fmt::Debug;
use std::sync::Arc;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::codec::FeatureVector;

/// Trait for regressors served by pricer
pub trait TrainedModel: Send + Sync + Debug {
    /// Short model family name for logs and status output
    fn kind(&self) -> &'static str;

    /// Number of input features the model was trained on
    fn n_features(&self) -> usize;

    /// Predict one row
    fn predict(&self, features: &FeatureVector) -> Result<f64>;

    /// Predict a batch, one output per row, in order
    fn predict_batch(&self, rows: &[FeatureVector]) -> Result<Vec<f64>> {
        rows.iter().map(|row| self.predict(row)).collect()
    }
}

/// Shared model handle
pub type SharedModel = Arc<dyn TrainedModel>;

/// Serialized model artifact
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ModelArtifact {
    Linear(LinearModel),
    TreeEnsemble(TreeEnsemble),
}

impl ModelArtifact {
    pub fn from_json(bytes: &[u8]) -> Result<Self> {
        serde_json::from_slice(bytes).context("failed to parse model artifact")
    }

    /// Validate and turn the artifact into a servable model
    pub fn into_model(self) -> Result<SharedModel> {
        match self {
            ModelArtifact::Linear(model) => {
                model.validate()?;
                Ok(Arc::new(model))
            }
            ModelArtifact::TreeEnsemble(model) => {
                model.validate()?;
                Ok(Arc::new(model))
            }
        }
    }
}
