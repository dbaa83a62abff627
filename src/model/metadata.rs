//! Training-time metadata recorded with a model run

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Error metrics computed at training time on the held-out split.
///
/// These are reported as-is; nothing is recomputed online.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ModelQuality {
    pub mae: f64,
    pub r2: f64,
    pub rmse: f64,
    pub mape: f64,
    pub mse: f64,
}

impl ModelQuality {
    /// Read quality from run metrics. Absent metrics are 0.
    pub fn from_run_metrics(metrics: &BTreeMap<String, f64>) -> Self {
        let get = |keys: &[&str]| {
            keys.iter()
                .find_map(|k| metrics.get(*k).copied())
                .unwrap_or(0.0)
        };
        Self {
            mae: get(&["mae"]),
            r2: get(&["r2", "r2_score"]),
            rmse: get(&["rmse"]),
            mape: get(&["mape"]),
            mse: get(&["mse"]),
        }
    }
}

/// Hyperparameters logged by the training run.
///
/// Populated from the run's string parameters; unknown keys are kept in
/// `extra` so nothing logged at training time is lost.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrainingParams {
    pub model_type: Option<String>,
    pub n_estimators: Option<u32>,
    pub max_depth: Option<u32>,
    pub learning_rate: Option<f64>,
    pub subsample: Option<f64>,
    pub colsample_bytree: Option<f64>,
    pub random_state: Option<u64>,
    pub test_size: Option<f64>,
    pub scaling: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub extra: BTreeMap<String, String>,
}

impl TrainingParams {
    pub fn from_run_params(params: &BTreeMap<String, String>) -> Self {
        let mut out = Self::default();
        for (key, value) in params {
            match key.as_str() {
                "model_type" => out.model_type = Some(value.clone()),
                "n_estimators" => out.n_estimators = value.parse().ok(),
                "max_depth" => out.max_depth = value.parse().ok(),
                "learning_rate" => out.learning_rate = value.parse().ok(),
                "subsample" => out.subsample = value.parse().ok(),
                "colsample_bytree" => out.colsample_bytree = value.parse().ok(),
                "random_state" => out.random_state = value.parse().ok(),
                "test_size" => out.test_size = value.parse().ok(),
                "scaling" => out.scaling = Some(value.clone()),
                _ => {
                    out.extra.insert(key.clone(), value.clone());
                }
            }
        }
        out
    }
}
