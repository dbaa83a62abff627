//! Prediction and model-quality metrics

use std::time::Duration;

use metrics::{counter, gauge, histogram, Counter, Gauge, Histogram};

use crate::model::ModelQuality;

pub const PREDICTIONS_TOTAL: &str = "ml_predictions_total";
pub const PREDICTION_PRICE: &str = "ml_prediction_price_usd";
pub const MODEL_MAE: &str = "ml_model_mae";
pub const MODEL_R2: &str = "ml_model_r2";
pub const MODEL_RMSE: &str = "ml_model_rmse";
pub const MODEL_MAPE: &str = "ml_model_mape";
pub const MODEL_MSE: &str = "ml_model_mse";
pub const PREDICTION_REQUESTS: &str = "car_price_prediction_requests_total";
pub const PREDICTION_DURATION: &str = "car_price_prediction_duration_seconds";
pub const MODEL_LAST_UPDATED: &str = "car_price_model_last_updated_timestamp";
pub const MODEL_REFRESHES: &str = "car_price_model_refresh_total";

/// Metric handles used by the executor.
///
/// Handles bind to the recorder installed when they are created, so build
/// this after installing an exporter. Without a recorder every call is a
/// no-op.
#[derive(Clone)]
pub struct InferenceMetrics {
    /// One increment per predicted row
    pub predictions_total: Counter,
    /// Distribution of predicted prices
    pub prediction_price: Histogram,
    /// Wall time of a whole batch
    pub prediction_duration: Histogram,
    pub requests_success: Counter,
    pub requests_error: Counter,
    pub model_mae: Gauge,
    pub model_r2: Gauge,
    pub model_rmse: Gauge,
    pub model_mape: Gauge,
    pub model_mse: Gauge,
    pub model_last_updated: Gauge,
    pub refresh_success: Counter,
    pub refresh_failure: Counter,
}

impl Default for InferenceMetrics {
    fn default() -> Self {
        Self {
            predictions_total: counter!(PREDICTIONS_TOTAL),
            prediction_price: histogram!(PREDICTION_PRICE),
            prediction_duration: histogram!(PREDICTION_DURATION),
            requests_success: counter!(PREDICTION_REQUESTS, "status" => "success"),
            requests_error: counter!(PREDICTION_REQUESTS, "status" => "error"),
            model_mae: gauge!(MODEL_MAE),
            model_r2: gauge!(MODEL_R2),
            model_rmse: gauge!(MODEL_RMSE),
            model_mape: gauge!(MODEL_MAPE),
            model_mse: gauge!(MODEL_MSE),
            model_last_updated: gauge!(MODEL_LAST_UPDATED),
            refresh_success: counter!(MODEL_REFRESHES, "status" => "success"),
            refresh_failure: counter!(MODEL_REFRESHES, "status" => "error"),
        }
    }
}

impl InferenceMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a successful batch
    pub fn record_batch(&self, prices: &[f64], elapsed: Duration) {
        for price in prices {
            self.predictions_total.increment(1);
            self.prediction_price.record(*price);
        }
        self.prediction_duration.record(elapsed.as_secs_f64());
        self.requests_success.increment(1);
    }

    /// Record a batch that failed as a whole
    pub fn record_failure(&self, elapsed: Duration) {
        self.prediction_duration.record(elapsed.as_secs_f64());
        self.requests_error.increment(1);
    }

    /// Publish training-time quality of the newly installed model
    pub fn set_quality(&self, quality: &ModelQuality, loaded_at_unix: i64) {
        self.model_mae.set(quality.mae);
        self.model_r2.set(quality.r2);
        self.model_rmse.set(quality.rmse);
        self.model_mape.set(quality.mape);
        self.model_mse.set(quality.mse);
        self.model_last_updated.set(loaded_at_unix as f64);
    }

    pub fn record_refresh(&self, success: bool) {
        if success {
            self.refresh_success.increment(1);
        } else {
            self.refresh_failure.increment(1);
        }
    }
}
