//! HTTP request handlers

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Json, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use chrono::{DateTime, Utc};
use metrics_exporter_prometheus::PrometheusHandle;
use serde::{Deserialize, Serialize};

use crate::codec::{CodecSchema, RawRecord};
use crate::config::PricerConfig;
use crate::engine::Executor;
use crate::error::InferenceError;
use crate::loader::ArtifactStore;
use crate::model::{ModelQuality, TrainingParams};

/// Shared application state
pub struct AppState {
    pub executor: Arc<Executor>,
    pub store: Arc<dyn ArtifactStore>,
    pub config: PricerConfig,
    /// Renders `/metrics`; `None` when metrics are disabled
    pub prometheus: Option<PrometheusHandle>,
}

impl AppState {
    pub fn new(executor: Arc<Executor>, store: Arc<dyn ArtifactStore>, config: PricerConfig) -> Self {
        Self {
            executor,
            store,
            config,
            prometheus: None,
        }
    }

    pub fn with_prometheus(mut self, handle: PrometheusHandle) -> Self {
        self.prometheus = Some(handle);
        self
    }
}

impl IntoResponse for InferenceError {
    fn into_response(self) -> Response {
        let status = match &self {
            InferenceError::NotReady => StatusCode::SERVICE_UNAVAILABLE,
            InferenceError::InvalidInput(_) => StatusCode::UNPROCESSABLE_ENTITY,
            InferenceError::InferenceFailed(_) | InferenceError::ArtifactLoadFailed(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        (
            status,
            Json(ErrorResponse {
                error: ErrorDetail {
                    message: self.to_string(),
                    r#type: self.kind().to_string(),
                },
            }),
        )
            .into_response()
    }
}

/// API and model status
pub async fn root(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let status = state.executor.status().await;
    let quality = status.quality.unwrap_or_default();

    Json(RootResponse {
        api_status: "ok".to_string(),
        model_name: status.model.name,
        model_stage: status.model.alias,
        model_status: if status.ready {
            "ready".to_string()
        } else {
            "not ready (model/artifacts not loaded)".to_string()
        },
        run_id: status.run_id,
        model_performance: PerformanceSummary {
            mae: positive(quality.mae, format_usd),
            r2: positive(quality.r2, |v| format!("{:.3}", v)),
            rmse: positive(quality.rmse, format_usd),
            mape: positive(quality.mape, |v| format!("{:.2}%", v)),
            mse: positive(quality.mse, format_usd),
        },
    })
}

/// Health check endpoint
pub async fn health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(HealthResponse {
        status: "healthy".to_string(),
        model_loaded: state.executor.is_ready().await,
        timestamp: Utc::now(),
    })
}

/// Details of the active bundle
pub async fn model_info(State(state): State<Arc<AppState>>) -> Response {
    let Some(bundle) = state.executor.snapshot().await else {
        return InferenceError::NotReady.into_response();
    };

    Json(ModelInfoResponse {
        model: state.executor.identity().to_string(),
        run_id: bundle.run_id().to_string(),
        kind: bundle.model().kind().to_string(),
        loaded_at: bundle.loaded_at(),
        features: bundle.codec().model_features().to_vec(),
        quality: *bundle.quality(),
        params: bundle.params().clone(),
    })
    .into_response()
}

/// Batch price prediction
pub async fn predict(
    State(state): State<Arc<AppState>>,
    body: Result<Json<Vec<RawRecord>>, JsonRejection>,
) -> Response {
    let records = match body {
        Ok(Json(records)) => records,
        Err(rejection) => {
            return InferenceError::InvalidInput(rejection.body_text()).into_response();
        }
    };

    if state.config.server.strict_input {
        if let Err(e) = validate_strict(&records, &state.config.codec) {
            return e.into_response();
        }
    }

    match state.executor.predict(records).await {
        Ok(predictions) => Json(PredictResponse {
            predictions: predictions
                .into_iter()
                .map(|p| PricePrediction {
                    predicted_price: p.predicted_value,
                })
                .collect(),
        })
        .into_response(),
        Err(e) => e.into_response(),
    }
}

/// Reload the bundle from the configured store
pub async fn refresh_model(State(state): State<Arc<AppState>>) -> Response {
    let result = state
        .executor
        .refresh(
            state.store.as_ref(),
            &state.config.registry,
            &state.config.codec,
        )
        .await;

    match result {
        Ok(bundle) => Json(RefreshResponse {
            message: "Model refreshed successfully".to_string(),
            status: "success".to_string(),
            run_id: bundle.run_id().to_string(),
        })
        .into_response(),
        Err(e) => e.into_response(),
    }
}

/// Prometheus text exposition
pub async fn metrics(State(state): State<Arc<AppState>>) -> Response {
    match &state.prometheus {
        Some(handle) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            handle.render(),
        )
            .into_response(),
        None => (StatusCode::NOT_FOUND, "metrics disabled").into_response(),
    }
}

/// Reject records missing a required field or carrying a non-numeric value
/// in a scaled numeric field
fn validate_strict(records: &[RawRecord], schema: &CodecSchema) -> Result<(), InferenceError> {
    for (row, record) in records.iter().enumerate() {
        for column in schema.required_columns() {
            if record.get(column).map_or(true, |v| v.is_missing()) {
                return Err(InferenceError::InvalidInput(format!(
                    "record {}: missing required field '{}'",
                    row, column
                )));
            }
        }
        for column in &schema.scaled_columns {
            if let Some(value) = record.get(column) {
                if value.as_number().is_none() {
                    return Err(InferenceError::InvalidInput(format!(
                        "record {}: field '{}' is not numeric",
                        row, column
                    )));
                }
            }
        }
    }
    Ok(())
}

fn positive(value: f64, format: impl Fn(f64) -> String) -> String {
    if value.is_finite() && value > 0.0 {
        format(value)
    } else {
        "N/A".to_string()
    }
}

/// `$1,234.56`
fn format_usd(value: f64) -> String {
    let cents = (value * 100.0).round() as u64;
    let digits = (cents / 100).to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    format!("${}.{:02}", grouped, cents % 100)
}

// Request/Response types

#[derive(Debug, Serialize, Deserialize)]
pub struct RootResponse {
    pub api_status: String,
    pub model_name: String,
    pub model_stage: String,
    pub model_status: String,
    pub run_id: Option<String>,
    pub model_performance: PerformanceSummary,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PerformanceSummary {
    pub mae: String,
    pub r2: String,
    pub rmse: String,
    pub mape: String,
    pub mse: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub model_loaded: bool,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ModelInfoResponse {
    pub model: String,
    pub run_id: String,
    pub kind: String,
    pub loaded_at: DateTime<Utc>,
    pub features: Vec<String>,
    pub quality: ModelQuality,
    pub params: TrainingParams,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PredictResponse {
    pub predictions: Vec<PricePrediction>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PricePrediction {
    pub predicted_price: f64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RefreshResponse {
    pub message: String,
    pub status: String,
    pub run_id: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorDetail {
    pub message: String,
    pub r#type: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_usd() {
        assert_eq!(format_usd(1234.56), "$1,234.56");
        assert_eq!(format_usd(1523.4), "$1,523.40");
        assert_eq!(format_usd(999.999), "$1,000.00");
        assert_eq!(format_usd(4_410_000.0), "$4,410,000.00");
        assert_eq!(format_usd(12.0), "$12.00");
    }

    #[test]
    fn test_positive_or_na() {
        assert_eq!(positive(0.0, format_usd), "N/A");
        assert_eq!(positive(-1.0, format_usd), "N/A");
        assert_eq!(positive(f64::NAN, format_usd), "N/A");
        assert_eq!(positive(0.9123, |v| format!("{:.3}", v)), "0.912");
        assert_eq!(positive(8.1, |v| format!("{:.2}%", v)), "8.10%");
    }

    #[test]
    fn test_strict_validation() {
        let schema = CodecSchema::default();
        let mut record = RawRecord::new();
        for column in schema.required_columns() {
            record.insert(column, "1");
        }
        assert!(validate_strict(std::slice::from_ref(&record), &schema).is_ok());

        let mut bad_number = record.clone();
        bad_number.insert("horsepower", "fast");
        assert!(matches!(
            validate_strict(&[bad_number], &schema),
            Err(InferenceError::InvalidInput(_))
        ));

        let mut missing = record.clone();
        missing.insert("fueltype", crate::codec::RawValue::Missing);
        let err = validate_strict(&[record, missing], &schema).unwrap_err();
        assert!(err.to_string().contains("record 1"));
        assert!(err.to_string().contains("fueltype"));
    }

    #[test]
    fn test_error_status_mapping() {
        let cases = [
            (InferenceError::NotReady, StatusCode::SERVICE_UNAVAILABLE),
            (
                InferenceError::InvalidInput("x".into()),
                StatusCode::UNPROCESSABLE_ENTITY,
            ),
            (
                InferenceError::InferenceFailed("x".into()),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
            (
                InferenceError::ArtifactLoadFailed("x".into()),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (error, status) in cases {
            assert_eq!(error.into_response().status(), status);
        }
    }
}
