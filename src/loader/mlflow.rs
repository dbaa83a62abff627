//! MLflow tracking server client
//!
//! Only the three read endpoints serving needs: alias resolution, run
//! metadata and raw artifact download.

use std::collections::BTreeMap;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use serde::Deserialize;

use super::{ArtifactStore, RunRecord};

const ALIAS_ENDPOINT: &str = "api/2.0/mlflow/registered-models/alias";
const RUN_ENDPOINT: &str = "api/2.0/mlflow/runs/get";
const ARTIFACT_ENDPOINT: &str = "get-artifact";

/// Artifact store backed by an MLflow tracking server
#[derive(Debug, Clone)]
pub struct MlflowStore {
    client: reqwest::Client,
    base_url: String,
}

impl MlflowStore {
    pub fn new(tracking_uri: &str, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("pricer/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()
            .context("HTTP client initialization failed")?;

        Ok(Self {
            client,
            base_url: tracking_uri.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, endpoint: &str) -> String {
        format!("{}/{}", self.base_url, endpoint)
    }

    async fn get(&self, endpoint: &str, query: &[(&str, &str)]) -> Result<reqwest::Response> {
        let url = self.url(endpoint);
        let response = self
            .client
            .get(&url)
            .query(query)
            .send()
            .await
            .with_context(|| format!("request to {} failed", url))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ApiError>(&body)
                .map(|e| e.message)
                .unwrap_or(body);
            return Err(anyhow!("{} returned {}: {}", url, status, message));
        }
        Ok(response)
    }
}

#[async_trait]
impl ArtifactStore for MlflowStore {
    fn describe(&self) -> String {
        format!("mlflow:{}", self.base_url)
    }

    async fn resolve_alias(&self, model: &str, alias: &str) -> Result<String> {
        let response: AliasResponse = self
            .get(ALIAS_ENDPOINT, &[("name", model), ("alias", alias)])
            .await?
            .json()
            .await
            .context("invalid alias response")?;

        tracing::debug!(
            model,
            alias,
            version = response.model_version.version.as_deref().unwrap_or("?"),
            run_id = %response.model_version.run_id,
            "Resolved model alias"
        );
        Ok(response.model_version.run_id)
    }

    async fn fetch_artifact(&self, run_id: &str, path: &str) -> Result<Vec<u8>> {
        let bytes = self
            .get(ARTIFACT_ENDPOINT, &[("path", path), ("run_uuid", run_id)])
            .await?
            .bytes()
            .await
            .with_context(|| format!("failed to download artifact '{}'", path))?;
        Ok(bytes.to_vec())
    }

    async fn fetch_run(&self, run_id: &str) -> Result<RunRecord> {
        let response: RunResponse = self
            .get(RUN_ENDPOINT, &[("run_id", run_id)])
            .await?
            .json()
            .await
            .context("invalid run response")?;
        Ok(response.run.data.into())
    }
}

#[derive(Debug, Deserialize)]
struct ApiError {
    message: String,
}

#[derive(Debug, Deserialize)]
struct AliasResponse {
    model_version: ModelVersion,
}

#[derive(Debug, Deserialize)]
struct ModelVersion {
    run_id: String,
    #[serde(default)]
    version: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RunResponse {
    run: Run,
}

#[derive(Debug, Deserialize)]
struct Run {
    #[serde(default)]
    data: RunData,
}

#[derive(Debug, Default, Deserialize)]
struct RunData {
    #[serde(default)]
    metrics: Vec<Metric>,
    #[serde(default)]
    params: Vec<Param>,
}

#[derive(Debug, Deserialize)]
struct Metric {
    key: String,
    value: f64,
}

#[derive(Debug, Deserialize)]
struct Param {
    key: String,
    value: String,
}

impl From<RunData> for RunRecord {
    fn from(data: RunData) -> Self {
        // MLflow reports the latest value per metric key
        let metrics: BTreeMap<String, f64> =
            data.metrics.into_iter().map(|m| (m.key, m.value)).collect();
        let params = data.params.into_iter().map(|p| (p.key, p.value)).collect();
        RunRecord { metrics, params }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use axum::extract::Query;
    use axum::http::StatusCode;
    use axum::response::IntoResponse;
    use axum::routing::get;
    use axum::{Json, Router};

    use super::*;

    #[test]
    fn test_parse_run_response() {
        let json = r#"{
            "run": {
                "info": {"run_id": "abc", "status": "FINISHED"},
                "data": {
                    "metrics": [
                        {"key": "mae", "value": 1523.4, "timestamp": 1, "step": 0},
                        {"key": "r2_score", "value": 0.91, "timestamp": 1, "step": 0}
                    ],
                    "params": [{"key": "max_depth", "value": "6"}],
                    "tags": []
                }
            }
        }"#;
        let response: RunResponse = serde_json::from_str(json).unwrap();
        let record: RunRecord = response.run.data.into();
        assert_eq!(record.metrics["mae"], 1523.4);
        assert_eq!(record.metrics["r2_score"], 0.91);
        assert_eq!(record.params["max_depth"], "6");
    }

    #[test]
    fn test_parse_run_without_data() {
        let response: RunResponse = serde_json::from_str(r#"{"run": {"info": {}}}"#).unwrap();
        let record: RunRecord = response.run.data.into();
        assert!(record.metrics.is_empty());
        assert!(record.params.is_empty());
    }

    async fn alias(Query(q): Query<HashMap<String, String>>) -> axum::response::Response {
        if q.get("name").map(String::as_str) == Some("xgboost_regressor")
            && q.get("alias").map(String::as_str) == Some("prod")
        {
            Json(serde_json::json!({
                "model_version": {"name": "xgboost_regressor", "version": "7", "run_id": "run-7"}
            }))
            .into_response()
        } else {
            (
                StatusCode::NOT_FOUND,
                Json(serde_json::json!({
                    "error_code": "RESOURCE_DOES_NOT_EXIST",
                    "message": "alias not found"
                })),
            )
                .into_response()
        }
    }

    async fn artifact(Query(q): Query<HashMap<String, String>>) -> axum::response::Response {
        match (q.get("run_uuid"), q.get("path")) {
            (Some(run), Some(path)) if run == "run-7" && path == "model_features.json" => {
                r#"["horsepower"]"#.into_response()
            }
            _ => StatusCode::NOT_FOUND.into_response(),
        }
    }

    async fn run() -> Json<serde_json::Value> {
        Json(serde_json::json!({
            "run": {"data": {"metrics": [{"key": "rmse", "value": 2100.0}], "params": []}}
        }))
    }

    async fn mock_server() -> String {
        let app = Router::new()
            .route("/api/2.0/mlflow/registered-models/alias", get(alias))
            .route("/api/2.0/mlflow/runs/get", get(run))
            .route("/get-artifact", get(artifact));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}/", addr)
    }

    #[tokio::test]
    async fn test_store_against_mock_server() {
        let uri = mock_server().await;
        let store = MlflowStore::new(&uri, Duration::from_secs(5)).unwrap();
        assert!(store.describe().starts_with("mlflow:http://127.0.0.1:"));

        let run_id = store.resolve_alias("xgboost_regressor", "prod").await.unwrap();
        assert_eq!(run_id, "run-7");

        let err = store
            .resolve_alias("xgboost_regressor", "staging")
            .await
            .unwrap_err();
        assert!(err.to_string().contains("alias not found"));

        let bytes = store
            .fetch_artifact("run-7", "model_features.json")
            .await
            .unwrap();
        assert_eq!(bytes, br#"["horsepower"]"#.to_vec());
        assert!(store.fetch_artifact("run-7", "scaler.json").await.is_err());

        let record = store.fetch_run("run-7").await.unwrap();
        assert_eq!(record.metrics["rmse"], 2100.0);
    }
}
