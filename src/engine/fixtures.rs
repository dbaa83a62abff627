//! Small bundle used by unit tests.
//!
//! Features: `horsepower` (scaled, mean 100, scale 10), `fueltype_encoded`
//! (diesel 0, gas 1) and `carbrand_encoded` (toyota 9000, bmw 30000, unseen
//! 15000). The linear model weights them 1000, 2000 and 1.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::codec::{
    CodecSchema, FeatureCodec, OrdinalEncoder, RawRecord, StandardScaler, TargetEncoder,
};
use crate::config::RegistryConfig;
use crate::engine::ArtifactBundle;
use crate::loader::{LocalStore, RunRecord};
use crate::model::{LinearModel, ModelQuality, SharedModel, TrainingParams};

pub(crate) const FEATURES: [&str; 3] = ["horsepower", "fueltype_encoded", "carbrand_encoded"];

pub(crate) fn codec() -> FeatureCodec {
    let brands: BTreeMap<String, f64> = [("toyota".to_string(), 9000.0), ("bmw".to_string(), 30000.0)]
        .into_iter()
        .collect();
    FeatureCodec::new(
        CodecSchema::default(),
        StandardScaler::new(vec!["horsepower".into()], vec![100.0], vec![10.0]).unwrap(),
        TargetEncoder::new([("carbrand".to_string(), brands)].into_iter().collect(), Some(15000.0))
            .unwrap(),
        OrdinalEncoder::new(
            vec!["fueltype".into()],
            vec![vec!["diesel".into(), "gas".into()]],
            None,
        )
        .unwrap(),
        FEATURES.iter().map(|f| f.to_string()).collect(),
    )
    .unwrap()
}

pub(crate) fn bundle_with_model(run_id: &str, model: SharedModel) -> ArtifactBundle {
    ArtifactBundle::new(
        run_id.to_string(),
        model,
        codec(),
        ModelQuality {
            mae: 1523.4,
            r2: 0.91,
            rmse: 2100.0,
            mape: 0.081,
            mse: 4_410_000.0,
        },
        TrainingParams::default(),
    )
    .unwrap()
}

pub(crate) fn bundle(run_id: &str, intercept: f64) -> ArtifactBundle {
    bundle_with_model(
        run_id,
        Arc::new(LinearModel::new(vec![1000.0, 2000.0, 1.0], intercept).unwrap()),
    )
}

/// Toyota, gas, 110 hp: `1000 * 1 + 2000 * 1 + 9000 + intercept`
pub(crate) fn toyota_gas() -> RawRecord {
    RawRecord::new()
        .with("CarName", "toyota corolla")
        .with("fueltype", "gas")
        .with("horsepower", 110.0)
}

/// Write the fixture bundle as JSON artifacts and point the configured
/// alias at it
pub(crate) async fn write_bundle(
    store: &LocalStore,
    config: &RegistryConfig,
    run_id: &str,
    intercept: f64,
) {
    let files = &config.artifacts;
    let artifacts = [
        (
            &files.model,
            serde_json::json!({
                "kind": "linear",
                "coefficients": [1000.0, 2000.0, 1.0],
                "intercept": intercept
            }),
        ),
        (
            &files.scaler,
            serde_json::json!({"columns": ["horsepower"], "mean": [100.0], "scale": [10.0]}),
        ),
        (
            &files.target_encoder,
            serde_json::json!({
                "columns": {"carbrand": {"toyota": 9000.0, "bmw": 30000.0}},
                "unknown_value": 15000.0
            }),
        ),
        (
            &files.ordinal_encoder,
            serde_json::json!({"columns": ["fueltype"], "categories": [["diesel", "gas"]]}),
        ),
        (&files.features, serde_json::json!(FEATURES)),
    ];
    for (path, value) in artifacts {
        store
            .write_artifact(run_id, path, &serde_json::to_vec(&value).unwrap())
            .await
            .unwrap();
    }

    let record = RunRecord {
        metrics: [("mae".to_string(), 1523.4), ("r2_score".to_string(), 0.91)]
            .into_iter()
            .collect(),
        params: [("n_estimators".to_string(), "200".to_string())]
            .into_iter()
            .collect(),
    };
    store.write_run(run_id, &record).await.unwrap();
    store
        .write_alias(&config.model_name, &config.alias, run_id)
        .await
        .unwrap();
}
