//! Pricer - car price inference server
//!
//! Serves a registry-managed regression model over HTTP. Raw, loosely-typed
//! car records go through a feature codec that reproduces the training
//! preprocessing, then through the model, one batch at a time.
//!
//! # Architecture
//!
//! - **codec**: raw records -> fixed-order feature vectors
//! - **model**: trained regressors loaded from JSON artifacts
//! - **loader**: artifact stores (MLflow registry, local mirror) and bundle assembly
//! - **engine**: the executor holding the active bundle, with hot refresh
//! - **server**: HTTP API and Prometheus endpoint
//!
//! # Example
//!
//! ```bash
//! # Start server against the registry
//! MLFLOW_TRACKING_URI=http://mlflow:5000 pricer serve --port 8005
//!
//! # Mirror the prod alias locally and serve offline
//! pricer pull --output ./models
//! pricer serve --local
//!
//! # One-off batch prediction
//! pricer predict --input cars.json --local
//! ```

pub mod cli;
pub mod codec;
pub mod config;
pub mod engine;
pub mod error;
pub mod loader;
pub mod model;
pub mod monitoring;
pub mod server;

// Re-export key types
pub use codec::{FeatureCodec, FeatureVector, RawRecord, RawValue};
pub use config::{PricerConfig, RegistryConfig, ServerConfig};
pub use engine::{ArtifactBundle, Executor, Prediction};
pub use error::{InferenceError, InferenceResult};
pub use loader::{load_bundle, ArtifactStore, LocalStore, MlflowStore};
