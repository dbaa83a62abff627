//! Errors surfaced by the inference executor

use thiserror::Error;

/// Failure conditions a caller of the executor must tell apart.
///
/// Input degradation (missing or malformed fields) is not an error: the codec
/// absorbs it by defaulting.
#[derive(Debug, Error)]
pub enum InferenceError {
    /// No valid artifact bundle is loaded
    #[error("model is not ready for predictions")]
    NotReady,

    /// The request itself was unusable (empty batch, strict validation)
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Preprocessing or prediction failed for the batch as a whole
    #[error("inference failed: {0}")]
    InferenceFailed(String),

    /// A refresh could not produce a complete, consistent bundle
    #[error("artifact load failed: {0}")]
    ArtifactLoadFailed(String),
}

impl InferenceError {
    /// Stable machine-readable error type
    pub fn kind(&self) -> &'static str {
        match self {
            InferenceError::NotReady => "model_not_ready",
            InferenceError::InvalidInput(_) => "invalid_request_error",
            InferenceError::InferenceFailed(_) => "inference_error",
            InferenceError::ArtifactLoadFailed(_) => "artifact_load_error",
        }
    }
}

pub type InferenceResult<T> = std::result::Result<T, InferenceError>;
