//! Core inference engine
//!
//! - ArtifactBundle: one training run's model and preprocessing, validated together
//! - Executor: serves predictions from the active bundle and hot-swaps it on refresh

mod bundle;
mod executor;
#[cfg(test)]
pub(crate) mod fixtures;

pub use bundle::{ArtifactBundle, Prediction};
pub use executor::{Executor, ExecutorStatus, ModelIdentity};
