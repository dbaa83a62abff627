//! Feature codec
//!
//! Turns loosely-typed raw records into the fixed-order numeric feature
//! vectors a trained model expects. Stages run in a fixed order:
//!
//! 1. column pruning
//! 2. name decomposition (brand / type)
//! 3. missing-value imputation (batch median, `missing` sentinel)
//! 4. categorical encoding (target-style and ordinal-style encoders)
//! 5. numeric scaling (persisted standard scaler)
//! 6. shape reconciliation against the persisted feature list
//!
//! The codec is pure and holds no mutable state, so one instance can be
//! shared across threads.

mod encoders;
mod frame;
mod pipeline;
mod record;
mod schema;

pub use encoders::{OrdinalEncoder, StandardScaler, TargetEncoder};
pub use pipeline::{split_name, FeatureCodec, FeatureVector};
pub use record::{RawRecord, RawValue};
pub use schema::CodecSchema;
