//! Raw records to model-ready feature vectors

use std::collections::HashSet;
use std::sync::Arc;

use anyhow::{bail, Context, Result};

use super::encoders::{OrdinalEncoder, StandardScaler, TargetEncoder};
use super::frame::{Column, Frame};
use super::record::RawRecord;
use super::schema::CodecSchema;

/// Ordered, named numeric columns in exactly the order the model was trained on.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureVector {
    names: Arc<[String]>,
    values: Vec<f64>,
}

impl FeatureVector {
    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        let idx = self.names.iter().position(|n| n == name)?;
        Some(self.values[idx])
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.names
            .iter()
            .map(String::as_str)
            .zip(self.values.iter().copied())
    }
}

/// Split a free-text car name into `(brand, type)`.
///
/// The first whitespace-separated token is the brand; the remaining tokens,
/// joined by single spaces, are the type. A one-token name gets
/// `unknown_type`, a blank name has no brand.
pub fn split_name(name: &str, unknown_type: &str) -> (Option<String>, String) {
    let mut tokens = name.split_whitespace();
    let brand = tokens.next().map(str::to_string);
    let rest = tokens.collect::<Vec<_>>().join(" ");
    let car_type = if rest.is_empty() {
        unknown_type.to_string()
    } else {
        rest
    };
    (brand, car_type)
}

/// Counts of silently degraded cells, logged per batch
#[derive(Debug, Default)]
struct Degradation {
    imputed: usize,
    missing_categories: usize,
    underivable: usize,
}

/// The feature codec.
///
/// Holds the fitted preprocessing artifacts of one training run and applies
/// them deterministically. Encoding never fails on input: malformed or
/// missing values degrade to the batch median, the `missing` sentinel, or 0.
#[derive(Debug, Clone)]
pub struct FeatureCodec {
    schema: CodecSchema,
    scaler: StandardScaler,
    target_encoder: TargetEncoder,
    ordinal_encoder: OrdinalEncoder,
    model_features: Arc<[String]>,
}

impl FeatureCodec {
    /// Create a codec from validated artifacts
    pub fn new(
        schema: CodecSchema,
        scaler: StandardScaler,
        target_encoder: TargetEncoder,
        ordinal_encoder: OrdinalEncoder,
        model_features: Vec<String>,
    ) -> Result<Self> {
        scaler.validate().context("invalid scaler")?;
        target_encoder
            .validate()
            .context("invalid target encoder")?;
        ordinal_encoder
            .validate()
            .context("invalid ordinal encoder")?;

        if model_features.is_empty() {
            bail!("model feature list is empty");
        }
        {
            let mut seen = HashSet::new();
            if let Some(dup) = model_features.iter().find(|f| !seen.insert(f.as_str())) {
                bail!("model feature list contains '{}' more than once", dup);
            }
        }

        for column in &schema.scaled_columns {
            if !scaler.columns().contains(column) {
                tracing::warn!(column = %column, "Scaler was not fitted on column; values pass through unscaled");
            }
        }

        Ok(Self {
            schema,
            scaler,
            target_encoder,
            ordinal_encoder,
            model_features: model_features.into(),
        })
    }

    pub fn schema(&self) -> &CodecSchema {
        &self.schema
    }

    pub fn model_features(&self) -> &[String] {
        &self.model_features
    }

    pub fn scaler(&self) -> &StandardScaler {
        &self.scaler
    }

    pub fn target_encoder(&self) -> &TargetEncoder {
        &self.target_encoder
    }

    pub fn ordinal_encoder(&self) -> &OrdinalEncoder {
        &self.ordinal_encoder
    }

    /// Encode a single record (a batch of one)
    pub fn encode(&self, record: &RawRecord) -> FeatureVector {
        self.encode_batch(std::slice::from_ref(record))
            .pop()
            .unwrap_or_else(|| self.zero_vector())
    }

    /// Encode a batch. Output has the same length and order as the input.
    ///
    /// Numeric imputation uses medians of this batch, so the same record can
    /// encode differently depending on which rows accompany it.
    pub fn encode_batch(&self, records: &[RawRecord]) -> Vec<FeatureVector> {
        let mut frame = Frame::from_records(records);
        let mut degradation = Degradation::default();

        self.prune_columns(&mut frame);
        self.decompose_name(&mut frame);
        self.impute(&mut frame, &mut degradation);
        self.encode_categoricals(&mut frame);
        self.scale(&mut frame);
        let vectors = self.reconcile(&frame, &mut degradation);

        tracing::debug!(
            rows = records.len(),
            imputed = degradation.imputed,
            missing_categories = degradation.missing_categories,
            zero_filled = degradation.underivable,
            "Encoded feature batch"
        );

        vectors
    }

    fn zero_vector(&self) -> FeatureVector {
        FeatureVector {
            names: Arc::clone(&self.model_features),
            values: vec![0.0; self.model_features.len()],
        }
    }

    fn prune_columns(&self, frame: &mut Frame) {
        for column in &self.schema.dropped_columns {
            frame.remove(column);
        }
    }

    fn decompose_name(&self, frame: &mut Frame) {
        let Some(names) = frame.remove(&self.schema.name_column) else {
            return;
        };

        let mut brands = Vec::with_capacity(frame.rows());
        let mut types = Vec::with_capacity(frame.rows());
        for row in 0..frame.rows() {
            match names.category(row) {
                Some(name) => {
                    let (brand, car_type) = split_name(&name, &self.schema.unknown_type);
                    brands.push(brand);
                    types.push(Some(car_type));
                }
                None => {
                    brands.push(None);
                    types.push(None);
                }
            }
        }

        frame.insert(self.schema.brand_column.clone(), Column::Text(brands));
        frame.insert(self.schema.type_column.clone(), Column::Text(types));
    }

    fn impute(&self, frame: &mut Frame, degradation: &mut Degradation) {
        let rows = frame.rows();

        for name in frame.names() {
            let Some(column) = frame.get(&name) else {
                continue;
            };

            let imputed = if self.schema.is_categorical(&name) {
                let cells = (0..rows)
                    .map(|row| {
                        column.category(row).or_else(|| {
                            degradation.missing_categories += 1;
                            Some(self.schema.missing_category.clone())
                        })
                    })
                    .collect();
                Column::Text(cells)
            } else {
                let mut cells: Vec<Option<f64>> = (0..rows).map(|row| column.number(row)).collect();
                let fill = median(cells.iter().flatten().copied());
                for cell in cells.iter_mut().filter(|c| c.is_none()) {
                    if fill.is_some() {
                        degradation.imputed += 1;
                    }
                    *cell = fill;
                }
                Column::Numeric(cells)
            };

            frame.insert(name, imputed);
        }
    }

    fn encode_categoricals(&self, frame: &mut Frame) {
        let rows = frame.rows();

        for column in &self.schema.target_columns {
            if !self.target_encoder.fitted_on(column) {
                continue;
            }
            if let Some(levels) = frame.remove(column) {
                let encoded = (0..rows)
                    .map(|row| {
                        levels
                            .category(row)
                            .and_then(|level| self.target_encoder.transform(column, &level))
                    })
                    .collect();
                frame.insert(self.schema.encoded_name(column), Column::Numeric(encoded));
            }
        }

        for column in &self.schema.ordinal_columns {
            if !self.ordinal_encoder.fitted_on(column) {
                continue;
            }
            if let Some(levels) = frame.remove(column) {
                let encoded = (0..rows)
                    .map(|row| {
                        levels
                            .category(row)
                            .and_then(|level| self.ordinal_encoder.transform(column, &level))
                    })
                    .collect();
                frame.insert(self.schema.encoded_name(column), Column::Numeric(encoded));
            }
        }
    }

    fn scale(&self, frame: &mut Frame) {
        for column in &self.schema.scaled_columns {
            if let Some(Column::Numeric(cells)) = frame.get_mut(column) {
                for value in cells.iter_mut().flatten() {
                    if let Some(scaled) = self.scaler.transform(column, *value) {
                        *value = scaled;
                    }
                }
            }
        }
    }

    fn reconcile(&self, frame: &Frame, degradation: &mut Degradation) -> Vec<FeatureVector> {
        (0..frame.rows())
            .map(|row| {
                let values = self
                    .model_features
                    .iter()
                    .map(|feature| {
                        frame.numeric_cell(feature, row).unwrap_or_else(|| {
                            if frame.contains(feature) {
                                degradation.underivable += 1;
                            }
                            0.0
                        })
                    })
                    .collect();
                FeatureVector {
                    names: Arc::clone(&self.model_features),
                    values,
                }
            })
            .collect()
    }
}

/// Median of the values; mean of the two middle values for an even count.
fn median(values: impl Iterator<Item = f64>) -> Option<f64> {
    let mut sorted: Vec<f64> = values.collect();
    if sorted.is_empty() {
        return None;
    }
    sorted.sort_by(f64::total_cmp);
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        Some((sorted[mid - 1] + sorted[mid]) / 2.0)
    } else {
        Some(sorted[mid])
    }
}
