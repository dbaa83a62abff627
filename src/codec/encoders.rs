//! Fitted preprocessing artifacts
//!
//! These are fitted once by the training pipeline and persisted next to the
//! model. Inference only ever applies them; nothing here is refit.

use std::collections::BTreeMap;

use anyhow::{anyhow, bail, Result};
use serde::{Deserialize, Serialize};

/// Standard scaler: `(x - mean) / scale` per column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandardScaler {
    columns: Vec<String>,
    mean: Vec<f64>,
    scale: Vec<f64>,
}

impl StandardScaler {
    pub fn new(columns: Vec<String>, mean: Vec<f64>, scale: Vec<f64>) -> Result<Self> {
        let scaler = Self {
            columns,
            mean,
            scale,
        };
        scaler.validate()?;
        Ok(scaler)
    }

    /// Check the fitted statistics are consistent and finite
    pub fn validate(&self) -> Result<()> {
        if self.mean.len() != self.columns.len() || self.scale.len() != self.columns.len() {
            bail!(
                "scaler has {} columns but {} means and {} scales",
                self.columns.len(),
                self.mean.len(),
                self.scale.len()
            );
        }
        if let Some(bad) = self
            .mean
            .iter()
            .chain(self.scale.iter())
            .find(|v| !v.is_finite())
        {
            bail!("scaler contains a non-finite statistic: {}", bad);
        }
        Ok(())
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Scale one value of `column`, or `None` if the scaler was not fitted on it
    pub fn transform(&self, column: &str, value: f64) -> Option<f64> {
        let idx = self.columns.iter().position(|c| c == column)?;
        // sklearn replaces zero variance with unit scale
        let scale = if self.scale[idx] == 0.0 {
            1.0
        } else {
            self.scale[idx]
        };
        Some((value - self.mean[idx]) / scale)
    }
}

/// Target-style encoder: per-column level -> learned value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TargetEncoder {
    columns: BTreeMap<String, BTreeMap<String, f64>>,
    /// Value for levels unseen at fit time; `None` leaves them underivable
    #[serde(default)]
    unknown_value: Option<f64>,
}

impl TargetEncoder {
    pub fn new(
        columns: BTreeMap<String, BTreeMap<String, f64>>,
        unknown_value: Option<f64>,
    ) -> Result<Self> {
        let encoder = Self {
            columns,
            unknown_value,
        };
        encoder.validate()?;
        Ok(encoder)
    }

    pub fn validate(&self) -> Result<()> {
        for (column, levels) in &self.columns {
            if let Some((level, value)) = levels.iter().find(|(_, v)| !v.is_finite()) {
                bail!(
                    "target encoder column '{}' level '{}' is not finite: {}",
                    column,
                    level,
                    value
                );
            }
        }
        if matches!(self.unknown_value, Some(v) if !v.is_finite()) {
            return Err(anyhow!("target encoder unknown_value is not finite"));
        }
        Ok(())
    }

    pub fn fitted_on(&self, column: &str) -> bool {
        self.columns.contains_key(column)
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.columns.keys().map(String::as_str)
    }

    /// Encode one level. `None` when the column is not fitted, or the level is
    /// unseen and no unknown value was configured.
    pub fn transform(&self, column: &str, level: &str) -> Option<f64> {
        let levels = self.columns.get(column)?;
        levels.get(level).copied().or(self.unknown_value)
    }
}

/// Ordinal-style encoder: level -> its index in the fitted category list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrdinalEncoder {
    columns: Vec<String>,
    categories: Vec<Vec<String>>,
    #[serde(default)]
    unknown_value: Option<f64>,
}

impl OrdinalEncoder {
    pub fn new(
        columns: Vec<String>,
        categories: Vec<Vec<String>>,
        unknown_value: Option<f64>,
    ) -> Result<Self> {
        let encoder = Self {
            columns,
            categories,
            unknown_value,
        };
        encoder.validate()?;
        Ok(encoder)
    }

    pub fn validate(&self) -> Result<()> {
        if self.categories.len() != self.columns.len() {
            bail!(
                "ordinal encoder has {} columns but {} category lists",
                self.columns.len(),
                self.categories.len()
            );
        }
        if matches!(self.unknown_value, Some(v) if !v.is_finite()) {
            bail!("ordinal encoder unknown_value is not finite");
        }
        Ok(())
    }

    pub fn fitted_on(&self, column: &str) -> bool {
        self.columns.iter().any(|c| c == column)
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn transform(&self, column: &str, level: &str) -> Option<f64> {
        let idx = self.columns.iter().position(|c| c == column)?;
        self.categories[idx]
            .iter()
            .position(|c| c == level)
            .map(|code| code as f64)
            .or(self.unknown_value)
    }
}
