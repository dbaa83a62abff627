//! Column layout the codec works against

use serde::{Deserialize, Serialize};

/// Describes which raw columns are dropped, derived, encoded and scaled.
///
/// The default is the car-price schema the production models were trained on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CodecSchema {
    /// Free-text name column split into brand and type
    #[serde(default = "default_name_column")]
    pub name_column: String,

    /// Column receiving the first name token
    #[serde(default = "default_brand_column")]
    pub brand_column: String,

    /// Column receiving the remaining name tokens
    #[serde(default = "default_type_column")]
    pub type_column: String,

    /// Type used when the name has a single token
    #[serde(default = "default_unknown_type")]
    pub unknown_type: String,

    /// Sentinel for empty or missing categorical values
    #[serde(default = "default_missing_category")]
    pub missing_category: String,

    /// Raw columns never used by the model
    #[serde(default = "default_dropped_columns")]
    pub dropped_columns: Vec<String>,

    /// High-cardinality columns for the target-style encoder
    #[serde(default = "default_target_columns")]
    pub target_columns: Vec<String>,

    /// Closed-vocabulary columns for the ordinal-style encoder
    #[serde(default = "default_ordinal_columns")]
    pub ordinal_columns: Vec<String>,

    /// Numeric columns passed through the persisted scaler
    #[serde(default = "default_scaled_columns")]
    pub scaled_columns: Vec<String>,

    /// Suffix marking encoded output columns
    #[serde(default = "default_encoded_suffix")]
    pub encoded_suffix: String,
}

fn default_name_column() -> String {
    "CarName".to_string()
}

fn default_brand_column() -> String {
    "carbrand".to_string()
}

fn default_type_column() -> String {
    "cartype".to_string()
}

fn default_unknown_type() -> String {
    "unknown".to_string()
}

fn default_missing_category() -> String {
    "missing".to_string()
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

fn default_dropped_columns() -> Vec<String> {
    strings(&[
        "car_ID",
        "symboling",
        "carlength",
        "carwidth",
        "enginesize",
        "curbweight",
        "highwaympg",
    ])
}

fn default_target_columns() -> Vec<String> {
    strings(&["cartype", "carbrand"])
}

fn default_ordinal_columns() -> Vec<String> {
    strings(&[
        "fueltype",
        "aspiration",
        "doornumber",
        "carbody",
        "drivewheel",
        "enginelocation",
        "cylindernumber",
        "fuelsystem",
        "enginetype",
    ])
}

fn default_scaled_columns() -> Vec<String> {
    strings(&["wheelbase", "carheight", "horsepower", "peakrpm", "citympg"])
}

fn default_encoded_suffix() -> String {
    "_encoded".to_string()
}

impl Default for CodecSchema {
    fn default() -> Self {
        Self {
            name_column: default_name_column(),
            brand_column: default_brand_column(),
            type_column: default_type_column(),
            unknown_type: default_unknown_type(),
            missing_category: default_missing_category(),
            dropped_columns: default_dropped_columns(),
            target_columns: default_target_columns(),
            ordinal_columns: default_ordinal_columns(),
            scaled_columns: default_scaled_columns(),
            encoded_suffix: default_encoded_suffix(),
        }
    }
}

impl CodecSchema {
    /// Whether a (post-decomposition) column is categorical
    pub fn is_categorical(&self, column: &str) -> bool {
        self.target_columns.iter().any(|c| c == column)
            || self.ordinal_columns.iter().any(|c| c == column)
    }

    pub fn is_dropped(&self, column: &str) -> bool {
        self.dropped_columns.iter().any(|c| c == column)
    }

    /// Name of the encoded output column for `column`
    pub fn encoded_name(&self, column: &str) -> String {
        format!("{}{}", column, self.encoded_suffix)
    }

    /// Raw fields a strictly validated record must carry
    pub fn required_columns(&self) -> Vec<&str> {
        let mut required = vec![self.name_column.as_str()];
        required.extend(
            self.ordinal_columns
                .iter()
                .chain(self.scaled_columns.iter())
                .map(String::as_str),
        );
        required
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let yaml = r#"
name_column: carname
scaled_columns: [horsepower]
"#;
        let schema: CodecSchema = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(schema.name_column, "carname");
        assert_eq!(schema.scaled_columns, vec!["horsepower".to_string()]);
        assert_eq!(schema.brand_column, "carbrand");
        assert_eq!(schema.ordinal_columns.len(), 9);
    }

    #[test]
    fn test_column_groups() {
        let schema = CodecSchema::default();
        assert!(schema.is_categorical("carbrand"));
        assert!(schema.is_categorical("fuelsystem"));
        assert!(!schema.is_categorical("horsepower"));
        assert!(schema.is_dropped("car_ID"));
        assert_eq!(schema.encoded_name("carbody"), "carbody_encoded");
        assert_eq!(schema.required_columns().len(), 15);
    }
}
