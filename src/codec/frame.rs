//! Columnar working table used between codec stages

use std::collections::{BTreeMap, BTreeSet};

use super::record::{RawRecord, RawValue};

/// One column of the working table.
///
/// Columns start out `Raw` and are narrowed to `Numeric` or `Text` by the
/// imputation stage; encoders and the scaler only read narrowed columns.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Column {
    Raw(Vec<Option<RawValue>>),
    Numeric(Vec<Option<f64>>),
    Text(Vec<Option<String>>),
}

impl Column {
    /// Numeric reading of one cell
    pub(crate) fn number(&self, row: usize) -> Option<f64> {
        match self {
            Column::Raw(cells) => cells[row].as_ref().and_then(RawValue::as_number),
            Column::Numeric(cells) => cells[row],
            Column::Text(cells) => cells[row]
                .as_deref()
                .and_then(|s| s.trim().parse::<f64>().ok())
                .filter(|v| v.is_finite()),
        }
    }

    /// Categorical reading of one cell
    pub(crate) fn category(&self, row: usize) -> Option<String> {
        match self {
            Column::Raw(cells) => cells[row].as_ref().and_then(RawValue::as_category),
            Column::Numeric(cells) => cells[row].and_then(|v| RawValue::Number(v).as_category()),
            Column::Text(cells) => cells[row].clone().filter(|s| !s.is_empty()),
        }
    }
}

/// Rows x named columns, with deterministic (sorted) column order.
#[derive(Debug, Clone)]
pub(crate) struct Frame {
    rows: usize,
    columns: BTreeMap<String, Column>,
}

impl Frame {
    /// Build a frame from records. A column exists if any record carries it;
    /// rows lacking it get an empty cell.
    pub(crate) fn from_records(records: &[RawRecord]) -> Self {
        let names: BTreeSet<&str> = records.iter().flat_map(RawRecord::keys).collect();

        let columns = names
            .into_iter()
            .map(|name| {
                let cells = records.iter().map(|r| r.get(name).cloned()).collect();
                (name.to_string(), Column::Raw(cells))
            })
            .collect();

        Self {
            rows: records.len(),
            columns,
        }
    }

    pub(crate) fn rows(&self) -> usize {
        self.rows
    }

    pub(crate) fn names(&self) -> Vec<String> {
        self.columns.keys().cloned().collect()
    }

    pub(crate) fn contains(&self, name: &str) -> bool {
        self.columns.contains_key(name)
    }

    pub(crate) fn get(&self, name: &str) -> Option<&Column> {
        self.columns.get(name)
    }

    pub(crate) fn get_mut(&mut self, name: &str) -> Option<&mut Column> {
        self.columns.get_mut(name)
    }

    pub(crate) fn insert(&mut self, name: impl Into<String>, column: Column) {
        self.columns.insert(name.into(), column);
    }

    pub(crate) fn remove(&mut self, name: &str) -> Option<Column> {
        self.columns.remove(name)
    }

    /// Numeric value at `(name, row)`, if the column exists and is numeric
    pub(crate) fn numeric_cell(&self, name: &str, row: usize) -> Option<f64> {
        match self.columns.get(name)? {
            Column::Numeric(cells) => cells[row],
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_union_of_columns() {
        let records = vec![
            RawRecord::new().with("a", 1).with("b", "x"),
            RawRecord::new().with("b", "y").with("c", 2.5),
        ];
        let frame = Frame::from_records(&records);

        assert_eq!(frame.rows(), 2);
        assert_eq!(frame.names(), vec!["a", "b", "c"]);
        assert_eq!(frame.get("a").unwrap().number(1), None);
        assert_eq!(frame.get("c").unwrap().number(1), Some(2.5));
        assert_eq!(frame.get("b").unwrap().category(0).as_deref(), Some("x"));
    }

    #[test]
    fn test_numeric_cell_requires_numeric_column() {
        let mut frame = Frame::from_records(&[RawRecord::new().with("a", 3)]);
        assert_eq!(frame.numeric_cell("a", 0), None);

        frame.insert("a", Column::Numeric(vec![Some(3.0)]));
        assert_eq!(frame.numeric_cell("a", 0), Some(3.0));
        assert_eq!(frame.numeric_cell("missing", 0), None);
    }
}
