//! Row-major tabular dataset loaded from CSV.
//!
//! Column typing mirrors dataframe semantics: a column is numeric when every
//! non-missing cell parses as a float, and an all-missing column counts as
//! numeric.

use crate::error::PipelineError;
use csv::ReaderBuilder;
use std::path::Path;

/// Name of the datetime column windows are keyed on.
pub const TIMESTAMP_COLUMN: &str = "synthetic_timestamp";

/// Name of the binary label column.
pub const LABEL_COLUMN: &str = "Response";

/// Optional row-identity column surfaced in replay events.
pub const ID_COLUMN: &str = "ID";

/// One parsed CSV cell.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Number(f64),
    Text(String),
    Missing,
}

impl Value {
    /// Parse a raw CSV field. Empty fields and NaN become missing.
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Value::Missing;
        }
        match trimmed.parse::<f64>() {
            Ok(n) if n.is_nan() => Value::Missing,
            Ok(n) => Value::Number(n),
            Err(_) => Value::Text(raw.to_string()),
        }
    }

    /// Numeric view of the cell, if it has one.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, Value::Missing)
    }

    /// Text rendering used for event payloads and id fields.
    pub fn render(&self) -> String {
        match self {
            Value::Number(n) => {
                if n.fract() == 0.0 && n.abs() < 1e15 {
                    format!("{}", *n as i64)
                } else {
                    format!("{n}")
                }
            }
            Value::Text(s) => s.clone(),
            Value::Missing => String::new(),
        }
    }
}

/// In-memory dataset: ordered column names plus row-major cells.
///
/// Row order is source order and is preserved through every transform.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Value>>,
}

impl Dataset {
    /// Load a dataset from a CSV file with a header row.
    pub fn from_csv_path(path: &Path) -> Result<Self, PipelineError> {
        if !path.exists() {
            return Err(PipelineError::DatasetMissing(path.to_path_buf()));
        }
        let reader = ReaderBuilder::new()
            .has_headers(true)
            .from_path(path)
            .map_err(|e| PipelineError::Csv(format!("failed to open {}: {e}", path.display())))?;
        Self::from_reader(reader)
    }

    /// Parse a dataset from CSV text with a header row.
    pub fn from_csv_str(text: &str) -> Result<Self, PipelineError> {
        let reader = ReaderBuilder::new()
            .has_headers(true)
            .from_reader(text.as_bytes());
        Self::from_reader(reader)
    }

    fn from_reader<R: std::io::Read>(mut reader: csv::Reader<R>) -> Result<Self, PipelineError> {
        let columns: Vec<String> = reader
            .headers()
            .map_err(|e| PipelineError::Csv(format!("failed to read headers: {e}")))?
            .iter()
            .map(|h| h.to_string())
            .collect();

        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record.map_err(|e| PipelineError::Csv(e.to_string()))?;
            rows.push(record.iter().map(Value::parse).collect());
        }

        Ok(Self { columns, rows })
    }

    /// Number of data rows (header excluded).
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Position of a column by exact name.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Cell at (row, column name), if both exist.
    pub fn value(&self, row: usize, column: &str) -> Option<&Value> {
        let idx = self.column_index(column)?;
        self.rows.get(row).and_then(|r| r.get(idx))
    }

    /// Whether every non-missing cell of the column parses as a number.
    ///
    /// An all-missing column is numeric, matching dataframe dtype inference.
    pub fn column_is_numeric(&self, idx: usize) -> bool {
        self.rows.iter().all(|row| match row.get(idx) {
            Some(Value::Number(_)) | Some(Value::Missing) | None => true,
            Some(Value::Text(_)) => false,
        })
    }

    /// New dataset containing the given rows, in the given order.
    pub fn subset(&self, indices: &[usize]) -> Self {
        Self {
            columns: self.columns.clone(),
            rows: indices.iter().map(|&i| self.rows[i].clone()).collect(),
        }
    }

    /// Serialize back to CSV with a header row. Missing cells write as
    /// empty fields.
    pub fn to_csv_string(&self) -> Result<String, PipelineError> {
        let mut writer = csv::Writer::from_writer(Vec::new());
        writer
            .write_record(&self.columns)
            .map_err(|e| PipelineError::Csv(e.to_string()))?;
        for row in &self.rows {
            let record: Vec<String> = row.iter().map(Value::render).collect();
            writer
                .write_record(&record)
                .map_err(|e| PipelineError::Csv(e.to_string()))?;
        }
        let bytes = writer
            .into_inner()
            .map_err(|e| PipelineError::Csv(e.to_string()))?;
        String::from_utf8(bytes).map_err(|e| PipelineError::Csv(e.to_string()))
    }

    /// Append a column; `cells` must have one entry per row.
    pub fn push_column(&mut self, name: &str, cells: Vec<Value>) {
        debug_assert_eq!(cells.len(), self.rows.len());
        self.columns.push(name.to_string());
        for (row, cell) in self.rows.iter_mut().zip(cells) {
            row.push(cell);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_value_parse_types() {
        assert_eq!(Value::parse("1.5"), Value::Number(1.5));
        assert_eq!(Value::parse("-3"), Value::Number(-3.0));
        assert_eq!(Value::parse(""), Value::Missing);
        assert_eq!(Value::parse("  "), Value::Missing);
        assert_eq!(Value::parse("NaN"), Value::Missing);
        assert_eq!(Value::parse("abc"), Value::Text("abc".to_string()));
    }

    #[test]
    fn test_csv_parse_shape() {
        let data = Dataset::from_csv_str("a,b,c\n1,x,3\n4,y,\n").unwrap();
        assert_eq!(data.columns, vec!["a", "b", "c"]);
        assert_eq!(data.len(), 2);
        assert_eq!(data.value(1, "c"), Some(&Value::Missing));
    }

    #[test]
    fn test_numeric_column_detection() {
        let data = Dataset::from_csv_str("num,text,gaps,blank\n1,x,2,\n3,7,,\n").unwrap();
        assert!(data.column_is_numeric(0));
        assert!(!data.column_is_numeric(1), "mixed text column is not numeric");
        assert!(data.column_is_numeric(2), "missing cells do not break numeric typing");
        assert!(data.column_is_numeric(3), "all-missing column counts as numeric");
    }

    #[test]
    fn test_missing_file_is_reported_as_missing_dataset() {
        let err = Dataset::from_csv_path(&PathBuf::from("/nonexistent/data.csv")).unwrap_err();
        assert!(matches!(err, PipelineError::DatasetMissing(_)));
    }

    #[test]
    fn test_subset_preserves_order() {
        let data = Dataset::from_csv_str("a\n10\n20\n30\n").unwrap();
        let picked = data.subset(&[2, 0]);
        assert_eq!(picked.rows[0][0], Value::Number(30.0));
        assert_eq!(picked.rows[1][0], Value::Number(10.0));
    }

    #[test]
    fn test_render_integers_without_fraction() {
        assert_eq!(Value::Number(42.0).render(), "42");
        assert_eq!(Value::Number(1.25).render(), "1.25");
    }

    #[test]
    fn test_csv_round_trip_keeps_missing_cells() {
        let data = Dataset::from_csv_str("a,b\n1,x\n,y\n").unwrap();
        let text = data.to_csv_string().unwrap();
        let reparsed = Dataset::from_csv_str(&text).unwrap();
        assert_eq!(reparsed.columns, data.columns);
        assert_eq!(reparsed.value(1, "a"), Some(&Value::Missing));
        assert_eq!(reparsed.value(0, "b"), Some(&Value::Text("x".to_string())));
    }
}
