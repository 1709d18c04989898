//! Timestamp normalization and inclusive time-window slicing.
//!
//! Datasets without a `synthetic_timestamp` column get one synthesized from
//! a fixed epoch at one row per second, so time windows always have a column
//! to key on.

use crate::data::table::{Dataset, Value, TIMESTAMP_COLUMN};
use crate::error::PipelineError;
use chrono::{Duration, NaiveDate, NaiveDateTime};

/// Accepted datetime layouts, tried in order. `%.f` tolerates an optional
/// fractional-second suffix.
const TIMESTAMP_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

/// Epoch used when synthesizing timestamps: 2021-01-01T00:00:00.
pub fn synthetic_epoch() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2021, 1, 1)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .unwrap_or_default()
}

/// Parse one timestamp value, accepting datetime or date-only layouts.
pub fn parse_timestamp(raw: &str) -> Result<NaiveDateTime, PipelineError> {
    let trimmed = raw.trim();
    for format in TIMESTAMP_FORMATS {
        if let Ok(ts) = NaiveDateTime::parse_from_str(trimmed, format) {
            return Ok(ts);
        }
    }
    if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        if let Some(ts) = date.and_hms_opt(0, 0, 0) {
            return Ok(ts);
        }
    }
    Err(PipelineError::Timestamp(format!(
        "unparseable value '{trimmed}'"
    )))
}

/// Render a timestamp the way event payloads expect it.
pub fn format_timestamp(ts: &NaiveDateTime) -> String {
    if ts.and_utc().timestamp_subsec_nanos() == 0 {
        ts.format("%Y-%m-%d %H:%M:%S").to_string()
    } else {
        ts.format("%Y-%m-%d %H:%M:%S%.f").to_string()
    }
}

/// An inclusive time window over row timestamps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

impl Window {
    pub fn new(start: NaiveDateTime, end: NaiveDateTime) -> Self {
        Self { start, end }
    }

    /// Parse a window from its textual bounds.
    pub fn parse(start: &str, end: &str) -> Result<Self, PipelineError> {
        Ok(Self {
            start: parse_timestamp(start)?,
            end: parse_timestamp(end)?,
        })
    }

    /// Check if a timestamp falls within this window. Both bounds included.
    pub fn contains(&self, ts: NaiveDateTime) -> bool {
        ts >= self.start && ts <= self.end
    }

    pub fn is_ordered(&self) -> bool {
        self.start <= self.end
    }
}

/// A dataset whose timestamp column has been parsed into typed form.
///
/// `timestamps` and `source_rows` hold one entry per row, parallel to
/// `data.rows`. `source_rows` records each row's position in the original
/// dataset and survives slicing, so a windowed row keeps its identity.
#[derive(Debug, Clone)]
pub struct TimedDataset {
    pub data: Dataset,
    pub timestamps: Vec<NaiveDateTime>,
    pub source_rows: Vec<usize>,
}

impl TimedDataset {
    /// Number of rows.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Rows whose timestamp falls inside the window, source order preserved.
    ///
    /// `window_name` labels the window in the empty-slice error.
    pub fn slice(&self, window: &Window, window_name: &str) -> Result<Self, PipelineError> {
        let indices: Vec<usize> = self
            .timestamps
            .iter()
            .enumerate()
            .filter(|(_, ts)| window.contains(**ts))
            .map(|(i, _)| i)
            .collect();

        if indices.is_empty() {
            return Err(PipelineError::EmptySlice {
                window: window_name.to_string(),
            });
        }

        Ok(Self {
            data: self.data.subset(&indices),
            timestamps: indices.iter().map(|&i| self.timestamps[i]).collect(),
            source_rows: indices.iter().map(|&i| self.source_rows[i]).collect(),
        })
    }

    /// Count of rows inside the window, without materializing a slice.
    pub fn count_in(&self, window: &Window) -> usize {
        self.timestamps.iter().filter(|ts| window.contains(**ts)).count()
    }

    /// Rendered timestamp for one row.
    pub fn timestamp_text(&self, row: usize) -> String {
        self.timestamps
            .get(row)
            .map(format_timestamp)
            .unwrap_or_default()
    }
}

/// Guarantee a parsed timestamp column on the dataset.
///
/// If `synthetic_timestamp` exists, every value must parse; a single bad
/// value fails the whole call rather than dropping rows. If it is absent,
/// timestamps are synthesized from the epoch at one second per row and the
/// column is materialized so later row access sees it.
pub fn ensure_timestamp(mut dataset: Dataset) -> Result<TimedDataset, PipelineError> {
    if let Some(idx) = dataset.column_index(TIMESTAMP_COLUMN) {
        let mut timestamps = Vec::with_capacity(dataset.len());
        for (row_index, row) in dataset.rows.iter().enumerate() {
            let ts = match row.get(idx) {
                Some(Value::Text(raw)) => parse_timestamp(raw).map_err(|e| {
                    PipelineError::Timestamp(format!("row {row_index}: {e}"))
                })?,
                Some(other) => {
                    return Err(PipelineError::Timestamp(format!(
                        "row {row_index}: unparseable value '{}'",
                        other.render()
                    )))
                }
                None => {
                    return Err(PipelineError::Timestamp(format!(
                        "row {row_index}: missing value"
                    )))
                }
            };
            timestamps.push(ts);
        }
        let source_rows = (0..dataset.len()).collect();
        return Ok(TimedDataset {
            data: dataset,
            timestamps,
            source_rows,
        });
    }

    let epoch = synthetic_epoch();
    let timestamps: Vec<NaiveDateTime> = (0..dataset.len())
        .map(|i| epoch + Duration::seconds(i as i64))
        .collect();
    let cells = timestamps
        .iter()
        .map(|ts| Value::Text(format_timestamp(ts)))
        .collect();
    dataset.push_column(TIMESTAMP_COLUMN, cells);

    let source_rows = (0..dataset.len()).collect();
    Ok(TimedDataset {
        data: dataset,
        timestamps,
        source_rows,
    })
}
