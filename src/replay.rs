//! Replay of a historical dataset window as a paced prediction stream.
//!
//! A prepared replay owns its slice and its loaded model, so a retrain that
//! overwrites the artifact on disk never affects a stream already running.
//! The stream is pull-based: dropping it stops the loop.

use crate::data::{ensure_timestamp, feature_matrix, Dataset, TimedDataset, Value, ID_COLUMN};
use crate::data::Window;
use crate::error::PipelineError;
use crate::model::{label_from_probability, load_artifact, Classifier, ModelArtifact};
use futures_util::stream::{self, Stream};
use serde::Serialize;
use std::path::Path;
use std::time::Duration;

/// Sensor columns copied onto events under lowercase keys, when present.
const SENSOR_FIELDS: [&str; 3] = ["Temperature", "Pressure", "Humidity"];

/// One emitted prediction.
#[derive(Debug, Clone, Serialize)]
pub struct PredictionEvent {
    pub timestamp: String,
    /// `ID` column value when the dataset has one, else the row's position
    pub id: serde_json::Value,
    pub prediction: u8,
    pub confidence: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<Option<f64>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pressure: Option<Option<f64>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub humidity: Option<Option<f64>>,
}

/// A replay slice bound to the model that will score it.
#[derive(Debug)]
pub struct Replay {
    slice: TimedDataset,
    matrix: Vec<Vec<f64>>,
    artifact: ModelArtifact,
    pacing: Duration,
}

impl Replay {
    /// Load, normalize, and slice the dataset, and load the model artifact.
    ///
    /// Existence of both files is checked up front so a missing dataset and
    /// a missing model stay distinguishable. Feature vectors are laid out
    /// from the artifact's persisted training columns, not recomputed from
    /// the slice.
    pub fn prepare(
        dataset_path: &Path,
        model_path: &Path,
        window: &Window,
        pacing: Duration,
    ) -> Result<Self, PipelineError> {
        if !dataset_path.exists() {
            return Err(PipelineError::DatasetMissing(dataset_path.to_path_buf()));
        }
        if !model_path.exists() {
            return Err(PipelineError::ModelMissing(model_path.to_path_buf()));
        }

        let dataset = Dataset::from_csv_path(dataset_path)?;
        let timed = ensure_timestamp(dataset)?;
        let slice = timed.slice(window, "simulation")?;
        let artifact = load_artifact(model_path)?;
        let matrix = feature_matrix(&slice.data, &artifact.feature_columns);

        Ok(Self {
            slice,
            matrix,
            artifact,
            pacing,
        })
    }

    /// Number of events the stream will emit.
    pub fn len(&self) -> usize {
        self.slice.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slice.is_empty()
    }

    /// Score one row, degrading to a zero-confidence negative on bad output.
    fn event_at(&self, index: usize) -> PredictionEvent {
        let proba = self
            .artifact
            .model
            .predict_proba(&self.matrix[index..index + 1])
            .first()
            .copied()
            .filter(|p| p.is_finite())
            .unwrap_or_else(|| {
                tracing::warn!(row = index, "inference produced no usable probability");
                0.0
            });

        PredictionEvent {
            timestamp: self.slice.timestamp_text(index),
            id: self.row_id(index),
            prediction: label_from_probability(proba),
            confidence: proba,
            temperature: self.sensor_field(index, SENSOR_FIELDS[0]),
            pressure: self.sensor_field(index, SENSOR_FIELDS[1]),
            humidity: self.sensor_field(index, SENSOR_FIELDS[2]),
        }
    }

    /// Outer None when the column is absent, inner None when the value
    /// does not cast to a number.
    fn sensor_field(&self, row: usize, column: &str) -> Option<Option<f64>> {
        self.slice.data.column_index(column)?;
        Some(
            self.slice
                .data
                .value(row, column)
                .and_then(|cell| cell.as_f64()),
        )
    }

    /// The fallback is the row's position in the full dataset, not in the
    /// slice, so a window starting mid-dataset does not restart ids at 0.
    fn row_id(&self, row: usize) -> serde_json::Value {
        let position = self.slice.source_rows.get(row).copied().unwrap_or(row);
        match self.slice.data.value(row, ID_COLUMN) {
            Some(Value::Number(n)) if n.fract() == 0.0 && n.abs() < 9e15 => {
                serde_json::Value::from(*n as i64)
            }
            Some(Value::Number(n)) => serde_json::Number::from_f64(*n)
                .map_or_else(|| serde_json::Value::from(position), serde_json::Value::Number),
            Some(Value::Text(s)) => serde_json::Value::from(s.clone()),
            _ => serde_json::Value::from(position),
        }
    }

    /// Consume the replay into a finite paced stream of events.
    ///
    /// The first event is emitted immediately; each later one waits out the
    /// pacing delay first. No task is spawned, so dropping the stream on
    /// client disconnect stops the loop.
    pub fn into_stream(self) -> impl Stream<Item = PredictionEvent> {
        stream::unfold((self, 0usize), |(replay, index)| async move {
            if index >= replay.len() {
                return None;
            }
            if index > 0 {
                tokio::time::sleep(replay.pacing).await;
            }
            let event = replay.event_at(index);
            Some((event, (replay, index + 1)))
        })
    }
}
