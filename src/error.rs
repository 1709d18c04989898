//! Error types shared across the training and replay pipeline.

use std::path::PathBuf;

/// Pipeline error types.
#[derive(Debug)]
pub enum PipelineError {
    /// Dataset file absent at the configured path
    DatasetMissing(PathBuf),
    /// Model artifact absent; nothing has been trained yet
    ModelMissing(PathBuf),
    /// Timestamp column value could not be parsed
    Timestamp(String),
    /// A time window matched zero rows
    EmptySlice { window: String },
    /// Label column absent from the training slice
    MissingLabel,
    /// No numeric feature columns remain after exclusions
    NoFeatures,
    /// Label column value could not be coerced to a binary class
    Label(String),
    /// CSV parsing error
    Csv(String),
    /// Model artifact could not be read or decoded
    Artifact(String),
    /// Filesystem error
    Io(String),
    /// Chart rendering error
    Render(String),
}

impl PipelineError {
    /// Stable machine-readable code for API error envelopes.
    pub fn code(&self) -> &'static str {
        match self {
            PipelineError::DatasetMissing(_) => "dataset_missing",
            PipelineError::ModelMissing(_) => "model_missing",
            PipelineError::Timestamp(_) => "bad_timestamp",
            PipelineError::EmptySlice { .. } => "empty_slice",
            PipelineError::MissingLabel => "missing_label",
            PipelineError::NoFeatures => "no_features",
            PipelineError::Label(_) => "bad_label",
            PipelineError::Csv(_) => "bad_csv",
            PipelineError::Artifact(_) => "bad_artifact",
            PipelineError::Io(_) => "io_error",
            PipelineError::Render(_) => "render_error",
        }
    }

    /// Whether the error is caused by the request rather than the service.
    pub fn is_client_error(&self) -> bool {
        !matches!(
            self,
            PipelineError::Io(_) | PipelineError::Render(_) | PipelineError::Artifact(_)
        )
    }
}

impl std::fmt::Display for PipelineError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PipelineError::DatasetMissing(_) => {
                write!(f, "Dataset not found on server")
            }
            PipelineError::ModelMissing(_) => {
                write!(f, "Trained model not found; train a model first")
            }
            PipelineError::Timestamp(msg) => write!(f, "Invalid timestamp: {msg}"),
            PipelineError::EmptySlice { window } => write!(f, "No rows in {window} window"),
            PipelineError::MissingLabel => write!(f, "Response column missing"),
            PipelineError::NoFeatures => write!(f, "No numeric features found for training"),
            PipelineError::Label(msg) => write!(f, "Invalid label value: {msg}"),
            PipelineError::Csv(msg) => write!(f, "CSV error: {msg}"),
            PipelineError::Artifact(msg) => write!(f, "Model artifact error: {msg}"),
            PipelineError::Io(msg) => write!(f, "I/O error: {msg}"),
            PipelineError::Render(msg) => write!(f, "Chart rendering error: {msg}"),
        }
    }
}

impl std::error::Error for PipelineError {}
