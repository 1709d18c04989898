//! Windowed classifier training and evaluation.
//!
//! This module contains:
//! - The training orchestration over train/test time windows
//! - Confusion counts and zero-division-safe metrics
//! - Diagnostic chart rendering for the evaluation report

pub mod charts;
pub mod metrics;

pub use metrics::ConfusionCounts;

use crate::data::{
    ensure_timestamp, feature_matrix, label_vector, numeric_feature_columns, Dataset, Window,
    LABEL_COLUMN, TIMESTAMP_COLUMN,
};
use crate::error::PipelineError;
use crate::model::{
    label_from_probability, save_artifact, BackendKind, Classifier, ModelArtifact, TrainedModel,
};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// The train and test windows of one training call.
#[derive(Debug, Clone, Copy)]
pub struct TrainWindows {
    pub train: Window,
    pub test: Window,
}

/// Everything a training call reports back.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluationReport {
    pub accuracy: f64,
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    pub tp: usize,
    pub tn: usize,
    pub fp: usize,
    #[serde(rename = "fn")]
    pub fn_: usize,
    /// Accuracy progression chart, base64 SVG
    pub acc_plot: String,
    /// Confusion breakdown chart, base64 SVG
    pub conf_plot: String,
    /// Feature columns the model was fitted on, in training order
    pub feature_columns: Vec<String>,
    /// Where the model artifact was written
    pub model_path: String,
}

/// Train the configured backend on the train window and evaluate it on the
/// test window, persisting the fitted model to `model_path`.
///
/// The artifact is only written once slicing, label, and feature validation
/// have all passed, so a failed call leaves any prior artifact untouched.
/// Scoring uses the training feature layout for both slices; test-slice
/// columns outside it are ignored and absent ones fill 0.0.
pub fn train(
    dataset: &Dataset,
    windows: &TrainWindows,
    backend: BackendKind,
    model_path: &Path,
) -> Result<EvaluationReport, PipelineError> {
    let timed = ensure_timestamp(dataset.clone())?;
    let train_slice = timed.slice(&windows.train, "train")?;
    let test_slice = timed.slice(&windows.test, "test")?;

    if train_slice.data.column_index(LABEL_COLUMN).is_none() {
        return Err(PipelineError::MissingLabel);
    }

    let feature_columns =
        numeric_feature_columns(&train_slice.data, &[TIMESTAMP_COLUMN, LABEL_COLUMN])?;

    let y_train = label_vector(&train_slice.data)?;
    let y_test = label_vector(&test_slice.data)?;
    let x_train = feature_matrix(&train_slice.data, &feature_columns);
    let x_test = feature_matrix(&test_slice.data, &feature_columns);

    let model = TrainedModel::fit(backend, &x_train, &y_train);
    let artifact = ModelArtifact::new(feature_columns.clone(), model);
    save_artifact(model_path, &artifact)?;

    let probabilities = artifact.model.predict_proba(&x_test);
    let predicted: Vec<u8> = probabilities
        .iter()
        .map(|p| label_from_probability(*p))
        .collect();
    let counts = ConfusionCounts::from_predictions(&predicted, &y_test);

    let acc_plot = charts::accuracy_curve(counts.accuracy())?;
    let conf_plot = charts::confusion_pie(&counts)?;

    Ok(EvaluationReport {
        accuracy: counts.accuracy(),
        precision: counts.precision(),
        recall: counts.recall(),
        f1: counts.f1(),
        tp: counts.tp,
        tn: counts.tn,
        fp: counts.fp,
        fn_: counts.fn_,
        acc_plot,
        conf_plot,
        feature_columns,
        model_path: model_path.display().to_string(),
    })
}
