//! Classifier backends and the persisted model artifact.
//!
//! This module contains:
//! - The regression tree both backends build on
//! - Gradient boosted trees (default backend) and the seeded random forest
//! - The JSON model artifact written after training and read at replay

pub mod boosting;
pub mod forest;
pub mod tree;

// Re-export commonly used types
pub use boosting::{GradientBoostedTrees, BOOST_LEARNING_RATE, BOOST_ROUNDS};
pub use forest::{RandomForest, FOREST_SEED, FOREST_TREES};
pub use tree::{DecisionTree, TreeNode, TreeParams};

use crate::error::PipelineError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;
use uuid::Uuid;

/// Probability threshold separating the two classes.
pub const DECISION_THRESHOLD: f64 = 0.5;

/// Common inference surface over both backends.
pub trait Classifier {
    /// Probability of the positive class for each row.
    fn predict_proba(&self, rows: &[Vec<f64>]) -> Vec<f64>;
}

/// Which backend a training run should use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BackendKind {
    BoostedTrees,
    TreeEnsemble,
}

impl BackendKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            BackendKind::BoostedTrees => "boosted-trees",
            BackendKind::TreeEnsemble => "tree-ensemble",
        }
    }
}

impl Default for BackendKind {
    fn default() -> Self {
        BackendKind::BoostedTrees
    }
}

impl std::fmt::Display for BackendKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for BackendKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "boosted-trees" => Ok(BackendKind::BoostedTrees),
            "tree-ensemble" => Ok(BackendKind::TreeEnsemble),
            other => Err(format!(
                "unknown backend '{other}', expected 'boosted-trees' or 'tree-ensemble'"
            )),
        }
    }
}

/// A fitted model of either backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum TrainedModel {
    BoostedTrees(GradientBoostedTrees),
    TreeEnsemble(RandomForest),
}

impl TrainedModel {
    /// Fit the requested backend on the training matrix.
    pub fn fit(kind: BackendKind, rows: &[Vec<f64>], labels: &[u8]) -> Self {
        match kind {
            BackendKind::BoostedTrees => {
                TrainedModel::BoostedTrees(GradientBoostedTrees::fit(rows, labels))
            }
            BackendKind::TreeEnsemble => TrainedModel::TreeEnsemble(RandomForest::fit(rows, labels)),
        }
    }

    pub fn backend(&self) -> BackendKind {
        match self {
            TrainedModel::BoostedTrees(_) => BackendKind::BoostedTrees,
            TrainedModel::TreeEnsemble(_) => BackendKind::TreeEnsemble,
        }
    }
}

impl Classifier for TrainedModel {
    fn predict_proba(&self, rows: &[Vec<f64>]) -> Vec<f64> {
        match self {
            TrainedModel::BoostedTrees(model) => model.predict_proba(rows),
            TrainedModel::TreeEnsemble(model) => model.predict_proba(rows),
        }
    }
}

/// Apply the decision threshold to a probability.
pub fn label_from_probability(proba: f64) -> u8 {
    (proba >= DECISION_THRESHOLD) as u8
}

/// The unit persisted after training and loaded at replay time.
///
/// The feature column list recorded here defines the vector layout replay
/// must reproduce, regardless of what the replay slice happens to contain.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelArtifact {
    /// Artifact identity, fresh per training run
    pub id: Uuid,
    /// When training finished
    pub trained_at: DateTime<Utc>,
    /// Feature columns in training order
    pub feature_columns: Vec<String>,
    /// The fitted model
    pub model: TrainedModel,
}

impl ModelArtifact {
    pub fn new(feature_columns: Vec<String>, model: TrainedModel) -> Self {
        Self {
            id: Uuid::new_v4(),
            trained_at: Utc::now(),
            feature_columns,
            model,
        }
    }
}

/// Write the artifact as JSON, replacing any previous one.
pub fn save_artifact(path: &Path, artifact: &ModelArtifact) -> Result<(), PipelineError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .map_err(|e| PipelineError::Io(format!("failed to create {}: {e}", parent.display())))?;
        }
    }
    let json = serde_json::to_string_pretty(artifact)
        .map_err(|e| PipelineError::Artifact(format!("failed to encode artifact: {e}")))?;
    std::fs::write(path, json)
        .map_err(|e| PipelineError::Io(format!("failed to write {}: {e}", path.display())))
}

/// Read an artifact back, distinguishing a missing file from a corrupt one.
pub fn load_artifact(path: &Path) -> Result<ModelArtifact, PipelineError> {
    if !path.exists() {
        return Err(PipelineError::ModelMissing(path.to_path_buf()));
    }
    let raw = std::fs::read_to_string(path)
        .map_err(|e| PipelineError::Io(format!("failed to read {}: {e}", path.display())))?;
    serde_json::from_str(&raw)
        .map_err(|e| PipelineError::Artifact(format!("corrupt artifact at {}: {e}", path.display())))
}
