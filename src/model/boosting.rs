//! Gradient boosted trees with a binary logistic objective.
//!
//! Each round fits a shallow regression tree to the logistic residuals and
//! adds its shrunken output to the running log-odds score. Training has no
//! randomness, so identical inputs give identical models.

use crate::model::tree::{DecisionTree, TreeParams};
use crate::model::Classifier;
use serde::{Deserialize, Serialize};

/// Boosting rounds for the default backend.
pub const BOOST_ROUNDS: usize = 100;

/// Shrinkage applied to each tree's contribution.
pub const BOOST_LEARNING_RATE: f64 = 0.1;

/// Depth of each base tree.
const BASE_TREE_DEPTH: usize = 3;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GradientBoostedTrees {
    prior: f64,
    learning_rate: f64,
    trees: Vec<DecisionTree>,
}

impl GradientBoostedTrees {
    /// Fit with the default round count and learning rate.
    pub fn fit(rows: &[Vec<f64>], labels: &[u8]) -> Self {
        Self::fit_with(rows, labels, BOOST_ROUNDS, BOOST_LEARNING_RATE)
    }

    pub fn fit_with(rows: &[Vec<f64>], labels: &[u8], rounds: usize, learning_rate: f64) -> Self {
        if rows.is_empty() {
            return Self {
                prior: 0.0,
                learning_rate,
                trees: Vec::new(),
            };
        }

        let positives = labels.iter().filter(|&&l| l == 1).count() as f64;
        let rate = (positives / rows.len() as f64).clamp(1e-6, 1.0 - 1e-6);
        let prior = (rate / (1.0 - rate)).ln();

        let params = TreeParams {
            max_depth: BASE_TREE_DEPTH,
            min_samples_split: 2,
            features: None,
        };
        let mut scores = vec![prior; rows.len()];
        let mut trees = Vec::with_capacity(rounds);
        for _ in 0..rounds {
            let residuals: Vec<f64> = scores
                .iter()
                .zip(labels)
                .map(|(score, &label)| label as f64 - sigmoid(*score))
                .collect();
            let tree = DecisionTree::fit(rows, &residuals, &params);
            for (score, row) in scores.iter_mut().zip(rows) {
                *score += learning_rate * tree.predict_row(row);
            }
            trees.push(tree);
        }

        Self {
            prior,
            learning_rate,
            trees,
        }
    }

    /// Probability of the positive class for one row.
    pub fn predict_proba_row(&self, row: &[f64]) -> f64 {
        let mut score = self.prior;
        for tree in &self.trees {
            score += self.learning_rate * tree.predict_row(row);
        }
        sigmoid(score)
    }

    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }
}

impl Classifier for GradientBoostedTrees {
    fn predict_proba(&self, rows: &[Vec<f64>]) -> Vec<f64> {
        rows.iter().map(|row| self.predict_proba_row(row)).collect()
    }
}

pub(crate) fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}
