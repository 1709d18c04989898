//! Random-forest backend with a fixed sampling seed.
//!
//! Trees are grown on bootstrap samples with a per-tree feature subset, and
//! the ensemble probability is the mean of the per-tree leaf values. The
//! seed is fixed so repeated training runs agree.

use crate::model::tree::{DecisionTree, TreeParams};
use crate::model::Classifier;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

/// Trees grown by the fallback backend.
pub const FOREST_TREES: usize = 200;

/// Sampling seed shared by every training run.
pub const FOREST_SEED: u64 = 42;

/// Depth limit for individual forest trees.
const FOREST_TREE_DEPTH: usize = 8;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RandomForest {
    trees: Vec<DecisionTree>,
}

impl RandomForest {
    /// Fit with the default tree count and seed.
    pub fn fit(rows: &[Vec<f64>], labels: &[u8]) -> Self {
        Self::fit_with(rows, labels, FOREST_TREES, FOREST_SEED)
    }

    pub fn fit_with(rows: &[Vec<f64>], labels: &[u8], n_trees: usize, seed: u64) -> Self {
        if rows.is_empty() {
            return Self { trees: Vec::new() };
        }

        let n_rows = rows.len();
        let n_features = rows.first().map_or(0, |r| r.len());
        let subset_size = ((n_features as f64).sqrt().round() as usize).clamp(1, n_features.max(1));
        let targets: Vec<f64> = labels.iter().map(|&l| l as f64).collect();

        let mut rng = StdRng::seed_from_u64(seed);
        let mut trees = Vec::with_capacity(n_trees);
        for _ in 0..n_trees {
            let sample: Vec<usize> = (0..n_rows).map(|_| rng.gen_range(0..n_rows)).collect();
            let sample_rows: Vec<Vec<f64>> = sample.iter().map(|&i| rows[i].clone()).collect();
            let sample_targets: Vec<f64> = sample.iter().map(|&i| targets[i]).collect();

            let mut features: Vec<usize> = (0..n_features).collect();
            features.shuffle(&mut rng);
            features.truncate(subset_size);
            features.sort_unstable();

            let params = TreeParams {
                max_depth: FOREST_TREE_DEPTH,
                min_samples_split: 2,
                features: Some(features),
            };
            trees.push(DecisionTree::fit(&sample_rows, &sample_targets, &params));
        }

        Self { trees }
    }

    /// Probability of the positive class for one row.
    pub fn predict_proba_row(&self, row: &[f64]) -> f64 {
        if self.trees.is_empty() {
            return 0.0;
        }
        let total: f64 = self.trees.iter().map(|t| t.predict_row(row)).sum();
        total / self.trees.len() as f64
    }

    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }
}

impl Classifier for RandomForest {
    fn predict_proba(&self, rows: &[Vec<f64>]) -> Vec<f64> {
        rows.iter().map(|row| self.predict_proba_row(row)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn separable() -> (Vec<Vec<f64>>, Vec<u8>) {
        let rows: Vec<Vec<f64>> = (0..40)
            .map(|i| vec![i as f64, (3 * i % 11) as f64])
            .collect();
        let labels: Vec<u8> = (0..40).map(|i| (i >= 20) as u8).collect();
        (rows, labels)
    }

    #[test]
    fn test_same_seed_gives_identical_predictions() {
        let (rows, labels) = separable();
        let a = RandomForest::fit_with(&rows, &labels, 25, FOREST_SEED);
        let b = RandomForest::fit_with(&rows, &labels, 25, FOREST_SEED);
        for row in &rows {
            assert_eq!(a.predict_proba_row(row), b.predict_proba_row(row));
        }
    }

    #[test]
    fn test_separable_data_is_learned() {
        let (rows, labels) = separable();
        let model = RandomForest::fit_with(&rows, &labels, 50, FOREST_SEED);
        let correct = rows
            .iter()
            .zip(&labels)
            .filter(|(row, &label)| (model.predict_proba_row(row) >= 0.5) as u8 == label)
            .count();
        assert!(correct >= 38, "got {correct}/40 correct");
    }

    #[test]
    fn test_probabilities_stay_in_unit_interval() {
        let (rows, labels) = separable();
        let model = RandomForest::fit_with(&rows, &labels, 10, FOREST_SEED);
        for row in &rows {
            let proba = model.predict_proba_row(row);
            assert!((0.0..=1.0).contains(&proba));
        }
    }
}
