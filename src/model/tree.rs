//! Regression tree used as the base learner for both classifier backends.
//!
//! Splits minimize the summed squared error of the two sides. Leaves carry
//! the mean target of the rows that reached them, which doubles as a class
//! probability when targets are 0/1 labels.

use serde::{Deserialize, Serialize};

/// Minimum squared-error improvement for a split to be accepted.
const MIN_GAIN: f64 = 1e-12;

/// One node of a fitted tree.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum TreeNode {
    Leaf {
        value: f64,
    },
    Split {
        feature: usize,
        threshold: f64,
        left: Box<TreeNode>,
        right: Box<TreeNode>,
    },
}

/// Parameters controlling tree growth.
#[derive(Debug, Clone)]
pub struct TreeParams {
    /// Maximum number of split levels above a leaf
    pub max_depth: usize,
    /// Nodes with fewer rows become leaves
    pub min_samples_split: usize,
    /// Feature indices split search may use; `None` means all
    pub features: Option<Vec<usize>>,
}

/// A fitted regression tree.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionTree {
    root: TreeNode,
}

impl DecisionTree {
    /// Grow a tree on the given rows and targets.
    pub fn fit(rows: &[Vec<f64>], targets: &[f64], params: &TreeParams) -> Self {
        let indices: Vec<usize> = (0..rows.len()).collect();
        let features: Vec<usize> = match &params.features {
            Some(subset) => subset.clone(),
            None => (0..rows.first().map_or(0, |r| r.len())).collect(),
        };
        let root = build_node(rows, targets, &indices, &features, 0, params);
        Self { root }
    }

    /// Predicted value for one row.
    pub fn predict_row(&self, row: &[f64]) -> f64 {
        let mut node = &self.root;
        loop {
            match node {
                TreeNode::Leaf { value } => return *value,
                TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    let value = row.get(*feature).copied().unwrap_or(0.0);
                    node = if value <= *threshold { left } else { right };
                }
            }
        }
    }
}

fn build_node(
    rows: &[Vec<f64>],
    targets: &[f64],
    indices: &[usize],
    features: &[usize],
    depth: usize,
    params: &TreeParams,
) -> TreeNode {
    let leaf = TreeNode::Leaf {
        value: mean(targets, indices),
    };
    if depth >= params.max_depth || indices.len() < params.min_samples_split {
        return leaf;
    }

    let split = match best_split(rows, targets, indices, features) {
        Some(s) => s,
        None => return leaf,
    };

    let (left_idx, right_idx): (Vec<usize>, Vec<usize>) = indices
        .iter()
        .partition(|&&i| row_value(rows, i, split.feature) <= split.threshold);
    if left_idx.is_empty() || right_idx.is_empty() {
        return leaf;
    }

    TreeNode::Split {
        feature: split.feature,
        threshold: split.threshold,
        left: Box::new(build_node(
            rows, targets, &left_idx, features, depth + 1, params,
        )),
        right: Box::new(build_node(
            rows, targets, &right_idx, features, depth + 1, params,
        )),
    }
}

struct SplitCandidate {
    feature: usize,
    threshold: f64,
}

/// Exhaustive split search over sorted feature values.
fn best_split(
    rows: &[Vec<f64>],
    targets: &[f64],
    indices: &[usize],
    features: &[usize],
) -> Option<SplitCandidate> {
    let n = indices.len() as f64;
    let total: f64 = indices.iter().map(|&i| targets[i]).sum();
    let total_sq: f64 = indices.iter().map(|&i| targets[i] * targets[i]).sum();
    let parent_sse = total_sq - total * total / n;

    let mut best: Option<(f64, SplitCandidate)> = None;
    for &feature in features {
        let mut pairs: Vec<(f64, f64)> = indices
            .iter()
            .map(|&i| (row_value(rows, i, feature), targets[i]))
            .collect();
        pairs.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(std::cmp::Ordering::Equal));

        let mut left_sum = 0.0;
        let mut left_sq = 0.0;
        for (split_at, pair) in pairs.iter().enumerate() {
            left_sum += pair.1;
            left_sq += pair.1 * pair.1;

            let next = match pairs.get(split_at + 1) {
                Some(next) => next,
                None => break,
            };
            // Only cut between distinct feature values.
            if next.0 <= pair.0 {
                continue;
            }

            let left_n = (split_at + 1) as f64;
            let right_n = n - left_n;
            let right_sum = total - left_sum;
            let right_sq = total_sq - left_sq;
            let sse = (left_sq - left_sum * left_sum / left_n)
                + (right_sq - right_sum * right_sum / right_n);
            let gain = parent_sse - sse;
            if gain <= MIN_GAIN {
                continue;
            }

            let better = match &best {
                Some((best_gain, _)) => gain > *best_gain,
                None => true,
            };
            if better {
                best = Some((
                    gain,
                    SplitCandidate {
                        feature,
                        threshold: (pair.0 + next.0) / 2.0,
                    },
                ));
            }
        }
    }
    best.map(|(_, candidate)| candidate)
}

fn row_value(rows: &[Vec<f64>], row: usize, feature: usize) -> f64 {
    rows.get(row)
        .and_then(|r| r.get(feature))
        .copied()
        .unwrap_or(0.0)
}

fn mean(targets: &[f64], indices: &[usize]) -> f64 {
    if indices.is_empty() {
        return 0.0;
    }
    indices.iter().map(|&i| targets[i]).sum::<f64>() / indices.len() as f64
}
