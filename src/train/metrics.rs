//! Confusion counts and threshold metrics with guarded divisions.
//!
//! Every ratio is defined as 0.0 when its denominator is 0, so degenerate
//! test slices evaluate instead of erroring.

/// The four cells of a binary confusion matrix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConfusionCounts {
    pub tp: usize,
    pub tn: usize,
    pub fp: usize,
    pub fn_: usize,
}

impl ConfusionCounts {
    /// Count outcomes over parallel predicted and actual labels.
    pub fn from_predictions(predicted: &[u8], actual: &[u8]) -> Self {
        let mut counts = Self {
            tp: 0,
            tn: 0,
            fp: 0,
            fn_: 0,
        };
        for (&p, &a) in predicted.iter().zip(actual) {
            match (p != 0, a != 0) {
                (true, true) => counts.tp += 1,
                (false, false) => counts.tn += 1,
                (true, false) => counts.fp += 1,
                (false, true) => counts.fn_ += 1,
            }
        }
        counts
    }

    pub fn total(&self) -> usize {
        self.tp + self.tn + self.fp + self.fn_
    }

    pub fn accuracy(&self) -> f64 {
        ratio((self.tp + self.tn) as f64, self.total() as f64)
    }

    pub fn precision(&self) -> f64 {
        ratio(self.tp as f64, (self.tp + self.fp) as f64)
    }

    pub fn recall(&self) -> f64 {
        ratio(self.tp as f64, (self.tp + self.fn_) as f64)
    }

    pub fn f1(&self) -> f64 {
        let p = self.precision();
        let r = self.recall();
        ratio(2.0 * p * r, p + r)
    }
}

fn ratio(numerator: f64, denominator: f64) -> f64 {
    if denominator == 0.0 {
        0.0
    } else {
        numerator / denominator
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counts_cover_every_row() {
        let predicted = vec![1, 0, 1, 0, 1];
        let actual = vec![1, 0, 0, 1, 1];
        let counts = ConfusionCounts::from_predictions(&predicted, &actual);
        assert_eq!(counts.tp, 2);
        assert_eq!(counts.tn, 1);
        assert_eq!(counts.fp, 1);
        assert_eq!(counts.fn_, 1);
        assert_eq!(counts.total(), predicted.len());
    }

    #[test]
    fn test_perfect_prediction() {
        let labels = vec![1, 0, 1, 1, 0];
        let counts = ConfusionCounts::from_predictions(&labels, &labels);
        assert_eq!(counts.accuracy(), 1.0);
        assert_eq!(counts.precision(), 1.0);
        assert_eq!(counts.recall(), 1.0);
        assert_eq!(counts.f1(), 1.0);
    }

    #[test]
    fn test_zero_denominators_yield_zero() {
        // All-negative predictions on all-negative labels: no positives anywhere.
        let counts = ConfusionCounts::from_predictions(&[0, 0, 0], &[0, 0, 0]);
        assert_eq!(counts.precision(), 0.0);
        assert_eq!(counts.recall(), 0.0);
        assert_eq!(counts.f1(), 0.0);
        assert_eq!(counts.accuracy(), 1.0);
    }

    #[test]
    fn test_empty_input_yields_zero_accuracy() {
        let counts = ConfusionCounts::from_predictions(&[], &[]);
        assert_eq!(counts.accuracy(), 0.0);
        assert_eq!(counts.total(), 0);
    }
}
