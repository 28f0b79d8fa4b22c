//! Regression-style evaluation metrics over `(predicted, actual)` pairs.

/// The computed metric set.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Metrics {
    pub mean_absolute_error: f64,
    pub median_absolute_error: f64,
    pub mean_squared_error: f64,
    pub r2_score: f64,
}

/// Accumulates response pairs and computes metrics on demand.
#[derive(Debug, Clone, Default)]
pub struct MetricsAccumulator {
    responses: Vec<(f64, f64)>,
}

impl MetricsAccumulator {
    /// Creates an empty accumulator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records one `(predicted, actual)` pair.
    pub fn add(&mut self, predicted: f64, actual: f64) {
        self.responses.push((predicted, actual));
    }

    /// The number of recorded pairs.
    pub fn len(&self) -> usize {
        self.responses.len()
    }

    /// Whether no pairs have been recorded.
    pub fn is_empty(&self) -> bool {
        self.responses.is_empty()
    }

    /// Mean of `|predicted - actual|`.
    pub fn mean_absolute_error(&self) -> f64 {
        self.responses
            .iter()
            .map(|&(p, a)| (p - a).abs())
            .sum::<f64>()
            / self.responses.len() as f64
    }

    /// Mean of `(predicted - actual)^2`.
    pub fn mean_squared_error(&self) -> f64 {
        self.responses
            .iter()
            .map(|&(p, a)| (p - a) * (p - a))
            .sum::<f64>()
            / self.responses.len() as f64
    }

    /// Median of the absolute errors, via linear-time selection (one
    /// extra selection for the even-length midpoint).
    pub fn median_absolute_error(&self) -> f64 {
        let mut errors: Vec<f64> = self.responses.iter().map(|&(p, a)| (p - a).abs()).collect();

        let half = errors.len() / 2;
        let (_, upper, _) = errors.select_nth_unstable_by(half, f64::total_cmp);
        let upper = *upper;

        if errors.len() % 2 == 1 {
            return upper;
        }

        let (_, lower, _) = errors[..half].select_nth_unstable_by(half - 1, f64::total_cmp);
        (upper + *lower) / 2.0
    }

    /// Coefficient of determination:
    /// `1 - sum (a - p)^2 / sum (a - mean_a)^2`.
    pub fn r2_score(&self) -> f64 {
        let sq_err: f64 = self
            .responses
            .iter()
            .map(|&(p, a)| (a - p) * (a - p))
            .sum();

        let mean = self.responses.iter().map(|&(_, a)| a).sum::<f64>()
            / self.responses.len() as f64;
        let sq_diff_from_mean: f64 = self
            .responses
            .iter()
            .map(|&(_, a)| (a - mean) * (a - mean))
            .sum();

        1.0 - sq_err / sq_diff_from_mean
    }

    /// Computes the full metric set.
    pub fn metrics(&self) -> Metrics {
        Metrics {
            mean_absolute_error: self.mean_absolute_error(),
            median_absolute_error: self.median_absolute_error(),
            mean_squared_error: self.mean_squared_error(),
            r2_score: self.r2_score(),
        }
    }
}
