use smartcore::metrics::{mean_absolute_error, mean_squared_error, r2 as r2_score};

/// Error metrics of a regression on one partition of the data.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RegressionMetrics {
    pub n_samples: usize,
    /// Root mean squared error
    pub rmse: f64,
    /// Mean absolute error
    pub mae: f64,
    /// Coefficient of determination. 1.0 for a perfect fit of a constant
    /// target, 0.0 for an imperfect one.
    pub r2: f64,
}

impl RegressionMetrics {
    /// Returns `None` when the slices are empty or of different lengths.
    pub fn compute(y_true: &[f64], y_pred: &[f64]) -> Option<Self> {
        let n = y_true.len();
        if n == 0 || n != y_pred.len() {
            return None;
        }

        let y_true = y_true.to_vec();
        let y_pred = y_pred.to_vec();
        let mse = mean_squared_error(&y_true, &y_pred);
        let mae = mean_absolute_error(&y_true, &y_pred);

        // r2 is undefined for a constant target
        let r2 = if y_true.iter().any(|&t| t != y_true[0]) {
            r2_score(&y_true, &y_pred)
        } else if mse == 0.0 {
            1.0
        } else {
            0.0
        };

        Some(Self {
            n_samples: n,
            rmse: mse.sqrt(),
            mae,
            r2,
        })
    }
}
