use std::path::Path;

use anyhow::Context;
use polars::prelude::*;
use tracing::info;

use crate::data::{feature_matrix, target_vector, train_test_split};
use crate::model::{HgbrParams, HistGradientBoostingRegressor, RegressionMetrics};

pub const TARGET_COLUMN: &str = "tow";

/// Settings of a training run. `Default` gives the take-off weight setup.
#[derive(Debug, Clone, PartialEq)]
pub struct TrainerConfig {
    pub target: String,
    pub params: HgbrParams,
    /// Share of rows held out in evaluation mode
    pub test_size: f64,
    /// Seed of the evaluation split
    pub split_seed: u64,
}

impl Default for TrainerConfig {
    fn default() -> Self {
        Self {
            target: TARGET_COLUMN.to_string(),
            params: HgbrParams::tow(),
            test_size: 0.2,
            split_seed: 42,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrainingMode {
    /// Hold out `test_size` of the rows and score both partitions.
    Evaluation,
    /// Fit on every row; only the training error is reported.
    Production,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TrainingReport {
    pub mode: TrainingMode,
    pub train: RegressionMetrics,
    pub test: Option<RegressionMetrics>,
}

/// Fits the regressor on `feature_cols` of `df` against the target column
/// and saves it to `model_path`.
///
/// Positions listed in `config.params.categorical_features` index into
/// `feature_cols`, so the caller's column order decides which features are
/// categorical.
pub fn train_tow_model<S: AsRef<str>>(
    df: &DataFrame,
    feature_cols: &[S],
    model_path: impl AsRef<Path>,
    mode: TrainingMode,
    config: &TrainerConfig,
) -> anyhow::Result<(HistGradientBoostingRegressor, TrainingReport)> {
    let mut model = HistGradientBoostingRegressor::new(config.params.clone());

    let report = match mode {
        TrainingMode::Evaluation => {
            let (train_df, test_df) = train_test_split(df, config.test_size, config.split_seed)?;
            let train = fit_and_score(&mut model, &train_df, feature_cols, &config.target)?;
            let test = score(&model, &test_df, feature_cols, &config.target)?;

            info!(rmse = train.rmse, r2 = train.r2, mae = train.mae, "train metrics");
            info!(rmse = test.rmse, r2 = test.r2, mae = test.mae, "test metrics");
            TrainingReport {
                mode,
                train,
                test: Some(test),
            }
        }
        TrainingMode::Production => {
            let train = fit_and_score(&mut model, df, feature_cols, &config.target)?;
            info!(rmse = train.rmse, "trained model on full dataset");
            TrainingReport {
                mode,
                train,
                test: None,
            }
        }
    };

    model
        .save(model_path.as_ref())
        .with_context(|| format!("saving model to {}", model_path.as_ref().display()))?;

    Ok((model, report))
}

fn fit_and_score<S: AsRef<str>>(
    model: &mut HistGradientBoostingRegressor,
    df: &DataFrame,
    feature_cols: &[S],
    target: &str,
) -> anyhow::Result<RegressionMetrics> {
    let x = feature_matrix(df, feature_cols)?;
    let y = target_vector(df, target)?;
    model.fit(&x, &y)?;
    score(model, df, feature_cols, target)
}

fn score<S: AsRef<str>>(
    model: &HistGradientBoostingRegressor,
    df: &DataFrame,
    feature_cols: &[S],
    target: &str,
) -> anyhow::Result<RegressionMetrics> {
    let x = feature_matrix(df, feature_cols)?;
    let y = target_vector(df, target)?;
    let predictions = model.predict(&x)?;
    RegressionMetrics::compute(&y, &predictions).context("no rows to score")
}
