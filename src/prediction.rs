use std::path::Path;

use anyhow::Context;
use polars::prelude::*;
use tracing::info;

use crate::data::{feature_matrix, write_csv_file};
use crate::model::HistGradientBoostingRegressor;
use crate::training::TARGET_COLUMN;

pub const ID_COLUMN: &str = "flight_id";

/// Loads the model at `model_path`, predicts take-off weight for every row
/// of `df` and writes `flight_id,tow` to `submission_path`, replacing any
/// existing file. Rows keep their input order.
pub fn predict_tow<S: AsRef<str>>(
    df: &DataFrame,
    feature_cols: &[S],
    model_path: impl AsRef<Path>,
    submission_path: impl AsRef<Path>,
) -> anyhow::Result<DataFrame> {
    let model_path = model_path.as_ref();
    let model = HistGradientBoostingRegressor::load(model_path)
        .with_context(|| format!("loading model from {}", model_path.display()))?;

    let mut result = predict_frame(&model, df, feature_cols)?;
    write_csv_file(&mut result, submission_path.as_ref())?;

    Ok(result)
}

/// Predicts with an in-memory model and returns the `flight_id,tow` frame.
pub fn predict_frame<S: AsRef<str>>(
    model: &HistGradientBoostingRegressor,
    df: &DataFrame,
    feature_cols: &[S],
) -> anyhow::Result<DataFrame> {
    let x = feature_matrix(df, feature_cols)?;
    let predictions = model.predict(&x)?;

    let ids = df
        .column(ID_COLUMN)
        .with_context(|| format!("input has no `{ID_COLUMN}` column"))?
        .clone();
    let result = DataFrame::new(vec![ids, Series::new(TARGET_COLUMN, predictions)])?;

    info!(rows = result.height(), "predicted take-off weights");
    Ok(result)
}
