//! Gradient boosting regression on top of XGBoost.
//!
//! [`HistGradientBoostingRegressor`] trains an `xgboost::Booster` with the
//! histogram tree method and loss-guided growth. Missing values (NaN) are
//! routed by a default direction learned at every split. Features listed in
//! [`HgbrParams::categorical_features`] must hold integer category codes.
//!
//! # Example
//!
//! ```rust,no_run
//! use tow_predictor::model::{FeatureMatrix, HgbrParams, HistGradientBoostingRegressor};
//!
//! # fn main() -> Result<(), tow_predictor::model::ModelError> {
//! // row-major: one row per flight
//! let x = FeatureMatrix::new(
//!     vec!["aircraft_type_en".into(), "flown_distance".into()],
//!     vec![0.0, 812.0, 1.0, 1210.5, 1.0, 640.0],
//!     3,
//! )?;
//! let y = vec![61_000.0, 74_500.0, 70_250.0];
//!
//! let params = HgbrParams {
//!     categorical_features: vec![0],
//!     min_samples_leaf: 1,
//!     ..HgbrParams::default()
//! };
//! let mut model = HistGradientBoostingRegressor::new(params);
//! model.fit(&x, &y)?;
//! let predictions = model.predict(&x)?;
//! # Ok(())
//! # }
//! ```

mod gbm;
mod matrix;
mod metrics;
mod params;

use polars::prelude::PolarsError;
use thiserror::Error;
use xgboost::XGBError;

pub use gbm::HistGradientBoostingRegressor;
pub use matrix::FeatureMatrix;
pub use metrics::RegressionMetrics;
pub use params::HgbrParams;

/// Errors raised while building inputs for, fitting, or using the regressor.
#[derive(Error, Debug)]
pub enum ModelError {
    #[error("feature column `{0}` is missing from the input")]
    MissingColumn(String),

    #[error("column `{column}` has non-numeric type {dtype}")]
    NonNumericColumn { column: String, dtype: String },

    #[error("target is null or non-finite at row {row}")]
    InvalidTarget { row: usize },

    #[error("invalid data: {0}")]
    InvalidData(String),

    #[error("invalid parameters: {0}")]
    InvalidParams(String),

    #[error(
        "categorical feature `{feature}` (position {position}) holds {value}, \
         expected a non-negative integer code"
    )]
    InvalidCategory {
        feature: String,
        position: usize,
        value: f32,
    },

    #[error("model was trained on features {expected:?} but got {actual:?}")]
    FeatureMismatch {
        expected: Vec<String>,
        actual: Vec<String>,
    },

    #[error("model not trained")]
    NotTrained,

    #[error("model file has no `{0}` attribute")]
    MissingAttribute(&'static str),

    #[error(transparent)]
    Polars(#[from] PolarsError),

    #[error("xgboost: {0}")]
    Xgboost(#[from] XGBError),

    #[error("model metadata serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}
