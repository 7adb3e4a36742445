use std::fmt;
use std::path::Path;

use tracing::info;
use xgboost::{parameters::TrainingParametersBuilder, Booster, DMatrix};

use super::{FeatureMatrix, HgbrParams, ModelError};

/// Booster attributes carrying the metadata needed to reuse a saved model.
const FEATURE_NAMES_ATTR: &str = "feature_names";
const PARAMS_ATTR: &str = "hgbr_params";

struct Fitted {
    booster: Booster,
    feature_names: Vec<String>,
}

/// Squared error gradient boosting on histogram-binned features, backed by
/// an `xgboost::Booster`.
pub struct HistGradientBoostingRegressor {
    params: HgbrParams,
    fitted: Option<Fitted>,
}

impl fmt::Debug for HistGradientBoostingRegressor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HistGradientBoostingRegressor")
            .field("params", &self.params)
            .field("feature_names", &self.feature_names())
            .finish()
    }
}

impl HistGradientBoostingRegressor {
    pub fn new(params: HgbrParams) -> Self {
        Self {
            params,
            fitted: None,
        }
    }

    pub fn params(&self) -> &HgbrParams {
        &self.params
    }

    /// Feature names seen during `fit`, in training order.
    pub fn feature_names(&self) -> Option<&[String]> {
        self.fitted.as_ref().map(|f| f.feature_names.as_slice())
    }

    pub fn n_iter(&self) -> usize {
        self.fitted.as_ref().map_or(0, |_| self.params.max_iter)
    }

    /// Fits `max_iter` trees, replacing any previous fit.
    pub fn fit(&mut self, x: &FeatureMatrix, y: &[f64]) -> Result<(), ModelError> {
        self.params.validate(x.n_features())?;

        let n_rows = x.n_rows();
        if n_rows == 0 || x.n_features() == 0 {
            return Err(ModelError::InvalidData(format!(
                "cannot fit on {} rows of {} features",
                n_rows,
                x.n_features()
            )));
        }
        if y.len() != n_rows {
            return Err(ModelError::InvalidData(format!(
                "{} targets for {} rows",
                y.len(),
                n_rows
            )));
        }
        if let Some(row) = y.iter().position(|v| !v.is_finite()) {
            return Err(ModelError::InvalidTarget { row });
        }
        self.check_categories(x)?;

        let categorical: Vec<&str> = self
            .params
            .categorical_features
            .iter()
            .map(|&p| x.names()[p].as_str())
            .collect();
        info!(
            rows = n_rows,
            features = x.n_features(),
            ?categorical,
            "fitting gradient boosting regressor"
        );

        let labels: Vec<f32> = y.iter().map(|&v| v as f32).collect();
        let base_score = (y.iter().sum::<f64>() / n_rows as f64) as f32;

        let mut dtrain = DMatrix::from_dense(x.values(), n_rows)?;
        dtrain.set_labels(&labels)?;

        let training_params = TrainingParametersBuilder::default()
            .dtrain(&dtrain)
            .boost_rounds(self.params.max_iter as u32)
            .booster_params(self.params.booster_params(base_score)?)
            .build()
            .map_err(ModelError::InvalidParams)?;
        let mut booster = Booster::train(&training_params)?;

        booster.set_attribute(FEATURE_NAMES_ATTR, &serde_json::to_string(x.names())?)?;
        booster.set_attribute(PARAMS_ATTR, &serde_json::to_string(&self.params)?)?;

        self.fitted = Some(Fitted {
            booster,
            feature_names: x.names().to_vec(),
        });
        Ok(())
    }

    /// Predicts every row of `x`, which must carry the training feature
    /// names in training order.
    pub fn predict(&self, x: &FeatureMatrix) -> Result<Vec<f64>, ModelError> {
        let fitted = self.fitted.as_ref().ok_or(ModelError::NotTrained)?;
        if x.names() != fitted.feature_names.as_slice() {
            return Err(ModelError::FeatureMismatch {
                expected: fitted.feature_names.clone(),
                actual: x.names().to_vec(),
            });
        }
        if x.n_rows() == 0 {
            return Ok(Vec::new());
        }

        let dmatrix = DMatrix::from_dense(x.values(), x.n_rows())?;
        let predictions = fitted.booster.predict(&dmatrix)?;
        Ok(predictions.into_iter().map(f64::from).collect())
    }

    /// Writes the booster in xgboost's binary format. Feature names and
    /// parameters travel inside it as attributes.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), ModelError> {
        let fitted = self.fitted.as_ref().ok_or(ModelError::NotTrained)?;
        fitted.booster.save(path.as_ref())?;
        info!(path = %path.as_ref().display(), trees = self.n_iter(), "saved model");
        Ok(())
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ModelError> {
        let booster = Booster::load(path.as_ref())?;

        let feature_names: Vec<String> = serde_json::from_str(
            &booster
                .get_attribute(FEATURE_NAMES_ATTR)?
                .ok_or(ModelError::MissingAttribute(FEATURE_NAMES_ATTR))?,
        )?;
        let params: HgbrParams = serde_json::from_str(
            &booster
                .get_attribute(PARAMS_ATTR)?
                .ok_or(ModelError::MissingAttribute(PARAMS_ATTR))?,
        )?;

        let model = Self {
            params,
            fitted: Some(Fitted {
                booster,
                feature_names,
            }),
        };
        info!(path = %path.as_ref().display(), trees = model.n_iter(), "loaded model");
        Ok(model)
    }

    fn check_categories(&self, x: &FeatureMatrix) -> Result<(), ModelError> {
        for &position in &self.params.categorical_features {
            let bad = x
                .column(position)
                .find(|v| !v.is_nan() && (*v < 0.0 || v.fract() != 0.0));
            if let Some(value) = bad {
                return Err(ModelError::InvalidCategory {
                    feature: x.names()[position].clone(),
                    position,
                    value,
                });
            }
        }
        Ok(())
    }
}
