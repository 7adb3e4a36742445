use serde::{Deserialize, Serialize};
use xgboost::parameters::{
    learning::{LearningTaskParametersBuilder, Objective},
    tree::{GrowPolicy, TreeBoosterParametersBuilder, TreeMethod},
    BoosterParameters, BoosterParametersBuilder, BoosterType,
};

use super::ModelError;

/// Hyperparameters of [`super::HistGradientBoostingRegressor`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HgbrParams {
    /// Shrinkage applied to every leaf value (`eta`)
    pub learning_rate: f64,
    /// Number of boosting rounds (one tree each)
    pub max_iter: usize,
    /// Maximum number of leaves per tree (`max_leaves`)
    pub max_leaf_nodes: Option<usize>,
    /// Maximum depth of a tree; the root is at depth 0
    pub max_depth: Option<usize>,
    /// Minimum number of samples in a leaf. With squared error every row has
    /// hessian 1, so this is passed as `min_child_weight`.
    pub min_samples_leaf: usize,
    /// L2 penalty on leaf values (`lambda`)
    pub l2_regularization: f64,
    /// Histogram bins per feature (`max_bin`)
    pub max_bins: usize,
    /// Positions (into the feature list handed to `fit`) of features that
    /// hold integer category codes. The contract is positional: reordering
    /// the feature list without updating these indices changes which
    /// columns are treated as categorical.
    pub categorical_features: Vec<usize>,
    pub random_state: u64,
}

impl Default for HgbrParams {
    fn default() -> Self {
        Self {
            learning_rate: 0.1,
            max_iter: 100,
            max_leaf_nodes: Some(31),
            max_depth: None,
            min_samples_leaf: 20,
            l2_regularization: 0.0,
            max_bins: 255,
            categorical_features: Vec::new(),
            random_state: 42,
        }
    }
}

impl HgbrParams {
    /// The fixed configuration used for take-off weight regression.
    pub fn tow() -> Self {
        Self {
            learning_rate: 0.078,
            max_iter: 2000,
            max_leaf_nodes: Some(31),
            max_depth: Some(9),
            min_samples_leaf: 16,
            l2_regularization: 0.1,
            max_bins: 255,
            categorical_features: vec![0, 1, 2, 3, 4, 5, 11, 12],
            random_state: 42,
        }
    }

    pub fn validate(&self, n_features: usize) -> Result<(), ModelError> {
        if !(self.learning_rate > 0.0 && self.learning_rate <= 1.0) {
            return Err(ModelError::InvalidParams(format!(
                "learning_rate must be in (0, 1], got {}",
                self.learning_rate
            )));
        }
        if self.max_iter == 0 || self.max_iter > u32::MAX as usize {
            return Err(ModelError::InvalidParams(format!(
                "max_iter must be in [1, {}], got {}",
                u32::MAX,
                self.max_iter
            )));
        }
        if matches!(self.max_leaf_nodes, Some(n) if n < 2) {
            return Err(ModelError::InvalidParams("max_leaf_nodes must be at least 2".into()));
        }
        if matches!(self.max_depth, Some(0)) {
            return Err(ModelError::InvalidParams("max_depth must be at least 1".into()));
        }
        if self.max_depth.is_none() && self.max_leaf_nodes.is_none() {
            return Err(ModelError::InvalidParams(
                "one of max_depth and max_leaf_nodes must be set".into(),
            ));
        }
        if self.min_samples_leaf == 0 {
            return Err(ModelError::InvalidParams("min_samples_leaf must be at least 1".into()));
        }
        if self.l2_regularization < 0.0 {
            return Err(ModelError::InvalidParams(
                "l2_regularization must be non-negative".into(),
            ));
        }
        if !(2..=255).contains(&self.max_bins) {
            return Err(ModelError::InvalidParams(format!(
                "max_bins must be in [2, 255], got {}",
                self.max_bins
            )));
        }
        if let Some(&position) = self
            .categorical_features
            .iter()
            .find(|&&p| p >= n_features)
        {
            return Err(ModelError::InvalidParams(format!(
                "categorical feature position {position} is out of range for {n_features} features"
            )));
        }
        Ok(())
    }

    /// Booster settings for a squared error fit starting from `base_score`.
    /// A limit left as `None` is passed as 0, which xgboost reads as
    /// unlimited.
    pub(crate) fn booster_params(&self, base_score: f32) -> Result<BoosterParameters, ModelError> {
        let tree_params = TreeBoosterParametersBuilder::default()
            .eta(self.learning_rate as f32)
            .max_depth(self.max_depth.unwrap_or(0) as u32)
            .max_leaves(self.max_leaf_nodes.unwrap_or(0) as u32)
            .min_child_weight(self.min_samples_leaf as u32)
            .lambda(self.l2_regularization as f32)
            .max_bin(self.max_bins as u32)
            .tree_method(TreeMethod::Hist)
            .grow_policy(GrowPolicy::LossGuide)
            .build()
            .map_err(ModelError::InvalidParams)?;

        let learning_params = LearningTaskParametersBuilder::default()
            .objective(Objective::RegLinear)
            .base_score(base_score)
            .seed(self.random_state)
            .build()
            .map_err(ModelError::InvalidParams)?;

        BoosterParametersBuilder::default()
            .booster_type(BoosterType::Tree(tree_params))
            .learning_params(learning_params)
            .verbose(false)
            .build()
            .map_err(ModelError::InvalidParams)
    }
}
