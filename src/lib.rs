//! Take-off weight prediction for flight lists.
//!
//! Steps
//! 1. Load the challenge (labeled) and submission (unlabeled) flight lists
//! 2. Build features for both with [`FeatureBuilder`]
//! 3. Train the regressor with [`train_tow_model`]
//! 4. Predict the submission set with [`predict_tow`]
//! 5. Upload the result with [`submit_solution`]

pub mod config;
pub mod data;
pub mod features;
pub mod model;
pub mod prediction;
pub mod submit;
pub mod training;

pub use data::{feature_matrix, load_csv_file, target_vector, train_test_split, write_csv_file};
pub use features::{EngineeredFrames, FeatureBuilder, FeatureError, LabelEncoder};
pub use model::{HgbrParams, HistGradientBoostingRegressor, ModelError, RegressionMetrics};
pub use prediction::{predict_frame, predict_tow};
pub use submit::{submit_solution, ProcessRunner, SubmitConfig, SubmitError, TeamInfo};
pub use training::{train_tow_model, TrainerConfig, TrainingMode, TrainingReport};
