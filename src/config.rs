//! Default file locations and the default model feature list.

pub const CHALLENGE_SET_PATH: &str = "data/challenge_set.csv";
pub const SUBMISSION_SET_PATH: &str = "data/submission_set.csv";
pub const REFERENCE_PATH: &str = "icao_code-mtow.csv";
pub const MODEL_PATH: &str = "tow_model.bin";
pub const SUBMISSION_PATH: &str = "data/submission.csv";

/// Features in training order. Positions 0-5, 11 and 12 hold category codes,
/// matching `HgbrParams::tow().categorical_features`.
pub const DEFAULT_FEATURE_COLUMNS: [&str; 16] = [
    "aircraft_type_en",
    "wtc_en",
    "airline_en",
    "country_code_adep_en",
    "country_code_ades_en",
    "weekday",
    "flight_duration",
    "taxiout_time",
    "flown_distance",
    "mtow",
    "date sin",
    "start_hour",
    "arrival_hour",
    "year sin",
    "arrival day sin",
    "date_unix",
];

pub fn default_feature_columns() -> Vec<String> {
    DEFAULT_FEATURE_COLUMNS.iter().map(|s| s.to_string()).collect()
}
