//! Feature engineering for flight records.
//!
//! [`FeatureBuilder::build`] takes the labeled (challenge) and unlabeled
//! (submission) flight lists and returns both with the same derived columns:
//!
//! - reference columns joined on `aircraft_type` (e.g. `mtow`), null when the
//!   type is not in the reference table;
//! - `<column>_en` integer codes for [`CATEGORICAL_COLUMNS`], fitted on the
//!   union of both inputs so a label gets one code everywhere;
//! - calendar features: `weekday`, `date_unix`, `arrival_unix`, `date sin`,
//!   `year sin`, `arrival day sin`, `start_hour`, `arrival_hour`.

mod encoding;
mod temporal;

use std::collections::{BTreeMap, HashSet};
use std::path::Path;

use chrono::{DateTime, Datelike, Timelike, Utc};
use polars::prelude::*;
use thiserror::Error;
use tracing::{info, warn};

pub use encoding::LabelEncoder;
pub use temporal::{
    daily_sin, parse_timestamp, phase_sin, yearly_sin, SECONDS_PER_DAY, SECONDS_PER_YEAR,
};

/// Join key between flight records and the reference table.
pub const REFERENCE_KEY: &str = "aircraft_type";

pub const CATEGORICAL_COLUMNS: [&str; 5] = [
    "aircraft_type",
    "wtc",
    "airline",
    "country_code_adep",
    "country_code_ades",
];

pub const DATE_COLUMN: &str = "date";
pub const OFFBLOCK_COLUMN: &str = "actual_offblock_time";
pub const ARRIVAL_COLUMN: &str = "arrival_time";

#[derive(Error, Debug)]
pub enum FeatureError {
    #[error("column `{0}` is missing")]
    MissingColumn(String),

    #[error("column `{column}` must hold text labels, found {dtype}")]
    NotText { column: String, dtype: String },

    #[error("column `{column}` has no label at row {row}")]
    NullLabel { column: String, row: usize },

    #[error("label `{label}` in column `{column}` was not seen by the encoder")]
    UnknownLabel { column: String, label: String },

    #[error("cannot parse `{value}` in column `{column}` (row {row}) as a timestamp")]
    BadTimestamp {
        column: String,
        row: usize,
        value: String,
    },

    #[error(transparent)]
    Polars(#[from] PolarsError),
}

/// Both feature-augmented datasets and the encoders used for them.
#[derive(Debug, Clone)]
pub struct EngineeredFrames {
    pub challenge: DataFrame,
    pub submission: DataFrame,
    /// Keyed by source column name.
    pub encoders: BTreeMap<String, LabelEncoder>,
}

pub struct FeatureBuilder {
    reference: DataFrame,
}

impl FeatureBuilder {
    pub fn new(reference: DataFrame) -> Result<Self, FeatureError> {
        text_column(&reference, REFERENCE_KEY)?;
        Ok(Self { reference })
    }

    /// Reads the aircraft type reference table (e.g. `icao_code-mtow.csv`).
    pub fn from_reference_file<P: AsRef<Path>>(path: P) -> Result<Self, FeatureError> {
        let reference = CsvReader::from_path(path.as_ref())?
            .has_header(true)
            .finish()?;
        info!(
            path = %path.as_ref().display(),
            types = reference.height(),
            "loaded aircraft reference table"
        );
        Self::new(reference)
    }

    pub fn build(
        &self,
        challenge: &DataFrame,
        submission: &DataFrame,
    ) -> Result<EngineeredFrames, FeatureError> {
        let mut challenge = self.join_reference(challenge)?;
        let mut submission = self.join_reference(submission)?;

        let mut encoders = BTreeMap::new();
        for column in CATEGORICAL_COLUMNS {
            let encoder = encode_pooled(&mut challenge, &mut submission, column)?;
            encoders.insert(column.to_string(), encoder);
        }

        add_temporal_features(&mut challenge)?;
        add_temporal_features(&mut submission)?;

        Ok(EngineeredFrames {
            challenge,
            submission,
            encoders,
        })
    }

    /// Left join on [`REFERENCE_KEY`]; the row order of `flights` is kept.
    fn join_reference(&self, flights: &DataFrame) -> Result<DataFrame, FeatureError> {
        let known: HashSet<&str> = text_column(&self.reference, REFERENCE_KEY)?
            .into_iter()
            .flatten()
            .collect();
        let unmatched = text_column(flights, REFERENCE_KEY)?
            .into_iter()
            .filter(|t| t.map_or(true, |t| !known.contains(t)))
            .count();

        let joined = flights.left_join(&self.reference, [REFERENCE_KEY], [REFERENCE_KEY])?;

        if unmatched > 0 {
            warn!(
                unmatched,
                rows = flights.height(),
                "aircraft types missing from reference table"
            );
        }
        Ok(joined)
    }
}

fn text_column<'a>(df: &'a DataFrame, name: &str) -> Result<&'a Utf8Chunked, FeatureError> {
    let series = df
        .column(name)
        .map_err(|_| FeatureError::MissingColumn(name.to_string()))?;
    series.utf8().map_err(|_| FeatureError::NotText {
        column: name.to_string(),
        dtype: series.dtype().to_string(),
    })
}

fn labels<'a>(df: &'a DataFrame, column: &str) -> Result<Vec<&'a str>, FeatureError> {
    text_column(df, column)?
        .into_iter()
        .enumerate()
        .map(|(row, v)| {
            v.ok_or_else(|| FeatureError::NullLabel {
                column: column.to_string(),
                row,
            })
        })
        .collect()
}

fn encode(encoder: &LabelEncoder, labels: &[&str], column: &str) -> Result<Vec<i32>, FeatureError> {
    labels
        .iter()
        .map(|label| {
            encoder
                .transform(label)
                .ok_or_else(|| FeatureError::UnknownLabel {
                    column: column.to_string(),
                    label: label.to_string(),
                })
        })
        .collect()
}

/// Fits one encoder on `column` of both frames, then adds `<column>_en` to
/// each. The fit sees the union before either frame is transformed.
fn encode_pooled(
    a: &mut DataFrame,
    b: &mut DataFrame,
    column: &str,
) -> Result<LabelEncoder, FeatureError> {
    let (codes_a, codes_b, encoder) = {
        let labels_a = labels(a, column)?;
        let labels_b = labels(b, column)?;
        let encoder = LabelEncoder::fit(labels_a.iter().chain(&labels_b).copied());
        (
            encode(&encoder, &labels_a, column)?,
            encode(&encoder, &labels_b, column)?,
            encoder,
        )
    };

    let name = format!("{column}_en");
    a.with_column(Series::new(&name, codes_a))?;
    b.with_column(Series::new(&name, codes_b))?;

    info!(column, classes = encoder.len(), "encoded categorical column");
    Ok(encoder)
}

fn timestamps(df: &DataFrame, column: &str) -> Result<Vec<Option<DateTime<Utc>>>, FeatureError> {
    text_column(df, column)?
        .into_iter()
        .enumerate()
        .map(|(row, v)| match v {
            None => Ok(None),
            Some(s) => parse_timestamp(s)
                .map(Some)
                .ok_or_else(|| FeatureError::BadTimestamp {
                    column: column.to_string(),
                    row,
                    value: s.to_string(),
                }),
        })
        .collect()
}

fn add_temporal_features(df: &mut DataFrame) -> Result<(), FeatureError> {
    let dates = timestamps(df, DATE_COLUMN)?;
    let offblock = timestamps(df, OFFBLOCK_COLUMN)?;
    let arrival = timestamps(df, ARRIVAL_COLUMN)?;

    let date_unix: Vec<Option<i64>> = dates.iter().map(|d| d.map(|d| d.timestamp())).collect();
    let arrival_unix: Vec<Option<i64>> =
        arrival.iter().map(|d| d.map(|d| d.timestamp())).collect();

    let weekday: Vec<Option<i32>> = dates
        .iter()
        .map(|d| d.map(|d| d.weekday().num_days_from_monday() as i32))
        .collect();
    let date_sin: Vec<Option<f64>> = date_unix.iter().map(|t| t.map(daily_sin)).collect();
    let year_sin: Vec<Option<f64>> = date_unix.iter().map(|t| t.map(yearly_sin)).collect();
    let arrival_sin: Vec<Option<f64>> = arrival_unix.iter().map(|t| t.map(daily_sin)).collect();
    let start_hour: Vec<Option<i32>> = offblock
        .iter()
        .map(|d| d.map(|d| d.hour() as i32))
        .collect();
    let arrival_hour: Vec<Option<i32>> =
        arrival.iter().map(|d| d.map(|d| d.hour() as i32)).collect();

    df.with_column(Series::new("weekday", weekday))?;
    df.with_column(Series::new("date_unix", date_unix))?;
    df.with_column(Series::new("arrival_unix", arrival_unix))?;
    df.with_column(Series::new("date sin", date_sin))?;
    df.with_column(Series::new("year sin", year_sin))?;
    df.with_column(Series::new("arrival day sin", arrival_sin))?;
    df.with_column(Series::new("start_hour", start_hour))?;
    df.with_column(Series::new("arrival_hour", arrival_hour))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reference() -> DataFrame {
        df!(
            "aircraft_type" => ["A320", "A321", "B738"],
            "mtow" => [78_000.0, 93_500.0, 79_016.0]
        )
        .unwrap()
    }

    fn flights(types: &[&str], airlines: &[&str]) -> DataFrame {
        let n = types.len();
        df!(
            "flight_id" => (0..n as i64).collect::<Vec<_>>(),
            "date" => vec!["2022-01-03"; n],
            "actual_offblock_time" => vec!["2022-01-03T09:51:00Z"; n],
            "arrival_time" => vec!["2022-01-03T12:15:00Z"; n],
            "aircraft_type" => types,
            "wtc" => vec!["M"; n],
            "airline" => airlines,
            "country_code_adep" => vec!["FR"; n],
            "country_code_ades" => vec!["ES"; n]
        )
        .unwrap()
    }

    fn codes(df: &DataFrame, column: &str) -> Vec<i32> {
        df.column(column)
            .unwrap()
            .i32()
            .unwrap()
            .into_no_null_iter()
            .collect()
    }

    #[test]
    fn test_pooled_encoding_gives_distinct_codes() {
        let builder = FeatureBuilder::new(reference()).unwrap();
        let a = flights(&["A320", "A320"], &["x", "y"]);
        let b = flights(&["A321"], &["z"]);

        let out = builder.build(&a, &b).unwrap();
        let enc = &out.encoders["aircraft_type"];
        let a320 = enc.transform("A320").unwrap();
        let a321 = enc.transform("A321").unwrap();

        assert_ne!(a320, a321);
        assert_eq!(codes(&out.challenge, "aircraft_type_en"), vec![a320, a320]);
        assert_eq!(codes(&out.submission, "aircraft_type_en"), vec![a321]);
        assert!(!codes(&out.challenge, "aircraft_type_en").contains(&a321));
    }

    #[test]
    fn test_shared_labels_share_codes_and_roundtrip() {
        let builder = FeatureBuilder::new(reference()).unwrap();
        let a = flights(&["B738", "A320"], &["ryr", "ezy"]);
        let b = flights(&["A320", "B738"], &["ezy", "ryr"]);

        let out = builder.build(&a, &b).unwrap();
        let enc = &out.encoders["airline"];
        let ca = codes(&out.challenge, "airline_en");
        let cb = codes(&out.submission, "airline_en");
        assert_eq!(ca, vec![cb[1], cb[0]]);

        for (df, source) in [(&a, &out.challenge), (&b, &out.submission)] {
            let labels: Vec<&str> = df
                .column("airline")
                .unwrap()
                .utf8()
                .unwrap()
                .into_no_null_iter()
                .collect();
            let back: Vec<&str> = codes(source, "airline_en")
                .into_iter()
                .map(|c| enc.inverse_transform(c).unwrap())
                .collect();
            assert_eq!(labels, back);
        }
    }

    #[test]
    fn test_unmatched_reference_yields_null_and_keeps_order() {
        let builder = FeatureBuilder::new(reference()).unwrap();
        let a = flights(&["E190", "A320", "B738"], &["a", "b", "c"]);
        let b = flights(&["A321"], &["a"]);

        let out = builder.build(&a, &b).unwrap();
        let mtow: Vec<Option<f64>> = out
            .challenge
            .column("mtow")
            .unwrap()
            .f64()
            .unwrap()
            .into_iter()
            .collect();
        assert_eq!(mtow, vec![None, Some(78_000.0), Some(79_016.0)]);

        let ids: Vec<i64> = out
            .challenge
            .column("flight_id")
            .unwrap()
            .i64()
            .unwrap()
            .into_no_null_iter()
            .collect();
        assert_eq!(ids, vec![0, 1, 2]);
    }

    #[test]
    fn test_temporal_columns() {
        let builder = FeatureBuilder::new(reference()).unwrap();
        let a = flights(&["A320"], &["a"]);
        let out = builder.build(&a, &a).unwrap();
        let df = &out.challenge;

        // 2022-01-03 is a Monday
        assert_eq!(codes(df, "weekday"), vec![0]);
        assert_eq!(codes(df, "start_hour"), vec![9]);
        assert_eq!(codes(df, "arrival_hour"), vec![12]);

        let date_unix = df.column("date_unix").unwrap().i64().unwrap().get(0);
        assert_eq!(date_unix, Some(1_641_168_000));
        let year_sin = df.column("year sin").unwrap().f64().unwrap().get(0).unwrap();
        assert_eq!(year_sin.to_bits(), yearly_sin(1_641_168_000).to_bits());
        let arrival_sin = df
            .column("arrival day sin")
            .unwrap()
            .f64()
            .unwrap()
            .get(0)
            .unwrap();
        assert_eq!(arrival_sin.to_bits(), daily_sin(1_641_212_100).to_bits());

        for name in ["weekday", "date sin", "year sin", "start_hour", "aircraft_type_en"] {
            assert!(out.submission.column(name).is_ok(), "{name}");
        }
    }

    #[test]
    fn test_null_label_and_bad_timestamp_fail() {
        let builder = FeatureBuilder::new(reference()).unwrap();
        let good = flights(&["A320"], &["a"]);

        let mut null_airline = flights(&["A320"], &["a"]);
        null_airline
            .with_column(Series::new("airline", [None::<&str>]))
            .unwrap();
        assert!(matches!(
            builder.build(&good, &null_airline),
            Err(FeatureError::NullLabel { row: 0, .. })
        ));

        let mut bad_date = flights(&["A320"], &["a"]);
        bad_date
            .with_column(Series::new("date", ["yesterday"]))
            .unwrap();
        assert!(matches!(
            builder.build(&bad_date, &good),
            Err(FeatureError::BadTimestamp { .. })
        ));
    }

    #[test]
    fn test_missing_key_column_fails() {
        let builder = FeatureBuilder::new(reference()).unwrap();
        let good = flights(&["A320"], &["a"]);
        let no_type = good.drop("aircraft_type").unwrap();
        assert!(matches!(
            builder.build(&no_type, &good),
            Err(FeatureError::MissingColumn(c)) if c == "aircraft_type"
        ));
    }
}
