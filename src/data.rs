//! CSV loading/writing and conversion of polars frames into model inputs.

use std::fs::File;
use std::path::Path;

use polars::prelude::*;
use rand::{rngs::StdRng, seq::SliceRandom, SeedableRng};
use tracing::info;

use crate::model::{FeatureMatrix, ModelError};

/// Rows scanned when inferring column types of an input CSV.
const INFER_SCHEMA_ROWS: usize = 10_000;

pub fn load_csv_file<P: AsRef<Path>>(file_path: P) -> anyhow::Result<DataFrame> {
    let file_path = file_path.as_ref();
    let df = CsvReader::from_path(file_path)?
        .has_header(true)
        .infer_schema(Some(INFER_SCHEMA_ROWS))
        .finish()?;

    info!(
        path = %file_path.display(),
        rows = df.height(),
        columns = df.width(),
        "loaded csv"
    );

    Ok(df)
}

/// Writes `df` as comma separated text with a header row, replacing any
/// existing file. Missing parent directories are created.
pub fn write_csv_file<P: AsRef<Path>>(df: &mut DataFrame, file_path: P) -> anyhow::Result<()> {
    let file_path = file_path.as_ref();
    if let Some(parent) = file_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let mut file = File::create(file_path)?;
    CsvWriter::new(&mut file).finish(df)?;

    info!(path = %file_path.display(), rows = df.height(), "wrote csv");
    Ok(())
}

/// Shuffles row indices with a seeded rng and holds out `ceil(n * test_size)`
/// rows for testing. Returns `(train, test)`.
pub fn train_test_split(
    df: &DataFrame,
    test_size: f64,
    seed: u64,
) -> anyhow::Result<(DataFrame, DataFrame)> {
    anyhow::ensure!(
        test_size > 0.0 && test_size < 1.0,
        "test_size must be in (0, 1), got {test_size}"
    );

    let n_rows = df.height();
    let mut indices: Vec<IdxSize> = (0..n_rows as IdxSize).collect();

    let mut rng = StdRng::seed_from_u64(seed);
    indices.shuffle(&mut rng);

    let n_test = (n_rows as f64 * test_size).ceil() as usize;
    anyhow::ensure!(
        n_test > 0 && n_test < n_rows,
        "cannot hold out {n_test} of {n_rows} rows"
    );

    let test_indices = IdxCa::from_vec("", indices[..n_test].to_vec());
    let train_indices = IdxCa::from_vec("", indices[n_test..].to_vec());

    let train_df = df.take(&train_indices)?;
    let test_df = df.take(&test_indices)?;

    Ok((train_df, test_df))
}

/// Extracts the named columns, in order, as a row-major `f32` matrix.
/// Nulls become NaN so the booster can route them as missing values.
pub fn feature_matrix<S: AsRef<str>>(
    df: &DataFrame,
    feature_cols: &[S],
) -> Result<FeatureMatrix, ModelError> {
    let names: Vec<String> = feature_cols
        .iter()
        .map(|name| name.as_ref().to_string())
        .collect();
    for name in &names {
        numeric_series(df, name)?;
    }

    let array = df
        .select(&names)?
        .to_ndarray::<Float32Type>(IndexOrder::C)?;
    let values = array
        .as_slice()
        .map(<[f32]>::to_vec)
        .ok_or_else(|| ModelError::InvalidData("feature array is not row-major".into()))?;

    FeatureMatrix::new(names, values, df.height())
}

/// Extracts the regression target. Nulls are rejected.
pub fn target_vector(df: &DataFrame, target_col: &str) -> Result<Vec<f64>, ModelError> {
    numeric_series(df, target_col)?
        .cast(&DataType::Float64)?
        .f64()?
        .into_iter()
        .enumerate()
        .map(|(row, v)| match v {
            Some(v) if v.is_finite() => Ok(v),
            _ => Err(ModelError::InvalidTarget { row }),
        })
        .collect()
}

fn numeric_series<'a>(df: &'a DataFrame, name: &str) -> Result<&'a Series, ModelError> {
    let series = df
        .column(name)
        .map_err(|_| ModelError::MissingColumn(name.to_string()))?;

    if !series.dtype().is_numeric() {
        return Err(ModelError::NonNumericColumn {
            column: name.to_string(),
            dtype: series.dtype().to_string(),
        });
    }
    Ok(series)
}
