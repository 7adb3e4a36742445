use super::ModelError;

/// Row-major `f32` matrix of named numeric features, the layout
/// `xgboost::DMatrix::from_dense` expects. NaN marks a missing value.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureMatrix {
    names: Vec<String>,
    values: Vec<f32>,
    n_rows: usize,
}

impl FeatureMatrix {
    pub fn new(names: Vec<String>, values: Vec<f32>, n_rows: usize) -> Result<Self, ModelError> {
        if values.len() != names.len() * n_rows {
            return Err(ModelError::InvalidData(format!(
                "{} values for {} rows of {} features",
                values.len(),
                n_rows,
                names.len()
            )));
        }

        Ok(Self {
            names,
            values,
            n_rows,
        })
    }

    pub fn n_rows(&self) -> usize {
        self.n_rows
    }

    pub fn n_features(&self) -> usize {
        self.names.len()
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn values(&self) -> &[f32] {
        &self.values
    }

    pub fn column(&self, feature: usize) -> impl Iterator<Item = f32> + '_ {
        self.values
            .iter()
            .skip(feature)
            .step_by(self.n_features())
            .copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_wrong_length() {
        let err = FeatureMatrix::new(vec!["a".into(), "b".into()], vec![1.0, 2.0, 3.0], 2)
            .unwrap_err();
        assert!(matches!(err, ModelError::InvalidData(_)));
    }

    #[test]
    fn test_column_access() {
        let m = FeatureMatrix::new(
            vec!["a".into(), "b".into()],
            vec![1.0, 3.0, 2.0, 4.0],
            2,
        )
        .unwrap();
        assert_eq!(m.column(0).collect::<Vec<_>>(), vec![1.0, 2.0]);
        assert_eq!(m.column(1).collect::<Vec<_>>(), vec![3.0, 4.0]);
        assert_eq!(m.n_features(), 2);
    }
}
