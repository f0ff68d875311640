//! In-memory feature table shared by every training stage.

use smartcore::linalg::basic::arrays::Array;
use smartcore::linalg::basic::matrix::DenseMatrix;
use smartcore::model_selection::train_test_split;

use crate::error::{Result, StrokeError};

#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    pub columns: Vec<String>,
    /// Row-major feature values, one inner vector per record.
    pub rows: Vec<Vec<f64>>,
    pub labels: Vec<i32>,
}

impl Dataset {
    pub fn new(columns: Vec<String>, rows: Vec<Vec<f64>>, labels: Vec<i32>) -> Result<Self> {
        if rows.len() != labels.len() {
            return Err(StrokeError::Schema(format!(
                "{} rows but {} labels",
                rows.len(),
                labels.len()
            )));
        }
        if let Some(bad) = rows.iter().position(|r| r.len() != columns.len()) {
            return Err(StrokeError::Schema(format!(
                "row {bad} has {} values, expected {}",
                rows[bad].len(),
                columns.len()
            )));
        }
        Ok(Self {
            columns,
            rows,
            labels,
        })
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn n_features(&self) -> usize {
        self.columns.len()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn column_values(&self, idx: usize) -> Vec<f64> {
        self.rows.iter().map(|r| r[idx]).collect()
    }

    /// Number of rows labelled 0 and 1.
    pub fn class_counts(&self) -> [usize; 2] {
        let positives = self.labels.iter().filter(|&&l| l == 1).count();
        [self.labels.len() - positives, positives]
    }

    /// Fails unless both classes are present.
    pub fn ensure_both_classes(&self) -> Result<()> {
        let [neg, pos] = self.class_counts();
        if neg == 0 || pos == 0 {
            return Err(StrokeError::DegenerateClasses(format!(
                "{neg} negative and {pos} positive rows"
            )));
        }
        Ok(())
    }

    /// Keep only the named columns, in the given order.
    pub fn select(&self, names: &[String]) -> Result<Dataset> {
        let idx = names
            .iter()
            .map(|n| {
                self.column_index(n)
                    .ok_or_else(|| StrokeError::Schema(format!("unknown column {n:?}")))
            })
            .collect::<Result<Vec<usize>>>()?;
        let rows = self
            .rows
            .iter()
            .map(|r| idx.iter().map(|&i| r[i]).collect())
            .collect();
        Ok(Dataset {
            columns: names.to_vec(),
            rows,
            labels: self.labels.clone(),
        })
    }

    pub fn to_matrix(&self) -> DenseMatrix<f64> {
        let flat: Vec<f64> = self.rows.iter().flatten().copied().collect();
        DenseMatrix::new(self.len(), self.n_features(), flat, false)
    }

    fn from_matrix(columns: &[String], x: &DenseMatrix<f64>, labels: Vec<i32>) -> Dataset {
        let (nrows, ncols) = x.shape();
        let rows = (0..nrows)
            .map(|r| (0..ncols).map(|c| *x.get((r, c))).collect())
            .collect();
        Dataset {
            columns: columns.to_vec(),
            rows,
            labels,
        }
    }

    /// Shuffled split with a fixed seed; returns (train, test).
    pub fn train_test_split(&self, test_size: f32, seed: u64) -> Result<(Dataset, Dataset)> {
        if !(test_size > 0.0 && test_size < 1.0) || self.len() < 2 {
            return Err(StrokeError::InvalidInput(format!(
                "cannot split {} rows with test size {test_size}",
                self.len()
            )));
        }
        let x = self.to_matrix();
        let (x_train, x_test, y_train, y_test) =
            train_test_split(&x, &self.labels, test_size, true, Some(seed));
        Ok((
            Dataset::from_matrix(&self.columns, &x_train, y_train),
            Dataset::from_matrix(&self.columns, &x_test, y_test),
        ))
    }
}
