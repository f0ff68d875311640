//! SMOTE oversampling of the minority class.

use log::{debug, info};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::dataset::Dataset;
use crate::error::{Result, StrokeError};

#[derive(Debug, Clone, Copy)]
pub struct Smote {
    pub k_neighbors: usize,
    pub seed: u64,
}

impl Default for Smote {
    fn default() -> Self {
        Self {
            k_neighbors: 5,
            seed: 42,
        }
    }
}

fn squared_distance(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum()
}

/// Indices of the `k` nearest rows to `rows[target]`, excluding itself.
fn nearest_neighbors(rows: &[&Vec<f64>], target: usize, k: usize) -> Vec<usize> {
    let mut dists: Vec<(f64, usize)> = rows
        .iter()
        .enumerate()
        .filter(|(i, _)| *i != target)
        .map(|(i, r)| (squared_distance(rows[target], r), i))
        .collect();
    dists.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));
    dists.into_iter().take(k).map(|(_, i)| i).collect()
}

impl Smote {
    pub fn new(k_neighbors: usize, seed: u64) -> Self {
        Self { k_neighbors, seed }
    }

    /// Returns the input rows followed by synthetic minority rows, so both classes end up with
    /// the majority count.
    pub fn fit_resample(&self, data: &Dataset) -> Result<Dataset> {
        data.ensure_both_classes()?;
        let [neg, pos] = data.class_counts();
        let (minority_label, n_min, n_maj) = if pos <= neg { (1, pos, neg) } else { (0, neg, pos) };
        if n_min < 2 {
            return Err(StrokeError::DegenerateClasses(format!(
                "only {n_min} row(s) of class {minority_label}, cannot interpolate"
            )));
        }
        let k = self.k_neighbors.min(n_min - 1).max(1);

        let minority: Vec<&Vec<f64>> = data
            .rows
            .iter()
            .zip(&data.labels)
            .filter(|&(_, &l)| l == minority_label)
            .map(|(r, _)| r)
            .collect();
        let neighbors: Vec<Vec<usize>> = (0..minority.len())
            .map(|i| nearest_neighbors(&minority, i, k))
            .collect();

        let n_new = n_maj - n_min;
        debug!("smote: {n_min} minority rows, k={k}, generating {n_new}");
        let mut rng = StdRng::seed_from_u64(self.seed);
        let mut rows = data.rows.clone();
        let mut labels = data.labels.clone();
        rows.reserve(n_new);
        labels.reserve(n_new);
        for _ in 0..n_new {
            let i = rng.gen_range(0..minority.len());
            let nn = neighbors[i][rng.gen_range(0..neighbors[i].len())];
            let gap: f64 = rng.gen();
            let sample = minority[i]
                .iter()
                .zip(minority[nn].iter())
                .map(|(a, b)| a + gap * (b - a))
                .collect();
            rows.push(sample);
            labels.push(minority_label);
        }

        info!(
            "balanced {} rows into {} ({} per class)",
            data.len(),
            rows.len(),
            n_maj
        );
        Dataset::new(data.columns.clone(), rows, labels)
    }
}
