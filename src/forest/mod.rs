//! Random forest classifier and the narrow prediction interface the form uses.

mod tree;

use log::debug;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::dataset::Dataset;
use crate::error::{Result, StrokeError};

pub use tree::{DecisionTree, Node, TreeParams};

/// Anything that can score a single encoded feature row.
pub trait Classifier {
    fn n_features(&self) -> usize;

    /// `[p(class 0), p(class 1)]`, summing to one.
    fn predict_probabilities(&self, features: &[f64]) -> Result<[f64; 2]>;

    fn predict(&self, features: &[f64]) -> Result<i32> {
        let [p0, p1] = self.predict_probabilities(features)?;
        Ok(if p1 > p0 { 1 } else { 0 })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ForestParams {
    pub n_trees: usize,
    pub seed: u64,
    /// Weight classes inversely to their frequency in the training labels.
    pub balanced: bool,
    pub max_depth: Option<usize>,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
}

impl Default for ForestParams {
    fn default() -> Self {
        Self {
            n_trees: 100,
            seed: 42,
            balanced: false,
            max_depth: None,
            min_samples_split: 2,
            min_samples_leaf: 1,
        }
    }
}

impl ForestParams {
    pub fn with_n_trees(mut self, n_trees: usize) -> Self {
        self.n_trees = n_trees;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_balanced(mut self, balanced: bool) -> Self {
        self.balanced = balanced;
        self
    }

    pub fn with_max_depth(mut self, max_depth: Option<usize>) -> Self {
        self.max_depth = max_depth;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RandomForest {
    params: ForestParams,
    n_features: usize,
    trees: Vec<DecisionTree>,
    importances: Vec<f64>,
}

/// `n / (present * count)` per class, where `present` counts classes seen in `labels`;
/// absent classes get no weight.
fn balanced_weights(labels: &[usize]) -> [f64; 2] {
    let n = labels.len() as f64;
    let mut counts = [0usize; 2];
    for &l in labels {
        counts[l] += 1;
    }
    let present = counts.iter().filter(|&&c| c > 0).count() as f64;
    counts.map(|c| if c == 0 { 0.0 } else { n / (present * c as f64) })
}

fn tree_seed(seed: u64, tree: usize) -> u64 {
    seed.wrapping_add((tree as u64).wrapping_mul(0x9E37_79B9_7F4A_7C15))
}

impl RandomForest {
    pub fn fit(data: &Dataset, params: ForestParams) -> Result<Self> {
        if data.is_empty() || data.n_features() == 0 {
            return Err(StrokeError::Training("no rows or no features to fit".into()));
        }
        if params.n_trees == 0 {
            return Err(StrokeError::Training("a forest needs at least one tree".into()));
        }
        let labels = data
            .labels
            .iter()
            .map(|&l| match l {
                0 | 1 => Ok(l as usize),
                other => Err(StrokeError::Training(format!("label {other} is not binary"))),
            })
            .collect::<Result<Vec<usize>>>()?;

        let n_features = data.n_features();
        let class_weight = if params.balanced {
            balanced_weights(&labels)
        } else {
            [1.0, 1.0]
        };
        let tree_params = TreeParams {
            max_depth: params.max_depth,
            min_samples_split: params.min_samples_split,
            min_samples_leaf: params.min_samples_leaf,
            max_features: ((n_features as f64).sqrt() as usize).max(1),
        };
        let n = data.len();

        let fitted: Vec<(DecisionTree, Vec<f64>)> = (0..params.n_trees)
            .into_par_iter()
            .map(|t| {
                let mut rng = StdRng::seed_from_u64(tree_seed(params.seed, t));
                let bootstrap: Vec<usize> = (0..n).map(|_| rng.gen_range(0..n)).collect();
                DecisionTree::fit(&data.rows, &labels, bootstrap, class_weight, tree_params, &mut rng)
            })
            .collect();

        let mut importances = vec![0.0; n_features];
        let mut trees = Vec::with_capacity(fitted.len());
        for (tree, imp) in fitted {
            let total: f64 = imp.iter().sum();
            if total > 0.0 {
                for (acc, v) in importances.iter_mut().zip(&imp) {
                    *acc += v / total;
                }
            }
            trees.push(tree);
        }
        let total: f64 = importances.iter().sum();
        if total > 0.0 {
            importances.iter_mut().for_each(|v| *v /= total);
        }
        debug!(
            "fitted {} trees on {} rows x {} features (balanced: {})",
            trees.len(),
            n,
            n_features,
            params.balanced
        );

        Ok(Self {
            params,
            n_features,
            trees,
            importances,
        })
    }

    pub fn params(&self) -> &ForestParams {
        &self.params
    }

    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    /// Mean impurity decrease per feature, normalized to sum to one.
    pub fn feature_importances(&self) -> &[f64] {
        &self.importances
    }

    pub fn predict_batch(&self, rows: &[Vec<f64>]) -> Result<Vec<i32>> {
        rows.iter().map(|r| self.predict(r)).collect()
    }

    pub fn predict_probabilities_batch(&self, rows: &[Vec<f64>]) -> Result<Vec<[f64; 2]>> {
        rows.iter().map(|r| self.predict_probabilities(r)).collect()
    }
}

impl Classifier for RandomForest {
    fn n_features(&self) -> usize {
        self.n_features
    }

    fn predict_probabilities(&self, features: &[f64]) -> Result<[f64; 2]> {
        if features.len() != self.n_features {
            return Err(StrokeError::InvalidInput(format!(
                "expected {} features, got {}",
                self.n_features,
                features.len()
            )));
        }
        if features.iter().any(|v| !v.is_finite()) {
            return Err(StrokeError::InvalidInput("feature values must be finite".into()));
        }
        let mut sum = [0.0; 2];
        for tree in &self.trees {
            let [p0, p1] = tree.predict_probabilities(features);
            sum[0] += p0;
            sum[1] += p1;
        }
        let n = self.trees.len() as f64;
        Ok([sum[0] / n, sum[1] / n])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Label is 1 when the first feature is large; the second feature is noise.
    fn separable(n: usize) -> Dataset {
        let mut rng = StdRng::seed_from_u64(3);
        let rows: Vec<Vec<f64>> = (0..n)
            .map(|i| vec![i as f64, rng.gen_range(0.0..1.0)])
            .collect();
        let labels = (0..n).map(|i| (i >= n * 2 / 3) as i32).collect();
        Dataset::new(vec!["signal".into(), "noise".into()], rows, labels).unwrap()
    }

    #[test]
    fn fits_and_predicts_separable_data() {
        let data = separable(90);
        let forest = RandomForest::fit(&data, ForestParams::default().with_n_trees(15)).unwrap();
        assert_eq!(forest.n_trees(), 15);
        assert_eq!(forest.predict(&[5.0, 0.5]).unwrap(), 0);
        assert_eq!(forest.predict(&[85.0, 0.5]).unwrap(), 1);

        let [p0, p1] = forest.predict_probabilities(&[85.0, 0.5]).unwrap();
        assert!((p0 + p1 - 1.0).abs() < 1e-9);
        assert!(p1 > 0.5);
    }

    #[test]
    fn importance_favours_signal() {
        let data = separable(90);
        let forest = RandomForest::fit(&data, ForestParams::default().with_n_trees(20)).unwrap();
        let imp = forest.feature_importances();
        assert!((imp.iter().sum::<f64>() - 1.0).abs() < 1e-9);
        assert!(imp[0] > imp[1]);
    }

    #[test]
    fn same_seed_same_forest() {
        let data = separable(60);
        let params = ForestParams::default().with_n_trees(8).with_balanced(true);
        let a = RandomForest::fit(&data, params).unwrap();
        let b = RandomForest::fit(&data, params).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn rejects_wrong_width_and_bad_labels() {
        let data = separable(30);
        let forest = RandomForest::fit(&data, ForestParams::default().with_n_trees(3)).unwrap();
        assert!(forest.predict(&[1.0]).is_err());
        assert!(forest.predict(&[f64::NAN, 0.0]).is_err());

        let mut bad = data.clone();
        bad.labels[0] = 2;
        assert!(RandomForest::fit(&bad, ForestParams::default()).is_err());
        assert!(RandomForest::fit(&data, ForestParams::default().with_n_trees(0)).is_err());
    }

    #[test]
    fn balanced_weights_invert_frequency() {
        assert_eq!(balanced_weights(&[0, 0, 0, 1]), [4.0 / 6.0, 2.0]);
        assert_eq!(balanced_weights(&[0, 0]), [1.0, 0.0]);
        assert_eq!(balanced_weights(&[1, 1, 1]), [0.0, 1.0]);
        assert_eq!(balanced_weights(&[0, 1]), [1.0, 1.0]);
    }

    #[test]
    fn round_trips_through_json() {
        let data = separable(30);
        let forest = RandomForest::fit(&data, ForestParams::default().with_n_trees(4)).unwrap();
        let json = serde_json::to_string(&forest).unwrap();
        let back: RandomForest = serde_json::from_str(&json).unwrap();
        assert_eq!(
            forest.predict_probabilities(&[12.0, 0.3]).unwrap(),
            back.predict_probabilities(&[12.0, 0.3]).unwrap()
        );
    }
}
