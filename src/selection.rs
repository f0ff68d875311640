//! Filter (chi-squared) and wrapper (recursive elimination) feature selection.

use log::{debug, info};
use serde::Serialize;

use crate::dataset::Dataset;
use crate::error::{Result, StrokeError};
use crate::forest::{ForestParams, RandomForest};

/// Outcome of both selectors and their reconciliation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeatureSelection {
    pub filter: Vec<String>,
    pub wrapper: Vec<String>,
    pub combined: Vec<String>,
}

/// Chi-squared statistic between each feature and the label. Inputs must be non-negative.
pub fn chi2_scores(data: &Dataset) -> Result<Vec<f64>> {
    if data.rows.iter().flatten().any(|&v| v < 0.0) {
        return Err(StrokeError::InvalidInput(
            "chi-squared scoring needs non-negative features".into(),
        ));
    }
    let n_features = data.n_features();
    let mut observed = [vec![0.0; n_features], vec![0.0; n_features]];
    let mut class_rows = [0usize; 2];
    for (row, &label) in data.rows.iter().zip(&data.labels) {
        let class = (label == 1) as usize;
        class_rows[class] += 1;
        for (acc, v) in observed[class].iter_mut().zip(row) {
            *acc += v;
        }
    }

    let n = data.len() as f64;
    let scores = (0..n_features)
        .map(|f| {
            let feature_total = observed[0][f] + observed[1][f];
            (0..2)
                .map(|c| {
                    let expected = class_rows[c] as f64 / n * feature_total;
                    let diff = observed[c][f] - expected;
                    diff * diff / expected
                })
                .sum()
        })
        .collect();
    Ok(scores)
}

/// Column names of the `k` highest scoring features, in column order.
pub fn select_k_best(data: &Dataset, k: usize) -> Result<Vec<String>> {
    let scores = chi2_scores(data)?;
    let mut ranked: Vec<usize> = (0..scores.len()).collect();
    // NaN (feature with no mass) ranks last
    let key = |i: usize| if scores[i].is_nan() { f64::NEG_INFINITY } else { scores[i] };
    ranked.sort_by(|&a, &b| key(b).total_cmp(&key(a)).then(a.cmp(&b)));
    for &i in &ranked {
        debug!("chi2 {:>20}: {:.4}", data.columns[i], scores[i]);
    }
    let mut keep: Vec<usize> = ranked.into_iter().take(k).collect();
    keep.sort_unstable();
    Ok(keep.into_iter().map(|i| data.columns[i].clone()).collect())
}

/// Fit a forest, drop the least important feature, repeat until `k` remain.
pub fn recursive_elimination(data: &Dataset, k: usize, params: ForestParams) -> Result<Vec<String>> {
    if k == 0 {
        return Err(StrokeError::InvalidInput("cannot eliminate down to zero features".into()));
    }
    let mut remaining = data.columns.clone();
    while remaining.len() > k {
        let subset = data.select(&remaining)?;
        let forest = RandomForest::fit(&subset, params)?;
        let importances = forest.feature_importances();
        let weakest = (0..remaining.len())
            .min_by(|&a, &b| importances[a].total_cmp(&importances[b]).then(a.cmp(&b)))
            .ok_or_else(|| StrokeError::Training("no features left to eliminate".into()))?;
        debug!(
            "rfe: dropping {} (importance {:.4}), {} left",
            remaining[weakest],
            importances[weakest],
            remaining.len() - 1
        );
        remaining.remove(weakest);
    }
    Ok(remaining)
}

/// Union of both selections in dataset column order, then each forced column not yet present.
pub fn combine(columns: &[String], filter: &[String], wrapper: &[String], forced: &[&str]) -> Vec<String> {
    let mut combined: Vec<String> = columns
        .iter()
        .filter(|c| filter.contains(c) || wrapper.contains(c))
        .cloned()
        .collect();
    for col in forced {
        if !combined.iter().any(|c| c == col) {
            combined.push(col.to_string());
        }
    }
    combined
}

/// Run both selectors on the normalized data and reconcile them.
pub fn select_features(
    normalized: &Dataset,
    k: usize,
    wrapper_params: ForestParams,
    forced: &[&str],
) -> Result<FeatureSelection> {
    for col in forced {
        if normalized.column_index(col).is_none() {
            return Err(StrokeError::Schema(format!("forced column {col:?} is missing")));
        }
    }
    let filter = select_k_best(normalized, k)?;
    let wrapper = recursive_elimination(normalized, k, wrapper_params)?;
    let combined = combine(&normalized.columns, &filter, &wrapper, forced);
    info!("filter selected {filter:?}");
    info!("wrapper selected {wrapper:?}");
    info!("combined feature set {combined:?}");
    Ok(FeatureSelection {
        filter,
        wrapper,
        combined,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn chi2_matches_hand_computation() {
        // feature a appears only in class 1, feature b is spread evenly
        let data = Dataset::new(
            names(&["a", "b"]),
            vec![vec![0.0, 1.0], vec![0.0, 1.0], vec![1.0, 1.0], vec![1.0, 1.0]],
            vec![0, 0, 1, 1],
        )
        .unwrap();
        let scores = chi2_scores(&data).unwrap();
        // a: observed [0, 2], expected [1, 1] -> 1 + 1
        assert!((scores[0] - 2.0).abs() < 1e-12);
        assert!(scores[1].abs() < 1e-12);
    }

    #[test]
    fn chi2_rejects_negative_values() {
        let data = Dataset::new(names(&["a"]), vec![vec![-1.0], vec![1.0]], vec![0, 1]).unwrap();
        assert!(chi2_scores(&data).is_err());
    }

    #[test]
    fn k_best_keeps_column_order_and_demotes_nan() {
        let data = Dataset::new(
            names(&["empty", "weak", "strong"]),
            vec![
                vec![0.0, 0.4, 0.0],
                vec![0.0, 0.6, 0.1],
                vec![0.0, 0.5, 1.0],
                vec![0.0, 0.5, 0.9],
            ],
            vec![0, 0, 1, 1],
        )
        .unwrap();
        assert_eq!(select_k_best(&data, 2).unwrap(), names(&["weak", "strong"]));
    }

    #[test]
    fn combine_unions_and_forces_once() {
        let cols = names(&["gender", "age", "hypertension", "heart_disease", "bmi"]);
        let combined = combine(
            &cols,
            &names(&["age", "hypertension"]),
            &names(&["bmi", "age"]),
            &["heart_disease", "hypertension"],
        );
        assert_eq!(combined, names(&["age", "hypertension", "bmi", "heart_disease"]));
        for forced in ["heart_disease", "hypertension"] {
            assert_eq!(combined.iter().filter(|c| *c == forced).count(), 1);
        }
    }

    #[test]
    fn elimination_keeps_informative_features() {
        let rows: Vec<Vec<f64>> = (0..80)
            .map(|i| {
                let x = i as f64 / 80.0;
                vec![x, ((i * 7) % 5) as f64 / 5.0, 0.5]
            })
            .collect();
        let labels = (0..80).map(|i| (i >= 40) as i32).collect();
        let data = Dataset::new(names(&["signal", "noise", "constant"]), rows, labels).unwrap();
        let kept = recursive_elimination(&data, 1, ForestParams::default().with_n_trees(10)).unwrap();
        assert_eq!(kept, names(&["signal"]));
    }

    #[test]
    fn select_features_requires_forced_columns() {
        let data = Dataset::new(names(&["a"]), vec![vec![0.0], vec![1.0]], vec![0, 1]).unwrap();
        let err = select_features(&data, 1, ForestParams::default().with_n_trees(2), &["hypertension"]);
        assert!(matches!(err, Err(StrokeError::Schema(_))));
    }
}
