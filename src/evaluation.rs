//! Accuracy, confusion matrix, per-class report and the ensemble-size sweep.

use std::fmt;
use std::path::Path;

use log::info;
use serde::Serialize;
use smartcore::metrics::accuracy;

use crate::dataset::Dataset;
use crate::error::{Result, StrokeError};
use crate::forest::{ForestParams, RandomForest};

pub const CLASS_NAMES: [&str; 2] = ["No stroke", "Stroke"];

pub fn score(model: &RandomForest, data: &Dataset) -> Result<f64> {
    if data.is_empty() {
        return Err(StrokeError::Training("cannot score an empty partition".into()));
    }
    let predicted = model.predict_batch(&data.rows)?;
    Ok(accuracy(&data.labels, &predicted))
}

/// Rows are the actual class, columns the predicted class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ConfusionMatrix(pub [[usize; 2]; 2]);

impl ConfusionMatrix {
    pub fn from_predictions(actual: &[i32], predicted: &[i32]) -> Result<Self> {
        if actual.len() != predicted.len() {
            return Err(StrokeError::InvalidInput(format!(
                "{} labels but {} predictions",
                actual.len(),
                predicted.len()
            )));
        }
        let mut m = [[0usize; 2]; 2];
        for (&a, &p) in actual.iter().zip(predicted) {
            m[(a == 1) as usize][(p == 1) as usize] += 1;
        }
        Ok(Self(m))
    }

    pub fn true_negatives(&self) -> usize {
        self.0[0][0]
    }

    pub fn false_positives(&self) -> usize {
        self.0[0][1]
    }

    pub fn false_negatives(&self) -> usize {
        self.0[1][0]
    }

    pub fn true_positives(&self) -> usize {
        self.0[1][1]
    }

    pub fn total(&self) -> usize {
        self.0.iter().flatten().sum()
    }
}

impl fmt::Display for ConfusionMatrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{:>14} {:>12} {:>12}", "actual\\pred", CLASS_NAMES[0], CLASS_NAMES[1])?;
        for (name, row) in CLASS_NAMES.iter().zip(self.0.iter()) {
            writeln!(f, "{:>14} {:>12} {:>12}", name, row[0], row[1])?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ClassMetrics {
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    pub support: usize,
}

/// A zero denominator scores 1.0 rather than failing.
fn ratio(num: usize, den: usize) -> f64 {
    if den == 0 {
        1.0
    } else {
        num as f64 / den as f64
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassificationReport {
    pub classes: [ClassMetrics; 2],
    pub accuracy: f64,
    pub macro_avg: ClassMetrics,
    pub weighted_avg: ClassMetrics,
}

impl ClassificationReport {
    pub fn from_confusion(cm: &ConfusionMatrix) -> Self {
        let m = cm.0;
        let per_class = |c: usize| {
            let other = 1 - c;
            let tp = m[c][c];
            let precision = ratio(tp, tp + m[other][c]);
            let recall = ratio(tp, tp + m[c][other]);
            let f1 = if precision + recall == 0.0 {
                0.0
            } else {
                2.0 * precision * recall / (precision + recall)
            };
            ClassMetrics {
                precision,
                recall,
                f1,
                support: m[c][0] + m[c][1],
            }
        };
        let classes = [per_class(0), per_class(1)];
        let total = cm.total();

        let macro_avg = ClassMetrics {
            precision: (classes[0].precision + classes[1].precision) / 2.0,
            recall: (classes[0].recall + classes[1].recall) / 2.0,
            f1: (classes[0].f1 + classes[1].f1) / 2.0,
            support: total,
        };
        let weigh = |get: fn(&ClassMetrics) -> f64| {
            if total == 0 {
                return 0.0;
            }
            classes
                .iter()
                .map(|c| get(c) * c.support as f64)
                .sum::<f64>()
                / total as f64
        };
        let weighted_avg = ClassMetrics {
            precision: weigh(|c| c.precision),
            recall: weigh(|c| c.recall),
            f1: weigh(|c| c.f1),
            support: total,
        };

        Self {
            classes,
            accuracy: ratio(cm.true_negatives() + cm.true_positives(), total),
            macro_avg,
            weighted_avg,
        }
    }
}

impl fmt::Display for ClassificationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{:>14} {:>10} {:>10} {:>10} {:>10}", "", "precision", "recall", "f1-score", "support")?;
        for (name, m) in CLASS_NAMES.iter().zip(self.classes.iter()) {
            writeln!(
                f,
                "{:>14} {:>10.2} {:>10.2} {:>10.2} {:>10}",
                name, m.precision, m.recall, m.f1, m.support
            )?;
        }
        writeln!(f)?;
        writeln!(f, "{:>14} {:>10} {:>10} {:>10.2} {:>10}", "accuracy", "", "", self.accuracy, self.macro_avg.support)?;
        for (name, m) in [("macro avg", &self.macro_avg), ("weighted avg", &self.weighted_avg)] {
            writeln!(
                f,
                "{:>14} {:>10.2} {:>10.2} {:>10.2} {:>10}",
                name, m.precision, m.recall, m.f1, m.support
            )?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SweepPoint {
    pub n_estimators: usize,
    pub train_accuracy: f64,
    pub test_accuracy: f64,
}

/// Train one forest per ensemble size and record train/test accuracy. Diagnostic only.
pub fn estimator_sweep(
    train: &Dataset,
    test: &Dataset,
    sizes: impl IntoIterator<Item = usize>,
    params: ForestParams,
) -> Result<Vec<SweepPoint>> {
    sizes
        .into_iter()
        .map(|n| {
            let model = RandomForest::fit(train, params.with_n_trees(n))?;
            let point = SweepPoint {
                n_estimators: n,
                train_accuracy: score(&model, train)?,
                test_accuracy: score(&model, test)?,
            };
            info!(
                "sweep n_estimators={:>3} train={:.4} test={:.4}",
                n, point.train_accuracy, point.test_accuracy
            );
            Ok(point)
        })
        .collect()
}

pub fn write_sweep_csv(path: &Path, points: &[SweepPoint]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)?;
    for point in points {
        writer.serialize(point)?;
    }
    writer.flush().map_err(|e| StrokeError::io(path, e))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn confusion_counts_each_cell() {
        let cm = ConfusionMatrix::from_predictions(&[0, 0, 1, 1, 1], &[0, 1, 1, 0, 1]).unwrap();
        assert_eq!(cm.true_negatives(), 1);
        assert_eq!(cm.false_positives(), 1);
        assert_eq!(cm.false_negatives(), 1);
        assert_eq!(cm.true_positives(), 2);
        assert_eq!(cm.total(), 5);
        assert!(ConfusionMatrix::from_predictions(&[0], &[0, 1]).is_err());
    }

    #[test]
    fn report_matches_confusion() {
        let cm = ConfusionMatrix([[8, 2], [1, 9]]);
        let report = ClassificationReport::from_confusion(&cm);
        let stroke = report.classes[1];
        assert!((stroke.precision - 9.0 / 11.0).abs() < 1e-12);
        assert!((stroke.recall - 0.9).abs() < 1e-12);
        assert_eq!(stroke.support, 10);
        assert!((report.accuracy - 0.85).abs() < 1e-12);
        assert_eq!(report.weighted_avg.support, 20);
    }

    #[test]
    fn zero_division_scores_one() {
        // nothing predicted positive, no positives present
        let cm = ConfusionMatrix([[5, 0], [0, 0]]);
        let report = ClassificationReport::from_confusion(&cm);
        assert_eq!(report.classes[1].precision, 1.0);
        assert_eq!(report.classes[1].recall, 1.0);
        assert_eq!(report.classes[0].f1, 1.0);
    }

    #[test]
    fn sweep_writes_one_row_per_size() {
        let rows: Vec<Vec<f64>> = (0..40).map(|i| vec![i as f64]).collect();
        let labels: Vec<i32> = (0..40).map(|i| (i >= 20) as i32).collect();
        let data = Dataset::new(vec!["x".into()], rows, labels).unwrap();
        let points = estimator_sweep(&data, &data, [1, 3, 5], ForestParams::default().with_balanced(true)).unwrap();
        assert_eq!(points.iter().map(|p| p.n_estimators).collect::<Vec<_>>(), vec![1, 3, 5]);
        assert!(points.iter().all(|p| p.train_accuracy > 0.8));

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sweep.csv");
        write_sweep_csv(&path, &points).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.starts_with("n_estimators,train_accuracy,test_accuracy"));
        assert_eq!(text.lines().count(), 4);
    }
}
