//! End-to-end training run: clean, balance, select, fit, evaluate, persist.

use std::fmt;
use std::fs;

use log::info;
use serde::Serialize;

use crate::artifact::{FeatureSchema, ModelArtifact};
use crate::balance::Smote;
use crate::config::{TrainingConfig, GOLD_FILE_NAME, SILVER_FILE_NAME, SWEEP_FILE_NAME};
use crate::error::{Result, StrokeError};
use crate::evaluation::{
    estimator_sweep, score, write_sweep_csv, ClassificationReport, ConfusionMatrix, SweepPoint,
};
use crate::forest::RandomForest;
use crate::prep;
use crate::scale::MinMaxScaler;
use crate::selection::{select_features, FeatureSelection};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrainingReport {
    pub total_rows: usize,
    pub balanced_rows: usize,
    pub train_rows: usize,
    pub test_rows: usize,
    pub selection: FeatureSelection,
    pub accuracy: f64,
    pub confusion: ConfusionMatrix,
    pub classification: ClassificationReport,
    pub sweep: Vec<SweepPoint>,
}

pub fn run(cfg: &TrainingConfig) -> Result<TrainingReport> {
    let (mut df, data, encoders) = prep::load_dataset(&cfg.input)?;
    if let Some(dir) = &cfg.export_dir {
        prep::write_parquet(&dir.join(SILVER_FILE_NAME), &mut df)?;
    }

    let balanced = Smote::new(cfg.smote_neighbors, cfg.seed).fit_resample(&data)?;
    info!("total rows after balancing: {}", balanced.len());

    // selectors see normalized values, the model is fit on the balanced originals
    let normalized = MinMaxScaler::fit_transform(&balanced);
    let selection = select_features(
        &normalized,
        cfg.k_features,
        cfg.wrapper_forest,
        &cfg.forced_columns,
    )?;
    let selected = balanced.select(&selection.combined)?;
    if let Some(dir) = &cfg.export_dir {
        prep::write_parquet(&dir.join(GOLD_FILE_NAME), &mut prep::to_frame(&selected)?)?;
    }

    let (train, test) = selected.train_test_split(cfg.test_size, cfg.seed)?;
    info!("training rows: {}, test rows: {}", train.len(), test.len());
    test.ensure_both_classes()?;

    let model = RandomForest::fit(&train, cfg.final_forest)?;
    let accuracy = score(&model, &test)?;
    let predicted = model.predict_batch(&test.rows)?;
    let confusion = ConfusionMatrix::from_predictions(&test.labels, &predicted)?;
    let classification = ClassificationReport::from_confusion(&confusion);
    info!("model accuracy: {:.2}%", accuracy * 100.0);

    let sweep = estimator_sweep(&train, &test, cfg.sweep_sizes.iter().copied(), cfg.final_forest)?;
    if !sweep.is_empty() {
        fs::create_dir_all(&cfg.report_dir).map_err(|e| StrokeError::io(&cfg.report_dir, e))?;
        write_sweep_csv(&cfg.report_dir.join(SWEEP_FILE_NAME), &sweep)?;
    }

    let schema = FeatureSchema::from_names(&selection.combined)?;
    ModelArtifact::new(schema, encoders, model)?.save(&cfg.model_out)?;

    Ok(TrainingReport {
        total_rows: data.len(),
        balanced_rows: balanced.len(),
        train_rows: train.len(),
        test_rows: test.len(),
        selection,
        accuracy,
        confusion,
        classification,
        sweep,
    })
}

impl fmt::Display for TrainingReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Total rows: {}", self.total_rows)?;
        writeln!(f, "Rows after balancing: {}", self.balanced_rows)?;
        writeln!(f, "Training rows: {}", self.train_rows)?;
        writeln!(f, "Test rows: {}", self.test_rows)?;
        writeln!(f, "Model accuracy: {:.2}%", self.accuracy * 100.0)?;
        writeln!(f)?;
        writeln!(f, "Confusion matrix:")?;
        write!(f, "{}", self.confusion)?;
        writeln!(f)?;
        writeln!(f, "Classification report:")?;
        write!(f, "{}", self.classification)?;
        writeln!(f)?;
        writeln!(f, "Filter features: {:?}", self.selection.filter)?;
        writeln!(f, "Wrapper features: {:?}", self.selection.wrapper)?;
        writeln!(f, "Combined features: {:?}", self.selection.combined)?;
        if !self.sweep.is_empty() {
            writeln!(f)?;
            writeln!(f, "{:>12} {:>10} {:>10}", "estimators", "train", "test")?;
            for p in &self.sweep {
                writeln!(f, "{:>12} {:>10.4} {:>10.4}", p.n_estimators, p.train_accuracy, p.test_accuracy)?;
            }
        }
        Ok(())
    }
}
