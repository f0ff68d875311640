//! Training settings and logger setup shared by both binaries.

use std::path::PathBuf;

use env_logger::{Builder, Env};
use log::LevelFilter;

use crate::forest::ForestParams;
use crate::records::FORCED_COLUMNS;

pub static DEFAULT_INPUT: &str = "data/healthcare-dataset-stroke-data.csv";
pub static DEFAULT_MODEL_PATH: &str = "model/stroke_model.json";
pub static DEFAULT_REPORT_DIR: &str = "data/output/report/";
pub static SWEEP_FILE_NAME: &str = "estimator_sweep.csv";
pub static SILVER_FILE_NAME: &str = "silver/stroke.parquet";
pub static GOLD_FILE_NAME: &str = "gold/stroke.parquet";

/// Environment variable holding an env_logger filter, e.g. `STROKE_LOG=stroke_risk=debug`.
pub static LOG_ENV: &str = "STROKE_LOG";

#[derive(Debug, Clone)]
pub struct TrainingConfig {
    pub input: PathBuf,
    pub model_out: PathBuf,
    pub report_dir: PathBuf,
    /// Writes the cleaned and the balanced tables as parquet when set.
    pub export_dir: Option<PathBuf>,
    /// Features kept by each selector.
    pub k_features: usize,
    pub seed: u64,
    pub test_size: f32,
    pub smote_neighbors: usize,
    /// Forest used for recursive elimination.
    pub wrapper_forest: ForestParams,
    /// Forest that gets persisted.
    pub final_forest: ForestParams,
    pub sweep_sizes: Vec<usize>,
    pub forced_columns: Vec<&'static str>,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            input: PathBuf::from(DEFAULT_INPUT),
            model_out: PathBuf::from(DEFAULT_MODEL_PATH),
            report_dir: PathBuf::from(DEFAULT_REPORT_DIR),
            export_dir: None,
            k_features: 5,
            seed: 42,
            test_size: 0.3,
            smote_neighbors: 5,
            wrapper_forest: ForestParams::default().with_n_trees(100).with_seed(42),
            final_forest: ForestParams::default()
                .with_n_trees(200)
                .with_seed(42)
                .with_balanced(true),
            sweep_sizes: (1..121).step_by(10).collect(),
            forced_columns: FORCED_COLUMNS.to_vec(),
        }
    }
}

impl TrainingConfig {
    /// Applies one seed to every seeded stage.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self.wrapper_forest = self.wrapper_forest.with_seed(seed);
        self.final_forest = self.final_forest.with_seed(seed);
        self
    }
}

/// `-v` raises the level to debug, `-vv` to trace; `STROKE_LOG` overrides both.
pub fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => LevelFilter::Info,
        1 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    let env = Env::new().filter(LOG_ENV);
    let _ = Builder::new()
        .filter(Some("stroke_risk"), level)
        .filter(Some("stroke_train"), level)
        .filter(Some("stroke_form"), level)
        .parse_env(env)
        .try_init();
}
