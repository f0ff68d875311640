//! Fixtures shared by the integration tests.

#![allow(dead_code)]

use std::io::Write;
use std::path::Path;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use stroke_risk::artifact::{FeatureSchema, ModelArtifact};
use stroke_risk::config::TrainingConfig;
use stroke_risk::dataset::Dataset;
use stroke_risk::encoder::{Encoders, LabelEncoder};
use stroke_risk::forest::{ForestParams, RandomForest};
use stroke_risk::inference::PatientInput;
use stroke_risk::records::StrokeRecord;

pub const HEADER: &str = "id,gender,age,hypertension,heart_disease,ever_married,work_type,Residence_type,avg_glucose_level,bmi,smoking_status,stroke";

/// Roughly one stroke in eight, driven by age, glucose and hypertension. A few rows carry N/A bmi.
pub fn write_stroke_csv(path: &Path, rows: usize, seed: u64) {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut file = std::fs::File::create(path).unwrap();
    writeln!(file, "{HEADER}").unwrap();
    let genders = ["Male", "Female", "Other"];
    let works = ["Private", "Self-employed", "Govt_job", "children", "Never_worked"];
    let smoking = ["never smoked", "smokes", "formerly smoked", "Unknown"];
    for id in 0..rows {
        let age: f64 = rng.gen_range(1.0..90.0_f64).round();
        let hypertension = rng.gen_bool(if age > 60.0 { 0.3 } else { 0.05 }) as i32;
        let heart_disease = rng.gen_bool(if age > 60.0 { 0.2 } else { 0.03 }) as i32;
        let glucose: f64 = rng.gen_range(55.0..260.0_f64);
        let bmi = if rng.gen_bool(0.03) {
            "N/A".to_string()
        } else {
            format!("{:.1}", rng.gen_range(15.0..45.0_f64))
        };
        let risk = (age - 50.0).max(0.0) / 40.0 + (glucose - 150.0).max(0.0) / 200.0 + 0.3 * hypertension as f64;
        let stroke = (risk > 0.75 || (id % 41 == 0)) as i32;
        writeln!(
            file,
            "{},{},{},{},{},{},{},{},{:.2},{},{},{}",
            id,
            genders[rng.gen_range(0..genders.len())],
            age,
            hypertension,
            heart_disease,
            if age > 25.0 && rng.gen_bool(0.7) { "Yes" } else { "No" },
            works[rng.gen_range(0..works.len())],
            if rng.gen_bool(0.5) { "Urban" } else { "Rural" },
            glucose,
            bmi,
            smoking[rng.gen_range(0..smoking.len())],
            stroke
        )
        .unwrap();
    }
    file.flush().unwrap();
}

/// Small, fast configuration writing everything under `dir`.
pub fn quick_config(dir: &Path, input: &Path) -> TrainingConfig {
    let mut cfg = TrainingConfig::default();
    cfg.input = input.to_path_buf();
    cfg.model_out = dir.join("model").join("stroke_model.json");
    cfg.report_dir = dir.join("report");
    cfg.k_features = 3;
    cfg.wrapper_forest = cfg.wrapper_forest.with_n_trees(8);
    cfg.final_forest = cfg.final_forest.with_n_trees(15);
    cfg.sweep_sizes = vec![1, 6, 11];
    cfg
}

/// Encoders fit on every category the real dataset contains.
pub fn reference_encoders() -> Encoders {
    let mut encoders = Encoders::new();
    let fits: [(&str, &[&str]); 5] = [
        ("gender", &["Male", "Female", "Other"][..]),
        ("ever_married", &["Yes", "No"][..]),
        ("work_type", &["Private", "Self-employed", "Govt_job", "children", "Never_worked"][..]),
        ("residence_type", &["Urban", "Rural"][..]),
        ("smoking_status", &["formerly smoked", "never smoked", "smokes", "Unknown"][..]),
    ];
    for (column, values) in fits {
        encoders.insert(column.to_string(), LabelEncoder::fit(column, values.iter().copied()).unwrap());
    }
    encoders
}

/// Artifact over all ten feature columns in dataset order, with a small forest.
pub fn reference_artifact(encoders: Encoders) -> ModelArtifact {
    let columns: Vec<String> = StrokeRecord::feature_columns()
        .iter()
        .map(|(name, _)| name.to_string())
        .collect();
    let mut rng = StdRng::seed_from_u64(5);
    let rows: Vec<Vec<f64>> = (0..60)
        .map(|i| {
            let mut row: Vec<f64> = (0..columns.len()).map(|_| rng.gen_range(0.0..3.0)).collect();
            row[1] = i as f64 * 1.5;
            row
        })
        .collect();
    let labels = (0..60).map(|i| (i >= 40) as i32).collect();
    let data = Dataset::new(columns.clone(), rows, labels).unwrap();
    let forest = RandomForest::fit(&data, ForestParams::default().with_n_trees(10)).unwrap();
    ModelArtifact::new(FeatureSchema::from_names(&columns).unwrap(), encoders, forest).unwrap()
}

pub fn reference_input() -> PatientInput {
    PatientInput {
        work_type: "Private".into(),
        gender: "Female".into(),
        smoking_status: "never smoked".into(),
        age: 45.0,
        ever_married: "Yes".into(),
        bmi: 24.5,
        residence_type: "Urban".into(),
        avg_glucose_level: 90.0,
        heart_disease: "No".into(),
        hypertension: "No".into(),
    }
}
