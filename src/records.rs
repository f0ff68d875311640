use polars::prelude::{DataType, Field, Schema};
use serde::{Deserialize, Serialize};

pub const ID_COLUMN: &str = "id";
pub const TARGET_COLUMN: &str = "stroke";

/// Columns that are always fed to the classifier, whatever the selectors pick.
pub const FORCED_COLUMNS: [&str; 2] = ["heart_disease", "hypertension"];

pub const WORK_TYPES: [&str; 5] = [
    "Private",
    "Self-employed",
    "Govt_job",
    "children",
    "Never_worked",
];
pub const GENDERS: [&str; 2] = ["Male", "Female"];
pub const SMOKING_STATUSES: [&str; 3] = ["never smoked", "smokes", "formerly smoked"];
pub const YES_NO: [&str; 2] = ["Yes", "No"];
pub const RESIDENCE_TYPES: [&str; 2] = ["Urban", "Rural"];

pub const MAX_AGE: f64 = 120.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnKind {
    Numeric,
    /// 0/1 flag. Entered as Yes/No on the form.
    Binary,
    Categorical,
}

pub struct StrokeRecord {}

impl StrokeRecord {
    /// Dtypes as the CSV should be read. Names are the ones found in the file header.
    pub fn raw_schema() -> Schema {
        Schema::from_iter(vec![
            Field::new("id", DataType::Int32),
            Field::new("gender", DataType::Utf8),
            Field::new("age", DataType::Float64),
            Field::new("hypertension", DataType::Int32),
            Field::new("heart_disease", DataType::Int32),
            Field::new("ever_married", DataType::Utf8),
            Field::new("work_type", DataType::Utf8),
            Field::new("Residence_type", DataType::Utf8),
            Field::new("avg_glucose_level", DataType::Float64),
            Field::new("bmi", DataType::Float64),
            Field::new("smoking_status", DataType::Utf8),
            Field::new("stroke", DataType::Int32),
        ])
    }

    /// Feature columns after loading, with the header names lower-cased.
    pub fn feature_columns() -> [(&'static str, ColumnKind); 10] {
        [
            ("gender", ColumnKind::Categorical),
            ("age", ColumnKind::Numeric),
            ("hypertension", ColumnKind::Binary),
            ("heart_disease", ColumnKind::Binary),
            ("ever_married", ColumnKind::Categorical),
            ("work_type", ColumnKind::Categorical),
            ("residence_type", ColumnKind::Categorical),
            ("avg_glucose_level", ColumnKind::Numeric),
            ("bmi", ColumnKind::Numeric),
            ("smoking_status", ColumnKind::Categorical),
        ]
    }

    pub fn kind_of(column: &str) -> Option<ColumnKind> {
        Self::feature_columns()
            .into_iter()
            .find(|(name, _)| *name == column)
            .map(|(_, kind)| kind)
    }

    /// Every column the cleaned frame must carry.
    pub fn required_columns() -> Vec<&'static str> {
        let mut cols: Vec<&'static str> =
            Self::feature_columns().iter().map(|(name, _)| *name).collect();
        cols.push(TARGET_COLUMN);
        cols
    }

    /// Fixed choices the form offers for a categorical field.
    pub fn choices(column: &str) -> Option<&'static [&'static str]> {
        match column {
            "work_type" => Some(&WORK_TYPES),
            "gender" => Some(&GENDERS),
            "smoking_status" => Some(&SMOKING_STATUSES),
            "ever_married" | "heart_disease" | "hypertension" => Some(&YES_NO),
            "residence_type" => Some(&RESIDENCE_TYPES),
            _ => None,
        }
    }
}
