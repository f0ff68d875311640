//! Single-record prediction against a loaded model artifact.

use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::artifact::{FeatureSchema, ModelArtifact};
use crate::error::{Result, StrokeError};
use crate::forest::Classifier;
use crate::records::{ColumnKind, StrokeRecord, MAX_AGE};

/// Fields as entered on the form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatientInput {
    pub work_type: String,
    pub gender: String,
    pub smoking_status: String,
    pub age: f64,
    pub ever_married: String,
    pub bmi: f64,
    pub residence_type: String,
    pub avg_glucose_level: f64,
    pub heart_disease: String,
    pub hypertension: String,
}

impl Default for PatientInput {
    fn default() -> Self {
        Self {
            work_type: "Private".into(),
            gender: "Male".into(),
            smoking_status: "never smoked".into(),
            age: 30.0,
            ever_married: "Yes".into(),
            bmi: 22.0,
            residence_type: "Urban".into(),
            avg_glucose_level: 85.0,
            heart_disease: "Yes".into(),
            hypertension: "Yes".into(),
        }
    }
}

enum FieldValue<'a> {
    Number(f64),
    Category(&'a str),
}

fn yes_no(field: &str, value: &str) -> Result<f64> {
    match value {
        "Yes" => Ok(1.0),
        "No" => Ok(0.0),
        other => Err(StrokeError::InvalidInput(format!("{field} must be Yes or No, got {other:?}"))),
    }
}

impl PatientInput {
    /// Range and choice checks the form enforces before anything reaches the encoders.
    pub fn validate(&self) -> Result<()> {
        let numbers = [
            ("age", self.age, Some(MAX_AGE)),
            ("bmi", self.bmi, None),
            ("avg_glucose_level", self.avg_glucose_level, None),
        ];
        for (field, value, max) in numbers {
            if !value.is_finite() || value < 0.0 || max.map_or(false, |m| value > m) {
                let bound = max.map_or_else(|| "at least 0".to_string(), |m| format!("between 0 and {m}"));
                return Err(StrokeError::InvalidInput(format!("{field} must be {bound}, got {value}")));
            }
        }
        for (field, value) in self.categories() {
            let allowed = StrokeRecord::choices(field).unwrap_or(&[]);
            if !allowed.iter().any(|a| *a == value) {
                return Err(StrokeError::InvalidInput(format!(
                    "{field} must be one of {allowed:?}, got {value:?}"
                )));
            }
        }
        Ok(())
    }

    fn categories(&self) -> [(&'static str, &str); 7] {
        [
            ("work_type", self.work_type.as_str()),
            ("gender", self.gender.as_str()),
            ("smoking_status", self.smoking_status.as_str()),
            ("ever_married", self.ever_married.as_str()),
            ("residence_type", self.residence_type.as_str()),
            ("heart_disease", self.heart_disease.as_str()),
            ("hypertension", self.hypertension.as_str()),
        ]
    }

    fn field(&self, column: &str) -> Result<FieldValue<'_>> {
        Ok(match column {
            "age" => FieldValue::Number(self.age),
            "bmi" => FieldValue::Number(self.bmi),
            "avg_glucose_level" => FieldValue::Number(self.avg_glucose_level),
            "heart_disease" => FieldValue::Number(yes_no(column, &self.heart_disease)?),
            "hypertension" => FieldValue::Number(yes_no(column, &self.hypertension)?),
            "work_type" => FieldValue::Category(&self.work_type),
            "gender" => FieldValue::Category(&self.gender),
            "smoking_status" => FieldValue::Category(&self.smoking_status),
            "ever_married" => FieldValue::Category(&self.ever_married),
            "residence_type" => FieldValue::Category(&self.residence_type),
            other => return Err(StrokeError::Schema(format!("form has no field for column {other:?}"))),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    High,
    Low,
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            RiskLevel::High => "high risk",
            RiskLevel::Low => "low risk",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Prediction {
    pub label: i32,
    pub risk: RiskLevel,
    /// `[p(no stroke), p(stroke)]`
    pub probabilities: [f64; 2],
    pub features: Vec<f64>,
}

/// Loaded once per process and shared read-only by every request.
#[derive(Debug)]
pub struct InferenceContext {
    artifact: ModelArtifact,
}

impl InferenceContext {
    pub fn new(artifact: ModelArtifact) -> Result<Self> {
        artifact.validate()?;
        for col in &artifact.schema.columns {
            if StrokeRecord::kind_of(&col.name).is_none() {
                return Err(StrokeError::Schema(format!("form has no field for column {:?}", col.name)));
            }
        }
        Ok(Self { artifact })
    }

    pub fn load(path: &Path) -> Result<Self> {
        Self::new(ModelArtifact::load(path)?)
    }

    pub fn schema(&self) -> &FeatureSchema {
        &self.artifact.schema
    }

    /// Encoded row in schema order, exactly as the classifier saw it in training.
    pub fn feature_vector(&self, input: &PatientInput) -> Result<Vec<f64>> {
        input.validate()?;
        self.artifact
            .schema
            .columns
            .iter()
            .map(|col| match (col.kind, input.field(&col.name)?) {
                (ColumnKind::Categorical, FieldValue::Category(value)) => {
                    let encoder = self.artifact.encoders.get(&col.name).ok_or_else(|| {
                        StrokeError::Schema(format!("no encoder for column {:?}", col.name))
                    })?;
                    Ok(f64::from(encoder.encode(value)?))
                }
                (ColumnKind::Numeric | ColumnKind::Binary, FieldValue::Number(v)) => Ok(v),
                (kind, _) => Err(StrokeError::Schema(format!(
                    "column {:?} is {kind:?} but the form supplies another type",
                    col.name
                ))),
            })
            .collect()
    }

    pub fn predict(&self, input: &PatientInput) -> Result<Prediction> {
        let features = self.feature_vector(input)?;
        let classifier = &self.artifact.classifier;
        let label = classifier.predict(&features)?;
        let probabilities = classifier.predict_probabilities(&features)?;
        Ok(Prediction {
            label,
            risk: if label == 1 { RiskLevel::High } else { RiskLevel::Low },
            probabilities,
            features,
        })
    }
}
