//! The persisted model: classifier, encoders and the typed feature schema that ties them together.

use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use log::info;
use serde::{Deserialize, Serialize};

use crate::encoder::Encoders;
use crate::error::{Result, StrokeError};
use crate::forest::{Classifier, RandomForest};
use crate::records::{ColumnKind, StrokeRecord, FORCED_COLUMNS};

/// Bumped whenever the layout of [`ModelArtifact`] changes.
pub const ARTIFACT_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnDescriptor {
    pub name: String,
    pub kind: ColumnKind,
}

/// Ordered feature columns the classifier was trained on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureSchema {
    pub columns: Vec<ColumnDescriptor>,
}

impl FeatureSchema {
    pub fn from_names(names: &[String]) -> Result<Self> {
        let columns = names
            .iter()
            .map(|name| {
                StrokeRecord::kind_of(name)
                    .map(|kind| ColumnDescriptor {
                        name: name.clone(),
                        kind,
                    })
                    .ok_or_else(|| StrokeError::Schema(format!("unknown feature column {name:?}")))
            })
            .collect::<Result<Vec<_>>>()?;
        let schema = Self { columns };
        schema.validate()?;
        Ok(schema)
    }

    pub fn names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    fn validate(&self) -> Result<()> {
        if self.columns.is_empty() {
            return Err(StrokeError::Schema("feature schema is empty".into()));
        }
        for (i, col) in self.columns.iter().enumerate() {
            if self.columns[..i].iter().any(|c| c.name == col.name) {
                return Err(StrokeError::Schema(format!("column {:?} listed twice", col.name)));
            }
            match StrokeRecord::kind_of(&col.name) {
                Some(kind) if kind == col.kind => {}
                Some(kind) => {
                    return Err(StrokeError::Schema(format!(
                        "column {:?} stored as {:?}, expected {kind:?}",
                        col.name, col.kind
                    )))
                }
                None => return Err(StrokeError::Schema(format!("unknown feature column {:?}", col.name))),
            }
        }
        for forced in FORCED_COLUMNS {
            if !self.columns.iter().any(|c| c.name == forced) {
                return Err(StrokeError::Schema(format!("required column {forced:?} is missing")));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelArtifact {
    pub format_version: u32,
    pub schema: FeatureSchema,
    pub encoders: Encoders,
    pub classifier: RandomForest,
}

impl ModelArtifact {
    pub fn new(schema: FeatureSchema, encoders: Encoders, classifier: RandomForest) -> Result<Self> {
        let artifact = Self {
            format_version: ARTIFACT_VERSION,
            schema,
            encoders,
            classifier,
        };
        artifact.validate()?;
        Ok(artifact)
    }

    /// Schema, encoders and classifier must describe the same feature vector.
    pub fn validate(&self) -> Result<()> {
        if self.format_version != ARTIFACT_VERSION {
            return Err(StrokeError::Schema(format!(
                "artifact version {} is not supported (expected {ARTIFACT_VERSION})",
                self.format_version
            )));
        }
        self.schema.validate()?;
        for col in &self.schema.columns {
            if col.kind == ColumnKind::Categorical && !self.encoders.contains_key(&col.name) {
                return Err(StrokeError::Schema(format!("no encoder for column {:?}", col.name)));
            }
        }
        if self.classifier.n_features() != self.schema.len() {
            return Err(StrokeError::Schema(format!(
                "classifier expects {} features but the schema lists {}",
                self.classifier.n_features(),
                self.schema.len()
            )));
        }
        Ok(())
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| StrokeError::io(parent, e))?;
        }
        let file = File::create(path).map_err(|e| StrokeError::io(path, e))?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer(&mut writer, self)?;
        writer.flush().map_err(|e| StrokeError::io(path, e))?;
        info!("model artifact written to {}", path.display());
        Ok(())
    }

    pub fn load(path: &Path) -> Result<Self> {
        let file = File::open(path).map_err(|e| StrokeError::io(path, e))?;
        let artifact: ModelArtifact = serde_json::from_reader(BufReader::new(file))?;
        artifact.validate()?;
        info!(
            "loaded model artifact {} ({} features, {} trees)",
            path.display(),
            artifact.schema.len(),
            artifact.classifier.n_trees()
        );
        Ok(artifact)
    }
}
