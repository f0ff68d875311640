use std::path::PathBuf;

use polars::prelude::PolarsError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, StrokeError>;

#[derive(Error, Debug)]
pub enum StrokeError {
    #[error("cannot access {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error(transparent)]
    Polars(#[from] PolarsError),
    #[error("invalid model artifact: {0}")]
    Json(#[from] serde_json::Error),
    #[error("cannot write report: {0}")]
    Csv(#[from] csv::Error),
    #[error("schema mismatch: {0}")]
    Schema(String),
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("category {value:?} was never seen for column {column:?}")]
    UnknownCategory { column: String, value: String },
    #[error("degenerate class distribution: {0}")]
    DegenerateClasses(String),
    #[error("training failed: {0}")]
    Training(String),
}

impl StrokeError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        StrokeError::Io {
            path: path.into(),
            source,
        }
    }

    /// True for errors caused by what the operator typed rather than by the model or the host.
    pub fn is_usage_error(&self) -> bool {
        matches!(
            self,
            StrokeError::InvalidInput(_) | StrokeError::UnknownCategory { .. }
        )
    }
}

impl From<std::io::Error> for StrokeError {
    fn from(e: std::io::Error) -> Self {
        StrokeError::Io {
            path: PathBuf::new(),
            source: e,
        }
    }
}
