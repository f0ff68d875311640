//! Label encoding for categorical columns.
//!
//! Classes are sorted before codes are assigned, so the same set of observed
//! values always yields the same mapping regardless of row order.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::error::{Result, StrokeError};

/// Column name to fitted encoder.
pub type Encoders = BTreeMap<String, LabelEncoder>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelEncoder {
    column: String,
    classes: Vec<String>,
}

impl LabelEncoder {
    pub fn fit<'a, I>(column: &str, values: I) -> Result<Self>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let classes: BTreeSet<&str> = values.into_iter().collect();
        if classes.is_empty() {
            return Err(StrokeError::Schema(format!(
                "column {column:?} has no values to encode"
            )));
        }
        Ok(Self {
            column: column.to_string(),
            classes: classes.into_iter().map(str::to_string).collect(),
        })
    }

    pub fn column(&self) -> &str {
        &self.column
    }

    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    pub fn encode(&self, value: &str) -> Result<u32> {
        self.classes
            .binary_search_by(|class| class.as_str().cmp(value))
            .map(|idx| idx as u32)
            .map_err(|_| StrokeError::UnknownCategory {
                column: self.column.clone(),
                value: value.to_string(),
            })
    }

    pub fn decode(&self, code: u32) -> Result<&str> {
        self.classes
            .get(code as usize)
            .map(String::as_str)
            .ok_or_else(|| {
                StrokeError::InvalidInput(format!(
                    "code {code} out of range for column {:?}",
                    self.column
                ))
            })
    }

    pub fn fit_transform<'a>(column: &str, values: &[&'a str]) -> Result<(Self, Vec<u32>)> {
        let encoder = Self::fit(column, values.iter().copied())?;
        let codes = values
            .iter()
            .map(|v| encoder.encode(v))
            .collect::<Result<Vec<u32>>>()?;
        Ok((encoder, codes))
    }
}
