//! Stroke risk: offline training pipeline and a form-based predictor sharing one model artifact.

extern crate serde;

pub mod artifact;
pub mod balance;
pub mod config;
pub mod dataset;
pub mod encoder;
pub mod error;
pub mod evaluation;
pub mod forest;
pub mod inference;
pub mod pipeline;
pub mod prep;
pub mod records;
pub mod scale;
pub mod selection;
pub mod web;

pub use error::{Result, StrokeError};
