//! Error types for eucmorph

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum MorphError {
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),
    #[error("Step {index} out of range for sequence of length {len}")]
    StepOutOfRange { index: usize, len: usize },
}

pub type Result<T> = std::result::Result<T, MorphError>;
