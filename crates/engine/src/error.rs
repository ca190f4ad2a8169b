//! The module contains the error the engine can throw.
//!
//! The errors are:
//!
//! - [`InvalidRange`] thrown when a report is asked for `start > end`.
//! - [`Validation`] thrown when a payload fails its field rules.
//! - [`CategoryCycle`] thrown when a parent assignment would loop the tree.
//!
//!  [`InvalidRange`]: EngineError::InvalidRange
//!  [`Validation`]: EngineError::Validation
//!  [`CategoryCycle`]: EngineError::CategoryCycle
use chrono::NaiveDate;
use thiserror::Error;

use crate::validation::ValidationErrors;

/// Engine custom errors.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EngineError {
    #[error("Invalid range: start {start} is after end {end}")]
    InvalidRange { start: NaiveDate, end: NaiveDate },
    #[error("Validation failed: {0}")]
    Validation(ValidationErrors),
    #[error("Category cycle: {0}")]
    CategoryCycle(String),
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),
}

impl From<ValidationErrors> for EngineError {
    fn from(value: ValidationErrors) -> Self {
        Self::Validation(value)
    }
}
