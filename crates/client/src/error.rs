use chrono::NaiveDate;
use thiserror::Error;

use api_types::FieldErrors;
use engine::{EngineError, ValidationErrors};

pub type Result<T> = std::result::Result<T, ClientError>;

/// Everything a client call can fail with.
///
/// `Clone` because a single fetch outcome is handed to every caller waiting
/// on the same cache key.
#[derive(Debug, Clone, Error)]
pub enum ClientError {
    #[error("validation failed: {0}")]
    Validation(ValidationErrors),
    #[error("invalid range: start {start} is after end {end}")]
    InvalidRange { start: NaiveDate, end: NaiveDate },
    #[error("unauthorized")]
    Unauthorized,
    #[error("forbidden")]
    Forbidden,
    #[error("not found")]
    NotFound,
    #[error("server error {status}: {message}")]
    Server {
        status: u16,
        message: String,
        errors: Option<FieldErrors>,
    },
    #[error("network error: {0}")]
    Network(String),
    #[error("decode error: {0}")]
    Decode(String),
    #[error("request aborted")]
    Aborted,
    #[error("cached value for {0} has an unexpected type")]
    CacheType(String),
    #[error("config error: {0}")]
    Config(String),
}

impl ClientError {
    /// Per-field messages, from local validation or a `422` response.
    pub fn field_errors(&self) -> Option<FieldErrors> {
        match self {
            Self::Validation(errors) => Some(errors.clone().into_inner()),
            Self::Server { errors, .. } => errors.clone(),
            _ => None,
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Unauthorized)
    }
}

impl From<ValidationErrors> for ClientError {
    fn from(value: ValidationErrors) -> Self {
        Self::Validation(value)
    }
}

impl From<EngineError> for ClientError {
    fn from(value: EngineError) -> Self {
        match value {
            EngineError::Validation(errors) => Self::Validation(errors),
            EngineError::InvalidRange { start, end } => Self::InvalidRange { start, end },
            EngineError::CategoryCycle(message) => {
                let mut errors = ValidationErrors::new();
                errors.add("parent_id", message);
                Self::Validation(errors)
            }
            EngineError::InvalidAmount(message) => {
                let mut errors = ValidationErrors::new();
                errors.add("amount", message);
                Self::Validation(errors)
            }
        }
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(value: reqwest::Error) -> Self {
        if value.is_decode() {
            Self::Decode(value.to_string())
        } else if value.is_builder() {
            Self::Config(value.to_string())
        } else {
            Self::Network(value.to_string())
        }
    }
}

impl From<serde_json::Error> for ClientError {
    fn from(value: serde_json::Error) -> Self {
        Self::Decode(value.to_string())
    }
}
