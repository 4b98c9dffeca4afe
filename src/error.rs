//! Error types for the happiness simulator

use thiserror::Error;

/// Errors that can occur during computation
#[derive(Debug, Error)]
pub enum ComputeError {
    #[error("Insufficient data: at least 2 (age, happiness) points are required, got {valid_points}")]
    InsufficientData { valid_points: usize },

    #[error("Domain error: ln(age + 1) is undefined for age {age}")]
    DomainError { age: f64 },

    #[error("Failed to parse table: {0}")]
    ParseError(String),

    #[error("Invalid JSON: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Invalid edit: {0}")]
    InvalidEdit(String),

    #[error("Invalid configuration: {0}")]
    ConfigError(String),
}

impl ComputeError {
    /// Whether the caller should render a warning and keep going
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            ComputeError::InsufficientData { .. } | ComputeError::DomainError { .. }
        )
    }

    /// User-facing warning text for the recoverable kinds
    pub fn warning(&self) -> Option<String> {
        match self {
            ComputeError::InsufficientData { .. } => {
                Some("At least two (Age, Happiness) pairs are required.".to_string())
            }
            ComputeError::DomainError { age } => Some(format!(
                "Age {age} is not allowed: ages must be greater than -1."
            )),
            _ => None,
        }
    }
}
