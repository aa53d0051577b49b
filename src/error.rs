//! Error types for the risk monitor

use thiserror::Error;

#[derive(Error, Debug)]
pub enum RiskError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type Result<T> = std::result::Result<T, RiskError>;

impl RiskError {
    /// True if the error identifies a missing config, state, or alert.
    pub fn is_not_found(&self) -> bool {
        matches!(self, RiskError::NotFound(_))
    }
}
