//! Error types shared by the fund clients

use thiserror::Error;

/// Client-wide error type
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FundError {
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("Network error: {0}")]
    Network(String),

    #[error("Authentication error: {0}")]
    Auth(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl FundError {
    pub fn api(status: u16, message: impl Into<String>) -> Self {
        FundError::Api {
            status,
            message: message.into(),
        }
    }

    pub fn network(msg: impl Into<String>) -> Self {
        FundError::Network(msg.into())
    }

    pub fn auth(msg: impl Into<String>) -> Self {
        FundError::Auth(msg.into())
    }

    pub fn parse(msg: impl Into<String>) -> Self {
        FundError::Parse(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        FundError::NotFound(msg.into())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        FundError::Validation(msg.into())
    }

    pub fn config(msg: impl Into<String>) -> Self {
        FundError::Config(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        FundError::Internal(msg.into())
    }

    /// Whether the error came from local input checks rather than the backend
    pub fn is_validation(&self) -> bool {
        matches!(self, FundError::Validation(_))
    }
}

/// Result type alias for fund operations
pub type FundResult<T> = Result<T, FundError>;

impl From<crate::config::ConfigError> for FundError {
    fn from(err: crate::config::ConfigError) -> Self {
        FundError::Config(err.to_string())
    }
}
