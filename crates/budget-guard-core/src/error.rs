//! Error types for Budget Guard

use thiserror::Error;

use crate::billing::BillingError;

/// Result type alias using Budget Guard's Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for Budget Guard operations
#[derive(Error, Debug)]
pub enum Error {
    /// Cloud Billing API error
    #[error("Billing error: {0}")]
    Billing(#[from] BillingError),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Validation error
    #[error("Validation error: {0}")]
    Validation(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl Error {
    /// Create a validation error
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Create a config error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create an internal error
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }
}

impl From<config::ConfigError> for Error {
    fn from(err: config::ConfigError) -> Self {
        Self::Config(err.to_string())
    }
}
