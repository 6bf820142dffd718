//! Configuration error types

use thiserror::Error;

/// Errors that can occur during configuration loading
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration loading failed: {0}")]
    LoadError(#[from] config::ConfigError),

    #[error("Validation failed: {0}")]
    ValidationFailed(#[from] ValidationError),
}

/// Errors that can occur during configuration validation
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Required configuration missing: {0}")]
    MissingRequired(&'static str),

    #[error("Trial length must be between 1 and 365 days")]
    InvalidTrialLength,

    #[error("Billing period must be between 1 and 365 days")]
    InvalidPeriodLength,

    #[error("Grace period must be between 1 and 90 days")]
    InvalidGracePeriod,
}
