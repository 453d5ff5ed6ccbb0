//! Keywarden error types.

use thiserror::Error;

/// Errors returned by key generation and policy construction.
///
/// Validation failures are not errors: they come back as a negative
/// [`ValidationResult`](crate::ValidationResult).
#[derive(Debug, Error)]
pub enum KeywardenError {
    /// A generation request cannot be satisfied (length too short, empty alphabet).
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Policy configuration is invalid.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Configuration sources could not be read or deserialized.
    #[error("Failed to load configuration: {0}")]
    ConfigLoad(#[from] config::ConfigError),
}
