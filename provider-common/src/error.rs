//! Centralized error types for the provider crates.
//!
//! Errors raised before any remote call is made (bad environment, bad input,
//! an HTTP client that cannot be built) are reported through [`PlatformError`].

use thiserror::Error;

/// Common error type for platform operations.
#[derive(Error, Debug)]
pub enum PlatformError {
    /// HTTP client could not be built or a request failed at the transport level
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Invalid input provided
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// A required setting is missing
    #[error("Missing configuration: {0}")]
    MissingConfig(String),
}

impl PlatformError {
    /// Check whether the error was caused by user-supplied configuration.
    ///
    /// # Examples
    ///
    /// ```
    /// use provider_common::PlatformError;
    ///
    /// let err = PlatformError::missing_config("VAULT_TOKEN");
    /// assert!(err.is_configuration());
    /// ```
    #[must_use]
    pub const fn is_configuration(&self) -> bool {
        matches!(self, Self::InvalidInput(_) | Self::MissingConfig(_))
    }

    /// Create an invalid input error with the given message.
    #[must_use]
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Create a missing configuration error for the named setting.
    #[must_use]
    pub fn missing_config(name: impl Into<String>) -> Self {
        Self::MissingConfig(name.into())
    }
}
