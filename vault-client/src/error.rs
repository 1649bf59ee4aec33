//! Vault error types using thiserror 2.0.
//!
//! Classifies HTTP failures of the logical API so callers can tell an absent
//! object apart from a real failure.

use provider_common::PlatformError;
use thiserror::Error;

/// Vault-specific errors.
#[derive(Error, Debug)]
pub enum VaultError {
    /// Vault server unavailable or sealed
    #[error("Vault unavailable: {0}")]
    Unavailable(String),

    /// Object not found at path
    #[error("Not found at path: {0}")]
    NotFound(String),

    /// Permission denied
    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    /// Any other non-success response, with the server's error list
    #[error("Vault API error (code {status}): {}", .errors.join("; "))]
    Api {
        /// HTTP status code
        status: u16,
        /// Messages from the `errors` envelope
        errors: Vec<String>,
    },

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// HTTP error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Platform error
    #[error(transparent)]
    Platform(#[from] PlatformError),
}

/// Result type for Vault operations.
pub type VaultResult<T> = Result<T, VaultError>;

impl VaultError {
    /// Check if the error means the remote object does not exist.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    /// Create an unavailable error.
    #[must_use]
    pub fn unavailable(msg: impl Into<String>) -> Self {
        Self::Unavailable(msg.into())
    }

    /// Create a not found error.
    #[must_use]
    pub fn not_found(path: impl Into<String>) -> Self {
        Self::NotFound(path.into())
    }

    /// Create an invalid configuration error.
    #[must_use]
    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Self::InvalidConfig(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = VaultError::unavailable("Vault is sealed");
        assert_eq!(err.to_string(), "Vault unavailable: Vault is sealed");

        let err = VaultError::Api {
            status: 400,
            errors: vec!["invalid type".to_string(), "missing name".to_string()],
        };
        assert_eq!(
            err.to_string(),
            "Vault API error (code 400): invalid type; missing name"
        );
    }

    #[test]
    fn test_not_found_classification() {
        assert!(VaultError::not_found("sys/policy/x").is_not_found());
        assert!(!VaultError::PermissionDenied("sys/policy/x".to_string()).is_not_found());
        assert!(!VaultError::unavailable("timeout").is_not_found());
    }

    #[test]
    fn test_from_platform_error() {
        let vault_err: VaultError = PlatformError::missing_config("VAULT_TOKEN").into();
        assert!(matches!(vault_err, VaultError::Platform(_)));
        assert_eq!(vault_err.to_string(), "Missing configuration: VAULT_TOKEN");
    }
}
