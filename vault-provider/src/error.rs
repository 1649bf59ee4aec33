//! Provider error types.
//!
//! The taxonomy is flat: configuration failures abort before any call,
//! API failures are wrapped with the operation and path, and an absent
//! object on read is not an error at all (adapters return `Ok(None)`).

use crate::schema::Diagnostics;
use std::fmt;
use thiserror::Error;
use vault_client::{VaultError, VaultResult};

/// Operation an API error happened in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    /// Initial write of a new object
    Create,
    /// Read of an existing object
    Read,
    /// Write of changed fields
    Update,
    /// Removal of an object
    Delete,
    /// Write that is neither create nor update (attachments, sub-paths)
    Write,
    /// Listing of a path
    List,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Create => "creating",
            Self::Read => "reading",
            Self::Update => "updating",
            Self::Delete => "deleting",
            Self::Write => "writing",
            Self::List => "listing",
        })
    }
}

/// Provider errors.
#[derive(Error, Debug)]
pub enum ProviderError {
    /// Client construction or authentication failed
    #[error("error configuring Vault provider: {0}")]
    Configure(#[source] VaultError),

    /// A logical API call failed
    #[error("error {op} {resource} {path:?}: {source}")]
    Api {
        /// Operation in progress
        op: Operation,
        /// Human-readable resource label
        resource: &'static str,
        /// Logical path of the call
        path: String,
        /// Underlying client error
        #[source]
        source: VaultError,
    },

    /// Configuration rejected by the schema
    #[error("invalid configuration for {resource}: {diagnostics}")]
    Validation {
        /// Resource type name
        resource: &'static str,
        /// Collected error diagnostics
        diagnostics: Diagnostics,
    },

    /// An id that does not decompose into its path fields
    #[error("invalid {resource} id {id:?}: expected {expected}")]
    InvalidId {
        /// Resource type name
        resource: &'static str,
        /// Offending id
        id: String,
        /// Expected shape
        expected: &'static str,
    },

    /// A configured value the schema accepted but the adapter cannot encode
    #[error("invalid value for {attribute}: {message}")]
    InvalidValue {
        /// Attribute name
        attribute: &'static str,
        /// What is wrong with it
        message: String,
    },

    /// Import of an id that has no remote object
    #[error("cannot import {resource} {id:?}: object does not exist")]
    ImportNotFound {
        /// Resource type name
        resource: &'static str,
        /// Requested id
        id: String,
    },

    /// A data source read found nothing
    #[error("no {resource} found at {path:?}")]
    NotFound {
        /// Data source type name
        resource: &'static str,
        /// Logical path read
        path: String,
    },

    /// The object was written but could not be read back
    #[error("{resource} {id:?} was not found after it was written")]
    Vanished {
        /// Resource type name
        resource: &'static str,
        /// Id that was written
        id: String,
    },

    /// An update was requested for changes that need a new object
    #[error("{resource} {id:?} must be replaced to change: {}", .attributes.join(", "))]
    RequiresReplacement {
        /// Resource type name
        resource: &'static str,
        /// Instance id
        id: String,
        /// Attributes forcing replacement
        attributes: Vec<String>,
    },

    /// No resource registered under this type name
    #[error("unknown resource type {0:?}")]
    UnknownResource(String),

    /// No data source registered under this type name
    #[error("unknown data source type {0:?}")]
    UnknownDataSource(String),

    /// Model could not be mapped to or from state
    #[error("state serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for provider operations.
pub type ProviderResult<T> = Result<T, ProviderError>;

impl ProviderError {
    /// Wrap a client error with operation and path context.
    #[must_use]
    pub fn api(op: Operation, resource: &'static str, path: impl Into<String>, source: VaultError) -> Self {
        Self::Api {
            op,
            resource,
            path: path.into(),
            source,
        }
    }

    /// Check if the underlying cause is an absent remote object.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        match self {
            Self::Api { source, .. } => source.is_not_found(),
            Self::NotFound { .. } | Self::ImportNotFound { .. } => true,
            _ => false,
        }
    }
}

/// Attach operation context to client results.
pub trait VaultResultExt<T> {
    /// Wrap an error as [`ProviderError::Api`].
    ///
    /// # Errors
    ///
    /// Returns the wrapped error when `self` is an error.
    fn context(self, op: Operation, resource: &'static str, path: &str) -> ProviderResult<T>;
}

impl<T> VaultResultExt<T> for VaultResult<T> {
    fn context(self, op: Operation, resource: &'static str, path: &str) -> ProviderResult<T> {
        self.map_err(|source| ProviderError::api(op, resource, path, source))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_error_display() {
        let err = ProviderError::api(
            Operation::Create,
            "AWS auth backend role",
            "auth/aws/role/web",
            VaultError::unavailable("connection refused"),
        );
        assert_eq!(
            err.to_string(),
            "error creating AWS auth backend role \"auth/aws/role/web\": Vault unavailable: connection refused"
        );
    }

    #[test]
    fn test_context_wraps_only_errors() {
        let ok: VaultResult<u8> = Ok(1);
        assert_eq!(ok.context(Operation::Read, "policy", "sys/policy/a").unwrap(), 1);

        let err: VaultResult<u8> = Err(VaultError::not_found("sys/policy/a"));
        let wrapped = err.context(Operation::Delete, "policy", "sys/policy/a").unwrap_err();
        assert!(wrapped.is_not_found());
        assert!(wrapped.to_string().starts_with("error deleting policy"));
    }

    #[test]
    fn test_replacement_display() {
        let err = ProviderError::RequiresReplacement {
            resource: "vault_mount",
            id: "kv".to_string(),
            attributes: vec!["type".to_string(), "local".to_string()],
        };
        assert_eq!(err.to_string(), "vault_mount \"kv\" must be replaced to change: type, local");
    }
}
