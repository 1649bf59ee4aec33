//! Vault client configuration.

use crate::error::{VaultError, VaultResult};
use provider_common::{parse_env, parse_env_opt};
use secrecy::SecretString;
use std::time::Duration;

/// Default address used when `VAULT_ADDR` is unset.
pub const DEFAULT_ADDR: &str = "https://127.0.0.1:8200";

/// Vault client configuration.
#[derive(Debug, Clone)]
pub struct VaultConfig {
    /// Vault server address
    pub addr: String,
    /// Token sent as `X-Vault-Token`
    pub token: Option<SecretString>,
    /// Namespace sent as `X-Vault-Namespace`
    pub namespace: Option<String>,
    /// Request timeout
    pub timeout: Duration,
    /// Accept invalid TLS certificates
    pub skip_tls_verify: bool,
}

impl Default for VaultConfig {
    fn default() -> Self {
        Self {
            addr: std::env::var("VAULT_ADDR").unwrap_or_else(|_| DEFAULT_ADDR.to_string()),
            token: std::env::var("VAULT_TOKEN").ok().map(SecretString::from),
            namespace: std::env::var("VAULT_NAMESPACE").ok().filter(|ns| !ns.is_empty()),
            timeout: Duration::from_secs(60),
            skip_tls_verify: false,
        }
    }
}

impl VaultConfig {
    /// Create a new configuration.
    #[must_use]
    pub fn new(addr: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            addr: addr.into(),
            token: Some(SecretString::from(token.into())),
            namespace: None,
            timeout: Duration::from_secs(60),
            skip_tls_verify: false,
        }
    }

    /// Load configuration from `VAULT_*` environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if a variable is set but malformed.
    pub fn from_env() -> VaultResult<Self> {
        let timeout = parse_env("VAULT_CLIENT_TIMEOUT", 60u64)?;
        let skip_tls_verify = parse_env_opt::<String>("VAULT_SKIP_VERIFY")?
            .map(|v| parse_bool_flag("VAULT_SKIP_VERIFY", &v))
            .transpose()?
            .unwrap_or(false);

        Ok(Self {
            timeout: Duration::from_secs(timeout),
            skip_tls_verify,
            ..Self::default()
        })
    }

    /// Set the token.
    #[must_use]
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(SecretString::from(token.into()));
        self
    }

    /// Set the namespace.
    #[must_use]
    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    /// Set request timeout.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Disable TLS certificate verification.
    #[must_use]
    pub const fn with_skip_tls_verify(mut self, skip: bool) -> Self {
        self.skip_tls_verify = skip;
        self
    }
}

/// Accepts `1`/`t`/`true` and `0`/`f`/`false`, case-insensitively.
fn parse_bool_flag(name: &str, value: &str) -> VaultResult<bool> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "t" | "true" => Ok(true),
        "0" | "f" | "false" => Ok(false),
        other => Err(VaultError::invalid_config(format!(
            "Invalid {name}: {other:?} is not a boolean"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;

    #[test]
    fn test_new_config() {
        let config = VaultConfig::new("http://127.0.0.1:8200", "root");
        assert_eq!(config.addr, "http://127.0.0.1:8200");
        assert_eq!(config.token.as_ref().map(|t| t.expose_secret()), Some("root"));
        assert_eq!(config.timeout, Duration::from_secs(60));
        assert!(config.namespace.is_none());
    }

    #[test]
    fn test_builder() {
        let config = VaultConfig::new("http://vault:8200", "t")
            .with_namespace("team-a")
            .with_timeout(Duration::from_secs(5))
            .with_skip_tls_verify(true);

        assert_eq!(config.namespace.as_deref(), Some("team-a"));
        assert_eq!(config.timeout, Duration::from_secs(5));
        assert!(config.skip_tls_verify);
    }

    #[test]
    fn test_debug_redacts_token() {
        let config = VaultConfig::new("http://vault:8200", "s.supersecret");
        let debug = format!("{config:?}");
        assert!(!debug.contains("s.supersecret"));
    }

    #[test]
    fn test_bool_flag_parsing() {
        assert!(parse_bool_flag("X", "TRUE").unwrap());
        assert!(parse_bool_flag("X", "1").unwrap());
        assert!(!parse_bool_flag("X", "f").unwrap());
        assert!(parse_bool_flag("X", "yes").is_err());
    }
}
