//! Provider configuration and the context passed into every adapter call.

use crate::error::{ProviderError, ProviderResult};
use crate::provider::provider_schema;
use provider_common::parse_env;
use serde_json::{Map, Value};
use std::{fmt, sync::Arc, time::Duration};
use tracing::{info, instrument};
use vault_client::{Logical, VaultClient, VaultConfig, VaultError};

/// Provider-level configuration.
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    /// Client settings (address, token, namespace, TLS, timeout)
    pub vault: VaultConfig,
    /// TTL of the child token the provider works with
    pub max_lease_ttl: Duration,
    /// Use the configured token directly instead of a child token
    pub skip_child_token: bool,
    /// Display name of the child token; not read from the environment
    pub token_name: String,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            vault: VaultConfig::default(),
            max_lease_ttl: Duration::from_secs(1200),
            skip_child_token: false,
            token_name: "terraform".to_string(),
        }
    }
}

impl ProviderConfig {
    /// Create a configuration for an address and token.
    #[must_use]
    pub fn new(addr: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            vault: VaultConfig::new(addr, token),
            ..Self::default()
        }
    }

    /// Load configuration from the environment.
    ///
    /// # Errors
    ///
    /// Returns an error if a variable is set but malformed.
    pub fn from_env() -> ProviderResult<Self> {
        let vault = VaultConfig::from_env().map_err(ProviderError::Configure)?;
        let max_ttl = parse_env("TERRAFORM_VAULT_MAX_TTL", 1200u64)
            .map_err(|e| ProviderError::Configure(e.into()))?;
        let skip_child_token = parse_env("TERRAFORM_VAULT_SKIP_CHILD_TOKEN", false)
            .map_err(|e| ProviderError::Configure(e.into()))?;

        Ok(Self {
            vault,
            max_lease_ttl: Duration::from_secs(max_ttl),
            skip_child_token,
            ..Self::default()
        })
    }

    /// Build configuration from a provider block, falling back to the
    /// environment for every attribute the block leaves unset.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError::Validation`] for an invalid block and
    /// [`ProviderError::Configure`] for malformed environment variables.
    pub fn from_block(block: &Map<String, Value>) -> ProviderResult<Self> {
        let prepared = provider_schema()
            .prepare(block)
            .map_err(|diagnostics| ProviderError::Validation {
                resource: "provider",
                diagnostics,
            })?;
        let set = |name: &'static str| {
            block
                .get(name)
                .filter(|v| !v.is_null())
                .and_then(|_| prepared.values.get(name))
        };

        let mut config = Self::from_env()?;
        if let Some(addr) = set("address").and_then(Value::as_str) {
            config.vault.addr = addr.to_string();
        }
        if let Some(token) = set("token").and_then(Value::as_str) {
            config.vault = config.vault.with_token(token);
        }
        if let Some(namespace) = set("namespace").and_then(Value::as_str) {
            config = config.with_namespace(namespace);
        }
        if let Some(skip) = set("skip_tls_verify").and_then(Value::as_bool) {
            config.vault = config.vault.with_skip_tls_verify(skip);
        }
        if let Some(ttl) = set("max_lease_ttl_seconds").and_then(Value::as_u64) {
            config = config.with_max_lease_ttl(Duration::from_secs(ttl));
        }
        if let Some(skip) = set("skip_child_token").and_then(Value::as_bool) {
            config = config.with_skip_child_token(skip);
        }
        if let Some(name) = set("token_name").and_then(Value::as_str) {
            config = config.with_token_name(name);
        }
        Ok(config)
    }

    /// Set the child token TTL.
    #[must_use]
    pub const fn with_max_lease_ttl(mut self, ttl: Duration) -> Self {
        self.max_lease_ttl = ttl;
        self
    }

    /// Use the configured token directly.
    #[must_use]
    pub const fn with_skip_child_token(mut self, skip: bool) -> Self {
        self.skip_child_token = skip;
        self
    }

    /// Set the namespace.
    #[must_use]
    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.vault = self.vault.with_namespace(namespace);
        self
    }

    /// Set the child token display name.
    #[must_use]
    pub fn with_token_name(mut self, name: impl Into<String>) -> Self {
        self.token_name = name.into();
        self
    }
}

/// Shared, immutable handle every adapter call receives.
#[derive(Clone)]
pub struct ProviderContext {
    client: Arc<dyn Logical>,
}

impl fmt::Debug for ProviderContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderContext").finish_non_exhaustive()
    }
}

impl ProviderContext {
    /// Wrap an existing client.
    #[must_use]
    pub fn new(client: Arc<dyn Logical>) -> Self {
        Self { client }
    }

    /// Logical API client.
    #[must_use]
    pub fn client(&self) -> &dyn Logical {
        self.client.as_ref()
    }

    /// Build the client and, unless disabled, switch to a child token.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError::Configure`] when the client cannot be built
    /// or the child token cannot be created. No resource call is made then.
    #[instrument(skip(config), fields(addr = %config.vault.addr))]
    pub async fn configure(config: ProviderConfig) -> ProviderResult<Self> {
        let client = VaultClient::new(config.vault.clone()).map_err(ProviderError::Configure)?;

        let client = if config.skip_child_token {
            client
        } else {
            let token = create_child_token(&client, &config)
                .await
                .map_err(ProviderError::Configure)?;
            client.with_token(token)
        };

        info!(
            namespace = config.vault.namespace.as_deref().unwrap_or(""),
            child_token = !config.skip_child_token,
            "Vault provider configured"
        );
        Ok(Self::new(Arc::new(client)))
    }
}

async fn create_child_token(
    client: &dyn Logical,
    config: &ProviderConfig,
) -> Result<secrecy::SecretString, VaultError> {
    let ttl = format!("{}s", config.max_lease_ttl.as_secs());
    let mut body = Map::new();
    body.insert("display_name".to_string(), Value::String(config.token_name.clone()));
    body.insert("ttl".to_string(), Value::String(ttl.clone()));
    body.insert("explicit_max_ttl".to_string(), Value::String(ttl));

    let secret = client
        .write("auth/token/create", body)
        .await?
        .and_then(|s| s.auth)
        .ok_or_else(|| VaultError::invalid_config("token create response carried no auth data"))?;

    Ok(secret.client_token)
}
