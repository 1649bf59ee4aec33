//! Vault HTTP client for the logical API.

use crate::{
    config::VaultConfig,
    error::{VaultError, VaultResult},
    logical::Logical,
    secrets::{ErrorResponse, Secret},
};
use async_trait::async_trait;
use provider_common::{HttpConfig, build_http_client};
use reqwest::{Client, Method, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde_json::{Map, Value};
use tracing::{debug, instrument, warn};
use url::Url;

/// Vault client bound to one address, token and namespace.
#[derive(Debug, Clone)]
pub struct VaultClient {
    config: VaultConfig,
    base: Url,
    http: Client,
    token: SecretString,
}

impl VaultClient {
    /// Create a new Vault client.
    ///
    /// # Errors
    ///
    /// Fails when no token is configured, the address is not a URL, or the
    /// HTTP client cannot be built.
    pub fn new(config: VaultConfig) -> VaultResult<Self> {
        let token = config
            .token
            .clone()
            .ok_or_else(|| VaultError::invalid_config("no Vault token found, set VAULT_TOKEN"))?;

        let mut base = Url::parse(&config.addr)
            .map_err(|e| VaultError::invalid_config(format!("invalid address {:?}: {e}", config.addr)))?;
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }

        let http_config = HttpConfig::default()
            .with_timeout(config.timeout)
            .with_skip_tls_verify(config.skip_tls_verify);
        let http = build_http_client(&http_config)?;

        Ok(Self {
            config,
            base,
            http,
            token,
        })
    }

    /// Client configuration.
    #[must_use]
    pub const fn config(&self) -> &VaultConfig {
        &self.config
    }

    /// Clone of this client that authenticates with another token.
    #[must_use]
    pub fn with_token(&self, token: SecretString) -> Self {
        let mut client = self.clone();
        client.config.token = Some(token.clone());
        client.token = token;
        client
    }

    /// Clone of this client scoped to a namespace.
    #[must_use]
    pub fn with_namespace(&self, namespace: impl Into<String>) -> Self {
        let mut client = self.clone();
        client.config.namespace = Some(namespace.into());
        client
    }

    fn url(&self, path: &str) -> VaultResult<Url> {
        let relative = format!("v1/{}", path.trim_start_matches('/'));
        self.base
            .join(&relative)
            .map_err(|e| VaultError::invalid_config(format!("invalid path {path:?}: {e}")))
    }

    #[instrument(skip(self, query, body))]
    async fn request(
        &self,
        method: Method,
        path: &str,
        query: &[(String, String)],
        body: Option<Map<String, Value>>,
    ) -> VaultResult<Option<Secret>> {
        let url = self.url(path)?;
        debug!(%url, "Vault request");

        let mut request = self
            .http
            .request(method, url)
            .header("X-Vault-Token", self.token.expose_secret())
            .header("X-Vault-Request", "true");

        if let Some(namespace) = &self.config.namespace {
            request = request.header("X-Vault-Namespace", namespace);
        }
        if !query.is_empty() {
            request = request.query(query);
        }
        if let Some(b) = body {
            request = request.json(&b);
        }

        let response = request
            .send()
            .await
            .map_err(|e| VaultError::unavailable(e.to_string()))?;

        let status = response.status();
        let text = response.text().await.unwrap_or_default();

        if !status.is_success() {
            let errors = serde_json::from_str::<ErrorResponse>(&text)
                .map(|e| e.errors)
                .unwrap_or_default();
            return Err(match status {
                StatusCode::NOT_FOUND => VaultError::not_found(path),
                StatusCode::FORBIDDEN => {
                    VaultError::PermissionDenied(format!("{path}: {}", errors.join("; ")))
                }
                StatusCode::SERVICE_UNAVAILABLE => VaultError::unavailable(errors.join("; ")),
                _ => VaultError::Api {
                    status: status.as_u16(),
                    errors,
                },
            });
        }

        if status == StatusCode::NO_CONTENT || text.trim().is_empty() {
            return Ok(None);
        }

        let secret: Secret = serde_json::from_str(&text)?;
        if let Some(warnings) = &secret.warnings {
            for warning in warnings {
                warn!(path, warning = %warning, "Vault returned a warning");
            }
        }
        Ok(Some(secret))
    }
}

/// Absent objects come back as 404; reads report them as `None`.
fn absent_as_none(result: VaultResult<Option<Secret>>) -> VaultResult<Option<Secret>> {
    match result {
        Err(e) if e.is_not_found() => Ok(None),
        other => other,
    }
}

#[async_trait]
impl Logical for VaultClient {
    #[instrument(skip(self))]
    async fn read(&self, path: &str) -> VaultResult<Option<Secret>> {
        absent_as_none(self.request(Method::GET, path, &[], None).await)
    }

    #[instrument(skip(self))]
    async fn read_with_query(
        &self,
        path: &str,
        query: &[(String, String)],
    ) -> VaultResult<Option<Secret>> {
        absent_as_none(self.request(Method::GET, path, query, None).await)
    }

    #[instrument(skip(self, data))]
    async fn write(&self, path: &str, data: Map<String, Value>) -> VaultResult<Option<Secret>> {
        self.request(Method::PUT, path, &[], Some(data)).await
    }

    #[instrument(skip(self))]
    async fn delete(&self, path: &str) -> VaultResult<()> {
        self.request(Method::DELETE, path, &[], None).await?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn list(&self, path: &str) -> VaultResult<Option<Secret>> {
        let query = [("list".to_string(), "true".to_string())];
        absent_as_none(self.request(Method::GET, path, &query, None).await)
    }
}
