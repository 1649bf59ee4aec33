//! `vault_auth_backend`: an enabled auth method.

use crate::body::{RequestBody, ResponseData};
use crate::context::ProviderContext;
use crate::error::{Operation, ProviderResult, VaultResultExt};
use crate::path::join;
use crate::resource::{Resource, delete_path};
use crate::schema::{Attribute, Schema, no_leading_trailing_slashes, non_negative};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

const LABEL: &str = "auth backend";

const VISIBILITY: &[&str] = &["unauth", "hidden"];

fn valid_visibility(value: &serde_json::Value) -> Result<(), String> {
    match value.as_str() {
        Some(v) if v.is_empty() || VISIBILITY.contains(&v) => Ok(()),
        _ => Err(format!("expected one of {}, got {value}", VISIBILITY.join(", "))),
    }
}

/// Auth method configuration and state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthBackend {
    /// Auth method type
    #[serde(rename = "type")]
    pub kind: String,
    /// Mount path; the type name when omitted
    pub path: Option<String>,
    /// Human-friendly description
    pub description: Option<String>,
    /// Local mount, not replicated
    pub local: Option<bool>,
    /// Default token TTL in seconds
    pub default_lease_ttl_seconds: Option<i64>,
    /// Maximum token TTL in seconds
    pub max_lease_ttl_seconds: Option<i64>,
    /// Whether the method shows in the unauthenticated listing
    pub listing_visibility: Option<String>,
    /// Mount accessor
    pub accessor: Option<String>,
}

impl AuthBackend {
    fn mount_path(&self) -> &str {
        self.path.as_deref().filter(|p| !p.is_empty()).unwrap_or(&self.kind)
    }
}

/// Resource kind.
#[derive(Debug)]
pub struct AuthBackendResource;

/// `sys/auth/<path>`
pub(crate) fn auth_path(path: &str) -> String {
    join(&["sys/auth", path])
}

fn tune_body(model: &AuthBackend) -> RequestBody {
    let mut body = RequestBody::new();
    body.insert_opt("default_lease_ttl", model.default_lease_ttl_seconds.as_ref())
        .insert_opt("max_lease_ttl", model.max_lease_ttl_seconds.as_ref())
        .insert_non_empty("listing_visibility", model.listing_visibility.as_ref());
    body
}

/// Fields of an auth method read response.
pub(crate) fn from_response(path: &str, data: &ResponseData) -> AuthBackend {
    let config = data.object("config").unwrap_or_default();
    AuthBackend {
        kind: data.string("type").unwrap_or_default(),
        path: Some(path.to_string()),
        description: data.string("description"),
        local: data.bool("local"),
        default_lease_ttl_seconds: config.int("default_lease_ttl"),
        max_lease_ttl_seconds: config.int("max_lease_ttl"),
        listing_visibility: config.string("listing_visibility"),
        accessor: data.string("accessor"),
    }
}

#[async_trait]
impl Resource for AuthBackendResource {
    type Model = AuthBackend;
    const TYPE_NAME: &'static str = "vault_auth_backend";

    fn schema() -> Schema {
        Schema::new("Enables an auth method")
            .attribute(
                Attribute::string("type")
                    .required()
                    .force_new()
                    .description("Name of the auth backend"),
            )
            .attribute(
                Attribute::string("path")
                    .optional_computed()
                    .force_new()
                    .validate(no_leading_trailing_slashes)
                    .description("Path to mount the backend at, defaults to the type"),
            )
            .attribute(Attribute::string("description").description("The description of the auth backend"))
            .attribute(Attribute::bool("local").force_new().description("Local mount flag"))
            .attribute(
                Attribute::int("default_lease_ttl_seconds")
                    .optional_computed()
                    .validate(non_negative),
            )
            .attribute(
                Attribute::int("max_lease_ttl_seconds")
                    .optional_computed()
                    .validate(non_negative),
            )
            .attribute(
                Attribute::string("listing_visibility")
                    .optional_computed()
                    .validate(valid_visibility),
            )
            .attribute(Attribute::string("accessor").computed().description("The accessor of the auth backend"))
    }

    async fn create(ctx: &ProviderContext, planned: &AuthBackend) -> ProviderResult<String> {
        let mount = planned.mount_path().to_string();
        let path = auth_path(&mount);

        let mut body = RequestBody::new();
        body.insert("type", planned.kind.clone())
            .insert_non_empty("description", planned.description.as_ref())
            .insert_opt("local", planned.local.as_ref());
        ctx.client()
            .write(&path, body.into_map())
            .await
            .context(Operation::Create, LABEL, &path)?;

        let tune = tune_body(planned);
        if !tune.is_empty() {
            let tune_path = format!("{path}/tune");
            debug!(path = %tune_path, "tuning auth backend");
            ctx.client()
                .write(&tune_path, tune.into_map())
                .await
                .context(Operation::Write, LABEL, &tune_path)?;
        }
        Ok(mount)
    }

    async fn read(ctx: &ProviderContext, id: &str, _prior: Option<&AuthBackend>) -> ProviderResult<Option<AuthBackend>> {
        let path = auth_path(id);
        let Some(secret) = ctx.client().read(&path).await.context(Operation::Read, LABEL, &path)? else {
            return Ok(None);
        };
        Ok(Some(from_response(id, &ResponseData::new(secret.into_data()))))
    }

    async fn update(
        ctx: &ProviderContext,
        id: &str,
        prior: &AuthBackend,
        planned: &AuthBackend,
    ) -> ProviderResult<()> {
        let path = format!("{}/tune", auth_path(id));

        let mut before = tune_body(prior);
        before.insert_non_empty("description", prior.description.as_ref());
        let mut after = tune_body(planned);
        after.insert_non_empty("description", planned.description.as_ref());

        let body = after.changed_since(&before, &[]);
        if body.is_empty() {
            return Ok(());
        }
        ctx.client()
            .write(&path, body.into_map())
            .await
            .context(Operation::Update, LABEL, &path)?;
        Ok(())
    }

    async fn delete(ctx: &ProviderContext, id: &str, _prior: &AuthBackend) -> ProviderResult<()> {
        delete_path(ctx, LABEL, &auth_path(id)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::{DynamicResource, ResourceAdapter};
    use serde_json::{Map, Value, json};
    use std::sync::Arc;
    use test_utils::MockVault;

    fn config(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[tokio::test]
    async fn test_path_defaults_to_type() {
        let vault = MockVault::new();
        let ctx = ProviderContext::new(Arc::new(vault.clone()));
        let adapter = ResourceAdapter::<AuthBackendResource>::new();

        let cfg = config(json!({"type": "approle"}));
        let state = adapter.create(&ctx, &cfg).await.unwrap();

        assert_eq!(state.id, "approle");
        assert_eq!(state.attributes["path"], "approle");
        assert!(vault.writes_to("sys/auth/approle/tune").await.is_empty());
        assert!(adapter.plan(Some(&state), &cfg).unwrap().is_noop());
    }

    #[tokio::test]
    async fn test_create_enables_then_tunes() {
        let vault = MockVault::new();
        let ctx = ProviderContext::new(Arc::new(vault.clone()));
        let adapter = ResourceAdapter::<AuthBackendResource>::new();

        let cfg = config(json!({
            "type": "userpass",
            "path": "people",
            "default_lease_ttl_seconds": 300,
            "listing_visibility": "unauth"
        }));
        let state = adapter.create(&ctx, &cfg).await.unwrap();

        assert_eq!(
            Value::Object(vault.writes_to("sys/auth/people/tune").await.remove(0)),
            json!({"default_lease_ttl": 300, "listing_visibility": "unauth"})
        );
        assert_eq!(state.attributes["listing_visibility"], "unauth");
        assert!(adapter.plan(Some(&state), &cfg).unwrap().is_noop());

        adapter.delete(&ctx, &state).await.unwrap();
        assert!(adapter.read(&ctx, &state).await.unwrap().is_none());
    }

    #[test]
    fn test_visibility_validated() {
        let adapter = ResourceAdapter::<AuthBackendResource>::new();
        assert!(adapter
            .validate(&config(json!({"type": "ldap", "listing_visibility": "public"})))
            .is_err());
    }
}
