//! `vault_mount`: a secrets engine mounted at a path.

use crate::body::{RequestBody, ResponseData};
use crate::context::ProviderContext;
use crate::error::{Operation, ProviderResult, VaultResultExt};
use crate::path::join;
use crate::resource::{Resource, delete_path};
use crate::schema::{Attribute, Schema, no_leading_trailing_slashes, non_negative};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

const LABEL: &str = "mount";

/// Mount configuration and state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Mount {
    /// Mount path, also the id
    pub path: String,
    /// Engine type
    #[serde(rename = "type")]
    pub kind: String,
    /// Human-friendly description
    pub description: Option<String>,
    /// Default lease duration in seconds
    pub default_lease_ttl_seconds: Option<i64>,
    /// Maximum lease duration in seconds
    pub max_lease_ttl_seconds: Option<i64>,
    /// Request keys left unhashed in audit logs
    pub audit_non_hmac_request_keys: Option<Vec<String>>,
    /// Response keys left unhashed in audit logs
    pub audit_non_hmac_response_keys: Option<Vec<String>>,
    /// Local mount, not replicated
    pub local: Option<bool>,
    /// Seal-wrap the mount's storage
    pub seal_wrap: Option<bool>,
    /// Give the engine access to the seal's entropy source
    pub external_entropy_access: Option<bool>,
    /// Engine-specific options
    pub options: Option<BTreeMap<String, String>>,
    /// Mount accessor
    pub accessor: Option<String>,
}

/// Resource kind.
#[derive(Debug)]
pub struct MountResource;

fn mount_path(path: &str) -> String {
    join(&["sys/mounts", path])
}

fn tune_body(model: &Mount) -> RequestBody {
    let mut body = RequestBody::new();
    body.insert_opt("default_lease_ttl", model.default_lease_ttl_seconds.as_ref())
        .insert_opt("max_lease_ttl", model.max_lease_ttl_seconds.as_ref())
        .insert_strings("audit_non_hmac_request_keys", model.audit_non_hmac_request_keys.as_ref())
        .insert_strings("audit_non_hmac_response_keys", model.audit_non_hmac_response_keys.as_ref());
    body
}

/// Fields of a mount read response.
pub(crate) fn from_response(path: &str, data: &ResponseData) -> Mount {
    let config = data.object("config").unwrap_or_default();
    Mount {
        path: path.to_string(),
        kind: data.string("type").unwrap_or_default(),
        description: data.string("description"),
        default_lease_ttl_seconds: config.int("default_lease_ttl"),
        max_lease_ttl_seconds: config.int("max_lease_ttl"),
        audit_non_hmac_request_keys: config.string_list("audit_non_hmac_request_keys"),
        audit_non_hmac_response_keys: config.string_list("audit_non_hmac_response_keys"),
        local: data.bool("local"),
        seal_wrap: data.bool("seal_wrap"),
        external_entropy_access: data.bool("external_entropy_access"),
        options: data.string_map("options"),
        accessor: data.string("accessor"),
    }
}

#[async_trait]
impl Resource for MountResource {
    type Model = Mount;
    const TYPE_NAME: &'static str = "vault_mount";

    fn schema() -> Schema {
        Schema::new("Mounts a secrets engine at a path")
            .attribute(
                Attribute::string("path")
                    .required()
                    .validate(no_leading_trailing_slashes)
                    .force_new()
                    .description("Where the secret backend will be mounted"),
            )
            .attribute(
                Attribute::string("type")
                    .required()
                    .force_new()
                    .description("Type of the backend, such as \"aws\""),
            )
            .attribute(Attribute::string("description").description("Human-friendly description of the mount"))
            .attribute(
                Attribute::int("default_lease_ttl_seconds")
                    .optional_computed()
                    .validate(non_negative)
                    .description("Default lease duration for tokens and secrets in seconds"),
            )
            .attribute(
                Attribute::int("max_lease_ttl_seconds")
                    .optional_computed()
                    .validate(non_negative)
                    .description("Maximum possible lease duration for tokens and secrets in seconds"),
            )
            .attribute(Attribute::list("audit_non_hmac_request_keys").optional_computed())
            .attribute(Attribute::list("audit_non_hmac_response_keys").optional_computed())
            .attribute(Attribute::bool("local").force_new().description("Local mount flag"))
            .attribute(Attribute::bool("seal_wrap").optional_computed().force_new())
            .attribute(Attribute::bool("external_entropy_access").force_new())
            .attribute(Attribute::map("options").description("Specifies mount type specific options"))
            .attribute(Attribute::string("accessor").computed().description("Accessor of the mount"))
    }

    async fn create(ctx: &ProviderContext, planned: &Mount) -> ProviderResult<String> {
        let path = mount_path(&planned.path);
        let mut body = tune_body(planned);
        body.nest(
            "config",
            &[
                "default_lease_ttl",
                "max_lease_ttl",
                "audit_non_hmac_request_keys",
                "audit_non_hmac_response_keys",
            ],
        )
        .insert("type", planned.kind.clone())
        .insert_non_empty("description", planned.description.as_ref())
        .insert_opt("local", planned.local.as_ref())
        .insert_opt("seal_wrap", planned.seal_wrap.as_ref())
        .insert_opt("external_entropy_access", planned.external_entropy_access.as_ref())
        .insert_map("options", planned.options.as_ref());

        ctx.client()
            .write(&path, body.into_map())
            .await
            .context(Operation::Create, LABEL, &path)?;
        Ok(planned.path.clone())
    }

    async fn read(ctx: &ProviderContext, id: &str, _prior: Option<&Mount>) -> ProviderResult<Option<Mount>> {
        let path = mount_path(id);
        let Some(secret) = ctx.client().read(&path).await.context(Operation::Read, LABEL, &path)? else {
            return Ok(None);
        };
        Ok(Some(from_response(id, &ResponseData::new(secret.into_data()))))
    }

    async fn update(ctx: &ProviderContext, id: &str, prior: &Mount, planned: &Mount) -> ProviderResult<()> {
        let path = format!("{}/tune", mount_path(id));

        let mut before = tune_body(prior);
        before.insert_non_empty("description", prior.description.as_ref())
            .insert_map("options", prior.options.as_ref());
        let mut after = tune_body(planned);
        after.insert_non_empty("description", planned.description.as_ref())
            .insert_map("options", planned.options.as_ref());

        let body = after.changed_since(&before, &["default_lease_ttl", "max_lease_ttl"]);
        ctx.client()
            .write(&path, body.into_map())
            .await
            .context(Operation::Update, LABEL, &path)?;
        Ok(())
    }

    async fn delete(ctx: &ProviderContext, id: &str, _prior: &Mount) -> ProviderResult<()> {
        delete_path(ctx, LABEL, &mount_path(id)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::{DynamicResource, ResourceAdapter};
    use crate::state::Plan;
    use serde_json::{Map, Value, json};
    use std::sync::Arc;
    use test_utils::MockVault;

    fn config(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[tokio::test]
    async fn test_create_nests_ttls_under_config() {
        let vault = MockVault::new();
        let ctx = ProviderContext::new(Arc::new(vault.clone()));
        let adapter = ResourceAdapter::<MountResource>::new();

        let cfg = config(json!({
            "path": "team-kv",
            "type": "kv",
            "default_lease_ttl_seconds": 3600,
            "options": {"version": "2"}
        }));
        let state = adapter.create(&ctx, &cfg).await.unwrap();

        assert_eq!(state.id, "team-kv");
        assert_eq!(
            Value::Object(vault.writes_to("sys/mounts/team-kv").await.remove(0)),
            json!({"type": "kv", "config": {"default_lease_ttl": 3600}, "options": {"version": "2"}})
        );
        assert!(state.get("accessor").is_some());
        assert_eq!(state.attributes["default_lease_ttl_seconds"], 3600);
        assert!(adapter.plan(Some(&state), &cfg).unwrap().is_noop());
    }

    #[tokio::test]
    async fn test_update_tunes_changed_fields() {
        let vault = MockVault::new();
        let ctx = ProviderContext::new(Arc::new(vault.clone()));
        let adapter = ResourceAdapter::<MountResource>::new();

        let state = adapter
            .create(&ctx, &config(json!({"path": "pki", "type": "pki", "max_lease_ttl_seconds": 600})))
            .await
            .unwrap();

        let cfg = config(json!({
            "path": "pki",
            "type": "pki",
            "max_lease_ttl_seconds": 600,
            "description": "issuing CA"
        }));
        let updated = adapter.update(&ctx, &state, &cfg).await.unwrap();

        assert_eq!(
            Value::Object(vault.writes_to("sys/mounts/pki/tune").await.remove(0)),
            json!({"max_lease_ttl": 600, "description": "issuing CA"})
        );
        assert_eq!(updated.attributes["description"], "issuing CA");
        assert_eq!(updated.attributes["accessor"], state.attributes["accessor"]);
    }

    #[tokio::test]
    async fn test_update_keeps_omitted_server_chosen_ttl() {
        let vault = MockVault::new();
        let ctx = ProviderContext::new(Arc::new(vault.clone()));
        let adapter = ResourceAdapter::<MountResource>::new();

        let state = adapter
            .create(&ctx, &config(json!({"path": "pki", "type": "pki", "max_lease_ttl_seconds": 600})))
            .await
            .unwrap();

        let cfg = config(json!({"path": "pki", "type": "pki", "description": "ca"}));
        assert_eq!(
            adapter.plan(Some(&state), &cfg).unwrap(),
            Plan::Update { changed: vec!["description".to_string()] }
        );
        let updated = adapter.update(&ctx, &state, &cfg).await.unwrap();

        assert_eq!(
            Value::Object(vault.writes_to("sys/mounts/pki/tune").await.remove(0)),
            json!({"max_lease_ttl": 600, "description": "ca"})
        );
        assert_eq!(updated.attributes["max_lease_ttl_seconds"], 600);
        assert!(adapter.plan(Some(&updated), &cfg).unwrap().is_noop());
    }

    #[tokio::test]
    async fn test_type_change_requires_replacement() {
        let ctx = ProviderContext::new(Arc::new(MockVault::new()));
        let adapter = ResourceAdapter::<MountResource>::new();
        let state = adapter
            .create(&ctx, &config(json!({"path": "kv", "type": "kv"})))
            .await
            .unwrap();

        let plan = adapter
            .plan(Some(&state), &config(json!({"path": "kv", "type": "transit"})))
            .unwrap();
        assert!(matches!(plan, Plan::Replace { because, .. } if because == vec!["type".to_string()]));
    }

    #[test]
    fn test_path_slashes_rejected() {
        let adapter = ResourceAdapter::<MountResource>::new();
        assert!(adapter.validate(&config(json!({"path": "/kv", "type": "kv"}))).is_err());
    }
}
