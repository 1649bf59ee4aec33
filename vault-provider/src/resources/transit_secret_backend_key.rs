//! `vault_transit_secret_backend_key`: a named key of a transit engine.
//!
//! Key material settings are fixed at creation; everything else is changed
//! through the key's `config` sub-path.

use crate::body::{RequestBody, ResponseData};
use crate::context::ProviderContext;
use crate::error::{Operation, ProviderResult, VaultResultExt};
use crate::path::{join, split_transit_key};
use crate::resource::{Resource, delete_path};
use crate::schema::{Attribute, Schema, no_leading_trailing_slashes, non_negative};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

const LABEL: &str = "transit secret backend key";

const KEY_TYPES: &[&str] = &[
    "aes128-gcm96",
    "aes256-gcm96",
    "chacha20-poly1305",
    "ed25519",
    "ecdsa-p256",
    "ecdsa-p384",
    "ecdsa-p521",
    "hmac",
    "rsa-2048",
    "rsa-3072",
    "rsa-4096",
];

fn valid_key_type(value: &Value) -> Result<(), String> {
    match value.as_str() {
        Some(kind) if KEY_TYPES.contains(&kind) => Ok(()),
        _ => Err(format!("expected one of {}, got {value}", KEY_TYPES.join(", "))),
    }
}

/// Key configuration and state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransitSecretBackendKey {
    /// Transit mount path
    pub backend: String,
    /// Key name
    pub name: String,
    /// Key type
    #[serde(rename = "type")]
    pub kind: Option<String>,
    /// Allow the key to be deleted
    pub deletion_allowed: Option<bool>,
    /// Key derivation enabled
    pub derived: Option<bool>,
    /// Convergent encryption enabled
    pub convergent_encryption: Option<bool>,
    /// Key may be exported
    pub exportable: Option<bool>,
    /// Plaintext backups allowed
    pub allow_plaintext_backup: Option<bool>,
    /// Rotation period in seconds, 0 disables
    pub auto_rotate_period: Option<i64>,
    /// Minimum version allowed for decryption
    pub min_decryption_version: Option<i64>,
    /// Minimum version allowed for encryption, 0 means latest
    pub min_encryption_version: Option<i64>,
    /// Newest key version
    pub latest_version: Option<i64>,
}

impl TransitSecretBackendKey {
    fn create_body(&self) -> RequestBody {
        let mut body = RequestBody::new();
        body.insert_non_empty("type", self.kind.as_ref())
            .insert_opt("derived", self.derived.as_ref())
            .insert_opt("convergent_encryption", self.convergent_encryption.as_ref())
            .insert_opt("exportable", self.exportable.as_ref())
            .insert_opt("allow_plaintext_backup", self.allow_plaintext_backup.as_ref())
            .insert_opt("auto_rotate_period", self.auto_rotate_period.as_ref());
        body
    }

    fn config_body(&self) -> RequestBody {
        let mut body = RequestBody::new();
        body.insert_opt("deletion_allowed", self.deletion_allowed.as_ref())
            .insert_opt("exportable", self.exportable.as_ref())
            .insert_opt("allow_plaintext_backup", self.allow_plaintext_backup.as_ref())
            .insert_opt("auto_rotate_period", self.auto_rotate_period.as_ref())
            .insert_opt("min_decryption_version", self.min_decryption_version.as_ref())
            .insert_opt("min_encryption_version", self.min_encryption_version.as_ref());
        body
    }
}

fn config_path(key_path: &str) -> String {
    format!("{key_path}/config")
}

/// Resource kind.
#[derive(Debug)]
pub struct TransitSecretBackendKeyResource;

#[async_trait]
impl Resource for TransitSecretBackendKeyResource {
    type Model = TransitSecretBackendKey;
    const TYPE_NAME: &'static str = "vault_transit_secret_backend_key";

    fn schema() -> Schema {
        Schema::new("Manages a named encryption key of a transit secrets engine")
            .attribute(
                Attribute::string("backend")
                    .required()
                    .force_new()
                    .validate(no_leading_trailing_slashes)
                    .description("The Transit secret backend the resource belongs to"),
            )
            .attribute(
                Attribute::string("name")
                    .required()
                    .force_new()
                    .description("Name of the encryption key to create"),
            )
            .attribute(
                Attribute::string("type")
                    .default("aes256-gcm96")
                    .force_new()
                    .validate(valid_key_type)
                    .description("Specifies the type of key to create"),
            )
            .attribute(
                Attribute::bool("deletion_allowed")
                    .default(false)
                    .description("Specifies if the key is allowed to be deleted"),
            )
            .attribute(
                Attribute::bool("derived")
                    .default(false)
                    .force_new()
                    .description("Specifies if key derivation is to be used"),
            )
            .attribute(
                Attribute::bool("convergent_encryption")
                    .default(false)
                    .force_new()
                    .description("Whether or not to support convergent encryption"),
            )
            .attribute(
                Attribute::bool("exportable")
                    .default(false)
                    .description("Enables keys to be exportable"),
            )
            .attribute(
                Attribute::bool("allow_plaintext_backup")
                    .default(false)
                    .description("Enables taking a backup of the named key in plaintext format"),
            )
            .attribute(
                Attribute::int("auto_rotate_period")
                    .optional_computed()
                    .validate(non_negative)
                    .description("Amount of seconds the key should live before being automatically rotated"),
            )
            .attribute(
                Attribute::int("min_decryption_version")
                    .default(1)
                    .validate(non_negative)
                    .description("Minimum key version to use for decryption"),
            )
            .attribute(
                Attribute::int("min_encryption_version")
                    .default(0)
                    .validate(non_negative)
                    .description("Minimum key version to use for encryption"),
            )
            .attribute(Attribute::int("latest_version").computed().description("Latest key version in use"))
    }

    async fn create(ctx: &ProviderContext, planned: &TransitSecretBackendKey) -> ProviderResult<String> {
        let path = join(&[&planned.backend, "keys", &planned.name]);
        ctx.client()
            .write(&path, planned.create_body().into_map())
            .await
            .context(Operation::Create, LABEL, &path)?;

        let config = config_path(&path);
        ctx.client()
            .write(&config, planned.config_body().into_map())
            .await
            .context(Operation::Write, LABEL, &config)?;
        Ok(path)
    }

    async fn read(
        ctx: &ProviderContext,
        id: &str,
        _prior: Option<&TransitSecretBackendKey>,
    ) -> ProviderResult<Option<TransitSecretBackendKey>> {
        let (backend, name) = split_transit_key(Self::TYPE_NAME, id)?;
        let Some(secret) = ctx.client().read(id).await.context(Operation::Read, LABEL, id)? else {
            return Ok(None);
        };
        let data = ResponseData::new(secret.into_data());
        Ok(Some(TransitSecretBackendKey {
            backend,
            name,
            kind: data.string("type"),
            deletion_allowed: data.bool("deletion_allowed"),
            derived: data.bool("derived"),
            convergent_encryption: data.bool("convergent_encryption"),
            exportable: data.bool("exportable"),
            allow_plaintext_backup: data.bool("allow_plaintext_backup"),
            auto_rotate_period: data.int("auto_rotate_period"),
            min_decryption_version: data.int("min_decryption_version"),
            min_encryption_version: data.int("min_encryption_version"),
            latest_version: data.int("latest_version"),
        }))
    }

    async fn update(
        ctx: &ProviderContext,
        id: &str,
        prior: &TransitSecretBackendKey,
        planned: &TransitSecretBackendKey,
    ) -> ProviderResult<()> {
        let body = planned.config_body().changed_since(&prior.config_body(), &[]);
        if body.is_empty() {
            return Ok(());
        }
        let config = config_path(id);
        ctx.client()
            .write(&config, body.into_map())
            .await
            .context(Operation::Update, LABEL, &config)?;
        Ok(())
    }

    async fn delete(ctx: &ProviderContext, id: &str, _prior: &TransitSecretBackendKey) -> ProviderResult<()> {
        delete_path(ctx, LABEL, id).await
    }

    fn customize_diff(prior: &TransitSecretBackendKey, planned: &TransitSecretBackendKey) -> Vec<&'static str> {
        let disabled = |was: Option<bool>, now: Option<bool>| was == Some(true) && now != Some(true);
        let mut forced = Vec::new();
        if disabled(prior.exportable, planned.exportable) {
            forced.push("exportable");
        }
        if disabled(prior.allow_plaintext_backup, planned.allow_plaintext_backup) {
            forced.push("allow_plaintext_backup");
        }
        forced
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::{DynamicResource, ResourceAdapter};
    use crate::state::Plan;
    use serde_json::{Map, json};
    use std::sync::Arc;
    use test_utils::MockVault;

    fn config(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[tokio::test]
    async fn test_create_writes_key_then_config() {
        let vault = MockVault::new();
        let ctx = ProviderContext::new(Arc::new(vault.clone()));
        let adapter = ResourceAdapter::<TransitSecretBackendKeyResource>::new();

        let cfg = config(json!({"backend": "transit", "name": "orders", "deletion_allowed": true}));
        let state = adapter.create(&ctx, &cfg).await.unwrap();

        assert_eq!(state.id, "transit/keys/orders");
        assert_eq!(vault.writes_to("transit/keys/orders").await[0]["type"], "aes256-gcm96");
        assert_eq!(vault.writes_to("transit/keys/orders/config").await[0]["deletion_allowed"], true);
        assert_eq!(state.attributes["latest_version"], 1);
        assert!(adapter.plan(Some(&state), &cfg).unwrap().is_noop());
    }

    #[tokio::test]
    async fn test_update_sends_changed_config_only() {
        let vault = MockVault::new();
        let ctx = ProviderContext::new(Arc::new(vault.clone()));
        let adapter = ResourceAdapter::<TransitSecretBackendKeyResource>::new();

        let state = adapter
            .create(&ctx, &config(json!({"backend": "transit", "name": "k"})))
            .await
            .unwrap();
        let cfg = config(json!({"backend": "transit", "name": "k", "exportable": true}));
        let updated = adapter.update(&ctx, &state, &cfg).await.unwrap();

        assert_eq!(updated.attributes["exportable"], true);
        let writes = vault.writes_to("transit/keys/k/config").await;
        assert_eq!(Value::Object(writes[1].clone()), json!({"exportable": true}));
    }

    #[tokio::test]
    async fn test_update_keeps_omitted_rotation_period() {
        let vault = MockVault::new();
        let ctx = ProviderContext::new(Arc::new(vault.clone()));
        let adapter = ResourceAdapter::<TransitSecretBackendKeyResource>::new();

        let state = adapter
            .create(
                &ctx,
                &config(json!({"backend": "transit", "name": "k", "auto_rotate_period": 3600})),
            )
            .await
            .unwrap();
        assert_eq!(state.attributes["auto_rotate_period"], 3600);

        let cfg = config(json!({"backend": "transit", "name": "k", "deletion_allowed": true}));
        let updated = adapter.update(&ctx, &state, &cfg).await.unwrap();

        let writes = vault.writes_to("transit/keys/k/config").await;
        assert_eq!(Value::Object(writes[1].clone()), json!({"deletion_allowed": true}));
        assert_eq!(updated.attributes["auto_rotate_period"], 3600);
        assert!(adapter.plan(Some(&updated), &cfg).unwrap().is_noop());
    }

    #[tokio::test]
    async fn test_disabling_export_replaces() {
        let ctx = ProviderContext::new(Arc::new(MockVault::new()));
        let adapter = ResourceAdapter::<TransitSecretBackendKeyResource>::new();

        let state = adapter
            .create(
                &ctx,
                &config(json!({"backend": "transit", "name": "k", "exportable": true, "allow_plaintext_backup": true})),
            )
            .await
            .unwrap();
        let plan = adapter
            .plan(Some(&state), &config(json!({"backend": "transit", "name": "k"})))
            .unwrap();
        let Plan::Replace { because, .. } = plan else {
            panic!("expected replacement, got {plan:?}");
        };
        assert_eq!(because, vec!["exportable".to_string(), "allow_plaintext_backup".to_string()]);
    }

    #[test]
    fn test_key_type_validated() {
        let err = TransitSecretBackendKeyResource::schema()
            .prepare(&config(json!({"backend": "transit", "name": "k", "type": "des"})))
            .unwrap_err();
        assert!(err.to_string().starts_with("type: expected one of"));
    }
}
