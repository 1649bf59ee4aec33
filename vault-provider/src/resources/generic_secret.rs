//! `vault_generic_secret`: a JSON object written to an arbitrary path.

use crate::context::ProviderContext;
use crate::error::{Operation, ProviderError, ProviderResult, VaultResultExt};
use crate::resource::{Resource, delete_path};
use crate::schema::{Attribute, Schema, non_empty};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use tracing::debug;

const LABEL: &str = "generic secret";

/// Secret configuration and state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenericSecret {
    /// Full logical path, also the id
    pub path: String,
    /// Secret data as a JSON object
    pub data_json: String,
    /// Do not read the secret back
    pub disable_read: Option<bool>,
    /// Read the secret back; replaced by `disable_read`
    pub allow_read: Option<bool>,
    /// Secret data with values rendered as strings
    pub data: Option<BTreeMap<String, String>>,
}

impl GenericSecret {
    fn reads_disabled(&self) -> bool {
        self.disable_read.unwrap_or(false) || self.allow_read == Some(false)
    }
}

/// Resource kind.
#[derive(Debug)]
pub struct GenericSecretResource;

/// Parse a `data_json` value into the object sent to the server.
///
/// # Errors
///
/// Returns [`ProviderError::InvalidValue`] when the document is not a JSON object.
pub(crate) fn parse_object(attribute: &'static str, json: &str) -> ProviderResult<Map<String, Value>> {
    serde_json::from_str(json).map_err(|e| ProviderError::InvalidValue {
        attribute,
        message: format!("expected a JSON object: {e}"),
    })
}

/// String rendering of every value in a secret.
pub(crate) fn flatten(data: &Map<String, Value>) -> BTreeMap<String, String> {
    data.iter()
        .map(|(k, v)| {
            let text = match v {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            (k.clone(), text)
        })
        .collect()
}

async fn write_secret(ctx: &ProviderContext, op: Operation, model: &GenericSecret) -> ProviderResult<()> {
    let data = parse_object("data_json", &model.data_json)?;
    ctx.client().write(&model.path, data).await.context(op, LABEL, &model.path)?;
    Ok(())
}

#[async_trait]
impl Resource for GenericSecretResource {
    type Model = GenericSecret;
    const TYPE_NAME: &'static str = "vault_generic_secret";

    fn schema() -> Schema {
        Schema::new("Writes a JSON object to an arbitrary path")
            .attribute(
                Attribute::string("path")
                    .required()
                    .force_new()
                    .validate(non_empty)
                    .description("Full path where the generic secret will be written"),
            )
            .attribute(
                Attribute::json("data_json")
                    .required()
                    .sensitive()
                    .description("JSON-encoded secret data to write"),
            )
            .attribute(
                Attribute::bool("disable_read")
                    .default(false)
                    .conflicts_with(&["allow_read"])
                    .description("Don't attempt to read the token from Vault if true; drift won't be detected"),
            )
            .attribute(
                Attribute::bool("allow_read")
                    .deprecated("Please use disable_read instead")
                    .description("True if the provided token is allowed to read the secret from vault"),
            )
            .attribute(
                Attribute::map("data")
                    .computed()
                    .sensitive()
                    .description("Map of strings read from Vault"),
            )
    }

    async fn create(ctx: &ProviderContext, planned: &GenericSecret) -> ProviderResult<String> {
        write_secret(ctx, Operation::Create, planned).await?;
        Ok(planned.path.clone())
    }

    async fn read(
        ctx: &ProviderContext,
        id: &str,
        prior: Option<&GenericSecret>,
    ) -> ProviderResult<Option<GenericSecret>> {
        if let Some(prior) = prior.filter(|p| p.reads_disabled()) {
            debug!(path = id, "reads disabled, keeping stored data");
            let mut model = prior.clone();
            model.path = id.to_string();
            return Ok(Some(model));
        }

        let Some(secret) = ctx.client().read(id).await.context(Operation::Read, LABEL, id)? else {
            return Ok(None);
        };
        let data = secret.into_data();
        Ok(Some(GenericSecret {
            path: id.to_string(),
            data_json: serde_json::to_string(&data)?,
            disable_read: prior.and_then(|p| p.disable_read),
            allow_read: prior.and_then(|p| p.allow_read),
            data: Some(flatten(&data)),
        }))
    }

    async fn update(
        ctx: &ProviderContext,
        _id: &str,
        _prior: &GenericSecret,
        planned: &GenericSecret,
    ) -> ProviderResult<()> {
        write_secret(ctx, Operation::Update, planned).await
    }

    async fn delete(ctx: &ProviderContext, id: &str, _prior: &GenericSecret) -> ProviderResult<()> {
        delete_path(ctx, LABEL, id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::{DynamicResource, ResourceAdapter};
    use crate::schema::Severity;
    use serde_json::json;
    use std::sync::Arc;
    use test_utils::{MockVault, RequestKind};

    fn config(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[tokio::test]
    async fn test_round_trip_and_data_map() {
        let ctx = ProviderContext::new(Arc::new(MockVault::new()));
        let adapter = ResourceAdapter::<GenericSecretResource>::new();

        let cfg = config(json!({"path": "secret/app", "data_json": "{\"user\": \"app\", \"port\": 5432}"}));
        let state = adapter.create(&ctx, &cfg).await.unwrap();

        assert_eq!(state.attributes["data"], json!({"user": "app", "port": "5432"}));
        assert!(adapter.plan(Some(&state), &cfg).unwrap().is_noop());
    }

    #[tokio::test]
    async fn test_drift_is_detected() {
        let vault = MockVault::new();
        let ctx = ProviderContext::new(Arc::new(vault.clone()));
        let adapter = ResourceAdapter::<GenericSecretResource>::new();

        let cfg = config(json!({"path": "secret/app", "data_json": "{\"a\": \"1\"}"}));
        let state = adapter.create(&ctx, &cfg).await.unwrap();

        vault.insert("secret/app", json!({"a": "2"})).await;
        let refreshed = adapter.read(&ctx, &state).await.unwrap().unwrap();
        assert!(!adapter.plan(Some(&refreshed), &cfg).unwrap().is_noop());
    }

    #[tokio::test]
    async fn test_disable_read_skips_remote_call() {
        let vault = MockVault::new();
        let ctx = ProviderContext::new(Arc::new(vault.clone()));
        let adapter = ResourceAdapter::<GenericSecretResource>::new();

        let cfg = config(json!({"path": "secret/w", "data_json": "{}", "disable_read": true}));
        let state = adapter.create(&ctx, &cfg).await.unwrap();
        vault.clear_requests().await;

        let refreshed = adapter.read(&ctx, &state).await.unwrap().unwrap();
        assert_eq!(refreshed, state);
        assert!(vault.requests().await.iter().all(|r| r.kind != RequestKind::Read));
    }

    #[test]
    fn test_allow_read_deprecated_and_conflicting() {
        let adapter = ResourceAdapter::<GenericSecretResource>::new();
        let prepared = adapter
            .validate(&config(json!({"path": "p", "data_json": "{}", "allow_read": true})))
            .unwrap();
        assert_eq!(prepared.warnings[0].severity, Severity::Warning);

        assert!(adapter
            .validate(&config(json!({
                "path": "p",
                "data_json": "{}",
                "allow_read": true,
                "disable_read": true
            })))
            .is_err());
    }

    #[tokio::test]
    async fn test_non_object_json_rejected() {
        let ctx = ProviderContext::new(Arc::new(MockVault::new()));
        let err = ResourceAdapter::<GenericSecretResource>::new()
            .create(&ctx, &config(json!({"path": "p", "data_json": "[1, 2]"})))
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::InvalidValue { attribute: "data_json", .. }));
    }
}
