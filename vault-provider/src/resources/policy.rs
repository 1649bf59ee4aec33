//! `vault_policy`: an ACL policy document.

use crate::body::{RequestBody, ResponseData};
use crate::context::ProviderContext;
use crate::error::{Operation, ProviderResult, VaultResultExt};
use crate::path::join;
use crate::resource::{Resource, delete_path};
use crate::schema::{Attribute, Schema, non_empty};
use crate::shim::policy_text;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

const LABEL: &str = "policy";

/// Policy configuration and state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Policy {
    /// Policy name, also the id
    pub name: String,
    /// Policy document
    pub policy: String,
}

/// Resource kind.
#[derive(Debug)]
pub struct PolicyResource;

fn policy_path(name: &str) -> String {
    join(&["sys/policy", name])
}

async fn write_policy(ctx: &ProviderContext, op: Operation, model: &Policy) -> ProviderResult<()> {
    let path = policy_path(&model.name);
    let mut body = RequestBody::new();
    body.insert("policy", model.policy.clone());
    ctx.client().write(&path, body.into_map()).await.context(op, LABEL, &path)?;
    Ok(())
}

#[async_trait]
impl Resource for PolicyResource {
    type Model = Policy;
    const TYPE_NAME: &'static str = "vault_policy";

    fn schema() -> Schema {
        Schema::new("Manages an ACL policy")
            .attribute(
                Attribute::string("name")
                    .required()
                    .force_new()
                    .validate(non_empty)
                    .description("Name of the policy"),
            )
            .attribute(
                Attribute::string("policy")
                    .required()
                    .description("The policy document"),
            )
    }

    async fn create(ctx: &ProviderContext, planned: &Policy) -> ProviderResult<String> {
        write_policy(ctx, Operation::Create, planned).await?;
        Ok(planned.name.clone())
    }

    async fn read(ctx: &ProviderContext, id: &str, _prior: Option<&Policy>) -> ProviderResult<Option<Policy>> {
        let path = policy_path(id);
        let Some(secret) = ctx.client().read(&path).await.context(Operation::Read, LABEL, &path)? else {
            return Ok(None);
        };
        let data = ResponseData::new(secret.into_data());
        Ok(Some(Policy {
            name: id.to_string(),
            policy: policy_text(&data).unwrap_or_default(),
        }))
    }

    async fn update(ctx: &ProviderContext, _id: &str, _prior: &Policy, planned: &Policy) -> ProviderResult<()> {
        write_policy(ctx, Operation::Update, planned).await
    }

    async fn delete(ctx: &ProviderContext, id: &str, _prior: &Policy) -> ProviderResult<()> {
        delete_path(ctx, LABEL, &policy_path(id)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ProviderError;
    use crate::resource::{DynamicResource, ResourceAdapter};
    use serde_json::{Map, Value, json};
    use std::sync::Arc;
    use test_utils::MockVault;

    const DOC: &str = "path \"secret/*\" {\n  capabilities = [\"read\"]\n}\n";

    fn config(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[tokio::test]
    async fn test_read_accepts_rules_shape() {
        let vault = MockVault::new();
        let ctx = ProviderContext::new(Arc::new(vault.clone()));
        let adapter = ResourceAdapter::<PolicyResource>::new();

        let cfg = config(json!({"name": "dev", "policy": DOC}));
        let state = adapter.create(&ctx, &cfg).await.unwrap();

        assert!(vault.get("sys/policy/dev").await.unwrap().contains_key("rules"));
        assert_eq!(state.attributes["policy"], DOC);
        assert!(adapter.plan(Some(&state), &cfg).unwrap().is_noop());
    }

    #[tokio::test]
    async fn test_import() {
        let vault = MockVault::new();
        vault.insert("sys/policy/ops", json!({"name": "ops", "policy": DOC})).await;
        let ctx = ProviderContext::new(Arc::new(vault));

        let state = ResourceAdapter::<PolicyResource>::new().import(&ctx, "ops").await.unwrap();
        assert_eq!(state.attributes["name"], "ops");
        assert_eq!(state.attributes["policy"], DOC);
    }

    #[tokio::test]
    async fn test_write_error_is_wrapped() {
        let vault = MockVault::new().with_failure("sys/policy", 400, "failed to parse policy");
        let ctx = ProviderContext::new(Arc::new(vault));

        let err = ResourceAdapter::<PolicyResource>::new()
            .create(&ctx, &config(json!({"name": "bad", "policy": "{"})))
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::Api { op: Operation::Create, .. }));
        assert_eq!(
            err.to_string(),
            "error creating policy \"sys/policy/bad\": Vault API error (code 400): failed to parse policy"
        );
    }
}
