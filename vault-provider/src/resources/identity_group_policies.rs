//! `vault_identity_group_policies`: policies attached to an existing group.
//!
//! With `exclusive` the resource owns the group's whole policy set. Without
//! it, every write is a read-modify-write that only adds or removes the
//! policies this resource manages, leaving others in place.

use crate::body::{RequestBody, ResponseData};
use crate::context::ProviderContext;
use crate::error::{Operation, ProviderError, ProviderResult, VaultResultExt};
use crate::path::{identity_group_name, identity_group_path};
use crate::resource::Resource;
use crate::schema::{Attribute, Schema, non_empty};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tracing::debug;

const LABEL: &str = "identity group policies";

/// Attachment configuration and state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IdentityGroupPolicies {
    /// Name of the group
    pub group_name: String,
    /// Policies attached by this resource
    pub policies: BTreeSet<String>,
    /// Own the group's entire policy set
    pub exclusive: Option<bool>,
    /// Group id
    pub group_id: Option<String>,
}

impl IdentityGroupPolicies {
    fn is_exclusive(&self) -> bool {
        self.exclusive.unwrap_or(true)
    }
}

/// Resource kind.
#[derive(Debug)]
pub struct IdentityGroupPoliciesResource;

struct Group {
    id: Option<String>,
    policies: BTreeSet<String>,
}

async fn read_group(ctx: &ProviderContext, path: &str) -> ProviderResult<Option<Group>> {
    let Some(secret) = ctx.client().read(path).await.context(Operation::Read, LABEL, path)? else {
        return Ok(None);
    };
    let data = ResponseData::new(secret.into_data());
    Ok(Some(Group {
        id: data.string("id"),
        policies: data.string_set("policies").unwrap_or_default(),
    }))
}

async fn write_policies(ctx: &ProviderContext, op: Operation, path: &str, policies: &BTreeSet<String>) -> ProviderResult<()> {
    debug!(path, count = policies.len(), "writing group policies");
    let mut body = RequestBody::new();
    body.insert_strings("policies", Some(policies));
    ctx.client().write(path, body.into_map()).await.context(op, LABEL, path)?;
    Ok(())
}

/// Apply `remove` then `add` to the group's current policies.
async fn merge_policies(
    ctx: &ProviderContext,
    op: Operation,
    path: &str,
    remove: &BTreeSet<String>,
    add: &BTreeSet<String>,
) -> ProviderResult<()> {
    let Some(group) = read_group(ctx, path).await? else {
        return Err(ProviderError::NotFound {
            resource: IdentityGroupPoliciesResource::TYPE_NAME,
            path: path.to_string(),
        });
    };
    let policies: BTreeSet<String> = group
        .policies
        .difference(remove)
        .cloned()
        .chain(add.iter().cloned())
        .collect();
    write_policies(ctx, op, path, &policies).await
}

#[async_trait]
impl Resource for IdentityGroupPoliciesResource {
    type Model = IdentityGroupPolicies;
    const TYPE_NAME: &'static str = "vault_identity_group_policies";

    fn schema() -> Schema {
        Schema::new("Attaches policies to an identity group")
            .attribute(
                Attribute::string("group_name")
                    .required()
                    .force_new()
                    .validate(non_empty)
                    .description("Name of the group"),
            )
            .attribute(Attribute::set("policies").required().description("Policies to attach to the group"))
            .attribute(
                Attribute::bool("exclusive")
                    .default(true)
                    .description("Whether this resource manages every policy of the group"),
            )
            .attribute(Attribute::string("group_id").computed().description("ID of the group"))
    }

    async fn create(ctx: &ProviderContext, planned: &IdentityGroupPolicies) -> ProviderResult<String> {
        let path = identity_group_path(&planned.group_name);
        if planned.is_exclusive() {
            if read_group(ctx, &path).await?.is_none() {
                return Err(ProviderError::NotFound {
                    resource: Self::TYPE_NAME,
                    path,
                });
            }
            write_policies(ctx, Operation::Create, &path, &planned.policies).await?;
        } else {
            merge_policies(ctx, Operation::Create, &path, &BTreeSet::new(), &planned.policies).await?;
        }
        Ok(path)
    }

    async fn read(
        ctx: &ProviderContext,
        id: &str,
        prior: Option<&IdentityGroupPolicies>,
    ) -> ProviderResult<Option<IdentityGroupPolicies>> {
        let group_name = identity_group_name(Self::TYPE_NAME, id)?;
        let Some(group) = read_group(ctx, id).await? else {
            return Ok(None);
        };
        let exclusive = Some(prior.is_none_or(IdentityGroupPolicies::is_exclusive));
        let policies = match prior {
            Some(prior) if !prior.is_exclusive() => group.policies.intersection(&prior.policies).cloned().collect(),
            _ => group.policies,
        };
        Ok(Some(IdentityGroupPolicies {
            group_name,
            policies,
            exclusive,
            group_id: group.id,
        }))
    }

    async fn update(
        ctx: &ProviderContext,
        id: &str,
        prior: &IdentityGroupPolicies,
        planned: &IdentityGroupPolicies,
    ) -> ProviderResult<()> {
        if planned.is_exclusive() {
            write_policies(ctx, Operation::Update, id, &planned.policies).await
        } else {
            merge_policies(ctx, Operation::Update, id, &prior.policies, &planned.policies).await
        }
    }

    async fn delete(ctx: &ProviderContext, id: &str, prior: &IdentityGroupPolicies) -> ProviderResult<()> {
        if read_group(ctx, id).await?.is_none() {
            return Ok(());
        }
        if prior.is_exclusive() {
            write_policies(ctx, Operation::Delete, id, &BTreeSet::new()).await
        } else {
            merge_policies(ctx, Operation::Delete, id, &prior.policies, &BTreeSet::new()).await
        }
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

    async fn vault_with_group(policies: Value) -> MockVault {
        let vault = MockVault::new();
        vault
            .insert("identity/group/name/ops", json!({"id": "g-1", "name": "ops", "policies": policies}))
            .await;
        vault
    }

    #[tokio::test]
    async fn test_non_exclusive_keeps_foreign_policies() {
        let vault = vault_with_group(json!(["foreign"])).await;
        let ctx = ProviderContext::new(Arc::new(vault.clone()));
        let adapter = ResourceAdapter::<IdentityGroupPoliciesResource>::new();

        let cfg = config(json!({"group_name": "ops", "policies": ["a", "b"], "exclusive": false}));
        let state = adapter.create(&ctx, &cfg).await.unwrap();

        assert_eq!(
            vault.get("identity/group/name/ops").await.unwrap()["policies"],
            json!(["a", "b", "foreign"])
        );
        assert_eq!(state.attributes["policies"], json!(["a", "b"]));
        assert_eq!(state.attributes["group_id"], "g-1");
        assert!(adapter.plan(Some(&state), &cfg).unwrap().is_noop());

        let shrunk = config(json!({"group_name": "ops", "policies": ["b"], "exclusive": false}));
        let state = adapter.update(&ctx, &state, &shrunk).await.unwrap();
        assert_eq!(
            vault.get("identity/group/name/ops").await.unwrap()["policies"],
            json!(["b", "foreign"])
        );

        adapter.delete(&ctx, &state).await.unwrap();
        assert_eq!(
            vault.get("identity/group/name/ops").await.unwrap()["policies"],
            json!(["foreign"])
        );
    }

    #[tokio::test]
    async fn test_exclusive_replaces_and_clears() {
        let vault = vault_with_group(json!(["foreign"])).await;
        let ctx = ProviderContext::new(Arc::new(vault.clone()));
        let adapter = ResourceAdapter::<IdentityGroupPoliciesResource>::new();

        let state = adapter
            .create(&ctx, &config(json!({"group_name": "ops", "policies": ["a"]})))
            .await
            .unwrap();
        assert_eq!(state.attributes["policies"], json!(["a"]));

        adapter.delete(&ctx, &state).await.unwrap();
        assert_eq!(vault.get("identity/group/name/ops").await.unwrap()["policies"], json!([]));
    }

    #[tokio::test]
    async fn test_missing_group_is_error() {
        let ctx = ProviderContext::new(Arc::new(MockVault::new()));
        let err = ResourceAdapter::<IdentityGroupPoliciesResource>::new()
            .create(&ctx, &config(json!({"group_name": "nope", "policies": ["a"]})))
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::NotFound { .. }));
    }
}
