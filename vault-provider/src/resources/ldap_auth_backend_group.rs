//! `vault_ldap_auth_backend_group`: policies mapped to an LDAP group.

use crate::body::{RequestBody, ResponseData};
use crate::context::ProviderContext;
use crate::error::{Operation, ProviderResult, VaultResultExt};
use crate::path::{auth_group_path, split_auth_group};
use crate::resource::{Resource, delete_path};
use crate::schema::{Attribute, Schema, no_leading_trailing_slashes};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

const LABEL: &str = "LDAP group";

/// Group mapping configuration and state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LdapAuthBackendGroup {
    /// Auth mount path
    pub backend: String,
    /// LDAP group name
    pub groupname: String,
    /// Policies granted to members
    pub policies: Option<BTreeSet<String>>,
}

/// Resource kind.
#[derive(Debug)]
pub struct LdapAuthBackendGroupResource;

async fn write_group(ctx: &ProviderContext, op: Operation, path: &str, model: &LdapAuthBackendGroup) -> ProviderResult<()> {
    let mut body = RequestBody::new();
    body.insert_joined("policies", Some(model.policies.iter().flatten()));
    ctx.client().write(path, body.into_map()).await.context(op, LABEL, path)?;
    Ok(())
}

#[async_trait]
impl Resource for LdapAuthBackendGroupResource {
    type Model = LdapAuthBackendGroup;
    const TYPE_NAME: &'static str = "vault_ldap_auth_backend_group";

    fn schema() -> Schema {
        Schema::new("Maps an LDAP group to policies")
            .attribute(
                Attribute::string("backend")
                    .default("ldap")
                    .force_new()
                    .validate(no_leading_trailing_slashes),
            )
            .attribute(Attribute::string("groupname").required().force_new())
            .attribute(Attribute::set("policies").description("Policies granted to members of the group"))
    }

    async fn create(ctx: &ProviderContext, planned: &LdapAuthBackendGroup) -> ProviderResult<String> {
        let path = auth_group_path(&planned.backend, &planned.groupname);
        write_group(ctx, Operation::Create, &path, planned).await?;
        Ok(path)
    }

    async fn read(
        ctx: &ProviderContext,
        id: &str,
        _prior: Option<&LdapAuthBackendGroup>,
    ) -> ProviderResult<Option<LdapAuthBackendGroup>> {
        let (backend, groupname) = split_auth_group(Self::TYPE_NAME, id)?;
        let Some(secret) = ctx.client().read(id).await.context(Operation::Read, LABEL, id)? else {
            return Ok(None);
        };
        let data = ResponseData::new(secret.into_data());
        Ok(Some(LdapAuthBackendGroup {
            backend,
            groupname,
            policies: data.string_set("policies"),
        }))
    }

    async fn update(
        ctx: &ProviderContext,
        id: &str,
        _prior: &LdapAuthBackendGroup,
        planned: &LdapAuthBackendGroup,
    ) -> ProviderResult<()> {
        write_group(ctx, Operation::Update, id, planned).await
    }

    async fn delete(ctx: &ProviderContext, id: &str, _prior: &LdapAuthBackendGroup) -> ProviderResult<()> {
        delete_path(ctx, LABEL, id).await
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
    async fn test_policies_sent_comma_joined() {
        let vault = MockVault::new();
        let ctx = ProviderContext::new(Arc::new(vault.clone()));
        let adapter = ResourceAdapter::<LdapAuthBackendGroupResource>::new();

        let cfg = config(json!({"groupname": "admins", "policies": ["ops", "admin"]}));
        let state = adapter.create(&ctx, &cfg).await.unwrap();

        assert_eq!(state.id, "auth/ldap/groups/admins");
        assert_eq!(vault.writes_to("auth/ldap/groups/admins").await[0]["policies"], "admin,ops");
        assert_eq!(state.attributes["policies"], json!(["admin", "ops"]));
        assert!(adapter.plan(Some(&state), &cfg).unwrap().is_noop());
    }

    #[tokio::test]
    async fn test_list_response_accepted() {
        let vault = MockVault::new();
        vault
            .insert("auth/corp/groups/dev", json!({"policies": ["dev", "default"]}))
            .await;
        let ctx = ProviderContext::new(Arc::new(vault));

        let state = ResourceAdapter::<LdapAuthBackendGroupResource>::new()
            .import(&ctx, "auth/corp/groups/dev")
            .await
            .unwrap();
        assert_eq!(state.attributes["backend"], "corp");
        assert_eq!(state.attributes["policies"], json!(["default", "dev"]));
    }
}
