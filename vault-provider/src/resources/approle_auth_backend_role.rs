//! `vault_approle_auth_backend_role`: a role of the AppRole auth method.
//!
//! The role id lives at a separate `role-id` sub-path, so create, read and
//! update each make a second call for it.

use crate::body::{RequestBody, ResponseData};
use crate::context::ProviderContext;
use crate::error::{Operation, ProviderResult, VaultResultExt};
use crate::path::{auth_role_path, split_auth_role};
use crate::resource::{Resource, delete_path};
use crate::schema::{Attribute, Schema, no_leading_trailing_slashes, non_negative};
use crate::token_fields::{TokenFields, token_attributes};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

const LABEL: &str = "AppRole auth backend role";

/// Role configuration and state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppRoleAuthBackendRole {
    /// Auth mount path
    pub backend: String,
    /// Role name
    pub role_name: String,
    /// Role id; generated by the server when not set
    pub role_id: Option<String>,
    /// Require a secret id at login
    pub bind_secret_id: Option<bool>,
    /// CIDRs secret ids may be used from
    pub secret_id_bound_cidrs: Option<BTreeSet<String>>,
    /// Uses per secret id, 0 for unlimited
    pub secret_id_num_uses: Option<i64>,
    /// Secret id TTL in seconds
    pub secret_id_ttl: Option<i64>,
    /// Secret ids are local to the cluster
    pub local_secret_ids: Option<bool>,
    /// Token settings
    #[serde(flatten)]
    pub token: TokenFields,
}

impl AppRoleAuthBackendRole {
    fn body(&self) -> RequestBody {
        let mut body = RequestBody::new();
        body.insert_opt("bind_secret_id", self.bind_secret_id.as_ref())
            .insert_strings("secret_id_bound_cidrs", self.secret_id_bound_cidrs.as_ref())
            .insert_opt("secret_id_num_uses", self.secret_id_num_uses.as_ref())
            .insert_opt("secret_id_ttl", self.secret_id_ttl.as_ref())
            .insert_opt("local_secret_ids", self.local_secret_ids.as_ref());
        self.token.write_to(&mut body);
        body
    }
}

/// Resource kind.
#[derive(Debug)]
pub struct AppRoleAuthBackendRoleResource;

/// `auth/<backend>/role/<role>/role-id`
pub(crate) fn role_id_path(role_path: &str) -> String {
    format!("{role_path}/role-id")
}

async fn write_role_id(ctx: &ProviderContext, role_path: &str, role_id: &str) -> ProviderResult<()> {
    let path = role_id_path(role_path);
    let mut body = RequestBody::new();
    body.insert("role_id", role_id);
    ctx.client()
        .write(&path, body.into_map())
        .await
        .context(Operation::Write, LABEL, &path)?;
    Ok(())
}

#[async_trait]
impl Resource for AppRoleAuthBackendRoleResource {
    type Model = AppRoleAuthBackendRole;
    const TYPE_NAME: &'static str = "vault_approle_auth_backend_role";

    fn schema() -> Schema {
        Schema::new("Manages a role of the AppRole auth method")
            .attribute(
                Attribute::string("backend")
                    .default("approle")
                    .force_new()
                    .validate(no_leading_trailing_slashes)
                    .description("Unique name of the auth backend to configure"),
            )
            .attribute(
                Attribute::string("role_name")
                    .required()
                    .force_new()
                    .description("Name of the role"),
            )
            .attribute(
                Attribute::string("role_id")
                    .optional_computed()
                    .description("The RoleID of the role. Autogenerated if not set"),
            )
            .attribute(
                Attribute::bool("bind_secret_id")
                    .default(true)
                    .description("Whether or not to require secret_id to be present when logging in"),
            )
            .attribute(Attribute::set("secret_id_bound_cidrs"))
            .attribute(Attribute::int("secret_id_num_uses").validate(non_negative))
            .attribute(Attribute::int("secret_id_ttl").validate(non_negative))
            .attribute(
                Attribute::bool("local_secret_ids")
                    .force_new()
                    .description("Secret IDs generated by this role are local to the cluster"),
            )
            .attributes(token_attributes())
    }

    async fn create(ctx: &ProviderContext, planned: &AppRoleAuthBackendRole) -> ProviderResult<String> {
        let path = auth_role_path(&planned.backend, &planned.role_name);
        ctx.client()
            .write(&path, planned.body().into_map())
            .await
            .context(Operation::Create, LABEL, &path)?;

        if let Some(role_id) = planned.role_id.as_deref().filter(|r| !r.is_empty()) {
            write_role_id(ctx, &path, role_id).await?;
        }
        Ok(path)
    }

    async fn read(
        ctx: &ProviderContext,
        id: &str,
        _prior: Option<&AppRoleAuthBackendRole>,
    ) -> ProviderResult<Option<AppRoleAuthBackendRole>> {
        let (backend, role_name) = split_auth_role(Self::TYPE_NAME, id)?;
        let Some(secret) = ctx.client().read(id).await.context(Operation::Read, LABEL, id)? else {
            return Ok(None);
        };
        let data = ResponseData::new(secret.into_data());

        let role_id_path = role_id_path(id);
        let role_id = ctx
            .client()
            .read(&role_id_path)
            .await
            .context(Operation::Read, LABEL, &role_id_path)?
            .and_then(|s| ResponseData::new(s.into_data()).string("role_id"));

        Ok(Some(AppRoleAuthBackendRole {
            backend,
            role_name,
            role_id,
            bind_secret_id: data.bool("bind_secret_id"),
            secret_id_bound_cidrs: data.string_set("secret_id_bound_cidrs"),
            secret_id_num_uses: data.int("secret_id_num_uses"),
            secret_id_ttl: data.int("secret_id_ttl"),
            local_secret_ids: data.bool("local_secret_ids"),
            token: TokenFields::from_response(&data),
        }))
    }

    async fn update(
        ctx: &ProviderContext,
        id: &str,
        prior: &AppRoleAuthBackendRole,
        planned: &AppRoleAuthBackendRole,
    ) -> ProviderResult<()> {
        let body = planned.body().changed_since(&prior.body(), &[]);
        if !body.is_empty() {
            ctx.client()
                .write(id, body.into_map())
                .await
                .context(Operation::Update, LABEL, id)?;
        }

        if let Some(role_id) = planned.role_id.as_deref().filter(|r| !r.is_empty()) {
            if prior.role_id.as_deref() != Some(role_id) {
                write_role_id(ctx, id, role_id).await?;
            }
        }
        Ok(())
    }

    async fn delete(ctx: &ProviderContext, id: &str, _prior: &AppRoleAuthBackendRole) -> ProviderResult<()> {
        delete_path(ctx, LABEL, id).await
    }
}
