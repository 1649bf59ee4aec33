//! `vault_identity_group`: an identity group addressed by name.

use crate::body::{RequestBody, ResponseData};
use crate::context::ProviderContext;
use crate::error::{Operation, ProviderResult, VaultResultExt};
use crate::path::{identity_group_name, identity_group_path};
use crate::resource::{Resource, delete_path};
use crate::schema::{Attribute, Schema, non_empty};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};

const LABEL: &str = "identity group";

fn valid_group_type(value: &Value) -> Result<(), String> {
    match value.as_str() {
        Some("internal" | "external") => Ok(()),
        _ => Err(format!("expected internal or external, got {value}")),
    }
}

/// Group configuration and state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IdentityGroup {
    /// Group name
    pub name: String,
    /// `internal` or `external`
    #[serde(rename = "type")]
    pub kind: Option<String>,
    /// Policies attached to the group
    pub policies: Option<BTreeSet<String>>,
    /// Free-form metadata
    pub metadata: Option<BTreeMap<String, String>>,
    /// Member group ids
    pub member_group_ids: Option<BTreeSet<String>>,
    /// Member entity ids
    pub member_entity_ids: Option<BTreeSet<String>>,
    /// Policies are managed elsewhere
    pub external_policies: Option<bool>,
    /// Member entities are managed elsewhere
    pub external_member_entity_ids: Option<bool>,
    /// Group id assigned by the server
    pub group_id: Option<String>,
}

impl IdentityGroup {
    fn manages_policies(&self) -> bool {
        !self.external_policies.unwrap_or(false)
    }

    fn manages_members(&self) -> bool {
        !self.external_member_entity_ids.unwrap_or(false) && self.kind.as_deref() != Some("external")
    }

    fn body(&self) -> RequestBody {
        let mut body = RequestBody::new();
        body.insert_map("metadata", self.metadata.as_ref())
            .insert_strings("member_group_ids", self.member_group_ids.as_ref());
        if self.manages_policies() {
            body.insert_strings("policies", self.policies.as_ref());
        }
        if self.manages_members() {
            body.insert_strings("member_entity_ids", self.member_entity_ids.as_ref());
        }
        body
    }
}

/// Resource kind.
#[derive(Debug)]
pub struct IdentityGroupResource;

#[async_trait]
impl Resource for IdentityGroupResource {
    type Model = IdentityGroup;
    const TYPE_NAME: &'static str = "vault_identity_group";

    fn schema() -> Schema {
        Schema::new("Manages an identity group")
            .attribute(
                Attribute::string("name")
                    .required()
                    .force_new()
                    .validate(non_empty)
                    .description("Name of the group"),
            )
            .attribute(
                Attribute::string("type")
                    .default("internal")
                    .force_new()
                    .validate(valid_group_type)
                    .description("Type of the group, internal or external"),
            )
            .attribute(
                Attribute::set("policies")
                    .description("Policies to apply to the group"),
            )
            .attribute(Attribute::map("metadata").description("Metadata to associate with the group"))
            .attribute(Attribute::set("member_group_ids").description("Group IDs to be assigned as group members"))
            .attribute(
                Attribute::set("member_entity_ids")
                    .description("Entity IDs to be assigned as group members"),
            )
            .attribute(
                Attribute::bool("external_policies")
                    .default(false)
                    .description("Manage policies externally through vault_identity_group_policies"),
            )
            .attribute(
                Attribute::bool("external_member_entity_ids")
                    .default(false)
                    .description("Manage member entities externally"),
            )
            .attribute(Attribute::string("group_id").computed().description("ID of the group"))
    }

    async fn create(ctx: &ProviderContext, planned: &IdentityGroup) -> ProviderResult<String> {
        let path = identity_group_path(&planned.name);
        let mut body = planned.body();
        body.insert_non_empty("type", planned.kind.as_ref());
        ctx.client()
            .write(&path, body.into_map())
            .await
            .context(Operation::Create, LABEL, &path)?;
        Ok(path)
    }

    async fn read(ctx: &ProviderContext, id: &str, prior: Option<&IdentityGroup>) -> ProviderResult<Option<IdentityGroup>> {
        let name = identity_group_name(Self::TYPE_NAME, id)?;
        let Some(secret) = ctx.client().read(id).await.context(Operation::Read, LABEL, id)? else {
            return Ok(None);
        };
        let data = ResponseData::new(secret.into_data());

        let mut group = IdentityGroup {
            name,
            kind: data.string("type"),
            metadata: data.string_map("metadata"),
            member_group_ids: data.string_set("member_group_ids"),
            external_policies: prior.and_then(|p| p.external_policies),
            external_member_entity_ids: prior.and_then(|p| p.external_member_entity_ids),
            group_id: data.string("id"),
            ..IdentityGroup::default()
        };
        if group.manages_policies() {
            group.policies = data.string_set("policies");
        }
        if group.manages_members() {
            group.member_entity_ids = data.string_set("member_entity_ids");
        }
        Ok(Some(group))
    }

    async fn update(ctx: &ProviderContext, id: &str, prior: &IdentityGroup, planned: &IdentityGroup) -> ProviderResult<()> {
        let mut body = planned.body().changed_since(&prior.body(), &[]);
        if !planned.manages_policies() {
            body.remove("policies");
        }
        if !planned.manages_members() {
            body.remove("member_entity_ids");
        }
        if body.is_empty() {
            return Ok(());
        }
        ctx.client()
            .write(id, body.into_map())
            .await
            .context(Operation::Update, LABEL, id)?;
        Ok(())
    }

    async fn delete(ctx: &ProviderContext, id: &str, _prior: &IdentityGroup) -> ProviderResult<()> {
        delete_path(ctx, LABEL, id).await
    }
}
