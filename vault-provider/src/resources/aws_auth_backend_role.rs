//! `vault_aws_auth_backend_role`: a role of the AWS auth method.

use crate::body::{RequestBody, ResponseData};
use crate::context::ProviderContext;
use crate::error::{Operation, ProviderResult, VaultResultExt};
use crate::path::{auth_role_path, split_auth_role};
use crate::resource::{Resource, delete_path};
use crate::schema::{Attribute, Schema, no_leading_trailing_slashes};
use crate::shim::LegacyList;
use crate::token_fields::{TokenFields, token_attributes};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeSet;

const LABEL: &str = "AWS auth backend role";

/// Plural bound fields and the singular keys older servers return them under.
const BOUND_FIELDS: &[(&str, &str)] = &[
    ("bound_ami_ids", "bound_ami_id"),
    ("bound_account_ids", "bound_account_id"),
    ("bound_regions", "bound_region"),
    ("bound_vpc_ids", "bound_vpc_id"),
    ("bound_subnet_ids", "bound_subnet_id"),
    ("bound_iam_role_arns", "bound_iam_role_arn"),
    ("bound_iam_instance_profile_arns", "bound_iam_instance_profile_arn"),
    ("bound_ec2_instance_ids", "bound_ec2_instance_id"),
    ("bound_iam_principal_arns", "bound_iam_principal_arn"),
];

fn valid_auth_type(value: &Value) -> Result<(), String> {
    match value.as_str() {
        Some("iam" | "ec2") => Ok(()),
        _ => Err(format!("expected iam or ec2, got {value}")),
    }
}

/// Role configuration and state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AwsAuthBackendRole {
    /// Auth mount path
    pub backend: String,
    /// Role name
    pub role: String,
    /// Role id assigned by the server
    pub role_id: Option<String>,
    /// `iam` or `ec2`
    pub auth_type: Option<String>,
    /// AMI ids
    pub bound_ami_ids: Option<BTreeSet<String>>,
    /// Account ids
    pub bound_account_ids: Option<BTreeSet<String>>,
    /// Regions
    pub bound_regions: Option<BTreeSet<String>>,
    /// VPC ids
    pub bound_vpc_ids: Option<BTreeSet<String>>,
    /// Subnet ids
    pub bound_subnet_ids: Option<BTreeSet<String>>,
    /// IAM role ARNs
    pub bound_iam_role_arns: Option<BTreeSet<String>>,
    /// IAM instance profile ARNs
    pub bound_iam_instance_profile_arns: Option<BTreeSet<String>>,
    /// EC2 instance ids
    pub bound_ec2_instance_ids: Option<BTreeSet<String>>,
    /// IAM principal ARNs
    pub bound_iam_principal_arns: Option<BTreeSet<String>>,
    /// Key of the role tag on the instance
    pub role_tag: Option<String>,
    /// Entity type inferred for IAM logins
    pub inferred_entity_type: Option<String>,
    /// Region of the inferred entity
    pub inferred_aws_region: Option<String>,
    /// Bind principals by their unique id
    pub resolve_aws_unique_ids: Option<bool>,
    /// Allow migration of an instance to a new host
    pub allow_instance_migration: Option<bool>,
    /// Allow a single login per instance
    pub disallow_reauthentication: Option<bool>,
    /// Token settings
    #[serde(flatten)]
    pub token: TokenFields,
}

impl AwsAuthBackendRole {
    fn bound(&self, plural: &str) -> Option<&BTreeSet<String>> {
        match plural {
            "bound_ami_ids" => self.bound_ami_ids.as_ref(),
            "bound_account_ids" => self.bound_account_ids.as_ref(),
            "bound_regions" => self.bound_regions.as_ref(),
            "bound_vpc_ids" => self.bound_vpc_ids.as_ref(),
            "bound_subnet_ids" => self.bound_subnet_ids.as_ref(),
            "bound_iam_role_arns" => self.bound_iam_role_arns.as_ref(),
            "bound_iam_instance_profile_arns" => self.bound_iam_instance_profile_arns.as_ref(),
            "bound_ec2_instance_ids" => self.bound_ec2_instance_ids.as_ref(),
            "bound_iam_principal_arns" => self.bound_iam_principal_arns.as_ref(),
            _ => None,
        }
    }

    fn body(&self) -> RequestBody {
        let mut body = RequestBody::new();
        body.insert_non_empty("auth_type", self.auth_type.as_ref());
        for &(plural, _) in BOUND_FIELDS {
            body.insert_strings(plural, self.bound(plural));
        }
        body.insert_non_empty("role_tag", self.role_tag.as_ref())
            .insert_non_empty("inferred_entity_type", self.inferred_entity_type.as_ref())
            .insert_non_empty("inferred_aws_region", self.inferred_aws_region.as_ref())
            .insert_opt("resolve_aws_unique_ids", self.resolve_aws_unique_ids.as_ref())
            .insert_opt("allow_instance_migration", self.allow_instance_migration.as_ref())
            .insert_opt("disallow_reauthentication", self.disallow_reauthentication.as_ref());
        self.token.write_to(&mut body);
        body
    }
}

/// Resource kind.
#[derive(Debug)]
pub struct AwsAuthBackendRoleResource;

#[async_trait]
impl Resource for AwsAuthBackendRoleResource {
    type Model = AwsAuthBackendRole;
    const TYPE_NAME: &'static str = "vault_aws_auth_backend_role";

    fn schema() -> Schema {
        let mut schema = Schema::new("Manages a role of the AWS auth method")
            .attribute(
                Attribute::string("backend")
                    .default("aws")
                    .force_new()
                    .validate(no_leading_trailing_slashes)
                    .description("Unique name of the auth backend to configure"),
            )
            .attribute(Attribute::string("role").required().force_new().description("Name of the role"))
            .attribute(Attribute::string("role_id").computed().description("The Vault generated role ID"))
            .attribute(
                Attribute::string("auth_type")
                    .default("iam")
                    .force_new()
                    .validate(valid_auth_type)
                    .description("The auth type permitted for this role"),
            );
        for &(plural, _) in BOUND_FIELDS {
            schema = schema.attribute(Attribute::set(plural));
        }
        schema
            .attribute(Attribute::string("role_tag"))
            .attribute(Attribute::string("inferred_entity_type"))
            .attribute(Attribute::string("inferred_aws_region"))
            .attribute(
                Attribute::bool("resolve_aws_unique_ids")
                    .default(true)
                    .description("Whether or not Vault should resolve the bound_iam_principal_arn to an AWS Unique ID"),
            )
            .attribute(Attribute::bool("allow_instance_migration"))
            .attribute(Attribute::bool("disallow_reauthentication"))
            .attributes(token_attributes())
    }

    async fn create(ctx: &ProviderContext, planned: &AwsAuthBackendRole) -> ProviderResult<String> {
        let path = auth_role_path(&planned.backend, &planned.role);
        ctx.client()
            .write(&path, planned.body().into_map())
            .await
            .context(Operation::Create, LABEL, &path)?;
        Ok(path)
    }

    async fn read(
        ctx: &ProviderContext,
        id: &str,
        _prior: Option<&AwsAuthBackendRole>,
    ) -> ProviderResult<Option<AwsAuthBackendRole>> {
        let (backend, role) = split_auth_role(Self::TYPE_NAME, id)?;
        let Some(secret) = ctx.client().read(id).await.context(Operation::Read, LABEL, id)? else {
            return Ok(None);
        };
        let data = ResponseData::new(secret.into_data());
        let bound = |plural: &str, singular: &str| LegacyList::from_response(&data, plural, singular).into_set();

        Ok(Some(AwsAuthBackendRole {
            backend,
            role,
            role_id: data.string("role_id"),
            auth_type: data.string("auth_type"),
            bound_ami_ids: bound("bound_ami_ids", "bound_ami_id"),
            bound_account_ids: bound("bound_account_ids", "bound_account_id"),
            bound_regions: bound("bound_regions", "bound_region"),
            bound_vpc_ids: bound("bound_vpc_ids", "bound_vpc_id"),
            bound_subnet_ids: bound("bound_subnet_ids", "bound_subnet_id"),
            bound_iam_role_arns: bound("bound_iam_role_arns", "bound_iam_role_arn"),
            bound_iam_instance_profile_arns: bound("bound_iam_instance_profile_arns", "bound_iam_instance_profile_arn"),
            bound_ec2_instance_ids: bound("bound_ec2_instance_ids", "bound_ec2_instance_id"),
            bound_iam_principal_arns: bound("bound_iam_principal_arns", "bound_iam_principal_arn"),
            role_tag: data.string("role_tag"),
            inferred_entity_type: data.string("inferred_entity_type"),
            inferred_aws_region: data.string("inferred_aws_region"),
            resolve_aws_unique_ids: data.bool("resolve_aws_unique_ids"),
            allow_instance_migration: data.bool("allow_instance_migration"),
            disallow_reauthentication: data.bool("disallow_reauthentication"),
            token: TokenFields::from_response(&data),
        }))
    }

    async fn update(
        ctx: &ProviderContext,
        id: &str,
        prior: &AwsAuthBackendRole,
        planned: &AwsAuthBackendRole,
    ) -> ProviderResult<()> {
        let body = planned.body().changed_since(&prior.body(), &["auth_type"]);
        ctx.client()
            .write(id, body.into_map())
            .await
            .context(Operation::Update, LABEL, id)?;
        Ok(())
    }

    async fn delete(ctx: &ProviderContext, id: &str, _prior: &AwsAuthBackendRole) -> ProviderResult<()> {
        delete_path(ctx, LABEL, id).await
    }

    fn customize_diff(prior: &AwsAuthBackendRole, planned: &AwsAuthBackendRole) -> Vec<&'static str> {
        if prior.resolve_aws_unique_ids == Some(false) && planned.resolve_aws_unique_ids == Some(true) {
            return vec!["resolve_aws_unique_ids"];
        }
        Vec::new()
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
    async fn test_create_and_plan_idempotent() {
        let vault = MockVault::new();
        let ctx = ProviderContext::new(Arc::new(vault.clone()));
        let adapter = ResourceAdapter::<AwsAuthBackendRoleResource>::new();

        let cfg = config(json!({
            "role": "web",
            "bound_iam_principal_arns": ["arn:aws:iam::123456789012:role/web"],
            "token_ttl": 300,
            "token_policies": ["web", "default"]
        }));
        let state = adapter.create(&ctx, &cfg).await.unwrap();

        assert_eq!(state.id, "auth/aws/role/web");
        let body = vault.writes_to("auth/aws/role/web").await.remove(0);
        assert_eq!(body["auth_type"], "iam");
        assert_eq!(body["resolve_aws_unique_ids"], true);
        assert_eq!(body["token_type"], "default");
        assert!(adapter.plan(Some(&state), &cfg).unwrap().is_noop());
    }

    #[tokio::test]
    async fn test_legacy_singular_field_read_as_set() {
        let vault = MockVault::new();
        vault
            .insert(
                "auth/aws/role/legacy",
                json!({"auth_type": "ec2", "bound_ami_id": "ami-0abc", "bound_region": "eu-west-1"}),
            )
            .await;
        let ctx = ProviderContext::new(Arc::new(vault));

        let state = ResourceAdapter::<AwsAuthBackendRoleResource>::new()
            .import(&ctx, "auth/aws/role/legacy")
            .await
            .unwrap();
        assert_eq!(state.attributes["bound_ami_ids"], json!(["ami-0abc"]));
        assert_eq!(state.attributes["bound_regions"], json!(["eu-west-1"]));
        assert_eq!(state.attributes["backend"], "aws");
    }

    #[tokio::test]
    async fn test_update_sends_changed_fields_only() {
        let vault = MockVault::new();
        let ctx = ProviderContext::new(Arc::new(vault.clone()));
        let adapter = ResourceAdapter::<AwsAuthBackendRoleResource>::new();

        let state = adapter
            .create(&ctx, &config(json!({"role": "web", "bound_regions": ["us-east-1"], "token_ttl": 60})))
            .await
            .unwrap();
        adapter
            .update(&ctx, &state, &config(json!({"role": "web", "bound_regions": ["us-east-1"]})))
            .await
            .unwrap();

        let update = vault.writes_to("auth/aws/role/web").await.remove(1);
        assert_eq!(Value::Object(update), json!({"auth_type": "iam", "token_ttl": 0}));
    }

    #[tokio::test]
    async fn test_unique_ids_may_not_be_enabled_in_place() {
        let ctx = ProviderContext::new(Arc::new(MockVault::new()));
        let adapter = ResourceAdapter::<AwsAuthBackendRoleResource>::new();

        let state = adapter
            .create(&ctx, &config(json!({"role": "web", "resolve_aws_unique_ids": false})))
            .await
            .unwrap();

        let plan = adapter.plan(Some(&state), &config(json!({"role": "web"}))).unwrap();
        assert_eq!(
            plan,
            Plan::Replace {
                changed: vec!["resolve_aws_unique_ids".to_string()],
                because: vec!["resolve_aws_unique_ids".to_string()],
            }
        );

        let state = adapter
            .create(&ctx, &config(json!({"role": "api"})))
            .await
            .unwrap();
        let plan = adapter
            .plan(Some(&state), &config(json!({"role": "api", "resolve_aws_unique_ids": false})))
            .unwrap();
        assert!(matches!(plan, Plan::Update { .. }));
    }
}
