//! Configuration fixtures for every resource kind.
//!
//! Each fixture is a configuration object that creates cleanly against
//! [`crate::MockVault`] and plans to no changes afterwards.

use serde_json::{Map, Value, json};

/// Configuration object from a JSON literal.
///
/// # Panics
///
/// Panics if `value` is not a JSON object.
#[must_use]
pub fn config(value: Value) -> Map<String, Value> {
    value.as_object().cloned().expect("fixture is a JSON object")
}

/// A resource type name with a configuration that applies cleanly.
#[derive(Debug, Clone)]
pub struct ResourceFixture {
    /// Registered type name
    pub type_name: &'static str,
    /// Configuration object
    pub config: Map<String, Value>,
    /// Attributes not reproduced by import (write-only and local-only flags)
    pub import_ignore: &'static [&'static str],
}

impl ResourceFixture {
    fn new(type_name: &'static str, config: Value) -> Self {
        Self {
            type_name,
            config: self::config(config),
            import_ignore: &[],
        }
    }

    fn ignoring(mut self, attributes: &'static [&'static str]) -> Self {
        self.import_ignore = attributes;
        self
    }
}

/// A KV version 1 style mount.
#[must_use]
pub fn mount() -> ResourceFixture {
    ResourceFixture::new(
        "vault_mount",
        json!({
            "path": "team/kv",
            "type": "kv",
            "description": "team secrets",
            "default_lease_ttl_seconds": 3600,
            "max_lease_ttl_seconds": 86400
        }),
    )
}

/// A userpass auth method at a custom path.
#[must_use]
pub fn auth_backend() -> ResourceFixture {
    ResourceFixture::new(
        "vault_auth_backend",
        json!({"type": "userpass", "path": "people", "description": "staff logins"}),
    )
}

/// An ACL policy.
#[must_use]
pub fn policy() -> ResourceFixture {
    ResourceFixture::new(
        "vault_policy",
        json!({"name": "readers", "policy": "path \"secret/*\" {\n  capabilities = [\"read\"]\n}\n"}),
    )
}

/// A generic secret.
#[must_use]
pub fn generic_secret() -> ResourceFixture {
    ResourceFixture::new(
        "vault_generic_secret",
        json!({"path": "secret/app", "data_json": "{\"user\":\"app\",\"password\":\"hunter2\"}"}),
    )
    .ignoring(&["disable_read"])
}

/// A KV v2 secret with stored data.
#[must_use]
pub fn kv_secret_v2() -> ResourceFixture {
    ResourceFixture::new(
        "vault_kv_secret_v2",
        json!({"mount": "kvv2", "name": "app/db", "data_json": "{\"password\":\"s3cr3t\"}"}),
    )
    .ignoring(&["delete_all_versions"])
}

/// An IAM role of the AWS auth method.
#[must_use]
pub fn aws_auth_backend_role() -> ResourceFixture {
    ResourceFixture::new(
        "vault_aws_auth_backend_role",
        json!({
            "role": "web",
            "bound_iam_principal_arns": ["arn:aws:iam::123456789012:role/web"],
            "token_policies": ["web"],
            "token_ttl": 600
        }),
    )
}

/// An AppRole role with a generated role id.
#[must_use]
pub fn approle_auth_backend_role() -> ResourceFixture {
    ResourceFixture::new(
        "vault_approle_auth_backend_role",
        json!({
            "role_name": "ci",
            "secret_id_bound_cidrs": ["10.0.0.0/8"],
            "token_policies": ["deploy"],
            "token_type": "service"
        }),
    )
}

/// An LDAP group mapping.
#[must_use]
pub fn ldap_auth_backend_group() -> ResourceFixture {
    ResourceFixture::new(
        "vault_ldap_auth_backend_group",
        json!({"groupname": "admins", "policies": ["admin", "ops"]}),
    )
}

/// An internal identity group.
#[must_use]
pub fn identity_group() -> ResourceFixture {
    ResourceFixture::new(
        "vault_identity_group",
        json!({"name": "engineering", "policies": ["dev"], "metadata": {"team": "platform"}}),
    )
    .ignoring(&["external_policies", "external_member_entity_ids"])
}

/// A transit key.
#[must_use]
pub fn transit_secret_backend_key() -> ResourceFixture {
    ResourceFixture::new(
        "vault_transit_secret_backend_key",
        json!({"backend": "transit", "name": "orders", "deletion_allowed": true}),
    )
}

/// Every standalone resource fixture.
#[must_use]
pub fn all_resources() -> Vec<ResourceFixture> {
    vec![
        mount(),
        auth_backend(),
        policy(),
        generic_secret(),
        kv_secret_v2(),
        aws_auth_backend_role(),
        approle_auth_backend_role(),
        ldap_auth_backend_group(),
        identity_group(),
        transit_secret_backend_key(),
    ]
}
