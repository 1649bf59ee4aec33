//! Token settings shared by every auth role.

use crate::body::{RequestBody, ResponseData};
use crate::schema::{Attribute, non_negative};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeSet;

const TOKEN_TYPES: &[&str] = &["default", "service", "batch", "default-service", "default-batch"];

fn valid_token_type(value: &Value) -> Result<(), String> {
    match value.as_str() {
        Some(t) if TOKEN_TYPES.contains(&t) => Ok(()),
        _ => Err(format!("expected one of {}, got {value}", TOKEN_TYPES.join(", "))),
    }
}

/// Token settings of an auth role.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TokenFields {
    /// Initial TTL in seconds
    pub token_ttl: Option<i64>,
    /// Maximum TTL in seconds
    pub token_max_ttl: Option<i64>,
    /// Period for periodic tokens in seconds
    pub token_period: Option<i64>,
    /// Policies attached to issued tokens
    pub token_policies: Option<BTreeSet<String>>,
    /// CIDRs tokens may be used from
    pub token_bound_cidrs: Option<BTreeSet<String>>,
    /// Hard TTL cap in seconds
    pub token_explicit_max_ttl: Option<i64>,
    /// Leave out the `default` policy
    pub token_no_default_policy: Option<bool>,
    /// Number of uses, 0 for unlimited
    pub token_num_uses: Option<i64>,
    /// Token type
    pub token_type: Option<String>,
}

/// Schema attributes of [`TokenFields`].
#[must_use]
pub fn token_attributes() -> Vec<Attribute> {
    vec![
        Attribute::int("token_ttl")
            .validate(non_negative)
            .description("The initial ttl of the token to generate in seconds"),
        Attribute::int("token_max_ttl")
            .validate(non_negative)
            .description("The maximum lifetime of the generated token"),
        Attribute::int("token_period")
            .validate(non_negative)
            .description("Generated tokens are periodic with this period in seconds"),
        Attribute::set("token_policies")
            .description("Generated tokens will have these policies attached"),
        Attribute::set("token_bound_cidrs")
            .description("CIDR blocks tokens may be used from"),
        Attribute::int("token_explicit_max_ttl")
            .validate(non_negative)
            .description("Hard cap on the lifetime of generated tokens"),
        Attribute::bool("token_no_default_policy")
            .description("Do not add the default policy to generated tokens"),
        Attribute::int("token_num_uses")
            .validate(non_negative)
            .description("Number of times a generated token may be used"),
        Attribute::string("token_type")
            .default("default")
            .validate(valid_token_type)
            .description("The type of token to generate"),
    ]
}

impl TokenFields {
    /// Add the set fields to a request body.
    pub fn write_to(&self, body: &mut RequestBody) {
        body.insert_opt("token_ttl", self.token_ttl.as_ref())
            .insert_opt("token_max_ttl", self.token_max_ttl.as_ref())
            .insert_opt("token_period", self.token_period.as_ref())
            .insert_strings("token_policies", self.token_policies.as_ref())
            .insert_strings("token_bound_cidrs", self.token_bound_cidrs.as_ref())
            .insert_opt("token_explicit_max_ttl", self.token_explicit_max_ttl.as_ref())
            .insert_opt("token_no_default_policy", self.token_no_default_policy.as_ref())
            .insert_opt("token_num_uses", self.token_num_uses.as_ref())
            .insert_non_empty("token_type", self.token_type.as_ref());
    }

    /// Read the fields from a role response.
    #[must_use]
    pub fn from_response(data: &ResponseData) -> Self {
        Self {
            token_ttl: data.int("token_ttl"),
            token_max_ttl: data.int("token_max_ttl"),
            token_period: data.int("token_period"),
            token_policies: data.string_set("token_policies"),
            token_bound_cidrs: data.string_set("token_bound_cidrs"),
            token_explicit_max_ttl: data.int("token_explicit_max_ttl"),
            token_no_default_policy: data.bool("token_no_default_policy"),
            token_num_uses: data.int("token_num_uses"),
            token_type: data.string("token_type"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_write_only_set_fields() {
        let fields = TokenFields {
            token_ttl: Some(300),
            token_policies: Some(["dev".to_string()].into_iter().collect()),
            ..TokenFields::default()
        };
        let mut body = RequestBody::new();
        fields.write_to(&mut body);
        assert_eq!(
            Value::Object(body.into_map()),
            json!({"token_ttl": 300, "token_policies": ["dev"]})
        );
    }

    #[test]
    fn test_from_response_accepts_comma_cidrs() {
        let data = ResponseData::new(
            json!({"token_bound_cidrs": "10.0.0.0/8,192.168.0.0/16", "token_type": "service"})
                .as_object()
                .cloned()
                .unwrap(),
        );
        let fields = TokenFields::from_response(&data);
        assert_eq!(fields.token_bound_cidrs.unwrap().len(), 2);
        assert_eq!(fields.token_type.as_deref(), Some("service"));
    }

    #[test]
    fn test_token_type_validated() {
        assert!(valid_token_type(&json!("batch")).is_ok());
        assert!(valid_token_type(&json!("weird")).is_err());
    }
}
