//! Instance state and plan computation.

use crate::schema::{AttrType, Mode, Schema};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeSet;

/// Stored state of one resource instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstanceState {
    /// Opaque id, almost always the server-side path
    pub id: String,
    /// Attribute values
    pub attributes: Map<String, Value>,
}

impl InstanceState {
    /// Create a state from an id and attribute map.
    #[must_use]
    pub const fn new(id: String, attributes: Map<String, Value>) -> Self {
        Self { id, attributes }
    }

    /// Attribute value, `None` when absent or null.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.attributes.get(name).filter(|v| !v.is_null())
    }
}

/// Outcome of comparing configuration with prior state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Plan {
    /// No prior state: the object will be created
    Create,
    /// Configuration matches state
    NoOp,
    /// Changed attributes can be updated in place
    Update {
        /// Changed attribute names
        changed: Vec<String>,
    },
    /// The object must be destroyed and created again
    Replace {
        /// Changed attribute names
        changed: Vec<String>,
        /// Attributes forcing replacement
        because: Vec<String>,
    },
}

impl Plan {
    /// Whether applying this plan performs no remote call.
    #[must_use]
    pub const fn is_noop(&self) -> bool {
        matches!(self, Self::NoOp)
    }
}

/// Names of configurable attributes whose configured value differs from `prior`.
///
/// Computed-only and write-only attributes never differ. An omitted
/// optional+computed attribute keeps whatever the server chose. An omitted
/// optional attribute equals its type's zero value, so `0`, `""`, `false` and
/// empty collections in state do not produce changes.
#[must_use]
pub fn changed_attributes(
    schema: &Schema,
    prior: &Map<String, Value>,
    config: &Map<String, Value>,
) -> Vec<String> {
    schema
        .attributes
        .iter()
        .filter(|a| a.is_configurable() && !a.write_only)
        .filter(|a| {
            let planned = config.get(a.name).filter(|v| !v.is_null());
            if planned.is_none() && a.mode == Mode::OptionalComputed {
                return false;
            }
            let current = prior.get(a.name).filter(|v| !v.is_null());
            !values_equal(a.ty, planned, current)
        })
        .map(|a| a.name.to_string())
        .collect()
}

/// Type-aware equality with unset treated as the zero value.
#[must_use]
pub fn values_equal(ty: AttrType, a: Option<&Value>, b: Option<&Value>) -> bool {
    let zero = ty.zero();
    let a = a.unwrap_or(&zero);
    let b = b.unwrap_or(&zero);

    match ty {
        AttrType::Set => string_set(a) == string_set(b),
        AttrType::Json => parse_json(a) == parse_json(b),
        AttrType::Int => a.as_i64() == b.as_i64(),
        _ => a == b,
    }
}

fn string_set(value: &Value) -> BTreeSet<&str> {
    value
        .as_array()
        .map(|items| items.iter().filter_map(Value::as_str).collect())
        .unwrap_or_default()
}

fn parse_json(value: &Value) -> Value {
    match value.as_str() {
        Some("") => Value::Null,
        Some(s) => serde_json::from_str(s).unwrap_or_else(|_| value.clone()),
        None => value.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::Attribute;
    use serde_json::json;

    fn schema() -> Schema {
        Schema::new("test")
            .attribute(Attribute::string("name").required())
            .attribute(Attribute::set("policies"))
            .attribute(Attribute::int("ttl"))
            .attribute(Attribute::json("data_json"))
            .attribute(Attribute::string("accessor").computed())
            .attribute(Attribute::string("path").optional_computed())
            .attribute(Attribute::string("secret_wo").write_only())
    }

    fn map(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_set_order_ignored() {
        let prior = map(json!({"name": "a", "policies": ["b", "a"]}));
        let config = map(json!({"name": "a", "policies": ["a", "b"]}));
        assert!(changed_attributes(&schema(), &prior, &config).is_empty());
    }

    #[test]
    fn test_json_compared_semantically() {
        let prior = map(json!({"name": "a", "data_json": "{\"b\":2,\"a\":1}"}));
        let config = map(json!({"name": "a", "data_json": "{ \"a\": 1, \"b\": 2 }"}));
        assert!(changed_attributes(&schema(), &prior, &config).is_empty());
    }

    #[test]
    fn test_unset_equals_zero_value() {
        let prior = map(json!({"name": "a", "ttl": 0, "policies": []}));
        let config = map(json!({"name": "a"}));
        assert!(changed_attributes(&schema(), &prior, &config).is_empty());
    }

    #[test]
    fn test_computed_and_write_only_ignored() {
        let prior = map(json!({"name": "a", "accessor": "x", "path": "server-chosen"}));
        let config = map(json!({"name": "a", "secret_wo": "s3cr3t"}));
        assert!(changed_attributes(&schema(), &prior, &config).is_empty());
    }

    #[test]
    fn test_changes_reported() {
        let prior = map(json!({"name": "a", "ttl": 60, "path": "p"}));
        let config = map(json!({"name": "b", "ttl": 120, "path": "q"}));
        assert_eq!(
            changed_attributes(&schema(), &prior, &config),
            vec!["name".to_string(), "ttl".to_string(), "path".to_string()]
        );
    }

    #[test]
    fn test_instance_state_get_skips_null() {
        let state = InstanceState::new("id".to_string(), map(json!({"a": null, "b": 1})));
        assert!(state.get("a").is_none());
        assert_eq!(state.get("b"), Some(&json!(1)));
    }
}
