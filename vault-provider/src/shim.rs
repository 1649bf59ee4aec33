//! Migrations from legacy response shapes.
//!
//! Older servers return some multi-valued fields under a singular key
//! (`bound_ami_id`) holding one string, where newer ones return a list under
//! the plural key (`bound_ami_ids`). Each shape is decoded once into
//! [`LegacyList`] and converted to the plural form; the plural key wins when
//! both are present.

use crate::body::{ResponseData, split_commas};
use std::collections::BTreeSet;

/// A multi-valued field as the server returned it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LegacyList {
    /// Returned under the plural key
    Plural(BTreeSet<String>),
    /// Returned under the singular key
    Singular(String),
    /// Not returned at all
    Absent,
}

impl LegacyList {
    /// Decode the field from a response, preferring the plural key.
    #[must_use]
    pub fn from_response(data: &ResponseData, plural: &str, singular: &str) -> Self {
        if let Some(values) = data.string_set(plural) {
            return Self::Plural(values);
        }
        match data.string(singular) {
            Some(value) => Self::Singular(value),
            None => Self::Absent,
        }
    }

    /// Plural form; a singular value becomes a one-element set (or several
    /// when the server comma-joined them).
    #[must_use]
    pub fn into_set(self) -> Option<BTreeSet<String>> {
        match self {
            Self::Plural(values) => Some(values),
            Self::Singular(value) => Some(split_commas(&value)),
            Self::Absent => None,
        }
    }
}

/// Policy document text; older servers return it as `rules`.
#[must_use]
pub fn policy_text(data: &ResponseData) -> Option<String> {
    data.string("policy").or_else(|| data.string("rules"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{Value, json};

    fn data(value: Value) -> ResponseData {
        ResponseData::new(value.as_object().cloned().unwrap())
    }

    #[test]
    fn test_plural_preferred() {
        let d = data(json!({"bound_ami_ids": ["ami-2"], "bound_ami_id": "ami-1"}));
        let list = LegacyList::from_response(&d, "bound_ami_ids", "bound_ami_id");
        assert_eq!(list.into_set().unwrap().into_iter().collect::<Vec<_>>(), vec!["ami-2"]);
    }

    #[test]
    fn test_singular_promoted() {
        let d = data(json!({"bound_ami_id": "ami-1"}));
        let list = LegacyList::from_response(&d, "bound_ami_ids", "bound_ami_id");
        assert_eq!(list, LegacyList::Singular("ami-1".to_string()));
        assert_eq!(list.into_set().unwrap().into_iter().collect::<Vec<_>>(), vec!["ami-1"]);
    }

    #[test]
    fn test_absent() {
        let list = LegacyList::from_response(&data(json!({})), "bound_vpc_ids", "bound_vpc_id");
        assert_eq!(list.into_set(), None);
    }

    #[test]
    fn test_policy_rules_fallback() {
        assert_eq!(policy_text(&data(json!({"rules": "path \"*\" {}"}))).as_deref(), Some("path \"*\" {}"));
        assert_eq!(
            policy_text(&data(json!({"policy": "new", "rules": "old"}))).as_deref(),
            Some("new")
        );
    }
}
