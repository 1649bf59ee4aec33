//! Logical path composition and id decomposition.
//!
//! Instance ids are the paths objects live at, so every adapter can recover
//! its path fields from the id alone.

use crate::error::{ProviderError, ProviderResult};
use regex::Regex;
use std::sync::LazyLock;

/// Join path segments with `/`, trimming slashes around each segment.
#[must_use]
pub fn join(segments: &[&str]) -> String {
    segments
        .iter()
        .map(|s| s.trim_matches('/'))
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("/")
}

/// `auth/<backend>/role/<role>`
#[must_use]
pub fn auth_role_path(backend: &str, role: &str) -> String {
    join(&["auth", backend, "role", role])
}

/// `auth/<backend>/groups/<group>`
#[must_use]
pub fn auth_group_path(backend: &str, group: &str) -> String {
    join(&["auth", backend, "groups", group])
}

/// `identity/group/name/<name>`
#[must_use]
pub fn identity_group_path(name: &str) -> String {
    join(&["identity/group/name", name])
}

/// Group name of an `identity/group/name/<name>` id.
///
/// # Errors
///
/// Returns [`ProviderError::InvalidId`] for ids of another shape.
pub fn identity_group_name(resource: &'static str, id: &str) -> ProviderResult<String> {
    match id.strip_prefix("identity/group/name/") {
        Some(name) if !name.is_empty() => Ok(name.to_string()),
        _ => Err(ProviderError::InvalidId {
            resource,
            id: id.to_string(),
            expected: "identity/group/name/<name>",
        }),
    }
}

/// A single-capture regex that extracts one path field from an id.
#[derive(Debug)]
pub struct IdPattern {
    regex: Regex,
    expected: &'static str,
}

impl IdPattern {
    /// Compile a pattern with exactly one capture group.
    ///
    /// # Panics
    ///
    /// Panics if `pattern` is not a valid regex; patterns are compile-time constants.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn new(pattern: &str, expected: &'static str) -> Self {
        Self {
            regex: Regex::new(pattern).expect("id pattern is a valid regex"),
            expected,
        }
    }

    /// Extract the captured field.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError::InvalidId`] when the id does not match.
    pub fn capture(&self, resource: &'static str, id: &str) -> ProviderResult<String> {
        self.regex
            .captures(id)
            .and_then(|c| c.get(1))
            .map(|m| m.as_str().to_string())
            .ok_or_else(|| ProviderError::InvalidId {
                resource,
                id: id.to_string(),
                expected: self.expected,
            })
    }
}

static AUTH_ROLE_BACKEND: LazyLock<IdPattern> =
    LazyLock::new(|| IdPattern::new(r"^auth/(.+)/role/.+$", "auth/<backend>/role/<name>"));
static AUTH_ROLE_NAME: LazyLock<IdPattern> =
    LazyLock::new(|| IdPattern::new(r"^auth/.+/role/(.+)$", "auth/<backend>/role/<name>"));
static AUTH_GROUP_BACKEND: LazyLock<IdPattern> =
    LazyLock::new(|| IdPattern::new(r"^auth/(.+)/groups/.+$", "auth/<backend>/groups/<name>"));
static AUTH_GROUP_NAME: LazyLock<IdPattern> =
    LazyLock::new(|| IdPattern::new(r"^auth/.+/groups/(.+)$", "auth/<backend>/groups/<name>"));
static KV2_MOUNT: LazyLock<IdPattern> =
    LazyLock::new(|| IdPattern::new(r"^(.+)/data/.+$", "<mount>/data/<name>"));
static KV2_NAME: LazyLock<IdPattern> =
    LazyLock::new(|| IdPattern::new(r"^.+/data/(.+)$", "<mount>/data/<name>"));
static TRANSIT_BACKEND: LazyLock<IdPattern> =
    LazyLock::new(|| IdPattern::new(r"^(.+)/keys/.+$", "<backend>/keys/<name>"));
static TRANSIT_NAME: LazyLock<IdPattern> =
    LazyLock::new(|| IdPattern::new(r"^.+/keys/(.+)$", "<backend>/keys/<name>"));

/// Backend and role name of an `auth/<backend>/role/<name>` id.
///
/// # Errors
///
/// Returns [`ProviderError::InvalidId`] for ids of another shape.
pub fn split_auth_role(resource: &'static str, id: &str) -> ProviderResult<(String, String)> {
    Ok((
        AUTH_ROLE_BACKEND.capture(resource, id)?,
        AUTH_ROLE_NAME.capture(resource, id)?,
    ))
}

/// Backend and group name of an `auth/<backend>/groups/<name>` id.
///
/// # Errors
///
/// Returns [`ProviderError::InvalidId`] for ids of another shape.
pub fn split_auth_group(resource: &'static str, id: &str) -> ProviderResult<(String, String)> {
    Ok((
        AUTH_GROUP_BACKEND.capture(resource, id)?,
        AUTH_GROUP_NAME.capture(resource, id)?,
    ))
}

/// Mount and secret name of a `<mount>/data/<name>` id.
///
/// # Errors
///
/// Returns [`ProviderError::InvalidId`] for ids of another shape.
pub fn split_kv2(resource: &'static str, id: &str) -> ProviderResult<(String, String)> {
    Ok((KV2_MOUNT.capture(resource, id)?, KV2_NAME.capture(resource, id)?))
}

/// Backend and key name of a `<backend>/keys/<name>` id.
///
/// # Errors
///
/// Returns [`ProviderError::InvalidId`] for ids of another shape.
pub fn split_transit_key(resource: &'static str, id: &str) -> ProviderResult<(String, String)> {
    Ok((
        TRANSIT_BACKEND.capture(resource, id)?,
        TRANSIT_NAME.capture(resource, id)?,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_join_trims_slashes() {
        assert_eq!(join(&["/auth/", "aws/", "role", "web"]), "auth/aws/role/web");
        assert_eq!(join(&["kv", "", "data"]), "kv/data");
    }

    #[test]
    fn test_split_auth_role() {
        let (backend, role) = split_auth_role("r", "auth/team/approle/role/ci").unwrap();
        assert_eq!(backend, "team/approle");
        assert_eq!(role, "ci");
    }

    #[test]
    fn test_split_rejects_other_shapes() {
        let err = split_auth_role("vault_approle_auth_backend_role", "sys/policy/x").unwrap_err();
        assert!(matches!(err, ProviderError::InvalidId { .. }));
        assert!(split_kv2("kv", "kv/metadata/app").is_err());
    }

    #[test]
    fn test_split_kv2_nested_name() {
        let (mount, name) = split_kv2("kv", "secret/data/team/app").unwrap();
        assert_eq!(mount, "secret");
        assert_eq!(name, "team/app");
    }

    #[test]
    fn test_identity_group_name() {
        assert_eq!(identity_group_name("g", &identity_group_path("ops")).unwrap(), "ops");
        assert!(identity_group_name("g", "identity/group/id/123").is_err());
        assert!(identity_group_name("g", "identity/group/name/").is_err());
    }

    fn segment() -> impl Strategy<Value = String> {
        "[a-z][a-z0-9_-]{0,12}"
    }

    proptest! {
        #[test]
        fn prop_auth_role_round_trip(
            backend in prop::collection::vec(segment(), 1..3),
            role in segment(),
        ) {
            let backend = backend.join("/");
            let id = auth_role_path(&backend, &role);
            let (b, r) = split_auth_role("r", &id).unwrap();
            prop_assert_eq!(b, backend);
            prop_assert_eq!(r, role);
        }

        #[test]
        fn prop_auth_group_round_trip(backend in segment(), group in segment()) {
            let id = auth_group_path(&backend, &group);
            prop_assert_eq!(split_auth_group("g", &id).unwrap(), (backend, group));
        }
    }
}
