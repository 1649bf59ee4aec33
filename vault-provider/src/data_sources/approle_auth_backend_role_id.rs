//! `vault_approle_auth_backend_role_id` data source.

use crate::body::ResponseData;
use crate::context::ProviderContext;
use crate::error::{Operation, ProviderError, ProviderResult, VaultResultExt};
use crate::path::auth_role_path;
use crate::resource::DataSource;
use crate::resources::approle_auth_backend_role::role_id_path;
use crate::schema::{Attribute, Schema, no_leading_trailing_slashes};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

const LABEL: &str = "AppRole role id";

/// Arguments and results.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppRoleAuthBackendRoleId {
    /// Auth mount path
    pub backend: String,
    /// Role name
    pub role_name: String,
    /// Role id
    pub role_id: Option<String>,
}

/// Data source kind.
#[derive(Debug)]
pub struct AppRoleAuthBackendRoleIdDataSource;

#[async_trait]
impl DataSource for AppRoleAuthBackendRoleIdDataSource {
    type Model = AppRoleAuthBackendRoleId;
    const TYPE_NAME: &'static str = "vault_approle_auth_backend_role_id";

    fn schema() -> Schema {
        Schema::new("Reads the RoleID of an AppRole role")
            .attribute(
                Attribute::string("backend")
                    .default("approle")
                    .validate(no_leading_trailing_slashes)
                    .description("Unique name of the auth backend to configure"),
            )
            .attribute(Attribute::string("role_name").required().description("Name of the role"))
            .attribute(Attribute::string("role_id").computed().description("The RoleID of the role"))
    }

    async fn read(
        ctx: &ProviderContext,
        config: &AppRoleAuthBackendRoleId,
    ) -> ProviderResult<(String, AppRoleAuthBackendRoleId)> {
        let path = role_id_path(&auth_role_path(&config.backend, &config.role_name));
        let role_id = ctx
            .client()
            .read(&path)
            .await
            .context(Operation::Read, LABEL, &path)?
            .and_then(|s| ResponseData::new(s.into_data()).string("role_id"))
            .ok_or_else(|| ProviderError::NotFound {
                resource: Self::TYPE_NAME,
                path: path.clone(),
            })?;

        Ok((
            path,
            AppRoleAuthBackendRoleId {
                role_id: Some(role_id),
                ..config.clone()
            },
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::{DataSourceAdapter, DynamicDataSource};
    use serde_json::{Map, Value, json};
    use std::sync::Arc;
    use test_utils::MockVault;

    fn config(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[tokio::test]
    async fn test_reads_role_id() {
        let vault = MockVault::new();
        vault.insert("auth/approle/role/ci/role-id", json!({"role_id": "abc-123"})).await;
        let ctx = ProviderContext::new(Arc::new(vault));

        let state = DataSourceAdapter::<AppRoleAuthBackendRoleIdDataSource>::new()
            .read(&ctx, &config(json!({"role_name": "ci"})))
            .await
            .unwrap();

        assert_eq!(state.id, "auth/approle/role/ci/role-id");
        assert_eq!(state.attributes["backend"], "approle");
        assert_eq!(state.attributes["role_id"], "abc-123");
    }

    #[tokio::test]
    async fn test_unknown_role_is_error() {
        let ctx = ProviderContext::new(Arc::new(MockVault::new()));
        let err = DataSourceAdapter::<AppRoleAuthBackendRoleIdDataSource>::new()
            .read(&ctx, &config(json!({"backend": "team", "role_name": "x"})))
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::NotFound { .. }));
    }
}
