//! `vault_auth_backend` data source: settings of an enabled auth method.

use crate::body::ResponseData;
use crate::context::ProviderContext;
use crate::error::{Operation, ProviderError, ProviderResult, VaultResultExt};
use crate::resource::DataSource;
use crate::resources::auth_backend::{AuthBackend, auth_path, from_response};
use crate::schema::{Attribute, Schema, no_leading_trailing_slashes};
use async_trait::async_trait;

const LABEL: &str = "auth backend";

/// Data source kind.
#[derive(Debug)]
pub struct AuthBackendDataSource;

#[async_trait]
impl DataSource for AuthBackendDataSource {
    type Model = AuthBackend;
    const TYPE_NAME: &'static str = "vault_auth_backend";

    fn schema() -> Schema {
        Schema::new("Reads an enabled auth method")
            .attribute(
                Attribute::string("path")
                    .required()
                    .validate(no_leading_trailing_slashes)
                    .description("The auth backend mount point"),
            )
            .attribute(Attribute::string("type").computed())
            .attribute(Attribute::string("description").computed())
            .attribute(Attribute::bool("local").computed())
            .attribute(Attribute::int("default_lease_ttl_seconds").computed())
            .attribute(Attribute::int("max_lease_ttl_seconds").computed())
            .attribute(Attribute::string("listing_visibility").computed())
            .attribute(Attribute::string("accessor").computed())
    }

    async fn read(ctx: &ProviderContext, config: &AuthBackend) -> ProviderResult<(String, AuthBackend)> {
        let mount = config.path.clone().unwrap_or_default();
        let path = auth_path(&mount);
        let secret = ctx
            .client()
            .read(&path)
            .await
            .context(Operation::Read, LABEL, &path)?
            .ok_or_else(|| ProviderError::NotFound {
                resource: Self::TYPE_NAME,
                path: path.clone(),
            })?;
        let backend = from_response(&mount, &ResponseData::new(secret.into_data()));
        Ok((mount, backend))
    }
}
