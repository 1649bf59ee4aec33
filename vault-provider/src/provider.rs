//! Registry of resource and data-source kinds.

use crate::data_sources::{
    AppRoleAuthBackendRoleIdDataSource, AuthBackendDataSource, GenericSecretDataSource, KvSecretV2DataSource,
};
use crate::error::{ProviderError, ProviderResult};
use crate::resource::{DataSource, DataSourceAdapter, DynamicDataSource, DynamicResource, Resource, ResourceAdapter};
use crate::resources::{
    AppRoleAuthBackendRoleResource, AuthBackendResource, AwsAuthBackendRoleResource, GenericSecretResource,
    IdentityGroupPoliciesResource, IdentityGroupResource, KvSecretV2Resource, LdapAuthBackendGroupResource,
    MountResource, PolicyResource, TransitSecretBackendKeyResource,
};
use crate::schema::{Attribute, Schema, non_negative};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

/// Every registered kind, looked up by type name.
pub struct Provider {
    resources: BTreeMap<&'static str, Box<dyn DynamicResource>>,
    data_sources: BTreeMap<&'static str, Box<dyn DynamicDataSource>>,
}

/// Serializable schema table of the provider and all its kinds.
#[derive(Debug, Clone, Serialize)]
pub struct ProviderSchema {
    /// Provider configuration block
    pub provider: Schema,
    /// Resource schemas by type name
    pub resources: BTreeMap<&'static str, Schema>,
    /// Data source schemas by type name
    pub data_sources: BTreeMap<&'static str, Schema>,
}

impl fmt::Debug for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Provider")
            .field("resources", &self.resources.keys().collect::<Vec<_>>())
            .field("data_sources", &self.data_sources.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl Default for Provider {
    fn default() -> Self {
        Self::new()
    }
}

impl Provider {
    /// Registry with every supported kind.
    #[must_use]
    pub fn new() -> Self {
        let mut provider = Self {
            resources: BTreeMap::new(),
            data_sources: BTreeMap::new(),
        };

        provider.register_resource::<MountResource>();
        provider.register_resource::<AuthBackendResource>();
        provider.register_resource::<PolicyResource>();
        provider.register_resource::<GenericSecretResource>();
        provider.register_resource::<KvSecretV2Resource>();
        provider.register_resource::<AwsAuthBackendRoleResource>();
        provider.register_resource::<AppRoleAuthBackendRoleResource>();
        provider.register_resource::<LdapAuthBackendGroupResource>();
        provider.register_resource::<IdentityGroupResource>();
        provider.register_resource::<IdentityGroupPoliciesResource>();
        provider.register_resource::<TransitSecretBackendKeyResource>();

        provider.register_data_source::<GenericSecretDataSource>();
        provider.register_data_source::<KvSecretV2DataSource>();
        provider.register_data_source::<AuthBackendDataSource>();
        provider.register_data_source::<AppRoleAuthBackendRoleIdDataSource>();

        provider
    }

    fn register_resource<R: Resource>(&mut self) {
        self.resources.insert(R::TYPE_NAME, Box::new(ResourceAdapter::<R>::new()));
    }

    fn register_data_source<D: DataSource>(&mut self) {
        self.data_sources.insert(D::TYPE_NAME, Box::new(DataSourceAdapter::<D>::new()));
    }

    /// Resource kind registered under `type_name`.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError::UnknownResource`] for unregistered names.
    pub fn resource(&self, type_name: &str) -> ProviderResult<&dyn DynamicResource> {
        self.resources
            .get(type_name)
            .map(AsRef::as_ref)
            .ok_or_else(|| ProviderError::UnknownResource(type_name.to_string()))
    }

    /// Data source kind registered under `type_name`.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError::UnknownDataSource`] for unregistered names.
    pub fn data_source(&self, type_name: &str) -> ProviderResult<&dyn DynamicDataSource> {
        self.data_sources
            .get(type_name)
            .map(AsRef::as_ref)
            .ok_or_else(|| ProviderError::UnknownDataSource(type_name.to_string()))
    }

    /// Registered resource type names, sorted.
    pub fn resource_types(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.resources.keys().copied()
    }

    /// Registered data source type names, sorted.
    pub fn data_source_types(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.data_sources.keys().copied()
    }

    /// Schema table of the provider block and every kind.
    #[must_use]
    pub fn schemas(&self) -> ProviderSchema {
        ProviderSchema {
            provider: provider_schema(),
            resources: self
                .resources
                .iter()
                .map(|(name, r)| (*name, r.schema().clone()))
                .collect(),
            data_sources: self
                .data_sources
                .iter()
                .map(|(name, d)| (*name, d.schema().clone()))
                .collect(),
        }
    }
}

/// Attribute table of the provider configuration block.
pub(crate) fn provider_schema() -> Schema {
    Schema::new("Vault provider configuration")
        .attribute(
            Attribute::string("address")
                .description("URL of the root of the target Vault server, defaults to VAULT_ADDR"),
        )
        .attribute(
            Attribute::string("token")
                .sensitive()
                .description("Token to use to authenticate to Vault, defaults to VAULT_TOKEN"),
        )
        .attribute(
            Attribute::string("namespace")
                .description("The namespace to use, defaults to VAULT_NAMESPACE"),
        )
        .attribute(
            Attribute::bool("skip_tls_verify")
                .default(false)
                .description("Skip TLS certificate verification, defaults to VAULT_SKIP_VERIFY"),
        )
        .attribute(
            Attribute::int("max_lease_ttl_seconds")
                .default(1200)
                .validate(non_negative)
                .description("Maximum TTL for secret leases requested by this provider"),
        )
        .attribute(
            Attribute::bool("skip_child_token")
                .default(false)
                .description("Use the given token directly instead of creating a limited child token"),
        )
        .attribute(
            Attribute::string("token_name")
                .default("terraform")
                .description("Display name of the child token"),
        )
}
