//! `vault_generic_secret` data source: a secret read with its lease.

use crate::context::ProviderContext;
use crate::error::{Operation, ProviderError, ProviderResult, VaultResultExt};
use crate::resource::DataSource;
use crate::resources::generic_secret::flatten;
use crate::schema::{Attribute, Schema, non_empty};
use async_trait::async_trait;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

const LABEL: &str = "generic secret";

/// Arguments and results.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenericSecretData {
    /// Logical path to read
    pub path: String,
    /// Version to read, for versioned engines
    pub version: Option<i64>,
    /// Secret data as a JSON document
    pub data_json: Option<String>,
    /// Secret data with values rendered as strings
    pub data: Option<BTreeMap<String, String>>,
    /// Lease id
    pub lease_id: Option<String>,
    /// Lease duration in seconds
    pub lease_duration: Option<i64>,
    /// Time the lease was read, RFC 3339
    pub lease_start_time: Option<String>,
    /// Whether the lease can be renewed
    pub lease_renewable: Option<bool>,
}

/// Data source kind.
#[derive(Debug)]
pub struct GenericSecretDataSource;

#[async_trait]
impl DataSource for GenericSecretDataSource {
    type Model = GenericSecretData;
    const TYPE_NAME: &'static str = "vault_generic_secret";

    fn schema() -> Schema {
        Schema::new("Reads an arbitrary secret")
            .attribute(
                Attribute::string("path")
                    .required()
                    .validate(non_empty)
                    .description("Full path from which a secret will be read"),
            )
            .attribute(Attribute::int("version").description("Version of the secret to retrieve"))
            .attribute(Attribute::json("data_json").computed().sensitive())
            .attribute(Attribute::map("data").computed().sensitive())
            .attribute(Attribute::string("lease_id").computed())
            .attribute(Attribute::int("lease_duration").computed())
            .attribute(Attribute::string("lease_start_time").computed())
            .attribute(Attribute::bool("lease_renewable").computed())
    }

    async fn read(ctx: &ProviderContext, config: &GenericSecretData) -> ProviderResult<(String, GenericSecretData)> {
        let path = config.path.as_str();
        let query: Vec<(String, String)> = config
            .version
            .map(|v| ("version".to_string(), v.to_string()))
            .into_iter()
            .collect();

        let secret = ctx
            .client()
            .read_with_query(path, &query)
            .await
            .context(Operation::Read, LABEL, path)?
            .ok_or_else(|| ProviderError::NotFound {
                resource: Self::TYPE_NAME,
                path: path.to_string(),
            })?;

        let lease = secret.lease();
        let data = secret.into_data();
        Ok((
            path.to_string(),
            GenericSecretData {
                path: path.to_string(),
                version: config.version,
                data_json: Some(serde_json::to_string(&data)?),
                data: Some(flatten(&data)),
                lease_id: Some(lease.id),
                lease_duration: Some(i64::try_from(lease.duration).unwrap_or(i64::MAX)),
                lease_start_time: Some(Utc::now().to_rfc3339()),
                lease_renewable: Some(lease.renewable),
            },
        ))
    }
}
