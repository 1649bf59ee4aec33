//! `vault_kv_secret_v2` data source: one version of a KV v2 secret.

use crate::body::ResponseData;
use crate::context::ProviderContext;
use crate::error::{Operation, ProviderError, ProviderResult, VaultResultExt};
use crate::path::join;
use crate::resource::DataSource;
use crate::resources::generic_secret::flatten;
use crate::schema::{Attribute, Schema, no_leading_trailing_slashes, non_negative};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

const LABEL: &str = "KV secret";

/// Arguments and results.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct KvSecretV2Data {
    /// Mount path of the KV engine
    pub mount: String,
    /// Secret name below the mount
    pub name: String,
    /// Version to read; latest when unset
    pub version: Option<i64>,
    /// Full data path
    pub path: Option<String>,
    /// Secret data as a JSON document
    pub data_json: Option<String>,
    /// Secret data with values rendered as strings
    pub data: Option<BTreeMap<String, String>>,
    /// Creation time of the version
    pub created_time: Option<String>,
    /// Deletion time of the version, empty when live
    pub deletion_time: Option<String>,
    /// Whether the version was destroyed
    pub destroyed: Option<bool>,
    /// Custom metadata of the secret
    pub custom_metadata: Option<BTreeMap<String, String>>,
}

/// Data source kind.
#[derive(Debug)]
pub struct KvSecretV2DataSource;

#[async_trait]
impl DataSource for KvSecretV2DataSource {
    type Model = KvSecretV2Data;
    const TYPE_NAME: &'static str = "vault_kv_secret_v2";

    fn schema() -> Schema {
        Schema::new("Reads a secret from a KV version 2 mount")
            .attribute(
                Attribute::string("mount")
                    .required()
                    .validate(no_leading_trailing_slashes)
                    .description("Path where the KV-V2 engine is mounted"),
            )
            .attribute(
                Attribute::string("name")
                    .required()
                    .validate(no_leading_trailing_slashes)
                    .description("Full name of the secret"),
            )
            .attribute(
                Attribute::int("version")
                    .validate(non_negative)
                    .description("Version of the secret to retrieve"),
            )
            .attribute(Attribute::string("path").computed())
            .attribute(Attribute::json("data_json").computed().sensitive())
            .attribute(Attribute::map("data").computed().sensitive())
            .attribute(Attribute::string("created_time").computed())
            .attribute(Attribute::string("deletion_time").computed())
            .attribute(Attribute::bool("destroyed").computed())
            .attribute(Attribute::map("custom_metadata").computed())
    }

    async fn read(ctx: &ProviderContext, config: &KvSecretV2Data) -> ProviderResult<(String, KvSecretV2Data)> {
        let path = join(&[&config.mount, "data", &config.name]);
        let query: Vec<(String, String)> = config
            .version
            .map(|v| ("version".to_string(), v.to_string()))
            .into_iter()
            .collect();

        let not_found = || ProviderError::NotFound {
            resource: Self::TYPE_NAME,
            path: path.clone(),
        };
        let secret = ctx
            .client()
            .read_with_query(&path, &query)
            .await
            .context(Operation::Read, LABEL, &path)?
            .ok_or_else(not_found)?;

        let response = ResponseData::new(secret.into_data());
        let data = response.raw("data").and_then(|d| d.as_object()).cloned().ok_or_else(not_found)?;
        let metadata = response.object("metadata").unwrap_or_default();

        Ok((
            path.clone(),
            KvSecretV2Data {
                mount: config.mount.clone(),
                name: config.name.clone(),
                version: config.version,
                path: Some(path.clone()),
                data_json: Some(serde_json::to_string(&data)?),
                data: Some(flatten(&data)),
                created_time: metadata.string("created_time"),
                deletion_time: metadata.string("deletion_time"),
                destroyed: metadata.bool("destroyed"),
                custom_metadata: metadata.string_map("custom_metadata"),
            },
        ))
    }
}
