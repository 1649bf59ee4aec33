//! `vault_kv_secret_v2`: a versioned secret in a KV version 2 mount.
//!
//! The secret data can be given either as `data_json`, which is stored and
//! compared against the server, or as the write-only `data_json_wo`, which is
//! sent but never stored. Bumping `data_json_wo_version` is what tells the
//! plan that a write-only value needs to be sent again.

use crate::body::{RequestBody, ResponseData};
use crate::context::ProviderContext;
use crate::error::{Operation, ProviderResult, VaultResultExt};
use crate::path::{join, split_kv2};
use crate::resource::{Resource, delete_path};
use crate::resources::generic_secret::{flatten, parse_object};
use crate::schema::{Attribute, Schema, no_leading_trailing_slashes, non_negative};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

const LABEL: &str = "KV secret";

/// Secret configuration and state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct KvSecretV2 {
    /// Mount path of the KV engine
    pub mount: String,
    /// Secret name below the mount
    pub name: String,
    /// Full data path
    pub path: Option<String>,
    /// Check-and-set version
    pub cas: Option<i64>,
    /// Write options
    pub options: Option<BTreeMap<String, String>>,
    /// Secret data as a JSON object
    pub data_json: Option<String>,
    /// Secret data as a JSON object, never stored
    #[serde(skip_serializing)]
    pub data_json_wo: Option<String>,
    /// Incremented to send `data_json_wo` again
    pub data_json_wo_version: Option<i64>,
    /// Delete every version and the metadata on destroy
    pub delete_all_versions: Option<bool>,
    /// Secret data with values rendered as strings
    pub data: Option<BTreeMap<String, String>>,
    /// Version metadata of the latest write
    pub metadata: Option<BTreeMap<String, String>>,
}

impl KvSecretV2 {
    fn write_only(&self) -> bool {
        self.data_json_wo_version.is_some() || self.data_json_wo.is_some()
    }
}

/// Resource kind.
#[derive(Debug)]
pub struct KvSecretV2Resource;

fn data_path(mount: &str, name: &str) -> String {
    join(&[mount, "data", name])
}

fn metadata_path(mount: &str, name: &str) -> String {
    join(&[mount, "metadata", name])
}

async fn write_secret(ctx: &ProviderContext, op: Operation, model: &KvSecretV2) -> ProviderResult<String> {
    let path = data_path(&model.mount, &model.name);
    let (attribute, json) = match (&model.data_json, &model.data_json_wo) {
        (_, Some(wo)) => ("data_json_wo", wo.as_str()),
        (Some(json), None) => ("data_json", json.as_str()),
        (None, None) => ("data_json", "{}"),
    };
    let data = parse_object(attribute, json)?;

    let mut options: BTreeMap<String, Value> = model
        .options
        .iter()
        .flatten()
        .map(|(k, v)| (k.clone(), Value::String(v.clone())))
        .collect();
    if let Some(cas) = model.cas {
        options.insert("cas".to_string(), Value::from(cas));
    }

    let mut body = RequestBody::new();
    body.insert("data", Value::Object(data));
    if !options.is_empty() {
        body.insert("options", Value::Object(options.into_iter().collect()));
    }
    ctx.client()
        .write(&path, body.into_map())
        .await
        .context(op, LABEL, &path)?;
    Ok(path)
}

#[async_trait]
impl Resource for KvSecretV2Resource {
    type Model = KvSecretV2;
    const TYPE_NAME: &'static str = "vault_kv_secret_v2";

    fn schema() -> Schema {
        Schema::new("Writes a versioned secret to a KV version 2 mount")
            .attribute(
                Attribute::string("mount")
                    .required()
                    .force_new()
                    .validate(no_leading_trailing_slashes)
                    .description("Path where the KV-V2 engine is mounted"),
            )
            .attribute(
                Attribute::string("name")
                    .required()
                    .force_new()
                    .validate(no_leading_trailing_slashes)
                    .description("Full name of the secret"),
            )
            .attribute(Attribute::string("path").computed().description("Full path where the secret will be written"))
            .attribute(
                Attribute::int("cas")
                    .validate(non_negative)
                    .description("Perform a check-and-set write against this version"),
            )
            .attribute(Attribute::map("options").description("Options of the write"))
            .attribute(
                Attribute::json("data_json")
                    .sensitive()
                    .conflicts_with(&["data_json_wo"])
                    .description("JSON-encoded secret data to write"),
            )
            .attribute(
                Attribute::json("data_json_wo")
                    .write_only()
                    .conflicts_with(&["data_json"])
                    .description("Write-only JSON-encoded secret data"),
            )
            .attribute(
                Attribute::int("data_json_wo_version")
                    .validate(non_negative)
                    .description("Version counter for data_json_wo; change it to write the data again"),
            )
            .attribute(
                Attribute::bool("delete_all_versions")
                    .default(false)
                    .description("Delete all versions and metadata of the secret on destroy"),
            )
            .attribute(Attribute::map("data").computed().sensitive())
            .attribute(Attribute::map("metadata").computed().description("Metadata of the latest version"))
    }

    async fn create(ctx: &ProviderContext, planned: &KvSecretV2) -> ProviderResult<String> {
        write_secret(ctx, Operation::Create, planned).await
    }

    async fn read(ctx: &ProviderContext, id: &str, prior: Option<&KvSecretV2>) -> ProviderResult<Option<KvSecretV2>> {
        let (mount, name) = split_kv2(Self::TYPE_NAME, id)?;
        let Some(secret) = ctx.client().read(id).await.context(Operation::Read, LABEL, id)? else {
            return Ok(None);
        };
        let response = ResponseData::new(secret.into_data());
        let data = response.object("data").unwrap_or_default();
        let write_only = prior.is_some_and(KvSecretV2::write_only);

        Ok(Some(KvSecretV2 {
            path: Some(id.to_string()),
            data_json: if write_only {
                None
            } else {
                Some(serde_json::to_string(data.as_map())?)
            },
            data_json_wo: None,
            data: (!write_only).then(|| flatten(data.as_map())),
            metadata: response.string_map("metadata"),
            cas: prior.and_then(|p| p.cas),
            options: prior.and_then(|p| p.options.clone()),
            data_json_wo_version: prior.and_then(|p| p.data_json_wo_version),
            delete_all_versions: prior.and_then(|p| p.delete_all_versions),
            mount,
            name,
        }))
    }

    async fn update(ctx: &ProviderContext, _id: &str, _prior: &KvSecretV2, planned: &KvSecretV2) -> ProviderResult<()> {
        write_secret(ctx, Operation::Update, planned).await.map(drop)
    }

    async fn delete(ctx: &ProviderContext, id: &str, prior: &KvSecretV2) -> ProviderResult<()> {
        let (mount, name) = split_kv2(Self::TYPE_NAME, id)?;
        let path = if prior.delete_all_versions.unwrap_or(false) {
            metadata_path(&mount, &name)
        } else {
            data_path(&mount, &name)
        };
        delete_path(ctx, LABEL, &path).await
    }
}
