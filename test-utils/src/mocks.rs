//! In-memory logical store for adapter tests.
//!
//! [`MockVault`] implements [`Logical`] over a path → object map. Writes go
//! through an ordered list of [`WriteRule`]s that mimic how the real server
//! stores data behind some endpoints (tune and config sub-paths land on the
//! parent object, role endpoints merge instead of replace). Objects created
//! at matching paths get generated computed fields such as `accessor`.

use async_trait::async_trait;
use chrono::Utc;
use regex::{Captures, Regex};
use serde_json::{Map, Value, json};
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;
use vault_client::{Logical, Secret, VaultError, VaultResult};

/// A JSON object stored at one path.
pub type Object = Map<String, Value>;

/// Target path of a write, derived from the matched request path.
pub type TargetFn = fn(&Captures<'_>) -> String;

/// New stored object from the existing one (if any) and the request body.
pub type TransformFn = fn(&Captures<'_>, Option<&Object>, Object) -> Object;

/// Kind of a recorded request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestKind {
    /// GET
    Read,
    /// PUT/POST
    Write,
    /// DELETE
    Delete,
    /// LIST
    List,
}

/// A request as the mock received it.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedRequest {
    /// Request kind
    pub kind: RequestKind,
    /// Logical path as requested
    pub path: String,
    /// Body of writes
    pub body: Option<Object>,
    /// Query parameters of reads
    pub query: Vec<(String, String)>,
}

/// How writes to matching paths are stored.
#[derive(Debug, Clone)]
pub struct WriteRule {
    pattern: Regex,
    target: TargetFn,
    transform: TransformFn,
}

impl WriteRule {
    /// Create a rule.
    ///
    /// # Panics
    ///
    /// Panics if `pattern` is not a valid regex.
    #[must_use]
    pub fn new(pattern: &str, target: TargetFn, transform: TransformFn) -> Self {
        Self {
            pattern: Regex::new(pattern).expect("valid write rule pattern"),
            target,
            transform,
        }
    }
}

#[derive(Debug, Clone)]
struct ComputedField {
    pattern: Regex,
    field: &'static str,
    generate: fn() -> Value,
}

#[derive(Debug, Clone)]
struct Companion {
    pattern: Regex,
    path: TargetFn,
    generate: fn() -> Object,
}

#[derive(Debug, Clone)]
struct Failure {
    prefix: String,
    status: u16,
    message: String,
}

/// Same path.
#[must_use]
pub fn same_path(captures: &Captures<'_>) -> String {
    captures[0].to_string()
}

/// Path of the first capture group.
#[must_use]
pub fn first_group(captures: &Captures<'_>) -> String {
    captures[1].to_string()
}

/// Replace the stored object.
#[must_use]
pub fn replace(_: &Captures<'_>, _: Option<&Object>, incoming: Object) -> Object {
    incoming
}

/// Merge top-level fields into the stored object.
#[must_use]
pub fn merge(_: &Captures<'_>, existing: Option<&Object>, incoming: Object) -> Object {
    let mut object = existing.cloned().unwrap_or_default();
    object.extend(incoming);
    object
}

const TUNE_CONFIG_KEYS: &[&str] = &[
    "default_lease_ttl",
    "max_lease_ttl",
    "listing_visibility",
    "audit_non_hmac_request_keys",
    "audit_non_hmac_response_keys",
    "passthrough_request_headers",
    "allowed_response_headers",
    "token_type",
];

/// Merge a tune request: lease and visibility settings land in `config`.
#[must_use]
pub fn merge_tune(_: &Captures<'_>, existing: Option<&Object>, incoming: Object) -> Object {
    let mut object = existing.cloned().unwrap_or_default();
    let mut config = object
        .get("config")
        .and_then(Value::as_object)
        .cloned()
        .unwrap_or_default();
    for (key, value) in incoming {
        if TUNE_CONFIG_KEYS.contains(&key.as_str()) {
            config.insert(key, value);
        } else {
            object.insert(key, value);
        }
    }
    object.insert("config".to_string(), Value::Object(config));
    object
}

/// Store a policy the way the server returns it (`name` and `rules`).
#[must_use]
pub fn store_policy(captures: &Captures<'_>, _: Option<&Object>, incoming: Object) -> Object {
    let mut object = Object::new();
    object.insert("name".to_string(), Value::String(captures[1].to_string()));
    if let Some(policy) = incoming.get("policy") {
        object.insert("rules".to_string(), policy.clone());
    }
    object
}

/// Store a KV v2 write: `data` is replaced, `options` are not returned.
#[must_use]
pub fn store_kv2(_: &Captures<'_>, existing: Option<&Object>, incoming: Object) -> Object {
    let version = existing
        .and_then(|o| o.get("metadata"))
        .and_then(|m| m.get("version"))
        .and_then(Value::as_i64)
        .unwrap_or(0)
        + 1;
    let mut object = Object::new();
    object.insert("data".to_string(), incoming.get("data").cloned().unwrap_or(json!({})));
    object.insert(
        "metadata".to_string(),
        json!({
            "created_time": Utc::now().to_rfc3339(),
            "custom_metadata": null,
            "deletion_time": "",
            "destroyed": false,
            "version": version,
        }),
    );
    object
}

fn accessor() -> Value {
    Value::String(format!("mock_{}", &Uuid::new_v4().simple().to_string()[..8]))
}

fn first_version() -> Value {
    json!(1)
}

fn uuid() -> Value {
    Value::String(Uuid::new_v4().to_string())
}

fn role_id_path(captures: &Captures<'_>) -> String {
    format!("{}/role-id", &captures[1])
}

fn kv2_data_path(captures: &Captures<'_>) -> String {
    format!("{}/data/{}", &captures[1], &captures[2])
}

fn role_id() -> Object {
    let mut object = Object::new();
    object.insert("role_id".to_string(), uuid());
    object
}

#[derive(Debug, Default)]
struct Store {
    objects: BTreeMap<String, Object>,
    requests: Vec<RecordedRequest>,
}

/// In-memory implementation of [`Logical`].
#[derive(Debug, Clone)]
pub struct MockVault {
    store: Arc<RwLock<Store>>,
    rules: Vec<WriteRule>,
    computed: Vec<ComputedField>,
    companions: Vec<Companion>,
    delete_aliases: Vec<(Regex, TargetFn)>,
    failures: Vec<Failure>,
}

impl Default for MockVault {
    fn default() -> Self {
        Self::new()
    }
}

impl MockVault {
    /// Create a store that mimics the server's endpoint behaviour.
    ///
    /// # Panics
    ///
    /// Never in practice; the built-in patterns are constants.
    #[must_use]
    pub fn new() -> Self {
        let re = |p: &str| Regex::new(p).expect("valid built-in pattern");
        Self {
            store: Arc::default(),
            rules: vec![
                WriteRule::new(r"^(sys/(?:mounts|auth)/.+)/tune$", first_group, merge_tune),
                WriteRule::new(r"^(.+/keys/[^/]+)/config$", first_group, merge),
                WriteRule::new(r"^sys/policy/(.+)$", same_path, store_policy),
                WriteRule::new(r"^[^/]+/data/.+$", same_path, store_kv2),
                WriteRule::new(r"^(?:auth|identity)/.+$", same_path, merge),
            ],
            computed: vec![
                ComputedField {
                    pattern: re(r"^sys/(?:mounts|auth)/.+$"),
                    field: "accessor",
                    generate: accessor,
                },
                ComputedField {
                    pattern: re(r"^identity/group/name/.+$"),
                    field: "id",
                    generate: uuid,
                },
                ComputedField {
                    pattern: re(r"^.+/keys/[^/]+$"),
                    field: "latest_version",
                    generate: first_version,
                },
            ],
            companions: vec![Companion {
                pattern: re(r"^(auth/(?:.+/)?approle/role/[^/]+)$"),
                path: role_id_path,
                generate: role_id,
            }],
            delete_aliases: vec![(re(r"^([^/]+)/metadata/(.+)$"), kv2_data_path as TargetFn)],
            failures: Vec::new(),
        }
    }

    /// Add a write rule that takes precedence over the built-in ones.
    #[must_use]
    pub fn with_write_rule(mut self, rule: WriteRule) -> Self {
        self.rules.insert(0, rule);
        self
    }

    /// Fail every request under `prefix` with an API error.
    #[must_use]
    pub fn with_failure(mut self, prefix: &str, status: u16, message: &str) -> Self {
        self.failures.push(Failure {
            prefix: prefix.to_string(),
            status,
            message: message.to_string(),
        });
        self
    }

    /// Store an object directly, bypassing write rules.
    pub async fn insert(&self, path: &str, object: Value) {
        let object = object.as_object().cloned().unwrap_or_default();
        self.store.write().await.objects.insert(path.to_string(), object);
    }

    /// Stored object at `path`.
    pub async fn get(&self, path: &str) -> Option<Object> {
        self.store.read().await.objects.get(path).cloned()
    }

    /// Remove an object directly, as if deleted out of band.
    pub async fn remove(&self, path: &str) -> Option<Object> {
        self.store.write().await.objects.remove(path)
    }

    /// All requests received so far.
    pub async fn requests(&self) -> Vec<RecordedRequest> {
        self.store.read().await.requests.clone()
    }

    /// Bodies of the writes sent to `path`.
    pub async fn writes_to(&self, path: &str) -> Vec<Object> {
        self.store
            .read()
            .await
            .requests
            .iter()
            .filter(|r| r.kind == RequestKind::Write && r.path == path)
            .filter_map(|r| r.body.clone())
            .collect()
    }

    /// Forget the request log.
    pub async fn clear_requests(&self) {
        self.store.write().await.requests.clear();
    }

    fn check_failure(&self, path: &str) -> VaultResult<()> {
        match self.failures.iter().find(|f| path.starts_with(&f.prefix)) {
            Some(f) => Err(VaultError::Api {
                status: f.status,
                errors: vec![f.message.clone()],
            }),
            None => Ok(()),
        }
    }

    async fn record(&self, kind: RequestKind, path: &str, body: Option<Object>, query: &[(String, String)]) {
        self.store.write().await.requests.push(RecordedRequest {
            kind,
            path: path.to_string(),
            body,
            query: query.to_vec(),
        });
    }

    fn apply_rule(&self, path: &str, existing: &BTreeMap<String, Object>, body: Object) -> (String, Object) {
        for rule in &self.rules {
            if let Some(captures) = rule.pattern.captures(path) {
                let target = (rule.target)(&captures);
                let object = (rule.transform)(&captures, existing.get(&target), body);
                return (target, object);
            }
        }
        (path.to_string(), body)
    }
}

fn normalize(path: &str) -> &str {
    path.trim_matches('/')
}

#[async_trait]
impl Logical for MockVault {
    async fn read(&self, path: &str) -> VaultResult<Option<Secret>> {
        self.read_with_query(path, &[]).await
    }

    async fn read_with_query(&self, path: &str, query: &[(String, String)]) -> VaultResult<Option<Secret>> {
        let path = normalize(path);
        self.record(RequestKind::Read, path, None, query).await;
        self.check_failure(path)?;
        Ok(self.get(path).await.map(Secret::from_data))
    }

    async fn write(&self, path: &str, data: Map<String, Value>) -> VaultResult<Option<Secret>> {
        let path = normalize(path);
        self.record(RequestKind::Write, path, Some(data.clone()), &[]).await;
        self.check_failure(path)?;

        let mut store = self.store.write().await;
        let (target, mut object) = self.apply_rule(path, &store.objects, data);
        let created = !store.objects.contains_key(&target);

        if created {
            for field in self.computed.iter().filter(|c| c.pattern.is_match(&target)) {
                object.entry(field.field).or_insert_with(field.generate);
            }
            for companion in &self.companions {
                if let Some(captures) = companion.pattern.captures(&target) {
                    let companion_path = (companion.path)(&captures);
                    store.objects.entry(companion_path).or_insert_with(companion.generate);
                }
            }
        } else if let Some(prior) = store.objects.get(&target) {
            for field in self.computed.iter().filter(|c| c.pattern.is_match(&target)) {
                if let Some(value) = prior.get(field.field) {
                    object.entry(field.field).or_insert_with(|| value.clone());
                }
            }
        }

        store.objects.insert(target, object);
        Ok(None)
    }

    async fn delete(&self, path: &str) -> VaultResult<()> {
        let path = normalize(path);
        self.record(RequestKind::Delete, path, None, &[]).await;
        self.check_failure(path)?;

        let target = self
            .delete_aliases
            .iter()
            .find_map(|(pattern, alias)| pattern.captures(path).map(|c| alias(&c)))
            .unwrap_or_else(|| path.to_string());

        let mut store = self.store.write().await;
        let removed = store.objects.remove(&target);
        let children = format!("{target}/");
        store.objects.retain(|k, _| !k.starts_with(&children));
        match removed {
            Some(_) => Ok(()),
            None => Err(VaultError::not_found(path)),
        }
    }

    async fn list(&self, path: &str) -> VaultResult<Option<Secret>> {
        let path = normalize(path);
        self.record(RequestKind::List, path, None, &[]).await;
        self.check_failure(path)?;

        let prefix = format!("{path}/");
        let store = self.store.read().await;
        let mut keys: Vec<String> = store
            .objects
            .keys()
            .filter_map(|k| k.strip_prefix(&prefix))
            .map(|rest| match rest.split_once('/') {
                Some((head, _)) => format!("{head}/"),
                None => rest.to_string(),
            })
            .collect();
        keys.dedup();

        if keys.is_empty() {
            return Ok(None);
        }
        let mut data = Object::new();
        data.insert("keys".to_string(), json!(keys));
        Ok(Some(Secret::from_data(data)))
    }
}
