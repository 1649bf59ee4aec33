//! Resource and data-source traits and their dynamic adapters.
//!
//! Kinds implement [`Resource`] or [`DataSource`] over a typed model. The
//! registry stores them behind [`DynamicResource`] / [`DynamicDataSource`],
//! which speak [`InstanceState`] and raw configuration objects.

use crate::context::ProviderContext;
use crate::error::{Operation, ProviderError, ProviderResult, VaultResultExt};
use crate::schema::{Mode, Prepared, Schema};
use crate::state::{InstanceState, Plan, changed_attributes};
use async_trait::async_trait;
use serde::{Serialize, de::DeserializeOwned};
use serde_json::{Map, Value};
use std::{fmt::Debug, marker::PhantomData};
use tracing::{debug, info, instrument, warn};

/// One resource kind over its typed model.
#[async_trait]
pub trait Resource: Send + Sync + 'static {
    /// Typed configuration and state of one instance.
    type Model: Serialize + DeserializeOwned + Clone + Default + Debug + Send + Sync;

    /// Registered type name, e.g. `vault_mount`.
    const TYPE_NAME: &'static str;

    /// Attribute table.
    fn schema() -> Schema;

    /// Write a new object and return its id.
    async fn create(ctx: &ProviderContext, planned: &Self::Model) -> ProviderResult<String>;

    /// Read the object behind `id`; `Ok(None)` when it does not exist.
    ///
    /// `prior` carries fields the server never returns (write-only
    /// versions, local flags). It is `None` on import.
    async fn read(
        ctx: &ProviderContext,
        id: &str,
        prior: Option<&Self::Model>,
    ) -> ProviderResult<Option<Self::Model>>;

    /// Write the fields that changed between `prior` and `planned`.
    async fn update(
        ctx: &ProviderContext,
        id: &str,
        prior: &Self::Model,
        planned: &Self::Model,
    ) -> ProviderResult<()>;

    /// Remove the object; an already absent object is not an error.
    async fn delete(ctx: &ProviderContext, id: &str, prior: &Self::Model) -> ProviderResult<()>;

    /// Whether the object behind `id` exists.
    async fn exists(ctx: &ProviderContext, id: &str) -> ProviderResult<bool> {
        Ok(Self::read(ctx, id, None).await?.is_some())
    }

    /// Attributes whose transition from `prior` to `planned` cannot be
    /// applied in place.
    fn customize_diff(_prior: &Self::Model, _planned: &Self::Model) -> Vec<&'static str> {
        Vec::new()
    }
}

/// One data-source kind over its typed model.
#[async_trait]
pub trait DataSource: Send + Sync + 'static {
    /// Typed arguments and results.
    type Model: Serialize + DeserializeOwned + Clone + Default + Debug + Send + Sync;

    /// Registered type name.
    const TYPE_NAME: &'static str;

    /// Attribute table.
    fn schema() -> Schema;

    /// Read the object and return its id with the populated model.
    ///
    /// An absent object is an error.
    async fn read(ctx: &ProviderContext, config: &Self::Model) -> ProviderResult<(String, Self::Model)>;
}

/// Object-safe view of a resource kind.
#[async_trait]
pub trait DynamicResource: Send + Sync {
    /// Registered type name.
    fn type_name(&self) -> &'static str;

    /// Attribute table.
    fn schema(&self) -> &Schema;

    /// Validate a configuration object and apply defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError::Validation`] with every error found.
    fn validate(&self, config: &Map<String, Value>) -> ProviderResult<Prepared>;

    /// Compare configuration with prior state.
    ///
    /// # Errors
    ///
    /// Returns an error when the configuration is invalid.
    fn plan(&self, prior: Option<&InstanceState>, config: &Map<String, Value>) -> ProviderResult<Plan>;

    /// Create the object and return its populated state.
    async fn create(&self, ctx: &ProviderContext, config: &Map<String, Value>) -> ProviderResult<InstanceState>;

    /// Refresh state; `Ok(None)` drops it.
    async fn read(&self, ctx: &ProviderContext, state: &InstanceState) -> ProviderResult<Option<InstanceState>>;

    /// Apply configuration changes in place.
    async fn update(
        &self,
        ctx: &ProviderContext,
        prior: &InstanceState,
        config: &Map<String, Value>,
    ) -> ProviderResult<InstanceState>;

    /// Remove the object.
    async fn delete(&self, ctx: &ProviderContext, state: &InstanceState) -> ProviderResult<()>;

    /// Whether the object exists.
    async fn exists(&self, ctx: &ProviderContext, id: &str) -> ProviderResult<bool>;

    /// Adopt an existing object by id.
    async fn import(&self, ctx: &ProviderContext, id: &str) -> ProviderResult<InstanceState>;
}

/// Object-safe view of a data-source kind.
#[async_trait]
pub trait DynamicDataSource: Send + Sync {
    /// Registered type name.
    fn type_name(&self) -> &'static str;

    /// Attribute table.
    fn schema(&self) -> &Schema;

    /// Validate arguments, read, and return the populated state.
    async fn read(&self, ctx: &ProviderContext, config: &Map<String, Value>) -> ProviderResult<InstanceState>;
}

fn to_attributes<M: Serialize>(model: &M) -> ProviderResult<Map<String, Value>> {
    match serde_json::to_value(model)? {
        Value::Object(mut map) => {
            map.retain(|_, v| !v.is_null());
            Ok(map)
        }
        _ => Ok(Map::new()),
    }
}

fn from_attributes<M: DeserializeOwned>(attributes: &Map<String, Value>) -> ProviderResult<M> {
    Ok(serde_json::from_value(Value::Object(attributes.clone()))?)
}

/// Carry prior values into optional+computed attributes the configuration omits.
fn keep_server_chosen(schema: &Schema, values: &mut Map<String, Value>, prior: &Map<String, Value>) {
    for attribute in schema.attributes.iter().filter(|a| a.mode == Mode::OptionalComputed) {
        if values.contains_key(attribute.name) {
            continue;
        }
        if let Some(value) = prior.get(attribute.name).filter(|v| !v.is_null()) {
            values.insert(attribute.name.to_string(), value.clone());
        }
    }
}

fn prepare(resource: &'static str, schema: &Schema, config: &Map<String, Value>) -> ProviderResult<Prepared> {
    let prepared = schema
        .prepare(config)
        .map_err(|diagnostics| ProviderError::Validation { resource, diagnostics })?;
    for warning in &prepared.warnings {
        warn!(resource, "{warning}");
    }
    Ok(prepared)
}

/// Adapter from [`Resource`] to [`DynamicResource`].
#[derive(Debug)]
pub struct ResourceAdapter<R> {
    schema: Schema,
    _kind: PhantomData<R>,
}

impl<R: Resource> ResourceAdapter<R> {
    /// Build the adapter, computing the schema once.
    #[must_use]
    pub fn new() -> Self {
        Self {
            schema: R::schema(),
            _kind: PhantomData,
        }
    }

    fn planned_model(&self, config: &Map<String, Value>, prior: Option<&InstanceState>) -> ProviderResult<R::Model> {
        let mut values = prepare(R::TYPE_NAME, &self.schema, config)?.values;
        if let Some(prior) = prior {
            keep_server_chosen(&self.schema, &mut values, &prior.attributes);
        }
        from_attributes(&values)
    }

    fn state(id: String, model: &R::Model) -> ProviderResult<InstanceState> {
        Ok(InstanceState::new(id, to_attributes(model)?))
    }

    async fn read_back(ctx: &ProviderContext, id: String, planned: &R::Model) -> ProviderResult<InstanceState> {
        match R::read(ctx, &id, Some(planned)).await? {
            Some(model) => Self::state(id, &model),
            None => Err(ProviderError::Vanished {
                resource: R::TYPE_NAME,
                id,
            }),
        }
    }
}

impl<R: Resource> Default for ResourceAdapter<R> {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<R: Resource> DynamicResource for ResourceAdapter<R> {
    fn type_name(&self) -> &'static str {
        R::TYPE_NAME
    }

    fn schema(&self) -> &Schema {
        &self.schema
    }

    fn validate(&self, config: &Map<String, Value>) -> ProviderResult<Prepared> {
        prepare(R::TYPE_NAME, &self.schema, config)
    }

    fn plan(&self, prior: Option<&InstanceState>, config: &Map<String, Value>) -> ProviderResult<Plan> {
        let prepared = self.validate(config)?;
        let Some(prior) = prior else {
            return Ok(Plan::Create);
        };

        let mut changed = changed_attributes(&self.schema, &prior.attributes, &prepared.values);
        let mut because: Vec<String> = changed
            .iter()
            .filter(|name| self.schema.get(name).is_some_and(|a| a.force_new))
            .cloned()
            .collect();

        let mut planned_values = prepared.values;
        keep_server_chosen(&self.schema, &mut planned_values, &prior.attributes);
        let prior_model: R::Model = from_attributes(&prior.attributes)?;
        let planned_model: R::Model = from_attributes(&planned_values)?;
        for name in R::customize_diff(&prior_model, &planned_model) {
            if !because.iter().any(|b| b == name) {
                because.push(name.to_string());
            }
            if !changed.iter().any(|c| c == name) {
                changed.push(name.to_string());
            }
        }

        Ok(if !because.is_empty() {
            Plan::Replace { changed, because }
        } else if changed.is_empty() {
            Plan::NoOp
        } else {
            Plan::Update { changed }
        })
    }

    #[instrument(skip_all, fields(resource = R::TYPE_NAME))]
    async fn create(&self, ctx: &ProviderContext, config: &Map<String, Value>) -> ProviderResult<InstanceState> {
        let planned = self.planned_model(config, None)?;
        let id = R::create(ctx, &planned).await?;
        info!(id = %id, "created");
        Self::read_back(ctx, id, &planned).await
    }

    #[instrument(skip_all, fields(resource = R::TYPE_NAME, id = %state.id))]
    async fn read(&self, ctx: &ProviderContext, state: &InstanceState) -> ProviderResult<Option<InstanceState>> {
        let prior: R::Model = from_attributes(&state.attributes)?;
        match R::read(ctx, &state.id, Some(&prior)).await? {
            Some(model) => Ok(Some(Self::state(state.id.clone(), &model)?)),
            None => {
                warn!("object not found, removing from state");
                Ok(None)
            }
        }
    }

    #[instrument(skip_all, fields(resource = R::TYPE_NAME, id = %prior.id))]
    async fn update(
        &self,
        ctx: &ProviderContext,
        prior: &InstanceState,
        config: &Map<String, Value>,
    ) -> ProviderResult<InstanceState> {
        match self.plan(Some(prior), config)? {
            Plan::NoOp => {
                debug!("no changes");
                return Ok(prior.clone());
            }
            Plan::Replace { because, .. } => {
                return Err(ProviderError::RequiresReplacement {
                    resource: R::TYPE_NAME,
                    id: prior.id.clone(),
                    attributes: because,
                });
            }
            Plan::Create | Plan::Update { .. } => {}
        }

        let prior_model: R::Model = from_attributes(&prior.attributes)?;
        let planned = self.planned_model(config, Some(prior))?;
        R::update(ctx, &prior.id, &prior_model, &planned).await?;
        Self::read_back(ctx, prior.id.clone(), &planned).await
    }

    #[instrument(skip_all, fields(resource = R::TYPE_NAME, id = %state.id))]
    async fn delete(&self, ctx: &ProviderContext, state: &InstanceState) -> ProviderResult<()> {
        let prior: R::Model = from_attributes(&state.attributes)?;
        R::delete(ctx, &state.id, &prior).await?;
        info!("deleted");
        Ok(())
    }

    async fn exists(&self, ctx: &ProviderContext, id: &str) -> ProviderResult<bool> {
        R::exists(ctx, id).await
    }

    #[instrument(skip_all, fields(resource = R::TYPE_NAME, id = %id))]
    async fn import(&self, ctx: &ProviderContext, id: &str) -> ProviderResult<InstanceState> {
        match R::read(ctx, id, None).await? {
            Some(model) => Self::state(id.to_string(), &model),
            None => Err(ProviderError::ImportNotFound {
                resource: R::TYPE_NAME,
                id: id.to_string(),
            }),
        }
    }
}

/// Adapter from [`DataSource`] to [`DynamicDataSource`].
#[derive(Debug)]
pub struct DataSourceAdapter<D> {
    schema: Schema,
    _kind: PhantomData<D>,
}

impl<D: DataSource> DataSourceAdapter<D> {
    /// Build the adapter, computing the schema once.
    #[must_use]
    pub fn new() -> Self {
        Self {
            schema: D::schema(),
            _kind: PhantomData,
        }
    }
}

impl<D: DataSource> Default for DataSourceAdapter<D> {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<D: DataSource> DynamicDataSource for DataSourceAdapter<D> {
    fn type_name(&self) -> &'static str {
        D::TYPE_NAME
    }

    fn schema(&self) -> &Schema {
        &self.schema
    }

    #[instrument(skip_all, fields(data_source = D::TYPE_NAME))]
    async fn read(&self, ctx: &ProviderContext, config: &Map<String, Value>) -> ProviderResult<InstanceState> {
        let prepared = prepare(D::TYPE_NAME, &self.schema, config)?;
        let args: D::Model = from_attributes(&prepared.values)?;
        let (id, model) = D::read(ctx, &args).await?;
        Ok(InstanceState::new(id, to_attributes(&model)?))
    }
}

/// Delete `path`, treating an absent object as success.
///
/// # Errors
///
/// Returns any other client error with delete context.
pub async fn delete_path(ctx: &ProviderContext, resource: &'static str, path: &str) -> ProviderResult<()> {
    match ctx.client().delete(path).await {
        Err(e) if e.is_not_found() => {
            debug!(path, "already absent");
            Ok(())
        }
        result => result.context(Operation::Delete, resource, path),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::Attribute;
    use serde::Deserialize;
    use serde_json::json;
    use std::sync::Arc;
    use test_utils::MockVault;

    const PATH: &str = "test/widgets";

    #[derive(Debug, Clone, Default, Serialize, Deserialize)]
    struct Widget {
        name: String,
        size: Option<i64>,
        locked: Option<bool>,
        serial: Option<String>,
    }

    struct WidgetResource;

    #[async_trait]
    impl Resource for WidgetResource {
        type Model = Widget;
        const TYPE_NAME: &'static str = "test_widget";

        fn schema() -> Schema {
            Schema::new("widget")
                .attribute(Attribute::string("name").required().force_new())
                .attribute(Attribute::int("size"))
                .attribute(Attribute::bool("locked"))
                .attribute(Attribute::string("serial").computed())
        }

        async fn create(ctx: &ProviderContext, planned: &Widget) -> ProviderResult<String> {
            let id = format!("{PATH}/{}", planned.name);
            let mut body = Map::new();
            body.insert("size".to_string(), json!(planned.size.unwrap_or_default()));
            body.insert("locked".to_string(), json!(planned.locked.unwrap_or_default()));
            body.insert("serial".to_string(), json!("w-1"));
            ctx.client().write(&id, body).await.context(Operation::Create, "widget", &id)?;
            Ok(id)
        }

        async fn read(ctx: &ProviderContext, id: &str, _prior: Option<&Widget>) -> ProviderResult<Option<Widget>> {
            let Some(secret) = ctx.client().read(id).await.context(Operation::Read, "widget", id)? else {
                return Ok(None);
            };
            let data = secret.data();
            Ok(Some(Widget {
                name: id.trim_start_matches(&format!("{PATH}/")).to_string(),
                size: data.get("size").and_then(Value::as_i64),
                locked: data.get("locked").and_then(Value::as_bool),
                serial: data.get("serial").and_then(Value::as_str).map(str::to_string),
            }))
        }

        async fn update(ctx: &ProviderContext, id: &str, _prior: &Widget, planned: &Widget) -> ProviderResult<()> {
            let mut body = Map::new();
            body.insert("size".to_string(), json!(planned.size.unwrap_or_default()));
            ctx.client().write(id, body).await.context(Operation::Update, "widget", id)?;
            Ok(())
        }

        async fn delete(ctx: &ProviderContext, id: &str, _prior: &Widget) -> ProviderResult<()> {
            delete_path(ctx, "widget", id).await
        }

        fn customize_diff(prior: &Widget, planned: &Widget) -> Vec<&'static str> {
            if prior.locked == Some(true) && planned.locked != Some(true) {
                return vec!["locked"];
            }
            Vec::new()
        }
    }

    fn config(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    fn setup() -> (ProviderContext, ResourceAdapter<WidgetResource>) {
        let ctx = ProviderContext::new(Arc::new(MockVault::new()));
        (ctx, ResourceAdapter::new())
    }

    #[tokio::test]
    async fn test_create_reads_back_computed_fields() {
        let (ctx, adapter) = setup();
        let state = adapter.create(&ctx, &config(json!({"name": "a", "size": 3}))).await.unwrap();

        assert_eq!(state.id, "test/widgets/a");
        assert_eq!(state.attributes["serial"], "w-1");
        assert_eq!(state.attributes["size"], 3);
    }

    #[tokio::test]
    async fn test_plan_lifecycle() {
        let (ctx, adapter) = setup();
        let cfg = config(json!({"name": "a", "size": 3}));
        assert_eq!(adapter.plan(None, &cfg).unwrap(), Plan::Create);

        let state = adapter.create(&ctx, &cfg).await.unwrap();
        assert!(adapter.plan(Some(&state), &cfg).unwrap().is_noop());

        let resized = config(json!({"name": "a", "size": 4}));
        assert_eq!(
            adapter.plan(Some(&state), &resized).unwrap(),
            Plan::Update { changed: vec!["size".to_string()] }
        );

        let renamed = config(json!({"name": "b", "size": 3}));
        assert!(matches!(adapter.plan(Some(&state), &renamed).unwrap(), Plan::Replace { .. }));
    }

    #[tokio::test]
    async fn test_customize_diff_forces_replacement() {
        let (ctx, adapter) = setup();
        let state = adapter
            .create(&ctx, &config(json!({"name": "a", "locked": true})))
            .await
            .unwrap();

        let unlocked = config(json!({"name": "a", "locked": false}));
        let plan = adapter.plan(Some(&state), &unlocked).unwrap();
        assert_eq!(
            plan,
            Plan::Replace {
                changed: vec!["locked".to_string()],
                because: vec!["locked".to_string()]
            }
        );

        let err = adapter.update(&ctx, &state, &unlocked).await.unwrap_err();
        assert!(matches!(err, ProviderError::RequiresReplacement { .. }));
    }

    #[tokio::test]
    async fn test_read_drops_state_after_delete() {
        let (ctx, adapter) = setup();
        let state = adapter.create(&ctx, &config(json!({"name": "a"}))).await.unwrap();

        adapter.delete(&ctx, &state).await.unwrap();
        assert!(adapter.read(&ctx, &state).await.unwrap().is_none());
        assert!(!adapter.exists(&ctx, &state.id).await.unwrap());
        adapter.delete(&ctx, &state).await.unwrap();
    }

    #[tokio::test]
    async fn test_import_missing_is_error() {
        let (ctx, adapter) = setup();
        let err = adapter.import(&ctx, "test/widgets/none").await.unwrap_err();
        assert!(matches!(err, ProviderError::ImportNotFound { .. }));
    }

    #[tokio::test]
    async fn test_invalid_config_rejected_before_any_call() {
        let (ctx, adapter) = setup();
        let err = adapter.create(&ctx, &config(json!({"size": "big"}))).await.unwrap_err();
        let ProviderError::Validation { diagnostics, .. } = err else {
            panic!("expected validation error");
        };
        assert_eq!(diagnostics.0.len(), 2);
    }
}
