//! Request body building and response field coercion.
//!
//! [`RequestBody`] encodes "set" semantics: optional values are only sent
//! when present, so an unset field is never confused with its zero value.
//! [`ResponseData`] reads fields back leniently, accepting the older shapes
//! some servers still return (a single string where a list is expected,
//! comma-joined strings where a set is expected, numbers as strings).

use serde_json::{Map, Value};
use std::collections::{BTreeMap, BTreeSet};

/// JSON object sent to a logical write.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RequestBody(Map<String, Value>);

impl RequestBody {
    /// Create an empty body.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a value unconditionally.
    pub fn insert(&mut self, key: &str, value: impl Into<Value>) -> &mut Self {
        self.0.insert(key.to_string(), value.into());
        self
    }

    /// Insert a value only when it is set.
    pub fn insert_opt<T: Into<Value> + Clone>(&mut self, key: &str, value: Option<&T>) -> &mut Self {
        if let Some(v) = value {
            self.0.insert(key.to_string(), v.clone().into());
        }
        self
    }

    /// Insert a string only when it is set and non-empty.
    pub fn insert_non_empty(&mut self, key: &str, value: Option<&String>) -> &mut Self {
        if let Some(v) = value.filter(|v| !v.is_empty()) {
            self.0.insert(key.to_string(), Value::String(v.clone()));
        }
        self
    }

    /// Insert a collection of strings as a JSON array when it is set.
    pub fn insert_strings<'a, I>(&mut self, key: &str, values: Option<I>) -> &mut Self
    where
        I: IntoIterator<Item = &'a String>,
    {
        if let Some(values) = values {
            let items: Vec<Value> = values.into_iter().cloned().map(Value::String).collect();
            self.0.insert(key.to_string(), Value::Array(items));
        }
        self
    }

    /// Insert a collection of strings joined with commas when it is set.
    pub fn insert_joined<'a, I>(&mut self, key: &str, values: Option<I>) -> &mut Self
    where
        I: IntoIterator<Item = &'a String>,
    {
        if let Some(values) = values {
            let joined: Vec<&str> = values.into_iter().map(String::as_str).collect();
            self.0.insert(key.to_string(), Value::String(joined.join(",")));
        }
        self
    }

    /// Insert a string map as a JSON object when it is set.
    pub fn insert_map(&mut self, key: &str, values: Option<&BTreeMap<String, String>>) -> &mut Self {
        if let Some(values) = values {
            let object: Map<String, Value> = values
                .iter()
                .map(|(k, v)| (k.clone(), Value::String(v.clone())))
                .collect();
            self.0.insert(key.to_string(), Value::Object(object));
        }
        self
    }

    /// Move the listed keys into a nested object under `key`.
    ///
    /// Used for APIs that take some settings inside a `config` block.
    pub fn nest(&mut self, key: &str, fields: &[&str]) -> &mut Self {
        let mut nested = Map::new();
        for field in fields {
            if let Some(value) = self.0.remove(*field) {
                nested.insert((*field).to_string(), value);
            }
        }
        if !nested.is_empty() {
            self.0.insert(key.to_string(), Value::Object(nested));
        }
        self
    }

    /// Drop a key.
    pub fn remove(&mut self, key: &str) -> &mut Self {
        self.0.remove(key);
        self
    }

    /// Rename a key, keeping its value.
    pub fn rename(&mut self, from: &str, to: &str) -> &mut Self {
        if let Some(value) = self.0.remove(from) {
            self.0.insert(to.to_string(), value);
        }
        self
    }

    /// Body restricted to fields that differ from `prior`.
    ///
    /// Fields present in `prior` but gone from `self` are sent as the zero
    /// value of their JSON type so the server clears them. Keys in `always`
    /// are kept even when unchanged.
    #[must_use]
    pub fn changed_since(&self, prior: &Self, always: &[&str]) -> Self {
        let mut body = Map::new();
        for (key, value) in &self.0 {
            if always.contains(&key.as_str()) || prior.0.get(key) != Some(value) {
                body.insert(key.clone(), value.clone());
            }
        }
        for (key, value) in &prior.0 {
            if !self.0.contains_key(key) {
                body.insert(key.clone(), zero_like(value));
            }
        }
        Self(body)
    }

    /// Whether the body has no fields.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Field value.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Consume the body and return the JSON object.
    #[must_use]
    pub fn into_map(self) -> Map<String, Value> {
        self.0
    }
}

fn zero_like(value: &Value) -> Value {
    match value {
        Value::String(_) => Value::String(String::new()),
        Value::Bool(_) => Value::Bool(false),
        Value::Number(_) => Value::from(0),
        Value::Array(_) => Value::Array(Vec::new()),
        Value::Object(_) => Value::Object(Map::new()),
        Value::Null => Value::Null,
    }
}

/// Lenient reader over a response `data` object.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResponseData(Map<String, Value>);

impl ResponseData {
    /// Wrap a response object.
    #[must_use]
    pub const fn new(data: Map<String, Value>) -> Self {
        Self(data)
    }

    fn value(&self, key: &str) -> Option<&Value> {
        self.0.get(key).filter(|v| !v.is_null())
    }

    /// Whether the key is present and non-null.
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.value(key).is_some()
    }

    /// Raw value.
    #[must_use]
    pub fn raw(&self, key: &str) -> Option<&Value> {
        self.value(key)
    }

    /// String field; numbers and booleans are rendered as text.
    #[must_use]
    pub fn string(&self, key: &str) -> Option<String> {
        match self.value(key)? {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            _ => None,
        }
    }

    /// Boolean field; accepts `"true"`/`"false"` strings.
    #[must_use]
    pub fn bool(&self, key: &str) -> Option<bool> {
        match self.value(key)? {
            Value::Bool(b) => Some(*b),
            Value::String(s) => s.parse().ok(),
            _ => None,
        }
    }

    /// Integer field; accepts numeric strings and whole floats.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn int(&self, key: &str) -> Option<i64> {
        match self.value(key)? {
            Value::Number(n) => n
                .as_i64()
                .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64)),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    /// List field; a single string is promoted to a one-element list.
    #[must_use]
    pub fn string_list(&self, key: &str) -> Option<Vec<String>> {
        match self.value(key)? {
            Value::Array(items) => Some(items.iter().filter_map(scalar_text).collect()),
            Value::String(s) if s.is_empty() => Some(Vec::new()),
            Value::String(s) => Some(vec![s.clone()]),
            _ => None,
        }
    }

    /// Set field; a comma-joined string is split into its members.
    #[must_use]
    pub fn string_set(&self, key: &str) -> Option<BTreeSet<String>> {
        match self.value(key)? {
            Value::Array(items) => Some(items.iter().filter_map(scalar_text).collect()),
            Value::String(s) => Some(split_commas(s)),
            _ => None,
        }
    }

    /// Map field; non-string values are rendered as text.
    #[must_use]
    pub fn string_map(&self, key: &str) -> Option<BTreeMap<String, String>> {
        let object = self.value(key)?.as_object()?;
        Some(
            object
                .iter()
                .filter_map(|(k, v)| scalar_text(v).map(|v| (k.clone(), v)))
                .collect(),
        )
    }

    /// Nested object field.
    #[must_use]
    pub fn object(&self, key: &str) -> Option<Self> {
        self.value(key)?.as_object().cloned().map(Self)
    }

    /// Underlying object.
    #[must_use]
    pub const fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Split a comma-joined string into a set, dropping blanks.
#[must_use]
pub fn split_commas(s: &str) -> BTreeSet<String> {
    s.split(',')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(str::to_string)
        .collect()
}
