//! Resource schemas and configuration validation.
//!
//! A [`Schema`] is an ordered attribute table built once per resource kind.
//! [`Schema::prepare`] validates a configuration object against it and fills
//! in defaults; all problems are collected into [`Diagnostics`] rather than
//! failing on the first one.

use serde::Serialize;
use serde_json::{Map, Value};
use std::fmt;

/// Attribute value type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AttrType {
    /// String
    String,
    /// Boolean
    Bool,
    /// Integer
    Int,
    /// Ordered list of strings
    List,
    /// Unordered set of strings
    Set,
    /// Map of string to string
    Map,
    /// String holding a JSON document, compared semantically
    Json,
}

impl AttrType {
    fn accepts(self, value: &Value) -> bool {
        match self {
            Self::String => value.is_string(),
            Self::Bool => value.is_boolean(),
            Self::Int => value.is_i64() || value.is_u64(),
            Self::List | Self::Set => value
                .as_array()
                .is_some_and(|items| items.iter().all(Value::is_string)),
            Self::Map => value
                .as_object()
                .is_some_and(|entries| entries.values().all(Value::is_string)),
            Self::Json => value
                .as_str()
                .is_some_and(|s| serde_json::from_str::<Value>(s).is_ok()),
        }
    }

    /// Zero value used when an optional attribute is unset.
    #[must_use]
    pub fn zero(self) -> Value {
        match self {
            Self::String | Self::Json => Value::String(String::new()),
            Self::Bool => Value::Bool(false),
            Self::Int => Value::from(0),
            Self::List | Self::Set => Value::Array(Vec::new()),
            Self::Map => Value::Object(Map::new()),
        }
    }
}

/// Who supplies an attribute's value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    /// Must be configured
    Required,
    /// May be configured
    Optional,
    /// Set by the server only
    Computed,
    /// Configured, or chosen by the server when omitted
    OptionalComputed,
}

/// Attribute value check run during validation.
#[derive(Clone, Copy)]
pub struct Validator(pub fn(&Value) -> Result<(), String>);

impl fmt::Debug for Validator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Validator")
    }
}

/// One schema attribute.
#[derive(Debug, Clone, Serialize)]
pub struct Attribute {
    /// Attribute name as written in configuration
    pub name: &'static str,
    /// Value type
    #[serde(rename = "type")]
    pub ty: AttrType,
    /// Required/optional/computed
    pub mode: Mode,
    /// Value applied when the attribute is omitted
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    /// Value is secret
    pub sensitive: bool,
    /// Value is sent but never stored or read back
    pub write_only: bool,
    /// Changing the value requires a new object
    pub force_new: bool,
    /// Attributes that may not be set together with this one
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub conflicts_with: Vec<&'static str>,
    /// Deprecation message
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deprecated: Option<&'static str>,
    /// Human-readable description
    pub description: &'static str,
    #[serde(skip)]
    validator: Option<Validator>,
}

impl Attribute {
    fn new(name: &'static str, ty: AttrType) -> Self {
        Self {
            name,
            ty,
            mode: Mode::Optional,
            default: None,
            sensitive: false,
            write_only: false,
            force_new: false,
            conflicts_with: Vec::new(),
            deprecated: None,
            description: "",
            validator: None,
        }
    }

    /// Optional string attribute.
    #[must_use]
    pub fn string(name: &'static str) -> Self {
        Self::new(name, AttrType::String)
    }

    /// Optional boolean attribute.
    #[must_use]
    pub fn bool(name: &'static str) -> Self {
        Self::new(name, AttrType::Bool)
    }

    /// Optional integer attribute.
    #[must_use]
    pub fn int(name: &'static str) -> Self {
        Self::new(name, AttrType::Int)
    }

    /// Optional list-of-strings attribute.
    #[must_use]
    pub fn list(name: &'static str) -> Self {
        Self::new(name, AttrType::List)
    }

    /// Optional set-of-strings attribute.
    #[must_use]
    pub fn set(name: &'static str) -> Self {
        Self::new(name, AttrType::Set)
    }

    /// Optional string-map attribute.
    #[must_use]
    pub fn map(name: &'static str) -> Self {
        Self::new(name, AttrType::Map)
    }

    /// Optional JSON-document attribute.
    #[must_use]
    pub fn json(name: &'static str) -> Self {
        Self::new(name, AttrType::Json)
    }

    /// Mark as required.
    #[must_use]
    pub const fn required(mut self) -> Self {
        self.mode = Mode::Required;
        self
    }

    /// Mark as server-computed only.
    #[must_use]
    pub const fn computed(mut self) -> Self {
        self.mode = Mode::Computed;
        self
    }

    /// Mark as optional, with the server choosing a value when omitted.
    #[must_use]
    pub const fn optional_computed(mut self) -> Self {
        self.mode = Mode::OptionalComputed;
        self
    }

    /// Set the default value.
    #[must_use]
    pub fn default(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }

    /// Mark as sensitive.
    #[must_use]
    pub const fn sensitive(mut self) -> Self {
        self.sensitive = true;
        self
    }

    /// Mark as write-only; implies sensitive.
    #[must_use]
    pub const fn write_only(mut self) -> Self {
        self.write_only = true;
        self.sensitive = true;
        self
    }

    /// Changing the value replaces the object.
    #[must_use]
    pub const fn force_new(mut self) -> Self {
        self.force_new = true;
        self
    }

    /// Declare conflicting attributes.
    #[must_use]
    pub fn conflicts_with(mut self, names: &[&'static str]) -> Self {
        self.conflicts_with.extend_from_slice(names);
        self
    }

    /// Mark as deprecated.
    #[must_use]
    pub const fn deprecated(mut self, message: &'static str) -> Self {
        self.deprecated = Some(message);
        self
    }

    /// Set the description.
    #[must_use]
    pub const fn description(mut self, description: &'static str) -> Self {
        self.description = description;
        self
    }

    /// Attach a value validator.
    #[must_use]
    pub const fn validate(mut self, check: fn(&Value) -> Result<(), String>) -> Self {
        self.validator = Some(Validator(check));
        self
    }

    /// Whether the value comes from configuration at all.
    #[must_use]
    pub const fn is_configurable(&self) -> bool {
        !matches!(self.mode, Mode::Computed)
    }
}

/// Diagnostic severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    /// Configuration is rejected
    Error,
    /// Configuration is accepted with a notice
    Warning,
}

/// A validation finding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    /// Severity
    pub severity: Severity,
    /// Attribute the finding is about
    pub attribute: Option<String>,
    /// Message
    pub summary: String,
}

impl Diagnostic {
    /// Error about an attribute.
    #[must_use]
    pub fn error(attribute: &str, summary: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            attribute: Some(attribute.to_string()),
            summary: summary.into(),
        }
    }

    /// Warning about an attribute.
    #[must_use]
    pub fn warning(attribute: &str, summary: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            attribute: Some(attribute.to_string()),
            summary: summary.into(),
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.attribute {
            Some(attribute) => write!(f, "{attribute}: {}", self.summary),
            None => f.write_str(&self.summary),
        }
    }
}

/// A collection of diagnostics.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Diagnostics(pub Vec<Diagnostic>);

impl Diagnostics {
    /// Whether any diagnostic is an error.
    #[must_use]
    pub fn has_errors(&self) -> bool {
        self.0.iter().any(|d| d.severity == Severity::Error)
    }

    /// Diagnostics of the given severity.
    pub fn of(&self, severity: Severity) -> impl Iterator<Item = &Diagnostic> {
        self.0.iter().filter(move |d| d.severity == severity)
    }
}

impl fmt::Display for Diagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let messages: Vec<String> = self.of(Severity::Error).map(ToString::to_string).collect();
        f.write_str(&messages.join("; "))
    }
}

/// Validated configuration with defaults applied.
#[derive(Debug, Clone, PartialEq)]
pub struct Prepared {
    /// Attribute values
    pub values: Map<String, Value>,
    /// Non-fatal findings, e.g. deprecated attributes in use
    pub warnings: Vec<Diagnostic>,
}

/// Attribute table of one resource or data source kind.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Schema {
    /// Human-readable description
    pub description: &'static str,
    /// Attributes in declaration order
    pub attributes: Vec<Attribute>,
}

impl Schema {
    /// Create an empty schema.
    #[must_use]
    pub const fn new(description: &'static str) -> Self {
        Self {
            description,
            attributes: Vec::new(),
        }
    }

    /// Add an attribute.
    #[must_use]
    pub fn attribute(mut self, attribute: Attribute) -> Self {
        self.attributes.push(attribute);
        self
    }

    /// Add several attributes.
    #[must_use]
    pub fn attributes(mut self, attributes: impl IntoIterator<Item = Attribute>) -> Self {
        self.attributes.extend(attributes);
        self
    }

    /// Look up an attribute by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Attribute> {
        self.attributes.iter().find(|a| a.name == name)
    }

    /// Validate `config` and apply defaults.
    ///
    /// Null values count as unset.
    ///
    /// # Errors
    ///
    /// Returns every error diagnostic found.
    pub fn prepare(&self, config: &Map<String, Value>) -> Result<Prepared, Diagnostics> {
        let mut findings = Vec::new();
        let mut values = Map::new();

        for (name, value) in config {
            if value.is_null() {
                continue;
            }
            let Some(attribute) = self.get(name) else {
                findings.push(Diagnostic::error(name, "unsupported attribute"));
                continue;
            };
            if !attribute.is_configurable() {
                findings.push(Diagnostic::error(name, "attribute is computed and cannot be set"));
                continue;
            }
            if !attribute.ty.accepts(value) {
                findings.push(Diagnostic::error(
                    name,
                    format!("expected a value of type {:?}", attribute.ty),
                ));
                continue;
            }
            if let Some(Validator(check)) = attribute.validator {
                if let Err(message) = check(value) {
                    findings.push(Diagnostic::error(name, message));
                    continue;
                }
            }
            if let Some(message) = attribute.deprecated {
                findings.push(Diagnostic::warning(name, message));
            }
            values.insert(name.clone(), value.clone());
        }

        for attribute in &self.attributes {
            if !values.contains_key(attribute.name) {
                continue;
            }
            for other in &attribute.conflicts_with {
                if values.contains_key(*other) {
                    findings.push(Diagnostic::error(
                        attribute.name,
                        format!("conflicts with {other}"),
                    ));
                }
            }
        }

        for attribute in &self.attributes {
            let rejected = config.get(attribute.name).is_some_and(|v| !v.is_null());
            if values.contains_key(attribute.name) || rejected {
                continue;
            }
            if attribute.mode == Mode::Required {
                findings.push(Diagnostic::error(attribute.name, "required attribute is missing"));
            } else if let Some(default) = &attribute.default {
                values.insert(attribute.name.to_string(), default.clone());
            }
        }

        let diagnostics = Diagnostics(findings);
        if diagnostics.has_errors() {
            return Err(diagnostics);
        }
        Ok(Prepared {
            values,
            warnings: diagnostics.0,
        })
    }
}

/// Reject values with a leading or trailing slash.
///
/// # Errors
///
/// Returns a message when the string starts or ends with `/`.
pub fn no_leading_trailing_slashes(value: &Value) -> Result<(), String> {
    let s = value.as_str().unwrap_or_default();
    if s.starts_with('/') || s.ends_with('/') {
        return Err(format!("invalid value {s:?}, must not start or end with '/'"));
    }
    Ok(())
}

/// Reject empty strings.
///
/// # Errors
///
/// Returns a message when the string is empty.
pub fn non_empty(value: &Value) -> Result<(), String> {
    if value.as_str().is_some_and(str::is_empty) {
        return Err("must not be empty".to_string());
    }
    Ok(())
}

/// Reject negative integers.
///
/// # Errors
///
/// Returns a message when the integer is below zero.
pub fn non_negative(value: &Value) -> Result<(), String> {
    if value.as_i64().is_some_and(|n| n < 0) {
        return Err(format!("expected a non-negative number, got {value}"));
    }
    Ok(())
}
