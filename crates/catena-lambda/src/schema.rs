//! Item schemas for request validation.
//!
//! A [`Schema`] is an ordered set of named [`Attribute`]s. Parsing an item
//! checks presence and type of every attribute, runs custom validators,
//! applies transforms and defaults, and drops attributes the schema does not
//! declare.
//!
//! ```
//! use catena_lambda::schema::{Attribute, Schema, ValidationMode};
//! use serde_json::json;
//!
//! let schema = Schema::builder()
//!     .attribute("name", Attribute::string().required())
//!     .attribute("age", Attribute::number().required())
//!     .build();
//!
//! let error = schema
//!     .parse(&json!({ "name": "Lucas" }), ValidationMode::Put)
//!     .unwrap_err();
//! assert_eq!(error.code(), "MissingAttribute");
//! assert_eq!(error.path(), Some("age"));
//! ```

use catena_core::StageError;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

type ValidateFn = Arc<dyn Fn(&Value) -> Result<(), String> + Send + Sync>;
type TransformFn = Arc<dyn Fn(Value) -> Value + Send + Sync>;

/// How strictly an item is checked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValidationMode {
    /// A complete item: required and key attributes must be present and
    /// defaults are applied.
    Put,
    /// A partial item: only key attributes must be present.
    Update,
    /// Only the key attributes are parsed; everything else is dropped.
    Key,
}

impl fmt::Display for ValidationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Put => "put",
            Self::Update => "update",
            Self::Key => "key",
        })
    }
}

/// The JSON type an attribute accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AttributeType {
    /// A JSON string.
    String,
    /// A JSON number.
    Number,
    /// A JSON boolean.
    Boolean,
    /// A JSON array.
    List,
    /// A JSON object.
    Map,
    /// Any non-null JSON value.
    Any,
}

impl AttributeType {
    fn accepts(self, value: &Value) -> bool {
        match self {
            Self::String => value.is_string(),
            Self::Number => value.is_number(),
            Self::Boolean => value.is_boolean(),
            Self::List => value.is_array(),
            Self::Map => value.is_object(),
            Self::Any => !value.is_null(),
        }
    }

    /// Returns the type name used in error messages.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Number => "number",
            Self::Boolean => "boolean",
            Self::List => "list",
            Self::Map => "map",
            Self::Any => "any",
        }
    }
}

impl fmt::Display for AttributeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "list",
        Value::Object(_) => "map",
    }
}

/// A single attribute definition.
#[derive(Clone)]
pub struct Attribute {
    kind: AttributeType,
    required: bool,
    key: bool,
    default: Option<Value>,
    validators: Vec<ValidateFn>,
    transforms: Vec<TransformFn>,
}

impl Attribute {
    /// Creates an optional attribute of the given type.
    #[must_use]
    pub fn new(kind: AttributeType) -> Self {
        Self {
            kind,
            required: false,
            key: false,
            default: None,
            validators: Vec::new(),
            transforms: Vec::new(),
        }
    }

    /// A string attribute.
    #[must_use]
    pub fn string() -> Self {
        Self::new(AttributeType::String)
    }

    /// A number attribute.
    #[must_use]
    pub fn number() -> Self {
        Self::new(AttributeType::Number)
    }

    /// A boolean attribute.
    #[must_use]
    pub fn boolean() -> Self {
        Self::new(AttributeType::Boolean)
    }

    /// A list attribute.
    #[must_use]
    pub fn list() -> Self {
        Self::new(AttributeType::List)
    }

    /// A map attribute.
    #[must_use]
    pub fn map() -> Self {
        Self::new(AttributeType::Map)
    }

    /// An attribute of any type.
    #[must_use]
    pub fn any() -> Self {
        Self::new(AttributeType::Any)
    }

    /// Marks the attribute as required for complete items.
    #[must_use]
    pub const fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Marks the attribute as part of the item key.
    #[must_use]
    pub const fn key(mut self) -> Self {
        self.key = true;
        self
    }

    /// Sets the value used when a complete item omits the attribute.
    #[must_use]
    pub fn default_value(mut self, value: Value) -> Self {
        self.default = Some(value);
        self
    }

    /// Adds a custom check. Returning `Err(message)` rejects the value.
    #[must_use]
    pub fn validate<F>(mut self, check: F) -> Self
    where
        F: Fn(&Value) -> Result<(), String> + Send + Sync + 'static,
    {
        self.validators.push(Arc::new(check));
        self
    }

    /// Adds a transform applied after validation.
    #[must_use]
    pub fn transform<F>(mut self, transform: F) -> Self
    where
        F: Fn(Value) -> Value + Send + Sync + 'static,
    {
        self.transforms.push(Arc::new(transform));
        self
    }

    /// Returns the attribute type.
    #[must_use]
    pub const fn kind(&self) -> AttributeType {
        self.kind
    }

    /// Returns `true` if the attribute is required.
    #[must_use]
    pub const fn is_required(&self) -> bool {
        self.required
    }

    /// Returns `true` if the attribute is part of the key.
    #[must_use]
    pub const fn is_key(&self) -> bool {
        self.key
    }

    const fn must_be_present(&self, mode: ValidationMode) -> bool {
        match mode {
            ValidationMode::Put => self.required || self.key,
            ValidationMode::Update | ValidationMode::Key => self.key,
        }
    }

    fn parse_value(&self, path: &str, value: Value) -> Result<Value, SchemaError> {
        if !self.kind.accepts(&value) {
            return Err(SchemaError::InvalidAttribute {
                path: path.to_string(),
                expected: self.kind,
                found: json_type_name(&value),
            });
        }

        for check in &self.validators {
            check(&value).map_err(|message| SchemaError::CustomValidation {
                path: path.to_string(),
                message,
            })?;
        }

        Ok(self
            .transforms
            .iter()
            .fold(value, |value, transform| transform(value)))
    }
}

impl fmt::Debug for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Attribute")
            .field("kind", &self.kind)
            .field("required", &self.required)
            .field("key", &self.key)
            .field("default", &self.default)
            .field("validators", &self.validators.len())
            .field("transforms", &self.transforms.len())
            .finish()
    }
}

/// Errors produced while parsing an item.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SchemaError {
    /// The item is not an object.
    #[error("Expected an object item, found {found}")]
    InvalidItem {
        /// JSON type of the rejected item.
        found: &'static str,
    },

    /// A mandatory attribute is absent.
    #[error("Attribute '{path}' is required")]
    MissingAttribute {
        /// Attribute name.
        path: String,
    },

    /// An attribute has the wrong type.
    #[error("Attribute '{path}' should be a {expected}, found {found}")]
    InvalidAttribute {
        /// Attribute name.
        path: String,
        /// Declared type.
        expected: AttributeType,
        /// JSON type of the rejected value.
        found: &'static str,
    },

    /// A custom validator rejected the value.
    #[error("{message}")]
    CustomValidation {
        /// Attribute name.
        path: String,
        /// Message returned by the validator.
        message: String,
    },
}

impl SchemaError {
    /// Returns the discriminator code.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::InvalidItem { .. } => "InvalidItem",
            Self::MissingAttribute { .. } => "MissingAttribute",
            Self::InvalidAttribute { .. } => "InvalidAttribute",
            Self::CustomValidation { .. } => "CustomValidation",
        }
    }

    /// Returns the attribute path the error refers to.
    #[must_use]
    pub fn path(&self) -> Option<&str> {
        match self {
            Self::InvalidItem { .. } => None,
            Self::MissingAttribute { path }
            | Self::InvalidAttribute { path, .. }
            | Self::CustomValidation { path, .. } => Some(path),
        }
    }
}

impl From<SchemaError> for StageError {
    fn from(error: SchemaError) -> Self {
        let stage_error = Self::validation(error.code(), error.to_string());
        match error.path() {
            Some(path) => stage_error.with_path(path),
            None => stage_error,
        }
    }
}

/// An ordered set of attributes.
#[derive(Debug, Clone, Default)]
pub struct Schema {
    attributes: Vec<(String, Attribute)>,
}

impl Schema {
    /// Starts building a schema.
    #[must_use]
    pub fn builder() -> SchemaBuilder {
        SchemaBuilder::default()
    }

    /// Returns the attribute with the given name.
    #[must_use]
    pub fn attribute(&self, name: &str) -> Option<&Attribute> {
        self.attributes
            .iter()
            .find(|(attribute, _)| attribute == name)
            .map(|(_, attribute)| attribute)
    }

    /// Returns the attribute names in declaration order.
    pub fn attribute_names(&self) -> impl Iterator<Item = &str> {
        self.attributes.iter().map(|(name, _)| name.as_str())
    }

    /// Parses an item.
    ///
    /// Attributes are checked in declaration order and the first failure is
    /// returned. A `null` value counts as absent.
    ///
    /// # Errors
    ///
    /// Returns a [`SchemaError`] if the item is not an object or an
    /// attribute is missing, mistyped or rejected by a validator.
    pub fn parse(&self, item: &Value, mode: ValidationMode) -> Result<Value, SchemaError> {
        let Value::Object(input) = item else {
            return Err(SchemaError::InvalidItem {
                found: json_type_name(item),
            });
        };

        let mut parsed = Map::new();
        for (name, attribute) in &self.attributes {
            if mode == ValidationMode::Key && !attribute.key {
                continue;
            }

            let value = match input.get(name) {
                Some(Value::Null) | None if mode == ValidationMode::Put => attribute.default.clone(),
                Some(Value::Null) | None => None,
                Some(value) => Some(value.clone()),
            };

            let Some(value) = value else {
                if attribute.must_be_present(mode) {
                    return Err(SchemaError::MissingAttribute { path: name.clone() });
                }
                continue;
            };

            parsed.insert(name.clone(), attribute.parse_value(name, value)?);
        }

        Ok(Value::Object(parsed))
    }
}

/// Builder for [`Schema`].
#[derive(Debug, Default)]
pub struct SchemaBuilder {
    attributes: Vec<(String, Attribute)>,
}

impl SchemaBuilder {
    /// Adds an attribute. Declaring a name twice replaces the first
    /// definition in place.
    #[must_use]
    pub fn attribute(mut self, name: impl Into<String>, attribute: Attribute) -> Self {
        let name = name.into();
        match self.attributes.iter_mut().find(|(existing, _)| *existing == name) {
            Some((_, slot)) => *slot = attribute,
            None => self.attributes.push((name, attribute)),
        }
        self
    }

    /// Builds the schema.
    #[must_use]
    pub fn build(self) -> Schema {
        Schema {
            attributes: self.attributes,
        }
    }
}
