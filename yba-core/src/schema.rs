//! Schema - Define type schemas for resources
//!
//! Providers define schemas for each resource type, enabling validation
//! of declared attributes before any remote call is made.

use std::collections::HashMap;
use std::fmt;

use crate::resource::Value;

/// Attribute type
#[derive(Debug, Clone)]
pub enum AttributeType {
    /// String
    String,
    /// Integer
    Int,
    /// Floating point number (integers are accepted)
    Float,
    /// Boolean
    Bool,
    /// Enum (list of allowed values)
    Enum(Vec<String>),
    /// Custom type (with validation function)
    Custom {
        name: String,
        base: Box<AttributeType>,
        validate: fn(&Value) -> Result<(), String>,
    },
    /// List
    List(Box<AttributeType>),
    /// Map with homogeneous values
    Map(Box<AttributeType>),
    /// Nested block with named fields
    Block(Vec<AttributeSchema>),
}

impl AttributeType {
    /// Check if a value conforms to this type
    pub fn validate(&self, value: &Value) -> Result<(), TypeError> {
        match (self, value) {
            // References resolve at apply time; their type is checked then
            (_, Value::ResourceRef(_, _)) => Ok(()),
            (AttributeType::String, Value::String(_)) => Ok(()),
            (AttributeType::Int, Value::Int(_)) => Ok(()),
            (AttributeType::Float, Value::Float(_) | Value::Int(_)) => Ok(()),
            (AttributeType::Bool, Value::Bool(_)) => Ok(()),

            (AttributeType::Enum(variants), Value::String(s)) => {
                if variants.iter().any(|v| v == s) {
                    Ok(())
                } else {
                    Err(TypeError::InvalidEnumVariant {
                        value: s.clone(),
                        expected: variants.clone(),
                    })
                }
            }

            (AttributeType::Custom { validate, base, .. }, v) => {
                base.validate(v)?;
                validate(v).map_err(|msg| TypeError::ValidationFailed { message: msg })
            }

            (AttributeType::List(inner), Value::List(items)) => {
                for (i, item) in items.iter().enumerate() {
                    inner.validate(item).map_err(|e| TypeError::ListItemError {
                        index: i,
                        inner: Box::new(e),
                    })?;
                }
                Ok(())
            }

            (AttributeType::Map(inner), Value::Map(map)) => {
                for (k, v) in map {
                    inner.validate(v).map_err(|e| TypeError::MapValueError {
                        key: k.clone(),
                        inner: Box::new(e),
                    })?;
                }
                Ok(())
            }

            (AttributeType::Block(fields), Value::Map(map)) => {
                let mut errors = validate_fields(fields, map);
                match errors.len() {
                    0 => Ok(()),
                    1 => Err(errors.remove(0)),
                    _ => Err(TypeError::Multiple(errors)),
                }
            }

            _ => Err(TypeError::TypeMismatch {
                expected: self.type_name(),
                got: value.type_name(),
            }),
        }
    }

    fn type_name(&self) -> String {
        match self {
            AttributeType::String => "String".to_string(),
            AttributeType::Int => "Int".to_string(),
            AttributeType::Float => "Float".to_string(),
            AttributeType::Bool => "Bool".to_string(),
            AttributeType::Enum(variants) => format!("Enum({})", variants.join(" | ")),
            AttributeType::Custom { name, .. } => name.clone(),
            AttributeType::List(inner) => format!("List<{}>", inner.type_name()),
            AttributeType::Map(inner) => format!("Map<{}>", inner.type_name()),
            AttributeType::Block(_) => "Block".to_string(),
        }
    }
}

impl fmt::Display for AttributeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.type_name())
    }
}

/// Type error
#[derive(Debug, Clone, thiserror::Error)]
pub enum TypeError {
    #[error("Type mismatch: expected {expected}, got {got}")]
    TypeMismatch { expected: String, got: String },

    #[error("Invalid enum variant '{value}', expected one of: {}", expected.join(", "))]
    InvalidEnumVariant {
        value: String,
        expected: Vec<String>,
    },

    #[error("Validation failed: {message}")]
    ValidationFailed { message: String },

    #[error("Required attribute '{name}' is missing")]
    MissingRequired { name: String },

    #[error("Unknown attribute '{name}'")]
    UnknownAttribute { name: String },

    #[error("Attribute '{name}' is computed and cannot be set")]
    ComputedAttribute { name: String },

    #[error("Attributes '{name}' and '{other}' cannot be set together")]
    Conflict { name: String, other: String },

    #[error("Attribute '{name}': {inner}")]
    AttributeError { name: String, inner: Box<TypeError> },

    #[error("List item at index {index}: {inner}")]
    ListItemError { index: usize, inner: Box<TypeError> },

    #[error("Map value for key '{key}': {inner}")]
    MapValueError { key: String, inner: Box<TypeError> },

    #[error("{}", .0.iter().map(|e| e.to_string()).collect::<Vec<_>>().join("; "))]
    Multiple(Vec<TypeError>),
}

impl Value {
    fn type_name(&self) -> String {
        match self {
            Value::String(_) => "String".to_string(),
            Value::Int(_) => "Int".to_string(),
            Value::Float(_) => "Float".to_string(),
            Value::Bool(_) => "Bool".to_string(),
            Value::List(_) => "List".to_string(),
            Value::Map(_) => "Map".to_string(),
            Value::ResourceRef(address, attr) => format!("ResourceRef({}.{})", address, attr),
        }
    }
}

/// Attribute schema
#[derive(Debug, Clone)]
pub struct AttributeSchema {
    pub name: String,
    pub attr_type: AttributeType,
    pub required: bool,
    /// Whether the user may set the attribute at all
    pub optional: bool,
    /// Whether the remote side fills in the value
    pub computed: bool,
    /// Changing this attribute requires replacing the resource
    pub force_new: bool,
    /// Value is masked in plan output
    pub sensitive: bool,
    /// Never returned by the API; reads keep the previously recorded value
    pub write_only: bool,
    pub default: Option<Value>,
    pub description: Option<String>,
    /// Attributes that cannot be set together with this one
    pub conflicts_with: Vec<String>,
}

impl AttributeSchema {
    pub fn new(name: impl Into<String>, attr_type: AttributeType) -> Self {
        Self {
            name: name.into(),
            attr_type,
            required: false,
            optional: true,
            computed: false,
            force_new: false,
            sensitive: false,
            write_only: false,
            default: None,
            description: None,
            conflicts_with: Vec::new(),
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self.optional = false;
        self
    }

    /// Read-only attribute set by the remote side
    pub fn computed(mut self) -> Self {
        self.computed = true;
        self.optional = false;
        self.required = false;
        self
    }

    /// Optional attribute the remote side fills in when omitted
    pub fn optional_computed(mut self) -> Self {
        self.computed = true;
        self.optional = true;
        self
    }

    pub fn force_new(mut self) -> Self {
        self.force_new = true;
        self
    }

    pub fn sensitive(mut self) -> Self {
        self.sensitive = true;
        self
    }

    pub fn write_only(mut self) -> Self {
        self.write_only = true;
        self
    }

    pub fn with_default(mut self, value: Value) -> Self {
        self.default = Some(value);
        self
    }

    pub fn with_description(mut self, desc: impl Into<String>) -> Self {
        self.description = Some(desc.into());
        self
    }

    pub fn conflicts_with(mut self, other: impl Into<String>) -> Self {
        self.conflicts_with.push(other.into());
        self
    }

    /// Whether the user can set this attribute
    pub fn is_settable(&self) -> bool {
        self.required || self.optional
    }
}

fn validate_fields(
    fields: &[AttributeSchema],
    attributes: &HashMap<String, Value>,
) -> Vec<TypeError> {
    let mut errors = Vec::new();
    let mut conflicts: Vec<(&str, &str)> = Vec::new();

    for field in fields {
        let value = attributes.get(&field.name);
        if field.required && value.is_none() && field.default.is_none() {
            errors.push(TypeError::MissingRequired {
                name: field.name.clone(),
            });
        }
        if value.is_some() {
            for other in &field.conflicts_with {
                if !attributes.contains_key(other) {
                    continue;
                }
                let pair = if field.name.as_str() < other.as_str() {
                    (field.name.as_str(), other.as_str())
                } else {
                    (other.as_str(), field.name.as_str())
                };
                if !conflicts.contains(&pair) {
                    conflicts.push(pair);
                }
            }
        }
    }

    for (name, other) in conflicts {
        errors.push(TypeError::Conflict {
            name: name.to_string(),
            other: other.to_string(),
        });
    }

    for (name, value) in attributes {
        match fields.iter().find(|f| &f.name == name) {
            Some(field) if !field.is_settable() => {
                errors.push(TypeError::ComputedAttribute { name: name.clone() });
            }
            Some(field) => {
                if let Err(e) = field.attr_type.validate(value) {
                    errors.push(TypeError::AttributeError {
                        name: name.clone(),
                        inner: Box::new(e),
                    });
                }
            }
            None => errors.push(TypeError::UnknownAttribute { name: name.clone() }),
        }
    }

    errors
}

/// Resource schema
#[derive(Debug, Clone)]
pub struct ResourceSchema {
    pub resource_type: String,
    pub attributes: Vec<AttributeSchema>,
    pub description: Option<String>,
    /// Data sources are read-only
    pub data_source: bool,
}

impl ResourceSchema {
    pub fn new(resource_type: impl Into<String>) -> Self {
        Self {
            resource_type: resource_type.into(),
            attributes: Vec::new(),
            description: None,
            data_source: false,
        }
    }

    pub fn data_source(resource_type: impl Into<String>) -> Self {
        Self {
            data_source: true,
            ..Self::new(resource_type)
        }
    }

    pub fn attribute(mut self, schema: AttributeSchema) -> Self {
        self.attributes.retain(|a| a.name != schema.name);
        self.attributes.push(schema);
        self
    }

    pub fn with_description(mut self, desc: impl Into<String>) -> Self {
        self.description = Some(desc.into());
        self
    }

    pub fn get(&self, name: &str) -> Option<&AttributeSchema> {
        self.attributes.iter().find(|a| a.name == name)
    }

    /// Names of attributes whose change forces replacement
    pub fn force_new_attributes(&self) -> impl Iterator<Item = &str> {
        self.attributes
            .iter()
            .filter(|a| a.force_new)
            .map(|a| a.name.as_str())
    }

    /// Whether an attribute is masked in output
    pub fn is_sensitive(&self, name: &str) -> bool {
        self.get(name).is_some_and(|a| a.sensitive)
    }

    /// Names of attributes the API never returns
    pub fn write_only_attributes(&self) -> impl Iterator<Item = &str> {
        self.attributes
            .iter()
            .filter(|a| a.write_only)
            .map(|a| a.name.as_str())
    }

    /// Validate resource attributes
    pub fn validate(&self, attributes: &HashMap<String, Value>) -> Result<(), Vec<TypeError>> {
        let errors = validate_fields(&self.attributes, attributes);
        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Fill in defaults for attributes that were not declared
    pub fn apply_defaults(&self, attributes: &mut HashMap<String, Value>) {
        for attr in &self.attributes {
            if let Some(default) = &attr.default {
                attributes
                    .entry(attr.name.clone())
                    .or_insert_with(|| default.clone());
            }
        }
    }
}

/// Helper functions for common types
pub mod types {
    use super::*;

    /// Positive integer type
    pub fn positive_int() -> AttributeType {
        AttributeType::Custom {
            name: "PositiveInt".to_string(),
            base: Box::new(AttributeType::Int),
            validate: |value| {
                if let Value::Int(n) = value {
                    if *n > 0 {
                        Ok(())
                    } else {
                        Err("Value must be positive".to_string())
                    }
                } else {
                    Err("Expected integer".to_string())
                }
            },
        }
    }

    /// TCP port type (1-65535)
    pub fn port() -> AttributeType {
        AttributeType::Custom {
            name: "Port".to_string(),
            base: Box::new(AttributeType::Int),
            validate: |value| match value {
                Value::Int(n) if (1..=65535).contains(n) => Ok(()),
                Value::Int(n) => Err(format!("Port {} out of range 1-65535", n)),
                _ => Err("Expected integer".to_string()),
            },
        }
    }

    /// Duration string such as "30s", "10m" or "1h"
    pub fn duration() -> AttributeType {
        AttributeType::Custom {
            name: "Duration".to_string(),
            base: Box::new(AttributeType::String),
            validate: |value| match value {
                Value::String(s) => crate::timeouts::parse_duration(s).map(|_| ()),
                _ => Err("Expected string".to_string()),
            },
        }
    }

    /// Non-zero duration string
    pub fn timeout() -> AttributeType {
        AttributeType::Custom {
            name: "Timeout".to_string(),
            base: Box::new(AttributeType::String),
            validate: |value| match value {
                Value::String(s) => match crate::timeouts::parse_duration(s)? {
                    d if d.is_zero() => Err("Timeout must be greater than zero".to_string()),
                    _ => Ok(()),
                },
                _ => Err("Expected string".to_string()),
            },
        }
    }

    /// `timeouts { create, update, delete }` block
    pub fn timeouts() -> AttributeType {
        AttributeType::Block(vec![
            AttributeSchema::new("create", timeout()),
            AttributeSchema::new("update", timeout()),
            AttributeSchema::new("delete", timeout()),
        ])
    }

    /// List of nested blocks
    pub fn block_list(fields: Vec<AttributeSchema>) -> AttributeType {
        AttributeType::List(Box::new(AttributeType::Block(fields)))
    }

    /// List of strings
    pub fn string_list() -> AttributeType {
        AttributeType::List(Box::new(AttributeType::String))
    }

    /// IPv4 address (e.g., "10.0.0.12")
    pub fn ipv4() -> AttributeType {
        AttributeType::Custom {
            name: "Ipv4".to_string(),
            base: Box::new(AttributeType::String),
            validate: |value| {
                if let Value::String(s) = value {
                    validate_ipv4(s)
                } else {
                    Err("Expected string".to_string())
                }
            },
        }
    }
}

/// Validate IPv4 address format (e.g., "10.0.0.12")
pub fn validate_ipv4(ip: &str) -> Result<(), String> {
    let octets: Vec<&str> = ip.split('.').collect();
    if octets.len() != 4 {
        return Err(format!("Invalid IP address '{}': expected 4 octets", ip));
    }

    for octet in &octets {
        if octet.parse::<u8>().is_err() {
            return Err(format!(
                "Invalid octet '{}' in IP address: must be 0-255",
                octet
            ));
        }
    }

    Ok(())
}
