//! Resource - Representing resources and their state

use std::collections::HashMap;

/// Unique identifier for a resource
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResourceId {
    /// Resource type (e.g., "yba_universe", "yba_user")
    pub resource_type: String,
    /// Resource name (identifier specified in the manifest)
    pub name: String,
}

impl ResourceId {
    pub fn new(resource_type: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            resource_type: resource_type.into(),
            name: name.into(),
        }
    }

    /// Address used by references, e.g. `yba_onprem_provider.dc1`
    pub fn address(&self) -> String {
        format!("{}.{}", self.resource_type, self.name)
    }
}

impl std::fmt::Display for ResourceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.resource_type, self.name)
    }
}

/// Attribute value of a resource
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    String(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    List(Vec<Value>),
    Map(HashMap<String, Value>),
    /// Reference to another resource's attribute (address, attribute_name)
    ///
    /// The address has the form `resource_type.name`.
    ResourceRef(String, String),
}

impl Value {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Float(n) => Some(*n),
            Value::Int(n) => Some(*n as f64),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&HashMap<String, Value>> {
        match self {
            Value::Map(map) => Some(map),
            _ => None,
        }
    }

    /// Whether the declared value `self` is satisfied by an observed value.
    ///
    /// Maps only compare the keys that were declared, so attributes the remote
    /// side fills in (UUIDs, computed flags) never show up as drift.
    pub fn is_satisfied_by(&self, observed: &Value) -> bool {
        match (self, observed) {
            (Value::Map(declared), Value::Map(observed)) => declared
                .iter()
                .all(|(k, v)| observed.get(k).is_some_and(|o| v.is_satisfied_by(o))),
            (Value::List(declared), Value::List(observed)) => {
                declared.len() == observed.len()
                    && declared
                        .iter()
                        .zip(observed)
                        .all(|(d, o)| d.is_satisfied_by(o))
            }
            (Value::Int(a), Value::Float(b)) | (Value::Float(b), Value::Int(a)) => {
                (*a as f64) == *b
            }
            (a, b) => a == b,
        }
    }

    /// Convert to a JSON value (used by the state file)
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Value::String(s) => serde_json::Value::String(s.clone()),
            Value::Int(n) => serde_json::Value::from(*n),
            Value::Float(n) => serde_json::Value::from(*n),
            Value::Bool(b) => serde_json::Value::Bool(*b),
            Value::List(items) => {
                serde_json::Value::Array(items.iter().map(Value::to_json).collect())
            }
            Value::Map(map) => serde_json::Value::Object(
                map.iter().map(|(k, v)| (k.clone(), v.to_json())).collect(),
            ),
            Value::ResourceRef(address, attr) => {
                serde_json::Value::String(format!("${{{}.{}}}", address, attr))
            }
        }
    }

    /// Convert from a JSON value
    ///
    /// Strings of the form `${type.name.attribute}` become references.
    /// `null` yields `None`.
    pub fn from_json(json: &serde_json::Value) -> Option<Value> {
        match json {
            serde_json::Value::Null => None,
            serde_json::Value::Bool(b) => Some(Value::Bool(*b)),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Some(Value::Int(i)),
                None => n.as_f64().map(Value::Float),
            },
            serde_json::Value::String(s) => {
                Some(parse_reference(s).unwrap_or_else(|| Value::String(s.clone())))
            }
            serde_json::Value::Array(items) => Some(Value::List(
                items.iter().filter_map(Value::from_json).collect(),
            )),
            serde_json::Value::Object(map) => Some(Value::Map(
                map.iter()
                    .filter_map(|(k, v)| Value::from_json(v).map(|v| (k.clone(), v)))
                    .collect(),
            )),
        }
    }
}

/// Parse `${yba_onprem_provider.dc1.id}` into a reference
fn parse_reference(s: &str) -> Option<Value> {
    let inner = s.strip_prefix("${")?.strip_suffix('}')?;
    let (address, attr) = inner.rsplit_once('.')?;
    if !address.contains('.') || attr.is_empty() {
        return None;
    }
    Some(Value::ResourceRef(address.to_string(), attr.to_string()))
}

/// Desired state declared in the manifest
#[derive(Debug, Clone, PartialEq)]
pub struct Resource {
    pub id: ResourceId,
    pub attributes: HashMap<String, Value>,
    /// If true, this is a data source (read-only) that won't be modified
    pub read_only: bool,
}

impl Resource {
    pub fn new(resource_type: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: ResourceId::new(resource_type, name),
            attributes: HashMap::new(),
            read_only: false,
        }
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: Value) -> Self {
        self.attributes.insert(key.into(), value);
        self
    }

    pub fn with_read_only(mut self, read_only: bool) -> Self {
        self.read_only = read_only;
        self
    }

    /// Returns true if this resource is a data source (read-only)
    pub fn is_data_source(&self) -> bool {
        self.read_only
    }

    /// References to other resources, as `(address, attribute)` pairs
    pub fn references(&self) -> Vec<(String, String)> {
        fn collect(value: &Value, out: &mut Vec<(String, String)>) {
            match value {
                Value::ResourceRef(address, attr) => out.push((address.clone(), attr.clone())),
                Value::List(items) => items.iter().for_each(|v| collect(v, out)),
                Value::Map(map) => map.values().for_each(|v| collect(v, out)),
                _ => {}
            }
        }

        let mut refs = Vec::new();
        for value in self.attributes.values() {
            collect(value, &mut refs);
        }
        refs
    }
}

/// Current state fetched from YugabyteDB Anywhere
#[derive(Debug, Clone, PartialEq)]
pub struct State {
    pub id: ResourceId,
    /// Remote identifier (usually a UUID assigned by YBA)
    pub identifier: Option<String>,
    pub attributes: HashMap<String, Value>,
    /// Whether this state exists
    pub exists: bool,
}

impl State {
    pub fn not_found(id: ResourceId) -> Self {
        Self {
            id,
            identifier: None,
            attributes: HashMap::new(),
            exists: false,
        }
    }

    pub fn existing(id: ResourceId, attributes: HashMap<String, Value>) -> Self {
        Self {
            id,
            identifier: None,
            attributes,
            exists: true,
        }
    }

    pub fn with_identifier(mut self, identifier: impl Into<String>) -> Self {
        self.identifier = Some(identifier.into());
        self
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).and_then(Value::as_str)
    }
}
