//! JSON manifest: provider settings and declared resources
//!
//! ```json
//! {
//!   "provider": { "host": "yba.example.com" },
//!   "resources": [
//!     { "type": "yba_onprem_provider", "name": "dc1", "attributes": { ... } },
//!     { "type": "yba_release_version", "name": "latest", "data": true, "attributes": {} }
//!   ]
//! }
//! ```
//!
//! A string `"${type.name.attribute}"` refers to an attribute of another
//! resource and is resolved once that resource exists.

use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::Path;

use serde::Deserialize;
use serde_json::{Map, Value as JsonValue};

use yba_core::resource::{Resource, Value};
use yba_core::schema::ResourceSchema;

#[derive(Deserialize)]
struct RawManifest {
    #[serde(default)]
    provider: Map<String, JsonValue>,
    #[serde(default)]
    resources: Vec<RawResource>,
}

#[derive(Deserialize)]
struct RawResource {
    #[serde(rename = "type")]
    resource_type: String,
    name: String,
    #[serde(default)]
    attributes: Map<String, JsonValue>,
    #[serde(default)]
    data: bool,
}

#[derive(Debug)]
pub struct Manifest {
    pub provider: HashMap<String, Value>,
    pub resources: Vec<Resource>,
}

fn to_values(map: Map<String, JsonValue>) -> HashMap<String, Value> {
    map.iter()
        .filter_map(|(k, v)| Value::from_json(v).map(|v| (k.clone(), v)))
        .collect()
}

impl Manifest {
    pub fn load(path: &Path) -> Result<Self, String> {
        let content = fs::read_to_string(path)
            .map_err(|e| format!("Failed to read {}: {}", path.display(), e))?;
        Self::parse(&content).map_err(|e| format!("{}: {}", path.display(), e))
    }

    pub fn parse(content: &str) -> Result<Self, String> {
        let raw: RawManifest =
            serde_json::from_str(content).map_err(|e| format!("Parse error: {}", e))?;

        let mut seen = HashSet::new();
        let mut resources = Vec::with_capacity(raw.resources.len());
        for r in raw.resources {
            let resource = Resource {
                attributes: to_values(r.attributes),
                ..Resource::new(r.resource_type, r.name)
            }
            .with_read_only(r.data);
            if !seen.insert(resource.id.clone()) {
                return Err(format!("Duplicate resource {}", resource.id));
            }
            resources.push(resource);
        }

        Ok(Self {
            provider: to_values(raw.provider),
            resources,
        })
    }
}

/// Schema of every resource type, keyed by type name
pub fn schema_map(schemas: Vec<ResourceSchema>) -> HashMap<String, ResourceSchema> {
    schemas
        .into_iter()
        .map(|s| (s.resource_type.clone(), s))
        .collect()
}

/// Fill in schema defaults for attributes left out
pub fn apply_defaults(resources: &mut [Resource], schemas: &HashMap<String, ResourceSchema>) {
    for resource in resources {
        if let Some(schema) = schemas.get(&resource.id.resource_type) {
            schema.apply_defaults(&mut resource.attributes);
        }
    }
}

/// Check every resource against its schema and every reference against the manifest
pub fn validate(
    resources: &[Resource],
    schemas: &HashMap<String, ResourceSchema>,
) -> Result<(), String> {
    let addresses: HashSet<String> = resources.iter().map(|r| r.id.address()).collect();
    let mut errors = Vec::new();

    for resource in resources {
        let Some(schema) = schemas.get(&resource.id.resource_type) else {
            errors.push(format!("{}: unknown resource type", resource.id));
            continue;
        };
        if schema.data_source != resource.is_data_source() {
            let kind = &resource.id.resource_type;
            errors.push(if schema.data_source {
                format!("{}: {} is a data source; set \"data\": true", resource.id, kind)
            } else {
                format!("{}: {} is not a data source", resource.id, kind)
            });
        }
        if let Err(type_errors) = schema.validate(&resource.attributes) {
            errors.extend(type_errors.into_iter().map(|e| format!("{}: {}", resource.id, e)));
        }
        for (address, attr) in resource.references() {
            if !addresses.contains(&address) {
                errors.push(format!(
                    "{}: reference to undeclared resource {}.{}",
                    resource.id, address, attr
                ));
            }
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(format!("Validation failed:\n  {}", errors.join("\n  ")))
    }
}

/// Order resources so each comes after the resources it references
pub fn sort_by_references(resources: &[Resource]) -> Result<Vec<Resource>, String> {
    let by_address: HashMap<String, &Resource> =
        resources.iter().map(|r| (r.id.address(), r)).collect();

    fn visit<'a>(
        resource: &'a Resource,
        by_address: &HashMap<String, &'a Resource>,
        visited: &mut HashSet<String>,
        visiting: &mut Vec<String>,
        sorted: &mut Vec<Resource>,
    ) -> Result<(), String> {
        let address = resource.id.address();
        if visited.contains(&address) {
            return Ok(());
        }
        if visiting.contains(&address) {
            visiting.push(address);
            return Err(format!("Circular reference: {}", visiting.join(" -> ")));
        }

        visiting.push(address.clone());
        let mut deps: Vec<String> = resource.references().into_iter().map(|(a, _)| a).collect();
        deps.sort();
        deps.dedup();
        for dep in deps {
            if let Some(dep_resource) = by_address.get(&dep) {
                visit(dep_resource, by_address, visited, visiting, sorted)?;
            }
        }
        visiting.pop();
        visited.insert(address);
        sorted.push(resource.clone());
        Ok(())
    }

    let mut sorted = Vec::with_capacity(resources.len());
    let mut visited = HashSet::new();
    let mut visiting = Vec::new();
    for resource in resources {
        visit(resource, &by_address, &mut visited, &mut visiting, &mut sorted)?;
    }
    Ok(sorted)
}

/// Replace references whose target attribute is known
pub fn resolve_references(
    resource: &Resource,
    known: &HashMap<String, HashMap<String, Value>>,
) -> Resource {
    fn resolve(value: &Value, known: &HashMap<String, HashMap<String, Value>>) -> Value {
        match value {
            Value::ResourceRef(address, attr) => known
                .get(address)
                .and_then(|attrs| attrs.get(attr))
                .cloned()
                .unwrap_or_else(|| value.clone()),
            Value::List(items) => Value::List(items.iter().map(|v| resolve(v, known)).collect()),
            Value::Map(map) => Value::Map(
                map.iter()
                    .map(|(k, v)| (k.clone(), resolve(v, known)))
                    .collect(),
            ),
            other => other.clone(),
        }
    }

    let mut resolved = resource.clone();
    resolved.attributes = resource
        .attributes
        .iter()
        .map(|(k, v)| (k.clone(), resolve(v, known)))
        .collect();
    resolved
}
