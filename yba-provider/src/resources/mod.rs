//! CRUD handlers for YBA resources and data sources
//!
//! Each submodule adds `create_*`, `read_*`, `update_*` and `delete_*`
//! methods to [`YbaProvider`](crate::provider::YbaProvider). Handlers turn
//! declared attributes into API bodies and API responses back into
//! attribute maps; write-only attributes are carried over by the provider.

pub mod backups;
pub mod cloud_provider;
pub mod data_sources;
pub mod node_instance;
pub mod onprem_provider;
mod regions;
pub mod restore;
pub mod universe;
pub mod user;

use std::collections::HashMap;
use std::time::Duration;

use yba_core::provider::{ProviderError, ProviderResult};
use yba_core::resource::{ResourceId, State, Value};
use yba_core::timeouts::{Timeouts, parse_duration};

/// Typed access to a declared attribute map
///
/// Errors name the full attribute path, e.g. `regions[0].zones[1].code`.
#[derive(Clone)]
pub(crate) struct Attrs<'a> {
    id: &'a ResourceId,
    map: &'a HashMap<String, Value>,
    path: String,
}

impl<'a> Attrs<'a> {
    pub(crate) fn new(id: &'a ResourceId, map: &'a HashMap<String, Value>) -> Self {
        Self {
            id,
            map,
            path: String::new(),
        }
    }

    fn field(&self, key: &str) -> String {
        if self.path.is_empty() {
            key.to_string()
        } else {
            format!("{}.{}", self.path, key)
        }
    }

    pub(crate) fn error(&self, message: impl Into<String>) -> ProviderError {
        ProviderError::validation(message).for_resource(self.id.clone())
    }

    fn invalid(&self, key: &str, expected: &str) -> ProviderError {
        self.error(format!("'{}' must be {}", self.field(key), expected))
    }

    pub(crate) fn value(&self, key: &str) -> ProviderResult<Option<&'a Value>> {
        match self.map.get(key) {
            Some(Value::ResourceRef(address, attr)) => Err(self.error(format!(
                "'{}' references {}.{} which has not been resolved",
                self.field(key),
                address,
                attr
            ))),
            other => Ok(other),
        }
    }

    pub(crate) fn contains(&self, key: &str) -> bool {
        self.map.contains_key(key)
    }

    pub(crate) fn opt_str(&self, key: &str) -> ProviderResult<Option<String>> {
        match self.value(key)? {
            None => Ok(None),
            Some(Value::String(s)) => Ok(Some(s.clone())),
            Some(_) => Err(self.invalid(key, "a string")),
        }
    }

    pub(crate) fn str(&self, key: &str) -> ProviderResult<String> {
        self.opt_str(key)?
            .ok_or_else(|| self.error(format!("'{}' is required", self.field(key))))
    }

    pub(crate) fn opt_int(&self, key: &str) -> ProviderResult<Option<i64>> {
        match self.value(key)? {
            None => Ok(None),
            Some(Value::Int(n)) => Ok(Some(*n)),
            Some(_) => Err(self.invalid(key, "an integer")),
        }
    }

    pub(crate) fn int(&self, key: &str) -> ProviderResult<i64> {
        self.opt_int(key)?
            .ok_or_else(|| self.error(format!("'{}' is required", self.field(key))))
    }

    pub(crate) fn int_or(&self, key: &str, default: i64) -> ProviderResult<i64> {
        Ok(self.opt_int(key)?.unwrap_or(default))
    }

    pub(crate) fn opt_float(&self, key: &str) -> ProviderResult<Option<f64>> {
        match self.value(key)? {
            None => Ok(None),
            Some(v) => v.as_float().map(Some).ok_or_else(|| self.invalid(key, "a number")),
        }
    }

    pub(crate) fn opt_bool(&self, key: &str) -> ProviderResult<Option<bool>> {
        match self.value(key)? {
            None => Ok(None),
            Some(Value::Bool(b)) => Ok(Some(*b)),
            Some(_) => Err(self.invalid(key, "a boolean")),
        }
    }

    pub(crate) fn bool_or(&self, key: &str, default: bool) -> ProviderResult<bool> {
        Ok(self.opt_bool(key)?.unwrap_or(default))
    }

    pub(crate) fn string_list(&self, key: &str) -> ProviderResult<Vec<String>> {
        let Some(value) = self.value(key)? else {
            return Ok(Vec::new());
        };
        let items = value
            .as_list()
            .ok_or_else(|| self.invalid(key, "a list of strings"))?;
        items
            .iter()
            .enumerate()
            .map(|(i, item)| match item {
                Value::String(s) => Ok(s.clone()),
                Value::ResourceRef(address, attr) => Err(self.error(format!(
                    "'{}[{}]' references {}.{} which has not been resolved",
                    self.field(key),
                    i,
                    address,
                    attr
                ))),
                _ => Err(self.invalid(&format!("{}[{}]", key, i), "a string")),
            })
            .collect()
    }

    /// Nested blocks of a block list
    pub(crate) fn blocks(&self, key: &str) -> ProviderResult<Vec<Attrs<'a>>> {
        let Some(value) = self.value(key)? else {
            return Ok(Vec::new());
        };
        let items = value
            .as_list()
            .ok_or_else(|| self.invalid(key, "a list of blocks"))?;
        items
            .iter()
            .enumerate()
            .map(|(i, item)| {
                let map = item
                    .as_map()
                    .ok_or_else(|| self.invalid(&format!("{}[{}]", key, i), "a block"))?;
                Ok(Attrs {
                    id: self.id,
                    map,
                    path: self.field(&format!("{}[{}]", key, i)),
                })
            })
            .collect()
    }

    pub(crate) fn block(&self, key: &str) -> ProviderResult<Option<Attrs<'a>>> {
        match self.value(key)? {
            None => Ok(None),
            Some(Value::Map(map)) => Ok(Some(Attrs {
                id: self.id,
                map,
                path: self.field(key),
            })),
            Some(_) => Err(self.invalid(key, "a block")),
        }
    }

    pub(crate) fn opt_duration(&self, key: &str) -> ProviderResult<Option<Duration>> {
        self.opt_str(key)?
            .map(|s| {
                parse_duration(&s).map_err(|e| self.error(format!("'{}': {}", self.field(key), e)))
            })
            .transpose()
    }

    /// Per-operation timeouts, `default` for any not declared
    pub(crate) fn timeouts(&self, default: Duration) -> ProviderResult<Timeouts> {
        Timeouts::uniform(default)
            .with_overrides(self.map)
            .map_err(|e| self.error(e))
    }
}

/// State of an existing remote object; `id` is always part of the attributes
pub(crate) fn existing(
    id: &ResourceId,
    uuid: &str,
    mut attributes: HashMap<String, Value>,
) -> State {
    attributes.insert("id".to_string(), Value::String(uuid.to_string()));
    State::existing(id.clone(), attributes).with_identifier(uuid)
}

/// Remote identifier recorded in a prior state
pub(crate) fn identifier(state: &State) -> ProviderResult<&str> {
    state.identifier.as_deref().ok_or_else(|| {
        ProviderError::new("No remote identifier recorded in state").for_resource(state.id.clone())
    })
}

pub(crate) fn string(s: impl Into<String>) -> Value {
    Value::String(s.into())
}

pub(crate) fn string_list(items: impl IntoIterator<Item = impl Into<String>>) -> Value {
    Value::List(items.into_iter().map(|s| Value::String(s.into())).collect())
}

pub(crate) fn insert_opt(attributes: &mut HashMap<String, Value>, key: &str, value: Option<Value>) {
    if let Some(value) = value {
        attributes.insert(key.to_string(), value);
    }
}

/// Declared attributes whose value differs from the recorded state
pub(crate) fn changed_attributes(from: &State, to: &HashMap<String, Value>) -> Vec<String> {
    let mut changed: Vec<String> = to
        .iter()
        .filter(|(key, _)| key.as_str() != "timeouts")
        .filter(|(key, value)| {
            !from
                .attributes
                .get(key.as_str())
                .is_some_and(|current| value.is_satisfied_by(current))
        })
        .map(|(key, _)| key.clone())
        .collect();
    changed.sort();
    changed
}
