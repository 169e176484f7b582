//! State file structures for recorded YBA objects

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use yba_core::resource::{ResourceId, State, Value};

/// The document persisted by a backend
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateFile {
    /// State file format version
    pub version: u32,
    /// Incremented on every write
    pub serial: u64,
    /// Identifies one state history; a write from another lineage is refused
    pub lineage: String,
    /// Version of the tool that last wrote this state
    pub tool_version: String,
    /// Recorded resources in creation order
    pub resources: Vec<ResourceState>,
}

impl StateFile {
    pub const CURRENT_VERSION: u32 = 1;

    pub fn new() -> Self {
        Self {
            version: Self::CURRENT_VERSION,
            serial: 0,
            lineage: uuid::Uuid::new_v4().to_string(),
            tool_version: env!("CARGO_PKG_VERSION").to_string(),
            resources: Vec::new(),
        }
    }

    /// Bump the serial before a write
    pub fn increment_serial(&mut self) {
        self.serial += 1;
        self.tool_version = env!("CARGO_PKG_VERSION").to_string();
    }

    pub fn find(&self, id: &ResourceId) -> Option<&ResourceState> {
        self.resources
            .iter()
            .find(|r| r.resource_type == id.resource_type && r.name == id.name)
    }

    /// Prior state for `id`, or an absent one when nothing is recorded
    pub fn state_of(&self, id: &ResourceId) -> State {
        self.find(id)
            .map(ResourceState::to_state)
            .unwrap_or_else(|| State::not_found(id.clone()))
    }

    /// Record `state`, replacing any entry for the same resource; absent states are removed
    pub fn record(&mut self, state: &State) {
        if !state.exists {
            self.remove(&state.id);
            return;
        }
        let entry = ResourceState::from_state(state);
        match self
            .resources
            .iter_mut()
            .find(|r| r.resource_type == entry.resource_type && r.name == entry.name)
        {
            Some(existing) => *existing = entry,
            None => self.resources.push(entry),
        }
    }

    pub fn remove(&mut self, id: &ResourceId) -> Option<ResourceState> {
        let pos = self
            .resources
            .iter()
            .position(|r| r.resource_type == id.resource_type && r.name == id.name)?;
        Some(self.resources.remove(pos))
    }
}

impl Default for StateFile {
    fn default() -> Self {
        Self::new()
    }
}

/// One recorded resource
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceState {
    pub resource_type: String,
    pub name: String,
    /// Remote UUID of the object
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identifier: Option<String>,
    pub attributes: HashMap<String, serde_json::Value>,
}

impl ResourceState {
    pub fn id(&self) -> ResourceId {
        ResourceId::new(&self.resource_type, &self.name)
    }

    pub fn from_state(state: &State) -> Self {
        Self {
            resource_type: state.id.resource_type.clone(),
            name: state.id.name.clone(),
            identifier: state.identifier.clone(),
            attributes: state
                .attributes
                .iter()
                .map(|(k, v)| (k.clone(), v.to_json()))
                .collect(),
        }
    }

    /// Attributes that cannot be represented as a value (JSON null) are dropped
    pub fn to_state(&self) -> State {
        let attributes: HashMap<String, Value> = self
            .attributes
            .iter()
            .filter_map(|(k, v)| Value::from_json(v).map(|v| (k.clone(), v)))
            .collect();
        let state = State::existing(self.id(), attributes);
        match &self.identifier {
            Some(identifier) => state.with_identifier(identifier),
            None => state,
        }
    }
}
