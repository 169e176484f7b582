//! Differ - Compare desired state with current state to generate a Plan
//!
//! Compares the "desired state" declared in the manifest with the "current
//! state" fetched from the Provider, and generates the Effects needed.

use std::collections::HashMap;

use crate::effect::Effect;
use crate::plan::Plan;
use crate::resource::{Resource, ResourceId, State, Value};
use crate::schema::ResourceSchema;

/// Result of a diff operation
#[derive(Debug, Clone, PartialEq)]
pub enum Diff {
    /// Resource does not exist -> needs creation
    Create(Resource),
    /// Resource exists with differences -> needs update
    Update {
        id: ResourceId,
        from: State,
        to: Resource,
        changed_attributes: Vec<String>,
    },
    /// A force-new attribute differs -> delete and recreate
    Replace {
        id: ResourceId,
        from: State,
        to: Resource,
        changed_attributes: Vec<String>,
    },
    /// Resource exists with no differences -> no action needed
    NoChange(ResourceId),
}

impl Diff {
    /// Returns whether this Diff involves a change
    pub fn is_change(&self) -> bool {
        !matches!(self, Diff::NoChange(_))
    }
}

/// Compare desired state with current state to compute a Diff
pub fn diff(desired: &Resource, current: &State, schema: Option<&ResourceSchema>) -> Diff {
    if !current.exists {
        return Diff::Create(desired.clone());
    }

    let changed = find_changed_attributes(&desired.attributes, &current.attributes);

    if changed.is_empty() {
        return Diff::NoChange(desired.id.clone());
    }

    let forces_replacement = schema.is_some_and(|s| {
        s.force_new_attributes()
            .any(|name| changed.iter().any(|c| c == name))
    });

    if forces_replacement {
        Diff::Replace {
            id: desired.id.clone(),
            from: current.clone(),
            to: desired.clone(),
            changed_attributes: changed,
        }
    } else {
        Diff::Update {
            id: desired.id.clone(),
            from: current.clone(),
            to: desired.clone(),
            changed_attributes: changed,
        }
    }
}

/// Find changed attributes between desired and current state
///
/// `timeouts` only tunes how long operations wait and is never drift.
fn find_changed_attributes(
    desired: &HashMap<String, Value>,
    current: &HashMap<String, Value>,
) -> Vec<String> {
    let mut changed = Vec::new();

    for (key, desired_value) in desired {
        if key.starts_with('_') || key == "timeouts" {
            continue;
        }

        match current.get(key) {
            Some(current_value) if desired_value.is_satisfied_by(current_value) => {}
            _ => changed.push(key.clone()),
        }
    }

    changed.sort();
    changed
}

/// Compute Diffs for desired resources and generate a Plan
///
/// `orphans` are recorded states with no desired counterpart; they are
/// deleted in reverse order after all other effects.
pub fn create_plan(
    desired: &[Resource],
    current_states: &HashMap<ResourceId, State>,
    schemas: &HashMap<String, ResourceSchema>,
    orphans: &[State],
) -> Plan {
    let mut plan = Plan::new();

    for resource in desired {
        if resource.is_data_source() {
            plan.add(Effect::Read(resource.clone()));
            continue;
        }

        let current = current_states
            .get(&resource.id)
            .cloned()
            .unwrap_or_else(|| State::not_found(resource.id.clone()));

        match diff(resource, &current, schemas.get(&resource.id.resource_type)) {
            Diff::Create(r) => plan.add(Effect::Create(r)),
            Diff::Update { id, from, to, .. } => plan.add(Effect::Update { id, from, to }),
            Diff::Replace { id, from, to, .. } => plan.add(Effect::Replace { id, from, to }),
            Diff::NoChange(_) => {}
        }
    }

    for state in orphans.iter().rev() {
        if state.exists {
            plan.add(Effect::Delete(state.clone()));
        }
    }

    plan
}
