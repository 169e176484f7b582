//! Effect - A single side effect to be performed against the control plane

use crate::resource::{Resource, ResourceId, State};

/// An operation on one resource
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// Read a data source
    Read(Resource),
    Create(Resource),
    Update {
        id: ResourceId,
        from: State,
        to: Resource,
    },
    /// A force-new attribute changed: delete, then create
    Replace {
        id: ResourceId,
        from: State,
        to: Resource,
    },
    Delete(State),
}

impl Effect {
    /// Whether this Effect changes remote state
    pub fn is_mutating(&self) -> bool {
        !matches!(self, Effect::Read(_))
    }

    pub fn resource_id(&self) -> &ResourceId {
        match self {
            Effect::Read(r) | Effect::Create(r) => &r.id,
            Effect::Update { id, .. } | Effect::Replace { id, .. } => id,
            Effect::Delete(state) => &state.id,
        }
    }
}
