//! Interpreter - Execute Effects using a Provider
//!
//! Each Effect is run to completion by the Provider. This is where side
//! effects actually occur.

use tracing::info;

use crate::effect::Effect;
use crate::provider::{Provider, ProviderResult};
use crate::resource::State;

/// Result of executing each Effect
#[derive(Debug)]
pub enum EffectOutcome {
    /// Read succeeded
    Read { state: State },
    /// Create succeeded
    Created { state: State },
    /// Update succeeded
    Updated { state: State },
    /// Delete followed by create succeeded
    Replaced { state: State },
    /// Delete succeeded
    Deleted,
}

impl EffectOutcome {
    /// The resulting state, if the effect produced one
    pub fn state(&self) -> Option<&State> {
        match self {
            EffectOutcome::Read { state }
            | EffectOutcome::Created { state }
            | EffectOutcome::Updated { state }
            | EffectOutcome::Replaced { state } => Some(state),
            EffectOutcome::Deleted => None,
        }
    }
}

/// Interpreter that executes Effects using a Provider
pub struct Interpreter<P: Provider> {
    provider: P,
}

impl<P: Provider> Interpreter<P> {
    pub fn new(provider: P) -> Self {
        Self { provider }
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// Execute a single Effect
    pub async fn execute(&self, effect: &Effect) -> ProviderResult<EffectOutcome> {
        match effect {
            Effect::Read(resource) => {
                let state = self.provider.read_data_source(resource).await?;
                Ok(EffectOutcome::Read { state })
            }
            Effect::Create(resource) => {
                let state = self.provider.create(resource).await?;
                Ok(EffectOutcome::Created { state })
            }
            Effect::Update { id, from, to } => {
                let state = self.provider.update(id, from, to).await?;
                Ok(EffectOutcome::Updated { state })
            }
            Effect::Replace { id, from, to } => {
                info!(resource = %id, "replacing resource");
                self.provider.delete(from).await?;
                let state = self.provider.create(to).await?;
                Ok(EffectOutcome::Replaced { state })
            }
            Effect::Delete(state) => {
                self.provider.delete(state).await?;
                Ok(EffectOutcome::Deleted)
            }
        }
    }
}
