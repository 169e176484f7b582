//! YBA Provider
//!
//! Routes each operation to the handler of its resource type and applies
//! the rules every handler shares: not-found reads become absent states,
//! write-only attributes survive in state, and errors name the resource.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tracing::info;
use yba_core::provider::{BoxFuture, Provider, ProviderError, ProviderResult};
use yba_core::resource::{Resource, ResourceId, State, Value};
use yba_core::schema::ResourceSchema;

use crate::api::YbaApi;
use crate::client::YbaClient;
use crate::config::ProviderConfig;
use crate::error::Result;
use crate::models::YbaTask;
use crate::schemas::{self, all_schemas};
use crate::tasks;

/// Provider backed by one YugabyteDB Anywhere instance
pub struct YbaProvider {
    pub(crate) api: Arc<dyn YbaApi>,
    poll_interval: Duration,
}

impl YbaProvider {
    /// Connect to the YBA instance described by `config`
    pub async fn configure(config: ProviderConfig) -> Result<Self> {
        let client = YbaClient::connect(&config).await?;
        Ok(Self::with_api(Arc::new(client), config.poll_interval))
    }

    /// Create with a specific API implementation (for testing)
    pub fn with_api(api: Arc<dyn YbaApi>, poll_interval: Duration) -> Self {
        Self { api, poll_interval }
    }

    /// Wait for the task a mutating call returned
    pub(crate) async fn wait(&self, task: &YbaTask, timeout: Duration) -> ProviderResult<()> {
        tasks::wait_for_response(self.api.as_ref(), task, timeout, self.poll_interval).await
    }

    async fn read_resource(&self, id: &ResourceId, prior: &State) -> ProviderResult<State> {
        if prior.identifier.is_none() {
            return Ok(State::not_found(id.clone()));
        }
        match id.resource_type.as_str() {
            schemas::CLOUD_PROVIDER => self.read_cloud_provider(id, prior).await,
            schemas::ONPREM_PROVIDER => self.read_onprem_provider(id, prior).await,
            schemas::UNIVERSE => self.read_universe(id, prior).await,
            schemas::NODE_INSTANCE => self.read_node_instance(id, prior).await,
            schemas::USER => self.read_user(id, prior).await,
            schemas::BACKUPS => self.read_backups(id, prior).await,
            schemas::RESTORE => Ok(self.read_restore(id, prior)),
            other => Err(unknown_type(other)),
        }
    }

    async fn create_resource(&self, resource: &Resource) -> ProviderResult<State> {
        match resource.id.resource_type.as_str() {
            schemas::CLOUD_PROVIDER => self.create_cloud_provider(resource).await,
            schemas::ONPREM_PROVIDER => self.create_onprem_provider(resource).await,
            schemas::UNIVERSE => self.create_universe(resource).await,
            schemas::NODE_INSTANCE => self.create_node_instance(resource).await,
            schemas::USER => self.create_user(resource).await,
            schemas::BACKUPS => self.create_backups(resource).await,
            schemas::RESTORE => self.create_restore(resource).await,
            other => Err(unknown_type(other)),
        }
    }

    async fn update_resource(&self, from: &State, to: &Resource) -> ProviderResult<State> {
        match to.id.resource_type.as_str() {
            schemas::CLOUD_PROVIDER => self.update_cloud_provider(from, to).await,
            schemas::ONPREM_PROVIDER => self.update_onprem_provider(from, to).await,
            schemas::UNIVERSE => self.update_universe(from, to).await,
            schemas::USER => self.update_user(from, to).await,
            schemas::BACKUPS => self.update_backups(from, to).await,
            schemas::NODE_INSTANCE | schemas::RESTORE => Err(ProviderError::validation(format!(
                "{} cannot be updated in place",
                to.id.resource_type
            ))),
            other => Err(unknown_type(other)),
        }
    }

    async fn delete_resource(&self, state: &State) -> ProviderResult<()> {
        let result = match state.id.resource_type.as_str() {
            schemas::CLOUD_PROVIDER => self.delete_cloud_provider(state).await,
            schemas::ONPREM_PROVIDER => self.delete_onprem_provider(state).await,
            schemas::UNIVERSE => self.delete_universe(state).await,
            schemas::NODE_INSTANCE => self.delete_node_instance(state).await,
            schemas::USER => self.delete_user(state).await,
            schemas::BACKUPS => self.delete_backups(state).await,
            schemas::RESTORE => {
                self.delete_restore(state);
                Ok(())
            }
            other => Err(unknown_type(other)),
        };
        match result {
            Err(e) if e.is_not_found() => {
                info!(resource = %state.id.address(), "already deleted");
                Ok(())
            }
            other => other,
        }
    }

    async fn read_data(&self, resource: &Resource) -> ProviderResult<State> {
        match resource.id.resource_type.as_str() {
            schemas::PROVIDER_KEY => self.read_provider_key(resource).await,
            schemas::RELEASE_VERSION => self.read_release_version(resource).await,
            schemas::STORAGE_CONFIGS => self.read_storage_configs(resource).await,
            other => Err(unknown_type(other)),
        }
    }
}

fn unknown_type(resource_type: &str) -> ProviderError {
    ProviderError::new(format!("Unknown resource type: {}", resource_type))
}

fn tag(err: ProviderError, id: &ResourceId) -> ProviderError {
    if err.resource_id.is_some() {
        err
    } else {
        err.for_resource(id.clone())
    }
}

/// Copy write-only attributes from `source`; the API never returns them
fn carry_write_only(mut state: State, source: &HashMap<String, Value>) -> State {
    if !state.exists {
        return state;
    }
    let schema = all_schemas()
        .into_iter()
        .find(|s| s.resource_type == state.id.resource_type);
    if let Some(schema) = schema {
        for name in schema.write_only_attributes() {
            if let Some(value) = source.get(name)
                && !matches!(value, Value::ResourceRef(..))
            {
                state.attributes.insert(name.to_string(), value.clone());
            }
        }
    }
    state
}

impl Provider for YbaProvider {
    fn name(&self) -> &'static str {
        "yba"
    }

    fn schemas(&self) -> Vec<ResourceSchema> {
        all_schemas()
    }

    fn read(&self, id: &ResourceId, prior: &State) -> BoxFuture<'_, ProviderResult<State>> {
        let id = id.clone();
        let prior = prior.clone();
        Box::pin(async move {
            match self.read_resource(&id, &prior).await {
                Ok(state) => Ok(carry_write_only(state, &prior.attributes)),
                Err(e) if e.is_not_found() => Ok(State::not_found(id)),
                Err(e) => Err(tag(e, &id)),
            }
        })
    }

    fn read_data_source(&self, resource: &Resource) -> BoxFuture<'_, ProviderResult<State>> {
        let resource = resource.clone();
        Box::pin(async move {
            self.read_data(&resource)
                .await
                .map_err(|e| tag(e, &resource.id))
        })
    }

    fn create(&self, resource: &Resource) -> BoxFuture<'_, ProviderResult<State>> {
        let resource = resource.clone();
        Box::pin(async move {
            self.create_resource(&resource)
                .await
                .map(|state| carry_write_only(state, &resource.attributes))
                .map_err(|e| tag(e, &resource.id))
        })
    }

    fn update(
        &self,
        id: &ResourceId,
        from: &State,
        to: &Resource,
    ) -> BoxFuture<'_, ProviderResult<State>> {
        let id = id.clone();
        let from = from.clone();
        let to = to.clone();
        Box::pin(async move {
            self.update_resource(&from, &to)
                .await
                .map(|state| carry_write_only(state, &to.attributes))
                .map_err(|e| tag(e, &id))
        })
    }

    fn delete(&self, state: &State) -> BoxFuture<'_, ProviderResult<()>> {
        let state = state.clone();
        Box::pin(async move {
            self.delete_resource(&state)
                .await
                .map_err(|e| tag(e, &state.id))
        })
    }
}
