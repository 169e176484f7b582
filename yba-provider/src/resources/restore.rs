//! yba_restore - one-shot restore of a keyspace into a universe

use std::time::Duration;

use tracing::info;
use yba_core::provider::{ProviderError, ProviderResult};
use yba_core::resource::{Resource, ResourceId, State, Value};

use super::{Attrs, existing};
use crate::models::{BackupStorageInfo, RestoreRequest};
use crate::provider::YbaProvider;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60 * 60);

const ACTION_RESTORE: &str = "RESTORE";

fn restore_request(attrs: &Attrs<'_>) -> ProviderResult<RestoreRequest> {
    Ok(RestoreRequest {
        action_type: ACTION_RESTORE.to_string(),
        universe_uuid: attrs.str("universe_uuid")?,
        storage_config_uuid: attrs.str("storage_config_uuid")?,
        backup_storage_info_list: vec![BackupStorageInfo {
            backup_type: attrs
                .opt_str("restore_type")?
                .unwrap_or_else(|| "PGSQL_TABLE_TYPE".to_string()),
            keyspace: attrs.str("keyspace")?,
            storage_location: attrs.str("storage_location")?,
            sse: attrs.bool_or("sse", false)?,
        }],
        parallelism: attrs.int_or("parallelism", 8)?,
    })
}

impl YbaProvider {
    /// Start the restore and wait for it; the restore task becomes the identifier
    pub(crate) async fn create_restore(&self, resource: &Resource) -> ProviderResult<State> {
        let attrs = Attrs::new(&resource.id, &resource.attributes);
        let request = restore_request(&attrs)?;
        let timeouts = attrs.timeouts(DEFAULT_TIMEOUT)?;

        let task = self.api.restore(&request).await?;
        let task_uuid = task
            .task_uuid
            .clone()
            .ok_or_else(|| ProviderError::new("Restore returned no task UUID"))?;
        info!(
            task_uuid = %task_uuid,
            universe_uuid = %request.universe_uuid,
            keyspace = %request.backup_storage_info_list[0].keyspace,
            "restoring keyspace"
        );
        self.wait(&task, timeouts.create).await?;

        let attributes = resource
            .attributes
            .iter()
            .filter(|(key, value)| {
                key.as_str() != "timeouts" && !matches!(value, Value::ResourceRef(..))
            })
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect();
        Ok(existing(&resource.id, &task_uuid, attributes))
    }

    /// Restores are not observable once finished; the recorded state stands
    pub(crate) fn read_restore(&self, id: &ResourceId, prior: &State) -> State {
        let mut state = prior.clone();
        state.id = id.clone();
        state
    }

    pub(crate) fn delete_restore(&self, state: &State) {
        info!(
            resource = %state.id.address(),
            "dropping restore from state; restored data is left in place"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resources::string;
    use crate::testing::MockApi;
    use std::collections::HashMap;
    use std::sync::Arc;

    fn resource(universe_uuid: &str) -> Resource {
        Resource::new("yba_restore", "orders")
            .with_attribute("universe_uuid", string(universe_uuid))
            .with_attribute(
                "storage_config_uuid",
                string("0b9e2f14-4f3e-4f5a-9b55-6f5b7e4d2c11"),
            )
            .with_attribute("keyspace", string("orders"))
            .with_attribute("storage_location", string("s3://backups/univ-1/orders"))
            .with_attribute("restore_type", string("YQL_TABLE_TYPE"))
            .with_attribute("parallelism", Value::Int(4))
            .with_attribute(
                "timeouts",
                Value::Map(HashMap::from([("create".to_string(), string("5m"))])),
            )
    }

    async fn universe(yba: &YbaProvider) -> String {
        let universe = Resource::new("yba_universe", "u1")
            .with_attribute("name", string("u1"))
            .with_attribute("provider_uuid", string("provider-0"))
            .with_attribute("provider_type", string("onprem"))
            .with_attribute("region_list", Value::List(vec![string("region-0")]))
            .with_attribute("replication_factor", Value::Int(1))
            .with_attribute("num_nodes", Value::Int(1))
            .with_attribute("instance_type", string("small"))
            .with_attribute("software_version", string("2.20.1.0-b97"))
            .with_attribute("volume_size", Value::Int(100));
        yba.create_universe(&universe).await.unwrap().identifier.unwrap()
    }

    #[tokio::test]
    async fn restore_runs_on_create_and_is_tracked_by_task() {
        let api = Arc::new(MockApi::new());
        let yba = YbaProvider::with_api(api.clone(), Duration::from_millis(10));
        let universe_uuid = universe(&yba).await;

        let state = yba.create_restore(&resource(&universe_uuid)).await.unwrap();

        let request = api.last_restore().unwrap();
        assert_eq!(request.action_type, "RESTORE");
        assert_eq!(request.parallelism, 4);
        assert_eq!(request.backup_storage_info_list[0].backup_type, "YQL_TABLE_TYPE");
        assert!(state.identifier.as_deref().unwrap().starts_with("task-"));
        assert_eq!(state.attributes["keyspace"], string("orders"));
        assert!(!state.attributes.contains_key("timeouts"));

        let read = yba.read_restore(&state.id, &state);
        assert_eq!(read.attributes, state.attributes);
    }

    #[tokio::test]
    async fn unknown_universe_fails_before_waiting() {
        let api = Arc::new(MockApi::new());
        let yba = YbaProvider::with_api(api.clone(), Duration::from_millis(10));

        let err = yba
            .create_restore(&resource("f33e3c9b-75ab-4c30-80ad-cba85646ea39"))
            .await
            .unwrap_err();
        assert!(err.is_not_found());
        assert!(api.last_restore().is_none());
    }
}
