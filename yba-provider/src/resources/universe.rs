//! yba_universe - universes with a single primary cluster

use std::collections::HashMap;
use std::time::Duration;

use tracing::info;
use yba_core::provider::{ProviderError, ProviderResult};
use yba_core::resource::{Resource, ResourceId, State, Value};

use super::{Attrs, changed_attributes, existing, identifier, insert_opt, string, string_list};
use crate::models::{
    Cluster, DeviceInfo, PRIMARY_CLUSTER, SoftwareUpgrade, Universe, UniverseDeleteFlags,
    UniverseDetails, UserIntent,
};
use crate::provider::YbaProvider;
use crate::schemas::universe::{DELETE_FLAGS, UPDATABLE};

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60 * 60);

const UPGRADE_OPTION: &str = "Rolling";

fn user_intent(attrs: &Attrs<'_>) -> ProviderResult<UserIntent> {
    let num_nodes = attrs.int("num_nodes")?;
    let replication_factor = attrs.int_or("replication_factor", 3)?;
    if num_nodes < replication_factor {
        return Err(attrs.error(format!(
            "num_nodes ({}) must be at least replication_factor ({})",
            num_nodes, replication_factor
        )));
    }

    Ok(UserIntent {
        universe_name: attrs.str("name")?,
        provider_type: attrs.str("provider_type")?,
        provider: attrs.str("provider_uuid")?,
        region_list: attrs.string_list("region_list")?,
        num_nodes,
        replication_factor,
        instance_type: attrs.str("instance_type")?,
        device_info: Some(DeviceInfo {
            volume_size: Some(attrs.int("volume_size")?),
            num_volumes: Some(attrs.int_or("num_volumes", 1)?),
            storage_type: attrs.opt_str("storage_type")?,
        }),
        yb_software_version: attrs.str("software_version")?,
        access_key_code: attrs.opt_str("access_key_code")?,
        enable_ysql: attrs.bool_or("enable_ysql", true)?,
        enable_ycql: attrs.bool_or("enable_ycql", true)?,
        assign_public_ip: attrs.bool_or("assign_public_ip", false)?,
        use_time_sync: attrs.bool_or("use_time_sync", true)?,
        ..Default::default()
    })
}

fn universe_attributes(universe: &Universe) -> ProviderResult<HashMap<String, Value>> {
    let intent = &universe
        .primary_cluster()
        .ok_or_else(|| {
            ProviderError::new(format!(
                "Universe {} has no primary cluster",
                universe.universe_uuid
            ))
        })?
        .user_intent;

    let mut attributes = HashMap::from([
        ("name".to_string(), string(&universe.name)),
        ("provider_uuid".to_string(), string(&intent.provider)),
        ("provider_type".to_string(), string(&intent.provider_type)),
        ("region_list".to_string(), string_list(&intent.region_list)),
        ("num_nodes".to_string(), Value::Int(intent.num_nodes)),
        (
            "replication_factor".to_string(),
            Value::Int(intent.replication_factor),
        ),
        ("instance_type".to_string(), string(&intent.instance_type)),
        (
            "software_version".to_string(),
            string(&intent.yb_software_version),
        ),
        ("enable_ysql".to_string(), Value::Bool(intent.enable_ysql)),
        ("enable_ycql".to_string(), Value::Bool(intent.enable_ycql)),
        (
            "assign_public_ip".to_string(),
            Value::Bool(intent.assign_public_ip),
        ),
        ("use_time_sync".to_string(), Value::Bool(intent.use_time_sync)),
    ]);
    insert_opt(
        &mut attributes,
        "access_key_code",
        intent.access_key_code.as_deref().map(string),
    );
    if let Some(device) = &intent.device_info {
        insert_opt(&mut attributes, "volume_size", device.volume_size.map(Value::Int));
        insert_opt(&mut attributes, "num_volumes", device.num_volumes.map(Value::Int));
        insert_opt(
            &mut attributes,
            "storage_type",
            device.storage_type.as_deref().map(string),
        );
    }
    Ok(attributes)
}

impl YbaProvider {
    pub(crate) async fn create_universe(&self, resource: &Resource) -> ProviderResult<State> {
        let attrs = Attrs::new(&resource.id, &resource.attributes);
        let timeouts = attrs.timeouts(DEFAULT_TIMEOUT)?;
        let details = UniverseDetails {
            clusters: vec![Cluster {
                cluster_type: PRIMARY_CLUSTER.to_string(),
                user_intent: user_intent(&attrs)?,
                ..Default::default()
            }],
            ..Default::default()
        };

        let task = self.api.create_universe(&details).await?;
        let uuid = task.resource_uuid.clone().ok_or_else(|| {
            ProviderError::new("Universe create response has no universe UUID")
        })?;
        info!(universe_uuid = %uuid, "creating universe");
        self.wait(&task, timeouts.create).await?;

        self.read_universe_by_uuid(&resource.id, &uuid).await
    }

    pub(crate) async fn read_universe(&self, id: &ResourceId, prior: &State) -> ProviderResult<State> {
        self.read_universe_by_uuid(id, identifier(prior)?).await
    }

    async fn read_universe_by_uuid(&self, id: &ResourceId, uuid: &str) -> ProviderResult<State> {
        let universe = self.api.get_universe(uuid).await?;
        Ok(existing(id, uuid, universe_attributes(&universe)?))
    }

    /// Resize, change instance type, or upgrade the software of a universe
    pub(crate) async fn update_universe(&self, from: &State, to: &Resource) -> ProviderResult<State> {
        let uuid = identifier(from)?;
        let attrs = Attrs::new(&to.id, &to.attributes);
        let timeouts = attrs.timeouts(DEFAULT_TIMEOUT)?;

        let changed: Vec<String> = changed_attributes(from, &to.attributes)
            .into_iter()
            .filter(|c| !DELETE_FLAGS.contains(&c.as_str()))
            .collect();
        let unsupported: Vec<&str> = changed
            .iter()
            .map(String::as_str)
            .filter(|c| !UPDATABLE.contains(c))
            .collect();
        if !unsupported.is_empty() {
            return Err(attrs.error(format!(
                "Cannot change {} of an existing universe; only {} can be updated in place",
                unsupported.join(", "),
                UPDATABLE.join(", ")
            )));
        }

        let universe = self.api.get_universe(uuid).await?;
        if universe.universe_details.update_in_progress {
            return Err(attrs.error(format!(
                "Universe {} has an update in progress; retry once it finishes",
                universe.name
            )));
        }

        let resize = changed.iter().any(|c| c == "num_nodes" || c == "instance_type");
        if resize {
            let mut details = universe.universe_details.clone();
            let cluster = details.primary_cluster_mut().ok_or_else(|| {
                ProviderError::new(format!("Universe {} has no primary cluster", uuid))
            })?;
            cluster.user_intent.num_nodes = attrs.int("num_nodes")?;
            cluster.user_intent.instance_type = attrs.str("instance_type")?;

            let task = self.api.update_primary_cluster(uuid, &details).await?;
            self.wait(&task, timeouts.update).await?;
            info!(universe_uuid = %uuid, "updated primary cluster");
        }

        if changed.iter().any(|c| c == "software_version") {
            let clusters = if resize {
                self.api.get_universe(uuid).await?.universe_details.clusters
            } else {
                universe.universe_details.clusters
            };
            let upgrade = SoftwareUpgrade {
                yb_software_version: attrs.str("software_version")?,
                upgrade_option: UPGRADE_OPTION.to_string(),
                clusters,
            };
            let task = self.api.upgrade_software(uuid, &upgrade).await?;
            self.wait(&task, timeouts.update).await?;
            info!(
                universe_uuid = %uuid,
                version = %upgrade.yb_software_version,
                "upgraded universe software"
            );
        }

        self.read_universe_by_uuid(&to.id, uuid).await
    }

    pub(crate) async fn delete_universe(&self, state: &State) -> ProviderResult<()> {
        let uuid = identifier(state)?;
        let attrs = Attrs::new(&state.id, &state.attributes);
        let timeouts = attrs.timeouts(DEFAULT_TIMEOUT)?;
        let flags = UniverseDeleteFlags {
            force: attrs.bool_or("force_delete", false)?,
            delete_backups: attrs.bool_or("delete_backups", false)?,
            delete_certs: attrs.bool_or("delete_certs", false)?,
        };

        let task = self.api.delete_universe(uuid, flags).await?;
        self.wait(&task, timeouts.delete).await?;
        info!(universe_uuid = %uuid, "deleted universe");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockApi;
    use std::sync::Arc;
    use yba_core::provider::ErrorKind;

    fn resource() -> Resource {
        Resource::new("yba_universe", "orders")
            .with_attribute("name", string("orders"))
            .with_attribute(
                "provider_uuid",
                string("f33e3c9b-75ab-4c30-80ad-cba85646ea39"),
            )
            .with_attribute("provider_type", string("aws"))
            .with_attribute("region_list", string_list(["r-1"]))
            .with_attribute("num_nodes", Value::Int(3))
            .with_attribute("instance_type", string("c5.large"))
            .with_attribute("software_version", string("2.20.1.0-b97"))
            .with_attribute("volume_size", Value::Int(250))
            .with_attribute("force_delete", Value::Bool(false))
    }

    fn provider(api: &Arc<MockApi>) -> YbaProvider {
        YbaProvider::with_api(api.clone(), Duration::from_millis(10))
    }

    #[tokio::test]
    async fn create_reads_back_the_primary_cluster() {
        let api = Arc::new(MockApi::new());
        let resource = resource();

        let state = provider(&api).create_universe(&resource).await.unwrap();

        assert_eq!(state.attributes["num_nodes"], Value::Int(3));
        assert_eq!(state.attributes["replication_factor"], Value::Int(3));
        assert_eq!(state.attributes["num_volumes"], Value::Int(1));
        assert_eq!(state.attributes["enable_ysql"], Value::Bool(true));
        assert!(!state.attributes.contains_key("force_delete"));
    }

    #[tokio::test]
    async fn fewer_nodes_than_replicas_is_rejected() {
        let api = Arc::new(MockApi::new());
        let resource = resource().with_attribute("num_nodes", Value::Int(1));

        let err = provider(&api).create_universe(&resource).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::Validation);
        assert!(api.calls().is_empty());
    }

    #[tokio::test]
    async fn resize_and_upgrade_in_place() {
        let api = Arc::new(MockApi::new());
        let yba = provider(&api);
        let created = yba.create_universe(&resource()).await.unwrap();

        let to = resource()
            .with_attribute("num_nodes", Value::Int(5))
            .with_attribute("software_version", string("2.20.2.0-b10"));
        let updated = yba.update_universe(&created, &to).await.unwrap();

        assert_eq!(updated.attributes["num_nodes"], Value::Int(5));
        assert_eq!(updated.attributes["software_version"], string("2.20.2.0-b10"));
        let calls = api.calls();
        let resize = calls.iter().position(|c| c == "update_primary_cluster").unwrap();
        let upgrade = calls.iter().position(|c| c == "upgrade_software").unwrap();
        assert!(resize < upgrade);
    }

    #[tokio::test]
    async fn unsupported_change_names_the_attribute() {
        let api = Arc::new(MockApi::new());
        let yba = provider(&api);
        let created = yba.create_universe(&resource()).await.unwrap();

        let to = resource()
            .with_attribute("volume_size", Value::Int(500))
            .with_attribute("force_delete", Value::Bool(true));
        let err = yba.update_universe(&created, &to).await.unwrap_err();

        assert_eq!(err.kind, ErrorKind::Validation);
        assert!(err.message.contains("volume_size"));
        assert!(!err.message.contains("force_delete"));
    }

    #[tokio::test]
    async fn update_in_progress_is_rejected() {
        let api = Arc::new(MockApi::new());
        let yba = provider(&api);
        let created = yba.create_universe(&resource()).await.unwrap();
        api.set_update_in_progress(created.identifier.as_deref().unwrap());

        let to = resource().with_attribute("instance_type", string("c5.xlarge"));
        let err = yba.update_universe(&created, &to).await.unwrap_err();
        assert!(err.message.contains("update in progress"));
    }

    #[tokio::test]
    async fn delete_passes_recorded_flags() {
        let api = Arc::new(MockApi::new());
        let yba = provider(&api);
        let mut state = yba.create_universe(&resource()).await.unwrap();
        state
            .attributes
            .insert("delete_backups".to_string(), Value::Bool(true));

        yba.delete_universe(&state).await.unwrap();

        let flags = api.delete_flags().unwrap();
        assert!(flags.delete_backups);
        assert!(!flags.force);
    }

    #[tokio::test(start_paused = true)]
    async fn failed_create_task_surfaces_status() {
        let api = Arc::new(MockApi::new());
        api.script_next_task(&["Running", "Failure"]);

        let err = provider(&api).create_universe(&resource()).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::TaskFailed);
    }
}
