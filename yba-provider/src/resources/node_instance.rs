//! yba_onprem_node_instance - machines registered with an on-prem provider

use std::collections::HashMap;

use tracing::info;
use yba_core::provider::{ProviderError, ProviderResult};
use yba_core::resource::{Resource, ResourceId, State, Value};

use super::{Attrs, existing, identifier, insert_opt, string};
use crate::models::{NodeInstance, NodeInstanceData, NodeInstanceRequest};
use crate::provider::YbaProvider;

fn node_attributes(provider_uuid: &str, node: &NodeInstance) -> HashMap<String, Value> {
    let details = &node.details;
    let mut attributes = HashMap::from([
        ("provider_uuid".to_string(), string(provider_uuid)),
        ("ip".to_string(), string(&details.ip)),
        ("region".to_string(), string(&details.region)),
        ("zone".to_string(), string(&details.zone)),
        ("instance_type".to_string(), string(&details.instance_type)),
        ("zone_uuid".to_string(), string(&node.zone_uuid)),
        ("in_use".to_string(), Value::Bool(node.in_use)),
    ]);
    insert_opt(&mut attributes, "instance_name", details.instance_name.as_deref().map(string));
    insert_opt(&mut attributes, "ssh_user", details.ssh_user.as_deref().map(string));
    insert_opt(&mut attributes, "node_name", details.node_name.as_deref().map(string));
    attributes
}

impl YbaProvider {
    pub(crate) async fn create_node_instance(&self, resource: &Resource) -> ProviderResult<State> {
        let attrs = Attrs::new(&resource.id, &resource.attributes);
        let provider_uuid = attrs.str("provider_uuid")?;
        let data = NodeInstanceData {
            ip: attrs.str("ip")?,
            region: attrs.str("region")?,
            zone: attrs.str("zone")?,
            instance_type: attrs.str("instance_type")?,
            instance_name: attrs.opt_str("instance_name")?,
            ssh_user: attrs.opt_str("ssh_user")?,
            node_name: attrs.opt_str("node_name")?,
        };

        let provider = self.api.get_provider(&provider_uuid).await?;
        let zone_uuid = provider
            .active_regions()
            .find(|r| r.code == data.region)
            .ok_or_else(|| {
                attrs.error(format!(
                    "Provider {} has no region '{}'",
                    provider.name, data.region
                ))
            })?
            .active_zones()
            .find(|z| z.code == data.zone)
            .and_then(|z| z.uuid.clone())
            .ok_or_else(|| {
                attrs.error(format!(
                    "Region '{}' of provider {} has no zone '{}'",
                    data.region, provider.name, data.zone
                ))
            })?;

        let request = NodeInstanceRequest {
            nodes: vec![data],
        };
        let created = self
            .api
            .create_node_instances(&zone_uuid, &request)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| ProviderError::new("Node instance create returned no nodes"))?;
        info!(node_uuid = %created.node_uuid, ip = %created.details.ip, "registered node instance");

        Ok(existing(
            &resource.id,
            &created.node_uuid,
            node_attributes(&provider_uuid, &created),
        ))
    }

    pub(crate) async fn read_node_instance(
        &self,
        id: &ResourceId,
        prior: &State,
    ) -> ProviderResult<State> {
        let uuid = identifier(prior)?;
        let provider_uuid = Attrs::new(id, &prior.attributes).str("provider_uuid")?;

        let nodes = self.api.list_node_instances(&provider_uuid).await?;
        match nodes.iter().find(|n| n.node_uuid == uuid) {
            Some(node) => Ok(existing(id, uuid, node_attributes(&provider_uuid, node))),
            None => Ok(State::not_found(id.clone())),
        }
    }

    pub(crate) async fn delete_node_instance(&self, state: &State) -> ProviderResult<()> {
        let attrs = Attrs::new(&state.id, &state.attributes);
        let provider_uuid = attrs.str("provider_uuid")?;
        let ip = attrs.str("ip")?;

        self.api.delete_node_instance(&provider_uuid, &ip).await?;
        info!(ip = %ip, "removed node instance");
        Ok(())
    }
}
