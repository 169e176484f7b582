//! yba_onprem_provider - on-premises providers and their instance types

use std::collections::HashMap;

use tracing::{info, warn};
use yba_core::provider::{ProviderError, ProviderResult};
use yba_core::resource::{Resource, ResourceId, State, Value};

use super::cloud_provider::{
    DEFAULT_TIMEOUT, apply_provisioning, base_provider, provider_attributes,
};
use super::{Attrs, changed_attributes, existing, identifier, insert_opt, string, string_list};
use crate::models::{
    InstanceType, InstanceTypeDetails, InstanceTypeKey, OnPremCloudInfo, VolumeDetails,
};
use crate::provider::YbaProvider;

const ONPREM_CODE: &str = "onprem";

fn instance_types(attrs: &Attrs<'_>) -> ProviderResult<Vec<InstanceType>> {
    attrs
        .blocks("instance_types")?
        .iter()
        .map(|block| {
            let volume_size_gb = block.opt_float("volume_size_gb")?.unwrap_or_default();
            let volumes = block
                .string_list("mount_paths")?
                .into_iter()
                .map(|mount_path| VolumeDetails {
                    volume_size_gb,
                    mount_path,
                })
                .collect();
            Ok(InstanceType {
                id_key: InstanceTypeKey {
                    instance_type_code: block.str("instance_type_code")?,
                    provider_uuid: None,
                },
                provider_code: Some(ONPREM_CODE.to_string()),
                num_cores: block.opt_float("num_cores")?.unwrap_or_default(),
                mem_size_gb: block.opt_float("mem_size_gb")?.unwrap_or_default(),
                instance_type_details: InstanceTypeDetails {
                    volume_details_list: volumes,
                },
                active: None,
            })
        })
        .collect()
}

fn instance_type_value(instance_type: &InstanceType) -> Value {
    let volumes = &instance_type.instance_type_details.volume_details_list;
    Value::Map(HashMap::from([
        ("instance_type_code".to_string(), string(instance_type.code())),
        ("num_cores".to_string(), Value::Float(instance_type.num_cores)),
        ("mem_size_gb".to_string(), Value::Float(instance_type.mem_size_gb)),
        (
            "volume_size_gb".to_string(),
            Value::Float(volumes.first().map(|v| v.volume_size_gb).unwrap_or_default()),
        ),
        (
            "mount_paths".to_string(),
            string_list(volumes.iter().map(|v| v.mount_path.as_str())),
        ),
    ]))
}

/// Active instance types ordered like the declared or recorded list
fn instance_types_value(types: &[InstanceType], prior: Option<&Value>) -> Value {
    let prior_codes: Vec<&str> = prior
        .and_then(Value::as_list)
        .unwrap_or_default()
        .iter()
        .filter_map(|v| v.as_map()?.get("instance_type_code")?.as_str())
        .collect();
    let mut active: Vec<&InstanceType> =
        types.iter().filter(|t| t.active != Some(false)).collect();
    active.sort_by_key(|t| {
        prior_codes
            .iter()
            .position(|c| *c == t.code())
            .unwrap_or(usize::MAX)
    });
    Value::List(active.into_iter().map(instance_type_value).collect())
}

impl YbaProvider {
    pub(crate) async fn create_onprem_provider(&self, resource: &Resource) -> ProviderResult<State> {
        let attrs = Attrs::new(&resource.id, &resource.attributes);
        let timeouts = attrs.timeouts(DEFAULT_TIMEOUT)?;

        let mut body = base_provider(&attrs, ONPREM_CODE, None)?;
        body.details.skip_provisioning = Some(attrs.bool_or("skip_provisioning", false)?);
        body.details.cloud_info.onprem = Some(OnPremCloudInfo {
            yb_home_dir: attrs.opt_str("yb_home_dir")?,
            ..Default::default()
        });
        let types = instance_types(&attrs)?;

        let task = self.api.create_provider(&body).await?;
        let uuid = task.resource_uuid.clone().ok_or_else(|| {
            ProviderError::new("Provider create response has no provider UUID")
        })?;
        self.wait(&task, timeouts.create).await?;
        info!(provider_uuid = %uuid, name = %body.name, "created on-prem provider");

        for instance_type in &types {
            self.api.create_instance_type(&uuid, instance_type).await?;
        }

        self.read_onprem_provider_by_uuid(&resource.id, &uuid, &resource.attributes)
            .await
    }

    pub(crate) async fn read_onprem_provider(
        &self,
        id: &ResourceId,
        prior: &State,
    ) -> ProviderResult<State> {
        let uuid = identifier(prior)?;
        self.read_onprem_provider_by_uuid(id, uuid, &prior.attributes)
            .await
    }

    async fn read_onprem_provider_by_uuid(
        &self,
        id: &ResourceId,
        uuid: &str,
        prior: &HashMap<String, Value>,
    ) -> ProviderResult<State> {
        let provider = self.api.get_provider(uuid).await?;
        let types = self.api.list_instance_types(uuid).await?;

        let mut attributes = provider_attributes(&provider, None, prior.get("regions"));
        attributes.insert(
            "skip_provisioning".to_string(),
            Value::Bool(provider.details.skip_provisioning.unwrap_or(false)),
        );
        insert_opt(
            &mut attributes,
            "yb_home_dir",
            provider
                .details
                .cloud_info
                .onprem
                .as_ref()
                .and_then(|o| o.yb_home_dir.as_deref())
                .map(string),
        );
        attributes.insert(
            "instance_types".to_string(),
            instance_types_value(&types, prior.get("instance_types")),
        );
        Ok(existing(id, uuid, attributes))
    }

    pub(crate) async fn update_onprem_provider(
        &self,
        from: &State,
        to: &Resource,
    ) -> ProviderResult<State> {
        let uuid = identifier(from)?;
        let attrs = Attrs::new(&to.id, &to.attributes);
        let timeouts = attrs.timeouts(DEFAULT_TIMEOUT)?;
        let changed = changed_attributes(from, &to.attributes);

        if changed.iter().any(|c| c != "instance_types") {
            let persisted = self.api.get_provider(uuid).await?;
            let declared = base_provider(&attrs, ONPREM_CODE, None)?;

            let mut body = persisted.clone();
            body.regions = declared.regions.clone();
            body.reconcile_regions(&persisted);
            apply_provisioning(&mut body, &declared);
            body.details.skip_provisioning = Some(attrs.bool_or("skip_provisioning", false)?);
            let onprem = body.details.cloud_info.onprem.get_or_insert_with(Default::default);
            onprem.yb_home_dir = attrs.opt_str("yb_home_dir")?;

            self.edit_provider(uuid, &persisted, &body, timeouts.update)
                .await?;
        }

        if changed.iter().any(|c| c == "instance_types") {
            self.sync_instance_types(uuid, from, &attrs).await?;
        }

        self.read_onprem_provider_by_uuid(&to.id, uuid, &to.attributes)
            .await
    }

    /// Replace instance types that were removed or changed
    async fn sync_instance_types(
        &self,
        uuid: &str,
        from: &State,
        attrs: &Attrs<'_>,
    ) -> ProviderResult<()> {
        let declared = instance_types(attrs)?;
        let remote = self.api.list_instance_types(uuid).await?;
        let recorded = from
            .attributes
            .get("instance_types")
            .and_then(Value::as_list)
            .unwrap_or_default();

        let unchanged: Vec<&str> = declared
            .iter()
            .filter(|d| {
                let value = instance_type_value(d);
                recorded.iter().any(|r| value.is_satisfied_by(r))
            })
            .map(InstanceType::code)
            .collect();
        let live: Vec<&str> = remote
            .iter()
            .filter(|t| t.active != Some(false))
            .map(InstanceType::code)
            .collect();

        for code in live.iter().filter(|c| !unchanged.contains(c)) {
            self.api.delete_instance_type(uuid, code).await?;
            info!(provider_uuid = %uuid, code = *code, "removed instance type");
        }

        for instance_type in &declared {
            let code = instance_type.code();
            if !unchanged.contains(&code) || !live.contains(&code) {
                self.api.create_instance_type(uuid, instance_type).await?;
                info!(provider_uuid = %uuid, code, "added instance type");
            }
        }
        Ok(())
    }

    pub(crate) async fn delete_onprem_provider(&self, state: &State) -> ProviderResult<()> {
        let uuid = identifier(state)?;
        let attrs = Attrs::new(&state.id, &state.attributes);
        let timeouts = attrs.timeouts(DEFAULT_TIMEOUT)?;

        match self.api.list_instance_types(uuid).await {
            Ok(types) => {
                for instance_type in types {
                    if let Err(e) = self.api.delete_instance_type(uuid, instance_type.code()).await {
                        warn!(
                            provider_uuid = %uuid,
                            code = instance_type.code(),
                            error = %e,
                            "could not delete instance type"
                        );
                    }
                }
            }
            Err(e) => warn!(provider_uuid = %uuid, error = %e, "could not list instance types"),
        }

        let task = self.api.delete_provider(uuid).await?;
        self.wait(&task, timeouts.delete).await?;
        info!(provider_uuid = %uuid, "deleted on-prem provider");
        Ok(())
    }
}
