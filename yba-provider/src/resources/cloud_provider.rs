//! yba_cloud_provider - AWS, GCP and Azure providers

use std::collections::HashMap;
use std::time::Duration;

use tracing::info;
use yba_core::provider::{ProviderError, ProviderResult};
use yba_core::resource::{Resource, ResourceId, State, Value};

use super::regions::{check_deactivations, declared_regions, regions_value};
use super::{Attrs, existing, identifier, insert_opt, string, string_list};
use crate::credentials::{
    AwsSettings, AzureSettings, GcpSettings, aws_cloud_info, azure_cloud_info, gcp_cloud_info,
};
use crate::models::{AccessKey, CloudInfo, CloudProvider, KeyInfo, ProviderDetails};
use crate::provider::YbaProvider;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10 * 60);

const SETTINGS_BLOCKS: &[(&str, &str)] = &[
    ("aws", "aws_config_settings"),
    ("gcp", "gcp_config_settings"),
    ("azu", "azure_config_settings"),
];

/// Name, regions, access keys and SSH settings shared with on-prem providers
pub(crate) fn base_provider(
    attrs: &Attrs<'_>,
    code: &str,
    cloud: Option<&str>,
) -> ProviderResult<CloudProvider> {
    let access_keys = attrs
        .blocks("access_keys")?
        .iter()
        .map(|key| {
            Ok(AccessKey {
                id_key: None,
                key_info: KeyInfo {
                    key_pair_name: Some(key.str("key_pair_name")?),
                    ssh_private_key_content: Some(key.str("ssh_private_key_content")?),
                    ..Default::default()
                },
            })
        })
        .collect::<ProviderResult<Vec<_>>>()?;

    Ok(CloudProvider {
        code: code.to_string(),
        name: attrs.str("name")?,
        details: ProviderDetails {
            ssh_user: attrs.opt_str("ssh_user")?,
            ssh_port: attrs.opt_int("ssh_port")?,
            air_gap_install: attrs.opt_bool("air_gap_install")?,
            ntp_servers: attrs.string_list("ntp_servers")?,
            ..Default::default()
        },
        regions: declared_regions(attrs, cloud)?,
        all_access_keys: access_keys,
        ..Default::default()
    })
}

/// Copy the declared SSH settings onto a fetched provider body
pub(crate) fn apply_provisioning(body: &mut CloudProvider, declared: &CloudProvider) {
    let details = &mut body.details;
    details.ssh_user = declared.details.ssh_user.clone();
    details.ssh_port = declared.details.ssh_port.or(details.ssh_port);
    details.air_gap_install = declared.details.air_gap_install;
    details.ntp_servers = declared.details.ntp_servers.clone();
}

/// Observed attributes common to cloud and on-prem providers
pub(crate) fn provider_attributes(
    provider: &CloudProvider,
    cloud: Option<&str>,
    prior_regions: Option<&Value>,
) -> HashMap<String, Value> {
    let details = &provider.details;
    let mut attributes = HashMap::from([
        ("name".to_string(), string(&provider.name)),
        (
            "regions".to_string(),
            regions_value(&provider.regions, cloud, prior_regions),
        ),
        (
            "air_gap_install".to_string(),
            Value::Bool(details.air_gap_install.unwrap_or(false)),
        ),
        ("ntp_servers".to_string(), string_list(&details.ntp_servers)),
    ]);
    insert_opt(&mut attributes, "ssh_user", details.ssh_user.as_deref().map(string));
    insert_opt(&mut attributes, "ssh_port", details.ssh_port.map(Value::Int));
    attributes
}

/// Cloud credentials for `code`, from the declared block or the environment
fn cloud_info(attrs: &Attrs<'_>, code: &str) -> ProviderResult<CloudInfo> {
    for (cloud, block) in SETTINGS_BLOCKS {
        if *cloud != code && attrs.contains(block) {
            return Err(attrs.error(format!(
                "'{}' cannot be used with a provider of code '{}'",
                block, code
            )));
        }
    }

    let mut info = CloudInfo::default();
    match code {
        "aws" => {
            let settings = match attrs.block("aws_config_settings")? {
                Some(b) => AwsSettings {
                    access_key_id: b.opt_str("access_key_id")?,
                    secret_access_key: b.opt_str("secret_access_key")?,
                    hosted_zone_id: b.opt_str("hosted_zone_id")?,
                    use_iam_instance_profile: b.bool_or("use_iam_instance_profile", false)?,
                },
                None => AwsSettings::default(),
            };
            info.aws = Some(aws_cloud_info(&settings)?);
        }
        "gcp" => {
            let settings = match attrs.block("gcp_config_settings")? {
                Some(b) => GcpSettings {
                    project_id: b.opt_str("project_id")?,
                    credentials: b.opt_str("credentials")?,
                    use_host_credentials: b.bool_or("use_host_credentials", false)?,
                    network: b.opt_str("network")?,
                },
                None => GcpSettings::default(),
            };
            info.gcp = Some(gcp_cloud_info(&settings)?);
        }
        "azu" => {
            let settings = match attrs.block("azure_config_settings")? {
                Some(b) => AzureSettings {
                    subscription_id: b.opt_str("subscription_id")?,
                    resource_group: b.opt_str("resource_group")?,
                    tenant_id: b.opt_str("tenant_id")?,
                    client_id: b.opt_str("client_id")?,
                    client_secret: b.opt_str("client_secret")?,
                    hosted_zone_id: b.opt_str("hosted_zone_id")?,
                },
                None => AzureSettings::default(),
            };
            info.azu = Some(azure_cloud_info(&settings)?);
        }
        other => {
            return Err(attrs.error(format!("Unsupported cloud provider code '{}'", other)));
        }
    }
    Ok(info)
}

impl YbaProvider {
    pub(crate) async fn create_cloud_provider(&self, resource: &Resource) -> ProviderResult<State> {
        let attrs = Attrs::new(&resource.id, &resource.attributes);
        let timeouts = attrs.timeouts(DEFAULT_TIMEOUT)?;
        let code = attrs.str("code")?;

        let mut body = base_provider(&attrs, &code, Some(&code))?;
        body.details.cloud_info = cloud_info(&attrs, &code)?;

        let task = self.api.create_provider(&body).await?;
        let uuid = task.resource_uuid.clone().ok_or_else(|| {
            ProviderError::new("Provider create response has no provider UUID")
        })?;
        self.wait(&task, timeouts.create).await?;
        info!(provider_uuid = %uuid, code = %code, "created provider");

        self.read_cloud_provider_by_uuid(&resource.id, &uuid, resource.attributes.get("regions"))
            .await
    }

    pub(crate) async fn read_cloud_provider(
        &self,
        id: &ResourceId,
        prior: &State,
    ) -> ProviderResult<State> {
        let uuid = identifier(prior)?;
        self.read_cloud_provider_by_uuid(id, uuid, prior.attributes.get("regions"))
            .await
    }

    async fn read_cloud_provider_by_uuid(
        &self,
        id: &ResourceId,
        uuid: &str,
        prior_regions: Option<&Value>,
    ) -> ProviderResult<State> {
        let provider = self.api.get_provider(uuid).await?;
        let mut attributes = provider_attributes(&provider, Some(&provider.code), prior_regions);
        attributes.insert("code".to_string(), string(&provider.code));
        Ok(existing(id, uuid, attributes))
    }

    pub(crate) async fn update_cloud_provider(
        &self,
        from: &State,
        to: &Resource,
    ) -> ProviderResult<State> {
        let uuid = identifier(from)?;
        let attrs = Attrs::new(&to.id, &to.attributes);
        let timeouts = attrs.timeouts(DEFAULT_TIMEOUT)?;
        let code = attrs.str("code")?;

        let persisted = self.api.get_provider(uuid).await?;
        let declared = base_provider(&attrs, &code, Some(&code))?;

        let mut body = persisted.clone();
        body.regions = declared.regions.clone();
        body.reconcile_regions(&persisted);
        apply_provisioning(&mut body, &declared);
        if SETTINGS_BLOCKS.iter().any(|(_, block)| attrs.contains(block)) {
            body.details.cloud_info = cloud_info(&attrs, &code)?;
        }

        self.edit_provider(uuid, &persisted, &body, timeouts.update)
            .await?;
        self.read_cloud_provider_by_uuid(&to.id, uuid, to.attributes.get("regions"))
            .await
    }

    /// Send a provider edit after checking no live universe loses a zone
    pub(crate) async fn edit_provider(
        &self,
        uuid: &str,
        persisted: &CloudProvider,
        body: &CloudProvider,
        timeout: Duration,
    ) -> ProviderResult<()> {
        let universes = self.api.list_universes().await?;
        check_deactivations(persisted, body, &universes)?;

        let task = self.api.edit_provider(uuid, body).await?;
        self.wait(&task, timeout).await?;
        info!(provider_uuid = %uuid, "updated provider");
        Ok(())
    }

    pub(crate) async fn delete_cloud_provider(&self, state: &State) -> ProviderResult<()> {
        let uuid = identifier(state)?;
        let attrs = Attrs::new(&state.id, &state.attributes);
        let timeouts = attrs.timeouts(DEFAULT_TIMEOUT)?;

        let task = self.api.delete_provider(uuid).await?;
        self.wait(&task, timeouts.delete).await?;
        info!(provider_uuid = %uuid, "deleted provider");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockApi;
    use std::sync::Arc;
    use yba_core::provider::ErrorKind;

    fn zone(code: &str) -> Value {
        Value::Map(HashMap::from([("code".to_string(), string(code))]))
    }

    fn region(code: &str, zones: &[&str]) -> Value {
        Value::Map(HashMap::from([
            ("code".to_string(), string(code)),
            (
                "zones".to_string(),
                Value::List(zones.iter().map(|z| zone(z)).collect()),
            ),
        ]))
    }

    fn resource(regions: Vec<Value>) -> Resource {
        Resource::new("yba_cloud_provider", "aws")
            .with_attribute("code", string("aws"))
            .with_attribute("name", string("aws-prod"))
            .with_attribute("regions", Value::List(regions))
            .with_attribute(
                "aws_config_settings",
                Value::Map(HashMap::from([
                    ("access_key_id".to_string(), string("AKIA")),
                    ("secret_access_key".to_string(), string("secret")),
                ])),
            )
    }

    fn provider(api: &Arc<MockApi>) -> YbaProvider {
        YbaProvider::with_api(api.clone(), Duration::from_millis(10))
    }

    fn zone_codes(state: &State) -> Vec<String> {
        state.attributes["regions"]
            .as_list()
            .unwrap()
            .iter()
            .flat_map(|r| r.as_map().unwrap()["zones"].as_list().unwrap().to_vec())
            .map(|z| z.as_map().unwrap()["code"].as_str().unwrap().to_string())
            .collect()
    }

    #[tokio::test]
    async fn create_sends_credentials_and_records_uuids() {
        let api = Arc::new(MockApi::new());
        let yba = provider(&api);

        let state = yba
            .create_cloud_provider(&resource(vec![region("us-west-2", &["us-west-2a"])]))
            .await
            .unwrap();

        let uuid = state.identifier.clone().unwrap();
        assert_eq!(state.attributes["id"], string(uuid.as_str()));
        let stored = api.provider(&uuid).unwrap();
        let aws = stored.details.cloud_info.aws.unwrap();
        assert_eq!(aws.aws_access_key_id.as_deref(), Some("AKIA"));
        assert_eq!(aws.aws_access_key_secret.as_deref(), Some("secret"));

        let region = state.attributes["regions"].as_list().unwrap()[0].as_map().unwrap();
        assert!(region.contains_key("uuid"));
    }

    #[tokio::test]
    async fn settings_of_another_cloud_are_rejected() {
        let api = Arc::new(MockApi::new());
        let resource = resource(vec![region("us-west-2", &["us-west-2a"])])
            .with_attribute("gcp_config_settings", Value::Map(HashMap::new()));

        let err = provider(&api).create_cloud_provider(&resource).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::Validation);
        assert!(err.message.contains("gcp_config_settings"));
        assert!(api.calls().is_empty());
    }

    #[tokio::test]
    async fn removed_zone_is_deactivated_not_dropped() {
        let api = Arc::new(MockApi::new());
        let yba = provider(&api);
        let created = yba
            .create_cloud_provider(&resource(vec![region(
                "us-west-2",
                &["us-west-2a", "us-west-2b"],
            )]))
            .await
            .unwrap();

        let to = resource(vec![
            region("us-west-2", &["us-west-2b"]),
            region("us-east-1", &["us-east-1a"]),
        ]);
        let updated = yba.update_cloud_provider(&created, &to).await.unwrap();

        let edit = api.provider_edits().pop().unwrap();
        assert_eq!(edit.regions.len(), 2);
        let west = &edit.regions[0];
        assert!(west.uuid.is_some());
        assert_eq!(west.zones[0].code, "us-west-2a");
        assert_eq!(west.zones[0].active, Some(false));
        assert!(edit.regions[1].uuid.is_none());

        assert_eq!(zone_codes(&updated), vec!["us-west-2b", "us-east-1a"]);
    }

    #[tokio::test]
    async fn zone_in_use_blocks_the_edit() {
        let api = Arc::new(MockApi::new());
        let yba = provider(&api);
        let created = yba
            .create_cloud_provider(&resource(vec![region("us-west-2", &["us-west-2a"])]))
            .await
            .unwrap();
        let provider_uuid = created.identifier.clone().unwrap();
        let region_uuid = api.provider(&provider_uuid).unwrap().regions[0]
            .uuid
            .clone()
            .unwrap();

        let universe = Resource::new("yba_universe", "orders")
            .with_attribute("name", string("orders"))
            .with_attribute("provider_uuid", string(provider_uuid.as_str()))
            .with_attribute("provider_type", string("aws"))
            .with_attribute("region_list", string_list([region_uuid]))
            .with_attribute("num_nodes", Value::Int(3))
            .with_attribute("instance_type", string("c5.large"))
            .with_attribute("software_version", string("2.20.1.0-b97"))
            .with_attribute("volume_size", Value::Int(250));
        yba.create_universe(&universe).await.unwrap();

        let to = resource(vec![region("us-east-1", &["us-east-1a"])]);
        let err = yba.update_cloud_provider(&created, &to).await.unwrap_err();

        assert_eq!(err.kind, ErrorKind::Validation);
        assert!(err.message.contains("us-west-2a"));
        assert!(err.message.contains("orders"));
        assert!(api.provider_edits().is_empty());
    }

    #[tokio::test]
    async fn deleted_provider_reads_as_not_found() {
        let api = Arc::new(MockApi::new());
        let yba = provider(&api);
        let created = yba
            .create_cloud_provider(&resource(vec![region("us-west-2", &["us-west-2a"])]))
            .await
            .unwrap();

        yba.delete_cloud_provider(&created).await.unwrap();
        let err = yba.read_cloud_provider(&created.id, &created).await.unwrap_err();
        assert!(err.is_not_found());
    }
}
