//! Read-only lookups: provider access key, release version, storage configs

use std::collections::HashMap;

use tracing::debug;
use yba_core::provider::ProviderResult;
use yba_core::resource::{Resource, State};

use super::{Attrs, existing, string, string_list};
use crate::provider::YbaProvider;
use crate::version::YbaVersion;

const STORAGE_CONFIG_TYPE: &str = "STORAGE";

impl YbaProvider {
    /// First access key of `provider_id`
    pub(crate) async fn read_provider_key(&self, resource: &Resource) -> ProviderResult<State> {
        let attrs = Attrs::new(&resource.id, &resource.attributes);
        let provider_id = attrs.str("provider_id")?;

        let key_code = self
            .api
            .list_access_keys(&provider_id)
            .await?
            .into_iter()
            .find_map(|key| key.id_key.map(|id| id.key_code))
            .ok_or_else(|| attrs.error(format!("Provider {} has no access keys", provider_id)))?;

        let attributes = HashMap::from([("provider_id".to_string(), string(&provider_id))]);
        Ok(existing(&resource.id, &key_code, attributes))
    }

    /// Releases matching `selector`, newest first
    pub(crate) async fn read_release_version(&self, resource: &Resource) -> ProviderResult<State> {
        let attrs = Attrs::new(&resource.id, &resource.attributes);
        let selector = attrs.opt_str("selector")?;

        let mut versions: Vec<YbaVersion> = self
            .api
            .list_releases()
            .await?
            .into_iter()
            .filter(|release| selector.as_deref().is_none_or(|s| release.starts_with(s)))
            .filter_map(|release| match YbaVersion::parse(&release) {
                Ok(version) => Some(version),
                Err(e) => {
                    debug!(release = %release, error = %e, "skipping release");
                    None
                }
            })
            .collect();
        versions.sort_by(|a, b| b.cmp(a));

        let newest = versions.first().map(ToString::to_string).ok_or_else(|| {
            attrs.error(match &selector {
                Some(s) => format!("No release matches selector '{}'", s),
                None => "No releases are available".to_string(),
            })
        })?;

        let mut attributes = HashMap::from([
            ("version_string".to_string(), string(&newest)),
            (
                "versions".to_string(),
                string_list(versions.iter().map(ToString::to_string)),
            ),
        ]);
        if let Some(selector) = selector {
            attributes.insert("selector".to_string(), string(selector));
        }
        Ok(existing(&resource.id, &newest, attributes))
    }

    /// Storage configs, optionally only the one named `config_name`
    pub(crate) async fn read_storage_configs(&self, resource: &Resource) -> ProviderResult<State> {
        let attrs = Attrs::new(&resource.id, &resource.attributes);
        let config_name = attrs.opt_str("config_name")?;

        let uuids: Vec<String> = self
            .api
            .list_customer_configs()
            .await?
            .into_iter()
            .filter(|c| c.config_type == STORAGE_CONFIG_TYPE)
            .filter(|c| config_name.as_deref().is_none_or(|n| c.config_name == n))
            .map(|c| c.config_uuid)
            .collect();

        if let Some(name) = &config_name
            && uuids.is_empty()
        {
            return Err(attrs.error(format!("No storage config named '{}'", name)));
        }

        let id = uuids.first().cloned().unwrap_or_default();
        let mut attributes = HashMap::from([("uuid_list".to_string(), string_list(uuids))]);
        if let Some(name) = config_name {
            attributes.insert("config_name".to_string(), string(name));
        }
        Ok(existing(&resource.id, &id, attributes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CustomerConfig;
    use crate::testing::MockApi;
    use std::sync::Arc;
    use std::time::Duration;
    use yba_core::provider::ErrorKind;
    use yba_core::resource::Value;

    fn provider(api: MockApi) -> YbaProvider {
        YbaProvider::with_api(Arc::new(api), Duration::from_millis(10))
    }

    fn config(uuid: &str, name: &str, config_type: &str) -> CustomerConfig {
        CustomerConfig {
            config_uuid: uuid.to_string(),
            config_name: name.to_string(),
            name: "S3".to_string(),
            config_type: config_type.to_string(),
        }
    }

    #[tokio::test]
    async fn newest_matching_release_wins() {
        let yba = provider(MockApi::new().with_releases(&[
            "2.18.9.0-b2",
            "2.20.1.3-b3",
            "2.20.10.0-b1",
            "nightly",
            "2.20.2.0-b5",
        ]));
        let resource =
            Resource::new("yba_release_version", "latest").with_attribute("selector", string("2.20"));

        let state = yba.read_release_version(&resource).await.unwrap();
        assert_eq!(state.attributes["version_string"], string("2.20.10.0-b1"));
        assert_eq!(
            state.attributes["versions"],
            string_list(["2.20.10.0-b1", "2.20.2.0-b5", "2.20.1.3-b3"])
        );
        assert_eq!(state.identifier.as_deref(), Some("2.20.10.0-b1"));
    }

    #[tokio::test]
    async fn unmatched_selector_is_an_error() {
        let yba = provider(MockApi::new().with_releases(&["2.18.9.0-b2"]));
        let resource =
            Resource::new("yba_release_version", "latest").with_attribute("selector", string("2.20"));

        let err = yba.read_release_version(&resource).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::Validation);
    }

    #[tokio::test]
    async fn storage_configs_skip_other_config_types() {
        let yba = provider(MockApi::new().with_configs(vec![
            config("c-1", "s3-east", "STORAGE"),
            config("c-2", "alerts", "ALERTS"),
            config("c-3", "gcs-west", "STORAGE"),
        ]));

        let all = yba
            .read_storage_configs(&Resource::new("yba_storage_configs", "all"))
            .await
            .unwrap();
        assert_eq!(all.attributes["uuid_list"], string_list(["c-1", "c-3"]));

        let named = Resource::new("yba_storage_configs", "west")
            .with_attribute("config_name", string("gcs-west"));
        let state = yba.read_storage_configs(&named).await.unwrap();
        assert_eq!(state.attributes["id"], Value::String("c-3".to_string()));

        let missing = Resource::new("yba_storage_configs", "north")
            .with_attribute("config_name", string("nfs-north"));
        assert!(yba.read_storage_configs(&missing).await.is_err());
    }

    #[tokio::test]
    async fn provider_key_is_the_first_access_key() {
        let api = Arc::new(MockApi::new());
        let yba = YbaProvider::with_api(api.clone(), Duration::from_millis(10));
        let onprem = Resource::new("yba_onprem_provider", "dc1")
            .with_attribute("name", string("dc1"));
        let provider_uuid = yba
            .create_onprem_provider(&onprem)
            .await
            .unwrap()
            .identifier
            .unwrap();

        let resource = Resource::new("yba_provider_key", "dc1")
            .with_attribute("provider_id", string(&provider_uuid));
        let state = yba.read_provider_key(&resource).await.unwrap();
        assert_eq!(state.attributes["id"], string("yb-dc1-key"));

        let unknown = Resource::new("yba_provider_key", "x")
            .with_attribute("provider_id", string("provider-404"));
        assert!(yba.read_provider_key(&unknown).await.unwrap_err().is_not_found());
    }
}
