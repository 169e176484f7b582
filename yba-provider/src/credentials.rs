//! Cloud credentials for provider bodies
//!
//! Values declared in the `*_config_settings` blocks win. Anything left out
//! is read from the environment at apply time.

use serde_json::Value as JsonValue;
use yba_core::provider::{ProviderError, ProviderResult};

use crate::models::{AwsCloudInfo, AzureCloudInfo, GcpCloudInfo};

pub const ENV_AWS_ACCESS_KEY_ID: &str = "AWS_ACCESS_KEY_ID";
pub const ENV_AWS_SECRET_ACCESS_KEY: &str = "AWS_SECRET_ACCESS_KEY";
pub const ENV_GOOGLE_APPLICATION_CREDENTIALS: &str = "GOOGLE_APPLICATION_CREDENTIALS";
pub const ENV_AZURE_SUBSCRIPTION_ID: &str = "AZURE_SUBSCRIPTION_ID";
pub const ENV_AZURE_RG: &str = "AZURE_RG";
pub const ENV_AZURE_TENANT_ID: &str = "AZURE_TENANT_ID";
pub const ENV_AZURE_CLIENT_ID: &str = "AZURE_CLIENT_ID";
pub const ENV_AZURE_CLIENT_SECRET: &str = "AZURE_CLIENT_SECRET";

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AwsSettings {
    pub access_key_id: Option<String>,
    pub secret_access_key: Option<String>,
    pub hosted_zone_id: Option<String>,
    pub use_iam_instance_profile: bool,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct GcpSettings {
    pub project_id: Option<String>,
    /// Service account key as JSON text
    pub credentials: Option<String>,
    pub use_host_credentials: bool,
    pub network: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AzureSettings {
    pub subscription_id: Option<String>,
    pub resource_group: Option<String>,
    pub tenant_id: Option<String>,
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    pub hosted_zone_id: Option<String>,
}

pub fn aws_cloud_info(settings: &AwsSettings) -> ProviderResult<AwsCloudInfo> {
    let mut info = AwsCloudInfo {
        aws_hosted_zone_id: settings.hosted_zone_id.clone(),
        ..Default::default()
    };
    if settings.use_iam_instance_profile {
        return Ok(info);
    }

    info.aws_access_key_id = Some(setting_or_env(
        &settings.access_key_id,
        "aws_config_settings.access_key_id",
        ENV_AWS_ACCESS_KEY_ID,
    )?);
    info.aws_access_key_secret = Some(setting_or_env(
        &settings.secret_access_key,
        "aws_config_settings.secret_access_key",
        ENV_AWS_SECRET_ACCESS_KEY,
    )?);
    Ok(info)
}

pub fn gcp_cloud_info(settings: &GcpSettings) -> ProviderResult<GcpCloudInfo> {
    let mut info = GcpCloudInfo {
        gce_project: settings.project_id.clone(),
        dest_vpc_id: settings.network.clone(),
        use_host_credentials: Some(settings.use_host_credentials),
        ..Default::default()
    };
    if settings.use_host_credentials {
        return Ok(info);
    }

    let text = match &settings.credentials {
        Some(text) => text.clone(),
        None => {
            let path = std::env::var(ENV_GOOGLE_APPLICATION_CREDENTIALS).map_err(|_| {
                ProviderError::validation(format!(
                    "gcp_config_settings.credentials is not set and {} is not defined",
                    ENV_GOOGLE_APPLICATION_CREDENTIALS
                ))
            })?;
            std::fs::read_to_string(&path).map_err(|e| {
                ProviderError::validation(format!(
                    "Failed to read GCP credentials from {}: {}",
                    path, e
                ))
                .with_cause(e)
            })?
        }
    };

    let credentials: JsonValue = serde_json::from_str(&text).map_err(|e| {
        ProviderError::validation("GCP credentials are not valid JSON").with_cause(e)
    })?;
    if info.gce_project.is_none() {
        info.gce_project = credentials
            .get("project_id")
            .and_then(JsonValue::as_str)
            .map(str::to_string);
    }
    info.gce_application_credentials = Some(credentials);
    Ok(info)
}

pub fn azure_cloud_info(settings: &AzureSettings) -> ProviderResult<AzureCloudInfo> {
    Ok(AzureCloudInfo {
        azu_subscription_id: Some(setting_or_env(
            &settings.subscription_id,
            "azure_config_settings.subscription_id",
            ENV_AZURE_SUBSCRIPTION_ID,
        )?),
        azu_rg: Some(setting_or_env(
            &settings.resource_group,
            "azure_config_settings.resource_group",
            ENV_AZURE_RG,
        )?),
        azu_tenant_id: Some(setting_or_env(
            &settings.tenant_id,
            "azure_config_settings.tenant_id",
            ENV_AZURE_TENANT_ID,
        )?),
        azu_client_id: Some(setting_or_env(
            &settings.client_id,
            "azure_config_settings.client_id",
            ENV_AZURE_CLIENT_ID,
        )?),
        azu_client_secret: Some(setting_or_env(
            &settings.client_secret,
            "azure_config_settings.client_secret",
            ENV_AZURE_CLIENT_SECRET,
        )?),
        azu_hosted_zone_id: settings.hosted_zone_id.clone(),
        ..Default::default()
    })
}

fn setting_or_env(value: &Option<String>, field: &str, var: &str) -> ProviderResult<String> {
    if let Some(v) = value {
        return Ok(v.clone());
    }
    std::env::var(var)
        .ok()
        .filter(|v| !v.is_empty())
        .ok_or_else(|| {
            ProviderError::validation(format!("{} is not set and {} is not defined", field, var))
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn aws_settings_fall_back_to_environment() {
        temp_env::with_vars(
            [
                (ENV_AWS_ACCESS_KEY_ID, Some("env-key")),
                (ENV_AWS_SECRET_ACCESS_KEY, Some("env-secret")),
            ],
            || {
                let settings = AwsSettings {
                    access_key_id: Some("declared-key".to_string()),
                    ..Default::default()
                };
                let info = aws_cloud_info(&settings).unwrap();
                assert_eq!(info.aws_access_key_id.as_deref(), Some("declared-key"));
                assert_eq!(info.aws_access_key_secret.as_deref(), Some("env-secret"));
            },
        );
    }

    #[test]
    fn missing_aws_secret_names_the_variable() {
        temp_env::with_vars(
            [
                (ENV_AWS_ACCESS_KEY_ID, Some("env-key")),
                (ENV_AWS_SECRET_ACCESS_KEY, None),
            ],
            || {
                let err = aws_cloud_info(&AwsSettings::default()).unwrap_err();
                assert!(err.message.contains(ENV_AWS_SECRET_ACCESS_KEY));
            },
        );
    }

    #[test]
    fn iam_instance_profile_needs_no_keys() {
        temp_env::with_vars_unset([ENV_AWS_ACCESS_KEY_ID, ENV_AWS_SECRET_ACCESS_KEY], || {
            let settings = AwsSettings {
                use_iam_instance_profile: true,
                ..Default::default()
            };
            let info = aws_cloud_info(&settings).unwrap();
            assert!(info.aws_access_key_id.is_none());
        });
    }

    #[test]
    fn gcp_credentials_are_read_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"type":"service_account","project_id":"proj-1"}}"#).unwrap();
        let path = file.path().to_str().unwrap().to_string();

        temp_env::with_var(ENV_GOOGLE_APPLICATION_CREDENTIALS, Some(path), || {
            let info = gcp_cloud_info(&GcpSettings::default()).unwrap();
            assert_eq!(info.gce_project.as_deref(), Some("proj-1"));
            assert_eq!(
                info.gce_application_credentials.unwrap()["type"],
                "service_account"
            );
        });
    }

    #[test]
    fn gcp_rejects_invalid_json() {
        let settings = GcpSettings {
            credentials: Some("not json".to_string()),
            ..Default::default()
        };
        assert!(gcp_cloud_info(&settings).is_err());
    }

    #[test]
    fn azure_requires_every_credential() {
        temp_env::with_vars(
            [
                (ENV_AZURE_SUBSCRIPTION_ID, Some("sub")),
                (ENV_AZURE_RG, Some("rg")),
                (ENV_AZURE_TENANT_ID, Some("tenant")),
                (ENV_AZURE_CLIENT_ID, Some("client")),
                (ENV_AZURE_CLIENT_SECRET, None),
            ],
            || {
                let err = azure_cloud_info(&AzureSettings::default()).unwrap_err();
                assert!(err.message.contains(ENV_AZURE_CLIENT_SECRET));

                let settings = AzureSettings {
                    client_secret: Some("secret".to_string()),
                    ..Default::default()
                };
                let info = azure_cloud_info(&settings).unwrap();
                assert_eq!(info.azu_rg.as_deref(), Some("rg"));
            },
        );
    }
}
