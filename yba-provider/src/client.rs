//! YBA REST client
//!
//! Thin JSON-over-HTTP client. Every request carries the API token header and
//! customer-scoped paths are resolved against the customer of the token.

use async_trait::async_trait;
use reqwest::{Method, RequestBuilder};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::json;
use tracing::{debug, info};

use crate::api::YbaApi;
use crate::config::ProviderConfig;
use crate::error::{ApiError, Result};
use crate::models::{
    AccessKey, AppVersion, Backup, BackupScheduleRequest, CloudProvider, CustomerConfig,
    FailedSubTask, FailedSubTasks, InstanceType, NodeInstance, NodeInstanceRequest,
    RestoreRequest, Schedule, ScheduleEdit, SessionInfo, SoftwareUpgrade, TaskInfo, Universe,
    UniverseDeleteFlags, UniverseDetails, User, UserRegistration, YbaTask,
};

pub const AUTH_HEADER: &str = "X-AUTH-YW-API-TOKEN";
const API_PREFIX: &str = "/api/v1";

/// Page size used when listing the backups of a schedule
const BACKUP_PAGE_LIMIT: usize = 500;

/// Authenticated client bound to one customer
pub struct YbaClient {
    http: reqwest::Client,
    api_base: String,
    api_token: String,
    customer_uuid: String,
}

impl YbaClient {
    /// Build the client and resolve the customer UUID of the token
    pub async fn connect(config: &ProviderConfig) -> Result<Self> {
        let http = reqwest::Client::builder().build()?;
        let mut client = Self {
            http,
            api_base: format!("{}{}", config.base_url(), API_PREFIX),
            api_token: config.api_token.clone(),
            customer_uuid: String::new(),
        };

        let session: SessionInfo = client.get(client.url("session_info")).await?;
        info!(
            host = %config.host,
            customer_uuid = %session.customer_uuid,
            "connected to YugabyteDB Anywhere"
        );
        client.customer_uuid = session.customer_uuid;
        Ok(client)
    }

    pub fn customer_uuid(&self) -> &str {
        &self.customer_uuid
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.api_base, path)
    }

    fn customer_url(&self, path: &str) -> String {
        customer_url(&self.api_base, &self.customer_uuid, path)
    }

    async fn get<T: DeserializeOwned>(&self, url: String) -> Result<T> {
        self.send_json(self.request(Method::GET, &url)).await
    }

    async fn post<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        url: String,
        body: &B,
    ) -> Result<T> {
        self.send_json(self.request(Method::POST, &url).json(body))
            .await
    }

    async fn put<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        url: String,
        body: &B,
    ) -> Result<T> {
        self.send_json(self.request(Method::PUT, &url).json(body))
            .await
    }

    fn request(&self, method: Method, url: &str) -> RequestBuilder {
        debug!(method = method.as_str(), url, "YBA request");
        self.http
            .request(method, url)
            .header(AUTH_HEADER, &self.api_token)
    }

    async fn send_json<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T> {
        let body = self.send(request).await?;
        Ok(serde_json::from_str(&body)?)
    }

    async fn send(&self, request: RequestBuilder) -> Result<String> {
        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(ApiError::Status {
                status: status.as_u16(),
                body: error_message(&body),
            });
        }
        Ok(body)
    }
}

fn customer_url(api_base: &str, customer_uuid: &str, path: &str) -> String {
    format!("{}/customers/{}/{}", api_base, customer_uuid, path)
}

/// Extract the `error` field of a YBA error body, or return the body as is
fn error_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| match v.get("error") {
            Some(serde_json::Value::String(s)) => Some(s.clone()),
            Some(other) if !other.is_null() => Some(other.to_string()),
            _ => None,
        })
        .unwrap_or_else(|| body.to_string())
}

#[async_trait]
impl YbaApi for YbaClient {
    async fn app_version(&self) -> Result<String> {
        let version: AppVersion = self.get(self.url("app_version")).await?;
        Ok(version.version)
    }

    async fn task_status(&self, task_uuid: &str) -> Result<TaskInfo> {
        self.get(self.customer_url(&format!("tasks/{}", task_uuid)))
            .await
    }

    async fn failed_subtasks(&self, task_uuid: &str) -> Result<Vec<FailedSubTask>> {
        let failed: FailedSubTasks = self
            .get(self.customer_url(&format!("tasks/{}/failed", task_uuid)))
            .await?;
        Ok(failed.failed_sub_tasks)
    }

    async fn create_provider(&self, provider: &CloudProvider) -> Result<YbaTask> {
        self.post(self.customer_url("providers"), provider).await
    }

    async fn get_provider(&self, provider_uuid: &str) -> Result<CloudProvider> {
        self.get(self.customer_url(&format!("providers/{}", provider_uuid)))
            .await
    }

    async fn edit_provider(
        &self,
        provider_uuid: &str,
        provider: &CloudProvider,
    ) -> Result<YbaTask> {
        self.put(
            self.customer_url(&format!("providers/{}/edit", provider_uuid)),
            provider,
        )
        .await
    }

    async fn delete_provider(&self, provider_uuid: &str) -> Result<YbaTask> {
        let url = self.customer_url(&format!("providers/{}", provider_uuid));
        self.send_json(self.request(Method::DELETE, &url)).await
    }

    async fn list_access_keys(&self, provider_uuid: &str) -> Result<Vec<AccessKey>> {
        self.get(self.customer_url(&format!("providers/{}/access_keys", provider_uuid)))
            .await
    }

    async fn list_instance_types(&self, provider_uuid: &str) -> Result<Vec<InstanceType>> {
        self.get(self.customer_url(&format!("providers/{}/instance_types", provider_uuid)))
            .await
    }

    async fn create_instance_type(
        &self,
        provider_uuid: &str,
        instance_type: &InstanceType,
    ) -> Result<InstanceType> {
        self.post(
            self.customer_url(&format!("providers/{}/instance_types", provider_uuid)),
            instance_type,
        )
        .await
    }

    async fn delete_instance_type(&self, provider_uuid: &str, code: &str) -> Result<()> {
        let url = self.customer_url(&format!(
            "providers/{}/instance_types/{}",
            provider_uuid, code
        ));
        self.send(self.request(Method::DELETE, &url)).await?;
        Ok(())
    }

    async fn create_universe(&self, details: &UniverseDetails) -> Result<YbaTask> {
        self.post(self.customer_url("universes/clusters"), details)
            .await
    }

    async fn get_universe(&self, universe_uuid: &str) -> Result<Universe> {
        self.get(self.customer_url(&format!("universes/{}", universe_uuid)))
            .await
    }

    async fn list_universes(&self) -> Result<Vec<Universe>> {
        self.get(self.customer_url("universes")).await
    }

    async fn update_primary_cluster(
        &self,
        universe_uuid: &str,
        details: &UniverseDetails,
    ) -> Result<YbaTask> {
        self.put(
            self.customer_url(&format!("universes/{}/clusters/primary", universe_uuid)),
            details,
        )
        .await
    }

    async fn upgrade_software(
        &self,
        universe_uuid: &str,
        upgrade: &SoftwareUpgrade,
    ) -> Result<YbaTask> {
        self.post(
            self.customer_url(&format!("universes/{}/upgrade/software", universe_uuid)),
            upgrade,
        )
        .await
    }

    async fn delete_universe(
        &self,
        universe_uuid: &str,
        flags: UniverseDeleteFlags,
    ) -> Result<YbaTask> {
        let url = self.customer_url(&format!("universes/{}", universe_uuid));
        let request = self.request(Method::DELETE, &url).query(&[
            ("isForceDelete", flags.force),
            ("isDeleteBackups", flags.delete_backups),
            ("isDeleteAssociatedCerts", flags.delete_certs),
        ]);
        self.send_json(request).await
    }

    async fn create_node_instances(
        &self,
        zone_uuid: &str,
        request: &NodeInstanceRequest,
    ) -> Result<Vec<NodeInstance>> {
        let by_ip: std::collections::HashMap<String, NodeInstance> = self
            .post(
                self.customer_url(&format!("zones/{}/nodes", zone_uuid)),
                request,
            )
            .await?;
        Ok(by_ip.into_values().collect())
    }

    async fn list_node_instances(&self, provider_uuid: &str) -> Result<Vec<NodeInstance>> {
        self.get(self.customer_url(&format!("providers/{}/nodes/list", provider_uuid)))
            .await
    }

    async fn delete_node_instance(&self, provider_uuid: &str, ip: &str) -> Result<()> {
        let url = self.customer_url(&format!("providers/{}/instances/{}", provider_uuid, ip));
        self.send(self.request(Method::DELETE, &url)).await?;
        Ok(())
    }

    async fn create_user(&self, user: &UserRegistration) -> Result<User> {
        self.post(self.customer_url("users"), user).await
    }

    async fn get_user(&self, user_uuid: &str) -> Result<User> {
        self.get(self.customer_url(&format!("users/{}", user_uuid)))
            .await
    }

    async fn update_user_role(&self, user_uuid: &str, role: &str) -> Result<()> {
        let url = self.customer_url(&format!("users/{}", user_uuid));
        let request = self
            .request(Method::PUT, &url)
            .query(&[("role", role)])
            .json(&json!({}));
        self.send(request).await?;
        Ok(())
    }

    async fn delete_user(&self, user_uuid: &str) -> Result<()> {
        let url = self.customer_url(&format!("users/{}", user_uuid));
        self.send(self.request(Method::DELETE, &url)).await?;
        Ok(())
    }

    async fn create_backup_schedule(&self, request: &BackupScheduleRequest) -> Result<Schedule> {
        self.post(self.customer_url("create_backup_schedule"), request)
            .await
    }

    async fn get_schedule(&self, schedule_uuid: &str) -> Result<Schedule> {
        self.get(self.customer_url(&format!("schedules/{}", schedule_uuid)))
            .await
    }

    async fn edit_schedule(&self, schedule_uuid: &str, edit: &ScheduleEdit) -> Result<Schedule> {
        self.put(
            self.customer_url(&format!("schedules/{}", schedule_uuid)),
            edit,
        )
        .await
    }

    async fn delete_schedule(&self, schedule_uuid: &str) -> Result<()> {
        let url = self.customer_url(&format!(
            "schedules/{}/delete_backup_schedule",
            schedule_uuid
        ));
        self.send(self.request(Method::DELETE, &url)).await?;
        Ok(())
    }

    async fn list_schedule_backups(&self, schedule_uuid: &str) -> Result<Vec<Backup>> {
        #[derive(serde::Deserialize)]
        struct Page {
            #[serde(default)]
            entities: Vec<Backup>,
        }

        let query = json!({
            "filter": {"scheduleUUIDList": [schedule_uuid]},
            "sortBy": "createTime",
            "direction": "DESC",
            "offset": 0,
            "limit": BACKUP_PAGE_LIMIT,
        });
        let page: Page = self.post(self.customer_url("backups/page"), &query).await?;
        Ok(page.entities)
    }

    async fn delete_backups(&self, backup_uuids: &[String]) -> Result<()> {
        let body = json!({
            "deleteBackupInfos": backup_uuids
                .iter()
                .map(|uuid| json!({"backupUUID": uuid}))
                .collect::<Vec<_>>(),
        });
        let url = self.customer_url("backups/delete");
        self.send(self.request(Method::POST, &url).json(&body))
            .await?;
        Ok(())
    }

    async fn restore(&self, request: &RestoreRequest) -> Result<YbaTask> {
        self.post(self.customer_url("restore"), request).await
    }

    async fn list_releases(&self) -> Result<Vec<String>> {
        self.get(self.customer_url("releases")).await
    }

    async fn list_customer_configs(&self) -> Result<Vec<CustomerConfig>> {
        self.get(self.customer_url("configs")).await
    }
}
