//! YbaApi - the REST calls the resource handlers depend on
//!
//! `YbaClient` implements this over HTTP. Handlers only see the trait, so
//! tests drive them against an in-memory implementation.

use async_trait::async_trait;

use crate::error::Result;
use crate::models::{
    AccessKey, Backup, BackupScheduleRequest, CloudProvider, CustomerConfig, FailedSubTask,
    InstanceType, NodeInstance, NodeInstanceRequest, RestoreRequest, Schedule, ScheduleEdit,
    SoftwareUpgrade, TaskInfo, Universe, UniverseDeleteFlags, UniverseDetails, User,
    UserRegistration, YbaTask,
};

/// Customer-scoped YBA API
#[async_trait]
pub trait YbaApi: Send + Sync {
    /// Version string of the YBA instance, e.g. `2.20.1.0-b97`
    async fn app_version(&self) -> Result<String>;

    async fn task_status(&self, task_uuid: &str) -> Result<TaskInfo>;
    async fn failed_subtasks(&self, task_uuid: &str) -> Result<Vec<FailedSubTask>>;

    async fn create_provider(&self, provider: &CloudProvider) -> Result<YbaTask>;
    async fn get_provider(&self, provider_uuid: &str) -> Result<CloudProvider>;
    async fn edit_provider(&self, provider_uuid: &str, provider: &CloudProvider)
    -> Result<YbaTask>;
    async fn delete_provider(&self, provider_uuid: &str) -> Result<YbaTask>;
    async fn list_access_keys(&self, provider_uuid: &str) -> Result<Vec<AccessKey>>;
    async fn list_instance_types(&self, provider_uuid: &str) -> Result<Vec<InstanceType>>;
    async fn create_instance_type(
        &self,
        provider_uuid: &str,
        instance_type: &InstanceType,
    ) -> Result<InstanceType>;
    async fn delete_instance_type(&self, provider_uuid: &str, code: &str) -> Result<()>;

    async fn create_universe(&self, details: &UniverseDetails) -> Result<YbaTask>;
    async fn get_universe(&self, universe_uuid: &str) -> Result<Universe>;
    async fn list_universes(&self) -> Result<Vec<Universe>>;
    async fn update_primary_cluster(
        &self,
        universe_uuid: &str,
        details: &UniverseDetails,
    ) -> Result<YbaTask>;
    async fn upgrade_software(
        &self,
        universe_uuid: &str,
        upgrade: &SoftwareUpgrade,
    ) -> Result<YbaTask>;
    async fn delete_universe(
        &self,
        universe_uuid: &str,
        flags: UniverseDeleteFlags,
    ) -> Result<YbaTask>;

    /// Register node instances in a zone
    async fn create_node_instances(
        &self,
        zone_uuid: &str,
        request: &NodeInstanceRequest,
    ) -> Result<Vec<NodeInstance>>;
    async fn list_node_instances(&self, provider_uuid: &str) -> Result<Vec<NodeInstance>>;
    async fn delete_node_instance(&self, provider_uuid: &str, ip: &str) -> Result<()>;

    async fn create_user(&self, user: &UserRegistration) -> Result<User>;
    async fn get_user(&self, user_uuid: &str) -> Result<User>;
    async fn update_user_role(&self, user_uuid: &str, role: &str) -> Result<()>;
    async fn delete_user(&self, user_uuid: &str) -> Result<()>;

    async fn create_backup_schedule(&self, request: &BackupScheduleRequest) -> Result<Schedule>;
    async fn get_schedule(&self, schedule_uuid: &str) -> Result<Schedule>;
    async fn edit_schedule(&self, schedule_uuid: &str, edit: &ScheduleEdit) -> Result<Schedule>;
    async fn delete_schedule(&self, schedule_uuid: &str) -> Result<()>;
    async fn list_schedule_backups(&self, schedule_uuid: &str) -> Result<Vec<Backup>>;
    async fn delete_backups(&self, backup_uuids: &[String]) -> Result<()>;

    async fn restore(&self, request: &RestoreRequest) -> Result<YbaTask>;

    async fn list_releases(&self) -> Result<Vec<String>>;
    async fn list_customer_configs(&self) -> Result<Vec<CustomerConfig>>;
}
