//! Request and response bodies of the YBA REST API
//!
//! Only the fields the handlers read or write are typed. Objects that are
//! fetched, modified and sent back keep everything else in `extra`, so an
//! edit never drops fields this crate does not know about.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};
use yba_core::reconcile::{Reconcile, reconcile};

/// Response of every call that starts an asynchronous task
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct YbaTask {
    #[serde(rename = "taskUUID")]
    pub task_uuid: Option<String>,
    #[serde(rename = "resourceUUID", alias = "universeUUID")]
    pub resource_uuid: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionInfo {
    #[serde(rename = "customerUUID")]
    pub customer_uuid: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppVersion {
    pub version: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskInfo {
    pub status: String,
    #[serde(default)]
    pub percent: f64,
    #[serde(default)]
    pub title: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FailedSubTasks {
    #[serde(default)]
    pub failed_sub_tasks: Vec<FailedSubTask>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FailedSubTask {
    #[serde(default)]
    pub error_string: String,
    #[serde(default)]
    pub sub_task_type: String,
}

// ========== Providers ==========

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CloudProvider {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uuid: Option<String>,
    pub code: String,
    pub name: String,
    #[serde(default)]
    pub details: ProviderDetails,
    #[serde(default)]
    pub regions: Vec<Region>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub all_access_keys: Vec<AccessKey>,
    #[serde(flatten)]
    pub extra: Map<String, JsonValue>,
}

impl CloudProvider {
    /// Regions and zones that are still live
    pub fn active_regions(&self) -> impl Iterator<Item = &Region> {
        self.regions.iter().filter(|r| r.is_active())
    }

    /// Carry remote identities of `persisted` regions and zones into `self`
    pub fn reconcile_regions(&mut self, persisted: &CloudProvider) {
        self.regions = reconcile(&persisted.regions, &self.regions);
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderDetails {
    #[serde(default)]
    pub cloud_info: CloudInfo,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ssh_user: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ssh_port: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub air_gap_install: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skip_provisioning: Option<bool>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ntp_servers: Vec<String>,
    #[serde(flatten)]
    pub extra: Map<String, JsonValue>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct CloudInfo {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aws: Option<AwsCloudInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gcp: Option<GcpCloudInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub azu: Option<AzureCloudInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub onprem: Option<OnPremCloudInfo>,
    #[serde(flatten)]
    pub extra: Map<String, JsonValue>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AwsCloudInfo {
    #[serde(rename = "awsAccessKeyID", skip_serializing_if = "Option::is_none")]
    pub aws_access_key_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aws_access_key_secret: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aws_hosted_zone_id: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, JsonValue>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GcpCloudInfo {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gce_project: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gce_application_credentials: Option<JsonValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub use_host_credentials: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dest_vpc_id: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, JsonValue>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AzureCloudInfo {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub azu_client_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub azu_client_secret: Option<String>,
    #[serde(rename = "azuRG", skip_serializing_if = "Option::is_none")]
    pub azu_rg: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub azu_subscription_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub azu_tenant_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub azu_hosted_zone_id: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, JsonValue>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OnPremCloudInfo {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub yb_home_dir: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, JsonValue>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Region {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uuid: Option<String>,
    pub code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub active: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latitude: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub longitude: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<RegionDetails>,
    #[serde(default)]
    pub zones: Vec<AvailabilityZone>,
    #[serde(flatten)]
    pub extra: Map<String, JsonValue>,
}

impl Region {
    /// An absent flag means the region was never soft-deleted
    pub fn is_active(&self) -> bool {
        self.active != Some(false)
    }

    pub fn active_zones(&self) -> impl Iterator<Item = &AvailabilityZone> {
        self.zones.iter().filter(|z| z.is_active())
    }
}

impl Reconcile for Region {
    fn key(&self) -> &str {
        &self.code
    }

    fn adopt(&mut self, persisted: &Self) {
        self.uuid = persisted.uuid.clone();
        self.active = persisted.active;
        self.extra = persisted.extra.clone();
        if self.details.is_none() {
            self.details = persisted.details.clone();
        }
        self.zones = reconcile(&persisted.zones, &self.zones);
    }

    fn deactivate(&mut self) {
        self.active = Some(false);
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegionDetails {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cloud_info: Option<RegionCloudInfo>,
    #[serde(flatten)]
    pub extra: Map<String, JsonValue>,
}

/// Per-cloud region settings, keyed by cloud code (`aws`, `gcp`, `azu`)
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct RegionCloudInfo {
    #[serde(flatten)]
    pub by_cloud: HashMap<String, RegionCloudSettings>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegionCloudSettings {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vnet: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub security_group_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub yb_image: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, JsonValue>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AvailabilityZone {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uuid: Option<String>,
    pub code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub active: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subnet: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub secondary_subnet: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, JsonValue>,
}

impl AvailabilityZone {
    pub fn is_active(&self) -> bool {
        self.active != Some(false)
    }
}

impl Reconcile for AvailabilityZone {
    fn key(&self) -> &str {
        &self.code
    }

    fn adopt(&mut self, persisted: &Self) {
        self.uuid = persisted.uuid.clone();
        self.active = persisted.active;
        self.extra = persisted.extra.clone();
    }

    fn deactivate(&mut self) {
        self.active = Some(false);
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessKey {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id_key: Option<AccessKeyId>,
    #[serde(default)]
    pub key_info: KeyInfo,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessKeyId {
    pub key_code: String,
    #[serde(rename = "providerUUID", skip_serializing_if = "Option::is_none")]
    pub provider_uuid: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyInfo {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key_pair_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ssh_private_key_content: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, JsonValue>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InstanceType {
    pub id_key: InstanceTypeKey,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider_code: Option<String>,
    #[serde(default)]
    pub num_cores: f64,
    #[serde(rename = "memSizeGB", default)]
    pub mem_size_gb: f64,
    #[serde(default)]
    pub instance_type_details: InstanceTypeDetails,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub active: Option<bool>,
}

impl InstanceType {
    pub fn code(&self) -> &str {
        &self.id_key.instance_type_code
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InstanceTypeKey {
    pub instance_type_code: String,
    #[serde(rename = "providerUuid", skip_serializing_if = "Option::is_none")]
    pub provider_uuid: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InstanceTypeDetails {
    #[serde(default)]
    pub volume_details_list: Vec<VolumeDetails>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VolumeDetails {
    #[serde(rename = "volumeSizeGB")]
    pub volume_size_gb: f64,
    pub mount_path: String,
}

// ========== Universes ==========

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Universe {
    #[serde(rename = "universeUUID")]
    pub universe_uuid: String,
    pub name: String,
    #[serde(default)]
    pub universe_details: UniverseDetails,
}

impl Universe {
    pub fn primary_cluster(&self) -> Option<&Cluster> {
        self.universe_details.primary_cluster()
    }
}

/// Body of universe create/edit calls and the `universeDetails` of a universe
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UniverseDetails {
    #[serde(default)]
    pub clusters: Vec<Cluster>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub update_in_progress: bool,
    #[serde(flatten)]
    pub extra: Map<String, JsonValue>,
}

impl UniverseDetails {
    pub fn primary_cluster(&self) -> Option<&Cluster> {
        self.clusters.iter().find(|c| c.cluster_type == PRIMARY_CLUSTER)
    }

    pub fn primary_cluster_mut(&mut self) -> Option<&mut Cluster> {
        self.clusters
            .iter_mut()
            .find(|c| c.cluster_type == PRIMARY_CLUSTER)
    }
}

pub const PRIMARY_CLUSTER: &str = "PRIMARY";

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Cluster {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uuid: Option<String>,
    pub cluster_type: String,
    pub user_intent: UserIntent,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub placement_info: Option<PlacementInfo>,
    #[serde(flatten)]
    pub extra: Map<String, JsonValue>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserIntent {
    pub universe_name: String,
    pub provider_type: String,
    pub provider: String,
    #[serde(default)]
    pub region_list: Vec<String>,
    pub num_nodes: i64,
    pub replication_factor: i64,
    pub instance_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub device_info: Option<DeviceInfo>,
    pub yb_software_version: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub access_key_code: Option<String>,
    #[serde(default)]
    pub enable_ysql: bool,
    #[serde(default)]
    pub enable_ycql: bool,
    #[serde(default)]
    pub assign_public_ip: bool,
    #[serde(default)]
    pub use_time_sync: bool,
    #[serde(flatten)]
    pub extra: Map<String, JsonValue>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceInfo {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub volume_size: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub num_volumes: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub storage_type: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlacementInfo {
    #[serde(default)]
    pub cloud_list: Vec<PlacementCloud>,
}

impl PlacementInfo {
    /// `(region uuid, zone uuid)` pairs hosting nodes of this cluster
    pub fn zone_uuids(&self) -> impl Iterator<Item = (&str, &str)> {
        self.cloud_list
            .iter()
            .flat_map(|c| &c.region_list)
            .flat_map(|r| r.az_list.iter().map(move |az| (r.uuid.as_str(), az.uuid.as_str())))
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlacementCloud {
    pub uuid: String,
    pub code: String,
    #[serde(default)]
    pub region_list: Vec<PlacementRegion>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlacementRegion {
    pub uuid: String,
    pub code: String,
    #[serde(default)]
    pub az_list: Vec<PlacementAz>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlacementAz {
    pub uuid: String,
    #[serde(default)]
    pub name: String,
    #[serde(rename = "numNodesInAZ", default)]
    pub num_nodes_in_az: i64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SoftwareUpgrade {
    pub yb_software_version: String,
    pub upgrade_option: String,
    pub clusters: Vec<Cluster>,
}

/// Query flags of a universe delete
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UniverseDeleteFlags {
    pub force: bool,
    pub delete_backups: bool,
    pub delete_certs: bool,
}

// ========== Node instances ==========

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeInstanceRequest {
    pub nodes: Vec<NodeInstanceData>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeInstanceData {
    pub ip: String,
    pub region: String,
    pub zone: String,
    pub instance_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instance_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ssh_user: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub node_name: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeInstance {
    #[serde(rename = "nodeUuid")]
    pub node_uuid: String,
    #[serde(rename = "zoneUuid", default)]
    pub zone_uuid: String,
    #[serde(default)]
    pub in_use: bool,
    pub details: NodeInstanceData,
}

// ========== Users ==========

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRegistration {
    pub email: String,
    pub password: String,
    pub confirm_password: String,
    pub role: String,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub uuid: String,
    pub email: String,
    pub role: String,
    #[serde(default)]
    pub creation_date: Option<String>,
    #[serde(default)]
    pub is_primary: bool,
}

// ========== Backups and restore ==========

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BackupScheduleRequest {
    pub schedule_name: String,
    #[serde(rename = "universeUUID")]
    pub universe_uuid: String,
    #[serde(rename = "storageConfigUUID")]
    pub storage_config_uuid: String,
    pub backup_type: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub keyspace_table_list: Vec<KeyspaceTable>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cron_expression: Option<String>,
    /// Milliseconds
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scheduling_frequency: Option<i64>,
    /// Milliseconds
    #[serde(skip_serializing_if = "Option::is_none")]
    pub incremental_backup_frequency: Option<i64>,
    /// Milliseconds, 0 keeps backups forever
    pub time_before_delete: i64,
    pub sse: bool,
    pub parallelism: i64,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyspaceTable {
    pub keyspace: String,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Schedule {
    #[serde(rename = "scheduleUUID")]
    pub schedule_uuid: String,
    #[serde(default)]
    pub schedule_name: Option<String>,
    #[serde(default)]
    pub cron_expression: Option<String>,
    /// Milliseconds
    #[serde(default)]
    pub frequency: Option<i64>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub task_params: Map<String, JsonValue>,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleEdit {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cron_expression: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub frequency: Option<i64>,
    pub frequency_time_unit: String,
    pub status: String,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Backup {
    #[serde(rename = "backupUUID")]
    pub backup_uuid: String,
    #[serde(rename = "scheduleUUID", default)]
    pub schedule_uuid: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RestoreRequest {
    pub action_type: String,
    #[serde(rename = "universeUUID")]
    pub universe_uuid: String,
    #[serde(rename = "storageConfigUUID")]
    pub storage_config_uuid: String,
    pub backup_storage_info_list: Vec<BackupStorageInfo>,
    pub parallelism: i64,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BackupStorageInfo {
    pub backup_type: String,
    pub keyspace: String,
    pub storage_location: String,
    pub sse: bool,
}

// ========== Customer configs ==========

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerConfig {
    #[serde(rename = "configUUID")]
    pub config_uuid: String,
    pub config_name: String,
    /// Storage kind, e.g. `S3`, `GCS`, `NFS`
    pub name: String,
    #[serde(rename = "type")]
    pub config_type: String,
}
