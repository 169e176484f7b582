//! In-memory YBA used by handler tests

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::api::YbaApi;
use crate::error::{ApiError, Result};
use crate::models::{
    AccessKey, AccessKeyId, Backup, BackupScheduleRequest, CloudProvider, Cluster,
    CustomerConfig, FailedSubTask, InstanceType, KeyInfo, NodeInstance, NodeInstanceRequest,
    PlacementAz, PlacementCloud, PlacementInfo, PlacementRegion, RestoreRequest, Schedule,
    ScheduleEdit, SoftwareUpgrade, TaskInfo, Universe, UniverseDeleteFlags, UniverseDetails,
    User, UserRegistration, YbaTask,
};

pub struct MockApi {
    state: Mutex<MockState>,
}

#[derive(Default)]
struct MockState {
    version: String,
    next_id: u64,
    providers: HashMap<String, CloudProvider>,
    instance_types: HashMap<String, Vec<InstanceType>>,
    universes: HashMap<String, Universe>,
    nodes: HashMap<String, Vec<NodeInstance>>,
    users: HashMap<String, User>,
    schedules: HashMap<String, Schedule>,
    backups: Vec<Backup>,
    releases: Vec<String>,
    configs: Vec<CustomerConfig>,
    tasks: HashSet<String>,
    scripts: HashMap<String, VecDeque<String>>,
    next_script: Option<Vec<String>>,
    probes: HashMap<String, usize>,
    failed_subtasks: HashMap<String, Vec<FailedSubTask>>,
    failing: HashSet<&'static str>,
    calls: Vec<String>,
    provider_edits: Vec<CloudProvider>,
    delete_flags: Option<UniverseDeleteFlags>,
    last_restore: Option<RestoreRequest>,
    last_schedule_request: Option<BackupScheduleRequest>,
}

impl MockState {
    fn uuid(&mut self, prefix: &str) -> String {
        self.next_id += 1;
        format!("{}-{}", prefix, self.next_id)
    }

    fn task(&mut self) -> String {
        let id = self.uuid("task");
        self.tasks.insert(id.clone());
        if let Some(script) = self.next_script.take() {
            self.scripts.insert(id.clone(), script.into());
        }
        id
    }

    fn assign_region_uuids(&mut self, provider: &mut CloudProvider) {
        for region in &mut provider.regions {
            if region.uuid.is_none() {
                region.uuid = Some(self.uuid("region"));
            }
            for zone in &mut region.zones {
                if zone.uuid.is_none() {
                    zone.uuid = Some(self.uuid("zone"));
                }
            }
        }
    }

    fn placement(&self, provider_uuid: &str, region_list: &[String]) -> Option<PlacementInfo> {
        let provider = self.providers.get(provider_uuid)?;
        let regions = provider
            .active_regions()
            .filter(|r| r.uuid.as_ref().is_some_and(|u| region_list.contains(u)))
            .map(|r| PlacementRegion {
                uuid: r.uuid.clone().unwrap_or_default(),
                code: r.code.clone(),
                az_list: r
                    .active_zones()
                    .map(|z| PlacementAz {
                        uuid: z.uuid.clone().unwrap_or_default(),
                        name: z.code.clone(),
                        num_nodes_in_az: 1,
                    })
                    .collect(),
            })
            .collect();
        Some(PlacementInfo {
            cloud_list: vec![PlacementCloud {
                uuid: provider_uuid.to_string(),
                code: provider.code.clone(),
                region_list: regions,
            }],
        })
    }
}

fn not_found(what: &str) -> ApiError {
    ApiError::Status {
        status: 404,
        body: format!("Invalid {}", what),
    }
}

impl MockApi {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(MockState {
                version: "2.20.1.0-b97".to_string(),
                ..Default::default()
            }),
        }
    }

    pub fn with_version(self, version: &str) -> Self {
        self.state.lock().unwrap().version = version.to_string();
        self
    }

    pub fn with_releases(self, releases: &[&str]) -> Self {
        self.state.lock().unwrap().releases = releases.iter().map(|r| r.to_string()).collect();
        self
    }

    pub fn with_configs(self, configs: Vec<CustomerConfig>) -> Self {
        self.state.lock().unwrap().configs = configs;
        self
    }

    /// Statuses returned for `task_uuid`; the last one repeats
    pub fn script_task(&self, task_uuid: &str, statuses: &[&str]) {
        let script = statuses.iter().map(|s| s.to_string()).collect();
        self.state
            .lock()
            .unwrap()
            .scripts
            .insert(task_uuid.to_string(), script);
    }

    /// Statuses for the task started by the next mutating call
    pub fn script_next_task(&self, statuses: &[&str]) {
        self.state.lock().unwrap().next_script =
            Some(statuses.iter().map(|s| s.to_string()).collect());
    }

    pub fn status_probes(&self, task_uuid: &str) -> usize {
        self.state
            .lock()
            .unwrap()
            .probes
            .get(task_uuid)
            .copied()
            .unwrap_or(0)
    }

    pub fn fail_subtask(&self, task_uuid: &str, sub_task_type: &str, error: &str) {
        self.state
            .lock()
            .unwrap()
            .failed_subtasks
            .entry(task_uuid.to_string())
            .or_default()
            .push(FailedSubTask {
                error_string: error.to_string(),
                sub_task_type: sub_task_type.to_string(),
            });
    }

    /// Make every call to `method` answer with HTTP 500
    pub fn fail_on(&self, method: &'static str) {
        self.state.lock().unwrap().failing.insert(method);
    }

    pub fn calls(&self) -> Vec<String> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn provider(&self, uuid: &str) -> Option<CloudProvider> {
        self.state.lock().unwrap().providers.get(uuid).cloned()
    }

    pub fn provider_edits(&self) -> Vec<CloudProvider> {
        self.state.lock().unwrap().provider_edits.clone()
    }

    pub fn universe(&self, uuid: &str) -> Option<Universe> {
        self.state.lock().unwrap().universes.get(uuid).cloned()
    }

    pub fn set_update_in_progress(&self, universe_uuid: &str) {
        if let Some(u) = self.state.lock().unwrap().universes.get_mut(universe_uuid) {
            u.universe_details.update_in_progress = true;
        }
    }

    pub fn delete_flags(&self) -> Option<UniverseDeleteFlags> {
        self.state.lock().unwrap().delete_flags
    }

    pub fn last_restore(&self) -> Option<RestoreRequest> {
        self.state.lock().unwrap().last_restore.clone()
    }

    pub fn last_schedule_request(&self) -> Option<BackupScheduleRequest> {
        self.state.lock().unwrap().last_schedule_request.clone()
    }

    pub fn instance_types(&self, provider_uuid: &str) -> Vec<InstanceType> {
        self.state
            .lock()
            .unwrap()
            .instance_types
            .get(provider_uuid)
            .cloned()
            .unwrap_or_default()
    }

    pub fn add_backup(&self, schedule_uuid: &str) -> String {
        let mut state = self.state.lock().unwrap();
        let uuid = state.uuid("backup");
        state.backups.push(Backup {
            backup_uuid: uuid.clone(),
            schedule_uuid: Some(schedule_uuid.to_string()),
        });
        uuid
    }

    pub fn backups(&self) -> Vec<Backup> {
        self.state.lock().unwrap().backups.clone()
    }

    pub fn set_node_in_use(&self, ip: &str) {
        let mut state = self.state.lock().unwrap();
        for node in state.nodes.values_mut().flatten() {
            if node.details.ip == ip {
                node.in_use = true;
            }
        }
    }

    fn enter(&self, method: &'static str) -> Result<std::sync::MutexGuard<'_, MockState>> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(method.to_string());
        if state.failing.contains(method) {
            return Err(ApiError::Status {
                status: 500,
                body: format!("{} failed", method),
            });
        }
        Ok(state)
    }
}

#[async_trait]
impl YbaApi for MockApi {
    async fn app_version(&self) -> Result<String> {
        Ok(self.enter("app_version")?.version.clone())
    }

    async fn task_status(&self, task_uuid: &str) -> Result<TaskInfo> {
        let mut guard = self.enter("task_status")?;
        let state = &mut *guard;
        *state.probes.entry(task_uuid.to_string()).or_default() += 1;

        let status = match state.scripts.get_mut(task_uuid) {
            Some(script) if script.len() > 1 => script.pop_front(),
            Some(script) => script.front().cloned(),
            None if state.tasks.contains(task_uuid) => Some("Success".to_string()),
            None => None,
        };
        let status = status.ok_or_else(|| not_found("task UUID"))?;
        Ok(TaskInfo {
            status,
            percent: 0.0,
            title: None,
        })
    }

    async fn failed_subtasks(&self, task_uuid: &str) -> Result<Vec<FailedSubTask>> {
        let state = self.enter("failed_subtasks")?;
        Ok(state
            .failed_subtasks
            .get(task_uuid)
            .cloned()
            .unwrap_or_default())
    }

    async fn create_provider(&self, provider: &CloudProvider) -> Result<YbaTask> {
        let mut state = self.enter("create_provider")?;
        let uuid = state.uuid("provider");
        let mut stored = provider.clone();
        stored.uuid = Some(uuid.clone());
        state.assign_region_uuids(&mut stored);
        if stored.all_access_keys.is_empty() {
            stored.all_access_keys.push(AccessKey {
                id_key: Some(AccessKeyId {
                    key_code: format!("yb-{}-key", stored.name),
                    provider_uuid: Some(uuid.clone()),
                }),
                key_info: KeyInfo::default(),
            });
        }
        for key in &mut stored.all_access_keys {
            key.key_info.ssh_private_key_content = None;
        }
        state.providers.insert(uuid.clone(), stored);

        Ok(YbaTask {
            task_uuid: Some(state.task()),
            resource_uuid: Some(uuid),
        })
    }

    async fn get_provider(&self, provider_uuid: &str) -> Result<CloudProvider> {
        let state = self.enter("get_provider")?;
        state
            .providers
            .get(provider_uuid)
            .cloned()
            .ok_or_else(|| not_found("provider UUID"))
    }

    async fn edit_provider(
        &self,
        provider_uuid: &str,
        provider: &CloudProvider,
    ) -> Result<YbaTask> {
        let mut state = self.enter("edit_provider")?;
        if !state.providers.contains_key(provider_uuid) {
            return Err(not_found("provider UUID"));
        }
        state.provider_edits.push(provider.clone());
        let mut stored = provider.clone();
        state.assign_region_uuids(&mut stored);
        state.providers.insert(provider_uuid.to_string(), stored);

        Ok(YbaTask {
            task_uuid: Some(state.task()),
            resource_uuid: Some(provider_uuid.to_string()),
        })
    }

    async fn delete_provider(&self, provider_uuid: &str) -> Result<YbaTask> {
        let mut state = self.enter("delete_provider")?;
        state
            .providers
            .remove(provider_uuid)
            .ok_or_else(|| not_found("provider UUID"))?;
        state.instance_types.remove(provider_uuid);
        Ok(YbaTask {
            task_uuid: Some(state.task()),
            resource_uuid: Some(provider_uuid.to_string()),
        })
    }

    async fn list_access_keys(&self, provider_uuid: &str) -> Result<Vec<AccessKey>> {
        let state = self.enter("list_access_keys")?;
        state
            .providers
            .get(provider_uuid)
            .map(|p| p.all_access_keys.clone())
            .ok_or_else(|| not_found("provider UUID"))
    }

    async fn list_instance_types(&self, provider_uuid: &str) -> Result<Vec<InstanceType>> {
        let state = self.enter("list_instance_types")?;
        if !state.providers.contains_key(provider_uuid) {
            return Err(not_found("provider UUID"));
        }
        Ok(state
            .instance_types
            .get(provider_uuid)
            .cloned()
            .unwrap_or_default())
    }

    async fn create_instance_type(
        &self,
        provider_uuid: &str,
        instance_type: &InstanceType,
    ) -> Result<InstanceType> {
        let mut state = self.enter("create_instance_type")?;
        let mut stored = instance_type.clone();
        stored.id_key.provider_uuid = Some(provider_uuid.to_string());
        stored.active = Some(true);
        let types = state.instance_types.entry(provider_uuid.to_string()).or_default();
        types.retain(|t| t.code() != stored.code());
        types.push(stored.clone());
        Ok(stored)
    }

    async fn delete_instance_type(&self, provider_uuid: &str, code: &str) -> Result<()> {
        let mut state = self.enter("delete_instance_type")?;
        let types = state
            .instance_types
            .get_mut(provider_uuid)
            .ok_or_else(|| not_found("instance type"))?;
        let before = types.len();
        types.retain(|t| t.code() != code);
        if types.len() == before {
            return Err(not_found("instance type"));
        }
        Ok(())
    }

    async fn create_universe(&self, details: &UniverseDetails) -> Result<YbaTask> {
        let mut state = self.enter("create_universe")?;
        let uuid = state.uuid("universe");
        let mut details = details.clone();
        let mut name = String::new();
        for cluster in &mut details.clusters {
            cluster.uuid = Some(format!("{}-cluster", uuid));
            name = cluster.user_intent.universe_name.clone();
            let intent = &cluster.user_intent;
            cluster.placement_info = state.placement(&intent.provider, &intent.region_list);
        }
        state.universes.insert(
            uuid.clone(),
            Universe {
                universe_uuid: uuid.clone(),
                name,
                universe_details: details,
            },
        );
        Ok(YbaTask {
            task_uuid: Some(state.task()),
            resource_uuid: Some(uuid),
        })
    }

    async fn get_universe(&self, universe_uuid: &str) -> Result<Universe> {
        let state = self.enter("get_universe")?;
        state
            .universes
            .get(universe_uuid)
            .cloned()
            .ok_or_else(|| not_found("universe UUID"))
    }

    async fn list_universes(&self) -> Result<Vec<Universe>> {
        let state = self.enter("list_universes")?;
        Ok(state.universes.values().cloned().collect())
    }

    async fn update_primary_cluster(
        &self,
        universe_uuid: &str,
        details: &UniverseDetails,
    ) -> Result<YbaTask> {
        let mut state = self.enter("update_primary_cluster")?;
        let clusters: Vec<Cluster> = details.clusters.clone();
        let universe = state
            .universes
            .get_mut(universe_uuid)
            .ok_or_else(|| not_found("universe UUID"))?;
        universe.universe_details.clusters = clusters;
        Ok(YbaTask {
            task_uuid: Some(state.task()),
            resource_uuid: Some(universe_uuid.to_string()),
        })
    }

    async fn upgrade_software(
        &self,
        universe_uuid: &str,
        upgrade: &SoftwareUpgrade,
    ) -> Result<YbaTask> {
        let mut state = self.enter("upgrade_software")?;
        let universe = state
            .universes
            .get_mut(universe_uuid)
            .ok_or_else(|| not_found("universe UUID"))?;
        for cluster in &mut universe.universe_details.clusters {
            cluster.user_intent.yb_software_version = upgrade.yb_software_version.clone();
        }
        Ok(YbaTask {
            task_uuid: Some(state.task()),
            resource_uuid: Some(universe_uuid.to_string()),
        })
    }

    async fn delete_universe(
        &self,
        universe_uuid: &str,
        flags: UniverseDeleteFlags,
    ) -> Result<YbaTask> {
        let mut state = self.enter("delete_universe")?;
        state
            .universes
            .remove(universe_uuid)
            .ok_or_else(|| not_found("universe UUID"))?;
        state.delete_flags = Some(flags);
        Ok(YbaTask {
            task_uuid: Some(state.task()),
            resource_uuid: Some(universe_uuid.to_string()),
        })
    }

    async fn create_node_instances(
        &self,
        zone_uuid: &str,
        request: &NodeInstanceRequest,
    ) -> Result<Vec<NodeInstance>> {
        let mut state = self.enter("create_node_instances")?;
        let provider_uuid = state
            .providers
            .iter()
            .find(|(_, p)| {
                p.regions
                    .iter()
                    .flat_map(|r| &r.zones)
                    .any(|z| z.uuid.as_deref() == Some(zone_uuid))
            })
            .map(|(uuid, _)| uuid.clone())
            .ok_or_else(|| not_found("zone UUID"))?;

        let mut created = Vec::new();
        for details in &request.nodes {
            created.push(NodeInstance {
                node_uuid: state.uuid("node"),
                zone_uuid: zone_uuid.to_string(),
                in_use: false,
                details: details.clone(),
            });
        }
        state
            .nodes
            .entry(provider_uuid)
            .or_default()
            .extend(created.iter().cloned());
        Ok(created)
    }

    async fn list_node_instances(&self, provider_uuid: &str) -> Result<Vec<NodeInstance>> {
        let state = self.enter("list_node_instances")?;
        Ok(state.nodes.get(provider_uuid).cloned().unwrap_or_default())
    }

    async fn delete_node_instance(&self, provider_uuid: &str, ip: &str) -> Result<()> {
        let mut state = self.enter("delete_node_instance")?;
        let nodes = state
            .nodes
            .get_mut(provider_uuid)
            .ok_or_else(|| not_found("node instance"))?;
        let before = nodes.len();
        nodes.retain(|n| n.details.ip != ip);
        if nodes.len() == before {
            return Err(not_found("node instance"));
        }
        Ok(())
    }

    async fn create_user(&self, user: &UserRegistration) -> Result<User> {
        let mut state = self.enter("create_user")?;
        let created = User {
            uuid: state.uuid("user"),
            email: user.email.clone(),
            role: user.role.clone(),
            creation_date: Some("2024-05-01T10:00:00Z".to_string()),
            is_primary: false,
        };
        state.users.insert(created.uuid.clone(), created.clone());
        Ok(created)
    }

    async fn get_user(&self, user_uuid: &str) -> Result<User> {
        let state = self.enter("get_user")?;
        state
            .users
            .get(user_uuid)
            .cloned()
            .ok_or_else(|| not_found("user UUID"))
    }

    async fn update_user_role(&self, user_uuid: &str, role: &str) -> Result<()> {
        let mut state = self.enter("update_user_role")?;
        let user = state
            .users
            .get_mut(user_uuid)
            .ok_or_else(|| not_found("user UUID"))?;
        user.role = role.to_string();
        Ok(())
    }

    async fn delete_user(&self, user_uuid: &str) -> Result<()> {
        let mut state = self.enter("delete_user")?;
        state
            .users
            .remove(user_uuid)
            .map(|_| ())
            .ok_or_else(|| not_found("user UUID"))
    }

    async fn create_backup_schedule(&self, request: &BackupScheduleRequest) -> Result<Schedule> {
        let mut state = self.enter("create_backup_schedule")?;
        let schedule = Schedule {
            schedule_uuid: state.uuid("schedule"),
            schedule_name: Some(request.schedule_name.clone()),
            cron_expression: request.cron_expression.clone(),
            frequency: request.scheduling_frequency,
            status: Some("Active".to_string()),
            task_params: match serde_json::to_value(request)? {
                serde_json::Value::Object(map) => map,
                _ => Default::default(),
            },
        };
        state.last_schedule_request = Some(request.clone());
        state
            .schedules
            .insert(schedule.schedule_uuid.clone(), schedule.clone());
        Ok(schedule)
    }

    async fn get_schedule(&self, schedule_uuid: &str) -> Result<Schedule> {
        let state = self.enter("get_schedule")?;
        state
            .schedules
            .get(schedule_uuid)
            .cloned()
            .ok_or_else(|| not_found("schedule UUID"))
    }

    async fn edit_schedule(&self, schedule_uuid: &str, edit: &ScheduleEdit) -> Result<Schedule> {
        let mut state = self.enter("edit_schedule")?;
        let schedule = state
            .schedules
            .get_mut(schedule_uuid)
            .ok_or_else(|| not_found("schedule UUID"))?;
        schedule.cron_expression = edit.cron_expression.clone();
        schedule.frequency = edit.frequency;
        schedule.status = Some(edit.status.clone());
        Ok(schedule.clone())
    }

    async fn delete_schedule(&self, schedule_uuid: &str) -> Result<()> {
        let mut state = self.enter("delete_schedule")?;
        state
            .schedules
            .remove(schedule_uuid)
            .map(|_| ())
            .ok_or_else(|| not_found("schedule UUID"))
    }

    async fn list_schedule_backups(&self, schedule_uuid: &str) -> Result<Vec<Backup>> {
        let state = self.enter("list_schedule_backups")?;
        Ok(state
            .backups
            .iter()
            .filter(|b| b.schedule_uuid.as_deref() == Some(schedule_uuid))
            .cloned()
            .collect())
    }

    async fn delete_backups(&self, backup_uuids: &[String]) -> Result<()> {
        let mut state = self.enter("delete_backups")?;
        state.backups.retain(|b| !backup_uuids.contains(&b.backup_uuid));
        Ok(())
    }

    async fn restore(&self, request: &RestoreRequest) -> Result<YbaTask> {
        let mut state = self.enter("restore")?;
        if !state.universes.contains_key(&request.universe_uuid) {
            return Err(not_found("universe UUID"));
        }
        state.last_restore = Some(request.clone());
        Ok(YbaTask {
            task_uuid: Some(state.task()),
            resource_uuid: Some(request.universe_uuid.clone()),
        })
    }

    async fn list_releases(&self) -> Result<Vec<String>> {
        Ok(self.enter("list_releases")?.releases.clone())
    }

    async fn list_customer_configs(&self) -> Result<Vec<CustomerConfig>> {
        Ok(self.enter("list_customer_configs")?.configs.clone())
    }
}
