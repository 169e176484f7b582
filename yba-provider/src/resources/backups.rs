//! yba_backups - scheduled backups of a universe
//!
//! Durations are declared as text ("24h") and sent in milliseconds. Reads
//! keep the declared text when it denotes the same interval.

use std::collections::HashMap;
use std::time::Duration;

use serde_json::Value as JsonValue;
use tracing::{info, warn};
use yba_core::provider::ProviderResult;
use yba_core::resource::{Resource, ResourceId, State, Value};
use yba_core::timeouts::{format_duration, parse_duration};

use super::{Attrs, changed_attributes, existing, identifier, insert_opt, string};
use crate::models::{BackupScheduleRequest, KeyspaceTable, Schedule, ScheduleEdit};
use crate::provider::YbaProvider;
use crate::version::{self, INCREMENTAL_BACKUP_MIN_VERSION};

const ACTIVE: &str = "Active";

fn millis(duration: Duration) -> i64 {
    i64::try_from(duration.as_millis()).unwrap_or(i64::MAX)
}

/// `TimeUnit` YBA displays a frequency in
fn time_unit(frequency: Option<Duration>) -> &'static str {
    match frequency.map(format_duration) {
        Some(text) if text.ends_with('s') => "SECONDS",
        Some(text) if text.ends_with('m') => "MINUTES",
        _ => "HOURS",
    }
}

/// Cron expression or fixed frequency; exactly one is declared
fn schedule_spec(attrs: &Attrs<'_>) -> ProviderResult<(Option<String>, Option<Duration>)> {
    let cron = attrs.opt_str("cron_expression")?;
    let frequency = attrs.opt_duration("frequency")?;
    match (&cron, &frequency) {
        (Some(_), Some(_)) => Err(attrs.error("Only one of cron_expression or frequency can be set")),
        (None, None) => Err(attrs.error("One of cron_expression or frequency is required")),
        _ => Ok((cron, frequency)),
    }
}

fn schedule_request(attrs: &Attrs<'_>) -> ProviderResult<BackupScheduleRequest> {
    let (cron_expression, frequency) = schedule_spec(attrs)?;
    let incremental = attrs.opt_duration("incremental_backup_frequency")?;
    if let (Some(incremental), Some(frequency)) = (incremental, frequency)
        && incremental >= frequency
    {
        return Err(attrs.error(format!(
            "incremental_backup_frequency ({}) must be shorter than frequency ({})",
            format_duration(incremental),
            format_duration(frequency)
        )));
    }

    Ok(BackupScheduleRequest {
        schedule_name: attrs.str("schedule_name")?,
        universe_uuid: attrs.str("universe_uuid")?,
        storage_config_uuid: attrs.str("storage_config_uuid")?,
        backup_type: attrs
            .opt_str("backup_type")?
            .unwrap_or_else(|| "YQL_TABLE_TYPE".to_string()),
        keyspace_table_list: attrs
            .opt_str("keyspace")?
            .map(|keyspace| vec![KeyspaceTable { keyspace }])
            .unwrap_or_default(),
        cron_expression,
        scheduling_frequency: frequency.map(millis),
        incremental_backup_frequency: incremental.map(millis),
        time_before_delete: attrs.opt_duration("time_before_delete")?.map(millis).unwrap_or(0),
        sse: attrs.bool_or("sse", false)?,
        parallelism: attrs.int_or("parallelism", 8)?,
    })
}

/// Duration attribute for `ms`, keeping `prior` text when it is equivalent
fn duration_value(ms: i64, prior: Option<&Value>) -> Value {
    let duration = Duration::from_millis(u64::try_from(ms).unwrap_or_default());
    match prior.and_then(Value::as_str) {
        Some(text) if parse_duration(text).ok() == Some(duration) => string(text),
        _ => string(format_duration(duration)),
    }
}

fn schedule_attributes(schedule: &Schedule, prior: &HashMap<String, Value>) -> HashMap<String, Value> {
    let params = &schedule.task_params;
    let param_str = |key: &str| params.get(key).and_then(JsonValue::as_str).map(string);
    let param_ms = |key: &str| params.get(key).and_then(JsonValue::as_i64).filter(|ms| *ms > 0);

    let mut attributes = HashMap::new();
    insert_opt(
        &mut attributes,
        "schedule_name",
        schedule
            .schedule_name
            .as_deref()
            .map(string)
            .or_else(|| param_str("scheduleName")),
    );
    insert_opt(&mut attributes, "universe_uuid", param_str("universeUUID"));
    insert_opt(&mut attributes, "storage_config_uuid", param_str("storageConfigUUID"));
    insert_opt(&mut attributes, "backup_type", param_str("backupType"));
    insert_opt(
        &mut attributes,
        "keyspace",
        params
            .get("keyspaceTableList")
            .and_then(|list| list.get(0))
            .and_then(|entry| entry.get("keyspace"))
            .and_then(JsonValue::as_str)
            .map(string),
    );
    insert_opt(
        &mut attributes,
        "sse",
        params.get("sse").and_then(JsonValue::as_bool).map(Value::Bool),
    );
    insert_opt(
        &mut attributes,
        "parallelism",
        params.get("parallelism").and_then(JsonValue::as_i64).map(Value::Int),
    );

    match &schedule.cron_expression {
        Some(cron) => {
            attributes.insert("cron_expression".to_string(), string(cron));
        }
        None => insert_opt(
            &mut attributes,
            "frequency",
            schedule
                .frequency
                .map(|ms| duration_value(ms, prior.get("frequency"))),
        ),
    }
    insert_opt(
        &mut attributes,
        "incremental_backup_frequency",
        param_ms("incrementalBackupFrequency")
            .map(|ms| duration_value(ms, prior.get("incremental_backup_frequency"))),
    );
    insert_opt(
        &mut attributes,
        "time_before_delete",
        param_ms("timeBeforeDelete").map(|ms| duration_value(ms, prior.get("time_before_delete"))),
    );
    attributes
}

impl YbaProvider {
    pub(crate) async fn create_backups(&self, resource: &Resource) -> ProviderResult<State> {
        let attrs = Attrs::new(&resource.id, &resource.attributes);
        let request = schedule_request(&attrs)?;
        if request.incremental_backup_frequency.is_some() {
            version::require(
                self.api.as_ref(),
                INCREMENTAL_BACKUP_MIN_VERSION,
                "incremental_backup_frequency",
            )
            .await
            .map_err(|e| e.for_resource(resource.id.clone()))?;
        }

        let schedule = self.api.create_backup_schedule(&request).await?;
        info!(
            schedule_uuid = %schedule.schedule_uuid,
            universe_uuid = %request.universe_uuid,
            "created backup schedule"
        );
        Ok(existing(
            &resource.id,
            &schedule.schedule_uuid,
            schedule_attributes(&schedule, &resource.attributes),
        ))
    }

    pub(crate) async fn read_backups(&self, id: &ResourceId, prior: &State) -> ProviderResult<State> {
        let uuid = identifier(prior)?;
        let schedule = self.api.get_schedule(uuid).await?;
        Ok(existing(id, uuid, schedule_attributes(&schedule, &prior.attributes)))
    }

    /// Change the cron expression or frequency of the schedule
    pub(crate) async fn update_backups(&self, from: &State, to: &Resource) -> ProviderResult<State> {
        let uuid = identifier(from)?;
        let attrs = Attrs::new(&to.id, &to.attributes);
        let changed = changed_attributes(from, &to.attributes);

        let schedule = if changed
            .iter()
            .any(|c| c == "cron_expression" || c == "frequency")
        {
            let (cron_expression, frequency) = schedule_spec(&attrs)?;
            let edit = ScheduleEdit {
                cron_expression,
                frequency: frequency.map(millis),
                frequency_time_unit: time_unit(frequency).to_string(),
                status: ACTIVE.to_string(),
            };
            let schedule = self.api.edit_schedule(uuid, &edit).await?;
            info!(schedule_uuid = %uuid, "updated backup schedule");
            schedule
        } else {
            self.api.get_schedule(uuid).await?
        };

        Ok(existing(&to.id, uuid, schedule_attributes(&schedule, &to.attributes)))
    }

    /// Delete the schedule, then its backups when `delete_backup` is set
    pub(crate) async fn delete_backups(&self, state: &State) -> ProviderResult<()> {
        let uuid = identifier(state)?;
        let attrs = Attrs::new(&state.id, &state.attributes);

        self.api.delete_schedule(uuid).await?;
        info!(schedule_uuid = %uuid, "deleted backup schedule");

        if !attrs.bool_or("delete_backup", false)? {
            return Ok(());
        }
        let backups = match self.api.list_schedule_backups(uuid).await {
            Ok(backups) => backups,
            Err(e) => {
                warn!(schedule_uuid = %uuid, error = %e, "could not list schedule backups");
                return Ok(());
            }
        };
        let backup_uuids: Vec<String> = backups.into_iter().map(|b| b.backup_uuid).collect();
        if backup_uuids.is_empty() {
            return Ok(());
        }
        match self.api.delete_backups(&backup_uuids).await {
            Ok(()) => info!(schedule_uuid = %uuid, count = backup_uuids.len(), "deleted backups"),
            Err(e) => warn!(schedule_uuid = %uuid, error = %e, "could not delete backups"),
        }
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
        Resource::new("yba_backups", "nightly")
            .with_attribute(
                "universe_uuid",
                string("f33e3c9b-75ab-4c30-80ad-cba85646ea39"),
            )
            .with_attribute(
                "storage_config_uuid",
                string("0b9e2f14-4f3e-4f5a-9b55-6f5b7e4d2c11"),
            )
            .with_attribute("schedule_name", string("nightly"))
            .with_attribute("keyspace", string("orders"))
            .with_attribute("frequency", string("1440m"))
            .with_attribute("time_before_delete", string("168h"))
    }

    fn provider(api: &Arc<MockApi>) -> YbaProvider {
        YbaProvider::with_api(api.clone(), Duration::from_millis(10))
    }

    #[tokio::test]
    async fn durations_are_sent_in_milliseconds_and_read_back_as_declared() {
        let api = Arc::new(MockApi::new());
        let resource = resource();

        let state = provider(&api).create_backups(&resource).await.unwrap();

        let request = api.last_schedule_request().unwrap();
        assert_eq!(request.scheduling_frequency, Some(86_400_000));
        assert_eq!(request.time_before_delete, 604_800_000);
        assert_eq!(request.keyspace_table_list[0].keyspace, "orders");
        assert_eq!(state.attributes["frequency"], string("1440m"));
        assert_eq!(state.attributes["time_before_delete"], string("168h"));
        assert_eq!(state.attributes["keyspace"], string("orders"));
        assert_eq!(state.attributes["backup_type"], string("YQL_TABLE_TYPE"));
    }

    #[tokio::test]
    async fn incremental_requires_a_recent_yba() {
        let api = Arc::new(MockApi::new().with_version("2.16.0.0-b10"));
        let resource = resource().with_attribute("incremental_backup_frequency", string("1h"));

        let err = provider(&api).create_backups(&resource).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::Validation);
        assert!(err.message.contains(INCREMENTAL_BACKUP_MIN_VERSION));
        assert!(!api.calls().contains(&"create_backup_schedule".to_string()));
    }

    #[tokio::test]
    async fn incremental_must_be_shorter_than_full() {
        let api = Arc::new(MockApi::new());
        let resource = resource().with_attribute("incremental_backup_frequency", string("24h"));

        let err = provider(&api).create_backups(&resource).await.unwrap_err();
        assert!(err.message.contains("must be shorter"));
    }

    #[tokio::test]
    async fn missing_schedule_is_rejected() {
        let api = Arc::new(MockApi::new());
        let mut resource = resource();
        resource.attributes.remove("frequency");

        let err = provider(&api).create_backups(&resource).await.unwrap_err();
        assert!(err.message.contains("cron_expression or frequency"));
    }

    #[tokio::test]
    async fn switching_to_cron_edits_the_schedule() {
        let api = Arc::new(MockApi::new());
        let yba = provider(&api);
        let created = yba.create_backups(&resource()).await.unwrap();

        let mut to = resource().with_attribute("cron_expression", string("0 2 * * *"));
        to.attributes.remove("frequency");
        let updated = yba.update_backups(&created, &to).await.unwrap();

        assert_eq!(updated.attributes["cron_expression"], string("0 2 * * *"));
        assert!(!updated.attributes.contains_key("frequency"));
        assert!(api.calls().contains(&"edit_schedule".to_string()));
    }

    #[tokio::test]
    async fn delete_removes_backups_only_when_asked() {
        let api = Arc::new(MockApi::new());
        let yba = provider(&api);

        let kept = yba.create_backups(&resource()).await.unwrap();
        api.add_backup(kept.identifier.as_deref().unwrap());
        yba.delete_backups(&kept).await.unwrap();
        assert_eq!(api.backups().len(), 1);

        let mut dropped = yba.create_backups(&resource()).await.unwrap();
        api.add_backup(dropped.identifier.as_deref().unwrap());
        dropped
            .attributes
            .insert("delete_backup".to_string(), Value::Bool(true));
        yba.delete_backups(&dropped).await.unwrap();
        assert_eq!(api.backups().len(), 1);
        assert_eq!(
            api.backups()[0].schedule_uuid.as_deref(),
            kept.identifier.as_deref()
        );
    }
}
