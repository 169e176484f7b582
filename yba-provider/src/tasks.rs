//! Waiting for YBA tasks
//!
//! Wraps the core poller with the task status endpoint and, on failure,
//! adds the failed sub-task messages when the connected YBA exposes them.

use std::time::Duration;

use tracing::{info, warn};
use yba_core::provider::{ErrorKind, ProviderError, ProviderResult};
use yba_core::task::{self, PollConfig};

use crate::api::YbaApi;
use crate::models::YbaTask;
use crate::version::{self, FAILED_SUBTASKS_MIN_VERSION};

/// Wait until `task_uuid` succeeds, fails, or `timeout` elapses
pub async fn wait_for_task(
    api: &dyn YbaApi,
    task_uuid: &str,
    timeout: Duration,
    interval: Duration,
) -> ProviderResult<()> {
    info!(task_uuid, "waiting for task");
    let config = PollConfig::new(timeout).with_interval(interval);

    let result = task::wait_for_task(task_uuid, config, |id: &str| {
        let id = id.to_string();
        async move {
            api.task_status(&id)
                .await
                .map(|t| t.status)
                .map_err(ProviderError::from)
        }
    })
    .await;

    match result {
        Err(err) if err.kind == ErrorKind::TaskFailed => {
            Err(with_failed_subtasks(api, task_uuid, err).await)
        }
        other => other,
    }
}

/// Wait for the task of a mutating call, if it returned one
pub async fn wait_for_response(
    api: &dyn YbaApi,
    response: &YbaTask,
    timeout: Duration,
    interval: Duration,
) -> ProviderResult<()> {
    match response.task_uuid.as_deref() {
        Some(task_uuid) => wait_for_task(api, task_uuid, timeout, interval).await,
        None => Ok(()),
    }
}

async fn with_failed_subtasks(
    api: &dyn YbaApi,
    task_uuid: &str,
    mut err: ProviderError,
) -> ProviderError {
    match failed_subtask_messages(api, task_uuid).await {
        Ok(messages) if !messages.is_empty() => {
            err.message = format!("{}: {}", err.message, messages.join("; "));
        }
        Ok(_) => {}
        Err(lookup_err) => {
            warn!(task_uuid, error = %lookup_err, "could not fetch failed sub-tasks");
        }
    }
    err
}

async fn failed_subtask_messages(api: &dyn YbaApi, task_uuid: &str) -> ProviderResult<Vec<String>> {
    if !version::supports(api, FAILED_SUBTASKS_MIN_VERSION).await? {
        return Ok(Vec::new());
    }
    let failed = api.failed_subtasks(task_uuid).await?;
    Ok(failed
        .into_iter()
        .map(|s| format!("[{}] {}", s.sub_task_type, s.error_string))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockApi;

    const TIMEOUT: Duration = Duration::from_secs(60);
    const INTERVAL: Duration = Duration::from_secs(1);

    #[tokio::test(start_paused = true)]
    async fn succeeds_after_running() {
        let api = MockApi::new();
        api.script_task("t-1", &["Running", "Running", "Success"]);

        wait_for_task(&api, "t-1", TIMEOUT, INTERVAL).await.unwrap();
        assert_eq!(api.status_probes("t-1"), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn failure_includes_subtask_messages() {
        let api = MockApi::new().with_version("2.20.1.0-b97");
        api.script_task("t-1", &["Running", "Failure"]);
        api.fail_subtask("t-1", "CreateServer", "quota exceeded");

        let err = wait_for_task(&api, "t-1", TIMEOUT, INTERVAL)
            .await
            .unwrap_err();

        assert_eq!(err.kind, ErrorKind::TaskFailed);
        assert!(err.message.contains("Failure"));
        assert!(err.message.contains("[CreateServer] quota exceeded"));
    }

    #[tokio::test(start_paused = true)]
    async fn old_versions_report_only_status() {
        let api = MockApi::new().with_version("2.16.0.0-b10");
        api.script_task("t-1", &["Failure"]);
        api.fail_subtask("t-1", "CreateServer", "quota exceeded");

        let err = wait_for_task(&api, "t-1", TIMEOUT, INTERVAL)
            .await
            .unwrap_err();

        assert_eq!(err.kind, ErrorKind::TaskFailed);
        assert!(!err.message.contains("quota exceeded"));
    }

    #[tokio::test(start_paused = true)]
    async fn unknown_task_is_a_fetch_error() {
        let api = MockApi::new();
        let err = wait_for_task(&api, "missing", TIMEOUT, INTERVAL)
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn responses_without_task_do_not_poll() {
        let api = MockApi::new();
        wait_for_response(&api, &YbaTask::default(), TIMEOUT, INTERVAL)
            .await
            .unwrap();
    }
}
