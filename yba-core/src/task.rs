//! Task - Wait for asynchronous remote tasks to finish
//!
//! Mutating YBA calls return a task UUID. The poller queries the task status
//! at a fixed interval until it reaches a terminal state or the caller's
//! timeout elapses.

use std::future::Future;
use std::time::Duration;

use tokio::time::Instant;
use tracing::{debug, warn};

use crate::provider::{ErrorKind, ProviderError, ProviderResult};

/// Default interval between status probes
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Status of a remote task
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskStatus {
    Created,
    Initializing,
    Running,
    /// Abort requested, still in progress
    Abort,
    Success,
    Failure,
    Aborted,
    /// Any status string outside the known set
    Other(String),
}

impl TaskStatus {
    pub fn parse(status: &str) -> Self {
        match status {
            "Created" => TaskStatus::Created,
            "Initializing" => TaskStatus::Initializing,
            "Running" => TaskStatus::Running,
            "Abort" => TaskStatus::Abort,
            "Success" => TaskStatus::Success,
            "Failure" => TaskStatus::Failure,
            "Aborted" => TaskStatus::Aborted,
            other => TaskStatus::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            TaskStatus::Created => "Created",
            TaskStatus::Initializing => "Initializing",
            TaskStatus::Running => "Running",
            TaskStatus::Abort => "Abort",
            TaskStatus::Success => "Success",
            TaskStatus::Failure => "Failure",
            TaskStatus::Aborted => "Aborted",
            TaskStatus::Other(s) => s,
        }
    }

    pub fn is_pending(&self) -> bool {
        matches!(
            self,
            TaskStatus::Created | TaskStatus::Initializing | TaskStatus::Running | TaskStatus::Abort
        )
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, TaskStatus::Failure | TaskStatus::Aborted)
    }
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Polling parameters
#[derive(Debug, Clone, Copy)]
pub struct PollConfig {
    pub interval: Duration,
    pub timeout: Duration,
}

impl PollConfig {
    pub fn new(timeout: Duration) -> Self {
        Self {
            interval: DEFAULT_POLL_INTERVAL,
            timeout,
        }
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }
}

/// Poll `fetch_status` until the task succeeds, fails, or `config.timeout` elapses
///
/// The elapsed time is checked before every probe, so no probe is issued
/// after the deadline. Errors from `fetch_status` are returned immediately.
/// Failure statuses produce an `ErrorKind::TaskFailed` error; statuses outside
/// the known set keep polling.
pub async fn wait_for_task<F, Fut>(
    task_id: &str,
    config: PollConfig,
    mut fetch_status: F,
) -> ProviderResult<()>
where
    F: FnMut(&str) -> Fut,
    Fut: Future<Output = ProviderResult<String>>,
{
    let start = Instant::now();
    let mut last_status: Option<TaskStatus> = None;

    loop {
        let elapsed = start.elapsed();
        if elapsed >= config.timeout {
            let last = last_status
                .as_ref()
                .map(TaskStatus::as_str)
                .unwrap_or("unknown");
            return Err(ProviderError::new(format!(
                "Timed out after {:?} waiting for task {} (last status: {}); \
                 the task may still be running",
                elapsed, task_id, last
            ))
            .with_kind(ErrorKind::Timeout));
        }

        let status = TaskStatus::parse(&fetch_status(task_id).await?);
        debug!(task_uuid = task_id, status = %status, "polled task status");

        if status == TaskStatus::Success {
            return Ok(());
        }
        if status.is_failure() {
            return Err(ProviderError::new(format!(
                "Task {} finished with status {}",
                task_id, status
            ))
            .with_kind(ErrorKind::TaskFailed));
        }
        if let TaskStatus::Other(ref s) = status {
            warn!(task_uuid = task_id, status = %s, "unrecognized task status, still waiting");
        }

        last_status = Some(status);
        tokio::time::sleep(config.interval).await;
    }
}
