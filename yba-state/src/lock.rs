//! Lock held while a command reads and writes state

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Seconds after which a lock is considered abandoned
pub const DEFAULT_LOCK_TTL_SECS: i64 = 2 * 60 * 60;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LockInfo {
    pub id: String,
    /// Command holding the lock, e.g. `apply`
    pub operation: String,
    /// `user@host`
    pub who: String,
    pub created: DateTime<Utc>,
    pub expires: DateTime<Utc>,
}

impl LockInfo {
    pub fn new(operation: impl Into<String>) -> Self {
        Self::with_ttl(operation, Duration::seconds(DEFAULT_LOCK_TTL_SECS))
    }

    pub fn with_ttl(operation: impl Into<String>, ttl: Duration) -> Self {
        let now = Utc::now();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            operation: operation.into(),
            who: lock_owner(),
            created: now,
            expires: now + ttl,
        }
    }

    pub fn is_expired(&self) -> bool {
        Utc::now() > self.expires
    }
}

fn lock_owner() -> String {
    let user = std::env::var("USER")
        .or_else(|_| std::env::var("USERNAME"))
        .unwrap_or_else(|_| "unknown".to_string());
    let host = hostname::get()
        .ok()
        .and_then(|h| h.into_string().ok())
        .unwrap_or_else(|| "unknown".to_string());
    format!("{}@{}", user, host)
}
