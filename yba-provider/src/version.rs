//! YBA version parsing and feature gates

use std::cmp::Ordering;
use std::fmt;

use yba_core::provider::{ProviderError, ProviderResult};

use crate::api::YbaApi;

/// First version that exposes failed sub-task details of a task
pub const FAILED_SUBTASKS_MIN_VERSION: &str = "2.17.1.0";

/// First version that accepts an incremental frequency on backup schedules
pub const INCREMENTAL_BACKUP_MIN_VERSION: &str = "2.18.1.0";

/// Dotted release number with optional build, e.g. `2.20.1.0-b97`
#[derive(Debug, Clone)]
pub struct YbaVersion {
    parts: Vec<u64>,
    build: Option<u64>,
    raw: String,
}

impl YbaVersion {
    pub fn parse(raw: &str) -> Result<Self, String> {
        let trimmed = raw.trim();
        let (release, build) = match trimmed.split_once("-b") {
            Some((release, build)) => (release, build.parse::<u64>().ok()),
            None => (trimmed, None),
        };

        let parts = release
            .split('.')
            .map(|p| {
                p.parse::<u64>()
                    .map_err(|_| format!("Invalid YBA version '{}'", raw))
            })
            .collect::<Result<Vec<_>, _>>()?;

        if parts.is_empty() {
            return Err(format!("Invalid YBA version '{}'", raw));
        }

        Ok(Self {
            parts,
            build,
            raw: trimmed.to_string(),
        })
    }

    pub fn is_at_least(&self, minimum: &YbaVersion) -> bool {
        self >= minimum
    }
}

impl Ord for YbaVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        let len = self.parts.len().max(other.parts.len());
        for i in 0..len {
            let a = self.parts.get(i).copied().unwrap_or(0);
            let b = other.parts.get(i).copied().unwrap_or(0);
            match a.cmp(&b) {
                Ordering::Equal => continue,
                ord => return ord,
            }
        }
        self.build.unwrap_or(0).cmp(&other.build.unwrap_or(0))
    }
}

impl PartialEq for YbaVersion {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for YbaVersion {}

impl PartialOrd for YbaVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for YbaVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

/// Whether the connected YBA is at least `minimum`
pub async fn supports(api: &dyn YbaApi, minimum: &str) -> ProviderResult<bool> {
    let current = api.app_version().await?;
    let current = YbaVersion::parse(&current).map_err(ProviderError::new)?;
    let minimum = YbaVersion::parse(minimum).map_err(ProviderError::new)?;
    Ok(current.is_at_least(&minimum))
}

/// Fail with a validation error naming `feature` unless YBA is at least `minimum`
pub async fn require(api: &dyn YbaApi, minimum: &str, feature: &str) -> ProviderResult<()> {
    let current = api.app_version().await?;
    let parsed = YbaVersion::parse(&current).map_err(ProviderError::new)?;
    let min = YbaVersion::parse(minimum).map_err(ProviderError::new)?;
    if parsed.is_at_least(&min) {
        Ok(())
    } else {
        Err(ProviderError::validation(format!(
            "{} requires YugabyteDB Anywhere {} or later, connected version is {}",
            feature, minimum, current
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(s: &str) -> YbaVersion {
        YbaVersion::parse(s).unwrap()
    }

    #[test]
    fn compares_numerically() {
        assert!(v("2.17.1.0") > v("2.9.0.0"));
        assert!(v("2.18.0.0-b12") > v("2.18.0.0-b9"));
        assert!(v("2.20") == v("2.20.0.0"));
        assert!(v("2.17.1.0-b5").is_at_least(&v(FAILED_SUBTASKS_MIN_VERSION)));
        assert!(!v("2.16.9.0-b100").is_at_least(&v(FAILED_SUBTASKS_MIN_VERSION)));
    }

    #[test]
    fn rejects_garbage() {
        assert!(YbaVersion::parse("").is_err());
        assert!(YbaVersion::parse("2.x.1").is_err());
    }

    #[test]
    fn display_keeps_original_text() {
        assert_eq!(v(" 2.20.1.0-b97 ").to_string(), "2.20.1.0-b97");
    }
}
