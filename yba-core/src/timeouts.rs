//! Per-operation timeouts declared in a `timeouts` block

use std::collections::HashMap;
use std::time::Duration;

use crate::resource::Value;

/// Create/update/delete timeouts for one resource
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timeouts {
    pub create: Duration,
    pub update: Duration,
    pub delete: Duration,
}

impl Timeouts {
    /// Same timeout for every operation
    pub const fn uniform(timeout: Duration) -> Self {
        Self {
            create: timeout,
            update: timeout,
            delete: timeout,
        }
    }

    /// Read overrides from the `timeouts` attribute, falling back to `self`
    pub fn with_overrides(self, attributes: &HashMap<String, Value>) -> Result<Self, String> {
        let Some(block) = attributes.get("timeouts").and_then(Value::as_map) else {
            return Ok(self);
        };

        let pick = |key: &str, fallback: Duration| -> Result<Duration, String> {
            match block.get(key) {
                Some(Value::String(s)) => {
                    let timeout = parse_duration(s)?;
                    if timeout.is_zero() {
                        return Err(format!("timeouts.{}: must be greater than zero", key));
                    }
                    Ok(timeout)
                }
                Some(other) => Err(format!(
                    "timeouts.{}: expected duration string, got {:?}",
                    key, other
                )),
                None => Ok(fallback),
            }
        };

        Ok(Self {
            create: pick("create", self.create)?,
            update: pick("update", self.update)?,
            delete: pick("delete", self.delete)?,
        })
    }
}

/// Parse a duration such as "45s", "10m", "1h" or "1h30m"
pub fn parse_duration(input: &str) -> Result<Duration, String> {
    let s = input.trim();
    if s.is_empty() {
        return Err("Empty duration".to_string());
    }

    let mut total = 0u64;
    let mut digits = String::new();
    for c in s.chars() {
        if c.is_ascii_digit() {
            digits.push(c);
            continue;
        }
        let unit = match c {
            's' => 1,
            'm' => 60,
            'h' => 3600,
            _ => return Err(format!("Invalid duration '{}': unknown unit '{}'", input, c)),
        };
        let n: u64 = digits.parse().map_err(|_| {
            format!("Invalid duration '{}': missing number before '{}'", input, c)
        })?;
        total = n
            .checked_mul(unit)
            .and_then(|secs| total.checked_add(secs))
            .ok_or_else(|| format!("Invalid duration '{}': too large", input))?;
        digits.clear();
    }

    if !digits.is_empty() {
        return Err(format!("Invalid duration '{}': missing unit", input));
    }

    Ok(Duration::from_secs(total))
}

/// Render a duration in the largest whole unit, e.g. `24h`, `90m`, `45s`
pub fn format_duration(duration: Duration) -> String {
    let secs = duration.as_secs();
    if secs > 0 && secs % 3600 == 0 {
        format!("{}h", secs / 3600)
    } else if secs > 0 && secs % 60 == 0 {
        format!("{}m", secs / 60)
    } else {
        format!("{}s", secs)
    }
}
