//! YBA-specific type definitions

use yba_core::resource::Value;
use yba_core::schema::AttributeType;

/// Cloud codes accepted by `yba_cloud_provider`
pub const CLOUD_CODES: &[&str] = &["aws", "gcp", "azu"];

/// Provider types a universe can be placed on
pub const PROVIDER_TYPES: &[&str] = &["aws", "gcp", "azu", "onprem"];

pub const USER_ROLES: &[&str] = &["Admin", "BackupAdmin", "ReadOnly", "SuperAdmin", "ConnectOnly"];

pub const TABLE_TYPES: &[&str] = &["YQL_TABLE_TYPE", "PGSQL_TABLE_TYPE", "REDIS_TABLE_TYPE"];

fn enum_of(values: &[&str]) -> AttributeType {
    AttributeType::Enum(values.iter().map(|v| v.to_string()).collect())
}

pub fn cloud_code() -> AttributeType {
    enum_of(CLOUD_CODES)
}

pub fn provider_type() -> AttributeType {
    enum_of(PROVIDER_TYPES)
}

pub fn user_role() -> AttributeType {
    enum_of(USER_ROLES)
}

pub fn table_type() -> AttributeType {
    enum_of(TABLE_TYPES)
}

/// UUID in canonical 8-4-4-4-12 hex form
pub fn uuid() -> AttributeType {
    AttributeType::Custom {
        name: "Uuid".to_string(),
        base: Box::new(AttributeType::String),
        validate: |value| match value {
            Value::String(s) if is_uuid(s) => Ok(()),
            Value::String(s) => Err(format!("'{}' is not a valid UUID", s)),
            _ => Err("Expected string".to_string()),
        },
    }
}

fn is_uuid(s: &str) -> bool {
    s.len() == 36 && ::uuid::Uuid::try_parse(s).is_ok()
}

/// Cron expression with five (or six, with seconds) fields
pub fn cron_expression() -> AttributeType {
    AttributeType::Custom {
        name: "CronExpression".to_string(),
        base: Box::new(AttributeType::String),
        validate: |value| match value {
            Value::String(s) => {
                let fields = s.split_whitespace().count();
                if fields == 5 || fields == 6 {
                    Ok(())
                } else {
                    Err(format!(
                        "Cron expression '{}' must have 5 or 6 fields, got {}",
                        s, fields
                    ))
                }
            }
            _ => Err("Expected string".to_string()),
        },
    }
}
