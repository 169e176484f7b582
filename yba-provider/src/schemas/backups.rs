//! Backup schedule schema definition

use yba_core::resource::Value;
use yba_core::schema::{AttributeSchema, AttributeType, ResourceSchema, types};

use super::{BACKUPS, common, types as yba_types};

pub fn schema() -> ResourceSchema {
    ResourceSchema::new(BACKUPS)
        .with_description("A scheduled backup policy for a universe")
        .attribute(
            AttributeSchema::new("universe_uuid", yba_types::uuid())
                .required()
                .force_new(),
        )
        .attribute(
            AttributeSchema::new("storage_config_uuid", yba_types::uuid())
                .required()
                .force_new(),
        )
        .attribute(
            AttributeSchema::new("schedule_name", AttributeType::String)
                .required()
                .force_new(),
        )
        .attribute(
            AttributeSchema::new("backup_type", yba_types::table_type())
                .with_default(Value::String("YQL_TABLE_TYPE".to_string()))
                .force_new(),
        )
        .attribute(
            AttributeSchema::new("keyspace", AttributeType::String)
                .force_new()
                .with_description("Keyspace or database to back up; all of them when omitted"),
        )
        .attribute(
            AttributeSchema::new("cron_expression", yba_types::cron_expression())
                .conflicts_with("frequency"),
        )
        .attribute(
            AttributeSchema::new("frequency", types::duration()).conflicts_with("cron_expression"),
        )
        .attribute(
            AttributeSchema::new("incremental_backup_frequency", types::duration())
                .force_new()
                .with_description("Must be shorter than the full backup frequency"),
        )
        .attribute(
            AttributeSchema::new("time_before_delete", types::duration())
                .force_new()
                .with_description("Retention of each backup; kept forever when omitted"),
        )
        .attribute(
            AttributeSchema::new("sse", AttributeType::Bool)
                .with_default(Value::Bool(false))
                .force_new(),
        )
        .attribute(
            AttributeSchema::new("parallelism", types::positive_int())
                .with_default(Value::Int(8))
                .force_new(),
        )
        .attribute(
            AttributeSchema::new("delete_backup", AttributeType::Bool)
                .with_default(Value::Bool(false))
                .write_only()
                .with_description("Delete the backups taken by this schedule on destroy"),
        )
        .attribute(common::id())
        .attribute(common::timeouts())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn attrs() -> HashMap<String, Value> {
        HashMap::from([
            (
                "universe_uuid".to_string(),
                Value::String("f33e3c9b-75ab-4c30-80ad-cba85646ea39".to_string()),
            ),
            (
                "storage_config_uuid".to_string(),
                Value::String("0b9e2f14-4f3e-4f5a-9b55-6f5b7e4d2c11".to_string()),
            ),
            ("schedule_name".to_string(), Value::String("nightly".to_string())),
        ])
    }

    #[test]
    fn cron_and_frequency_conflict() {
        let mut attrs = attrs();
        attrs.insert("cron_expression".to_string(), Value::String("0 2 * * *".to_string()));
        attrs.insert("frequency".to_string(), Value::String("24h".to_string()));

        let errors = schema().validate(&attrs).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].to_string().contains("cannot be set together"));
    }

    #[test]
    fn frequency_must_be_a_duration() {
        let mut attrs = attrs();
        attrs.insert("frequency".to_string(), Value::String("daily".to_string()));
        assert!(schema().validate(&attrs).is_err());

        attrs.insert("frequency".to_string(), Value::String("12h".to_string()));
        assert!(schema().validate(&attrs).is_ok());
    }
}
