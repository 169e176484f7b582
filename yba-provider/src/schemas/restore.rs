//! Restore schema definition
//!
//! A restore is a one-shot action: it runs on create and is only dropped from
//! state on destroy.

use yba_core::resource::Value;
use yba_core::schema::{AttributeSchema, AttributeType, ResourceSchema, types};

use super::{RESTORE, common, types as yba_types};

pub fn schema() -> ResourceSchema {
    ResourceSchema::new(RESTORE)
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
            AttributeSchema::new("keyspace", AttributeType::String)
                .required()
                .force_new(),
        )
        .attribute(
            AttributeSchema::new("storage_location", AttributeType::String)
                .required()
                .force_new(),
        )
        .attribute(
            AttributeSchema::new("restore_type", yba_types::table_type())
                .with_default(Value::String("PGSQL_TABLE_TYPE".to_string()))
                .force_new(),
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
        .attribute(common::id())
        .attribute(common::timeouts())
}
