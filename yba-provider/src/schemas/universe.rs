//! Universe schema definition
//!
//! Only `num_nodes`, `instance_type` and `software_version` can change in
//! place. Identity attributes force replacement; everything else is rejected
//! at update time.

use yba_core::resource::Value;
use yba_core::schema::{AttributeSchema, AttributeType, ResourceSchema, types};

use super::{UNIVERSE, common, types as yba_types};

/// Attributes an existing universe can change without replacement
pub const UPDATABLE: &[&str] = &["num_nodes", "instance_type", "software_version"];

/// Attributes that only affect how the universe is destroyed
pub const DELETE_FLAGS: &[&str] = &["force_delete", "delete_backups", "delete_certs"];

pub fn schema() -> ResourceSchema {
    ResourceSchema::new(UNIVERSE)
        .with_description("A YugabyteDB universe with a single primary cluster")
        .attribute(
            AttributeSchema::new("name", AttributeType::String)
                .required()
                .force_new(),
        )
        .attribute(
            AttributeSchema::new("provider_uuid", yba_types::uuid())
                .required()
                .force_new(),
        )
        .attribute(
            AttributeSchema::new("provider_type", yba_types::provider_type())
                .required()
                .force_new(),
        )
        .attribute(
            AttributeSchema::new("region_list", types::string_list())
                .required()
                .with_description("UUIDs of the provider regions to place nodes in"),
        )
        .attribute(
            AttributeSchema::new("replication_factor", types::positive_int())
                .with_default(Value::Int(3))
                .force_new(),
        )
        .attribute(AttributeSchema::new("num_nodes", types::positive_int()).required())
        .attribute(AttributeSchema::new("instance_type", AttributeType::String).required())
        .attribute(AttributeSchema::new("software_version", AttributeType::String).required())
        .attribute(AttributeSchema::new("access_key_code", AttributeType::String).optional_computed())
        .attribute(AttributeSchema::new("volume_size", types::positive_int()).required())
        .attribute(
            AttributeSchema::new("num_volumes", types::positive_int()).with_default(Value::Int(1)),
        )
        .attribute(AttributeSchema::new("storage_type", AttributeType::String))
        .attribute(
            AttributeSchema::new("enable_ysql", AttributeType::Bool).with_default(Value::Bool(true)),
        )
        .attribute(
            AttributeSchema::new("enable_ycql", AttributeType::Bool).with_default(Value::Bool(true)),
        )
        .attribute(
            AttributeSchema::new("assign_public_ip", AttributeType::Bool)
                .with_default(Value::Bool(false)),
        )
        .attribute(
            AttributeSchema::new("use_time_sync", AttributeType::Bool)
                .with_default(Value::Bool(true)),
        )
        .attribute(
            AttributeSchema::new("force_delete", AttributeType::Bool)
                .with_default(Value::Bool(false))
                .write_only(),
        )
        .attribute(
            AttributeSchema::new("delete_backups", AttributeType::Bool)
                .with_default(Value::Bool(false))
                .write_only(),
        )
        .attribute(
            AttributeSchema::new("delete_certs", AttributeType::Bool)
                .with_default(Value::Bool(false))
                .write_only(),
        )
        .attribute(common::id())
        .attribute(common::timeouts())
}
