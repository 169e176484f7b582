//! On-premises node instance schema definition

use yba_core::schema::{AttributeSchema, AttributeType, ResourceSchema, types};

use super::{NODE_INSTANCE, common, types as yba_types};

pub fn schema() -> ResourceSchema {
    let identity = |name: &str| {
        AttributeSchema::new(name, AttributeType::String)
            .required()
            .force_new()
    };

    ResourceSchema::new(NODE_INSTANCE)
        .with_description("A machine registered with an on-premises provider")
        .attribute(
            AttributeSchema::new("provider_uuid", yba_types::uuid())
                .required()
                .force_new(),
        )
        .attribute(
            AttributeSchema::new("ip", types::ipv4())
                .required()
                .force_new(),
        )
        .attribute(identity("region").with_description("Region code within the provider"))
        .attribute(identity("zone").with_description("Zone code within the region"))
        .attribute(identity("instance_type"))
        .attribute(
            AttributeSchema::new("instance_name", AttributeType::String).force_new(),
        )
        .attribute(AttributeSchema::new("ssh_user", AttributeType::String).force_new())
        .attribute(AttributeSchema::new("node_name", AttributeType::String).force_new())
        .attribute(AttributeSchema::new("zone_uuid", AttributeType::String).computed())
        .attribute(AttributeSchema::new("in_use", AttributeType::Bool).computed())
        .attribute(common::id())
}
