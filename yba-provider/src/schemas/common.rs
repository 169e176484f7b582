//! Blocks shared by several resources

use yba_core::schema::{AttributeSchema, AttributeType, types};

/// `timeouts { create, update, delete }`
pub fn timeouts() -> AttributeSchema {
    AttributeSchema::new("timeouts", types::timeouts())
        .write_only()
        .with_description("Per-operation timeouts such as \"30m\"")
}

/// Computed remote identifier, referenced as `${type.name.id}`
pub fn id() -> AttributeSchema {
    AttributeSchema::new("id", AttributeType::String).computed()
}

fn zone_fields(cloud: bool) -> Vec<AttributeSchema> {
    let mut fields = vec![
        AttributeSchema::new("code", AttributeType::String).required(),
        AttributeSchema::new("name", AttributeType::String),
        AttributeSchema::new("uuid", AttributeType::String).computed(),
    ];
    if cloud {
        fields.push(
            AttributeSchema::new("subnet", AttributeType::String)
                .with_description("Subnet for nodes in this zone"),
        );
        fields.push(AttributeSchema::new("secondary_subnet", AttributeType::String));
    }
    fields
}

/// Regions of a cloud provider with their availability zones
pub fn cloud_regions() -> AttributeSchema {
    AttributeSchema::new(
        "regions",
        types::block_list(vec![
            AttributeSchema::new("code", AttributeType::String).required(),
            AttributeSchema::new("name", AttributeType::String),
            AttributeSchema::new("uuid", AttributeType::String).computed(),
            AttributeSchema::new("vnet_name", AttributeType::String)
                .with_description("VPC (AWS), network (GCP) or virtual network (Azure)"),
            AttributeSchema::new("security_group_id", AttributeType::String),
            AttributeSchema::new("yb_image", AttributeType::String),
            AttributeSchema::new("zones", types::block_list(zone_fields(true))).required(),
        ]),
    )
    .required()
    .with_description("Regions removed from this list are deactivated, never deleted")
}

/// Regions of an on-premises provider
pub fn onprem_regions() -> AttributeSchema {
    AttributeSchema::new(
        "regions",
        types::block_list(vec![
            AttributeSchema::new("code", AttributeType::String).required(),
            AttributeSchema::new("name", AttributeType::String),
            AttributeSchema::new("uuid", AttributeType::String).computed(),
            AttributeSchema::new("latitude", AttributeType::Float),
            AttributeSchema::new("longitude", AttributeType::Float),
            AttributeSchema::new("zones", types::block_list(zone_fields(false))).required(),
        ]),
    )
    .required()
}

/// SSH keys YBA uses to reach nodes
pub fn access_keys() -> AttributeSchema {
    AttributeSchema::new(
        "access_keys",
        types::block_list(vec![
            AttributeSchema::new("key_pair_name", AttributeType::String).required(),
            AttributeSchema::new("ssh_private_key_content", AttributeType::String).required(),
        ]),
    )
    .sensitive()
    .write_only()
}

/// SSH and provisioning settings common to cloud and on-prem providers
pub fn provisioning() -> Vec<AttributeSchema> {
    vec![
        AttributeSchema::new("ssh_user", AttributeType::String),
        AttributeSchema::new("ssh_port", types::port()),
        AttributeSchema::new("air_gap_install", AttributeType::Bool)
            .with_default(yba_core::resource::Value::Bool(false)),
        AttributeSchema::new("ntp_servers", types::string_list()),
    ]
}
