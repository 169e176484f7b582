//! On-premises provider schema definition

use yba_core::resource::Value;
use yba_core::schema::{AttributeSchema, AttributeType, ResourceSchema, types};

use super::{ONPREM_PROVIDER, common};

/// Returns the schema for on-premises providers
pub fn schema() -> ResourceSchema {
    let mut schema = ResourceSchema::new(ONPREM_PROVIDER)
        .with_description("An on-premises provider with its regions, zones and instance types")
        .attribute(
            AttributeSchema::new("name", AttributeType::String)
                .required()
                .force_new(),
        )
        .attribute(common::onprem_regions())
        .attribute(common::access_keys())
        .attribute(AttributeSchema::new("skip_provisioning", AttributeType::Bool)
            .with_default(Value::Bool(false)))
        .attribute(
            AttributeSchema::new("yb_home_dir", AttributeType::String)
                .with_description("Home directory of the yugabyte user on the nodes"),
        )
        .attribute(
            AttributeSchema::new(
                "instance_types",
                types::block_list(vec![
                    AttributeSchema::new("instance_type_code", AttributeType::String).required(),
                    AttributeSchema::new("num_cores", AttributeType::Float).required(),
                    AttributeSchema::new("mem_size_gb", AttributeType::Float).required(),
                    AttributeSchema::new("volume_size_gb", AttributeType::Float).required(),
                    AttributeSchema::new("mount_paths", types::string_list()).required(),
                ]),
            )
            .with_description("Instance types nodes of this provider can be registered with"),
        )
        .attribute(common::id())
        .attribute(common::timeouts());

    for attr in common::provisioning() {
        schema = schema.attribute(attr);
    }
    schema
}
