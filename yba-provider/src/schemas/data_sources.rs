//! Data source schema definitions

use yba_core::schema::{AttributeSchema, AttributeType, ResourceSchema, types};

use super::{PROVIDER_KEY, RELEASE_VERSION, STORAGE_CONFIGS, common};

/// Access key code of a provider
pub fn provider_key_schema() -> ResourceSchema {
    ResourceSchema::data_source(PROVIDER_KEY)
        .attribute(AttributeSchema::new("provider_id", AttributeType::String).required())
        .attribute(common::id())
}

/// Newest release, optionally restricted to a version prefix
pub fn release_version_schema() -> ResourceSchema {
    ResourceSchema::data_source(RELEASE_VERSION)
        .attribute(
            AttributeSchema::new("selector", AttributeType::String)
                .with_description("Version prefix such as \"2.20\""),
        )
        .attribute(AttributeSchema::new("version_string", AttributeType::String).computed())
        .attribute(AttributeSchema::new("versions", types::string_list()).computed())
        .attribute(common::id())
}

/// UUIDs of the customer's backup storage configurations
pub fn storage_configs_schema() -> ResourceSchema {
    ResourceSchema::data_source(STORAGE_CONFIGS)
        .attribute(AttributeSchema::new("config_name", AttributeType::String))
        .attribute(AttributeSchema::new("uuid_list", types::string_list()).computed())
        .attribute(common::id())
}
