//! Cloud provider schema definition

use yba_core::schema::{AttributeSchema, AttributeType, ResourceSchema};

use super::{CLOUD_PROVIDER, common, types as yba_types};

/// Returns the schema for AWS, GCP and Azure providers
pub fn schema() -> ResourceSchema {
    let mut schema = ResourceSchema::new(CLOUD_PROVIDER)
        .with_description("An AWS, GCP or Azure provider configuration")
        .attribute(
            AttributeSchema::new("code", yba_types::cloud_code())
                .required()
                .force_new(),
        )
        .attribute(
            AttributeSchema::new("name", AttributeType::String)
                .required()
                .force_new(),
        )
        .attribute(common::cloud_regions())
        .attribute(common::access_keys())
        .attribute(
            AttributeSchema::new(
                "aws_config_settings",
                AttributeType::Block(vec![
                    AttributeSchema::new("access_key_id", AttributeType::String),
                    AttributeSchema::new("secret_access_key", AttributeType::String),
                    AttributeSchema::new("hosted_zone_id", AttributeType::String),
                    AttributeSchema::new("use_iam_instance_profile", AttributeType::Bool),
                ]),
            )
            .sensitive()
            .write_only()
            .conflicts_with("gcp_config_settings")
            .conflicts_with("azure_config_settings"),
        )
        .attribute(
            AttributeSchema::new(
                "gcp_config_settings",
                AttributeType::Block(vec![
                    AttributeSchema::new("project_id", AttributeType::String),
                    AttributeSchema::new("credentials", AttributeType::String)
                        .with_description("Service account key JSON"),
                    AttributeSchema::new("use_host_credentials", AttributeType::Bool),
                    AttributeSchema::new("network", AttributeType::String),
                ]),
            )
            .sensitive()
            .write_only()
            .conflicts_with("azure_config_settings"),
        )
        .attribute(
            AttributeSchema::new(
                "azure_config_settings",
                AttributeType::Block(vec![
                    AttributeSchema::new("subscription_id", AttributeType::String),
                    AttributeSchema::new("resource_group", AttributeType::String),
                    AttributeSchema::new("tenant_id", AttributeType::String),
                    AttributeSchema::new("client_id", AttributeType::String),
                    AttributeSchema::new("client_secret", AttributeType::String),
                    AttributeSchema::new("hosted_zone_id", AttributeType::String),
                ]),
            )
            .sensitive()
            .write_only(),
        )
        .attribute(common::id())
        .attribute(common::timeouts());

    for attr in common::provisioning() {
        schema = schema.attribute(attr);
    }
    schema
}
