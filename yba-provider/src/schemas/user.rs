//! User schema definition

use yba_core::schema::{AttributeSchema, AttributeType, ResourceSchema};

use super::{USER, common, types as yba_types};

pub fn schema() -> ResourceSchema {
    ResourceSchema::new(USER)
        .with_description("A YugabyteDB Anywhere user of the current customer")
        .attribute(
            AttributeSchema::new("email", AttributeType::String)
                .required()
                .force_new(),
        )
        .attribute(
            AttributeSchema::new("password", AttributeType::String)
                .required()
                .sensitive()
                .write_only()
                .force_new(),
        )
        .attribute(AttributeSchema::new("role", yba_types::user_role()).required())
        .attribute(AttributeSchema::new("creation_date", AttributeType::String).computed())
        .attribute(AttributeSchema::new("is_primary", AttributeType::Bool).computed())
        .attribute(common::id())
}
