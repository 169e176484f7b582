//! YBA resource and data source schema definitions

pub mod backups;
pub mod cloud_provider;
pub mod common;
pub mod data_sources;
pub mod node_instance;
pub mod onprem_provider;
pub mod restore;
pub mod types;
pub mod universe;
pub mod user;

use yba_core::schema::ResourceSchema;

pub const CLOUD_PROVIDER: &str = "yba_cloud_provider";
pub const ONPREM_PROVIDER: &str = "yba_onprem_provider";
pub const UNIVERSE: &str = "yba_universe";
pub const NODE_INSTANCE: &str = "yba_onprem_node_instance";
pub const USER: &str = "yba_user";
pub const BACKUPS: &str = "yba_backups";
pub const RESTORE: &str = "yba_restore";
pub const PROVIDER_KEY: &str = "yba_provider_key";
pub const RELEASE_VERSION: &str = "yba_release_version";
pub const STORAGE_CONFIGS: &str = "yba_storage_configs";

/// Returns all YBA schemas
pub fn all_schemas() -> Vec<ResourceSchema> {
    vec![
        cloud_provider::schema(),
        onprem_provider::schema(),
        universe::schema(),
        node_instance::schema(),
        user::schema(),
        backups::schema(),
        restore::schema(),
        data_sources::provider_key_schema(),
        data_sources::release_version_schema(),
        data_sources::storage_configs_schema(),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn resource_types_are_unique() {
        let schemas = all_schemas();
        let names: HashSet<&str> = schemas.iter().map(|s| s.resource_type.as_str()).collect();
        assert_eq!(names.len(), schemas.len());
    }

    #[test]
    fn data_sources_are_flagged() {
        let data: Vec<String> = all_schemas()
            .into_iter()
            .filter(|s| s.data_source)
            .map(|s| s.resource_type)
            .collect();
        assert_eq!(data, vec![PROVIDER_KEY, RELEASE_VERSION, STORAGE_CONFIGS]);
    }
}
