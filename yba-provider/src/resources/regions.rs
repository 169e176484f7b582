//! Conversions between declared `regions` blocks and API regions

use std::collections::HashMap;

use yba_core::provider::{ProviderError, ProviderResult};
use yba_core::resource::Value;

use super::{Attrs, insert_opt, string};
use crate::models::{
    AvailabilityZone, CloudProvider, Region, RegionCloudInfo, RegionCloudSettings, RegionDetails,
    Universe,
};

/// Build API regions from the declared blocks
///
/// `cloud` selects where per-region network settings go; on-prem regions
/// carry coordinates instead.
pub(crate) fn declared_regions(attrs: &Attrs<'_>, cloud: Option<&str>) -> ProviderResult<Vec<Region>> {
    attrs
        .blocks("regions")?
        .iter()
        .map(|region| {
            let zones = region
                .blocks("zones")?
                .iter()
                .map(|zone| {
                    Ok(AvailabilityZone {
                        code: zone.str("code")?,
                        name: zone.opt_str("name")?,
                        subnet: zone.opt_str("subnet")?,
                        secondary_subnet: zone.opt_str("secondary_subnet")?,
                        ..Default::default()
                    })
                })
                .collect::<ProviderResult<Vec<_>>>()?;

            Ok(Region {
                code: region.str("code")?,
                name: region.opt_str("name")?,
                latitude: region.opt_float("latitude")?,
                longitude: region.opt_float("longitude")?,
                details: match cloud {
                    Some(cloud) => region_details(region, cloud)?,
                    None => None,
                },
                zones,
                ..Default::default()
            })
        })
        .collect()
}

fn region_details(region: &Attrs<'_>, cloud: &str) -> ProviderResult<Option<RegionDetails>> {
    let settings = RegionCloudSettings {
        vnet: region.opt_str("vnet_name")?,
        security_group_id: region.opt_str("security_group_id")?,
        yb_image: region.opt_str("yb_image")?,
        ..Default::default()
    };
    if settings == RegionCloudSettings::default() {
        return Ok(None);
    }
    Ok(Some(RegionDetails {
        cloud_info: Some(RegionCloudInfo {
            by_cloud: HashMap::from([(cloud.to_string(), settings)]),
        }),
        ..Default::default()
    }))
}

/// Attribute value of the live regions and zones
///
/// Entries are ordered like `prior` (the declared or recorded list) so a
/// list comparison does not report reordering by the API as drift.
pub(crate) fn regions_value(regions: &[Region], cloud: Option<&str>, prior: Option<&Value>) -> Value {
    let prior_regions = prior.and_then(Value::as_list).unwrap_or_default();
    let mut live: Vec<&Region> = regions.iter().filter(|r| r.is_active()).collect();
    live.sort_by_key(|r| position(prior_regions, &r.code));

    Value::List(
        live.into_iter()
            .map(|region| {
                let prior_zones = prior_regions
                    .iter()
                    .find(|p| code_of(p) == Some(region.code.as_str()))
                    .and_then(|p| p.as_map())
                    .and_then(|p| p.get("zones"))
                    .and_then(Value::as_list)
                    .unwrap_or_default();
                region_value(region, cloud, prior_zones)
            })
            .collect(),
    )
}

fn region_value(region: &Region, cloud: Option<&str>, prior_zones: &[Value]) -> Value {
    let mut attrs = HashMap::from([("code".to_string(), string(&region.code))]);
    insert_opt(&mut attrs, "name", region.name.as_deref().map(string));
    insert_opt(&mut attrs, "uuid", region.uuid.as_deref().map(string));

    match cloud {
        Some(cloud) => {
            let settings = region
                .details
                .as_ref()
                .and_then(|d| d.cloud_info.as_ref())
                .and_then(|c| c.by_cloud.get(cloud));
            if let Some(settings) = settings {
                insert_opt(&mut attrs, "vnet_name", settings.vnet.as_deref().map(string));
                insert_opt(
                    &mut attrs,
                    "security_group_id",
                    settings.security_group_id.as_deref().map(string),
                );
                insert_opt(&mut attrs, "yb_image", settings.yb_image.as_deref().map(string));
            }
        }
        None => {
            insert_opt(&mut attrs, "latitude", region.latitude.map(Value::Float));
            insert_opt(&mut attrs, "longitude", region.longitude.map(Value::Float));
        }
    }

    let mut zones: Vec<&AvailabilityZone> = region.active_zones().collect();
    zones.sort_by_key(|z| position(prior_zones, &z.code));
    let zones = zones
        .into_iter()
        .map(|zone| {
            let mut z = HashMap::from([("code".to_string(), string(&zone.code))]);
            insert_opt(&mut z, "name", zone.name.as_deref().map(string));
            insert_opt(&mut z, "uuid", zone.uuid.as_deref().map(string));
            if cloud.is_some() {
                insert_opt(&mut z, "subnet", zone.subnet.as_deref().map(string));
                insert_opt(
                    &mut z,
                    "secondary_subnet",
                    zone.secondary_subnet.as_deref().map(string),
                );
            }
            Value::Map(z)
        })
        .collect();
    attrs.insert("zones".to_string(), Value::List(zones));

    Value::Map(attrs)
}

fn code_of(value: &Value) -> Option<&str> {
    value.as_map()?.get("code")?.as_str()
}

fn position(prior: &[Value], code: &str) -> usize {
    prior
        .iter()
        .position(|p| code_of(p) == Some(code))
        .unwrap_or(usize::MAX)
}

/// Reject an edit that would deactivate a region or zone a universe is placed in
pub(crate) fn check_deactivations(
    persisted: &CloudProvider,
    merged: &CloudProvider,
    universes: &[Universe],
) -> ProviderResult<()> {
    let mut removed: Vec<(String, String, &str, &str)> = Vec::new();
    for region in merged.regions.iter() {
        let Some(old) = persisted
            .regions
            .iter()
            .find(|r| r.code == region.code && r.is_active())
        else {
            continue;
        };
        for zone in &region.zones {
            let was_active = old.active_zones().any(|z| z.code == zone.code);
            if was_active && (!region.is_active() || !zone.is_active()) {
                removed.push((
                    region.uuid.clone().unwrap_or_default(),
                    zone.uuid.clone().unwrap_or_default(),
                    region.code.as_str(),
                    zone.code.as_str(),
                ));
            }
        }
    }

    let mut conflicts = Vec::new();
    for universe in universes {
        let placements = universe
            .universe_details
            .clusters
            .iter()
            .filter_map(|c| c.placement_info.as_ref())
            .flat_map(|p| p.zone_uuids());
        for (region_uuid, zone_uuid) in placements {
            if let Some((_, _, region, zone)) = removed
                .iter()
                .find(|(r, z, _, _)| r == region_uuid && z == zone_uuid)
            {
                conflicts.push(format!(
                    "zone {} of region {} is in use by universe {}",
                    zone, region, universe.name
                ));
            }
        }
    }

    if conflicts.is_empty() {
        Ok(())
    } else {
        conflicts.sort();
        conflicts.dedup();
        Err(ProviderError::validation(format!(
            "Cannot remove regions or zones that are in use: {}",
            conflicts.join("; ")
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Cluster, PlacementAz, PlacementCloud, PlacementInfo, PlacementRegion};
    use yba_core::resource::ResourceId;

    fn region(code: &str, uuid: &str, zones: &[(&str, &str, bool)]) -> Region {
        Region {
            uuid: Some(uuid.to_string()),
            code: code.to_string(),
            active: Some(true),
            zones: zones
                .iter()
                .map(|(code, uuid, active)| AvailabilityZone {
                    uuid: Some(uuid.to_string()),
                    code: code.to_string(),
                    active: Some(*active),
                    ..Default::default()
                })
                .collect(),
            ..Default::default()
        }
    }

    #[test]
    fn declared_network_settings_go_under_the_cloud() {
        let attrs = HashMap::from([(
            "regions".to_string(),
            Value::List(vec![Value::Map(HashMap::from([
                ("code".to_string(), string("us-west-2")),
                ("vnet_name".to_string(), string("vpc-1")),
                (
                    "zones".to_string(),
                    Value::List(vec![Value::Map(HashMap::from([
                        ("code".to_string(), string("us-west-2a")),
                        ("subnet".to_string(), string("subnet-1")),
                    ]))]),
                ),
            ]))]),
        )]);
        let id = ResourceId::new("yba_cloud_provider", "aws");
        let regions = declared_regions(&Attrs::new(&id, &attrs), Some("aws")).unwrap();

        let details = regions[0].details.as_ref().unwrap();
        let settings = &details.cloud_info.as_ref().unwrap().by_cloud["aws"];
        assert_eq!(settings.vnet.as_deref(), Some("vpc-1"));
        assert_eq!(regions[0].zones[0].subnet.as_deref(), Some("subnet-1"));
    }

    #[test]
    fn inactive_entries_are_hidden_and_order_follows_prior() {
        let mut gone = region("us-east-1", "r-3", &[("us-east-1a", "z-9", true)]);
        gone.active = Some(false);
        let regions = vec![
            region("us-west-1", "r-1", &[("us-west-1a", "z-1", true)]),
            region(
                "us-west-2",
                "r-2",
                &[("us-west-2b", "z-3", true), ("us-west-2a", "z-2", false)],
            ),
            gone,
        ];
        let prior = Value::List(vec![
            Value::Map(HashMap::from([("code".to_string(), string("us-west-2"))])),
            Value::Map(HashMap::from([("code".to_string(), string("us-west-1"))])),
        ]);

        let value = regions_value(&regions, Some("aws"), Some(&prior));
        let list = value.as_list().unwrap();
        assert_eq!(list.len(), 2);
        assert_eq!(code_of(&list[0]), Some("us-west-2"));
        let zones = list[0].as_map().unwrap()["zones"].as_list().unwrap();
        assert_eq!(zones.len(), 1);
        assert_eq!(code_of(&zones[0]), Some("us-west-2b"));
    }

    #[test]
    fn deactivating_a_used_zone_names_universe() {
        let persisted = CloudProvider {
            regions: vec![region(
                "us-west-2",
                "r-1",
                &[("us-west-2a", "z-1", true), ("us-west-2b", "z-2", true)],
            )],
            ..Default::default()
        };
        let merged = CloudProvider {
            regions: vec![region(
                "us-west-2",
                "r-1",
                &[("us-west-2a", "z-1", false), ("us-west-2b", "z-2", true)],
            )],
            ..Default::default()
        };
        let universe = Universe {
            universe_uuid: "u-1".to_string(),
            name: "orders".to_string(),
            universe_details: crate::models::UniverseDetails {
                clusters: vec![Cluster {
                    placement_info: Some(PlacementInfo {
                        cloud_list: vec![PlacementCloud {
                            region_list: vec![PlacementRegion {
                                uuid: "r-1".to_string(),
                                az_list: vec![PlacementAz {
                                    uuid: "z-1".to_string(),
                                    ..Default::default()
                                }],
                                ..Default::default()
                            }],
                            ..Default::default()
                        }],
                    }),
                    ..Default::default()
                }],
                ..Default::default()
            },
        };

        let err = check_deactivations(&persisted, &merged, &[universe.clone()]).unwrap_err();
        assert!(err.message.contains("zone us-west-2a of region us-west-2"));
        assert!(err.message.contains("orders"));

        let unused = Universe {
            name: "other".to_string(),
            universe_details: Default::default(),
            ..universe
        };
        assert!(check_deactivations(&persisted, &merged, &[unused]).is_ok());
    }
}
