//! Integration tests for hub-spoke-network
//!
//! These tests verify the complete workflow from config and zone cache to stack documents.

use hub_spoke_network::{
    build_stack, build_stacks,
    config::NetworkConfig,
    models::{ResourceSpec, Unit},
    output::{subnet_rows, write_stack},
    processing::{apply_waves, find_overlapping_subnets},
};

const CONFIG: &str = "src/tests/test_data/config_01.json";
const ZONES: &str = "src/tests/test_data/zones_cache_01.json";

#[test]
fn test_full_workflow_with_cache() {
    let config = NetworkConfig::load(Some(CONFIG)).expect("Failed to read config");
    let stacks = build_stacks(&[Unit::Hub, Unit::Spoke, Unit::Dns], &config, Some(ZONES))
        .expect("Failed to build stacks");

    assert_eq!(stacks.len(), 3);
    assert_eq!(stacks[0].unit, Unit::Hub);
    assert_eq!(stacks[1].unit, Unit::Spoke);
    assert_eq!(stacks[2].unit, Unit::Dns);

    // hub and spoke use the same sorted zones
    assert_eq!(
        stacks[0].availability_zones,
        vec!["eu-west-1a", "eu-west-1b", "eu-west-1c"]
    );
    assert_eq!(stacks[0].availability_zones, stacks[1].availability_zones);

    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    for stack in &stacks {
        let path = write_stack(stack, dir.path()).expect("Failed to write stack");
        assert!(path.exists());
    }
}

#[test]
fn test_hub_and_spoke_subnets_do_not_overlap() {
    let config = NetworkConfig::load(Some(CONFIG)).unwrap();
    let hub = build_stack(Unit::Hub, &config, Some(ZONES)).unwrap();
    let spoke = build_stack(Unit::Spoke, &config, Some(ZONES)).unwrap();

    assert!(find_overlapping_subnets(&hub).is_empty());
    assert!(find_overlapping_subnets(&spoke).is_empty());

    for h in hub.subnets() {
        for s in spoke.subnets() {
            assert!(!h.cidr.overlaps(&s.cidr), "{} overlaps {}", h.cidr, s.cidr);
        }
    }
    assert_eq!(subnet_rows(&hub).unwrap().len(), 6);
    assert_eq!(subnet_rows(&spoke).unwrap().len(), 9);
}

#[test]
fn test_cross_unit_parameters_line_up() {
    let config = NetworkConfig::load(Some(CONFIG)).unwrap();
    let units = [Unit::Hub, Unit::Spoke, Unit::Dns];
    let stacks = build_stacks(&units, &config, Some(ZONES)).unwrap();

    let published: Vec<String> = stacks[..2]
        .iter()
        .flat_map(|s| s.resources_of("SsmParameter"))
        .filter_map(|r| match &r.spec {
            ResourceSpec::SsmParameter { name, .. } => Some(name.clone()),
            _ => None,
        })
        .collect();
    assert_eq!(
        published,
        vec!["networkhub-demo-vpc-id", "spoke-demo-vpc-id"]
    );

    // the dns unit reads exactly what the other two publish
    let dns = &stacks[2];
    for name in &published {
        assert!(
            dns.lookups.iter().any(|l| &l.name == name),
            "{name} not read"
        );
    }
}

#[test]
fn test_dns_only_needs_no_zones() {
    let config = NetworkConfig::load(Some(CONFIG)).unwrap();
    let dns = build_stack(Unit::Dns, &config, Some("src/tests/test_data/missing.json"))
        .expect("dns unit should not read the zone cache");
    let waves = apply_waves(&dns).unwrap();
    assert_eq!(waves.len(), 3);
}

#[test]
fn test_overlapping_config_rejected() {
    let config = NetworkConfig::load(Some("src/tests/test_data/config_overlap.json")).unwrap();
    for unit in [Unit::Hub, Unit::Spoke] {
        let err = build_stack(unit, &config, Some(ZONES)).unwrap_err();
        assert!(err.to_string().contains("overlaps"), "{err}");
    }

    // the dns unit declares no address space
    let dns = build_stack(Unit::Dns, &config, Some(ZONES)).expect("dns unit should build");
    assert_eq!(dns.unit, Unit::Dns);
}

#[test]
fn test_zones_file_from_other_region_rejected() {
    let config = NetworkConfig::load(Some(CONFIG)).unwrap();
    let zones = Some("src/tests/test_data/zones_cache_us_east_1.json");
    let err = build_stack(Unit::Hub, &config, zones).unwrap_err();
    assert!(err.to_string().contains("expected eu-west-1"), "{err}");
}
