//! Checks on a synthesized stack before it is handed to the engine.
//!
//! Overlapping subnet detection follows the same grouping idea as VNet overlap
//! reports: collect every block, compare pairwise, report each conflict.

use super::order::apply_waves;
use crate::builders::AZ_COUNT;
use crate::config::NetworkConfig;
use crate::models::{Ipv4, ResourceSpec, Stack};
use itertools::Itertools;
use std::collections::{BTreeMap, BTreeSet};
use std::error::Error;

/// Two subnets of the same stack sharing addresses.
#[derive(Debug)]
pub struct OverlapConflict {
    pub first: (String, Ipv4),
    pub second: (String, Ipv4),
}

/// Find every pair of overlapping subnets in `stack`.
pub fn find_overlapping_subnets(stack: &Stack) -> Vec<OverlapConflict> {
    let subnets = stack.subnets();
    let mut conflicts = Vec::new();
    for (a, b) in subnets.iter().tuple_combinations() {
        if a.cidr.overlaps(&b.cidr) {
            conflicts.push(OverlapConflict {
                first: (a.name.to_string(), a.cidr),
                second: (b.name.to_string(), b.cidr),
            });
        }
    }
    conflicts.sort_by_key(|c| c.first.1);
    conflicts
}

/// Log overlapping subnet conflicts as warnings.
pub fn log_overlapping_subnets(stack: &Stack, conflicts: &[OverlapConflict]) {
    if conflicts.is_empty() {
        log::info!("{}: no overlapping subnets found.", stack.name);
        return;
    }
    log::warn!(
        "{}: found {} overlapping subnet pair(s):",
        stack.name,
        conflicts.len()
    );
    for conflict in conflicts {
        log::warn!(
            "  - '{}' {} overlaps '{}' {}",
            conflict.first.0,
            conflict.first.1,
            conflict.second.0,
            conflict.second.1
        );
    }
}

/// Every subnet must fall inside the CIDR of the VPC it is declared in.
pub fn check_subnets_within_vpc(stack: &Stack) -> Result<(), Box<dyn Error>> {
    let vpcs: BTreeMap<&str, Ipv4> = stack
        .resources
        .iter()
        .filter_map(|r| match &r.spec {
            ResourceSpec::Vpc { cidr_block, .. } => Some((r.name.as_str(), *cidr_block)),
            _ => None,
        })
        .collect();
    for subnet in stack.subnets() {
        let vpc_cidr = vpcs
            .get(subnet.vpc)
            .ok_or_else(|| format!("Subnet {} is in unknown VPC '{}'", subnet.name, subnet.vpc))?;
        if !vpc_cidr.contains_subnet(&subnet.cidr) {
            return Err(format!(
                "Subnet {} {} is outside VPC {} {}",
                subnet.name, subnet.cidr, subnet.vpc, vpc_cidr
            )
            .into());
        }
    }
    Ok(())
}

/// Each tier must have exactly [`AZ_COUNT`] subnets, one per distinct zone.
pub fn check_tier_layout(stack: &Stack) -> Result<(), Box<dyn Error>> {
    let subnets = stack.subnets();
    let by_tier = subnets.iter().into_group_map_by(|s| s.tier);
    for (tier, members) in by_tier.iter().sorted_by_key(|(t, _)| **t) {
        if members.len() != AZ_COUNT {
            return Err(format!(
                "{}: tier '{tier}' has {} subnets, expected {AZ_COUNT}",
                stack.name,
                members.len()
            )
            .into());
        }
        let zones: BTreeSet<&str> = members.iter().map(|s| s.availability_zone).collect();
        if zones.len() != AZ_COUNT {
            return Err(format!(
                "{}: tier '{tier}' spans zones [{}], expected {AZ_COUNT} distinct",
                stack.name,
                zones.iter().join(", ")
            )
            .into());
        }
    }
    Ok(())
}

/// The hub and spoke VPCs are routed through one Transit Gateway and must not overlap.
pub fn check_network_overlap(config: &NetworkConfig) -> Result<(), Box<dyn Error>> {
    let hub = config.networkhub_cidr_block;
    let spoke = config.spoke_cidr_block;
    if hub.overlaps(&spoke) {
        return Err(format!(
            "Hub CIDR {hub} ({}) overlaps spoke CIDR {spoke} ({})",
            config.networkhub_vpc_stack, config.spoke_vpc_stack
        )
        .into());
    }
    Ok(())
}

/// Run every check on `stack`.
pub fn validate_stack(stack: &Stack) -> Result<(), Box<dyn Error>> {
    log::info!("Validating {stack}");

    let dangling = stack.dangling_references()?;
    if !dangling.is_empty() {
        return Err(format!(
            "{}: unresolved references: {}",
            stack.name,
            dangling.iter().join(", ")
        )
        .into());
    }

    check_subnets_within_vpc(stack)?;

    let conflicts = find_overlapping_subnets(stack);
    log_overlapping_subnets(stack, &conflicts);
    if !conflicts.is_empty() {
        return Err(format!(
            "{}: {} overlapping subnet pair(s)",
            stack.name,
            conflicts.len()
        )
        .into());
    }

    check_tier_layout(stack)?;
    apply_waves(stack)?;
    Ok(())
}
