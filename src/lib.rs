//! Synthesizes the hub/spoke AWS network as declarative stack documents.
//!
//! - [`config`] - The shared `config.json`
//! - [`aws`] - Availability zone lookup through the AWS CLI, with a cache
//! - [`builders`] - Hub, spoke and DNS resource graphs
//! - [`processing`] - Validation and apply waves
//! - [`output`] - JSON, CSV and terminal output

pub mod aws;
pub mod builders;
pub mod config;
pub mod models;
pub mod output;
pub mod processing;

use builders::{build_dns_stack, build_hub_stack, build_spoke_stack, AZ_COUNT};
use config::NetworkConfig;
use models::{Stack, Unit};
use std::error::Error;

/// Availability zones for the configured region, from `zones_file` or the AWS CLI cache.
pub fn get_zones(
    config: &NetworkConfig,
    zones_file: Option<&str>,
) -> Result<Vec<String>, Box<dyn Error>> {
    let data = aws::read_zone_cache(zones_file, &config.region)?;
    let zones = aws::pick_zones(&data, &config.region, AZ_COUNT)?;
    log::info!("Using availability zones: {}", zones.join(", "));
    Ok(zones)
}

/// Build and validate one deployment unit.
pub fn build_stack(
    unit: Unit,
    config: &NetworkConfig,
    zones_file: Option<&str>,
) -> Result<Stack, Box<dyn Error>> {
    build_stacks(&[unit], config, zones_file)?
        .pop()
        .ok_or_else(|| format!("No stack built for {unit}").into())
}

/// Build and validate several units.
///
/// When a VPC unit (hub or spoke) is built, the hub/spoke address overlap is checked and
/// the zones are loaded first. The DNS unit needs neither.
pub fn build_stacks(
    units: &[Unit],
    config: &NetworkConfig,
    zones_file: Option<&str>,
) -> Result<Vec<Stack>, Box<dyn Error>> {
    let builds_vpcs = units.iter().any(|u| matches!(u, Unit::Hub | Unit::Spoke));
    let zones = if builds_vpcs {
        processing::check_network_overlap(config)?;
        get_zones(config, zones_file)?
    } else {
        vec![]
    };

    let mut stacks = Vec::with_capacity(units.len());
    for unit in units {
        let stack = match unit {
            Unit::Hub => build_hub_stack(config, &zones)?,
            Unit::Spoke => build_spoke_stack(config, &zones)?,
            Unit::Dns => build_dns_stack(config)?,
        };
        processing::validate_stack(&stack)?;
        stacks.push(stack);
    }
    Ok(stacks)
}
