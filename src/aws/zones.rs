//! Availability zone lookup through `aws ec2 describe-availability-zones`.

use super::cli;
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use std::error::Error;

/// One entry of the `AvailabilityZones` list.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "PascalCase")]
pub struct AvailabilityZone {
    pub zone_name: String,
    #[serde(default)]
    pub zone_id: String,
    pub state: String,
    #[serde(default)]
    pub region_name: String,
}

/// Response of `describe-availability-zones`.
#[derive(Serialize, Deserialize, Debug, Default)]
#[serde(rename_all = "PascalCase")]
pub struct ZoneData {
    pub availability_zones: Vec<AvailabilityZone>,
}

/// Parse the CLI JSON, reporting the failing path.
pub fn parse_zone_data(json: &str) -> Result<ZoneData, Box<dyn Error>> {
    let mut deserializer = serde_json::Deserializer::from_str(json);
    let data: ZoneData = serde_path_to_error::deserialize(&mut deserializer).map_err(|e| {
        format!(
            "Error parsing availability zones: path={} error={}",
            e.path(),
            e
        )
    })?;
    Ok(data)
}

/// Query the available zones of `region` with the AWS CLI.
pub fn describe_availability_zones(region: &str) -> Result<ZoneData, Box<dyn Error>> {
    let cmd = format!(
        "aws ec2 describe-availability-zones --region {region} --filters 'Name=state,Values=available' --output json"
    );
    let output = cli::run(&cmd)?;
    let data = parse_zone_data(&output).map_err(|e| {
        log::error!("OUTPUT START:\n\n{}\n\nOUTPUT END\n", output);
        e
    })?;
    log::info!(
        "Got {} availability zones for {region} from aws cli",
        data.availability_zones.len()
    );
    Ok(data)
}

/// Pick the first `count` available zones of `region` by name.
///
/// Zones without a `RegionName` are trusted. A zone naming another region is an error,
/// it means the zone file was saved for a different region.
pub fn pick_zones(
    data: &ZoneData,
    region: &str,
    count: usize,
) -> Result<Vec<String>, Box<dyn Error>> {
    if let Some(foreign) = data
        .availability_zones
        .iter()
        .find(|z| !z.region_name.is_empty() && z.region_name != region)
    {
        return Err(format!(
            "Zone {} belongs to region {}, expected {region}",
            foreign.zone_name, foreign.region_name
        )
        .into());
    }

    let zones: Vec<String> = data
        .availability_zones
        .iter()
        .filter(|z| z.state == "available")
        .map(|z| z.zone_name.clone())
        .sorted()
        .dedup()
        .take(count)
        .collect();
    if zones.len() < count {
        return Err(format!(
            "Need {count} available zones, found {}: [{}]",
            zones.len(),
            zones.join(", ")
        )
        .into());
    }
    Ok(zones)
}
