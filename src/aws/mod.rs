//! AWS CLI interaction.
//!
//! This module handles the lookups done before synthesis:
//! - [`cli`] - Command execution for the AWS CLI
//! - [`zones`] - Availability zone queries
//! - [`cache`] - Caching of zone data

mod cache;
mod cli;
mod zones;

// Re-export public types and functions
pub use cache::{read_zone_cache, zone_cache_file_name};
pub use cli::run;
pub use zones::{
    describe_availability_zones, parse_zone_data, pick_zones, AvailabilityZone, ZoneData,
};
