//! Cache management for availability zone data.
//!
//! Avoids repeated AWS CLI calls, and lets synthesis run offline from a saved file.

use super::zones::{describe_availability_zones, parse_zone_data, ZoneData};
use crate::config::CACHE_TZ_ENV;
use chrono_tz::Tz;
use std::error::Error;
use std::path::Path;

/// Default cache file name for `region` on `date` (`YYYY-MM-DD`).
pub fn zone_cache_file_name(region: &str, date: &str) -> String {
    format!("zones_cache_{region}_{date}.json")
}

/// Timezone used to date cache files, from [`CACHE_TZ_ENV`] or UTC.
fn cache_timezone() -> Tz {
    timezone_from(std::env::var(CACHE_TZ_ENV).ok().as_deref())
}

/// Parse a chrono-tz name, falling back to UTC when unset or unknown.
fn timezone_from(name: Option<&str>) -> Tz {
    match name {
        Some(name) => name.parse::<Tz>().unwrap_or_else(|e| {
            log::warn!("Ignoring {CACHE_TZ_ENV}={name}: {e}");
            Tz::UTC
        }),
        None => Tz::UTC,
    }
}

/// Read zone data from cache file, or fetch from AWS if cache doesn't exist.
///
/// # Arguments
/// * `cache_file` - Optional path to a specific cache file. If None, uses default naming.
/// * `region` - Region to query when the default cache file is missing.
///
/// # Returns
/// * `Ok(ZoneData)` - The zone data from cache or AWS
/// * `Err` - If cache file specified but doesn't exist, or the AWS query fails
pub fn read_zone_cache(cache_file: Option<&str>, region: &str) -> Result<ZoneData, Box<dyn Error>> {
    let now = chrono::Utc::now().with_timezone(&cache_timezone());

    let cache_file = match cache_file {
        Some(file) => {
            if !Path::new(file).exists() {
                return Err(format!("Cache file does not exist: {file}").into());
            }
            log::info!("Using provided cache file: {file}");
            file.to_string()
        }
        None => zone_cache_file_name(region, &now.format("%Y-%m-%d").to_string()),
    };

    let data = match std::fs::read_to_string(&cache_file) {
        Ok(json) => {
            log::info!("Reading from cache file: {cache_file}");
            parse_zone_data(&json)?
        }
        Err(_) => {
            log::warn!("Cache file not found: {cache_file}");
            let data = describe_availability_zones(region)?;

            let json = serde_json::to_string_pretty(&data)
                .map_err(|e| format!("Error serializing JSON: {e}"))?;
            log::warn!("Writing data to cache file: {cache_file}");
            std::fs::write(&cache_file, json)
                .map_err(|e| format!("Error writing cache file {cache_file}: {e}"))?;
            data
        }
    };

    Ok(data)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_zone_cache() {
        let data = read_zone_cache(Some("src/tests/test_data/zones_cache_01.json"), "eu-west-1")
            .expect("Error reading zone cache");
        assert!(
            !data.availability_zones.is_empty(),
            "Data should not be empty"
        );
        assert_eq!(data.availability_zones[0].zone_name, "eu-west-1b");
        assert_eq!(data.availability_zones[0].region_name, "eu-west-1");
    }

    #[test]
    fn test_missing_explicit_cache() {
        let err =
            read_zone_cache(Some("src/tests/test_data/missing.json"), "eu-west-1").unwrap_err();
        assert!(err.to_string().contains("does not exist"));
    }

    #[test]
    fn test_cache_file_name() {
        assert_eq!(
            zone_cache_file_name("eu-west-1", "2026-10-18"),
            "zones_cache_eu-west-1_2026-10-18.json"
        );
    }

    #[test]
    fn test_cache_timezone() {
        assert_eq!(timezone_from(None), Tz::UTC);
        assert_eq!(timezone_from(Some("Europe/Dublin")), Tz::Europe__Dublin);
        assert_eq!(
            timezone_from(Some("Pacific/Auckland")),
            Tz::Pacific__Auckland
        );
        assert_eq!(timezone_from(Some("Not/AZone")), Tz::UTC);
        assert_eq!(timezone_from(Some("")), Tz::UTC);
    }
}
