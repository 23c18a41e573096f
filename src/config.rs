//! Shared run configuration.
//!
//! All three deployment units read the same JSON file, once per run.

use crate::models::{role_arn, Ipv4};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::path::Path;
use std::sync::OnceLock;

/// Used when neither `--config` nor [`CONFIG_ENV`] is given.
pub const DEFAULT_CONFIG_FILE: &str = "config.json";
/// Environment variable (or `.env` entry) naming the config file.
pub const CONFIG_ENV: &str = "HUB_SPOKE_CONFIG";
/// Environment variable with the chrono-tz name used to date zone cache files.
pub const CACHE_TZ_ENV: &str = "HUB_SPOKE_CACHE_TZ";

pub const DEFAULT_SUBNET_MASK: u8 = 24;
/// Amazon side ASN of the hub Transit Gateway, also the spoke's lookup filter.
pub const DEFAULT_TRANSIT_GATEWAY_ASN: u32 = 64512;
/// Hosted zone of the regional VPC endpoint DNS names, target of the alias records.
pub const DEFAULT_VPCE_DNS_HOSTED_ZONE_ID: &str = "ZDK2GCRPAFKGO";

static ACCOUNT_ID_REGEX: OnceLock<Regex> = OnceLock::new();

fn get_account_id_regex() -> &'static Regex {
    ACCOUNT_ID_REGEX.get_or_init(|| Regex::new(r"^\d{12}$").expect("Invalid Regex"))
}

fn default_subnet_mask() -> u8 {
    DEFAULT_SUBNET_MASK
}

fn default_transit_gateway_asn() -> u32 {
    DEFAULT_TRANSIT_GATEWAY_ASN
}

fn default_vpce_dns_hosted_zone_id() -> String {
    DEFAULT_VPCE_DNS_HOSTED_ZONE_ID.to_string()
}

/// Config file to read: `flag`, then `env_value`, then [`DEFAULT_CONFIG_FILE`].
fn config_path(flag: Option<&str>, env_value: Option<String>) -> String {
    match (flag, env_value) {
        (Some(path), _) => path.to_string(),
        (None, Some(path)) if !path.trim().is_empty() => path,
        _ => DEFAULT_CONFIG_FILE.to_string(),
    }
}

/// The shared `config.json`.
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub struct NetworkConfig {
    /// Name of the hub VPC and its stack.
    pub networkhub_vpc_stack: String,
    /// Name of the spoke VPC and its stack.
    pub spoke_vpc_stack: String,
    pub networkhub_cidr_block: Ipv4,
    pub spoke_cidr_block: Ipv4,
    /// TCP port the interface endpoints accept (443).
    pub vpce_inbound_port: u16,
    pub networkhub_account_id: String,
    pub spoke_account_id: String,
    /// Role assumed in the peer account.
    pub role_name: String,
    pub region: String,
    pub ec2_messages_endpoint: String,
    pub ssm_messages_endpoint: String,
    pub ssm_endpoint: String,
    #[serde(default = "default_transit_gateway_asn")]
    pub transit_gateway_asn: u32,
    #[serde(default = "default_subnet_mask")]
    pub subnet_mask: u8,
    #[serde(default = "default_vpce_dns_hosted_zone_id")]
    pub vpce_dns_hosted_zone_id: String,
}

impl NetworkConfig {
    /// Parse and check a config document.
    pub fn from_json(json: &str) -> Result<NetworkConfig, Box<dyn Error>> {
        let mut deserializer = serde_json::Deserializer::from_str(json);
        let config: NetworkConfig = serde_path_to_error::deserialize(&mut deserializer)
            .map_err(|e| format!("Error parsing config: path={} error={}", e.path(), e))?;
        config.check()?;
        Ok(config)
    }

    /// Read the config file.
    ///
    /// Path order: `path`, then [`CONFIG_ENV`], then [`DEFAULT_CONFIG_FILE`].
    pub fn load(path: Option<&str>) -> Result<NetworkConfig, Box<dyn Error>> {
        let path = config_path(path, std::env::var(CONFIG_ENV).ok());
        if !Path::new(&path).exists() {
            return Err(format!("Config file does not exist: {path}").into());
        }
        log::info!("Reading config file: {path}");
        let json = std::fs::read_to_string(&path)
            .map_err(|e| format!("Error reading config file {path}: {e}"))?;
        NetworkConfig::from_json(&json)
    }

    fn check(&self) -> Result<(), Box<dyn Error>> {
        for (key, account) in [
            ("NETWORKHUB_ACCOUNT_ID", &self.networkhub_account_id),
            ("SPOKE_ACCOUNT_ID", &self.spoke_account_id),
        ] {
            if !get_account_id_regex().is_match(account) {
                return Err(format!("{key} must be a 12 digit account id, got '{account}'").into());
            }
        }
        for (key, value) in [
            ("NETWORKHUB_VPC_STACK", &self.networkhub_vpc_stack),
            ("SPOKE_VPC_STACK", &self.spoke_vpc_stack),
            ("ROLE_NAME", &self.role_name),
            ("REGION", &self.region),
        ] {
            if value.trim().is_empty() {
                return Err(format!("{key} must not be empty").into());
            }
        }
        for (key, value) in [
            ("NETWORKHUB_VPC_STACK", &self.networkhub_vpc_stack),
            ("SPOKE_VPC_STACK", &self.spoke_vpc_stack),
        ] {
            // stack names prefix graph node names, which `${node.attr}` must parse back
            if value.contains(|c: char| matches!(c, '.' | '{' | '}')) {
                return Err(format!("{key} must not contain '.', '{{' or '}}': '{value}'").into());
            }
        }
        if self.networkhub_vpc_stack == self.spoke_vpc_stack {
            return Err("NETWORKHUB_VPC_STACK and SPOKE_VPC_STACK must differ".into());
        }
        if self.subnet_mask < self.networkhub_cidr_block.mask
            || self.subnet_mask < self.spoke_cidr_block.mask
            || self.subnet_mask > 28
        {
            return Err(format!(
                "SUBNET_MASK /{} does not fit the VPC CIDRs",
                self.subnet_mask
            )
            .into());
        }
        Ok(())
    }

    /// `com.amazonaws.<region>.<service>`
    pub fn service_name(&self, service: &str) -> String {
        format!("com.amazonaws.{}.{}", self.region, service)
    }

    pub fn networkhub_role_arn(&self) -> String {
        role_arn(&self.networkhub_account_id, &self.role_name)
    }

    pub fn spoke_role_arn(&self) -> String {
        role_arn(&self.spoke_account_id, &self.role_name)
    }

    /// SSM parameter that carries a VPC id between units.
    pub fn vpc_id_parameter(vpc_name: &str) -> String {
        format!("{vpc_name}-vpc-id")
    }

    /// (service, private hostname) pairs resolved through the hub endpoints.
    pub fn ssm_endpoints(&self) -> Vec<(&'static str, &str)> {
        vec![
            ("ssm", self.ssm_endpoint.as_str()),
            ("ssmmessages", self.ssm_messages_endpoint.as_str()),
            ("ec2messages", self.ec2_messages_endpoint.as_str()),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    pub const TEST_CONFIG: &str = "src/tests/test_data/config_01.json";

    #[test]
    fn test_load_config() {
        let config = NetworkConfig::load(Some(TEST_CONFIG)).expect("Error reading config");
        assert_eq!(config.networkhub_vpc_stack, "networkhub-demo");
        assert_eq!(config.spoke_vpc_stack, "spoke-demo");
        assert_eq!(config.networkhub_cidr_block.to_string(), "10.0.0.0/16");
        assert_eq!(config.vpce_inbound_port, 443);
        assert_eq!(config.transit_gateway_asn, DEFAULT_TRANSIT_GATEWAY_ASN);
        assert_eq!(config.subnet_mask, 24);
        assert_eq!(config.vpce_dns_hosted_zone_id, "ZDK2GCRPAFKGO");
        assert_eq!(
            config.spoke_role_arn(),
            "arn:aws:iam::222222222222:role/network-admin"
        );
        assert_eq!(config.service_name("ssm"), "com.amazonaws.eu-west-1.ssm");
    }

    #[test]
    fn test_missing_file() {
        let err = NetworkConfig::load(Some("src/tests/test_data/nope.json")).unwrap_err();
        assert!(err.to_string().contains("does not exist"));
    }

    #[test]
    fn test_missing_key_names_key() {
        let json = std::fs::read_to_string(TEST_CONFIG).unwrap();
        let mut value: serde_json::Value = serde_json::from_str(&json).unwrap();
        value.as_object_mut().unwrap().remove("ROLE_NAME");
        let err = NetworkConfig::from_json(&value.to_string()).unwrap_err();
        assert!(err.to_string().contains("ROLE_NAME"), "{err}");
    }

    #[test]
    fn test_bad_cidr_names_path() {
        let json = std::fs::read_to_string(TEST_CONFIG).unwrap();
        let mut value: serde_json::Value = serde_json::from_str(&json).unwrap();
        value["SPOKE_CIDR_BLOCK"] = serde_json::json!("10.1.0.0");
        let err = NetworkConfig::from_json(&value.to_string()).unwrap_err();
        assert!(err.to_string().contains("SPOKE_CIDR_BLOCK"), "{err}");
    }

    #[test]
    fn test_bad_account_id() {
        let json = std::fs::read_to_string(TEST_CONFIG).unwrap();
        let mut value: serde_json::Value = serde_json::from_str(&json).unwrap();
        value["SPOKE_ACCOUNT_ID"] = serde_json::json!("12345");
        let err = NetworkConfig::from_json(&value.to_string()).unwrap_err();
        assert!(err.to_string().contains("SPOKE_ACCOUNT_ID"), "{err}");
    }

    #[test]
    fn test_config_path_order() {
        let env = || Some("from-env.json".to_string());
        assert_eq!(config_path(Some("flag.json"), env()), "flag.json");
        assert_eq!(config_path(None, env()), "from-env.json");
        assert_eq!(config_path(None, None), DEFAULT_CONFIG_FILE);
        let blank = Some(" ".to_string());
        assert_eq!(config_path(None, blank), DEFAULT_CONFIG_FILE);
    }

    #[test]
    fn test_stack_name_with_reference_syntax() {
        let json = std::fs::read_to_string(TEST_CONFIG).unwrap();
        for (key, name) in [
            ("NETWORKHUB_VPC_STACK", "networkhub.demo"),
            ("SPOKE_VPC_STACK", "spoke}demo"),
        ] {
            let mut value: serde_json::Value = serde_json::from_str(&json).unwrap();
            value[key] = serde_json::json!(name);
            let err = NetworkConfig::from_json(&value.to_string()).unwrap_err();
            assert!(err.to_string().starts_with(key), "{err}");
        }
    }

    #[test]
    fn test_ssm_endpoints_order() {
        let config = NetworkConfig::load(Some(TEST_CONFIG)).unwrap();
        let services: Vec<&str> = config.ssm_endpoints().iter().map(|(s, _)| *s).collect();
        assert_eq!(services, vec!["ssm", "ssmmessages", "ec2messages"]);
    }
}
