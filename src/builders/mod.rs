//! Resource graph builders, one per deployment unit.
//!
//! - [`network`] - VPC pieces shared by hub and spoke
//! - [`hub`] - hub VPC, Transit Gateway and endpoints
//! - [`spoke`] - spoke VPC attached to the hub
//! - [`dns`] - private hosted zones for the SSM endpoints

mod dns;
mod hub;
mod network;
mod spoke;

pub use dns::build_dns_stack;
pub use hub::build_hub_stack;
pub use network::{tier_cidr, SubnetTier, AZ_COUNT};
pub use spoke::build_spoke_stack;

#[cfg(test)]
pub(crate) mod tests {
    use crate::config::NetworkConfig;

    pub fn test_config() -> NetworkConfig {
        NetworkConfig::load(Some("src/tests/test_data/config_01.json"))
            .expect("Error reading test config")
    }

    pub fn test_zones() -> Vec<String> {
        vec![
            "eu-west-1a".to_string(),
            "eu-west-1b".to_string(),
            "eu-west-1c".to_string(),
        ]
    }
}
