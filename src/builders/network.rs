//! Network pieces shared by the hub and spoke VPCs.

use crate::config::NetworkConfig;
use crate::models::{
    name_tags, AclAction, AclRule, Ipv4, Reference, Resource, ResourceSpec, RouteRule, Stack,
};
use std::error::Error;
use std::fmt;

/// Number of availability zones every tier is spread over.
pub const AZ_COUNT: usize = 3;

/// Subnet tiers of a VPC.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubnetTier {
    Public,
    Private,
    Db,
}

impl SubnetTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubnetTier::Public => "public",
            SubnetTier::Private => "private",
            SubnetTier::Db => "db",
        }
    }

    /// Index of the tier's first block inside the VPC CIDR.
    fn offset(&self) -> usize {
        match self {
            SubnetTier::Public => 0,
            SubnetTier::Private => AZ_COUNT,
            SubnetTier::Db => 2 * AZ_COUNT,
        }
    }

    fn map_public_ip_on_launch(&self) -> bool {
        matches!(self, SubnetTier::Public)
    }
}

impl fmt::Display for SubnetTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

fn any_ipv4() -> Ipv4 {
    Ipv4 {
        addr: std::net::Ipv4Addr::UNSPECIFIED,
        mask: 0,
    }
}

/// CIDR of subnet `index` of `tier`.
pub fn tier_cidr(
    vpc_cidr: &Ipv4,
    tier: SubnetTier,
    index: usize,
    mask: u8,
) -> Result<Ipv4, Box<dyn Error>> {
    vpc_cidr.subdivide(mask, tier.offset() + index)
}

/// Declare the VPC itself, with DNS support and hostnames enabled.
pub fn add_vpc(stack: &mut Stack, name: &str, cidr: Ipv4) -> Result<Reference, Box<dyn Error>> {
    let vpc = stack.add_resource(Resource::new(
        name,
        ResourceSpec::Vpc {
            cidr_block: cidr,
            enable_dns_support: true,
            enable_dns_hostnames: true,
            tags: name_tags(name),
        },
    ))?;
    Ok(Reference::id(&vpc))
}

/// Publish the VPC id as `<name>-vpc-id` and as the `vpc_id` stack output.
///
/// With a `provider`, the parameter is written into that provider's account.
pub fn publish_vpc_id(
    stack: &mut Stack,
    name: &str,
    vpc: &Reference,
    provider: Option<&str>,
) -> Result<(), Box<dyn Error>> {
    let param_name = NetworkConfig::vpc_id_parameter(name);
    let mut param = Resource::new(
        &param_name,
        ResourceSpec::SsmParameter {
            name: param_name.clone(),
            param_type: "String".to_string(),
            value: vpc.clone(),
        },
    );
    if let Some(provider) = provider {
        param = param.with_provider(provider);
    }
    stack.add_resource(param)?;
    stack.add_output("vpc_id", vpc.clone());
    Ok(())
}

/// Declare one subnet per zone for `tier`.
pub fn add_subnet_tier(
    stack: &mut Stack,
    name: &str,
    vpc: &Reference,
    vpc_cidr: &Ipv4,
    tier: SubnetTier,
    zones: &[String],
    mask: u8,
) -> Result<Vec<Reference>, Box<dyn Error>> {
    if zones.len() < AZ_COUNT {
        return Err(format!(
            "{name}: {tier} tier needs {AZ_COUNT} availability zones, got {}",
            zones.len()
        )
        .into());
    }
    let mut subnets = Vec::with_capacity(AZ_COUNT);
    for (i, zone) in zones.iter().take(AZ_COUNT).enumerate() {
        let cidr = tier_cidr(vpc_cidr, tier, i, mask)?;
        let mut tags = name_tags(&format!("{name}-{tier}subnet-{zone}"));
        tags.insert("Tier".to_string(), tier.to_string());
        let subnet = stack.add_resource(Resource::new(
            &format!("{name}-{tier}-{i}"),
            ResourceSpec::Subnet {
                vpc_id: vpc.clone(),
                cidr_block: cidr,
                availability_zone: zone.clone(),
                map_public_ip_on_launch: tier.map_public_ip_on_launch(),
                tags,
            },
        ))?;
        subnets.push(Reference::id(&subnet));
    }
    Ok(subnets)
}

/// Declare `<name>-<tier>-route-table`, optionally with a default route to `gateway`.
pub fn add_route_table(
    stack: &mut Stack,
    name: &str,
    vpc: &Reference,
    tier: SubnetTier,
    gateway: Option<&Reference>,
) -> Result<Reference, Box<dyn Error>> {
    let table_name = format!("{name}-{tier}-route-table");
    let routes = gateway
        .map(|gw| {
            vec![RouteRule {
                cidr_block: any_ipv4(),
                gateway_id: Some(gw.clone()),
                transit_gateway_id: None,
            }]
        })
        .unwrap_or_default();
    let table = stack.add_resource(Resource::new(
        &table_name,
        ResourceSpec::RouteTable {
            vpc_id: vpc.clone(),
            routes,
            tags: name_tags(&table_name),
        },
    ))?;
    Ok(Reference::id(&table))
}

/// Associate each subnet of a tier with `route_table`.
pub fn associate_route_table(
    stack: &mut Stack,
    name: &str,
    tier: SubnetTier,
    subnets: &[Reference],
    route_table: &Reference,
    zones: &[String],
) -> Result<(), Box<dyn Error>> {
    for (i, (subnet, zone)) in subnets.iter().zip(zones).enumerate() {
        stack.add_resource(Resource::new(
            &format!("{name}-{tier}-route-table-asso-{zone}-{i}"),
            ResourceSpec::RouteTableAssociation {
                subnet_id: subnet.clone(),
                route_table_id: route_table.clone(),
            },
        ))?;
    }
    Ok(())
}

/// Declare `<name>-nacl-<tier>`: allow all traffic in (rule 100) and out (rule 200).
pub fn add_nacl(
    stack: &mut Stack,
    name: &str,
    vpc: &Reference,
    tier: SubnetTier,
    subnets: &[Reference],
) -> Result<Reference, Box<dyn Error>> {
    let allow_all = |rule_no| AclRule {
        protocol: "-1".to_string(),
        rule_no,
        action: AclAction::Allow,
        cidr_block: any_ipv4(),
        from_port: 0,
        to_port: 0,
    };
    let nacl_name = format!("{name}-nacl-{tier}");
    let nacl = stack.add_resource(Resource::new(
        &nacl_name,
        ResourceSpec::NetworkAcl {
            vpc_id: vpc.clone(),
            subnet_ids: subnets.to_vec(),
            ingress: vec![allow_all(100)],
            egress: vec![allow_all(200)],
            tags: name_tags(&nacl_name),
        },
    ))?;
    Ok(Reference::id(&nacl))
}

/// Attach the VPC to a Transit Gateway through the given subnets.
pub fn add_tgw_attachment(
    stack: &mut Stack,
    name: &str,
    vpc: &Reference,
    transit_gateway: &Reference,
    subnets: &[Reference],
) -> Result<String, Box<dyn Error>> {
    let attachment_name = format!("{name}-tgw-attachment");
    stack.add_resource(Resource::new(
        &attachment_name,
        ResourceSpec::TransitGatewayVpcAttachment {
            subnet_ids: subnets.to_vec(),
            transit_gateway_id: transit_gateway.clone(),
            vpc_id: vpc.clone(),
            tags: name_tags(&attachment_name),
        },
    ))
}

/// Route `0.0.0.0/0` of `route_table` to the Transit Gateway once `attachment` exists.
pub fn add_tgw_default_route(
    stack: &mut Stack,
    name: &str,
    tier: SubnetTier,
    route_table: &Reference,
    transit_gateway: &Reference,
    attachment: &str,
) -> Result<(), Box<dyn Error>> {
    stack.add_resource(
        Resource::new(
            &format!("{name}-{tier}-route-table-tgw-route"),
            ResourceSpec::Route {
                route_table_id: route_table.clone(),
                destination_cidr_block: any_ipv4(),
                transit_gateway_id: transit_gateway.clone(),
            },
        )
        .depends_on(attachment),
    )?;
    Ok(())
}
