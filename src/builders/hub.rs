//! Hub network: VPC, Transit Gateway shared to the organization, SSM endpoints.

use super::network::{
    add_nacl, add_route_table, add_subnet_tier, add_tgw_attachment, add_tgw_default_route,
    add_vpc, associate_route_table, publish_vpc_id, SubnetTier,
};
use crate::config::NetworkConfig;
use crate::models::{
    name_tags, EndpointType, Ipv4, Lookup, LookupSpec, Reference, Resource, ResourceSpec,
    SecurityGroupRule, Stack, Toggle, Unit,
};
use std::error::Error;

/// Interface endpoints: (resource suffix, AWS service).
const INTERFACE_ENDPOINTS: [(&str, &str); 3] = [
    ("ec2messages", "ec2messages"),
    ("ssmmessages", "ssmmessages"),
    ("ssmendpoint", "ssm"),
];

/// Build the hub stack over the given availability zones.
pub fn build_hub_stack(config: &NetworkConfig, zones: &[String]) -> Result<Stack, Box<dyn Error>> {
    let name = config.networkhub_vpc_stack.as_str();
    let cidr = config.networkhub_cidr_block;
    log::info!("Building hub stack {name} {cidr} in {}", config.region);

    let mut stack = Stack::new(name, Unit::Hub, &config.region);
    stack.availability_zones = zones.to_vec();

    let vpc = add_vpc(&mut stack, name, cidr)?;
    publish_vpc_id(&mut stack, name, &vpc, None)?;

    let igw_name = format!("{name}-igw");
    stack.add_resource(Resource::new(
        &igw_name,
        ResourceSpec::InternetGateway {
            vpc_id: vpc.clone(),
            tags: name_tags(&igw_name),
        },
    ))?;
    let igw = Reference::id(&igw_name);

    let mask = config.subnet_mask;
    let public = add_subnet_tier(
        &mut stack,
        name,
        &vpc,
        &cidr,
        SubnetTier::Public,
        zones,
        mask,
    )?;
    let private = add_subnet_tier(
        &mut stack,
        name,
        &vpc,
        &cidr,
        SubnetTier::Private,
        zones,
        mask,
    )?;

    let private_rt = add_route_table(&mut stack, name, &vpc, SubnetTier::Private, None)?;
    let public_rt = add_route_table(&mut stack, name, &vpc, SubnetTier::Public, Some(&igw))?;
    associate_route_table(
        &mut stack,
        name,
        SubnetTier::Private,
        &private,
        &private_rt,
        zones,
    )?;
    associate_route_table(
        &mut stack,
        name,
        SubnetTier::Public,
        &public,
        &public_rt,
        zones,
    )?;

    let tgw = add_transit_gateway(&mut stack, name, config.transit_gateway_asn)?;
    let attachment = add_tgw_attachment(&mut stack, name, &vpc, &tgw, &private)?;
    add_tgw_default_route(
        &mut stack,
        name,
        SubnetTier::Private,
        &private_rt,
        &tgw,
        &attachment,
    )?;

    share_with_organization(&mut stack, name, &tgw)?;

    for (suffix, service) in INTERFACE_ENDPOINTS {
        add_interface_endpoint(&mut stack, config, &vpc, &private, suffix, service)?;
    }
    add_gateway_endpoint(&mut stack, config, &vpc, &private_rt, "s3")?;

    add_nacl(&mut stack, name, &vpc, SubnetTier::Public, &public)?;
    add_nacl(&mut stack, name, &vpc, SubnetTier::Private, &private)?;

    log::info!("Built {stack}");
    Ok(stack)
}

fn add_transit_gateway(
    stack: &mut Stack,
    name: &str,
    asn: u32,
) -> Result<Reference, Box<dyn Error>> {
    let tgw_name = format!("{name}-tgw");
    stack.add_resource(Resource::new(
        &tgw_name,
        ResourceSpec::TransitGateway {
            description: tgw_name.clone(),
            amazon_side_asn: asn,
            auto_accept_shared_attachments: Toggle::Enable,
            default_route_table_association: Toggle::Enable,
            default_route_table_propagation: Toggle::Enable,
            dns_support: Toggle::Enable,
            tags: name_tags(&tgw_name),
        },
    ))?;
    Ok(Reference::id(&tgw_name))
}

/// RAM share of the Transit Gateway to the whole AWS Organization.
fn share_with_organization(
    stack: &mut Stack,
    name: &str,
    tgw: &Reference,
) -> Result<(), Box<dyn Error>> {
    let share_name = format!("{name}-tgw-share-organization");
    stack.add_resource(Resource::new(
        &share_name,
        ResourceSpec::ResourceShare {
            allow_external_principals: true,
            tags: name_tags(&share_name),
        },
    ))?;
    let share_arn = Reference::arn(&share_name);

    stack.add_resource(Resource::new(
        &format!("{name}-ram-resource-association"),
        ResourceSpec::ResourceAssociation {
            resource_arn: Reference::arn(&tgw.node),
            resource_share_arn: share_arn.clone(),
        },
    ))?;

    let org = stack.add_lookup(Lookup::new("organization", LookupSpec::Organization {}))?;
    stack.add_resource(Resource::new(
        &format!("{name}-share-principal-association"),
        ResourceSpec::PrincipalAssociation {
            principal: format!(
                "arn:aws:organizations::{}:organization/{}",
                Reference::new(&org, "master_account_id"),
                Reference::id(&org)
            ),
            resource_share_arn: share_arn,
        },
    ))?;
    Ok(())
}

/// Interface endpoint in the private subnets, behind its own security group.
fn add_interface_endpoint(
    stack: &mut Stack,
    config: &NetworkConfig,
    vpc: &Reference,
    subnets: &[Reference],
    suffix: &str,
    service: &str,
) -> Result<(), Box<dyn Error>> {
    let name = config.networkhub_vpc_stack.as_str();
    let port = config.vpce_inbound_port;
    let sg_name = format!("{name}-vpce-{suffix}-security-group");
    stack.add_resource(Resource::new(
        &sg_name,
        ResourceSpec::SecurityGroup {
            name: format!("{name}--{suffix}-vpce-security-group"),
            vpc_id: vpc.clone(),
            ingress: vec![SecurityGroupRule {
                protocol: "tcp".to_string(),
                from_port: port,
                to_port: port,
                cidr_blocks: vec![config.networkhub_cidr_block, config.spoke_cidr_block],
            }],
            egress: vec![SecurityGroupRule {
                protocol: "-1".to_string(),
                from_port: 0,
                to_port: 0,
                cidr_blocks: vec![Ipv4::new("0.0.0.0/0")?],
            }],
        },
    ))?;

    let endpoint_name = format!("{name}-vpce-{suffix}");
    stack.add_resource(Resource::new(
        &endpoint_name,
        ResourceSpec::VpcEndpoint {
            vpc_id: vpc.clone(),
            service_name: config.service_name(service),
            vpc_endpoint_type: EndpointType::Interface,
            subnet_ids: subnets.to_vec(),
            security_group_ids: vec![Reference::id(&sg_name)],
            route_table_ids: vec![],
            private_dns_enabled: Some(false),
            tags: name_tags(&endpoint_name),
        },
    ))?;
    Ok(())
}

/// Gateway endpoint attached to the private route table.
fn add_gateway_endpoint(
    stack: &mut Stack,
    config: &NetworkConfig,
    vpc: &Reference,
    route_table: &Reference,
    service: &str,
) -> Result<(), Box<dyn Error>> {
    let endpoint_name = format!("{}-vpce-gateway-{service}", config.networkhub_vpc_stack);
    stack.add_resource(Resource::new(
        &endpoint_name,
        ResourceSpec::VpcEndpoint {
            vpc_id: vpc.clone(),
            service_name: config.service_name(service),
            vpc_endpoint_type: EndpointType::Gateway,
            subnet_ids: vec![],
            security_group_ids: vec![],
            route_table_ids: vec![route_table.clone()],
            private_dns_enabled: None,
            tags: name_tags(&endpoint_name),
        },
    ))?;
    Ok(())
}
