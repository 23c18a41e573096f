//! Spoke network: VPC attached to the hub Transit Gateway.

use super::network::{
    add_nacl, add_route_table, add_subnet_tier, add_tgw_attachment, add_tgw_default_route,
    add_vpc, associate_route_table, publish_vpc_id, SubnetTier,
};
use crate::config::NetworkConfig;
use crate::models::{Filter, Lookup, LookupSpec, Provider, Reference, Stack, Unit};
use std::error::Error;

/// Build the spoke stack over the given availability zones.
pub fn build_spoke_stack(
    config: &NetworkConfig,
    zones: &[String],
) -> Result<Stack, Box<dyn Error>> {
    let name = config.spoke_vpc_stack.as_str();
    let cidr = config.spoke_cidr_block;
    let mask = config.subnet_mask;
    log::info!("Building spoke stack {name} {cidr} in {}", config.region);

    let mut stack = Stack::new(name, Unit::Spoke, &config.region);
    stack.availability_zones = zones.to_vec();

    // the VPC id goes to the hub account, where the DNS unit reads it
    let hub_provider = stack.add_provider(Provider {
        name: format!("provider-{}", config.networkhub_account_id),
        region: config.region.clone(),
        assume_role_arn: config.networkhub_role_arn(),
    })?;

    let vpc = add_vpc(&mut stack, name, cidr)?;
    publish_vpc_id(&mut stack, name, &vpc, Some(&hub_provider))?;

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
    let db = add_subnet_tier(&mut stack, name, &vpc, &cidr, SubnetTier::Db, zones, mask)?;

    let private_rt = add_route_table(&mut stack, name, &vpc, SubnetTier::Private, None)?;
    let public_rt = add_route_table(&mut stack, name, &vpc, SubnetTier::Public, None)?;
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
    associate_route_table(&mut stack, name, SubnetTier::Db, &db, &private_rt, zones)?;

    let tgw = stack.add_lookup(Lookup::new(
        "hub-transit-gateway",
        LookupSpec::TransitGateway {
            filters: vec![Filter {
                name: "options.amazon-side-asn".to_string(),
                values: vec![config.transit_gateway_asn.to_string()],
            }],
        },
    ))?;
    let tgw = Reference::id(&tgw);

    let attachment = add_tgw_attachment(&mut stack, name, &vpc, &tgw, &private)?;
    add_tgw_default_route(
        &mut stack,
        name,
        SubnetTier::Private,
        &private_rt,
        &tgw,
        &attachment,
    )?;
    add_tgw_default_route(
        &mut stack,
        name,
        SubnetTier::Public,
        &public_rt,
        &tgw,
        &attachment,
    )?;

    add_nacl(&mut stack, name, &vpc, SubnetTier::Public, &public)?;
    add_nacl(&mut stack, name, &vpc, SubnetTier::Private, &private)?;
    add_nacl(&mut stack, name, &vpc, SubnetTier::Db, &db)?;

    log::info!("Built {stack}");
    Ok(stack)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builders::tests::{test_config, test_zones};
    use crate::models::ResourceSpec;
    use crate::processing::apply_waves;

    #[test]
    fn test_spoke_subnets() {
        let stack = build_spoke_stack(&test_config(), &test_zones()).unwrap();
        let subnets = stack.subnets();
        assert_eq!(subnets.len(), 9);
        for tier in ["public", "private", "db"] {
            assert_eq!(
                subnets.iter().filter(|s| s.tier == tier).count(),
                3,
                "{tier}"
            );
        }
        let last = subnets.last().unwrap();
        assert_eq!(last.cidr.to_string(), "10.1.8.0/24");
        assert_eq!(last.availability_zone, "eu-west-1c");
    }

    #[test]
    fn test_spoke_publishes_into_hub_account() {
        let stack = build_spoke_stack(&test_config(), &test_zones()).unwrap();
        assert_eq!(stack.providers.len(), 1);
        assert_eq!(
            stack.providers[0].assume_role_arn,
            "arn:aws:iam::111111111111:role/network-admin"
        );
        let param = stack.resource("spoke-demo-vpc-id").unwrap();
        assert_eq!(param.provider.as_deref(), Some("provider-111111111111"));
        // only the parameter crosses accounts
        assert_eq!(
            stack
                .resources
                .iter()
                .filter(|r| r.provider.is_some())
                .count(),
            1
        );
    }

    #[test]
    fn test_spoke_tgw_lookup() {
        let stack = build_spoke_stack(&test_config(), &test_zones()).unwrap();
        assert_eq!(stack.lookups.len(), 1);
        match &stack.lookups[0].spec {
            LookupSpec::TransitGateway { filters } => {
                assert_eq!(filters[0].values, vec!["64512"]);
            }
            other => panic!("unexpected lookup {other:?}"),
        }
        let attachment = stack.resource("spoke-demo-tgw-attachment").unwrap();
        match &attachment.spec {
            ResourceSpec::TransitGatewayVpcAttachment {
                transit_gateway_id, ..
            } => assert_eq!(transit_gateway_id, &Reference::id("hub-transit-gateway")),
            other => panic!("unexpected spec {other:?}"),
        }
        assert_eq!(stack.resources_of("Route").count(), 2);
        assert!(stack.resources_of("InternetGateway").next().is_none());
    }

    #[test]
    fn test_spoke_tgw_routes_wait_for_attachment() {
        let stack = build_spoke_stack(&test_config(), &test_zones()).unwrap();
        let waves = apply_waves(&stack).unwrap();
        let wave_of = |name: &str| {
            waves
                .iter()
                .position(|wave| wave.iter().any(|n| n == name))
                .unwrap()
        };

        let attachment = wave_of("spoke-demo-tgw-attachment");
        let routes: Vec<&str> = stack
            .resources_of("Route")
            .map(|r| r.name.as_str())
            .collect();
        assert_eq!(
            routes,
            vec![
                "spoke-demo-private-route-table-tgw-route",
                "spoke-demo-public-route-table-tgw-route",
            ]
        );
        for route in routes {
            assert!(wave_of(route) > attachment, "{route} before attachment");
            assert_eq!(
                stack.resource(route).unwrap().depends_on,
                vec!["spoke-demo-tgw-attachment"]
            );
        }
    }
}
