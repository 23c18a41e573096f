//! Private DNS for the SSM endpoints, shared with the spoke VPC.

use crate::config::NetworkConfig;
use crate::models::{
    Lookup, LookupSpec, Provider, RecordAlias, Reference, Resource, ResourceSpec, Stack, Unit,
    ZoneVpc,
};
use std::error::Error;

/// Build the DNS stack. It runs in the hub account and associates the spoke VPC
/// through a provider in the spoke account.
pub fn build_dns_stack(config: &NetworkConfig) -> Result<Stack, Box<dyn Error>> {
    let name = format!("{}-r53-config", config.networkhub_vpc_stack);
    log::info!("Building dns stack {name} in {}", config.region);

    let mut stack = Stack::new(&name, Unit::Dns, &config.region);

    let spoke_provider = stack.add_provider(Provider {
        name: format!("provider-{}-access", config.spoke_account_id),
        region: config.region.clone(),
        assume_role_arn: config.spoke_role_arn(),
    })?;

    let hub_vpc_param = NetworkConfig::vpc_id_parameter(&config.networkhub_vpc_stack);
    let spoke_vpc_param = NetworkConfig::vpc_id_parameter(&config.spoke_vpc_stack);
    stack.add_lookup(Lookup::new(
        &hub_vpc_param,
        LookupSpec::SsmParameter {
            name: hub_vpc_param.clone(),
        },
    ))?;
    stack.add_lookup(Lookup::new(
        &spoke_vpc_param,
        LookupSpec::SsmParameter {
            name: spoke_vpc_param.clone(),
        },
    ))?;
    let hub_vpc = Reference::new(&hub_vpc_param, "value");
    let spoke_vpc = Reference::new(&spoke_vpc_param, "value");

    for (service, endpoint) in config.ssm_endpoints() {
        add_private_zone(
            &mut stack,
            config,
            service,
            endpoint,
            &hub_vpc,
            &spoke_vpc,
            &spoke_provider,
        )?;
    }

    log::info!("Built {stack}");
    Ok(stack)
}

/// Zone, alias record and spoke association for one endpoint hostname.
fn add_private_zone(
    stack: &mut Stack,
    config: &NetworkConfig,
    service: &str,
    endpoint: &str,
    hub_vpc: &Reference,
    spoke_vpc: &Reference,
    spoke_provider: &str,
) -> Result<(), Box<dyn Error>> {
    let vpce = stack.add_lookup(Lookup::new(
        &format!("{service}-vpc-endpoint"),
        LookupSpec::VpcEndpoint {
            vpc_id: hub_vpc.clone(),
            service_name: config.service_name(service),
        },
    ))?;

    let zone_name = format!("{service}-private-hosted-zone");
    stack.add_resource(Resource::new(
        &zone_name,
        ResourceSpec::Zone {
            name: endpoint.to_string(),
            vpcs: vec![ZoneVpc {
                vpc_id: hub_vpc.clone(),
            }],
        },
    ))?;
    let zone = Reference::id(&zone_name);

    stack.add_resource(Resource::new(
        &format!("{service}-private-hosted-zone-record"),
        ResourceSpec::Record {
            zone_id: zone.clone(),
            name: endpoint.to_string(),
            record_type: "A".to_string(),
            aliases: vec![RecordAlias {
                name: Reference::new(&vpce, "dns_entries[0].dns_name"),
                zone_id: config.vpce_dns_hosted_zone_id.clone(),
                evaluate_target_health: true,
            }],
        },
    ))?;

    let authorization = stack.add_resource(Resource::new(
        &format!("{service}-vpc-association-auth"),
        ResourceSpec::VpcAssociationAuthorization {
            vpc_id: spoke_vpc.clone(),
            zone_id: zone.clone(),
        },
    ))?;

    stack.add_resource(
        Resource::new(
            &format!("{service}-zone-association"),
            ResourceSpec::ZoneAssociation {
                vpc_id: spoke_vpc.clone(),
                zone_id: zone,
            },
        )
        .with_provider(spoke_provider)
        .depends_on(&authorization),
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builders::tests::test_config;

    #[test]
    fn test_dns_counts() {
        let stack = build_dns_stack(&test_config()).unwrap();
        assert_eq!(stack.name, "networkhub-demo-r53-config");
        assert_eq!(stack.resources_of("Zone").count(), 3);
        assert_eq!(stack.resources_of("Record").count(), 3);
        assert_eq!(stack.resources_of("VpcAssociationAuthorization").count(), 3);
        assert_eq!(stack.resources_of("ZoneAssociation").count(), 3);
        // 2 parameters + 3 endpoints
        assert_eq!(stack.lookups.len(), 5);
        assert!(stack.dangling_references().unwrap().is_empty());
    }

    #[test]
    fn test_zone_association_uses_spoke_provider() {
        let stack = build_dns_stack(&test_config()).unwrap();
        for association in stack.resources_of("ZoneAssociation") {
            assert_eq!(
                association.provider.as_deref(),
                Some("provider-222222222222-access")
            );
            assert_eq!(association.depends_on.len(), 1);
            assert!(association.depends_on[0].ends_with("-vpc-association-auth"));
        }
    }

    #[test]
    fn test_record_alias() {
        let stack = build_dns_stack(&test_config()).unwrap();
        let record = stack.resource("ssm-private-hosted-zone-record").unwrap();
        match &record.spec {
            ResourceSpec::Record {
                name,
                record_type,
                aliases,
                ..
            } => {
                assert_eq!(name, "ssm.eu-west-1.amazonaws.com");
                assert_eq!(record_type, "A");
                assert_eq!(
                    aliases[0].name.to_string(),
                    "${ssm-vpc-endpoint.dns_entries[0].dns_name}"
                );
                assert_eq!(aliases[0].zone_id, "ZDK2GCRPAFKGO");
            }
            other => panic!("unexpected spec {other:?}"),
        }
    }
}
