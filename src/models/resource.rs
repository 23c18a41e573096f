//! Declared AWS resources.
//!
//! Every variant of [`ResourceSpec`] serializes as
//! `{"type": "<type token>", "properties": {...}}` so the stack document reads like the
//! resource section of an engine program.

use super::reference::{scan_references, Reference};
use super::Ipv4;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::error::Error;

/// Resource tags, kept sorted for stable output.
pub type Tags = BTreeMap<String, String>;

/// `enable` / `disable` switches used by Transit Gateway options.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Toggle {
    Enable,
    Disable,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum AclAction {
    Allow,
    Deny,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndpointType {
    Interface,
    Gateway,
}

/// Inline route of a route table.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct RouteRule {
    pub cidr_block: Ipv4,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub gateway_id: Option<Reference>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub transit_gateway_id: Option<Reference>,
}

/// One NACL entry.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct AclRule {
    /// `-1` means all protocols.
    pub protocol: String,
    pub rule_no: u16,
    pub action: AclAction,
    pub cidr_block: Ipv4,
    pub from_port: u16,
    pub to_port: u16,
}

/// One security group ingress or egress entry.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct SecurityGroupRule {
    pub protocol: String,
    pub from_port: u16,
    pub to_port: u16,
    pub cidr_blocks: Vec<Ipv4>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ZoneVpc {
    pub vpc_id: Reference,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct RecordAlias {
    pub name: Reference,
    pub zone_id: String,
    pub evaluate_target_health: bool,
}

/// The closed set of resource kinds this crate declares.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(tag = "type", content = "properties")]
pub enum ResourceSpec {
    #[serde(rename = "aws:ec2/vpc:Vpc")]
    Vpc {
        cidr_block: Ipv4,
        enable_dns_support: bool,
        enable_dns_hostnames: bool,
        tags: Tags,
    },
    #[serde(rename = "aws:ec2/internetGateway:InternetGateway")]
    InternetGateway { vpc_id: Reference, tags: Tags },
    #[serde(rename = "aws:ec2/subnet:Subnet")]
    Subnet {
        vpc_id: Reference,
        cidr_block: Ipv4,
        availability_zone: String,
        map_public_ip_on_launch: bool,
        tags: Tags,
    },
    #[serde(rename = "aws:ec2/routeTable:RouteTable")]
    RouteTable {
        vpc_id: Reference,
        #[serde(skip_serializing_if = "Vec::is_empty", default)]
        routes: Vec<RouteRule>,
        tags: Tags,
    },
    #[serde(rename = "aws:ec2/route:Route")]
    Route {
        route_table_id: Reference,
        destination_cidr_block: Ipv4,
        transit_gateway_id: Reference,
    },
    #[serde(rename = "aws:ec2/routeTableAssociation:RouteTableAssociation")]
    RouteTableAssociation {
        subnet_id: Reference,
        route_table_id: Reference,
    },
    #[serde(rename = "aws:ec2/networkAcl:NetworkAcl")]
    NetworkAcl {
        vpc_id: Reference,
        subnet_ids: Vec<Reference>,
        ingress: Vec<AclRule>,
        egress: Vec<AclRule>,
        tags: Tags,
    },
    #[serde(rename = "aws:ec2/securityGroup:SecurityGroup")]
    SecurityGroup {
        name: String,
        vpc_id: Reference,
        ingress: Vec<SecurityGroupRule>,
        egress: Vec<SecurityGroupRule>,
    },
    #[serde(rename = "aws:ec2/vpcEndpoint:VpcEndpoint")]
    VpcEndpoint {
        vpc_id: Reference,
        service_name: String,
        vpc_endpoint_type: EndpointType,
        #[serde(skip_serializing_if = "Vec::is_empty", default)]
        subnet_ids: Vec<Reference>,
        #[serde(skip_serializing_if = "Vec::is_empty", default)]
        security_group_ids: Vec<Reference>,
        #[serde(skip_serializing_if = "Vec::is_empty", default)]
        route_table_ids: Vec<Reference>,
        #[serde(skip_serializing_if = "Option::is_none", default)]
        private_dns_enabled: Option<bool>,
        tags: Tags,
    },
    #[serde(rename = "aws:ec2transitgateway/transitGateway:TransitGateway")]
    TransitGateway {
        description: String,
        amazon_side_asn: u32,
        auto_accept_shared_attachments: Toggle,
        default_route_table_association: Toggle,
        default_route_table_propagation: Toggle,
        dns_support: Toggle,
        tags: Tags,
    },
    #[serde(rename = "aws:ec2transitgateway/vpcAttachment:VpcAttachment")]
    TransitGatewayVpcAttachment {
        subnet_ids: Vec<Reference>,
        transit_gateway_id: Reference,
        vpc_id: Reference,
        tags: Tags,
    },
    #[serde(rename = "aws:ram/resourceShare:ResourceShare")]
    ResourceShare {
        allow_external_principals: bool,
        tags: Tags,
    },
    #[serde(rename = "aws:ram/resourceAssociation:ResourceAssociation")]
    ResourceAssociation {
        resource_arn: Reference,
        resource_share_arn: Reference,
    },
    #[serde(rename = "aws:ram/principalAssociation:PrincipalAssociation")]
    PrincipalAssociation {
        /// May embed references, e.g. the organization ARN parts.
        principal: String,
        resource_share_arn: Reference,
    },
    #[serde(rename = "aws:ssm/parameter:Parameter")]
    SsmParameter {
        name: String,
        #[serde(rename = "type")]
        param_type: String,
        value: Reference,
    },
    #[serde(rename = "aws:route53/zone:Zone")]
    Zone { name: String, vpcs: Vec<ZoneVpc> },
    #[serde(rename = "aws:route53/record:Record")]
    Record {
        zone_id: Reference,
        name: String,
        #[serde(rename = "type")]
        record_type: String,
        aliases: Vec<RecordAlias>,
    },
    #[serde(rename = "aws:route53/vpcAssociationAuthorization:VpcAssociationAuthorization")]
    VpcAssociationAuthorization {
        vpc_id: Reference,
        zone_id: Reference,
    },
    #[serde(rename = "aws:route53/zoneAssociation:ZoneAssociation")]
    ZoneAssociation {
        vpc_id: Reference,
        zone_id: Reference,
    },
}

impl ResourceSpec {
    /// Short kind name, used in terminal output and validation.
    pub fn kind(&self) -> &'static str {
        match self {
            ResourceSpec::Vpc { .. } => "Vpc",
            ResourceSpec::InternetGateway { .. } => "InternetGateway",
            ResourceSpec::Subnet { .. } => "Subnet",
            ResourceSpec::RouteTable { .. } => "RouteTable",
            ResourceSpec::Route { .. } => "Route",
            ResourceSpec::RouteTableAssociation { .. } => "RouteTableAssociation",
            ResourceSpec::NetworkAcl { .. } => "NetworkAcl",
            ResourceSpec::SecurityGroup { .. } => "SecurityGroup",
            ResourceSpec::VpcEndpoint { .. } => "VpcEndpoint",
            ResourceSpec::TransitGateway { .. } => "TransitGateway",
            ResourceSpec::TransitGatewayVpcAttachment { .. } => "TransitGatewayVpcAttachment",
            ResourceSpec::ResourceShare { .. } => "ResourceShare",
            ResourceSpec::ResourceAssociation { .. } => "ResourceAssociation",
            ResourceSpec::PrincipalAssociation { .. } => "PrincipalAssociation",
            ResourceSpec::SsmParameter { .. } => "SsmParameter",
            ResourceSpec::Zone { .. } => "Zone",
            ResourceSpec::Record { .. } => "Record",
            ResourceSpec::VpcAssociationAuthorization { .. } => "VpcAssociationAuthorization",
            ResourceSpec::ZoneAssociation { .. } => "ZoneAssociation",
        }
    }
}

/// A named resource in a stack.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Resource {
    /// Logical name, unique within the stack.
    pub name: String,
    #[serde(flatten)]
    pub spec: ResourceSpec,
    /// Explicit ordering hints on top of the reference edges.
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub depends_on: Vec<String>,
    /// Name of the explicit provider to create this resource with.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub provider: Option<String>,
}

impl Resource {
    pub fn new(name: &str, spec: ResourceSpec) -> Resource {
        Resource {
            name: name.to_string(),
            spec,
            depends_on: vec![],
            provider: None,
        }
    }

    pub fn with_provider(mut self, provider: &str) -> Resource {
        self.provider = Some(provider.to_string());
        self
    }

    pub fn depends_on(mut self, node: &str) -> Resource {
        self.depends_on.push(node.to_string());
        self
    }

    /// Every reference found in the resource properties.
    pub fn references(&self) -> Result<Vec<Reference>, Box<dyn Error>> {
        let value = serde_json::to_value(&self.spec)
            .map_err(|e| format!("Error serializing resource {}: {e}", self.name))?;
        let mut found = Vec::new();
        collect_references(&value, &mut found);
        Ok(found)
    }

    /// The `Name` tag, if the resource carries tags.
    pub fn name_tag(&self) -> Option<&str> {
        self.tags().and_then(|t| t.get("Name")).map(|s| s.as_str())
    }

    pub fn tags(&self) -> Option<&Tags> {
        match &self.spec {
            ResourceSpec::Vpc { tags, .. }
            | ResourceSpec::InternetGateway { tags, .. }
            | ResourceSpec::Subnet { tags, .. }
            | ResourceSpec::RouteTable { tags, .. }
            | ResourceSpec::NetworkAcl { tags, .. }
            | ResourceSpec::VpcEndpoint { tags, .. }
            | ResourceSpec::TransitGateway { tags, .. }
            | ResourceSpec::TransitGatewayVpcAttachment { tags, .. }
            | ResourceSpec::ResourceShare { tags, .. } => Some(tags),
            _ => None,
        }
    }
}

/// Walk a JSON value and collect references from every string in it.
pub(crate) fn collect_references(value: &serde_json::Value, found: &mut Vec<Reference>) {
    match value {
        serde_json::Value::String(s) => found.extend(scan_references(s)),
        serde_json::Value::Array(items) => {
            for item in items {
                collect_references(item, found);
            }
        }
        serde_json::Value::Object(map) => {
            for item in map.values() {
                collect_references(item, found);
            }
        }
        _ => {}
    }
}

/// Build a tag map with a `Name` entry.
pub fn name_tags(name: &str) -> Tags {
    let mut tags = Tags::new();
    tags.insert("Name".to_string(), name.to_string());
    tags
}
