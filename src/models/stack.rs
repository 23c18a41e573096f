//! A deployment unit's resource graph.

use super::lookup::{Lookup, Provider};
use super::reference::{scan_references, Reference};
use super::resource::{collect_references, Resource, ResourceSpec};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::error::Error;
use std::fmt;

/// The three independent deployment units.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Unit {
    Hub,
    Spoke,
    Dns,
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Unit::Hub => "hub",
            Unit::Spoke => "spoke",
            Unit::Dns => "dns",
        };
        write!(f, "{s}")
    }
}

/// The document handed to the provisioning engine for one unit.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Stack {
    pub name: String,
    pub unit: Unit,
    pub region: String,
    #[serde(default)]
    pub availability_zones: Vec<String>,
    #[serde(default)]
    pub providers: Vec<Provider>,
    #[serde(default)]
    pub lookups: Vec<Lookup>,
    pub resources: Vec<Resource>,
    #[serde(default)]
    pub outputs: BTreeMap<String, Reference>,
}

impl Stack {
    pub fn new(name: &str, unit: Unit, region: &str) -> Stack {
        Stack {
            name: name.to_string(),
            unit,
            region: region.to_string(),
            availability_zones: vec![],
            providers: vec![],
            lookups: vec![],
            resources: vec![],
            outputs: BTreeMap::new(),
        }
    }

    /// True if any provider, lookup or resource uses `name`.
    pub fn has_node(&self, name: &str) -> bool {
        self.providers.iter().any(|p| p.name == name)
            || self.lookups.iter().any(|l| l.name == name)
            || self.resources.iter().any(|r| r.name == name)
    }

    fn check_new_name(&self, name: &str) -> Result<(), Box<dyn Error>> {
        if name.is_empty() || name.contains('.') || name.contains('}') {
            return Err(format!("Invalid node name '{name}' in stack {}", self.name).into());
        }
        if self.has_node(name) {
            return Err(format!("Duplicate node name '{name}' in stack {}", self.name).into());
        }
        Ok(())
    }

    pub fn add_provider(&mut self, provider: Provider) -> Result<String, Box<dyn Error>> {
        self.check_new_name(&provider.name)?;
        let name = provider.name.clone();
        self.providers.push(provider);
        Ok(name)
    }

    pub fn add_lookup(&mut self, lookup: Lookup) -> Result<String, Box<dyn Error>> {
        self.check_new_name(&lookup.name)?;
        let name = lookup.name.clone();
        self.lookups.push(lookup);
        Ok(name)
    }

    /// Add a resource and return its logical name.
    pub fn add_resource(&mut self, resource: Resource) -> Result<String, Box<dyn Error>> {
        self.check_new_name(&resource.name)?;
        log::trace!(
            "{}: + {} {}",
            self.name,
            resource.spec.kind(),
            resource.name
        );
        let name = resource.name.clone();
        self.resources.push(resource);
        Ok(name)
    }

    pub fn add_output(&mut self, name: &str, value: Reference) {
        self.outputs.insert(name.to_string(), value);
    }

    pub fn resource(&self, name: &str) -> Option<&Resource> {
        self.resources.iter().find(|r| r.name == name)
    }

    /// Resources of one kind, in declaration order.
    pub fn resources_of<'a>(&'a self, kind: &'a str) -> impl Iterator<Item = &'a Resource> + 'a {
        self.resources.iter().filter(move |r| r.spec.kind() == kind)
    }

    /// Resource nodes that `resource` must be created after.
    ///
    /// Explicit `depends_on` plus every resource it references. References to lookups and
    /// providers are not edges, the engine resolves those before any resource.
    pub fn dependencies(&self, resource: &Resource) -> Result<BTreeSet<String>, Box<dyn Error>> {
        let mut deps = BTreeSet::new();
        for node in &resource.depends_on {
            if self.resource(node).is_none() {
                return Err(format!(
                    "Resource {} depends on unknown resource '{node}'",
                    resource.name
                )
                .into());
            }
            deps.insert(node.clone());
        }
        for reference in resource.references()? {
            if !self.has_node(&reference.node) {
                return Err(format!(
                    "Resource {} references unknown node: {reference}",
                    resource.name
                )
                .into());
            }
            if self.resource(&reference.node).is_some() {
                deps.insert(reference.node);
            }
        }
        Ok(deps)
    }

    /// All references that point nowhere: from resources, lookups and outputs.
    pub fn dangling_references(&self) -> Result<Vec<Reference>, Box<dyn Error>> {
        let mut found = Vec::new();
        let mut missing_providers = Vec::new();
        for resource in &self.resources {
            found.extend(resource.references()?);
            if let Some(provider) = &resource.provider {
                if !self.providers.iter().any(|p| &p.name == provider) {
                    missing_providers.push(Reference::new(provider, "provider"));
                }
            }
        }
        for lookup in &self.lookups {
            if let Some(provider) = &lookup.provider {
                if !self.providers.iter().any(|p| &p.name == provider) {
                    missing_providers.push(Reference::new(provider, "provider"));
                }
            }
            let value = serde_json::to_value(&lookup.spec)
                .map_err(|e| format!("Error serializing lookup {}: {e}", lookup.name))?;
            collect_references(&value, &mut found);
        }
        for output in self.outputs.values() {
            found.extend(scan_references(&output.to_string()));
        }
        found.retain(|r| !self.has_node(&r.node));
        found.extend(missing_providers);
        Ok(found)
    }

    /// Subnets with their CIDR, zone and `Tier` tag.
    pub fn subnets(&self) -> Vec<SubnetView<'_>> {
        self.resources
            .iter()
            .filter_map(|r| match &r.spec {
                ResourceSpec::Subnet {
                    vpc_id,
                    cidr_block,
                    availability_zone,
                    tags,
                    ..
                } => Some(SubnetView {
                    name: &r.name,
                    vpc: &vpc_id.node,
                    cidr: *cidr_block,
                    availability_zone,
                    tier: tags.get("Tier").map(|s| s.as_str()).unwrap_or("none"),
                }),
                _ => None,
            })
            .collect()
    }
}

/// Borrowed view of a declared subnet.
#[derive(Debug, Clone, Copy)]
pub struct SubnetView<'a> {
    pub name: &'a str,
    pub vpc: &'a str,
    pub cidr: super::Ipv4,
    pub availability_zone: &'a str,
    pub tier: &'a str,
}

impl fmt::Display for Stack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} [{}] ({} resources, {} lookups, {} providers, {})",
            self.name,
            self.unit,
            self.resources.len(),
            self.lookups.len(),
            self.providers.len(),
            self.region
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{name_tags, Ipv4, LookupSpec};

    fn vpc(name: &str) -> Resource {
        Resource::new(
            name,
            ResourceSpec::Vpc {
                cidr_block: Ipv4::new("10.0.0.0/16").unwrap(),
                enable_dns_support: true,
                enable_dns_hostnames: true,
                tags: name_tags(name),
            },
        )
    }

    fn igw(name: &str, vpc: &str) -> Resource {
        Resource::new(
            name,
            ResourceSpec::InternetGateway {
                vpc_id: Reference::id(vpc),
                tags: name_tags(name),
            },
        )
    }

    #[test]
    fn test_duplicate_and_invalid_names() {
        let mut stack = Stack::new("hub", Unit::Hub, "eu-west-1");
        stack.add_resource(vpc("hub")).unwrap();
        let err = stack.add_resource(vpc("hub")).unwrap_err();
        assert!(err.to_string().contains("Duplicate node name 'hub'"));
        assert!(stack.add_resource(vpc("hub.vpc")).is_err());
        assert!(stack.add_resource(vpc("")).is_err());
    }

    #[test]
    fn test_dependencies() {
        let mut stack = Stack::new("hub", Unit::Hub, "eu-west-1");
        stack.add_resource(vpc("hub")).unwrap();
        stack.add_resource(vpc("other")).unwrap();
        stack
            .add_resource(igw("hub-igw", "hub").depends_on("other"))
            .unwrap();

        let igw = stack.resource("hub-igw").unwrap();
        let deps = stack.dependencies(igw).unwrap();
        assert_eq!(
            deps.into_iter().collect::<Vec<_>>(),
            vec!["hub".to_string(), "other".to_string()]
        );
    }

    #[test]
    fn test_dangling_reference() {
        let mut stack = Stack::new("hub", Unit::Hub, "eu-west-1");
        stack.add_resource(igw("hub-igw", "missing")).unwrap();
        let dangling = stack.dangling_references().unwrap();
        assert_eq!(dangling, vec![Reference::id("missing")]);
        assert!(stack
            .dependencies(stack.resource("hub-igw").unwrap())
            .is_err());
    }

    #[test]
    fn test_unknown_provider_is_dangling() {
        let mut stack = Stack::new("spoke", Unit::Spoke, "eu-west-1");
        stack
            .add_resource(vpc("spoke").with_provider("provider-nowhere"))
            .unwrap();
        let dangling = stack.dangling_references().unwrap();
        assert_eq!(dangling.len(), 1);
        assert_eq!(dangling[0].node, "provider-nowhere");
    }

    #[test]
    fn test_lookup_provider_must_exist() {
        let mut stack = Stack::new("dns", Unit::Dns, "eu-west-1");
        let lookup = || {
            Lookup::new(
                "spoke-vpc-id",
                LookupSpec::SsmParameter {
                    name: "spoke-vpc-id".to_string(),
                },
            )
            .with_provider("provider-spoke")
        };
        stack.add_lookup(lookup()).unwrap();
        let dangling = stack.dangling_references().unwrap();
        assert_eq!(dangling, vec![Reference::new("provider-spoke", "provider")]);

        let mut stack = Stack::new("dns", Unit::Dns, "eu-west-1");
        stack
            .add_provider(Provider {
                name: "provider-spoke".to_string(),
                region: "eu-west-1".to_string(),
                assume_role_arn: "arn:aws:iam::222222222222:role/network-admin".to_string(),
            })
            .unwrap();
        stack.add_lookup(lookup()).unwrap();
        assert!(stack.dangling_references().unwrap().is_empty());
    }
}
