//! Read-only data sources and explicit providers.

use super::reference::Reference;
use serde::{Deserialize, Serialize};

/// Name/values filter passed to a lookup.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Filter {
    pub name: String,
    pub values: Vec<String>,
}

/// Data sources the engine resolves before planning.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(tag = "function", content = "arguments")]
pub enum LookupSpec {
    #[serde(rename = "aws:ec2transitgateway/getTransitGateway:getTransitGateway")]
    TransitGateway { filters: Vec<Filter> },
    #[serde(rename = "aws:organizations/getOrganization:getOrganization")]
    Organization {},
    #[serde(rename = "aws:ssm/getParameter:getParameter")]
    SsmParameter { name: String },
    #[serde(rename = "aws:ec2/getVpcEndpoint:getVpcEndpoint")]
    VpcEndpoint {
        vpc_id: Reference,
        service_name: String,
    },
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Lookup {
    pub name: String,
    #[serde(flatten)]
    pub spec: LookupSpec,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub provider: Option<String>,
}

impl Lookup {
    pub fn new(name: &str, spec: LookupSpec) -> Lookup {
        Lookup {
            name: name.to_string(),
            spec,
            provider: None,
        }
    }

    /// Resolve the lookup through an explicit provider.
    pub fn with_provider(mut self, provider: &str) -> Lookup {
        self.provider = Some(provider.to_string());
        self
    }
}

/// An explicit AWS provider that assumes a role in another account.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Provider {
    pub name: String,
    pub region: String,
    pub assume_role_arn: String,
}

/// `arn:aws:iam::<account>:role/<role>`
pub fn role_arn(account_id: &str, role_name: &str) -> String {
    format!("arn:aws:iam::{account_id}:role/{role_name}")
}
