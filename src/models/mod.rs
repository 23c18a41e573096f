//! Domain models for the hub/spoke network graph.
//!
//! This module contains the core data structures used throughout the application:
//! - [`Ipv4`] - IPv4 CIDR block with subnet carving helpers
//! - [`Reference`] - `${node.attribute}` links between graph nodes
//! - [`Resource`], [`Lookup`] and [`Provider`] - the nodes of a stack
//! - [`Stack`] - one deployment unit's resource graph

mod ipv4;
mod lookup;
mod reference;
mod resource;
mod stack;

// Re-export public types
pub use ipv4::{
    broadcast_addr, cut_addr, get_cidr_mask, ip_after_subnet, next_subnet_ipv4, num_aws_hosts,
    Ipv4, MAX_LENGTH,
};
pub use lookup::{role_arn, Filter, Lookup, LookupSpec, Provider};
pub use reference::{scan_references, Reference};
pub use resource::{
    name_tags, AclAction, AclRule, EndpointType, RecordAlias, Resource, ResourceSpec, RouteRule,
    SecurityGroupRule, Tags, Toggle, ZoneVpc,
};
pub use stack::{Stack, SubnetView, Unit};
