//! Stack processing logic.
//!
//! This module contains the checks and ordering run on synthesized stacks:
//! - [`order`] - Apply waves derived from the dependency hints
//! - [`validate`] - Subnet layout, overlap and reference checks

mod order;
mod validate;

// Re-export public functions
pub use order::{apply_waves, dependency_order};
pub use validate::{
    check_network_overlap, check_subnets_within_vpc, check_tier_layout, find_overlapping_subnets,
    log_overlapping_subnets, validate_stack, OverlapConflict,
};
