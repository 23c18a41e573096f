//! Apply order implied by the dependency hints.
//!
//! The provisioning engine does its own scheduling. These waves only show which
//! resources it is free to create together.

use crate::models::{Resource, Stack};
use std::collections::{BTreeMap, BTreeSet};
use std::error::Error;

/// Group resources into waves: every resource's dependencies sit in earlier waves.
///
/// Names inside a wave are sorted. A cycle is an error naming the resources caught in it.
pub fn apply_waves(stack: &Stack) -> Result<Vec<Vec<String>>, Box<dyn Error>> {
    let mut pending: BTreeMap<&str, BTreeSet<String>> = BTreeMap::new();
    for resource in &stack.resources {
        pending.insert(&resource.name, stack.dependencies(resource)?);
    }

    let mut waves = Vec::new();
    let mut done: BTreeSet<String> = BTreeSet::new();
    while !pending.is_empty() {
        let wave: Vec<String> = pending
            .iter()
            .filter(|(_, deps)| deps.is_subset(&done))
            .map(|(name, _)| name.to_string())
            .collect();
        if wave.is_empty() {
            let stuck: Vec<&str> = pending.keys().copied().collect();
            return Err(format!(
                "Dependency cycle in stack {} between: {}",
                stack.name,
                stuck.join(", ")
            )
            .into());
        }
        for name in &wave {
            pending.remove(name.as_str());
            done.insert(name.clone());
        }
        log::debug!(
            "{}: wave #{} = {} resources",
            stack.name,
            waves.len(),
            wave.len()
        );
        waves.push(wave);
    }
    Ok(waves)
}

/// All resources in a valid creation order.
pub fn dependency_order(stack: &Stack) -> Result<Vec<&Resource>, Box<dyn Error>> {
    let waves = apply_waves(stack)?;
    let mut ordered = Vec::with_capacity(stack.resources.len());
    for name in waves.iter().flatten() {
        let resource = stack
            .resource(name)
            .ok_or_else(|| format!("Resource {name} vanished from stack {}", stack.name))?;
        ordered.push(resource);
    }
    Ok(ordered)
}
