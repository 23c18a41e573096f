//! Terminal output utilities.
//!
//! Provides formatting helpers for terminal output.

use crate::models::Stack;
use colored::Colorize;
use std::error::Error;

/// Format a value as a quoted, right-aligned field.
///
/// # Arguments
/// * `value` - The value to format
/// * `width` - The minimum width of the field
///
/// # Returns
/// A quoted, right-aligned string
pub fn format_field<T: ToString>(value: T, width: usize) -> String {
    let value_str = value.to_string();
    let quoted = format!("\"{value_str}\"");
    let quoted_len = quoted.len();

    if quoted_len >= width {
        quoted
    } else {
        format!("{quoted:>width$}")
    }
}

/// Print the apply waves of a stack, one resource per line.
pub fn print_plan(stack: &Stack, waves: &[Vec<String>]) -> Result<(), Box<dyn Error>> {
    println!(
        "{} {} ({} resources in {} waves)",
        "STACK".on_blue(),
        stack.to_string().bold(),
        stack.resources.len(),
        waves.len()
    );
    for provider in &stack.providers {
        println!(
            "  provider {} -> {}",
            provider.name.cyan(),
            provider.assume_role_arn
        );
    }
    for lookup in &stack.lookups {
        println!("  lookup   {}", lookup.name.cyan());
    }
    for (i, wave) in waves.iter().enumerate() {
        println!("  {}", format!("wave {i}").yellow());
        for name in wave {
            let resource = stack
                .resource(name)
                .ok_or_else(|| format!("Unknown resource in plan: {name}"))?;
            let via = resource
                .provider
                .as_deref()
                .map(|p| format!(" [{p}]"))
                .unwrap_or_default();
            println!(
                "    + {kind:<28} {name}{via}",
                kind = resource.spec.kind().green(),
                via = via.magenta()
            );
        }
    }
    for (key, value) in &stack.outputs {
        println!("  output   {key} = {value}");
    }
    Ok(())
}
