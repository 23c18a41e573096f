//! Output of synthesized stacks.
//!
//! - [`json`] - Stack documents for the provisioning engine
//! - [`csv`] - Subnet layout as CSV
//! - [`terminal`] - Coloured plan listing and field helpers

mod csv;
mod json;
mod terminal;

pub use csv::{subnet_print, subnet_rows, SubnetPrintRow};
pub use json::{stack_to_json, write_stack};
pub use terminal::{format_field, print_plan};
