//! CSV output of a stack's subnet layout.

use crate::models::{num_aws_hosts, ResourceSpec, Stack};
use std::error::Error;

use super::terminal::format_field;

/// Represents a row of subnet data for output.
#[derive(Debug)]
pub struct SubnetPrintRow {
    /// Row index, starting at 1.
    pub j: usize,
    pub tier: String,
    pub subnet_cidr: String,
    /// Usable hosts after the 5 AWS reserved addresses.
    pub aws_hosts: u64,
    pub broadcast: String,
    pub subnet_name: String,
    pub availability_zone: String,
    pub vpc_cidr: String,
    pub stack: String,
}

/// Build one row per declared subnet, in declaration order.
pub fn subnet_rows(stack: &Stack) -> Result<Vec<SubnetPrintRow>, Box<dyn Error>> {
    let mut rows = Vec::new();
    for (i, subnet) in stack.subnets().iter().enumerate() {
        let vpc_cidr = stack
            .resource(subnet.vpc)
            .and_then(|r| match &r.spec {
                ResourceSpec::Vpc { cidr_block, .. } => Some(cidr_block.to_string()),
                _ => None,
            })
            .unwrap_or_else(|| "None".to_string());
        rows.push(SubnetPrintRow {
            j: i + 1,
            tier: subnet.tier.to_string(),
            subnet_cidr: subnet.cidr.to_string(),
            aws_hosts: num_aws_hosts(subnet.cidr.mask)?,
            broadcast: subnet.cidr.broadcast()?.addr.to_string(),
            subnet_name: subnet.name.to_string(),
            availability_zone: subnet.availability_zone.to_string(),
            vpc_cidr,
            stack: stack.name.clone(),
        });
    }
    Ok(rows)
}

/// Print the subnet layout of `stack` as CSV to stdout.
pub fn subnet_print(stack: &Stack) -> Result<(), Box<dyn Error>> {
    log::info!("#Start subnet_print() for {}", stack.name);
    let rows = subnet_rows(stack)?;
    log::info!("# Got subnet count = {}", rows.len());

    println!(
        r#" "cnt",    "tier",     "subnet_cidr",       "hosts",          "broadcast",              "subnet_name",  "availability_zone",           "vpc_cidr",              "stack""#
    );
    for row in rows {
        println!("{}", csv_row(&row));
    }
    Ok(())
}

/// Format a single CSV row.
fn csv_row(row: &SubnetPrintRow) -> String {
    format!(
        r#"{j},{tier},{subnet_cidr},{hosts},{broadcast},{subnet_name},{availability_zone},{vpc_cidr},{stack}"#,
        j = format_field(row.j, 6),
        tier = format_field(&row.tier, 9),
        subnet_cidr = format_field(&row.subnet_cidr, 18),
        hosts = format_field(format!("{}_hosts", row.aws_hosts), 12),
        broadcast = format_field(format!("{}_br", row.broadcast), 19),
        subnet_name = format_field(&row.subnet_name, 24),
        availability_zone = format_field(&row.availability_zone, 20),
        vpc_cidr = format_field(format!("{}_vpc", row.vpc_cidr), 24),
        stack = format_field(&row.stack, 20),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builders::tests::{test_config, test_zones};
    use crate::builders::build_spoke_stack;

    #[test]
    fn test_subnet_rows() {
        let stack = build_spoke_stack(&test_config(), &test_zones()).unwrap();
        let rows = subnet_rows(&stack).unwrap();
        assert_eq!(rows.len(), 9);
        assert_eq!(rows[0].j, 1);
        assert_eq!(rows[0].tier, "public");
        assert_eq!(rows[4].subnet_cidr, "10.1.4.0/24");
        assert_eq!(rows[4].broadcast, "10.1.4.255");
        assert_eq!(rows[4].aws_hosts, 251);
        assert_eq!(rows[8].vpc_cidr, "10.1.0.0/16");
        assert_eq!(rows[8].availability_zone, "eu-west-1c");
    }

    #[test]
    fn test_csv_row() {
        let stack = build_spoke_stack(&test_config(), &test_zones()).unwrap();
        let rows = subnet_rows(&stack).unwrap();
        let line = csv_row(&rows[0]);
        assert!(line.starts_with(r#"   "1", "public","#), "{line}");
        assert!(line.contains(r#""10.1.0.255_br""#));
        assert!(line.ends_with(r#""spoke-demo""#));
    }
}
