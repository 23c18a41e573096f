//! Stack documents written for the provisioning engine.

use crate::models::Stack;
use std::error::Error;
use std::path::{Path, PathBuf};

/// Pretty JSON of the whole stack.
pub fn stack_to_json(stack: &Stack) -> Result<String, Box<dyn Error>> {
    let json = serde_json::to_string_pretty(stack)
        .map_err(|e| format!("Error serializing stack {}: {e}", stack.name))?;
    Ok(json)
}

/// Write `<out_dir>/<stack>.json`, creating `out_dir` if needed.
pub fn write_stack(stack: &Stack, out_dir: &Path) -> Result<PathBuf, Box<dyn Error>> {
    std::fs::create_dir_all(out_dir)
        .map_err(|e| format!("Error creating output dir {}: {e}", out_dir.display()))?;
    let path = out_dir.join(format!("{}.json", stack.name));
    std::fs::write(&path, stack_to_json(stack)?)
        .map_err(|e| format!("Error writing {}: {e}", path.display()))?;
    log::info!(
        "Wrote {} resources to {}",
        stack.resources.len(),
        path.display()
    );
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builders::tests::{test_config, test_zones};
    use crate::builders::build_hub_stack;

    #[test]
    fn test_write_stack() {
        let dir = tempfile::tempdir().unwrap();
        let out_dir = dir.path().join("out");
        let stack = build_hub_stack(&test_config(), &test_zones()).unwrap();

        let path = write_stack(&stack, &out_dir).unwrap();
        assert_eq!(path, out_dir.join("networkhub-demo.json"));

        let value: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(value["unit"], "hub");
        assert_eq!(value["outputs"]["vpc_id"], "${networkhub-demo.id}");
        assert_eq!(
            value["resources"].as_array().unwrap().len(),
            stack.resources.len()
        );
        assert_eq!(value["availability_zones"][2], "eu-west-1c");
    }

    #[test]
    fn test_stack_round_trip() {
        let stack = build_hub_stack(&test_config(), &test_zones()).unwrap();
        let back: Stack = serde_json::from_str(&stack_to_json(&stack).unwrap()).unwrap();
        assert_eq!(back.resources, stack.resources);
        assert_eq!(back.lookups, stack.lookups);
    }
}
