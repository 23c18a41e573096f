//! References between nodes of a stack.

use regex::Regex;
use serde::de;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::sync::OnceLock;

/// Matches `${node.attribute}` anywhere in a string.
static REFERENCE_REGEX: OnceLock<Regex> = OnceLock::new();

fn get_reference_regex() -> &'static Regex {
    REFERENCE_REGEX.get_or_init(|| Regex::new(r"\$\{([^.}]+)\.([^}]+)\}").expect("Invalid Regex"))
}

/// An attribute of another node in the same stack, resolved by the engine at apply time.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Reference {
    /// Logical name of the referenced node.
    pub node: String,
    /// Attribute path on that node (e.g. `id`, `arn`, `dns_entries[0].dns_name`).
    pub attr: String,
}

impl Reference {
    pub fn new(node: &str, attr: &str) -> Reference {
        Reference {
            node: node.to_string(),
            attr: attr.to_string(),
        }
    }

    /// Shorthand for the `id` attribute.
    pub fn id(node: &str) -> Reference {
        Reference::new(node, "id")
    }

    /// Shorthand for the `arn` attribute.
    pub fn arn(node: &str) -> Reference {
        Reference::new(node, "arn")
    }
}

/// Find every reference embedded in `text`.
pub fn scan_references(text: &str) -> Vec<Reference> {
    get_reference_regex()
        .captures_iter(text)
        .map(|c| Reference::new(&c[1], &c[2]))
        .collect()
}

impl fmt::Display for Reference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "${{{}.{}}}", self.node, self.attr)
    }
}

impl Serialize for Reference {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::ser::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Reference {
    fn deserialize<D>(deserializer: D) -> Result<Reference, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        let mut found = scan_references(&s);
        if found.len() != 1 || found[0].to_string() != s {
            return Err(de::Error::custom(format!("invalid reference: {}", s)));
        }
        Ok(found.remove(0))
    }
}
