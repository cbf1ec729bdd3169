//! Lookup and derived references between resources.

use serde::{Deserialize, Serialize};

/// A symbolic value produced by one resource and consumed by another.
///
/// A `Lookup` names a resource that already exists outside the current
/// synthesis pass and is resolved by the deployment system, independent of
/// build order. A `Derived` value is computed from a sibling's attributes
/// during the same pass and must be recorded by its producer before any
/// consumer resolves it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "ref", content = "name")]
pub enum Reference {
    Lookup(String),
    Derived(String),
}

impl Reference {
    /// The referenced name, regardless of reference kind.
    pub fn name(&self) -> &str {
        match self {
            Reference::Lookup(name) | Reference::Derived(name) => name,
        }
    }
}

impl std::fmt::Display for Reference {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Reference::Lookup(name) => write!(f, "lookup:{}", name),
            Reference::Derived(name) => write!(f, "derived:{}", name),
        }
    }
}
