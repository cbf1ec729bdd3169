//! Two-pass reference resolution.
//!
//! Pass one walks the stack graph recording every derived output (e.g. the
//! discovery hostname a service registers) and declaring every lookup key
//! that names a pre-existing external resource. Pass two resolves
//! references against the filled registry, so consumers never depend on
//! construction order.

use std::collections::{BTreeMap, BTreeSet};

use stackforge_core::{Error, Reference, Result};

/// Registry of resolvable names.
///
/// Derived outputs carry a value produced during synthesis; lookups only
/// assert that an externally managed resource is addressable by key.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct OutputRegistry {
    derived: BTreeMap<String, String>,
    lookups: BTreeSet<String>,
}

impl OutputRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a derived output. Recording the same name twice is a naming
    /// collision.
    pub fn record(&mut self, name: impl Into<String>, value: impl Into<String>) -> Result<()> {
        let name = name.into();
        if self.derived.contains_key(&name) {
            return Err(Error::NamingCollision {
                scope: "outputs".to_string(),
                name,
            });
        }
        self.derived.insert(name, value.into());
        Ok(())
    }

    /// Declare a lookup key for a resource that exists outside the graph.
    pub fn declare_lookup(&mut self, key: impl Into<String>) {
        self.lookups.insert(key.into());
    }

    /// Resolve a reference, failing with `UnresolvedReference` when its
    /// name was never recorded or declared.
    pub fn resolve(&self, reference: &Reference) -> Result<String> {
        match reference {
            Reference::Derived(name) => self
                .derived
                .get(name)
                .cloned()
                .ok_or_else(|| Error::UnresolvedReference(reference.to_string())),
            Reference::Lookup(key) => {
                if self.lookups.contains(key) {
                    Ok(key.clone())
                } else {
                    Err(Error::UnresolvedReference(reference.to_string()))
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_derived_resolves_to_recorded_value() {
        let mut registry = OutputRegistry::new();
        registry
            .record("discovery:dashboard", "dashboard.loadtest-monitoring.internal")
            .unwrap();
        let resolved = registry
            .resolve(&Reference::Derived("discovery:dashboard".to_string()))
            .unwrap();
        assert_eq!(resolved, "dashboard.loadtest-monitoring.internal");
    }

    #[test]
    fn test_duplicate_record_is_collision() {
        let mut registry = OutputRegistry::new();
        registry.record("discovery:dashboard", "a").unwrap();
        let err = registry.record("discovery:dashboard", "b").unwrap_err();
        assert!(matches!(err, Error::NamingCollision { .. }));
    }

    #[test]
    fn test_unrecorded_reference_is_unresolved() {
        let registry = OutputRegistry::new();
        let err = registry
            .resolve(&Reference::Derived("discovery:dashboard".to_string()))
            .unwrap_err();
        assert!(matches!(err, Error::UnresolvedReference(_)));
        assert!(err.to_string().contains("derived:discovery:dashboard"));
    }

    #[test]
    fn test_lookup_requires_declaration() {
        let mut registry = OutputRegistry::new();
        let reference = Reference::Lookup("network:shared-vpc".to_string());
        assert!(registry.resolve(&reference).is_err());
        registry.declare_lookup("network:shared-vpc");
        assert_eq!(registry.resolve(&reference).unwrap(), "network:shared-vpc");
    }
}
