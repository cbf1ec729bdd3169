//! Execution and runtime identity bindings.

use serde::{Deserialize, Serialize};
use serde_json::json;
use stackforge_core::stack::{ResourceKind, ResourceRecord};
use stackforge_core::{Result, ScopePath};

/// A named role assumed by the platform on behalf of a workload.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleBinding {
    pub name: String,
    pub assumed_by: String,
    pub managed_policies: Vec<String>,
}

/// The identity pair every service in a cluster runs with.
///
/// Constructed once per cluster stack and handed by reference to every
/// service, so sibling services share the same roles instead of minting
/// their own.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityBindings {
    /// Identity the platform uses to start the workload (pull images,
    /// write logs).
    pub execution: RoleBinding,
    /// Identity the running workload itself holds.
    pub runtime: RoleBinding,
}

impl IdentityBindings {
    /// The standard role pair for a cluster namespace.
    pub fn for_namespace(namespace: &str) -> Self {
        Self {
            execution: RoleBinding {
                name: format!("{namespace}-execution-role"),
                assumed_by: "service-tasks".to_string(),
                managed_policies: vec!["service-role/task-execution".to_string()],
            },
            runtime: RoleBinding {
                name: format!("{namespace}-task-role"),
                assumed_by: "service-tasks".to_string(),
                managed_policies: Vec::new(),
            },
        }
    }

    pub fn render(&self, parent: &ScopePath) -> Result<ResourceRecord> {
        Ok(ResourceRecord::new(
            parent.child("identity")?,
            ResourceKind::IdentityBindings,
            json!({
                "execution": self.execution,
                "runtime": self.runtime,
            }),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_names_follow_namespace() {
        let identity = IdentityBindings::for_namespace("loadtest");
        assert_eq!(identity.execution.name, "loadtest-execution-role");
        assert_eq!(identity.runtime.name, "loadtest-task-role");
        assert!(identity.runtime.managed_policies.is_empty());
    }

    #[test]
    fn test_render_scope() {
        let parent = ScopePath::root("app").unwrap().child("cluster").unwrap();
        let record = IdentityBindings::for_namespace("loadtest")
            .render(&parent)
            .unwrap();
        assert_eq!(record.scope.to_string(), "app/cluster/identity");
        assert_eq!(record.kind, ResourceKind::IdentityBindings);
    }
}
