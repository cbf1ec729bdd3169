//! Stack and resource record types.

use serde::{Deserialize, Serialize};

use crate::{EnvContext, ScopePath};

/// Kind discriminator for synthesized resource records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    Network,
    Subnet,
    Registry,
    Repository,
    Cluster,
    Service,
    TaskSpec,
    Container,
    FirewallRules,
    IdentityBindings,
    Pipeline,
}

impl std::fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ResourceKind::Network => "network",
            ResourceKind::Subnet => "subnet",
            ResourceKind::Registry => "registry",
            ResourceKind::Repository => "repository",
            ResourceKind::Cluster => "cluster",
            ResourceKind::Service => "service",
            ResourceKind::TaskSpec => "task_spec",
            ResourceKind::Container => "container",
            ResourceKind::FirewallRules => "firewall_rules",
            ResourceKind::IdentityBindings => "identity_bindings",
            ResourceKind::Pipeline => "pipeline",
        };
        write!(f, "{}", s)
    }
}

/// A single synthesized resource inside a stack template.
///
/// Records form a tree mirroring the exclusive-ownership tree of the
/// resource units they were rendered from. Attributes are opaque structured
/// data as far as the deployment system is concerned.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceRecord {
    pub scope: ScopePath,
    pub kind: ResourceKind,
    pub attributes: serde_json::Value,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<ResourceRecord>,
}

impl ResourceRecord {
    pub fn new(scope: ScopePath, kind: ResourceKind, attributes: serde_json::Value) -> Self {
        Self {
            scope,
            kind,
            attributes,
            children: Vec::new(),
        }
    }

    pub fn with_children(mut self, children: Vec<ResourceRecord>) -> Self {
        self.children = children;
        self
    }
}

/// An independently deployable named group of resources plus its
/// environment context.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stack {
    pub name: String,
    pub env: EnvContext,
    /// Names of stacks this stack must deploy after.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub depends_on: Vec<String>,
    pub resources: Vec<ResourceRecord>,
}

impl Stack {
    pub fn new(name: impl Into<String>, env: EnvContext) -> Self {
        Self {
            name: name.into(),
            env,
            depends_on: Vec::new(),
            resources: Vec::new(),
        }
    }

    pub fn depends_on(mut self, stack_name: impl Into<String>) -> Self {
        self.depends_on.push(stack_name.into());
        self
    }

    pub fn with_resources(mut self, resources: Vec<ResourceRecord>) -> Self {
        self.resources = resources;
        self
    }

    /// The template path the deployment pipeline addresses this stack by.
    pub fn template_path(&self) -> String {
        format!("{}.template.json", self.name)
    }

    /// Render this stack as a structured template for the external
    /// deployment system.
    pub fn template(&self) -> StackTemplate {
        StackTemplate {
            stack_name: self.name.clone(),
            path: self.template_path(),
            body: serde_json::json!({
                "stack": self.name,
                "env": self.env,
                "resources": self.resources,
            }),
        }
    }
}

/// The synthesized output for one stack: its identity in the build artifact
/// plus the structured template body.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StackTemplate {
    pub stack_name: String,
    pub path: String,
    pub body: serde_json::Value,
}
