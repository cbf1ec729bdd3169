//! Long-running container services.

use serde::{Deserialize, Serialize};
use serde_json::json;
use stackforge_config::{MissingFields, ScopedConfig, ScopedConfigBuilder};
use stackforge_core::stack::{ResourceKind, ResourceRecord};
use stackforge_core::{EnvContext, Error, Reference, Result, ScopePath};

use super::container::ContainerSpec;
use super::firewall::{FirewallRules, PeerSource};
use super::identity::IdentityBindings;

/// CPU and memory envelope of one task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuntimeSizing {
    pub cpu_units: u32,
    pub memory_mib: u32,
}

impl Default for RuntimeSizing {
    fn default() -> Self {
        Self {
            cpu_units: 256,
            memory_mib: 512,
        }
    }
}

/// Which subnet group a service's tasks run in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubnetPlacement {
    Private,
    Public { assign_public_ip: bool },
}

impl Default for SubnetPlacement {
    fn default() -> Self {
        SubnetPlacement::Private
    }
}

/// A long-running service: a sized task spec of one or more containers,
/// its own firewall rules and the cluster-shared identity pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceSpec {
    scoped: ScopedConfig,
    service_name: String,
    discovery_name: Option<String>,
    network: Reference,
    desired_count: u32,
    sizing: RuntimeSizing,
    placement: SubnetPlacement,
    containers: Vec<ContainerSpec>,
    firewall: FirewallRules,
    identity: IdentityBindings,
}

impl ServiceSpec {
    pub fn builder() -> ServiceBuilder {
        ServiceBuilder::default()
    }

    pub fn service_name(&self) -> &str {
        &self.service_name
    }

    /// Discovery name this service registers, if it registers one.
    pub fn discovery_name(&self) -> Option<&str> {
        self.discovery_name.as_deref()
    }

    pub fn containers(&self) -> &[ContainerSpec] {
        &self.containers
    }

    pub fn firewall(&self) -> &FirewallRules {
        &self.firewall
    }

    pub fn scope(&self) -> &ScopePath {
        &self.scoped.scope
    }

    pub fn render(&self) -> Result<ResourceRecord> {
        let task_scope = self.scoped.scope.child("task")?;
        let mut task_children = Vec::new();
        for container in &self.containers {
            task_children.push(container.render(&task_scope)?);
        }
        let task = ResourceRecord::new(
            task_scope,
            ResourceKind::TaskSpec,
            json!({ "sizing": self.sizing }),
        )
        .with_children(task_children);

        Ok(ResourceRecord::new(
            self.scoped.scope.clone(),
            ResourceKind::Service,
            json!({
                "service_name": self.service_name,
                "discovery_name": self.discovery_name,
                "network": self.network,
                "desired_count": self.desired_count,
                "placement": self.placement,
            }),
        )
        .with_children(vec![
            task,
            self.firewall.render(),
            self.identity.render(&self.scoped.scope)?,
        ]))
    }
}

/// Builder for [`ServiceSpec`]. Required: scope, id, env, `service_name`,
/// the network reference, the identity pair and at least one container.
#[derive(Debug, Default)]
pub struct ServiceBuilder {
    scoped: ScopedConfigBuilder,
    service_name: Option<String>,
    discovery_name: Option<String>,
    network: Option<Reference>,
    desired_count: Option<u32>,
    sizing: Option<RuntimeSizing>,
    placement: Option<SubnetPlacement>,
    containers: Vec<ContainerSpec>,
    identity: Option<IdentityBindings>,
    open_ports: Vec<(u16, PeerSource, String)>,
}

impl ServiceBuilder {
    pub fn scope(mut self, scope: ScopePath) -> Self {
        self.scoped = self.scoped.scope(scope);
        self
    }

    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.scoped = self.scoped.id(id);
        self
    }

    pub fn env(mut self, env: EnvContext) -> Self {
        self.scoped = self.scoped.env(env);
        self
    }

    pub fn service_name(mut self, name: impl Into<String>) -> Self {
        self.service_name = Some(name.into());
        self
    }

    /// Register this service under a discovery name; sibling services
    /// resolve it as `{name}.{domain}`.
    pub fn discovery_name(mut self, name: impl Into<String>) -> Self {
        self.discovery_name = Some(name.into());
        self
    }

    /// Reference to the network the service runs in.
    pub fn network(mut self, network: Reference) -> Self {
        self.network = Some(network);
        self
    }

    pub fn desired_count(mut self, count: u32) -> Self {
        self.desired_count = Some(count);
        self
    }

    pub fn sizing(mut self, sizing: RuntimeSizing) -> Self {
        self.sizing = Some(sizing);
        self
    }

    pub fn placement(mut self, placement: SubnetPlacement) -> Self {
        self.placement = Some(placement);
        self
    }

    pub fn container(mut self, container: ContainerSpec) -> Self {
        self.containers.push(container);
        self
    }

    pub fn identity(mut self, identity: IdentityBindings) -> Self {
        self.identity = Some(identity);
        self
    }

    /// Declare an ingress rule; applied to the service's firewall at
    /// build time.
    pub fn open_port(
        mut self,
        port: u16,
        source: PeerSource,
        description: impl Into<String>,
    ) -> Self {
        self.open_ports.push((port, source, description.into()));
        self
    }

    pub fn build(self) -> Result<ServiceSpec> {
        let scoped = self.scoped.build()?;

        let mut missing = MissingFields::new();
        let service_name = missing.take_str("service_name", self.service_name);
        let network = missing.take_or("network", self.network, || {
            Reference::Lookup(String::new())
        });
        let identity = missing.take("identity", self.identity);
        if self.containers.is_empty() {
            missing.push("containers");
        }
        missing.check(scoped.scope.to_string())?;

        let mut seen = std::collections::BTreeSet::new();
        for container in &self.containers {
            if !seen.insert(container.name()) {
                return Err(Error::NamingCollision {
                    scope: scoped.scope.to_string(),
                    name: container.name().to_string(),
                });
            }
        }

        let mut firewall = FirewallRules::new(
            scoped.scope.child("firewall")?,
            format!("ingress for service '{service_name}'"),
        );
        for (port, source, description) in self.open_ports {
            firewall.open_port(port, source, description)?;
        }

        Ok(ServiceSpec {
            scoped,
            service_name,
            discovery_name: self.discovery_name,
            network,
            desired_count: self.desired_count.unwrap_or(0),
            sizing: self.sizing.unwrap_or_default(),
            placement: self.placement.unwrap_or_default(),
            containers: self.containers,
            firewall,
            identity,
        })
    }
}
