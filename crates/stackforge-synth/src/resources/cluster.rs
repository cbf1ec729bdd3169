//! The service cluster and its private discovery namespace.

use serde::{Deserialize, Serialize};
use serde_json::json;
use stackforge_config::{MissingFields, ScopedConfig, ScopedConfigBuilder};
use stackforge_core::stack::{ResourceKind, ResourceRecord};
use stackforge_core::{EnvContext, Error, Result, ScopePath};

use super::service::ServiceSpec;
use crate::resolver::OutputRegistry;

/// The derived-output key a service's discovery hostname is recorded
/// under.
pub fn discovery_key(discovery_name: &str) -> String {
    format!("discovery:{discovery_name}")
}

/// A cluster of services sharing one private discovery namespace.
///
/// Services register through [`ServiceCluster::register`], which enforces
/// name uniqueness and records each discovery hostname as a derived output
/// for sibling services to resolve.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceCluster {
    scoped: ScopedConfig,
    cluster_name: String,
    discovery_domain: String,
    services: Vec<ServiceSpec>,
}

impl ServiceCluster {
    pub fn builder() -> ServiceClusterBuilder {
        ServiceClusterBuilder::default()
    }

    pub fn cluster_name(&self) -> &str {
        &self.cluster_name
    }

    pub fn scope(&self) -> &ScopePath {
        &self.scoped.scope
    }

    pub fn services(&self) -> &[ServiceSpec] {
        &self.services
    }

    /// The hostname a discovery name resolves to inside this cluster.
    pub fn discovery_hostname(&self, discovery_name: &str) -> String {
        format!("{discovery_name}.{}", self.discovery_domain)
    }

    /// Add a service to the cluster, recording its discovery hostname (if
    /// it registers one) as a derived output.
    pub fn register(&mut self, service: ServiceSpec, outputs: &mut OutputRegistry) -> Result<()> {
        if self
            .services
            .iter()
            .any(|s| s.service_name() == service.service_name())
        {
            return Err(Error::NamingCollision {
                scope: self.scoped.scope.to_string(),
                name: service.service_name().to_string(),
            });
        }
        if let Some(name) = service.discovery_name() {
            outputs.record(discovery_key(name), self.discovery_hostname(name))?;
            tracing::debug!(
                cluster = %self.cluster_name,
                service = %service.service_name(),
                discovery = %self.discovery_hostname(name),
                "registered service with discovery name"
            );
        } else {
            tracing::debug!(
                cluster = %self.cluster_name,
                service = %service.service_name(),
                "registered service"
            );
        }
        self.services.push(service);
        Ok(())
    }

    pub fn render(&self) -> Result<ResourceRecord> {
        let mut children = Vec::new();
        for service in &self.services {
            children.push(service.render()?);
        }
        Ok(ResourceRecord::new(
            self.scoped.scope.clone(),
            ResourceKind::Cluster,
            json!({
                "cluster_name": self.cluster_name,
                "discovery_domain": self.discovery_domain,
            }),
        )
        .with_children(children))
    }
}

/// Builder for [`ServiceCluster`]. Required: scope, id, env,
/// `cluster_name` and `discovery_domain`.
#[derive(Debug, Default)]
pub struct ServiceClusterBuilder {
    scoped: ScopedConfigBuilder,
    cluster_name: Option<String>,
    discovery_domain: Option<String>,
}

impl ServiceClusterBuilder {
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

    pub fn cluster_name(mut self, name: impl Into<String>) -> Self {
        self.cluster_name = Some(name.into());
        self
    }

    pub fn discovery_domain(mut self, domain: impl Into<String>) -> Self {
        self.discovery_domain = Some(domain.into());
        self
    }

    pub fn build(self) -> Result<ServiceCluster> {
        let scoped = self.scoped.build()?;

        let mut missing = MissingFields::new();
        let cluster_name = missing.take_str("cluster_name", self.cluster_name);
        let discovery_domain = missing.take_str("discovery_domain", self.discovery_domain);
        missing.check(scoped.scope.to_string())?;

        Ok(ServiceCluster {
            scoped,
            cluster_name,
            discovery_domain,
            services: Vec::new(),
        })
    }
}
