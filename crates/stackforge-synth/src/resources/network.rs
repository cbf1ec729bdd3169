//! The shared network unit.

use serde::{Deserialize, Serialize};
use serde_json::json;
use stackforge_config::{MissingFields, ScopedConfig, ScopedConfigBuilder};
use stackforge_core::stack::{ResourceKind, ResourceRecord};
use stackforge_core::{EnvContext, Error, Result, ScopePath};

const DEFAULT_CIDR: &str = "10.12.0.0/16";
const DEFAULT_MAX_AZS: u8 = 2;

/// Lookup key a consumer uses to reference an externally existing network
/// by name.
pub fn network_lookup_key(network_name: &str) -> String {
    format!("network:{network_name}")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubnetKind {
    Public,
    Private,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubnetSpec {
    pub name: String,
    pub cidr_mask: u8,
    pub kind: SubnetKind,
}

/// A network with one private and one public subnet group, redundant
/// across availability zones.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Network {
    scoped: ScopedConfig,
    network_name: String,
    cidr: String,
    max_azs: u8,
    subnets: Vec<SubnetSpec>,
}

impl Network {
    pub fn builder() -> NetworkBuilder {
        NetworkBuilder::default()
    }

    pub fn network_name(&self) -> &str {
        &self.network_name
    }

    /// The key lookup references to this network resolve against.
    pub fn lookup_key(&self) -> String {
        network_lookup_key(&self.network_name)
    }

    pub fn render(&self) -> Result<ResourceRecord> {
        let mut children = Vec::new();
        for subnet in &self.subnets {
            children.push(ResourceRecord::new(
                self.scoped.scope.child(&subnet.name)?,
                ResourceKind::Subnet,
                json!({
                    "cidr_mask": subnet.cidr_mask,
                    "kind": subnet.kind,
                }),
            ));
        }
        Ok(ResourceRecord::new(
            self.scoped.scope.clone(),
            ResourceKind::Network,
            json!({
                "name_tag": self.network_name,
                "cidr": self.cidr,
                "max_availability_zones": self.max_azs,
            }),
        )
        .with_children(children))
    }
}

/// Builder for [`Network`]. Required: scope, id, env, `network_name`.
/// CIDR, zone count and the subnet pair carry defaults.
#[derive(Debug, Default)]
pub struct NetworkBuilder {
    scoped: ScopedConfigBuilder,
    network_name: Option<String>,
    cidr: Option<String>,
    max_azs: Option<u8>,
    subnets: Vec<SubnetSpec>,
}

impl NetworkBuilder {
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

    pub fn network_name(mut self, name: impl Into<String>) -> Self {
        self.network_name = Some(name.into());
        self
    }

    pub fn cidr(mut self, cidr: impl Into<String>) -> Self {
        self.cidr = Some(cidr.into());
        self
    }

    pub fn max_azs(mut self, max_azs: u8) -> Self {
        self.max_azs = Some(max_azs);
        self
    }

    /// Add a subnet group, replacing the default private/public pair.
    pub fn subnet(mut self, name: impl Into<String>, cidr_mask: u8, kind: SubnetKind) -> Self {
        self.subnets.push(SubnetSpec {
            name: name.into(),
            cidr_mask,
            kind,
        });
        self
    }

    pub fn build(self) -> Result<Network> {
        let scoped = self.scoped.build()?;

        let mut missing = MissingFields::new();
        let network_name = missing.take_str("network_name", self.network_name);
        missing.check(scoped.scope.to_string())?;

        let subnets = if self.subnets.is_empty() {
            vec![
                SubnetSpec {
                    name: "private-subnet".to_string(),
                    cidr_mask: 19,
                    kind: SubnetKind::Private,
                },
                SubnetSpec {
                    name: "public-subnet".to_string(),
                    cidr_mask: 20,
                    kind: SubnetKind::Public,
                },
            ]
        } else {
            self.subnets
        };

        let mut seen = std::collections::BTreeSet::new();
        for subnet in &subnets {
            if !seen.insert(subnet.name.as_str()) {
                return Err(Error::NamingCollision {
                    scope: scoped.scope.to_string(),
                    name: subnet.name.clone(),
                });
            }
        }

        Ok(Network {
            scoped,
            network_name,
            cidr: self.cidr.unwrap_or_else(|| DEFAULT_CIDR.to_string()),
            max_azs: self.max_azs.unwrap_or(DEFAULT_MAX_AZS),
            subnets,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn builder() -> NetworkBuilder {
        Network::builder()
            .scope(ScopePath::root("app").unwrap())
            .id("network")
            .env(EnvContext::new("123456789012", "eu-west-1"))
    }

    #[test]
    fn test_defaults() {
        let network = builder().network_name("shared-vpc").build().unwrap();
        assert_eq!(network.network_name(), "shared-vpc");
        assert_eq!(network.lookup_key(), "network:shared-vpc");
        assert_eq!(network.cidr, "10.12.0.0/16");
        assert_eq!(network.max_azs, 2);
        assert_eq!(network.subnets.len(), 2);
        assert_eq!(network.subnets[0].cidr_mask, 19);
        assert_eq!(network.subnets[1].kind, SubnetKind::Public);
    }

    #[test]
    fn test_missing_network_name() {
        let err = builder().build().unwrap_err();
        match err {
            Error::ConfigurationIncomplete { fields, .. } => {
                assert_eq!(fields, vec!["network_name".to_string()]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_duplicate_subnet_name() {
        let err = builder()
            .network_name("shared-vpc")
            .subnet("data", 19, SubnetKind::Private)
            .subnet("data", 20, SubnetKind::Public)
            .build()
            .unwrap_err();
        assert!(matches!(err, Error::NamingCollision { .. }));
    }

    #[test]
    fn test_render_tree() {
        let network = builder().network_name("shared-vpc").build().unwrap();
        let record = network.render().unwrap();
        assert_eq!(record.kind, ResourceKind::Network);
        assert_eq!(record.children.len(), 2);
        assert_eq!(record.children[0].scope.to_string(), "app/network/private-subnet");
    }
}
