//! Ingress rule sets.

use serde::{Deserialize, Serialize};
use serde_json::json;
use stackforge_core::stack::{ResourceKind, ResourceRecord};
use stackforge_core::{Error, Result, ScopePath};

/// Where traffic on an opened port may come from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PeerSource {
    AnyIpv4,
    Cidr(String),
}

/// One opened port.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngressRule {
    pub port: u16,
    pub source: PeerSource,
    pub description: String,
}

/// The access-control rule set of one service.
///
/// Default is deny: a fresh rule set admits no traffic until ports are
/// explicitly opened. Opening the same port twice within one rule set is a
/// naming collision.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FirewallRules {
    scope: ScopePath,
    description: String,
    rules: Vec<IngressRule>,
}

impl FirewallRules {
    pub fn new(scope: ScopePath, description: impl Into<String>) -> Self {
        Self {
            scope,
            description: description.into(),
            rules: Vec::new(),
        }
    }

    pub fn open_port(
        &mut self,
        port: u16,
        source: PeerSource,
        description: impl Into<String>,
    ) -> Result<()> {
        if self.rules.iter().any(|r| r.port == port) {
            return Err(Error::NamingCollision {
                scope: self.scope.to_string(),
                name: format!("port {port}"),
            });
        }
        self.rules.push(IngressRule {
            port,
            source,
            description: description.into(),
        });
        Ok(())
    }

    pub fn rules(&self) -> &[IngressRule] {
        &self.rules
    }

    /// True when no port has been opened.
    pub fn is_closed(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn render(&self) -> ResourceRecord {
        ResourceRecord::new(
            self.scope.clone(),
            ResourceKind::FirewallRules,
            json!({
                "description": self.description,
                "ingress": self.rules,
            }),
        )
    }
}
