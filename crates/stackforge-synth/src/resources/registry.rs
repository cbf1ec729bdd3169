//! Namespaced image repositories with retention lifecycle.

use serde::{Deserialize, Serialize};
use serde_json::json;
use stackforge_config::{MissingFields, ScopedConfig, ScopedConfigBuilder};
use stackforge_core::stack::{ResourceKind, ResourceRecord};
use stackforge_core::{EnvContext, Error, Result, ScopePath};

const DEFAULT_KEEP_IMAGES: u32 = 5;

/// Retention policy applied to every repository in a registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LifecycleRule {
    /// Newest images kept; anything older is expired.
    pub keep_last: u32,
}

impl LifecycleRule {
    pub fn keep_last(count: u32) -> Self {
        Self { keep_last: count }
    }
}

impl Default for LifecycleRule {
    fn default() -> Self {
        Self::keep_last(DEFAULT_KEEP_IMAGES)
    }
}

/// A set of image repositories under one project namespace.
///
/// Repository names are `{namespace}/{repo}`, so unrelated projects in the
/// same account never collide. The deployment account is granted pull and
/// push on every repository.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageRegistry {
    scoped: ScopedConfig,
    namespace: String,
    repositories: Vec<String>,
    lifecycle: LifecycleRule,
}

impl ImageRegistry {
    pub fn builder() -> ImageRegistryBuilder {
        ImageRegistryBuilder::default()
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn repositories(&self) -> &[String] {
        &self.repositories
    }

    /// Full repository name for a short repo name.
    pub fn repository_name(&self, repo: &str) -> String {
        format!("{}/{repo}", self.namespace)
    }

    /// Addressable image URI for a repository in this registry.
    pub fn repository_uri(&self, repo: &str) -> String {
        format!(
            "registry://{}/{}/{}/{repo}",
            self.scoped.env.region, self.scoped.env.account, self.namespace
        )
    }

    pub fn render(&self) -> Result<ResourceRecord> {
        let mut children = Vec::new();
        for repo in &self.repositories {
            children.push(ResourceRecord::new(
                self.scoped.scope.child(repo)?,
                ResourceKind::Repository,
                json!({
                    "repository_name": self.repository_name(repo),
                    "lifecycle": self.lifecycle,
                    "grants": [{
                        "account": self.scoped.env.account,
                        "actions": ["pull", "push"],
                    }],
                }),
            ));
        }
        Ok(ResourceRecord::new(
            self.scoped.scope.clone(),
            ResourceKind::Registry,
            json!({ "namespace": self.namespace }),
        )
        .with_children(children))
    }
}

/// Builder for [`ImageRegistry`]. Required: scope, id, env, `namespace`
/// and at least one repository.
#[derive(Debug, Default)]
pub struct ImageRegistryBuilder {
    scoped: ScopedConfigBuilder,
    namespace: Option<String>,
    repositories: Vec<String>,
    lifecycle: Option<LifecycleRule>,
}

impl ImageRegistryBuilder {
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

    pub fn namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    pub fn repository(mut self, repo: impl Into<String>) -> Self {
        self.repositories.push(repo.into());
        self
    }

    pub fn lifecycle(mut self, lifecycle: LifecycleRule) -> Self {
        self.lifecycle = Some(lifecycle);
        self
    }

    pub fn build(self) -> Result<ImageRegistry> {
        let scoped = self.scoped.build()?;

        let mut missing = MissingFields::new();
        let namespace = missing.take_str("namespace", self.namespace);
        if self.repositories.is_empty() {
            missing.push("repositories");
        }
        missing.check(scoped.scope.to_string())?;

        let mut seen = std::collections::BTreeSet::new();
        for repo in &self.repositories {
            if !seen.insert(repo.as_str()) {
                return Err(Error::NamingCollision {
                    scope: scoped.scope.to_string(),
                    name: repo.clone(),
                });
            }
        }

        Ok(ImageRegistry {
            scoped,
            namespace,
            repositories: self.repositories,
            lifecycle: self.lifecycle.unwrap_or_default(),
        })
    }
}
