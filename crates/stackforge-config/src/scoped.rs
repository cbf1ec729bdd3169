//! The scoped configuration shared by every resource builder.
//!
//! Scope, local id and environment context are one capability embedded by
//! composition in each concrete configuration, not inherited from a base
//! builder class. Concrete builders hold a `ScopedConfigBuilder` and
//! delegate `scope`/`id`/`env` to it.

use serde::{Deserialize, Serialize};
use stackforge_core::{EnvContext, Result, ScopePath};

use crate::MissingFields;

/// Scope, identity and environment of one resource configuration.
/// Immutable once built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScopedConfig {
    /// Full path of the resource, local id included.
    pub scope: ScopePath,
    pub env: EnvContext,
}

impl ScopedConfig {
    pub fn builder() -> ScopedConfigBuilder {
        ScopedConfigBuilder::default()
    }

    /// The resource's local id within its parent.
    pub fn local_id(&self) -> &str {
        self.scope.local_id()
    }
}

/// Builder for [`ScopedConfig`]. All three fields are required.
#[derive(Debug, Default)]
pub struct ScopedConfigBuilder {
    scope: Option<ScopePath>,
    id: Option<String>,
    env: Option<EnvContext>,
}

impl ScopedConfigBuilder {
    /// The parent scope this resource is created under.
    pub fn scope(mut self, scope: ScopePath) -> Self {
        self.scope = Some(scope);
        self
    }

    /// The resource's local id; must be unique within the parent scope.
    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn env(mut self, env: EnvContext) -> Self {
        self.env = Some(env);
        self
    }

    pub fn build(self) -> Result<ScopedConfig> {
        let mut missing = MissingFields::new();
        let label = self
            .scope
            .as_ref()
            .map(|s| s.to_string())
            .unwrap_or_else(|| "<unscoped>".to_string());

        let scope = missing.take_or("scope", self.scope, || {
            // Placeholder never escapes: check() fails whenever it is used.
            ScopePath::root("unscoped").unwrap_or_else(|_| unreachable!())
        });
        let id = missing.take_str("id", self.id);
        let env = missing.take("env", self.env);
        missing.check(label)?;

        Ok(ScopedConfig {
            scope: scope.child(&id)?,
            env,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stackforge_core::Error;

    fn env() -> EnvContext {
        EnvContext::new("123456789012", "eu-west-1")
    }

    #[test]
    fn test_build_complete() {
        let scope = ScopePath::root("app").unwrap();
        let scoped = ScopedConfig::builder()
            .scope(scope)
            .id("network")
            .env(env())
            .build()
            .unwrap();
        assert_eq!(scoped.scope.to_string(), "app/network");
        assert_eq!(scoped.local_id(), "network");
    }

    #[test]
    fn test_missing_fields_all_named() {
        let err = ScopedConfig::builder().build().unwrap_err();
        match err {
            Error::ConfigurationIncomplete { fields, .. } => {
                assert_eq!(
                    fields,
                    vec!["scope".to_string(), "id".to_string(), "env".to_string()]
                );
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_invalid_id_rejected() {
        let scope = ScopePath::root("app").unwrap();
        let err = ScopedConfig::builder()
            .scope(scope)
            .id("Not Valid")
            .env(env())
            .build()
            .unwrap_err();
        assert!(matches!(err, Error::InvalidValue { .. }));
    }
}
