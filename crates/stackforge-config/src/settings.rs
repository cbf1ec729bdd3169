//! Entry-point settings.
//!
//! All process-environment reads happen here, once, at startup. The
//! resulting `Settings` value is passed down explicitly to every stack and
//! resource constructor; nothing else in the workspace touches the
//! environment.

use serde::{Deserialize, Serialize};
use stackforge_core::{EnvContext, Error, Result};

/// Environment variable naming the deployment account.
pub const ENV_ACCOUNT: &str = "STACKFORGE_ACCOUNT";
/// Environment variable naming the deployment region.
pub const ENV_REGION: &str = "STACKFORGE_REGION";

/// Named inputs for one synthesis invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    /// Account/region identity every stack is synthesized against.
    pub env: EnvContext,
    /// Project namespace; prefixes stack names, repositories and log
    /// groups.
    pub namespace: String,
    /// Name of the shared network, used both as its tag and as the lookup
    /// name consumer stacks resolve.
    pub network_name: String,
    /// Name of the service cluster.
    pub cluster_name: String,
    /// Private DNS namespace services register discovery names under.
    pub discovery_domain: String,
    /// Service that drives load and reports to the monitoring service.
    pub runner_service_name: String,
    /// Service hosting the dashboard and metrics containers.
    pub monitoring_service_name: String,
    /// Discovery name the monitoring service registers.
    pub monitoring_discovery_name: String,
    /// Dashboard UI container name.
    pub dashboard_container_name: String,
    /// Timeseries database container name.
    pub metrics_container_name: String,
    /// Deployment pipeline name.
    pub pipeline_name: String,
    /// Versioned source of the stack-graph definition.
    pub source: SourceSettings,
    /// Image registry configuration; `None` when images come from local
    /// build assets only.
    pub registry: Option<RegistrySettings>,
}

/// Where the pipeline's source stage checks the stack-graph definition out
/// from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceSettings {
    pub owner: String,
    pub repo: String,
    pub branch: String,
}

/// Image registry inputs: repositories are created under the project
/// namespace.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegistrySettings {
    pub repositories: Vec<String>,
}

impl Settings {
    /// Build settings from the process environment. `STACKFORGE_ACCOUNT`
    /// and `STACKFORGE_REGION` are required; everything else falls back to
    /// the defaults of [`Settings::with_env`].
    pub fn from_env() -> Result<Self> {
        Self::from_env_with(None, None)
    }

    /// Like [`Settings::from_env`], but the account and region may be
    /// supplied by the caller (command-line flags) instead of their
    /// environment variables. The optional `STACKFORGE_*` overrides are
    /// still read either way.
    pub fn from_env_with(account: Option<String>, region: Option<String>) -> Result<Self> {
        let account = match account {
            Some(v) => v,
            None => require_env(ENV_ACCOUNT)?,
        };
        let region = match region {
            Some(v) => v,
            None => require_env(ENV_REGION)?,
        };
        let mut settings = Self::with_env(EnvContext::new(account, region));
        settings.apply_overrides(|name| std::env::var(name).ok().filter(|v| !v.is_empty()));
        Ok(settings)
    }

    /// Apply the optional override variables through the given lookup. A
    /// namespace override also renames the pipeline, which is derived from
    /// it.
    fn apply_overrides(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(namespace) = var("STACKFORGE_NAMESPACE") {
            self.pipeline_name = format!("{namespace}-cicd");
            self.namespace = namespace;
        }
        if let Some(network) = var("STACKFORGE_NETWORK") {
            self.network_name = network;
        }
        if let Some(cluster) = var("STACKFORGE_CLUSTER") {
            self.cluster_name = cluster;
        }
        if let Some(domain) = var("STACKFORGE_DISCOVERY_DOMAIN") {
            self.discovery_domain = domain;
        }
    }

    /// Default settings for the load-test monitoring deployment, with the
    /// environment identity supplied by the caller.
    pub fn with_env(env: EnvContext) -> Self {
        let namespace = "loadtest".to_string();
        Self {
            env,
            network_name: "shared-vpc".to_string(),
            cluster_name: "loadtest-monitoring".to_string(),
            discovery_domain: "loadtest-monitoring.internal".to_string(),
            runner_service_name: "loadtest-runner".to_string(),
            monitoring_service_name: "monitoring".to_string(),
            monitoring_discovery_name: "dashboard".to_string(),
            dashboard_container_name: "dashboard".to_string(),
            metrics_container_name: "metrics-db".to_string(),
            pipeline_name: format!("{namespace}-cicd"),
            source: SourceSettings {
                owner: "your-org".to_string(),
                repo: "loadtest-monitoring-infra".to_string(),
                branch: "main".to_string(),
            },
            registry: Some(RegistrySettings {
                repositories: vec![
                    "loadtest-runner".to_string(),
                    "dashboard".to_string(),
                    "metrics-db".to_string(),
                ],
            }),
            namespace,
        }
    }
}

fn require_env(name: &str) -> Result<String> {
    std::env::var(name)
        .ok()
        .filter(|v| !v.is_empty())
        .ok_or_else(|| Error::MissingEnvVar(name.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = Settings::with_env(EnvContext::new("123456789012", "eu-west-1"));
        assert_eq!(settings.namespace, "loadtest");
        assert_eq!(settings.network_name, "shared-vpc");
        assert_eq!(settings.pipeline_name, "loadtest-cicd");
        assert!(settings.registry.is_some());
    }

    #[test]
    fn test_overrides_replace_defaults() {
        let mut settings = Settings::with_env(EnvContext::new("123456789012", "eu-west-1"));
        settings.apply_overrides(|name| match name {
            "STACKFORGE_NAMESPACE" => Some("demo".to_string()),
            "STACKFORGE_NETWORK" => Some("other-vpc".to_string()),
            _ => None,
        });
        assert_eq!(settings.namespace, "demo");
        assert_eq!(settings.pipeline_name, "demo-cicd");
        assert_eq!(settings.network_name, "other-vpc");
        assert_eq!(settings.cluster_name, "loadtest-monitoring");
    }

    #[test]
    fn test_caller_identity_substitutes_for_required_vars() {
        let settings = Settings::from_env_with(
            Some("123456789012".to_string()),
            Some("eu-west-1".to_string()),
        )
        .unwrap();
        assert_eq!(settings.env.account, "123456789012");
        assert_eq!(settings.env.region, "eu-west-1");
    }

    #[test]
    fn test_require_env_missing_names_variable() {
        let err = require_env("STACKFORGE_TEST_UNSET_VARIABLE").unwrap_err();
        assert_eq!(
            err.to_string(),
            "missing required environment variable: STACKFORGE_TEST_UNSET_VARIABLE"
        );
    }
}
