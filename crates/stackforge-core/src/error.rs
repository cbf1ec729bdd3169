//! Error types for stackforge synthesis.
//!
//! Every variant is a synthesis-time failure: no plan is emitted once any of
//! these occurs, so a partially-wired graph can never reach the deployment
//! system.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// A builder was finalized with one or more required fields unset.
    #[error("configuration incomplete for {scope}: missing required field(s): {}", .fields.join(", "))]
    ConfigurationIncomplete { scope: String, fields: Vec<String> },

    /// A duplicate id, port or discovery name within one scope.
    #[error("naming collision in {scope}: '{name}' is already in use")]
    NamingCollision { scope: String, name: String },

    /// A lookup or derived reference to a name that was never declared or
    /// produced.
    #[error("unresolved reference: {0}")]
    UnresolvedReference(String),

    /// A stack or action depends on something not yet constructed or
    /// assigned.
    #[error("dependency order violation: {0}")]
    DependencyOrderViolation(String),

    /// Stack dependencies form a cycle.
    #[error("cycle detected in stack dependencies: {0}")]
    CycleDetected(String),

    /// A field was set to a value that fails validation.
    #[error("invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },

    /// A required environment variable is absent at startup.
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    /// A synthesized value failed to serialize into a template.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_configuration_incomplete_names_all_fields() {
        let err = Error::ConfigurationIncomplete {
            scope: "app/network".to_string(),
            fields: vec!["cidr".to_string(), "network_name".to_string()],
        };
        let msg = err.to_string();
        assert!(msg.contains("app/network"));
        assert!(msg.contains("cidr"));
        assert!(msg.contains("network_name"));
    }

    #[test]
    fn test_naming_collision_display() {
        let err = Error::NamingCollision {
            scope: "app/services".to_string(),
            name: "api".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "naming collision in app/services: 'api' is already in use"
        );
    }
}
