//! Pipeline plan types: stages, actions, run-order and artifacts.

use derive_more::Display;
use serde::{Deserialize, Serialize};

/// Name of an opaque artifact handed from one pipeline action to another.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
#[display("{_0}")]
pub struct ArtifactName(String);

impl ArtifactName {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Address a path inside this artifact.
    pub fn at_path(&self, path: impl Into<String>) -> ArtifactPath {
        ArtifactPath {
            artifact: self.clone(),
            path: path.into(),
        }
    }
}

/// A sub-path inside a named artifact (e.g. one stack's template inside the
/// build output).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactPath {
    pub artifact: ArtifactName,
    pub path: String,
}

impl std::fmt::Display for ArtifactPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}::{}", self.artifact, self.path)
    }
}

/// The three ordered pipeline stages. The pipeline is terminal after
/// `Deploy`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StageName {
    Source,
    Build,
    Deploy,
}

impl std::fmt::Display for StageName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StageName::Source => write!(f, "source"),
            StageName::Build => write!(f, "build"),
            StageName::Deploy => write!(f, "deploy"),
        }
    }
}

/// What a pipeline action does.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    /// Check out the versioned stack-graph definition.
    Checkout {
        owner: String,
        repo: String,
        branch: String,
    },
    /// Synthesize the stack graph into one template per stack.
    Synthesize,
    /// Deploy one stack from its template in the build artifact.
    DeployStack {
        stack_name: String,
        template: ArtifactPath,
    },
}

/// One action within a pipeline stage.
///
/// Run-order is relative to the owning stage: a lower run-order executes
/// first, equal run-orders carry no ordering guarantee between them. The
/// executor never proceeds past a failed run-order tier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Action {
    pub name: String,
    pub run_order: u32,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub inputs: Vec<ArtifactName>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub outputs: Vec<ArtifactName>,
    pub kind: ActionKind,
}

/// An ordered, named group of actions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineStage {
    pub name: StageName,
    pub actions: Vec<Action>,
}

/// The full ordered plan the orchestrator emits: Source, Build, Deploy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelinePlan {
    pub pipeline_name: String,
    pub stages: Vec<PipelineStage>,
}

impl PipelinePlan {
    pub fn stage(&self, name: StageName) -> Option<&PipelineStage> {
        self.stages.iter().find(|s| s.name == name)
    }

    /// All deploy actions in plan order.
    pub fn deploy_actions(&self) -> &[Action] {
        self.stage(StageName::Deploy)
            .map(|s| s.actions.as_slice())
            .unwrap_or(&[])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_artifact_at_path() {
        let build = ArtifactName::new("build");
        let path = build.at_path("demo-network.template.json");
        assert_eq!(path.to_string(), "build::demo-network.template.json");
    }

    #[test]
    fn test_stage_lookup() {
        let plan = PipelinePlan {
            pipeline_name: "cicd".to_string(),
            stages: vec![PipelineStage {
                name: StageName::Deploy,
                actions: vec![],
            }],
        };
        assert!(plan.stage(StageName::Deploy).is_some());
        assert!(plan.stage(StageName::Source).is_none());
        assert!(plan.deploy_actions().is_empty());
    }
}
