//! Deployment pipeline planning.

use std::collections::{BTreeSet, HashMap};

use stackforge_config::SourceSettings;
use stackforge_core::pipeline::{
    Action, ActionKind, ArtifactName, PipelinePlan, PipelineStage, StageName,
};
use stackforge_core::stack::Stack;
use stackforge_core::{Error, Result};

use crate::graph::StackGraph;

/// Plans the Source/Build/Deploy pipeline for a stack graph.
///
/// The deploy stage gets one action per stack, run-orders derived from the
/// graph's dependency tiers: a stack always deploys strictly after every
/// stack it depends on, and independent stacks share a run-order. The
/// pipeline's own stack is excluded from the deploy stage since the
/// pipeline cannot deploy itself.
pub struct PipelineOrchestrator;

impl PipelineOrchestrator {
    pub fn plan(
        pipeline_name: &str,
        source: &SourceSettings,
        graph: &StackGraph,
        pipeline_stack: &str,
    ) -> Result<PipelinePlan> {
        let source_artifact = ArtifactName::new("source");
        let build_artifact = ArtifactName::new("build");

        let source_stage = PipelineStage {
            name: StageName::Source,
            actions: vec![Action {
                name: "checkout-source".to_string(),
                run_order: 1,
                inputs: Vec::new(),
                outputs: vec![source_artifact.clone()],
                kind: ActionKind::Checkout {
                    owner: source.owner.clone(),
                    repo: source.repo.clone(),
                    branch: source.branch.clone(),
                },
            }],
        };

        let build_stage = PipelineStage {
            name: StageName::Build,
            actions: vec![Action {
                name: "synthesize-templates".to_string(),
                run_order: 1,
                inputs: vec![source_artifact],
                outputs: vec![build_artifact.clone()],
                kind: ActionKind::Synthesize,
            }],
        };

        let tiers = graph.deploy_tiers()?;
        let deployable: Vec<_> = graph
            .topological_order()?
            .into_iter()
            .filter(|stack| stack.name != pipeline_stack)
            .collect();

        // Renumber tiers contiguously after excluding the pipeline stack,
        // so run-orders always start at 1 with no gaps.
        let occupied: BTreeSet<u32> = deployable
            .iter()
            .filter_map(|stack| tiers.get(&stack.name).copied())
            .collect();
        let run_order_of = |tier: u32| -> u32 {
            occupied.iter().take_while(|t| **t < tier).count() as u32 + 1
        };

        let mut deploy_actions = Vec::new();
        let mut order_of: HashMap<&str, u32> = HashMap::new();
        for stack in &deployable {
            let tier = tiers.get(&stack.name).copied().unwrap_or(1);
            let run_order = run_order_of(tier);
            order_of.insert(stack.name.as_str(), run_order);
            deploy_actions.push(Action {
                name: format!("deploy-{}", stack.name),
                run_order,
                inputs: vec![build_artifact.clone()],
                outputs: Vec::new(),
                kind: ActionKind::DeployStack {
                    stack_name: stack.name.clone(),
                    template: build_artifact.at_path(stack.template_path()),
                },
            });
        }

        check_run_orders(&deployable, &order_of)?;

        tracing::info!(
            pipeline = %pipeline_name,
            deploy_actions = deploy_actions.len(),
            "planned pipeline"
        );

        Ok(PipelinePlan {
            pipeline_name: pipeline_name.to_string(),
            stages: vec![
                source_stage,
                build_stage,
                PipelineStage {
                    name: StageName::Deploy,
                    actions: deploy_actions,
                },
            ],
        })
    }
}

/// A stack must deploy strictly after everything it depends on. The
/// tier-derived assignment upholds this by construction; the check guards
/// the invariant against any future change to how run-orders are assigned.
fn check_run_orders(stacks: &[&Stack], order_of: &HashMap<&str, u32>) -> Result<()> {
    for stack in stacks {
        for dep in &stack.depends_on {
            let stack_order = order_of.get(stack.name.as_str()).copied().unwrap_or(0);
            let dep_order = order_of.get(dep.as_str()).copied().unwrap_or(0);
            if stack_order <= dep_order {
                return Err(Error::DependencyOrderViolation(format!(
                    "'{}' (run-order {stack_order}) would not deploy after '{dep}' (run-order {dep_order})",
                    stack.name
                )));
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use stackforge_core::EnvContext;

    fn source() -> SourceSettings {
        SourceSettings {
            owner: "your-org".to_string(),
            repo: "loadtest-monitoring-infra".to_string(),
            branch: "main".to_string(),
        }
    }

    fn stack(name: &str, deps: Vec<&str>) -> Stack {
        let mut s = Stack::new(name, EnvContext::new("123456789012", "eu-west-1"));
        for dep in deps {
            s = s.depends_on(dep);
        }
        s
    }

    fn demo_graph() -> StackGraph {
        let mut graph = StackGraph::new();
        graph.add(stack("demo-network", vec![])).unwrap();
        graph
            .add(stack("demo-services", vec!["demo-network"]))
            .unwrap();
        graph
            .add(stack("demo-pipeline", vec!["demo-network", "demo-services"]))
            .unwrap();
        graph
    }

    #[test]
    fn test_three_stages_in_order() {
        let plan =
            PipelineOrchestrator::plan("demo-cicd", &source(), &demo_graph(), "demo-pipeline")
                .unwrap();
        let names: Vec<StageName> = plan.stages.iter().map(|s| s.name).collect();
        assert_eq!(
            names,
            vec![StageName::Source, StageName::Build, StageName::Deploy]
        );
    }

    #[test]
    fn test_build_consumes_source_artifact() {
        let plan =
            PipelineOrchestrator::plan("demo-cicd", &source(), &demo_graph(), "demo-pipeline")
                .unwrap();
        let build = &plan.stage(StageName::Build).unwrap().actions[0];
        assert_eq!(build.inputs[0].as_str(), "source");
        assert_eq!(build.outputs[0].as_str(), "build");
    }

    #[test]
    fn test_deploy_excludes_pipeline_stack_and_orders_contiguously() {
        let plan =
            PipelineOrchestrator::plan("demo-cicd", &source(), &demo_graph(), "demo-pipeline")
                .unwrap();
        let deploys = plan.deploy_actions();
        assert_eq!(deploys.len(), 2);
        assert_eq!(deploys[0].name, "deploy-demo-network");
        assert_eq!(deploys[0].run_order, 1);
        assert_eq!(deploys[1].name, "deploy-demo-services");
        assert_eq!(deploys[1].run_order, 2);
    }

    #[test]
    fn test_deploy_template_addresses_build_artifact() {
        let plan =
            PipelineOrchestrator::plan("demo-cicd", &source(), &demo_graph(), "demo-pipeline")
                .unwrap();
        match &plan.deploy_actions()[0].kind {
            ActionKind::DeployStack {
                stack_name,
                template,
            } => {
                assert_eq!(stack_name, "demo-network");
                assert_eq!(template.to_string(), "build::demo-network.template.json");
            }
            other => panic!("unexpected action kind: {other:?}"),
        }
    }

    #[test]
    fn test_equal_run_order_on_dependency_edge_rejected() {
        let stacks = vec![stack("network", vec![]), stack("services", vec!["network"])];
        let refs: Vec<&Stack> = stacks.iter().collect();
        let mut order_of: HashMap<&str, u32> = HashMap::new();
        order_of.insert("network", 1);
        order_of.insert("services", 1);

        let err = check_run_orders(&refs, &order_of).unwrap_err();
        assert!(matches!(err, Error::DependencyOrderViolation(_)));
        assert!(err.to_string().contains("would not deploy after 'network'"));
    }

    #[test]
    fn test_independent_stacks_share_run_order() {
        let mut graph = StackGraph::new();
        graph.add(stack("network", vec![])).unwrap();
        graph.add(stack("registry", vec![])).unwrap();
        graph
            .add(stack("services", vec!["network", "registry"]))
            .unwrap();
        graph
            .add(stack("pipeline", vec!["services"]))
            .unwrap();

        let plan = PipelineOrchestrator::plan("cicd", &source(), &graph, "pipeline").unwrap();
        let orders: Vec<(String, u32)> = plan
            .deploy_actions()
            .iter()
            .map(|a| (a.name.clone(), a.run_order))
            .collect();
        assert_eq!(
            orders,
            vec![
                ("deploy-network".to_string(), 1),
                ("deploy-registry".to_string(), 1),
                ("deploy-services".to_string(), 2),
            ]
        );
    }
}
