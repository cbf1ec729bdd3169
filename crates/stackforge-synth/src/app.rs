//! Wiring of the whole deployment: stacks, services and pipeline.

use serde::{Deserialize, Serialize};
use stackforge_config::Settings;
use stackforge_core::pipeline::PipelinePlan;
use stackforge_core::stack::{ResourceKind, ResourceRecord, Stack, StackTemplate};
use stackforge_core::{Reference, Result, ScopePath};

use crate::graph::StackGraph;
use crate::pipeline::PipelineOrchestrator;
use crate::resolver::OutputRegistry;
use crate::resources::cluster::{ServiceCluster, discovery_key};
use crate::resources::container::{ContainerSpec, ImageSource};
use crate::resources::firewall::PeerSource;
use crate::resources::identity::IdentityBindings;
use crate::resources::network::{Network, network_lookup_key};
use crate::resources::registry::ImageRegistry;
use crate::resources::service::{RuntimeSizing, ServiceSpec, SubnetPlacement};

const DASHBOARD_PORT: u16 = 3000;
const METRICS_HTTP_PORT: u16 = 8086;
const METRICS_INGEST_PORT: u16 = 2003;
const METRICS_DISCOVERY_NAME: &str = "metrics";

/// How the monitoring side of the deployment is laid out.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Topology {
    /// Dashboard and metrics database run as two containers of one
    /// service; the dashboard reaches the database over localhost.
    #[default]
    Combined,
    /// Metrics database runs as its own discoverable service; dashboard
    /// and runner both resolve its hostname.
    SplitIngest,
}

/// Everything one synthesis run produces.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SynthesizedApp {
    pub graph: StackGraph,
    pub plan: PipelinePlan,
    /// One template per stack, in deployment order.
    pub templates: Vec<StackTemplate>,
}

/// Synthesize the full stack graph for the given settings and topology.
pub fn synthesize(settings: &Settings, topology: Topology) -> Result<SynthesizedApp> {
    let ns = settings.namespace.as_str();
    let root = ScopePath::root(ns)?;
    let mut graph = StackGraph::new();
    let mut outputs = OutputRegistry::new();

    // The shared network is looked up by name from consumer stacks;
    // resolve once up front so a bad name fails before any service is
    // built.
    outputs.declare_lookup(network_lookup_key(&settings.network_name));
    let network_ref = Reference::Lookup(network_lookup_key(&settings.network_name));
    outputs.resolve(&network_ref)?;

    let network_stack_name = format!("{ns}-network");
    let network = Network::builder()
        .scope(root.clone())
        .id("network")
        .env(settings.env.clone())
        .network_name(&settings.network_name)
        .build()?;
    graph.add(
        Stack::new(&network_stack_name, settings.env.clone())
            .with_resources(vec![network.render()?]),
    )?;

    let registry_stack_name = format!("{ns}-registry");
    let registry = match &settings.registry {
        Some(cfg) => {
            let mut builder = ImageRegistry::builder()
                .scope(root.clone())
                .id("registry")
                .env(settings.env.clone())
                .namespace(ns);
            for repo in &cfg.repositories {
                builder = builder.repository(repo);
            }
            let registry = builder.build()?;
            graph.add(
                Stack::new(&registry_stack_name, settings.env.clone())
                    .with_resources(vec![registry.render()?]),
            )?;
            Some(registry)
        }
        None => None,
    };

    let services_stack_name = format!("{ns}-services");
    let cluster = build_services(settings, topology, &root, &network_ref, registry.as_ref(), &mut outputs)?;
    let mut services_stack = Stack::new(&services_stack_name, settings.env.clone())
        .depends_on(&network_stack_name)
        .with_resources(vec![cluster.render()?]);
    if registry.is_some() {
        services_stack = services_stack.depends_on(&registry_stack_name);
    }
    graph.add(services_stack)?;

    // Plan before adding the pipeline stack: the pipeline deploys every
    // other stack but never itself.
    let pipeline_stack_name = format!("{ns}-pipeline");
    let plan = PipelineOrchestrator::plan(
        &settings.pipeline_name,
        &settings.source,
        &graph,
        &pipeline_stack_name,
    )?;

    let mut pipeline_stack = Stack::new(&pipeline_stack_name, settings.env.clone())
        .with_resources(vec![ResourceRecord::new(
            root.child("pipeline")?,
            ResourceKind::Pipeline,
            serde_json::to_value(&plan)?,
        )]);
    for stack in graph.stacks() {
        let name = stack.name.clone();
        pipeline_stack = pipeline_stack.depends_on(name);
    }
    graph.add(pipeline_stack)?;

    graph.validate()?;
    let templates = graph
        .topological_order()?
        .into_iter()
        .map(Stack::template)
        .collect();

    tracing::info!(
        namespace = %ns,
        stacks = graph.stacks().len(),
        topology = ?topology,
        "synthesis complete"
    );

    Ok(SynthesizedApp {
        graph,
        plan,
        templates,
    })
}

fn build_services(
    settings: &Settings,
    topology: Topology,
    root: &ScopePath,
    network_ref: &Reference,
    registry: Option<&ImageRegistry>,
    outputs: &mut OutputRegistry,
) -> Result<ServiceCluster> {
    let ns = settings.namespace.as_str();
    let identity = IdentityBindings::for_namespace(ns);
    let mut cluster = ServiceCluster::builder()
        .scope(root.clone())
        .id("services")
        .env(settings.env.clone())
        .cluster_name(&settings.cluster_name)
        .discovery_domain(&settings.discovery_domain)
        .build()?;

    let image = |repo: &str| -> ImageSource {
        match registry {
            Some(registry) => ImageSource::Registry {
                uri: registry.repository_uri(repo),
            },
            None => ImageSource::LocalAsset {
                path: format!("./images/{repo}"),
            },
        }
    };

    let metrics_container = |host_mode: &str| -> Result<ContainerSpec> {
        ContainerSpec::builder(&settings.metrics_container_name)
            .image(image(&settings.metrics_container_name))
            .port(METRICS_HTTP_PORT)
            .port(METRICS_INGEST_PORT)
            .env_var("INGEST_MODE", host_mode.to_string())
            .log_group(format!("{ns}/{}", settings.monitoring_service_name))
            .build()
    };

    let dashboard_container = |metrics_host: &str| -> Result<ContainerSpec> {
        ContainerSpec::builder(&settings.dashboard_container_name)
            .image(image(&settings.dashboard_container_name))
            .port(DASHBOARD_PORT)
            .env_var("METRICS_HOST", metrics_host.to_string())
            .env_var("METRICS_PORT", METRICS_HTTP_PORT.to_string())
            .log_group(format!("{ns}/{}", settings.monitoring_service_name))
            .build()
    };

    // The hostname the runner reports results to.
    let report_target;

    match topology {
        Topology::Combined => {
            let monitoring = ServiceSpec::builder()
                .scope(cluster.scope().clone())
                .id("monitoring")
                .env(settings.env.clone())
                .service_name(&settings.monitoring_service_name)
                .discovery_name(&settings.monitoring_discovery_name)
                .network(network_ref.clone())
                .desired_count(1)
                .placement(SubnetPlacement::Public {
                    assign_public_ip: true,
                })
                .container(dashboard_container("localhost")?)
                .container(metrics_container("embedded")?)
                .open_port(DASHBOARD_PORT, PeerSource::AnyIpv4, "dashboard ui")
                .open_port(METRICS_HTTP_PORT, PeerSource::AnyIpv4, "metrics http api")
                .open_port(METRICS_INGEST_PORT, PeerSource::AnyIpv4, "metrics ingest")
                .identity(identity.clone())
                .build()?;
            cluster.register(monitoring, outputs)?;

            report_target =
                outputs.resolve(&Reference::Derived(discovery_key(
                    &settings.monitoring_discovery_name,
                )))?;
        }
        Topology::SplitIngest => {
            // The metrics service registers first so the dashboard and
            // runner can both resolve its hostname.
            let metrics = ServiceSpec::builder()
                .scope(cluster.scope().clone())
                .id("metrics")
                .env(settings.env.clone())
                .service_name(METRICS_DISCOVERY_NAME)
                .discovery_name(METRICS_DISCOVERY_NAME)
                .network(network_ref.clone())
                .desired_count(1)
                .container(metrics_container("standalone")?)
                .open_port(METRICS_HTTP_PORT, PeerSource::AnyIpv4, "metrics http api")
                .open_port(METRICS_INGEST_PORT, PeerSource::AnyIpv4, "metrics ingest")
                .identity(identity.clone())
                .build()?;
            cluster.register(metrics, outputs)?;

            let metrics_host =
                outputs.resolve(&Reference::Derived(discovery_key(METRICS_DISCOVERY_NAME)))?;

            let dashboard = ServiceSpec::builder()
                .scope(cluster.scope().clone())
                .id("monitoring")
                .env(settings.env.clone())
                .service_name(&settings.monitoring_service_name)
                .discovery_name(&settings.monitoring_discovery_name)
                .network(network_ref.clone())
                .desired_count(1)
                .placement(SubnetPlacement::Public {
                    assign_public_ip: true,
                })
                .container(dashboard_container(&metrics_host)?)
                .open_port(DASHBOARD_PORT, PeerSource::AnyIpv4, "dashboard ui")
                .identity(identity.clone())
                .build()?;
            cluster.register(dashboard, outputs)?;

            report_target = metrics_host;
        }
    }

    let runner_container = ContainerSpec::builder("runner")
        .image(image(&settings.runner_service_name))
        .command(["report-to", report_target.as_str()])
        .log_group(format!("{ns}/{}", settings.runner_service_name))
        .build()?;

    // Started on demand; a standing runner would generate load around the
    // clock.
    let runner = ServiceSpec::builder()
        .scope(cluster.scope().clone())
        .id("runner")
        .env(settings.env.clone())
        .service_name(&settings.runner_service_name)
        .network(network_ref.clone())
        .desired_count(0)
        .sizing(RuntimeSizing {
            cpu_units: 1024,
            memory_mib: 2048,
        })
        .container(runner_container)
        .identity(identity)
        .build()?;
    cluster.register(runner, outputs)?;

    Ok(cluster)
}

#[cfg(test)]
mod tests {
    use super::*;
    use stackforge_core::EnvContext;
    use stackforge_core::pipeline::{ActionKind, StageName};

    fn settings() -> Settings {
        Settings::with_env(EnvContext::new("123456789012", "eu-west-1"))
    }

    fn settings_without_registry() -> Settings {
        let mut s = settings();
        s.registry = None;
        s
    }

    #[test]
    fn test_three_stack_scenario() {
        let app = synthesize(&settings_without_registry(), Topology::Combined).unwrap();
        let names: Vec<&str> = app.graph.stacks().iter().map(|s| s.name.as_str()).collect();
        assert_eq!(
            names,
            vec!["loadtest-network", "loadtest-services", "loadtest-pipeline"]
        );

        let deploys = app.plan.deploy_actions();
        assert_eq!(deploys.len(), 2);
        assert_eq!(deploys[0].name, "deploy-loadtest-network");
        assert_eq!(deploys[0].run_order, 1);
        assert_eq!(deploys[1].name, "deploy-loadtest-services");
        assert_eq!(deploys[1].run_order, 2);
    }

    #[test]
    fn test_demo_namespace_scenario() {
        let mut s = settings_without_registry();
        s.namespace = "demo".to_string();
        s.network_name = "demo-vpc".to_string();
        s.cluster_name = "demo-cluster".to_string();
        s.pipeline_name = "demo-cicd".to_string();

        let app = synthesize(&s, Topology::Combined).unwrap();
        let names: Vec<&str> = app.graph.stacks().iter().map(|st| st.name.as_str()).collect();
        assert_eq!(names, vec!["demo-network", "demo-services", "demo-pipeline"]);

        // One deploy action per stack except the pipeline's own, each with
        // a unique run-order 1..N.
        let deploys = app.plan.deploy_actions();
        assert_eq!(deploys.len(), app.graph.stacks().len() - 1);
        let orders: Vec<u32> = deploys.iter().map(|a| a.run_order).collect();
        assert_eq!(orders, vec![1, 2]);
    }

    #[test]
    fn test_registry_adds_fourth_stack() {
        let app = synthesize(&settings(), Topology::Combined).unwrap();
        assert_eq!(app.graph.stacks().len(), 4);
        let services = app.graph.get("loadtest-services").unwrap();
        assert!(services.depends_on.contains(&"loadtest-network".to_string()));
        assert!(services.depends_on.contains(&"loadtest-registry".to_string()));
    }

    #[test]
    fn test_pipeline_depends_on_every_other_stack() {
        let app = synthesize(&settings(), Topology::Combined).unwrap();
        let pipeline = app.graph.get("loadtest-pipeline").unwrap();
        assert_eq!(pipeline.depends_on.len(), 3);
        assert_eq!(pipeline.resources[0].kind, ResourceKind::Pipeline);
    }

    #[test]
    fn test_runner_reports_to_resolved_hostname() {
        let app = synthesize(&settings(), Topology::Combined).unwrap();
        let services = app.graph.get("loadtest-services").unwrap();
        let rendered = serde_json::to_string(&services.resources).unwrap();
        assert!(rendered.contains("dashboard.loadtest-monitoring.internal"));
    }

    #[test]
    fn test_split_ingest_resolves_metrics_hostname() {
        let app = synthesize(&settings(), Topology::SplitIngest).unwrap();
        let services = app.graph.get("loadtest-services").unwrap();
        let rendered = serde_json::to_string(&services.resources).unwrap();
        assert!(rendered.contains("metrics.loadtest-monitoring.internal"));

        // Three services: metrics, monitoring, runner.
        let cluster = &services.resources[0];
        assert_eq!(cluster.children.len(), 3);
    }

    #[test]
    fn test_templates_follow_deployment_order() {
        let app = synthesize(&settings_without_registry(), Topology::Combined).unwrap();
        let paths: Vec<&str> = app.templates.iter().map(|t| t.path.as_str()).collect();
        assert_eq!(
            paths,
            vec![
                "loadtest-network.template.json",
                "loadtest-services.template.json",
                "loadtest-pipeline.template.json",
            ]
        );
    }

    #[test]
    fn test_deploy_templates_address_build_artifact() {
        let app = synthesize(&settings(), Topology::Combined).unwrap();
        for action in app.plan.deploy_actions() {
            match &action.kind {
                ActionKind::DeployStack { stack_name, template } => {
                    assert_eq!(template.path, format!("{stack_name}.template.json"));
                    assert_eq!(template.artifact.as_str(), "build");
                }
                other => panic!("unexpected action kind: {other:?}"),
            }
        }
    }

    #[test]
    fn test_source_stage_checks_out_configured_repo() {
        let app = synthesize(&settings(), Topology::Combined).unwrap();
        let source = &app.plan.stage(StageName::Source).unwrap().actions[0];
        match &source.kind {
            ActionKind::Checkout { owner, repo, branch } => {
                assert_eq!(owner, "your-org");
                assert_eq!(repo, "loadtest-monitoring-infra");
                assert_eq!(branch, "main");
            }
            other => panic!("unexpected action kind: {other:?}"),
        }
    }

    #[test]
    fn test_synthesis_is_deterministic() {
        let first = synthesize(&settings(), Topology::Combined).unwrap();
        let second = synthesize(&settings(), Topology::Combined).unwrap();
        assert_eq!(first, second);
    }
}
