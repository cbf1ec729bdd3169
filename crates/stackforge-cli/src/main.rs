//! Stackforge CLI.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use stackforge_config::Settings;
use stackforge_synth::{synthesize, Topology};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "stackforge")]
#[command(about = "Synthesize deployment stacks and pipeline plans", long_about = None)]
struct Cli {
    /// Deployment account; STACKFORGE_ACCOUNT when omitted
    #[arg(long)]
    account: Option<String>,

    /// Deployment region; STACKFORGE_REGION when omitted
    #[arg(long)]
    region: Option<String>,

    /// Project namespace; overrides STACKFORGE_NAMESPACE
    #[arg(long)]
    namespace: Option<String>,

    /// Monitoring topology
    #[arg(long, value_enum, default_value_t = TopologyArg::Combined)]
    topology: TopologyArg,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum TopologyArg {
    /// Dashboard and metrics database in one service
    Combined,
    /// Metrics database as its own discoverable service
    SplitIngest,
}

impl From<TopologyArg> for Topology {
    fn from(arg: TopologyArg) -> Self {
        match arg {
            TopologyArg::Combined => Topology::Combined,
            TopologyArg::SplitIngest => Topology::SplitIngest,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Synthesize stack templates into a directory
    Synth {
        /// Output directory for templates
        #[arg(long, default_value = "out")]
        out_dir: PathBuf,
    },
    /// Print stacks in deployment order with their run-orders
    Graph,
    /// Synthesize without writing anything, to check the configuration
    Validate,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let mut settings = Settings::from_env_with(cli.account, cli.region)?;
    if let Some(namespace) = cli.namespace {
        settings.pipeline_name = format!("{namespace}-cicd");
        settings.namespace = namespace;
    }

    let app = synthesize(&settings, cli.topology.into())?;

    match cli.command {
        Commands::Synth { out_dir } => {
            std::fs::create_dir_all(&out_dir)?;
            for template in &app.templates {
                let path = out_dir.join(&template.path);
                std::fs::write(&path, serde_json::to_string_pretty(&template.body)?)?;
                info!(template = %path.display(), "wrote template");
            }
            let plan_path = out_dir.join(format!("{}.plan.json", app.plan.pipeline_name));
            std::fs::write(&plan_path, serde_json::to_string_pretty(&app.plan)?)?;
            info!(plan = %plan_path.display(), "wrote pipeline plan");
        }
        Commands::Graph => {
            for action in app.plan.deploy_actions() {
                println!("{:>2}  {}", action.run_order, action.name);
            }
        }
        Commands::Validate => {
            println!(
                "ok: {} stacks, {} deploy actions",
                app.graph.stacks().len(),
                app.plan.deploy_actions().len()
            );
        }
    }

    Ok(())
}
