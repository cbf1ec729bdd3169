//! Synthesis for stackforge: resource units, two-pass reference
//! resolution, the stack graph and the deployment pipeline plan.

pub mod app;
pub mod graph;
pub mod pipeline;
pub mod resolver;
pub mod resources;

pub use app::{SynthesizedApp, Topology, synthesize};
pub use graph::StackGraph;
pub use pipeline::PipelineOrchestrator;
pub use resolver::OutputRegistry;
