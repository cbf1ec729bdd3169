//! Resource unit kinds.
//!
//! Each kind pairs an immutable spec with a validating builder. Builders
//! embed the shared scoped configuration by composition and report every
//! missing required field before any resource is constructed.

pub mod cluster;
pub mod container;
pub mod firewall;
pub mod identity;
pub mod network;
pub mod registry;
pub mod service;

pub use cluster::{ServiceCluster, discovery_key};
pub use container::{ContainerSpec, ImageSource, LogSink};
pub use firewall::{FirewallRules, IngressRule, PeerSource};
pub use identity::{IdentityBindings, RoleBinding};
pub use network::{Network, SubnetKind, SubnetSpec, network_lookup_key};
pub use registry::{ImageRegistry, LifecycleRule};
pub use service::{RuntimeSizing, ServiceSpec, SubnetPlacement};
