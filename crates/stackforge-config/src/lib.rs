//! Configuration discipline for stackforge.
//!
//! This crate handles:
//! - Required-field validation shared by every resource builder
//! - The scoped configuration (scope, id, environment) every resource
//!   carries by composition
//! - The `Settings` struct built once at the entry point from the process
//!   environment

pub mod missing;
pub mod scoped;
pub mod settings;

pub use missing::MissingFields;
pub use scoped::{ScopedConfig, ScopedConfigBuilder};
pub use settings::{RegistrySettings, Settings, SourceSettings};
