//! Core domain types for the stackforge infrastructure synthesizer.
//!
//! This crate contains:
//! - Scope paths and resource identity
//! - The synthesis error taxonomy
//! - Environment (account/region) context
//! - Stack and resource record types
//! - Pipeline plan and artifact types
//! - Reference (lookup/derived) types

pub mod env;
pub mod error;
pub mod pipeline;
pub mod reference;
pub mod scope;
pub mod stack;

pub use env::EnvContext;
pub use error::{Error, Result};
pub use reference::Reference;
pub use scope::ScopePath;
