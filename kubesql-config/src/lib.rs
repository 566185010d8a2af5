//! Configuration management for kubesql.
//!
//! Provides environment detection, hierarchical configuration loading from
//! YAML files and environment variables, secret handling, and the shared
//! configuration types consumed by the sync engine.

mod environment;
mod load;
mod secret;
pub mod shared;

pub use environment::*;
pub use load::*;
pub use secret::*;
