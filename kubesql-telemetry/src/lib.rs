//! Tracing setup for kubesql services and tests.

mod tracing;

pub use tracing::*;
