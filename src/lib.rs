//! deptest - integration test runner for interdependent service projects
//!
//! This library brings up dependency servers, seeds them with fixtures,
//! runs test targets against the main project and aggregates the results.

pub mod cli;
pub mod commands;
pub mod common;
pub mod coverage;
pub mod process;
pub mod testing;

// Re-export commonly used types for tests
pub use common::config::{Config, Project, RunGroup};
pub use common::{Error, Result};
pub use testing::{Orchestrator, RunSummary};
