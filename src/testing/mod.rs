//! Dependency orchestration and test execution
//!
//! Brings up the declared dependencies of a project for every run group of
//! a profile, runs the group's test targets against them and aggregates the
//! exit codes into a [`RunSummary`].

mod dispatcher;
mod lifecycle;
mod plan;
mod readiness;
mod report;
mod runner;

pub use dispatcher::TestDispatcher;
pub use lifecycle::{DependencyLifecycle, DependencyState, RunningDependency};
pub use plan::{resolve_setup, NormalizedGroup, Overrides, ResolvedSetup};
pub use readiness::{wait_until_ready, HttpCheck, ReadinessCheck};
pub use report::{FailurePolicy, RunSummary, TestOutcomes};
pub use runner::Orchestrator;
