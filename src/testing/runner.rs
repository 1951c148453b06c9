//! Run orchestration
//!
//! For each run group of the selected profile: bring up every dependency of
//! the main project with that group's setup, run the group's targets, then
//! tear every dependency down before moving on. Dependencies never outlive
//! the group that started them.

use colored::Colorize;

use crate::common::config::{Config, Project, RunGroup, DEFAULT_PROFILE};
use crate::common::{Error, Result};
use crate::process::ProcessBackend;

use super::dispatcher::TestDispatcher;
use super::lifecycle::DependencyLifecycle;
use super::plan::resolve_setup;
use super::readiness::ReadinessCheck;
use super::report::{FailurePolicy, RunSummary, TestOutcomes};

/// Top-level driver for one invocation
pub struct Orchestrator<'a> {
    config: &'a Config,
    backend: &'a dyn ProcessBackend,
    check: &'a dyn ReadinessCheck,
}

impl<'a> Orchestrator<'a> {
    pub fn new(
        config: &'a Config,
        backend: &'a dyn ProcessBackend,
        check: &'a dyn ReadinessCheck,
    ) -> Self {
        Self {
            config,
            backend,
            check,
        }
    }

    /// Run every group of `profile` (or `default`) for `project_name`
    pub async fn run(&self, project_name: &str, profile: Option<&str>) -> Result<RunSummary> {
        let main = self.config.project(project_name)?;
        let profile = profile.unwrap_or(DEFAULT_PROFILE);
        let groups = main
            .tests
            .profile(profile)
            .ok_or_else(|| Error::UnknownProfile {
                project: main.name.clone(),
                profile: profile.to_string(),
            })?;

        // Validate every dependency before anything is spawned
        let dependencies = self.config.dependencies_of(main)?;
        if let Some(dep) = dependencies.iter().find(|d| d.port.is_none()) {
            return Err(Error::MissingPort(dep.name.clone()));
        }

        tracing::info!(
            project = %main.name,
            profile,
            groups = groups.len(),
            dependencies = dependencies.len(),
            "Starting run"
        );

        let mut outcomes = TestOutcomes::default();
        for group in groups {
            if let Err(e) = self.run_group(main, &dependencies, group, &mut outcomes).await {
                if outcomes.is_empty() {
                    return Err(e);
                }
                tracing::warn!(completed = outcomes.len(), "Run aborted after partial results");
                return Err(Error::RunAborted {
                    outcomes,
                    source: Box::new(e),
                });
            }
        }

        let policy = FailurePolicy::from_config(self.config.runner.failure_exit_code);
        Ok(RunSummary::new(outcomes, policy))
    }

    /// Run one group with freshly started dependencies
    async fn run_group(
        &self,
        main: &Project,
        dependencies: &[&Project],
        group: &RunGroup,
        outcomes: &mut TestOutcomes,
    ) -> Result<()> {
        let group = group.normalize();
        println!(
            "\n{} {:?}",
            "Running tests".blue().bold(),
            group.targets
        );

        let mut lifecycles: Vec<DependencyLifecycle<'_>> = dependencies
            .iter()
            .map(|dep| DependencyLifecycle::new(dep, resolve_setup(dep, group.overrides)))
            .collect();

        let result = self
            .bring_up_and_test(main, &mut lifecycles, group.targets, outcomes)
            .await;

        self.tear_down_all(&mut lifecycles).await;
        result
    }

    async fn bring_up_and_test(
        &self,
        main: &Project,
        lifecycles: &mut [DependencyLifecycle<'_>],
        targets: &[String],
        outcomes: &mut TestOutcomes,
    ) -> Result<()> {
        for lifecycle in lifecycles.iter_mut() {
            lifecycle
                .bring_up(self.backend, self.check, &self.config.readiness)
                .await?;
        }

        TestDispatcher::new(self.backend, main)
            .dispatch_all(targets, outcomes)
            .await
    }

    /// Release every started dependency; failures are logged, never raised
    async fn tear_down_all(&self, lifecycles: &mut [DependencyLifecycle<'_>]) {
        for lifecycle in lifecycles.iter_mut() {
            if let Err(e) = lifecycle.tear_down().await {
                tracing::error!(dependency = %lifecycle.name(), "Teardown failed: {}", e);
            }
        }
    }
}
