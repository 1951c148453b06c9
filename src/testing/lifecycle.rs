//! Dependency lifecycle
//!
//! One [`DependencyLifecycle`] exists per dependency per run group. It walks
//! reset -> fixtures -> launch -> readiness, holds the running server while
//! the group's tests execute, and releases it on teardown.

use colored::Colorize;

use crate::common::config::{Project, ReadinessConfig};
use crate::common::{Error, Result};
use crate::process::{ProcessBackend, ServerHandle};

use super::plan::ResolvedSetup;
use super::readiness::{wait_until_ready, ReadinessCheck};

/// Lifecycle states of a dependency within one run group
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DependencyState {
    Idle,
    Resetting,
    SeedingFixtures,
    Launching,
    AwaitingReady,
    Ready,
    Terminating,
    Terminated,
    Aborted,
}

/// A live dependency server owned by the current run group
pub struct RunningDependency {
    pub name: String,
    pub port: u16,
    handle: Box<dyn ServerHandle>,
}

impl RunningDependency {
    /// Process group id of the server, when it has one
    pub fn id(&self) -> Option<u32> {
        self.handle.id()
    }

    /// Stop the server. Consumes the handle so it can only happen once.
    pub async fn terminate(mut self) -> Result<()> {
        self.handle
            .terminate()
            .await
            .map_err(|e| Error::Teardown {
                project: self.name.clone(),
                reason: e.to_string(),
            })
    }
}

/// Drives one dependency through its setup and teardown
pub struct DependencyLifecycle<'a> {
    project: &'a Project,
    setup: ResolvedSetup,
    state: DependencyState,
    running: Option<RunningDependency>,
}

impl<'a> DependencyLifecycle<'a> {
    pub fn new(project: &'a Project, setup: ResolvedSetup) -> Self {
        Self {
            project,
            setup,
            state: DependencyState::Idle,
            running: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.project.name
    }

    pub fn state(&self) -> DependencyState {
        self.state
    }

    pub fn running(&self) -> Option<&RunningDependency> {
        self.running.as_ref()
    }

    fn transition(&mut self, next: DependencyState) {
        tracing::debug!(
            dependency = %self.project.name,
            from = ?self.state,
            to = ?next,
            "Dependency state change"
        );
        self.state = next;
    }

    /// Reset, seed, launch and wait for the server to answer
    ///
    /// On error the state becomes [`DependencyState::Aborted`]. A server that
    /// was already launched stays owned by this lifecycle and is still
    /// released by [`tear_down`](Self::tear_down).
    pub async fn bring_up(
        &mut self,
        backend: &dyn ProcessBackend,
        check: &dyn ReadinessCheck,
        readiness: &ReadinessConfig,
    ) -> Result<()> {
        let result = self.advance(backend, check, readiness).await;
        if result.is_err() {
            self.transition(DependencyState::Aborted);
        }
        result
    }

    async fn advance(
        &mut self,
        backend: &dyn ProcessBackend,
        check: &dyn ReadinessCheck,
        readiness: &ReadinessConfig,
    ) -> Result<()> {
        let project = self.project;
        let port = project
            .port
            .ok_or_else(|| Error::MissingPort(project.name.clone()))?;

        // Resets run one at a time so schema changes never overlap
        self.transition(DependencyState::Resetting);
        for app in self.setup.reset.clone() {
            println!("Resetting app {} for {}", app.cyan(), project.name.bold());
            let code = backend.reset(project, &app).await?;
            if code != 0 {
                tracing::warn!(dependency = %project.name, %app, code, "Reset exited non-zero");
            }
        }

        self.transition(DependencyState::SeedingFixtures);
        for fixture in self.setup.fixtures.clone() {
            println!("Loading fixture {} for {}", fixture.cyan(), project.name.bold());
            let code = backend.load_fixture(project, &fixture).await?;
            if code != 0 {
                tracing::warn!(dependency = %project.name, %fixture, code, "Fixture load exited non-zero");
            }
        }

        self.transition(DependencyState::Launching);
        println!(
            "Starting server for {} on port {}",
            project.name.bold(),
            port.to_string().cyan()
        );
        let handle = backend.start_server(project, port).await?;
        self.running = Some(RunningDependency {
            name: project.name.clone(),
            port,
            handle,
        });

        self.transition(DependencyState::AwaitingReady);
        let attempts = wait_until_ready(check, &project.name, port, readiness).await?;
        tracing::info!(dependency = %project.name, port, attempts, "Dependency ready");

        self.transition(DependencyState::Ready);
        Ok(())
    }

    /// Release the server if one was launched
    ///
    /// Failures are returned for logging; the lifecycle ends up terminated
    /// either way and a second call does nothing.
    pub async fn tear_down(&mut self) -> Result<()> {
        let Some(running) = self.running.take() else {
            return Ok(());
        };

        self.transition(DependencyState::Terminating);
        println!("Killing {}", running.name.bold());
        tracing::debug!(project = %running.name, pgid = ?running.id(), "Terminating server");
        let result = running.terminate().await;
        self.transition(DependencyState::Terminated);
        result
    }
}
