//! Test dispatch for the project under test

use colored::Colorize;

use crate::common::config::Project;
use crate::common::Result;
use crate::process::ProcessBackend;

use super::report::TestOutcomes;

/// Runs test targets of the main project one after another
pub struct TestDispatcher<'a> {
    backend: &'a dyn ProcessBackend,
    project: &'a Project,
}

impl<'a> TestDispatcher<'a> {
    pub fn new(backend: &'a dyn ProcessBackend, project: &'a Project) -> Self {
        Self { backend, project }
    }

    /// Run one target to completion and record its exit code
    pub async fn dispatch(&self, target: &str, outcomes: &mut TestOutcomes) -> Result<i32> {
        println!("{} {}", "Tests".blue().bold(), target.white().bold());

        let code = self.backend.run_test(self.project, target).await?;
        tracing::info!(target_id = target, code, "Test target finished");

        outcomes.record(target, code);
        Ok(code)
    }

    /// Run targets in declaration order
    pub async fn dispatch_all(&self, targets: &[String], outcomes: &mut TestOutcomes) -> Result<()> {
        for target in targets {
            self.dispatch(target, outcomes).await?;
        }
        Ok(())
    }
}
