//! Coverage-gap report
//!
//! Lists the leaf tests of a project's test modules that no run group of any
//! profile selects. Reporting only: nothing is started or run.

mod tree;

pub use tree::TestNode;

use std::collections::BTreeSet;
use std::process::Stdio;

use async_trait::async_trait;
use colored::Colorize;
use tokio::process::Command;

use crate::common::config::{Config, Project, RunnerConfig};
use crate::common::{Error, Result};

/// Produces the test tree contained in a test module
#[async_trait]
pub trait TestEnumerator: Send + Sync {
    async fn enumerate(&self, project: &Project, module: &str) -> Result<TestNode>;
}

/// Flat, depth-first list of leaf test ids in `module`
pub async fn leaf_tests(
    enumerator: &dyn TestEnumerator,
    project: &Project,
    module: &str,
) -> Result<Vec<String>> {
    let tree = enumerator.enumerate(project, module).await?;
    Ok(tree.leaves().into_iter().map(str::to_string).collect())
}

/// Enumerates tests via a management command that prints a JSON test tree
pub struct CommandEnumerator {
    runner: RunnerConfig,
}

impl CommandEnumerator {
    pub fn new(runner: RunnerConfig) -> Self {
        Self { runner }
    }
}

#[async_trait]
impl TestEnumerator for CommandEnumerator {
    async fn enumerate(&self, project: &Project, module: &str) -> Result<TestNode> {
        let mut cmd = Command::new(&self.runner.interpreter);
        cmd.arg(&self.runner.manage)
            .arg(&self.runner.enumerate_command)
            .arg(module)
            .current_dir(&project.dir)
            .stdin(Stdio::null())
            .stderr(Stdio::inherit());
        if let Some(settings) = &project.settings {
            cmd.arg(format!("--settings={}", settings));
        }

        let output = cmd
            .output()
            .await
            .map_err(|e| Error::launch("test enumeration", &project.name, e))?;
        if !output.status.success() {
            return Err(Error::Enumeration {
                module: module.to_string(),
                reason: format!("command exited with {}", output.status),
            });
        }

        serde_json::from_slice(&output.stdout).map_err(|e| Error::Enumeration {
            module: module.to_string(),
            reason: format!("invalid test tree: {}", e),
        })
    }
}

/// Result of a coverage check
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CoverageReport {
    pub covered: Vec<String>,
    pub uncovered: Vec<String>,
}

impl CoverageReport {
    pub fn print(&self) {
        println!(
            "\n{} {} covered, {} not covered",
            "Coverage:".blue().bold(),
            self.covered.len().to_string().green(),
            self.uncovered.len().to_string().red()
        );
        for test in &self.uncovered {
            println!("  {} {}", "✗".red(), test);
        }
    }
}

/// Whether `target` selects `test` (exact id or dotted prefix)
fn selects(target: &str, test: &str) -> bool {
    test == target
        || (test.starts_with(target) && test[target.len()..].starts_with('.'))
}

/// Every target declared in any run group of any profile
fn declared_targets(project: &Project) -> BTreeSet<String> {
    project
        .tests
        .all_groups()
        .into_iter()
        .flat_map(|group| group.normalize().targets.iter().cloned())
        .collect()
}

/// Modules to inspect: configured apps, else the first segment of each target
fn modules_to_check(project: &Project, targets: &BTreeSet<String>) -> Vec<String> {
    if !project.apps.is_empty() {
        return project.apps.clone();
    }
    let modules: BTreeSet<String> = targets
        .iter()
        .filter_map(|t| t.split('.').next())
        .filter(|m| !m.is_empty())
        .map(str::to_string)
        .collect();
    modules.into_iter().collect()
}

/// Find leaf tests of `project_name` that no declared target selects
pub async fn check_coverage(
    config: &Config,
    project_name: &str,
    enumerator: &dyn TestEnumerator,
) -> Result<CoverageReport> {
    let project = config.project(project_name)?;
    let targets = declared_targets(project);

    let mut report = CoverageReport::default();
    for module in modules_to_check(project, &targets) {
        tracing::debug!(project = %project.name, %module, "Enumerating tests");
        for test in leaf_tests(enumerator, project, &module).await? {
            if targets.iter().any(|t| selects(t, &test)) {
                report.covered.push(test);
            } else {
                report.uncovered.push(test);
            }
        }
    }
    Ok(report)
}
