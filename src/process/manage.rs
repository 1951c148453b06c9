//! Management-command backend
//!
//! Every operation is `<interpreter> <manage> <command> <args...>` run in the
//! project's directory, e.g. `python manage.py loaddata users`.

use std::process::Stdio;

use async_trait::async_trait;
use tokio::process::Command;

use crate::common::config::{OutputMode, Project, RunnerConfig};
use crate::common::{Error, Result};

use super::{exit_code, ProcessBackend, ProcessGroup, ServerHandle};

/// Runs management commands as real subprocesses
pub struct ManageBackend {
    runner: RunnerConfig,
}

impl ManageBackend {
    pub fn new(runner: RunnerConfig) -> Self {
        Self { runner }
    }

    /// Build a management command for `project`
    fn command<I, S>(&self, project: &Project, args: I) -> Command
    where
        I: IntoIterator<Item = S>,
        S: AsRef<std::ffi::OsStr>,
    {
        let mut cmd = Command::new(&self.runner.interpreter);
        cmd.arg(&self.runner.manage)
            .args(args)
            .current_dir(&project.dir)
            .stdin(Stdio::null());
        if let Some(settings) = &project.settings {
            cmd.arg(format!("--settings={}", settings));
        }
        cmd
    }

    /// Apply the dependency output policy to a command
    fn dependency_output(&self, cmd: &mut Command) {
        match self.runner.dependency_stdout {
            OutputMode::Display => {
                cmd.stdout(Stdio::inherit()).stderr(Stdio::inherit());
            }
            OutputMode::Suppress => {
                cmd.stdout(Stdio::null()).stderr(Stdio::null());
            }
        }
    }

    /// Run a dependency setup command to completion
    async fn run_setup(&self, project: &Project, what: &str, args: &[&str]) -> Result<i32> {
        let mut cmd = self.command(project, args);
        self.dependency_output(&mut cmd);
        cmd.kill_on_drop(true);

        tracing::debug!(project = %project.name, ?args, "Running {}", what);
        let status = cmd
            .status()
            .await
            .map_err(|e| Error::launch(what, &project.name, e))?;
        Ok(exit_code(status))
    }
}

#[async_trait]
impl ProcessBackend for ManageBackend {
    async fn reset(&self, project: &Project, app: &str) -> Result<i32> {
        self.run_setup(project, "reset", &["reset", app, "--noinput"])
            .await
    }

    async fn load_fixture(&self, project: &Project, fixture: &str) -> Result<i32> {
        self.run_setup(project, "fixture load", &["loaddata", fixture])
            .await
    }

    async fn start_server(&self, project: &Project, port: u16) -> Result<Box<dyn ServerHandle>> {
        let port = port.to_string();
        let mut cmd = self.command(project, ["runserver", port.as_str(), "--noreload"]);
        self.dependency_output(&mut cmd);

        let group =
            ProcessGroup::spawn(cmd).map_err(|e| Error::launch("server", &project.name, e))?;
        Ok(Box::new(group))
    }

    async fn run_test(&self, project: &Project, target: &str) -> Result<i32> {
        let mut args: Vec<&str> = vec!["test"];
        args.extend(self.runner.test_args.iter().map(String::as_str));
        args.push(target);

        let mut cmd = self.command(project, &args);
        cmd.stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .kill_on_drop(true);

        let status = cmd
            .status()
            .await
            .map_err(|e| Error::launch("test runner", &project.name, e))?;
        Ok(exit_code(status))
    }
}
