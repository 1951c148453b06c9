//! CLI command handling
//!
//! Loads the configuration, wires the real process backend and the HTTP
//! readiness check into the orchestrator, and turns the outcome into an exit code.

use std::future::Future;

use crate::commands::RunArgs;
use crate::common::config::{Config, OutputMode};
use crate::common::{Error, Result};
use crate::coverage::{self, CommandEnumerator};
use crate::process::ManageBackend;
use crate::testing::{FailurePolicy, HttpCheck, Orchestrator, RunSummary};

/// Execute the CLI and return the process exit code
pub async fn dispatch(args: RunArgs) -> Result<i32> {
    let mut config = Config::load(&args.configfile)?;
    if args.dependency_stdout {
        config.runner.dependency_stdout = OutputMode::Display;
    }

    if args.check_coverage {
        let enumerator = CommandEnumerator::new(config.runner.clone());
        let report = coverage::check_coverage(&config, &args.project_to_test, &enumerator).await?;
        report.print();
        return Ok(0);
    }

    let backend = ManageBackend::new(config.runner.clone());
    let check = HttpCheck::new(&config.readiness)?;
    let orchestrator = Orchestrator::new(&config, &backend, &check);

    let policy = FailurePolicy::from_config(config.runner.failure_exit_code);
    let result = until_interrupted(
        orchestrator.run(&args.project_to_test, args.profile.as_deref()),
    )
    .await;

    match result {
        Ok(summary) => {
            summary.print(policy);
            Ok(summary.exit_code())
        }
        // Show what already ran before reporting the error
        Err(Error::RunAborted { outcomes, source }) => {
            RunSummary::new(outcomes, policy).print(policy);
            Err(*source)
        }
        Err(e) => Err(e),
    }
}

/// Run `fut` unless SIGINT/SIGTERM arrives first
///
/// On a signal the run future is dropped, which kills every dependency
/// process group it still holds.
#[cfg(unix)]
async fn until_interrupted<F, T>(fut: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    use tokio::signal::unix::{signal, SignalKind};

    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigint = signal(SignalKind::interrupt())?;

    tokio::select! {
        result = fut => result,
        _ = sigterm.recv() => {
            tracing::warn!("Received SIGTERM, stopping dependencies");
            Err(Error::Interrupted("SIGTERM"))
        }
        _ = sigint.recv() => {
            tracing::warn!("Received SIGINT (Ctrl+C), stopping dependencies");
            Err(Error::Interrupted("SIGINT"))
        }
    }
}

#[cfg(not(unix))]
async fn until_interrupted<F, T>(fut: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    tokio::select! {
        result = fut => result,
        _ = tokio::signal::ctrl_c() => {
            tracing::warn!("Received Ctrl+C, stopping dependencies");
            Err(Error::Interrupted("Ctrl+C"))
        }
    }
}
