//! Process boundary
//!
//! Everything the orchestrator asks of the outside world goes through
//! [`ProcessBackend`]: resetting apps, loading fixtures, starting dependency
//! servers and running test targets. [`ManageBackend`] implements it with
//! real management-command subprocesses.

mod group;
mod manage;
#[cfg(all(test, unix))]
pub(crate) mod testutil;

pub use group::ProcessGroup;
pub use manage::ManageBackend;

use std::process::ExitStatus;

use async_trait::async_trait;

use crate::common::config::Project;
use crate::common::Result;

/// Operations performed against a project's working directory
#[async_trait]
pub trait ProcessBackend: Send + Sync {
    /// Reset one app, waiting for the command to finish. Returns its exit code.
    async fn reset(&self, project: &Project, app: &str) -> Result<i32>;

    /// Load one fixture, waiting for the command to finish. Returns its exit code.
    async fn load_fixture(&self, project: &Project, fixture: &str) -> Result<i32>;

    /// Start the project's server on `port` without waiting for it to exit
    async fn start_server(&self, project: &Project, port: u16) -> Result<Box<dyn ServerHandle>>;

    /// Run one test target with live output. Returns its exit code.
    async fn run_test(&self, project: &Project, target: &str) -> Result<i32>;
}

/// A launched server that must be released exactly once
#[async_trait]
pub trait ServerHandle: Send {
    /// OS identity of the server (process group id for real processes)
    fn id(&self) -> Option<u32>;

    /// Stop the server and everything it spawned
    async fn terminate(&mut self) -> Result<()>;
}

/// Convert an exit status to a numeric code
///
/// Processes killed by a signal report `128 + signal`, as shells do.
pub fn exit_code(status: ExitStatus) -> i32 {
    if let Some(code) = status.code() {
        return code;
    }

    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return 128 + signal;
        }
    }

    -1
}
